//! Tags of a user
//!
//! `userTag` edges go from a user to a tag and carry the user's story about
//! the tag and how relevant it is to them (1..5).

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::store::{GraphStore, Statement};

use super::classify::{check, WriteChecks};
use super::errors::ModelResult;
use super::user_id;

const USER_TAG: &str = "{
    username: PARSE_IDENTIFIER(e._from).key, tagname: PARSE_IDENTIFIER(e._to).key,
    story: e.story, relevance: e.relevance, created: e.created
}";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserTag {
    pub username: String,
    pub tagname: String,
    #[serde(default)]
    pub story: String,
    pub relevance: u8,
    pub created: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserTagPatch {
    pub story: Option<String>,
    pub relevance: Option<u8>,
}

impl UserTagPatch {
    fn to_document(&self) -> Value {
        let mut doc = Map::new();
        if let Some(story) = &self.story {
            doc.insert("story".into(), Value::String(story.clone()));
        }
        if let Some(relevance) = self.relevance {
            doc.insert("relevance".into(), Value::from(relevance));
        }
        Value::Object(doc)
    }
}

const CREATE_CHECKS: WriteChecks = WriteChecks {
    exists: &[check("user", "user"), check("tag", "tag")],
    authorized: &[],
    unique: &[check("unique", "user tag")],
};

const EDGE_CHECKS: WriteChecks = WriteChecks {
    exists: &[check("edge", "user tag")],
    authorized: &[],
    unique: &[],
};

/// Finds the edge between `@from` and `@to` as `edge`
const FIND_EDGE: &str = "LET edge = FIRST(
    FOR e IN userTag FILTER e._from == @from AND e._to == @to LIMIT 1 RETURN e
)";

fn endpoints(statement: Statement, username: &str, tagname: &str) -> Statement {
    statement
        .bind("from", user_id(username))
        .bind("to", format!("tags/{}", tagname))
}

pub fn create_statement(username: &str, tagname: &str, story: &str, relevance: u8) -> Statement {
    let statement = Statement::new(
        "user_tag.create",
        format!(
            "{FIND_EDGE}
            LET checks = {{
                user: DOCUMENT(@from) != null,
                tag: DOCUMENT(@to) != null,
                unique: edge == null
            }}
            LET created = (
                FOR ok IN (checks.user AND checks.tag AND checks.unique ? [1] : [])
                INSERT {{
                    _from: @from, _to: @to, story: @story, relevance: @relevance,
                    created: DATE_NOW()
                }} IN userTag
                LET e = NEW
                RETURN {USER_TAG}
            )
            RETURN {{ checks, record: FIRST(created) }}"
        ),
    )
    .bind("story", story)
    .bind("relevance", relevance);
    endpoints(statement, username, tagname)
}

pub async fn create(
    store: &dyn GraphStore,
    username: &str,
    tagname: &str,
    story: &str,
    relevance: u8,
) -> ModelResult<UserTag> {
    let statement = create_statement(username, tagname, story, relevance);
    let outcome = store.execute(&statement).await?;
    CREATE_CHECKS.classify_into(statement.name, &outcome)
}

pub async fn read(store: &dyn GraphStore, username: &str, tagname: &str) -> ModelResult<Option<UserTag>> {
    let statement = endpoints(
        Statement::new(
            "user_tag.read",
            format!("{FIND_EDGE} LET e = edge RETURN e == null ? null : {USER_TAG}"),
        ),
        username,
        tagname,
    );
    let outcome = store.execute(&statement).await?;
    Ok(outcome.decode_first()?)
}

/// Tags of a user, most relevant first, then alphabetically
pub async fn list_of_user(store: &dyn GraphStore, username: &str) -> ModelResult<Vec<UserTag>> {
    let statement = Statement::new(
        "user_tag.list_of_user",
        format!(
            "FOR e IN userTag
                FILTER e._from == @from
                SORT e.relevance DESC, PARSE_IDENTIFIER(e._to).key ASC
                RETURN {USER_TAG}"
        ),
    )
    .bind("from", user_id(username));

    let outcome = store.execute(&statement).await?;
    Ok(outcome.decode()?)
}

pub async fn update(
    store: &dyn GraphStore,
    username: &str,
    tagname: &str,
    patch: &UserTagPatch,
) -> ModelResult<UserTag> {
    let statement = endpoints(
        Statement::new(
            "user_tag.update",
            format!(
                "{FIND_EDGE}
                LET checks = {{ edge: edge != null }}
                LET updated = (
                    FOR ok IN (checks.edge ? [1] : [])
                    UPDATE edge WITH @patch IN userTag
                    LET e = NEW
                    RETURN {USER_TAG}
                )
                RETURN {{ checks, record: FIRST(updated) }}"
            ),
        )
        .bind("patch", patch.to_document()),
        username,
        tagname,
    );
    let outcome = store.execute(&statement).await?;
    EDGE_CHECKS.classify_into(statement.name, &outcome)
}

pub async fn remove(store: &dyn GraphStore, username: &str, tagname: &str) -> ModelResult<()> {
    let statement = endpoints(
        Statement::new(
            "user_tag.remove",
            format!(
                "{FIND_EDGE}
                LET checks = {{ edge: edge != null }}
                LET removed = (
                    FOR ok IN (checks.edge ? [1] : [])
                    REMOVE edge IN userTag
                    RETURN OLD._key
                )
                RETURN {{ checks, record: FIRST(removed) }}"
            ),
        ),
        username,
        tagname,
    );
    let outcome = store.execute(&statement).await?;
    EDGE_CHECKS.classify(statement.name, &outcome).map(|_| ())
}
