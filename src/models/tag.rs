//! Tags
//!
//! Tag documents are keyed by tagname and remember who created them.

use serde::{Deserialize, Serialize};

use crate::store::{GraphStore, Statement};

use super::classify::{check, WriteChecks};
use super::errors::ModelResult;
use super::Page;

const TAG: &str = "KEEP(t, 'tagname', 'description', 'created', 'creator')";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Tag {
    pub tagname: String,
    #[serde(default)]
    pub description: String,
    pub created: i64,
    pub creator: String,
}

const CREATE_CHECKS: WriteChecks = WriteChecks {
    exists: &[check("creator", "user")],
    authorized: &[],
    unique: &[check("unique", "tag")],
};

pub fn create_statement(tagname: &str, description: &str, creator: &str) -> Statement {
    Statement::new(
        "tag.create",
        format!(
            "LET checks = {{
                creator: DOCUMENT('users', @creator) != null,
                unique: DOCUMENT('tags', @tagname) == null
            }}
            LET created = (
                FOR ok IN (checks.creator AND checks.unique ? [1] : [])
                INSERT {{
                    _key: @tagname, tagname: @tagname, description: @description,
                    creator: @creator, created: DATE_NOW()
                }} IN tags
                LET t = NEW
                RETURN {TAG}
            )
            RETURN {{ checks, record: FIRST(created) }}"
        ),
    )
    .bind("tagname", tagname)
    .bind("description", description)
    .bind("creator", creator)
}

pub async fn create(
    store: &dyn GraphStore,
    tagname: &str,
    description: &str,
    creator: &str,
) -> ModelResult<Tag> {
    let statement = create_statement(tagname, description, creator);
    let outcome = store.execute(&statement).await?;
    CREATE_CHECKS.classify_into(statement.name, &outcome)
}

pub async fn read(store: &dyn GraphStore, tagname: &str) -> ModelResult<Option<Tag>> {
    let statement = Statement::new(
        "tag.read",
        format!("LET t = DOCUMENT('tags', @tagname) RETURN t == null ? null : {TAG}"),
    )
    .bind("tagname", tagname);

    let outcome = store.execute(&statement).await?;
    Ok(outcome.decode_first()?)
}

/// Tags containing `keyword`, earliest match position first, then by name
pub fn list_like_statement(keyword: &str, page: Page) -> Statement {
    page.bind(
        Statement::new(
            "tag.list_like",
            format!(
                "FOR t IN tags
                    FILTER CONTAINS(t.tagname, @keyword)
                    SORT FIND_FIRST(t.tagname, @keyword) ASC, t.tagname ASC
                    LIMIT @offset, @limit
                    RETURN {TAG}"
            ),
        )
        .bind("keyword", keyword),
    )
}

pub async fn list_like(store: &dyn GraphStore, keyword: &str, page: Page) -> ModelResult<Vec<Tag>> {
    let outcome = store.execute(&list_like_statement(keyword, page)).await?;
    Ok(outcome.decode()?)
}
