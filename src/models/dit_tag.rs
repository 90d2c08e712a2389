//! Tags of a dit
//!
//! Edges from a dit to a tag in the kind's tag edge collection. Only the
//! creator of the dit may add or remove them.

use serde::{Deserialize, Serialize};

use crate::store::{GraphStore, Statement};

use super::classify::{check, WriteChecks};
use super::dit::DitKind;
use super::errors::ModelResult;

const DIT_TAG: &str = "{
    dit: PARSE_IDENTIFIER(e._from).key, tagname: PARSE_IDENTIFIER(e._to).key,
    creator: e.creator, created: e.created
}";

const FIND_EDGE: &str = "LET edge = FIRST(
    FOR e IN @@tagEdges FILTER e._from == @dit AND e._to == @tag LIMIT 1 RETURN e
)";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DitTag {
    pub dit: String,
    pub tagname: String,
    pub creator: String,
    pub created: i64,
}

const IDEA_CREATE: WriteChecks = WriteChecks {
    exists: &[check("dit", "idea"), check("tag", "tag")],
    authorized: &[check("creator", "only the creator can tag this idea")],
    unique: &[check("unique", "idea tag")],
};

const CHALLENGE_CREATE: WriteChecks = WriteChecks {
    exists: &[check("dit", "challenge"), check("tag", "tag")],
    authorized: &[check("creator", "only the creator can tag this challenge")],
    unique: &[check("unique", "challenge tag")],
};

const IDEA_REMOVE: WriteChecks = WriteChecks {
    exists: &[check("edge", "idea tag")],
    authorized: &[check("creator", "only the creator can untag this idea")],
    unique: &[],
};

const CHALLENGE_REMOVE: WriteChecks = WriteChecks {
    exists: &[check("edge", "challenge tag")],
    authorized: &[check("creator", "only the creator can untag this challenge")],
    unique: &[],
};

fn endpoints(statement: Statement, kind: DitKind, id: &str, tagname: &str) -> Statement {
    statement
        .bind("@tagEdges", kind.tag_edges())
        .bind("dit", kind.handle(id))
        .bind("tag", format!("tags/{}", tagname))
}

pub fn create_statement(kind: DitKind, id: &str, tagname: &str, creator: &str) -> Statement {
    endpoints(
        Statement::new(
            "dit_tag.create",
            format!(
                "{FIND_EDGE}
                LET dit = DOCUMENT(@dit)
                LET checks = {{
                    dit: dit != null,
                    tag: DOCUMENT(@tag) != null,
                    creator: dit != null AND dit.creator == @creator,
                    unique: edge == null
                }}
                LET created = (
                    FOR ok IN (checks.dit AND checks.tag AND checks.creator AND checks.unique ? [1] : [])
                    INSERT {{ _from: @dit, _to: @tag, creator: @creator, created: DATE_NOW() }} IN @@tagEdges
                    LET e = NEW
                    RETURN {DIT_TAG}
                )
                RETURN {{ checks, record: FIRST(created) }}"
            ),
        )
        .bind("creator", creator),
        kind,
        id,
        tagname,
    )
}

pub async fn create(
    store: &dyn GraphStore,
    kind: DitKind,
    id: &str,
    tagname: &str,
    creator: &str,
) -> ModelResult<DitTag> {
    let statement = create_statement(kind, id, tagname, creator);
    let checks = match kind {
        DitKind::Idea => IDEA_CREATE,
        DitKind::Challenge => CHALLENGE_CREATE,
    };
    let outcome = store.execute(&statement).await?;
    checks.classify_into(statement.name, &outcome)
}

/// Tags of a dit, alphabetically
pub async fn list_of_dit(store: &dyn GraphStore, kind: DitKind, id: &str) -> ModelResult<Vec<DitTag>> {
    let statement = Statement::new(
        "dit_tag.list_of_dit",
        format!(
            "FOR e IN @@tagEdges
                FILTER e._from == @dit
                SORT PARSE_IDENTIFIER(e._to).key ASC
                RETURN {DIT_TAG}"
        ),
    )
    .bind("@tagEdges", kind.tag_edges())
    .bind("dit", kind.handle(id));

    let outcome = store.execute(&statement).await?;
    Ok(outcome.decode()?)
}

pub async fn remove(
    store: &dyn GraphStore,
    kind: DitKind,
    id: &str,
    tagname: &str,
    editor: &str,
) -> ModelResult<()> {
    let statement = endpoints(
        Statement::new(
            "dit_tag.remove",
            format!(
                "{FIND_EDGE}
                LET dit = DOCUMENT(@dit)
                LET checks = {{
                    edge: edge != null,
                    creator: dit != null AND dit.creator == @editor
                }}
                LET removed = (
                    FOR ok IN (checks.edge AND checks.creator ? [1] : [])
                    REMOVE edge IN @@tagEdges
                    RETURN OLD._key
                )
                RETURN {{ checks, record: FIRST(removed) }}"
            ),
        )
        .bind("editor", editor),
        kind,
        id,
        tagname,
    );
    let checks = match kind {
        DitKind::Idea => IDEA_REMOVE,
        DitKind::Challenge => CHALLENGE_REMOVE,
    };
    let outcome = store.execute(&statement).await?;
    checks.classify(statement.name, &outcome).map(|_| ())
}
