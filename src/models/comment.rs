//! Comments on dits

use serde::{Deserialize, Serialize};

use crate::store::{GraphStore, Statement};

use super::classify::{check, WriteChecks};
use super::dit::DitKind;
use super::errors::ModelResult;
use super::Page;

const COMMENT: &str = "{
    id: c._key, content: c.content, created: c.created, creator: c.creator,
    target: c.target, voteSum: SUM(FOR v IN votes FILTER v._to == c._id RETURN v.value)
}";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    pub id: String,
    pub content: String,
    pub created: i64,
    pub creator: String,
    /// Document handle of the commented dit
    pub target: String,
    #[serde(default)]
    pub vote_sum: i64,
}

/// Order of a comment listing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CommentSort {
    /// Oldest first
    #[default]
    Created,
    /// Newest first
    NewestFirst,
}

impl CommentSort {
    /// Parses `sort=created` or `sort=-created`
    pub fn from_param(param: Option<&str>) -> Self {
        match param {
            Some("-created") => CommentSort::NewestFirst,
            _ => CommentSort::Created,
        }
    }

    fn direction(&self) -> &'static str {
        match self {
            CommentSort::Created => "ASC",
            CommentSort::NewestFirst => "DESC",
        }
    }
}

const IDEA_CREATE: WriteChecks = WriteChecks {
    exists: &[check("dit", "idea")],
    authorized: &[],
    unique: &[],
};

const CHALLENGE_CREATE: WriteChecks = WriteChecks {
    exists: &[check("dit", "challenge")],
    authorized: &[],
    unique: &[],
};

const UPDATE_CHECKS: WriteChecks = WriteChecks {
    exists: &[check("comment", "comment")],
    authorized: &[check("creator", "only the creator can edit this comment")],
    unique: &[],
};

const REMOVE_CHECKS: WriteChecks = WriteChecks {
    exists: &[check("comment", "comment")],
    authorized: &[check("creator", "only the creator can delete this comment")],
    unique: &[],
};

pub async fn create(
    store: &dyn GraphStore,
    kind: DitKind,
    dit: &str,
    creator: &str,
    content: &str,
) -> ModelResult<Comment> {
    let statement = Statement::new(
        "comment.create",
        format!(
            "LET checks = {{ dit: DOCUMENT(@target) != null }}
            LET created = (
                FOR ok IN (checks.dit ? [1] : [])
                INSERT {{ content: @content, created: DATE_NOW(), creator: @creator, target: @target }} IN comments
                LET c = NEW
                RETURN {COMMENT}
            )
            RETURN {{ checks, record: FIRST(created) }}"
        ),
    )
    .bind("target", kind.handle(dit))
    .bind("creator", creator)
    .bind("content", content);

    let checks = match kind {
        DitKind::Idea => IDEA_CREATE,
        DitKind::Challenge => CHALLENGE_CREATE,
    };
    let outcome = store.execute(&statement).await?;
    checks.classify_into(statement.name, &outcome)
}

pub fn list_of_dit_statement(kind: DitKind, dit: &str, page: Page, sort: CommentSort) -> Statement {
    page.bind(
        Statement::new(
            "comment.list_of_dit",
            format!(
                "FOR c IN comments
                    FILTER c.target == @target
                    SORT c.created {}
                    LIMIT @offset, @limit
                    RETURN {COMMENT}",
                sort.direction()
            ),
        )
        .bind("target", kind.handle(dit)),
    )
}

pub async fn list_of_dit(
    store: &dyn GraphStore,
    kind: DitKind,
    dit: &str,
    page: Page,
    sort: CommentSort,
) -> ModelResult<Vec<Comment>> {
    let outcome = store.execute(&list_of_dit_statement(kind, dit, page, sort)).await?;
    Ok(outcome.decode()?)
}

pub async fn update(store: &dyn GraphStore, id: &str, editor: &str, content: &str) -> ModelResult<Comment> {
    let statement = Statement::new(
        "comment.update",
        format!(
            "LET comment = DOCUMENT('comments', @id)
            LET checks = {{
                comment: comment != null,
                creator: comment != null AND comment.creator == @editor
            }}
            LET updated = (
                FOR ok IN (checks.comment AND checks.creator ? [1] : [])
                UPDATE comment WITH {{ content: @content }} IN comments
                LET c = NEW
                RETURN {COMMENT}
            )
            RETURN {{ checks, record: FIRST(updated) }}"
        ),
    )
    .bind("id", id)
    .bind("editor", editor)
    .bind("content", content);

    let outcome = store.execute(&statement).await?;
    UPDATE_CHECKS.classify_into(statement.name, &outcome)
}

/// Removes a comment together with its votes
pub async fn remove(store: &dyn GraphStore, id: &str, editor: &str) -> ModelResult<()> {
    let statement = Statement::new(
        "comment.remove",
        "LET comment = DOCUMENT('comments', @id)
        LET checks = {
            comment: comment != null,
            creator: comment != null AND comment.creator == @editor
        }
        LET removed = (
            FOR ok IN (checks.comment AND checks.creator ? [1] : [])
            LET dropped = (FOR v IN votes FILTER v._to == comment._id REMOVE v IN votes)
            REMOVE comment IN comments
            RETURN OLD._key
        )
        RETURN { checks, record: FIRST(removed) }",
    )
    .bind("id", id)
    .bind("editor", editor);

    let outcome = store.execute(&statement).await?;
    REMOVE_CHECKS.classify(statement.name, &outcome).map(|_| ())
}
