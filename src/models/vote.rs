//! Votes on dits and comments
//!
//! A vote is a `votes` edge from the voter to the target with a value of
//! -1 or 1. Each user votes at most once per target.

use serde::{Deserialize, Serialize};

use crate::store::{GraphStore, Statement};

use super::classify::{check, WriteChecks};
use super::dit::DitKind;
use super::errors::ModelResult;
use super::user_id;

const VOTE: &str = "{
    from: PARSE_IDENTIFIER(v._from).key, to: v._to, value: v.value, created: v.created
}";

const FIND_VOTE: &str = "LET vote = FIRST(
    FOR v IN votes FILTER v._from == @from AND v._to == @to LIMIT 1 RETURN v
)";

/// What is being voted on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VoteTarget<'a> {
    Dit(DitKind, &'a str),
    Comment(&'a str),
}

impl VoteTarget<'_> {
    fn handle(&self) -> String {
        match self {
            VoteTarget::Dit(kind, id) => kind.handle(id),
            VoteTarget::Comment(id) => format!("comments/{}", id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Vote {
    pub from: String,
    /// Document handle of the target, e.g. `ideas/12`
    pub to: String,
    pub value: i8,
    pub created: i64,
}

const IDEA_CREATE: WriteChecks = WriteChecks {
    exists: &[check("target", "idea")],
    authorized: &[],
    unique: &[check("unique", "vote")],
};

const CHALLENGE_CREATE: WriteChecks = WriteChecks {
    exists: &[check("target", "challenge")],
    authorized: &[],
    unique: &[check("unique", "vote")],
};

const COMMENT_CREATE: WriteChecks = WriteChecks {
    exists: &[check("target", "comment")],
    authorized: &[],
    unique: &[check("unique", "vote")],
};

const REMOVE_CHECKS: WriteChecks = WriteChecks {
    exists: &[check("vote", "vote")],
    authorized: &[],
    unique: &[],
};

pub fn create_statement(target: VoteTarget<'_>, voter: &str, value: i8) -> Statement {
    Statement::new(
        "vote.create",
        format!(
            "{FIND_VOTE}
            LET checks = {{
                target: DOCUMENT(@to) != null,
                unique: vote == null
            }}
            LET created = (
                FOR ok IN (checks.target AND checks.unique ? [1] : [])
                INSERT {{ _from: @from, _to: @to, value: @value, created: DATE_NOW() }} IN votes
                LET v = NEW
                RETURN {VOTE}
            )
            RETURN {{ checks, record: FIRST(created) }}"
        ),
    )
    .bind("from", user_id(voter))
    .bind("to", target.handle())
    .bind("value", value)
}

pub async fn create(
    store: &dyn GraphStore,
    target: VoteTarget<'_>,
    voter: &str,
    value: i8,
) -> ModelResult<Vote> {
    let statement = create_statement(target, voter, value);
    let checks = match target {
        VoteTarget::Dit(DitKind::Idea, _) => IDEA_CREATE,
        VoteTarget::Dit(DitKind::Challenge, _) => CHALLENGE_CREATE,
        VoteTarget::Comment(_) => COMMENT_CREATE,
    };
    let outcome = store.execute(&statement).await?;
    checks.classify_into(statement.name, &outcome)
}

/// Removes the voter's vote on the target
pub async fn remove(store: &dyn GraphStore, target: VoteTarget<'_>, voter: &str) -> ModelResult<()> {
    let statement = Statement::new(
        "vote.remove",
        format!(
            "{FIND_VOTE}
            LET checks = {{ vote: vote != null }}
            LET removed = (
                FOR ok IN (checks.vote ? [1] : [])
                REMOVE vote IN votes
                RETURN OLD._key
            )
            RETURN {{ checks, record: FIRST(removed) }}"
        ),
    )
    .bind("from", user_id(voter))
    .bind("to", target.handle());

    let outcome = store.execute(&statement).await?;
    REMOVE_CHECKS.classify(statement.name, &outcome).map(|_| ())
}
