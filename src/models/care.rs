//! Users caring about a dit
//!
//! `cares` edges from a user to a dit. A user cares about a dit at most once.

use serde::{Deserialize, Serialize};

use crate::store::{GraphStore, Statement};

use super::classify::{check, WriteChecks};
use super::dit::DitKind;
use super::errors::ModelResult;
use super::user_id;

const FIND_CARE: &str = "LET care = FIRST(
    FOR c IN cares FILTER c._from == @from AND c._to == @to LIMIT 1 RETURN c
)";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Care {
    pub username: String,
    pub dit: String,
    pub created: i64,
}

const IDEA_CREATE: WriteChecks = WriteChecks {
    exists: &[check("dit", "idea")],
    authorized: &[],
    unique: &[check("unique", "care")],
};

const CHALLENGE_CREATE: WriteChecks = WriteChecks {
    exists: &[check("dit", "challenge")],
    authorized: &[],
    unique: &[check("unique", "care")],
};

const REMOVE_CHECKS: WriteChecks = WriteChecks {
    exists: &[check("care", "care")],
    authorized: &[],
    unique: &[],
};

pub fn create_statement(kind: DitKind, dit: &str, username: &str) -> Statement {
    Statement::new(
        "care.create",
        format!(
            "{FIND_CARE}
            LET checks = {{
                dit: DOCUMENT(@to) != null,
                unique: care == null
            }}
            LET created = (
                FOR ok IN (checks.dit AND checks.unique ? [1] : [])
                INSERT {{ _from: @from, _to: @to, created: DATE_NOW() }} IN cares
                LET c = NEW
                RETURN {{
                    username: PARSE_IDENTIFIER(c._from).key,
                    dit: PARSE_IDENTIFIER(c._to).key,
                    created: c.created
                }}
            )
            RETURN {{ checks, record: FIRST(created) }}"
        ),
    )
    .bind("from", user_id(username))
    .bind("to", kind.handle(dit))
}

pub async fn create(store: &dyn GraphStore, kind: DitKind, dit: &str, username: &str) -> ModelResult<Care> {
    let statement = create_statement(kind, dit, username);
    let checks = match kind {
        DitKind::Idea => IDEA_CREATE,
        DitKind::Challenge => CHALLENGE_CREATE,
    };
    let outcome = store.execute(&statement).await?;
    checks.classify_into(statement.name, &outcome)
}

pub async fn remove(store: &dyn GraphStore, kind: DitKind, dit: &str, username: &str) -> ModelResult<()> {
    let statement = Statement::new(
        "care.remove",
        format!(
            "{FIND_CARE}
            LET checks = {{ care: care != null }}
            LET removed = (
                FOR ok IN (checks.care ? [1] : [])
                REMOVE care IN cares
                RETURN OLD._key
            )
            RETURN {{ checks, record: FIRST(removed) }}"
        ),
    )
    .bind("from", user_id(username))
    .bind("to", kind.handle(dit));

    let outcome = store.execute(&statement).await?;
    REMOVE_CHECKS.classify(statement.name, &outcome).map(|_| ())
}
