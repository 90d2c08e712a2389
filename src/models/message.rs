//! Messages between two users

use serde::{Deserialize, Serialize};

use crate::store::{GraphStore, Statement};

use super::classify::{check, WriteChecks};
use super::errors::ModelResult;
use super::Page;

const MESSAGE: &str = "{
    id: m._key, body: m.body, created: m.created, read: m.read,
    from: m.from, to: m.to
}";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub body: String,
    pub created: i64,
    pub read: bool,
    pub from: String,
    pub to: String,
}

const CREATE_CHECKS: WriteChecks = WriteChecks {
    exists: &[check("from", "user"), check("to", "user")],
    authorized: &[],
    unique: &[],
};

const READ_CHECKS: WriteChecks = WriteChecks {
    exists: &[check("message", "message")],
    authorized: &[check("receiver", "only the receiver can mark a message as read")],
    unique: &[],
};

pub async fn create(store: &dyn GraphStore, from: &str, to: &str, body: &str) -> ModelResult<Message> {
    let statement = Statement::new(
        "message.create",
        format!(
            "LET checks = {{
                from: DOCUMENT('users', @from) != null,
                to: DOCUMENT('users', @to) != null
            }}
            LET created = (
                FOR ok IN (checks.from AND checks.to ? [1] : [])
                INSERT {{ body: @body, created: DATE_NOW(), read: false, from: @from, to: @to }} IN messages
                LET m = NEW
                RETURN {MESSAGE}
            )
            RETURN {{ checks, record: FIRST(created) }}"
        ),
    )
    .bind("from", from)
    .bind("to", to)
    .bind("body", body);

    let outcome = store.execute(&statement).await?;
    CREATE_CHECKS.classify_into(statement.name, &outcome)
}

/// Messages exchanged between `me` and `other`, newest first
pub fn thread_statement(me: &str, other: &str, page: Page) -> Statement {
    page.bind(
        Statement::new(
            "message.thread",
            format!(
                "FOR m IN messages
                    FILTER (m.from == @me AND m.to == @other) OR (m.from == @other AND m.to == @me)
                    SORT m.created DESC
                    LIMIT @offset, @limit
                    RETURN {MESSAGE}"
            ),
        )
        .bind("me", me)
        .bind("other", other),
    )
}

pub async fn thread(store: &dyn GraphStore, me: &str, other: &str, page: Page) -> ModelResult<Vec<Message>> {
    let outcome = store.execute(&thread_statement(me, other, page)).await?;
    Ok(outcome.decode()?)
}

/// The latest message of every conversation `me` takes part in, newest first
pub fn threads_statement(me: &str, page: Page) -> Statement {
    page.bind(
        Statement::new(
            "message.threads",
            format!(
                "FOR message IN messages
                    FILTER message.from == @me OR message.to == @me
                    COLLECT other = (message.from == @me ? message.to : message.from) INTO thread = message
                    LET m = FIRST(FOR t IN thread SORT t.created DESC LIMIT 1 RETURN t)
                    SORT m.created DESC
                    LIMIT @offset, @limit
                    RETURN {MESSAGE}"
            ),
        )
        .bind("me", me),
    )
}

pub async fn threads(store: &dyn GraphStore, me: &str, page: Page) -> ModelResult<Vec<Message>> {
    let outcome = store.execute(&threads_statement(me, page)).await?;
    Ok(outcome.decode()?)
}

/// Marks a message as read; only its receiver may do so
pub async fn mark_read(store: &dyn GraphStore, id: &str, me: &str) -> ModelResult<Message> {
    let statement = Statement::new(
        "message.mark_read",
        format!(
            "LET message = DOCUMENT('messages', @id)
            LET checks = {{
                message: message != null,
                receiver: message != null AND message.to == @me
            }}
            LET updated = (
                FOR ok IN (checks.message AND checks.receiver ? [1] : [])
                UPDATE message WITH {{ read: true }} IN messages
                LET m = NEW
                RETURN {MESSAGE}
            )
            RETURN {{ checks, record: FIRST(updated) }}"
        ),
    )
    .bind("id", id)
    .bind("me", me);

    let outcome = store.execute(&statement).await?;
    READ_CHECKS.classify_into(statement.name, &outcome)
}
