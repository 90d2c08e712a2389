//! Contacts
//!
//! A contact is a `contacts` edge from the user who asked for it to the user
//! who has to confirm it. Each side keeps its own trust level and reference
//! about the other (`from` and `to` sub-documents). The request message is
//! only editable while the contact is unconfirmed.

use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

use crate::store::{GraphStore, Statement};

use super::classify::{check, WriteChecks};
use super::errors::ModelResult;
use super::user_id;

const CONTACT: &str = "{
    from: MERGE(c.from, { username: PARSE_IDENTIFIER(c._from).key }),
    to: MERGE(c.to, { username: PARSE_IDENTIFIER(c._to).key }),
    message: c.message, isConfirmed: c.isConfirmed,
    created: c.created, confirmed: c.confirmed
}";

/// Finds the directed edge `@from -> @to` as `contact`
const FIND_CONTACT: &str = "LET contact = FIRST(
    FOR c IN contacts FILTER c._from == @from AND c._to == @to LIMIT 1 RETURN c
)";

/// One party of a contact and what they said about the other
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactSide {
    pub username: String,
    #[serde(default)]
    pub trust: Option<u8>,
    #[serde(default)]
    pub reference: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Contact {
    pub from: ContactSide,
    pub to: ContactSide,
    #[serde(default)]
    pub message: String,
    pub is_confirmed: bool,
    pub created: i64,
    #[serde(default)]
    pub confirmed: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewContact {
    pub from: String,
    pub to: String,
    pub trust: u8,
    pub reference: String,
    pub message: String,
}

/// Changes one party makes to their side of a contact
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ContactPatch {
    pub trust: Option<u8>,
    pub reference: Option<String>,
    pub message: Option<String>,
}

impl ContactPatch {
    fn side_document(&self) -> Value {
        let mut doc = Map::new();
        if let Some(trust) = self.trust {
            doc.insert("trust".into(), Value::from(trust));
        }
        if let Some(reference) = &self.reference {
            doc.insert("reference".into(), Value::String(reference.clone()));
        }
        Value::Object(doc)
    }

    fn message_document(&self) -> Value {
        match &self.message {
            Some(message) => json!({ "message": message }),
            None => json!({}),
        }
    }
}

const CREATE_CHECKS: WriteChecks = WriteChecks {
    exists: &[check("from", "user"), check("to", "user")],
    authorized: &[],
    unique: &[check("unique", "contact")],
};

const CONFIRM_CHECKS: WriteChecks = WriteChecks {
    exists: &[check("contact", "contact")],
    authorized: &[check("unconfirmed", "contact is already confirmed")],
    unique: &[],
};

const UPDATE_CHECKS: WriteChecks = WriteChecks {
    exists: &[check("contact", "contact")],
    authorized: &[
        check("party", "you are not a party of this contact"),
        check("messageAuthor", "only the requester can change the message"),
        check("messageEditable", "message cannot be changed after the contact is confirmed"),
    ],
    unique: &[],
};

const REMOVE_CHECKS: WriteChecks = WriteChecks {
    exists: &[check("contact", "contact")],
    authorized: &[],
    unique: &[],
};

fn between(name: &'static str, query: String, from: &str, to: &str) -> Statement {
    Statement::new(name, query)
        .bind("from", user_id(from))
        .bind("to", user_id(to))
}

/// Uniqueness covers both directions: once alice asked bob, bob cannot ask alice
pub fn create_statement(new: &NewContact) -> Statement {
    between(
        "contact.create",
        format!(
            "LET existing = (
                FOR c IN contacts
                    FILTER (c._from == @from AND c._to == @to) OR (c._from == @to AND c._to == @from)
                    LIMIT 1
                    RETURN 1
            )
            LET checks = {{
                from: DOCUMENT(@from) != null,
                to: DOCUMENT(@to) != null,
                unique: LENGTH(existing) == 0
            }}
            LET created = (
                FOR ok IN (checks.from AND checks.to AND checks.unique ? [1] : [])
                INSERT {{
                    _from: @from, _to: @to,
                    from: {{ trust: @trust, reference: @reference }},
                    to: {{ trust: null, reference: null }},
                    message: @message, isConfirmed: false,
                    created: DATE_NOW(), confirmed: null
                }} IN contacts
                LET c = NEW
                RETURN {CONTACT}
            )
            RETURN {{ checks, record: FIRST(created) }}"
        ),
        &new.from,
        &new.to,
    )
    .bind("trust", new.trust)
    .bind("reference", new.reference.as_str())
    .bind("message", new.message.as_str())
}

pub async fn create(store: &dyn GraphStore, new: &NewContact) -> ModelResult<Contact> {
    let statement = create_statement(new);
    let outcome = store.execute(&statement).await?;
    CREATE_CHECKS.classify_into(statement.name, &outcome)
}

pub fn read_statement(from: &str, to: &str) -> Statement {
    between(
        "contact.read",
        format!("{FIND_CONTACT} LET c = contact RETURN c == null ? null : {CONTACT}"),
        from,
        to,
    )
}

/// The contact `from -> to`, if it exists
pub async fn read(store: &dyn GraphStore, from: &str, to: &str) -> ModelResult<Option<Contact>> {
    let outcome = store.execute(&read_statement(from, to)).await?;
    Ok(outcome.decode_first()?)
}

/// Contacts of a user in both directions, newest first. Unconfirmed
/// contacts are only listed to the user themselves.
pub async fn list_of_user(
    store: &dyn GraphStore,
    username: &str,
    requester: Option<&str>,
) -> ModelResult<Vec<Contact>> {
    let statement = Statement::new(
        "contact.list_of_user",
        format!(
            "FOR c IN contacts
                FILTER c._from == @user OR c._to == @user
                FILTER @everything OR c.isConfirmed == true
                SORT c.created DESC
                RETURN {CONTACT}"
        ),
    )
    .bind("user", user_id(username))
    .bind("everything", requester == Some(username));

    let outcome = store.execute(&statement).await?;
    Ok(outcome.decode()?)
}

pub fn confirm_statement(from: &str, to: &str, trust: u8, reference: &str) -> Statement {
    between(
        "contact.confirm",
        format!(
            "{FIND_CONTACT}
            LET checks = {{
                contact: contact != null,
                unconfirmed: contact != null AND contact.isConfirmed == false
            }}
            LET updated = (
                FOR ok IN (checks.contact AND checks.unconfirmed ? [1] : [])
                UPDATE contact WITH {{
                    isConfirmed: true, confirmed: DATE_NOW(),
                    to: {{ trust: @trust, reference: @reference }}
                }} IN contacts
                LET c = NEW
                RETURN {CONTACT}
            )
            RETURN {{ checks, record: FIRST(updated) }}"
        ),
        from,
        to,
    )
    .bind("trust", trust)
    .bind("reference", reference)
}

/// Confirms a pending contact; only `to` may do this
pub async fn confirm(
    store: &dyn GraphStore,
    from: &str,
    to: &str,
    trust: u8,
    reference: &str,
) -> ModelResult<Contact> {
    let statement = confirm_statement(from, to, trust, reference);
    let outcome = store.execute(&statement).await?;
    CONFIRM_CHECKS.classify_into(statement.name, &outcome)
}

/// The issuer edits their own side: `from` when they asked, `to` otherwise.
/// Only the requester may touch the message, and only before confirmation.
pub fn update_statement(from: &str, to: &str, issuer: &str, patch: &ContactPatch) -> Statement {
    let side = if issuer == from { "from" } else { "to" };
    between(
        "contact.update",
        format!(
            "{FIND_CONTACT}
            LET checks = {{
                contact: contact != null,
                party: @issuer IN [PARSE_IDENTIFIER(@from).key, PARSE_IDENTIFIER(@to).key],
                messageAuthor: NOT HAS(@messagePatch, 'message') OR @issuer == PARSE_IDENTIFIER(@from).key,
                messageEditable: contact != null AND (NOT HAS(@messagePatch, 'message') OR contact.isConfirmed == false)
            }}
            LET updated = (
                FOR ok IN (checks.contact AND checks.party AND checks.messageAuthor AND checks.messageEditable ? [1] : [])
                UPDATE contact WITH MERGE(
                    {{ [@side]: MERGE(contact[@side], @sidePatch) }},
                    @messagePatch
                ) IN contacts
                LET c = NEW
                RETURN {CONTACT}
            )
            RETURN {{ checks, record: FIRST(updated) }}"
        ),
        from,
        to,
    )
    .bind("issuer", issuer)
    .bind("side", side)
    .bind("sidePatch", patch.side_document())
    .bind("messagePatch", patch.message_document())
}

pub async fn update(
    store: &dyn GraphStore,
    from: &str,
    to: &str,
    issuer: &str,
    patch: &ContactPatch,
) -> ModelResult<Contact> {
    let statement = update_statement(from, to, issuer, patch);
    let outcome = store.execute(&statement).await?;
    UPDATE_CHECKS.classify_into(statement.name, &outcome)
}

pub async fn remove(store: &dyn GraphStore, from: &str, to: &str) -> ModelResult<()> {
    let statement = between(
        "contact.remove",
        format!(
            "{FIND_CONTACT}
            LET checks = {{ contact: contact != null }}
            LET removed = (
                FOR ok IN (checks.contact ? [1] : [])
                REMOVE contact IN contacts
                RETURN OLD._key
            )
            RETURN {{ checks, record: FIRST(removed) }}"
        ),
        from,
        to,
    );
    let outcome = store.execute(&statement).await?;
    REMOVE_CHECKS.classify(statement.name, &outcome).map(|_| ())
}
