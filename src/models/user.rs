//! Users
//!
//! User documents are keyed by username. The stored password hash never
//! leaves this module except through [`read_credentials`].

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::store::{GraphStore, Statement};

use super::classify::{check, WriteChecks};
use super::errors::ModelResult;

const PROFILE: &str = "KEEP(u, 'username', 'givenName', 'familyName', 'description', 'created')";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    #[serde(default)]
    pub given_name: String,
    #[serde(default)]
    pub family_name: String,
    #[serde(default)]
    pub description: String,
    pub created: i64,
}

/// What the token endpoint needs to authenticate a user
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Credentials {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub verified: bool,
    #[serde(default)]
    pub given_name: String,
    #[serde(default)]
    pub family_name: String,
}

/// Profile fields a user may change
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserPatch {
    pub given_name: Option<String>,
    pub family_name: Option<String>,
    pub description: Option<String>,
}

impl UserPatch {
    /// Only the fields that are set, under their stored names
    fn to_document(&self) -> Value {
        let mut doc = Map::new();
        let fields = [
            ("givenName", &self.given_name),
            ("familyName", &self.family_name),
            ("description", &self.description),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                doc.insert(key.to_string(), Value::String(value.clone()));
            }
        }
        Value::Object(doc)
    }
}

const CREATE_CHECKS: WriteChecks = WriteChecks {
    exists: &[],
    authorized: &[],
    unique: &[check("username", "user"), check("email", "email")],
};

const UPDATE_CHECKS: WriteChecks = WriteChecks {
    exists: &[check("user", "user")],
    authorized: &[],
    unique: &[],
};

pub fn create_statement(username: &str, email: &str, password_hash: &str) -> Statement {
    Statement::new(
        "user.create",
        format!(
            "LET checks = {{
                username: DOCUMENT('users', @username) == null,
                email: LENGTH(FOR u IN users FILTER u.email == @email LIMIT 1 RETURN 1) == 0
            }}
            LET created = (
                FOR ok IN (checks.username AND checks.email ? [1] : [])
                INSERT {{
                    _key: @username, username: @username, email: @email,
                    password: {{ hash: @hash }}, emailVerified: false,
                    givenName: '', familyName: '', description: '',
                    created: DATE_NOW()
                }} IN users
                LET u = NEW
                RETURN {PROFILE}
            )
            RETURN {{ checks, record: FIRST(created) }}"
        ),
    )
    .bind("username", username)
    .bind("email", email)
    .bind("hash", password_hash)
}

/// Creates a user with an unverified email
pub async fn create(
    store: &dyn GraphStore,
    username: &str,
    email: &str,
    password_hash: &str,
) -> ModelResult<User> {
    let statement = create_statement(username, email, password_hash);
    let outcome = store.execute(&statement).await?;
    CREATE_CHECKS.classify_into(statement.name, &outcome)
}

pub fn read_statement(username: &str) -> Statement {
    Statement::new(
        "user.read",
        format!("LET u = DOCUMENT('users', @username) RETURN u == null ? null : {PROFILE}"),
    )
    .bind("username", username)
}

pub async fn read(store: &dyn GraphStore, username: &str) -> ModelResult<Option<User>> {
    let outcome = store.execute(&read_statement(username)).await?;
    Ok(outcome.decode_first()?)
}

pub async fn exists(store: &dyn GraphStore, username: &str) -> ModelResult<bool> {
    Ok(read(store, username).await?.is_some())
}

/// Looks a user up by username or email
pub async fn read_credentials(
    store: &dyn GraphStore,
    identifier: &str,
) -> ModelResult<Option<Credentials>> {
    let statement = Statement::new(
        "user.read_credentials",
        "FOR u IN users
            FILTER u.username == @identifier OR u.email == @identifier
            LIMIT 1
            RETURN {
                username: u.username, email: u.email, passwordHash: u.password.hash,
                verified: u.emailVerified == true,
                givenName: u.givenName, familyName: u.familyName
            }",
    )
    .bind("identifier", identifier);

    let outcome = store.execute(&statement).await?;
    Ok(outcome.decode_first()?)
}

pub fn update_statement(username: &str, patch: &UserPatch) -> Statement {
    Statement::new(
        "user.update",
        format!(
            "LET user = DOCUMENT('users', @username)
            LET checks = {{ user: user != null }}
            LET updated = (
                FOR ok IN (checks.user ? [1] : [])
                UPDATE {{ _key: @username }} WITH @patch IN users
                LET u = NEW
                RETURN {PROFILE}
            )
            RETURN {{ checks, record: FIRST(updated) }}"
        ),
    )
    .bind("username", username)
    .bind("patch", patch.to_document())
}

pub async fn update(store: &dyn GraphStore, username: &str, patch: &UserPatch) -> ModelResult<User> {
    let statement = update_statement(username, patch);
    let outcome = store.execute(&statement).await?;
    UPDATE_CHECKS.classify_into(statement.name, &outcome)
}

/// Marks the email of a user as verified
pub async fn verify_email(store: &dyn GraphStore, username: &str) -> ModelResult<User> {
    let statement = Statement::new(
        "user.verify_email",
        format!(
            "LET user = DOCUMENT('users', @username)
            LET checks = {{ user: user != null }}
            LET updated = (
                FOR ok IN (checks.user ? [1] : [])
                UPDATE {{ _key: @username }} WITH {{ emailVerified: true }} IN users
                LET u = NEW
                RETURN {PROFILE}
            )
            RETURN {{ checks, record: FIRST(updated) }}"
        ),
    )
    .bind("username", username);

    let outcome = store.execute(&statement).await?;
    UPDATE_CHECKS.classify_into(statement.name, &outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_patch_only_sets_given_fields() {
        let patch = UserPatch {
            given_name: Some("Alice".into()),
            ..Default::default()
        };
        assert_eq!(patch.to_document(), json!({ "givenName": "Alice" }));
    }

    #[test]
    fn test_create_statement_never_returns_hash() {
        let statement = create_statement("alice", "alice@example.com", "$argon2id$...");
        assert_eq!(statement.var_str("hash"), Some("$argon2id$..."));
        assert!(statement.query.contains("KEEP(u,"));
        assert!(statement.query.contains("RETURN { checks, record: FIRST(created) }"));
    }

    #[test]
    fn test_update_statement_binds_patch() {
        let patch = UserPatch {
            description: Some("hi".into()),
            ..Default::default()
        };
        let statement = update_statement("alice", &patch);
        assert_eq!(statement.var("patch"), Some(&json!({ "description": "hi" })));
    }
}
