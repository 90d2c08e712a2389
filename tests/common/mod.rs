//! Shared test helpers
//!
//! Two in-process graph stores replace the database:
//! - `ScriptedStore` answers with canned outcomes and records every
//!   statement it receives
//! - `FakeGraph` keeps a tiny in-memory graph and understands the statements
//!   the HTTP scenarios need

#![allow(dead_code)]

use std::collections::{BTreeSet, VecDeque};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::{to_bytes, Body};
use axum::http::{header, Method, Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tower::ServiceExt;

use ditapi::auth::JwtManager;
use ditapi::config::JwtConfig;
use ditapi::gate::Gates;
use ditapi::http_server::{ApiServer, AppState, HttpServerConfig};
use ditapi::models::user::Credentials;
use ditapi::schema::SchemaRegistry;
use ditapi::store::{GraphStore, QueryOutcome, Statement, StoreError, StoreResult};

// =============================================================================
// Scripted store
// =============================================================================

/// Replays canned outcomes in order; an exhausted script yields empty reads
#[derive(Default)]
pub struct ScriptedStore {
    script: Mutex<VecDeque<StoreResult<QueryOutcome>>>,
    executed: Mutex<Vec<Statement>>,
}

impl ScriptedStore {
    pub fn new(outcomes: Vec<QueryOutcome>) -> Self {
        Self {
            script: Mutex::new(outcomes.into_iter().map(Ok).collect()),
            executed: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(error: StoreError) -> Self {
        Self {
            script: Mutex::new(VecDeque::from([Err(error)])),
            executed: Mutex::new(Vec::new()),
        }
    }

    pub fn statements(&self) -> Vec<Statement> {
        self.executed.lock().unwrap().clone()
    }

    pub fn names(&self) -> Vec<&'static str> {
        self.statements().iter().map(|s| s.name).collect()
    }
}

#[async_trait]
impl GraphStore for ScriptedStore {
    async fn execute(&self, statement: &Statement) -> StoreResult<QueryOutcome> {
        self.executed.lock().unwrap().push(statement.clone());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(QueryOutcome::default()))
    }
}

/// One conditional-write row: `{ checks, record }`
pub fn write_row(checks: Value, record: Value, writes: u64) -> QueryOutcome {
    QueryOutcome::new(vec![json!({ "checks": checks, "record": record })], writes)
}

// =============================================================================
// Fake graph
// =============================================================================

#[derive(Debug, Clone)]
struct FakeContact {
    from: String,
    to: String,
    from_side: Value,
    to_side: Value,
    message: String,
    created: i64,
    confirmed: Option<i64>,
}

impl FakeContact {
    fn record(&self) -> Value {
        let mut from = self.from_side.clone();
        from["username"] = json!(self.from);
        let mut to = self.to_side.clone();
        to["username"] = json!(self.to);
        json!({
            "from": from,
            "to": to,
            "message": self.message,
            "isConfirmed": self.confirmed.is_some(),
            "created": self.created,
            "confirmed": self.confirmed,
        })
    }
}

#[derive(Debug, Clone)]
struct FakeDit {
    collection: &'static str,
    id: String,
    title: String,
    created: i64,
    creator: String,
    tags: Vec<String>,
}

#[derive(Default)]
struct Graph {
    clock: i64,
    users: BTreeSet<String>,
    contacts: Vec<FakeContact>,
    dits: Vec<FakeDit>,
}

impl Graph {
    fn tick(&mut self) -> i64 {
        self.clock += 1;
        self.clock
    }
}

/// In-memory graph for end-to-end scenarios
#[derive(Default)]
pub struct FakeGraph {
    graph: Mutex<Graph>,
}

fn key(handle: Option<&str>) -> String {
    handle
        .and_then(|h| h.split('/').nth(1))
        .unwrap_or_default()
        .to_string()
}

impl FakeGraph {
    pub fn with_users(usernames: &[&str]) -> Self {
        let fake = Self::default();
        {
            let mut graph = fake.graph.lock().unwrap();
            graph.users.extend(usernames.iter().map(|u| u.to_string()));
        }
        fake
    }

    /// Adds an idea carrying the given tags; returns its id
    pub fn add_idea(&self, title: &str, creator: &str, tags: &[&str]) -> String {
        let mut graph = self.graph.lock().unwrap();
        let created = graph.tick();
        let id = (graph.dits.len() + 1).to_string();
        graph.dits.push(FakeDit {
            collection: "ideas",
            id: id.clone(),
            title: title.to_string(),
            created,
            creator: creator.to_string(),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        });
        id
    }

    pub fn contact_count(&self) -> usize {
        self.graph.lock().unwrap().contacts.len()
    }

    fn contact_create(&self, statement: &Statement) -> QueryOutcome {
        let mut graph = self.graph.lock().unwrap();
        let from = key(statement.var_str("from"));
        let to = key(statement.var_str("to"));

        let from_exists = graph.users.contains(&from);
        let to_exists = graph.users.contains(&to);
        let unique = !graph
            .contacts
            .iter()
            .any(|c| (c.from == from && c.to == to) || (c.from == to && c.to == from));

        if !(from_exists && to_exists && unique) {
            return write_row(
                json!({ "from": from_exists, "to": to_exists, "unique": unique }),
                Value::Null,
                0,
            );
        }

        let created = graph.tick();
        let contact = FakeContact {
            from,
            to,
            from_side: json!({
                "trust": statement.var("trust").cloned().unwrap_or(Value::Null),
                "reference": statement.var("reference").cloned().unwrap_or(Value::Null),
            }),
            to_side: json!({ "trust": null, "reference": null }),
            message: statement.var_str("message").unwrap_or_default().to_string(),
            created,
            confirmed: None,
        };
        let record = contact.record();
        graph.contacts.push(contact);
        write_row(json!({ "from": true, "to": true, "unique": true }), record, 1)
    }

    fn contact_read(&self, statement: &Statement) -> QueryOutcome {
        let graph = self.graph.lock().unwrap();
        let from = key(statement.var_str("from"));
        let to = key(statement.var_str("to"));
        let row = graph
            .contacts
            .iter()
            .find(|c| c.from == from && c.to == to)
            .map_or(Value::Null, FakeContact::record);
        QueryOutcome::rows(vec![row])
    }

    fn contact_confirm(&self, statement: &Statement) -> QueryOutcome {
        let mut graph = self.graph.lock().unwrap();
        let from = key(statement.var_str("from"));
        let to = key(statement.var_str("to"));
        let now = graph.tick();

        let Some(contact) = graph.contacts.iter_mut().find(|c| c.from == from && c.to == to) else {
            return write_row(json!({ "contact": false, "unconfirmed": false }), Value::Null, 0);
        };
        if contact.confirmed.is_some() {
            return write_row(json!({ "contact": true, "unconfirmed": false }), Value::Null, 0);
        }

        contact.confirmed = Some(now);
        contact.to_side = json!({
            "trust": statement.var("trust").cloned().unwrap_or(Value::Null),
            "reference": statement.var("reference").cloned().unwrap_or(Value::Null),
        });
        write_row(json!({ "contact": true, "unconfirmed": true }), contact.record(), 1)
    }

    fn contact_update(&self, statement: &Statement) -> QueryOutcome {
        let mut graph = self.graph.lock().unwrap();
        let from = key(statement.var_str("from"));
        let to = key(statement.var_str("to"));
        let issuer = statement.var_str("issuer").unwrap_or_default().to_string();
        let side_patch = statement.var("sidePatch").cloned().unwrap_or_else(|| json!({}));
        let message = statement
            .var("messagePatch")
            .and_then(|patch| patch.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string);

        let party = issuer == from || issuer == to;
        let message_author = message.is_none() || issuer == from;
        let Some(contact) = graph.contacts.iter_mut().find(|c| c.from == from && c.to == to) else {
            let checks = json!({
                "contact": false, "party": party,
                "messageAuthor": message_author, "messageEditable": false,
            });
            return write_row(checks, Value::Null, 0);
        };
        let message_editable = message.is_none() || contact.confirmed.is_none();
        let checks = json!({
            "contact": true, "party": party,
            "messageAuthor": message_author, "messageEditable": message_editable,
        });
        if !(party && message_author && message_editable) {
            return write_row(checks, Value::Null, 0);
        }

        let side = if issuer == from {
            &mut contact.from_side
        } else {
            &mut contact.to_side
        };
        if let (Value::Object(side), Value::Object(patch)) = (side, side_patch) {
            side.extend(patch);
        }
        if let Some(message) = message {
            contact.message = message;
        }
        write_row(checks, contact.record(), 1)
    }

    fn dit_with_tags(&self, statement: &Statement) -> QueryOutcome {
        let graph = self.graph.lock().unwrap();
        let collection = match statement.var_str("@tagEdges") {
            Some("challengeTags") => "challenges",
            _ => "ideas",
        };
        let wanted: Vec<&str> = statement
            .var("tagnames")
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).collect())
            .unwrap_or_default();
        let offset = statement.var("offset").and_then(Value::as_u64).unwrap_or(0) as usize;
        let limit = statement.var("limit").and_then(Value::as_u64).unwrap_or(5) as usize;

        let mut matches: Vec<(&FakeDit, Vec<String>)> = graph
            .dits
            .iter()
            .filter(|d| d.collection == collection)
            .map(|d| {
                let matched: Vec<String> = d
                    .tags
                    .iter()
                    .filter(|t| wanted.contains(&t.as_str()))
                    .cloned()
                    .collect();
                (d, matched)
            })
            .filter(|(_, matched)| !matched.is_empty())
            .collect();
        matches.sort_by(|(a, am), (b, bm)| bm.len().cmp(&am.len()).then(a.created.cmp(&b.created)));

        let rows = matches
            .into_iter()
            .skip(offset)
            .take(limit)
            .map(|(d, matched)| {
                json!({
                    "id": d.id,
                    "title": d.title,
                    "detail": "",
                    "created": d.created,
                    "creator": d.creator,
                    "matchedTags": matched,
                })
            })
            .collect();
        QueryOutcome::rows(rows)
    }
}

#[async_trait]
impl GraphStore for FakeGraph {
    async fn execute(&self, statement: &Statement) -> StoreResult<QueryOutcome> {
        match statement.name {
            "contact.create" => Ok(self.contact_create(statement)),
            "contact.read" => Ok(self.contact_read(statement)),
            "contact.confirm" => Ok(self.contact_confirm(statement)),
            "contact.update" => Ok(self.contact_update(statement)),
            "dit.with_tags" => Ok(self.dit_with_tags(statement)),
            other => Err(StoreError::Engine {
                status: 400,
                num: 1501,
                message: format!("fake graph does not understand '{}'", other),
            }),
        }
    }
}

// =============================================================================
// HTTP harness
// =============================================================================

pub fn jwt_config() -> JwtConfig {
    JwtConfig {
        secret: "test-secret".to_string(),
        ..JwtConfig::default()
    }
}

/// The full router over the given store, with the built-in schemas
pub fn app(store: Arc<dyn GraphStore>) -> Router {
    let registry = SchemaRegistry::builtin().unwrap();
    let gates = Gates::build(&registry).unwrap();
    let state = Arc::new(AppState::new(store, gates, JwtManager::new(&jwt_config())));
    ApiServer::build_router(&HttpServerConfig::default(), state)
}

/// A bearer token as `/auth/token` would issue it
pub fn token(username: &str, verified: bool) -> String {
    let credentials = Credentials {
        username: username.to_string(),
        email: format!("{}@example.com", username),
        password_hash: String::new(),
        verified,
        given_name: String::new(),
        family_name: String::new(),
    };
    JwtManager::new(&jwt_config()).issue(&credentials).unwrap()
}

/// Sends one request; the response body is `null` when empty
pub async fn send(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => request.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}
