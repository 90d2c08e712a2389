//! Write Classification Tests
//!
//! Model operations against in-process stores:
//! - A refused write is classified from its own checks: missing entity,
//!   then authorization, then uniqueness
//! - A write costs exactly one statement, with no existence pre-query
//! - Reads of absent records are repeatable and write nothing
//! - List pagination is a slice of the canonical ordering

mod common;

use common::{write_row, FakeGraph, ScriptedStore};
use ditapi::models::dit::{self, DitFilter};
use ditapi::models::vote::{self, VoteTarget};
use ditapi::models::{contact, dit_tag, user, DitKind, ModelError, Page};
use ditapi::store::{QueryOutcome, StoreError};
use serde_json::{json, Value};

// =============================================================================
// Classification Priority
// =============================================================================

#[tokio::test]
async fn test_missing_parent_is_not_found_never_forbidden() {
    let store = ScriptedStore::new(vec![write_row(
        json!({ "dit": false, "tag": true, "creator": false, "unique": true }),
        Value::Null,
        0,
    )]);

    let err = dit_tag::create(&store, DitKind::Idea, "12", "rust", "alice").await.unwrap_err();

    assert_eq!(err, ModelError::NotFound("idea"));
    assert_eq!(err.status_code(), 404);
}

#[tokio::test]
async fn test_unauthorized_actor_is_forbidden() {
    let store = ScriptedStore::new(vec![write_row(
        json!({ "dit": true, "tag": true, "creator": false, "unique": false }),
        Value::Null,
        0,
    )]);

    let err = dit_tag::create(&store, DitKind::Challenge, "12", "rust", "bob").await.unwrap_err();

    assert_eq!(err, ModelError::Forbidden("only the creator can tag this challenge"));
}

#[tokio::test]
async fn test_duplicate_is_conflict() {
    let store = ScriptedStore::new(vec![write_row(
        json!({ "dit": true, "tag": true, "creator": true, "unique": false }),
        Value::Null,
        0,
    )]);

    let err = dit_tag::create(&store, DitKind::Idea, "12", "rust", "alice").await.unwrap_err();

    assert_eq!(err, ModelError::Conflict("idea tag"));
    assert_eq!(err.status_code(), 409);
}

#[tokio::test]
async fn test_successful_write_decodes_record() {
    let record = json!({ "dit": "12", "tagname": "rust", "creator": "alice", "created": 1 });
    let store = ScriptedStore::new(vec![write_row(
        json!({ "dit": true, "tag": true, "creator": true, "unique": true }),
        record,
        1,
    )]);

    let tagged = dit_tag::create(&store, DitKind::Idea, "12", "rust", "alice").await.unwrap();

    assert_eq!(tagged.tagname, "rust");
    assert_eq!(store.names(), vec!["dit_tag.create"]);
}

#[tokio::test]
async fn test_write_is_a_single_statement() {
    let store = ScriptedStore::new(vec![write_row(json!({ "target": false }), Value::Null, 0)]);

    let err = vote::create(&store, VoteTarget::Comment("5"), "alice", 1).await.unwrap_err();

    assert_eq!(err, ModelError::NotFound("comment"));
    let statements = store.statements();
    assert_eq!(statements.len(), 1);
    assert_eq!(statements[0].var_str("from"), Some("users/alice"));
    assert_eq!(statements[0].var_str("to"), Some("comments/5"));
}

#[tokio::test]
async fn test_confirming_twice_is_forbidden() {
    let store = ScriptedStore::new(vec![write_row(
        json!({ "contact": true, "unconfirmed": false }),
        Value::Null,
        0,
    )]);

    let err = contact::confirm(&store, "alice", "bob", 4, "r").await.unwrap_err();

    assert_eq!(err, ModelError::Forbidden("contact is already confirmed"));
}

fn message_patch(message: &str) -> contact::ContactPatch {
    contact::ContactPatch {
        message: Some(message.to_string()),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_message_change_after_confirmation_is_forbidden() {
    let store = ScriptedStore::new(vec![write_row(
        json!({ "contact": true, "party": true, "messageAuthor": true, "messageEditable": false }),
        Value::Null,
        0,
    )]);

    let err = contact::update(&store, "alice", "bob", "alice", &message_patch("hi again"))
        .await
        .unwrap_err();

    assert_eq!(
        err,
        ModelError::Forbidden("message cannot be changed after the contact is confirmed")
    );
    assert_eq!(err.status_code(), 403);
}

#[tokio::test]
async fn test_receiver_cannot_rewrite_message() {
    let store = ScriptedStore::new(vec![write_row(
        json!({ "contact": true, "party": true, "messageAuthor": false, "messageEditable": true }),
        Value::Null,
        0,
    )]);

    let err = contact::update(&store, "alice", "bob", "bob", &message_patch("hi from alice"))
        .await
        .unwrap_err();

    assert_eq!(err, ModelError::Forbidden("only the requester can change the message"));
    assert_eq!(store.statements()[0].var_str("side"), Some("to"));
}

#[tokio::test]
async fn test_missing_contact_update_is_not_found() {
    let store = ScriptedStore::new(vec![write_row(
        json!({ "contact": false, "party": false, "messageAuthor": false, "messageEditable": false }),
        Value::Null,
        0,
    )]);

    let err = contact::update(&store, "alice", "bob", "carol", &message_patch("x"))
        .await
        .unwrap_err();

    assert_eq!(err, ModelError::NotFound("contact"));
}

#[tokio::test]
async fn test_non_party_update_is_forbidden() {
    let patch = contact::ContactPatch {
        trust: Some(8),
        ..Default::default()
    };
    let store = ScriptedStore::new(vec![write_row(
        json!({ "contact": true, "party": false, "messageAuthor": true, "messageEditable": true }),
        Value::Null,
        0,
    )]);

    let err = contact::update(&store, "alice", "bob", "carol", &patch).await.unwrap_err();

    assert_eq!(err, ModelError::Forbidden("you are not a party of this contact"));
    assert_eq!(store.names(), vec!["contact.update"]);
}

/// Nothing written and no check failed: the outcome is not guessed.
#[tokio::test]
async fn test_unexplained_refusal_is_unclassified() {
    let store = ScriptedStore::new(vec![write_row(
        json!({ "contact": true, "unconfirmed": true }),
        Value::Null,
        0,
    )]);

    let err = contact::confirm(&store, "alice", "bob", 4, "r").await.unwrap_err();

    assert_eq!(err, ModelError::Unclassified("contact.confirm"));
    assert_eq!(err.status_code(), 500);
}

#[tokio::test]
async fn test_store_failure_passes_through() {
    let store = ScriptedStore::failing(StoreError::Transport("connection refused".into()));

    let err = vote::remove(&store, VoteTarget::Dit(DitKind::Idea, "3"), "alice").await.unwrap_err();

    assert!(matches!(err, ModelError::Store(StoreError::Transport(_))));
    assert_eq!(err.code(), "DIT_STORE_UNREACHABLE");
}

// =============================================================================
// Idempotent Reads
// =============================================================================

#[tokio::test]
async fn test_absent_user_read_twice() {
    let store = ScriptedStore::new(vec![
        QueryOutcome::rows(vec![Value::Null]),
        QueryOutcome::rows(vec![Value::Null]),
    ]);

    assert_eq!(user::read(&store, "ghost").await.unwrap(), None);
    assert_eq!(user::read(&store, "ghost").await.unwrap(), None);

    let statements = store.statements();
    assert_eq!(statements[0], statements[1]);
}

#[tokio::test]
async fn test_absent_contact_read_changes_nothing() {
    let graph = FakeGraph::with_users(&["alice", "bob"]);

    let first = contact::read(&graph, "alice", "bob").await.unwrap();
    let second = contact::read(&graph, "alice", "bob").await.unwrap();

    assert_eq!(first, None);
    assert_eq!(second, None);
    assert_eq!(graph.contact_count(), 0);
}

// =============================================================================
// Pagination Contract
// =============================================================================

#[tokio::test]
async fn test_pages_are_slices_of_the_full_ordering() {
    let graph = FakeGraph::with_users(&["alice"]);
    for n in 0..7 {
        let tags: &[&str] = if n % 3 == 0 { &["tag-a", "tag-b"] } else { &["tag-a"] };
        graph.add_idea(&format!("idea {}", n), "alice", tags);
    }
    let filter = DitFilter::WithTags(vec!["tag-a".into(), "tag-b".into()]);

    let full = dit::list(&graph, DitKind::Idea, &filter, Page::new(0, 20)).await.unwrap();
    assert_eq!(full.len(), 7);

    for (offset, limit) in [(0, 1), (0, 5), (2, 3), (5, 5), (7, 2), (10, 5), (3, 0)] {
        let page = dit::list(&graph, DitKind::Idea, &filter, Page::new(offset, limit))
            .await
            .unwrap();
        let n = full.len() as u64;
        let expected_len = limit.min(n.saturating_sub(offset)) as usize;
        assert_eq!(page.len(), expected_len, "offset {} limit {}", offset, limit);

        let start = (offset as usize).min(full.len());
        assert_eq!(page, full[start..start + expected_len].to_vec());
    }
}

#[tokio::test]
async fn test_with_tags_ranks_by_matched_tags() {
    let graph = FakeGraph::with_users(&["alice"]);
    let one = graph.add_idea("one tag", "alice", &["tag-a"]);
    let both = graph.add_idea("both tags", "alice", &["tag-a", "tag-b"]);

    let filter = DitFilter::WithTags(vec!["tag-a".into(), "tag-b".into()]);
    let ideas = dit::list(&graph, DitKind::Idea, &filter, Page::default()).await.unwrap();

    let ids: Vec<&str> = ideas.iter().map(|d| d.id.as_str()).collect();
    assert_eq!(ids, vec![both.as_str(), one.as_str()]);
    assert_eq!(ideas[0].matched_tags.as_ref().map(Vec::len), Some(2));
}

#[test]
fn test_page_limit_is_capped() {
    assert_eq!(Page::new(0, 500).limit, 20);
    assert_eq!(Page::default(), Page::new(0, 5));
}
