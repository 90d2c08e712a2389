//! Ideas and challenges
//!
//! Both kinds of dit share one shape and one set of operations; the kind
//! only selects the document collection and the tag edge collection.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::store::{GraphStore, Statement};

use super::classify::{check, WriteChecks};
use super::errors::ModelResult;
use super::{user_id, Page};

const DIT: &str = "{ id: d._key, title: d.title, detail: d.detail, created: d.created, creator: d.creator }";

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DitKind {
    Idea,
    Challenge,
}

impl DitKind {
    pub fn collection(&self) -> &'static str {
        match self {
            DitKind::Idea => "ideas",
            DitKind::Challenge => "challenges",
        }
    }

    /// Edge collection linking dits of this kind to tags
    pub fn tag_edges(&self) -> &'static str {
        match self {
            DitKind::Idea => "ideaTags",
            DitKind::Challenge => "challengeTags",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DitKind::Idea => "idea",
            DitKind::Challenge => "challenge",
        }
    }

    /// `ideas/<id>` document handle
    pub fn handle(&self, id: &str) -> String {
        format!("{}/{}", self.collection(), id)
    }
}

impl fmt::Display for DitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dit {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub detail: String,
    pub created: i64,
    pub creator: String,
    /// Sum of all vote values (reads only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vote_sum: Option<i64>,
    /// The requester's own vote (reads only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub my_vote: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cares: Option<u64>,
    /// Tags that made the dit match a tag filter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matched_tags: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DitPatch {
    pub title: Option<String>,
    pub detail: Option<String>,
}

impl DitPatch {
    fn to_document(&self) -> Value {
        let mut doc = Map::new();
        if let Some(title) = &self.title {
            doc.insert("title".into(), Value::String(title.clone()));
        }
        if let Some(detail) = &self.detail {
            doc.insert("detail".into(), Value::String(detail.clone()));
        }
        Value::Object(doc)
    }
}

/// Ways to list dits
#[derive(Debug, Clone, PartialEq)]
pub enum DitFilter {
    /// Newest first
    New,
    Random,
    /// Sum of the user's relevance over shared tags, highest first
    WithMyTags(String),
    /// Most matched tags first, then oldest first
    WithTags(Vec<String>),
    WithCreators(Vec<String>),
    /// Vote sum at least the threshold, highest first
    HighlyVoted(i64),
    /// Recency weighted vote score, highest first; non-positive scores excluded
    Trending,
    /// Titles containing any keyword, most matching keywords first
    TitleLike(Vec<String>),
}

const CREATE_CHECKS: WriteChecks = WriteChecks {
    exists: &[check("creator", "user")],
    authorized: &[],
    unique: &[],
};

const IDEA_UPDATE_CHECKS: WriteChecks = WriteChecks {
    exists: &[check("dit", "idea")],
    authorized: &[check("creator", "only the creator can edit this idea")],
    unique: &[],
};

const CHALLENGE_UPDATE_CHECKS: WriteChecks = WriteChecks {
    exists: &[check("dit", "challenge")],
    authorized: &[check("creator", "only the creator can edit this challenge")],
    unique: &[],
};

pub async fn create(
    store: &dyn GraphStore,
    kind: DitKind,
    creator: &str,
    title: &str,
    detail: &str,
) -> ModelResult<Dit> {
    let statement = Statement::new(
        "dit.create",
        format!(
            "LET checks = {{ creator: DOCUMENT(@creatorId) != null }}
            LET created = (
                FOR ok IN (checks.creator ? [1] : [])
                INSERT {{ title: @title, detail: @detail, created: DATE_NOW(), creator: @creator }} IN @@dits
                LET d = NEW
                RETURN {DIT}
            )
            RETURN {{ checks, record: FIRST(created) }}"
        ),
    )
    .bind("@dits", kind.collection())
    .bind("creatorId", user_id(creator))
    .bind("creator", creator)
    .bind("title", title)
    .bind("detail", detail);

    let outcome = store.execute(&statement).await?;
    CREATE_CHECKS.classify_into(statement.name, &outcome)
}

pub fn read_statement(kind: DitKind, id: &str, requester: Option<&str>) -> Statement {
    Statement::new(
        "dit.read",
        format!(
            "LET d = DOCUMENT(@@dits, @id)
            LET votes = (FOR v IN votes FILTER v._to == d._id RETURN v)
            LET cares = LENGTH(FOR c IN cares FILTER c._to == d._id RETURN 1)
            RETURN d == null ? null : MERGE({DIT}, {{
                voteSum: SUM(votes[*].value),
                myVote: FIRST(FOR v IN votes FILTER v._from == @requester RETURN v.value),
                cares: cares
            }})"
        ),
    )
    .bind("@dits", kind.collection())
    .bind("id", id)
    .bind(
        "requester",
        requester.map_or(Value::Null, |username| Value::String(user_id(username))),
    )
}

/// A dit with its vote sum, the requester's vote and its care count
pub async fn read(
    store: &dyn GraphStore,
    kind: DitKind,
    id: &str,
    requester: Option<&str>,
) -> ModelResult<Option<Dit>> {
    let outcome = store.execute(&read_statement(kind, id, requester)).await?;
    Ok(outcome.decode_first()?)
}

pub async fn update(
    store: &dyn GraphStore,
    kind: DitKind,
    id: &str,
    editor: &str,
    patch: &DitPatch,
) -> ModelResult<Dit> {
    let statement = Statement::new(
        "dit.update",
        format!(
            "LET dit = DOCUMENT(@@dits, @id)
            LET checks = {{
                dit: dit != null,
                creator: dit != null AND dit.creator == @editor
            }}
            LET updated = (
                FOR ok IN (checks.dit AND checks.creator ? [1] : [])
                UPDATE dit WITH @patch IN @@dits
                LET d = NEW
                RETURN {DIT}
            )
            RETURN {{ checks, record: FIRST(updated) }}"
        ),
    )
    .bind("@dits", kind.collection())
    .bind("id", id)
    .bind("editor", editor)
    .bind("patch", patch.to_document());

    let checks = match kind {
        DitKind::Idea => IDEA_UPDATE_CHECKS,
        DitKind::Challenge => CHALLENGE_UPDATE_CHECKS,
    };
    let outcome = store.execute(&statement).await?;
    checks.classify_into(statement.name, &outcome)
}

/// Builds the listing statement; `now_ms` anchors the trending windows
pub fn list_statement(kind: DitKind, filter: &DitFilter, page: Page, now_ms: i64) -> Statement {
    let statement = match filter {
        DitFilter::New => Statement::new(
            "dit.new",
            format!("FOR d IN @@dits SORT d.created DESC LIMIT @offset, @limit RETURN {DIT}"),
        ),
        DitFilter::Random => Statement::new(
            "dit.random",
            format!("FOR d IN @@dits SORT RAND() LIMIT @offset, @limit RETURN {DIT}"),
        ),
        DitFilter::WithMyTags(username) => Statement::new(
            "dit.with_my_tags",
            format!(
                "FOR ut IN userTag
                    FILTER ut._from == @me
                    FOR dt IN @@tagEdges
                        FILTER dt._to == ut._to
                        COLLECT ditId = dt._from INTO matches = {{
                            tagname: PARSE_IDENTIFIER(ut._to).key, relevance: ut.relevance
                        }}
                        LET d = DOCUMENT(ditId)
                        LET relevance = SUM(matches[*].relevance)
                        SORT relevance DESC, d.created DESC
                        LIMIT @offset, @limit
                        RETURN MERGE({DIT}, {{ matchedTags: matches[*].tagname }})"
            ),
        )
        .bind("@tagEdges", kind.tag_edges())
        .bind("me", user_id(username)),
        DitFilter::WithTags(tagnames) => Statement::new(
            "dit.with_tags",
            format!(
                "FOR dt IN @@tagEdges
                    FILTER PARSE_IDENTIFIER(dt._to).key IN @tagnames
                    COLLECT ditId = dt._from INTO matched = PARSE_IDENTIFIER(dt._to).key
                    LET d = DOCUMENT(ditId)
                    SORT LENGTH(matched) DESC, d.created ASC
                    LIMIT @offset, @limit
                    RETURN MERGE({DIT}, {{ matchedTags: matched }})"
            ),
        )
        .bind("@tagEdges", kind.tag_edges())
        .bind("tagnames", tagnames.clone()),
        DitFilter::WithCreators(creators) => Statement::new(
            "dit.with_creators",
            format!(
                "FOR d IN @@dits
                    FILTER d.creator IN @creators
                    SORT d.created DESC
                    LIMIT @offset, @limit
                    RETURN {DIT}"
            ),
        )
        .bind("creators", creators.clone()),
        DitFilter::HighlyVoted(threshold) => Statement::new(
            "dit.highly_voted",
            format!(
                "FOR d IN @@dits
                    LET voteSum = SUM(FOR v IN votes FILTER v._to == d._id RETURN v.value)
                    FILTER voteSum >= @threshold
                    SORT voteSum DESC, d.created DESC
                    LIMIT @offset, @limit
                    RETURN MERGE({DIT}, {{ voteSum }})"
            ),
        )
        .bind("threshold", *threshold),
        DitFilter::Trending => Statement::new(
            "dit.trending",
            format!(
                "FOR d IN @@dits
                    LET vs = (FOR v IN votes FILTER v._to == d._id AND v.created >= @now - 90 * @day RETURN v)
                    LET week = SUM(FOR v IN vs FILTER v.created >= @now - 7 * @day RETURN v.value)
                    LET threeWeeks = SUM(
                        FOR v IN vs FILTER v.created < @now - 7 * @day AND v.created >= @now - 21 * @day RETURN v.value
                    )
                    LET older = SUM(FOR v IN vs FILTER v.created < @now - 21 * @day RETURN v.value)
                    LET score = 3 * week / 7 + 2 * threeWeeks / 14 + older / 69
                    FILTER score > 0
                    SORT score DESC
                    LIMIT @offset, @limit
                    RETURN {DIT}"
            ),
        )
        .bind("now", now_ms)
        .bind("day", DAY_MS),
        DitFilter::TitleLike(keywords) => Statement::new(
            "dit.search_title",
            format!(
                "FOR d IN @@dits
                    LET matches = LENGTH(
                        FOR k IN @keywords FILTER CONTAINS(LOWER(d.title), LOWER(k)) RETURN 1
                    )
                    FILTER matches > 0
                    SORT matches DESC, d.created DESC
                    LIMIT @offset, @limit
                    RETURN {DIT}"
            ),
        )
        .bind("keywords", keywords.clone()),
    };

    let statement = match filter {
        DitFilter::WithMyTags(_) | DitFilter::WithTags(_) => statement,
        _ => statement.bind("@dits", kind.collection()),
    };
    page.bind(statement)
}

pub async fn list(
    store: &dyn GraphStore,
    kind: DitKind,
    filter: &DitFilter,
    page: Page,
) -> ModelResult<Vec<Dit>> {
    let now = chrono::Utc::now().timestamp_millis();
    let outcome = store.execute(&list_statement(kind, filter, page, now)).await?;
    Ok(outcome.decode()?)
}
