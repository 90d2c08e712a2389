//! Dit HTTP Routes
//!
//! Ideas and challenges are served by the same handlers. `dit_routes` is
//! mounted once per kind and hands the kind to every handler as a request
//! extension.

use std::sync::Arc;

use axum::{
    extract::State,
    response::Response,
    routing::{delete, get, post},
    Extension, Router,
};
use serde::Deserialize;
use serde_json::Value;

use crate::auth::AuthError;
use crate::gate::Endpoint;
use crate::models::comment::{self, CommentSort};
use crate::models::dit::{self, DitFilter, DitPatch};
use crate::models::vote::{self, VoteTarget};
use crate::models::{care, dit_tag, DitKind, Page};

use super::errors::{ApiError, ApiResult};
use super::extract::{Caller, JsonBody, PathParams, QueryData};
use super::server::{created, decode_body, no_content, ok, request_data, AppState};

pub fn dit_routes(kind: DitKind) -> Router<Arc<AppState>> {
    let base = format!("/{}", kind.collection());

    Router::new()
        .route(&base, get(get_dits).post(post_dits))
        .route(&format!("{base}/:id"), get(get_dit).patch(patch_dit))
        .route(&format!("{base}/:id/tags"), get(get_dit_tags).post(post_dit_tags))
        .route(&format!("{base}/:id/tags/:tagname"), delete(delete_dit_tag))
        .route(&format!("{base}/:id/votes"), post(post_votes))
        .route(&format!("{base}/:id/votes/vote"), delete(delete_vote))
        .route(&format!("{base}/:id/comments"), get(get_comments).post(post_comments))
        .route(&format!("{base}/:id/cares"), post(post_cares))
        .route(&format!("{base}/:id/cares/care"), delete(delete_care))
        .layer(Extension(kind))
}

#[derive(Debug, Deserialize)]
struct NewDitBody {
    title: String,
    #[serde(default)]
    detail: String,
}

#[derive(Debug, Deserialize)]
struct DitPatchBody {
    title: Option<String>,
    detail: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TagBody {
    tagname: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct VoteBody {
    pub(super) value: i8,
}

#[derive(Debug, Deserialize)]
struct CommentBody {
    content: String,
}

/// Reads the listing out of a `getDits` query that passed its gate
fn dit_filter(query: &Value, caller: &Caller) -> ApiResult<DitFilter> {
    let Some(filter) = query.get("filter") else {
        return Ok(DitFilter::New);
    };

    let strings = |pointer: &str| -> Vec<String> {
        filter
            .pointer(pointer)
            .and_then(Value::as_array)
            .map(|items| items.iter().filter_map(Value::as_str).map(str::to_string).collect())
            .unwrap_or_default()
    };

    let listing = if filter.get("random").is_some() {
        DitFilter::Random
    } else if filter.get("withMyTags").is_some() {
        let me = caller.username().ok_or(AuthError::AuthenticationRequired)?;
        DitFilter::WithMyTags(me.to_string())
    } else if filter.get("withTags").is_some() {
        DitFilter::WithTags(strings("/withTags"))
    } else if filter.get("creators").is_some() {
        DitFilter::WithCreators(strings("/creators"))
    } else if let Some(threshold) = filter.pointer("/highlyVoted/0").and_then(Value::as_str) {
        let threshold = threshold
            .parse()
            .map_err(|_| ApiError::Malformed(format!("invalid vote threshold '{threshold}'")))?;
        DitFilter::HighlyVoted(threshold)
    } else if filter.get("trending").is_some() {
        DitFilter::Trending
    } else if filter.get("title").is_some() {
        DitFilter::TitleLike(strings("/title/like"))
    } else {
        return Err(ApiError::Malformed("unknown dit filter".to_string()));
    };
    Ok(listing)
}

async fn post_dits(
    State(state): State<Arc<AppState>>,
    Extension(kind): Extension<DitKind>,
    caller: Caller,
    query: QueryData,
    body: JsonBody,
) -> ApiResult<Response> {
    let me = caller.verified()?.to_string();
    let request = request_data(&caller, PathParams::default(), query, body);
    state.admit(Endpoint::PostDits, &request)?;

    let body: NewDitBody = decode_body(&request)?;
    let created_dit = dit::create(state.store(), kind, &me, &body.title, &body.detail).await?;
    Ok(created(created_dit))
}

async fn get_dits(
    State(state): State<Arc<AppState>>,
    Extension(kind): Extension<DitKind>,
    caller: Caller,
    query: QueryData,
) -> ApiResult<Response> {
    let request = request_data(&caller, PathParams::default(), query, JsonBody(None));
    state.admit(Endpoint::GetDits, &request)?;

    let filter = dit_filter(&request.query, &caller)?;
    let dits = dit::list(state.store(), kind, &filter, Page::from_query(&request.query)).await?;
    Ok(ok(dits))
}

async fn get_dit(
    State(state): State<Arc<AppState>>,
    Extension(kind): Extension<DitKind>,
    caller: Caller,
    params: PathParams,
    query: QueryData,
) -> ApiResult<Response> {
    let request = request_data(&caller, params, query, JsonBody(None));
    state.admit(Endpoint::GetDit, &request)?;

    let id = request.param("id").unwrap_or_default();
    let found = dit::read(state.store(), kind, id, caller.username())
        .await?
        .ok_or(ApiError::NotFound(kind.label()))?;
    Ok(ok(found))
}

async fn patch_dit(
    State(state): State<Arc<AppState>>,
    Extension(kind): Extension<DitKind>,
    caller: Caller,
    params: PathParams,
    query: QueryData,
    body: JsonBody,
) -> ApiResult<Response> {
    let me = caller.verified()?.to_string();
    let request = request_data(&caller, params, query, body);
    state.admit(Endpoint::PatchDit, &request)?;

    let body: DitPatchBody = decode_body(&request)?;
    let patch = DitPatch {
        title: body.title,
        detail: body.detail,
    };
    let id = request.param("id").unwrap_or_default();
    let updated = dit::update(state.store(), kind, id, &me, &patch).await?;
    Ok(ok(updated))
}

async fn post_dit_tags(
    State(state): State<Arc<AppState>>,
    Extension(kind): Extension<DitKind>,
    caller: Caller,
    params: PathParams,
    query: QueryData,
    body: JsonBody,
) -> ApiResult<Response> {
    let me = caller.verified()?.to_string();
    let request = request_data(&caller, params, query, body);
    state.admit(Endpoint::PostDitTags, &request)?;

    let body: TagBody = decode_body(&request)?;
    let id = request.param("id").unwrap_or_default();
    let tag = dit_tag::create(state.store(), kind, id, &body.tagname, &me).await?;
    Ok(created(tag))
}

async fn get_dit_tags(
    State(state): State<Arc<AppState>>,
    Extension(kind): Extension<DitKind>,
    caller: Caller,
    params: PathParams,
    query: QueryData,
) -> ApiResult<Response> {
    let request = request_data(&caller, params, query, JsonBody(None));
    state.admit(Endpoint::GetDitTags, &request)?;

    let id = request.param("id").unwrap_or_default();
    let tags = dit_tag::list_of_dit(state.store(), kind, id).await?;
    Ok(ok(tags))
}

async fn delete_dit_tag(
    State(state): State<Arc<AppState>>,
    Extension(kind): Extension<DitKind>,
    caller: Caller,
    params: PathParams,
    query: QueryData,
) -> ApiResult<Response> {
    let me = caller.verified()?.to_string();
    let request = request_data(&caller, params, query, JsonBody(None));
    state.admit(Endpoint::DeleteDitTag, &request)?;

    let id = request.param("id").unwrap_or_default();
    let tagname = request.param("tagname").unwrap_or_default();
    dit_tag::remove(state.store(), kind, id, tagname, &me).await?;
    Ok(no_content())
}

async fn post_votes(
    State(state): State<Arc<AppState>>,
    Extension(kind): Extension<DitKind>,
    caller: Caller,
    params: PathParams,
    query: QueryData,
    body: JsonBody,
) -> ApiResult<Response> {
    let me = caller.verified()?.to_string();
    let request = request_data(&caller, params, query, body);
    state.admit(Endpoint::PostVotes, &request)?;

    let body: VoteBody = decode_body(&request)?;
    let id = request.param("id").unwrap_or_default();
    let cast = vote::create(state.store(), VoteTarget::Dit(kind, id), &me, body.value).await?;
    Ok(created(cast))
}

async fn delete_vote(
    State(state): State<Arc<AppState>>,
    Extension(kind): Extension<DitKind>,
    caller: Caller,
    params: PathParams,
    query: QueryData,
) -> ApiResult<Response> {
    let me = caller.verified()?.to_string();
    let request = request_data(&caller, params, query, JsonBody(None));
    state.admit(Endpoint::DeleteVote, &request)?;

    let id = request.param("id").unwrap_or_default();
    vote::remove(state.store(), VoteTarget::Dit(kind, id), &me).await?;
    Ok(no_content())
}

async fn post_comments(
    State(state): State<Arc<AppState>>,
    Extension(kind): Extension<DitKind>,
    caller: Caller,
    params: PathParams,
    query: QueryData,
    body: JsonBody,
) -> ApiResult<Response> {
    let me = caller.verified()?.to_string();
    let request = request_data(&caller, params, query, body);
    state.admit(Endpoint::PostComments, &request)?;

    let body: CommentBody = decode_body(&request)?;
    let id = request.param("id").unwrap_or_default();
    let posted = comment::create(state.store(), kind, id, &me, &body.content).await?;
    Ok(created(posted))
}

async fn get_comments(
    State(state): State<Arc<AppState>>,
    Extension(kind): Extension<DitKind>,
    caller: Caller,
    params: PathParams,
    query: QueryData,
) -> ApiResult<Response> {
    let request = request_data(&caller, params, query, JsonBody(None));
    state.admit(Endpoint::GetComments, &request)?;

    let id = request.param("id").unwrap_or_default();
    let sort = CommentSort::from_param(request.query.get("sort").and_then(Value::as_str));
    let comments =
        comment::list_of_dit(state.store(), kind, id, Page::from_query(&request.query), sort).await?;
    Ok(ok(comments))
}

async fn post_cares(
    State(state): State<Arc<AppState>>,
    Extension(kind): Extension<DitKind>,
    caller: Caller,
    params: PathParams,
    query: QueryData,
    body: JsonBody,
) -> ApiResult<Response> {
    let me = caller.verified()?.to_string();
    let request = request_data(&caller, params, query, body);
    state.admit(Endpoint::PostCares, &request)?;

    let id = request.param("id").unwrap_or_default();
    let cared = care::create(state.store(), kind, id, &me).await?;
    Ok(created(cared))
}

async fn delete_care(
    State(state): State<Arc<AppState>>,
    Extension(kind): Extension<DitKind>,
    caller: Caller,
    params: PathParams,
    query: QueryData,
) -> ApiResult<Response> {
    let me = caller.verified()?.to_string();
    let request = request_data(&caller, params, query, JsonBody(None));
    state.admit(Endpoint::DeleteCare, &request)?;

    let id = request.param("id").unwrap_or_default();
    care::remove(state.store(), kind, id, &me).await?;
    Ok(no_content())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::request::{parse_query, AuthInfo};

    fn filter_of(pairs: &[(&str, &str)], caller: &Caller) -> ApiResult<DitFilter> {
        dit_filter(&parse_query(pairs.iter().copied()), caller)
    }

    #[test]
    fn test_filters_from_query() {
        let anonymous = Caller(AuthInfo::anonymous());
        assert_eq!(filter_of(&[("sort", "-created")], &anonymous).unwrap(), DitFilter::New);
        assert_eq!(
            filter_of(&[("filter[withTags]", "tag-a,tag-b")], &anonymous).unwrap(),
            DitFilter::WithTags(vec!["tag-a".into(), "tag-b".into()])
        );
        assert_eq!(
            filter_of(&[("filter[highlyVoted]", "3")], &anonymous).unwrap(),
            DitFilter::HighlyVoted(3)
        );
        assert_eq!(
            filter_of(&[("filter[title][like]", "solar,panel")], &anonymous).unwrap(),
            DitFilter::TitleLike(vec!["solar".into(), "panel".into()])
        );
        assert_eq!(filter_of(&[("filter[trending]", "")], &anonymous).unwrap(), DitFilter::Trending);
        assert_eq!(
            filter_of(&[("filter[creators]", "42,ab")], &anonymous).unwrap(),
            DitFilter::WithCreators(vec!["42".into(), "ab".into()])
        );
    }

    #[test]
    fn test_unparsable_threshold_rejected() {
        let anonymous = Caller(AuthInfo::anonymous());
        assert!(matches!(
            filter_of(&[("filter[highlyVoted]", "99999999999999999999")], &anonymous),
            Err(ApiError::Malformed(_))
        ));
    }

    #[test]
    fn test_with_my_tags_needs_caller() {
        let anonymous = Caller(AuthInfo::anonymous());
        assert!(matches!(
            filter_of(&[("filter[withMyTags]", "")], &anonymous),
            Err(ApiError::Auth(AuthError::AuthenticationRequired))
        ));

        let alice = Caller(AuthInfo::verified("alice"));
        assert_eq!(
            filter_of(&[("filter[withMyTags]", "")], &alice).unwrap(),
            DitFilter::WithMyTags("alice".into())
        );
    }
}
