//! Request model seen by gates
//!
//! The HTTP layer decodes path parameters, the query string and the JSON body
//! into a `RequestData`, attaches the caller identity taken from the bearer
//! token, and hands it to the endpoint gate.

use serde::Serialize;
use serde_json::{Map, Value};

/// Identity of the caller as established by the bearer token
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthInfo {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub logged: bool,
    pub logged_unverified: bool,
}

impl AuthInfo {
    pub fn anonymous() -> Self {
        Self::default()
    }

    /// Caller with a verified email
    pub fn verified(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            logged: true,
            logged_unverified: false,
        }
    }

    /// Caller who holds a token but has not verified their email yet
    pub fn unverified(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            logged: false,
            logged_unverified: true,
        }
    }
}

/// Everything a gate may look at
#[derive(Debug, Clone, PartialEq)]
pub struct RequestData {
    pub params: Map<String, Value>,
    pub query: Value,
    pub body: Option<Value>,
    pub auth: AuthInfo,
}

impl RequestData {
    pub fn new(auth: AuthInfo) -> Self {
        Self {
            params: Map::new(),
            query: Value::Object(Map::new()),
            body: None,
            auth,
        }
    }

    /// Adds path parameters; they are always strings
    pub fn with_params<I, K, V>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        for (key, value) in params {
            self.params.insert(key.into(), Value::String(value.into()));
        }
        self
    }

    /// Sets the already parsed query object (see [`parse_query`])
    pub fn with_query(mut self, query: Value) -> Self {
        self.query = query;
        self
    }

    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// The part of the request covered by endpoint schemas: `{params, query, body?}`
    pub fn shape(&self) -> Value {
        let mut shape = Map::new();
        shape.insert("params".into(), Value::Object(self.params.clone()));
        shape.insert("query".into(), self.query.clone());
        if let Some(body) = &self.body {
            shape.insert("body".into(), body.clone());
        }
        Value::Object(shape)
    }

    /// The full request `{params, query, body?, auth}` that field paths resolve against
    pub fn view(&self) -> Value {
        let mut view = self.shape();
        if let (Value::Object(map), Ok(auth)) = (&mut view, serde_json::to_value(&self.auth)) {
            map.insert("auth".into(), auth);
        }
        view
    }

    /// A path parameter as a string slice
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name).and_then(Value::as_str)
    }
}

/// Builds the nested query object from decoded `key=value` pairs.
///
/// Bracketed keys nest (`page[offset]` becomes `{"page": {"offset": ..}}`).
/// Values under `page` that are plain decimal integers become numbers.
/// Values under `filter` become arrays of comma separated string items, since
/// usernames and tagnames may be all digits; an empty filter value is the flag
/// `true`. Everything else stays a string. A repeated key keeps its last value.
pub fn parse_query<I, K, V>(pairs: I) -> Value
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut root = Map::new();

    for (key, value) in pairs {
        let segments = split_key(key.as_ref());
        let Some((first, rest)) = segments.split_first() else {
            continue;
        };

        let typed = match *first {
            "page" => page_value(value.as_ref()),
            "filter" => filter_value(value.as_ref()),
            _ => Value::String(value.as_ref().to_string()),
        };

        insert_nested(&mut root, first, rest, typed);
    }

    Value::Object(root)
}

/// `filter[title][like]` -> `["filter", "title", "like"]`; keys with
/// unbalanced brackets are kept whole
fn split_key(key: &str) -> Vec<&str> {
    let Some(open) = key.find('[') else {
        return if key.is_empty() { Vec::new() } else { vec![key] };
    };

    let mut segments = vec![&key[..open]];
    let mut rest = &key[open..];
    while !rest.is_empty() {
        let close = match (rest.starts_with('['), rest.find(']')) {
            (true, Some(close)) => close,
            _ => return vec![key],
        };
        segments.push(&rest[1..close]);
        rest = &rest[close + 1..];
    }

    if segments.iter().any(|segment| segment.is_empty()) {
        return vec![key];
    }
    segments
}

fn insert_nested(map: &mut Map<String, Value>, key: &str, rest: &[&str], value: Value) {
    match rest.split_first() {
        None => {
            map.insert(key.to_string(), value);
        }
        Some((next, tail)) => {
            let entry = map
                .entry(key.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            if let Value::Object(child) = entry {
                insert_nested(child, next, tail, value);
            }
        }
    }
}

fn page_value(raw: &str) -> Value {
    if !raw.is_empty() && raw.bytes().all(|b| b.is_ascii_digit()) {
        if let Ok(n) = raw.parse::<u64>() {
            return Value::from(n);
        }
    }
    Value::String(raw.to_string())
}

fn filter_value(raw: &str) -> Value {
    if raw.is_empty() {
        return Value::Bool(true);
    }
    Value::Array(
        raw.split(',')
            .map(|item| Value::String(item.to_string()))
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_page_values_are_numbers() {
        let query = parse_query([("page[offset]", "2"), ("page[limit]", "5")]);
        assert_eq!(query, json!({ "page": { "offset": 2, "limit": 5 } }));
    }

    #[test]
    fn test_non_numeric_page_value_stays_string() {
        let query = parse_query([("page[offset]", "-1")]);
        assert_eq!(query, json!({ "page": { "offset": "-1" } }));
    }

    #[test]
    fn test_filter_values_are_lists() {
        let query = parse_query([("filter[withTags]", "tag-a,tag-b"), ("filter[highlyVoted]", "3")]);
        assert_eq!(
            query,
            json!({ "filter": { "withTags": ["tag-a", "tag-b"], "highlyVoted": ["3"] } })
        );
    }

    #[test]
    fn test_numeric_filter_items_stay_strings() {
        let query = parse_query([("filter[creators]", "42,ab"), ("filter[with]", "007")]);
        assert_eq!(
            query,
            json!({ "filter": { "creators": ["42", "ab"], "with": ["007"] } })
        );
    }

    #[test]
    fn test_empty_filter_is_flag() {
        let query = parse_query([("filter[trending]", "")]);
        assert_eq!(query, json!({ "filter": { "trending": true } }));
    }

    #[test]
    fn test_nested_filter() {
        let query = parse_query([("filter[title][like]", "foo,bar")]);
        assert_eq!(query, json!({ "filter": { "title": { "like": ["foo", "bar"] } } }));
    }

    #[test]
    fn test_plain_values_stay_strings() {
        let query = parse_query([("sort", "-created")]);
        assert_eq!(query, json!({ "sort": "-created" }));
    }

    #[test]
    fn test_malformed_brackets_kept_whole() {
        let query = parse_query([("page[offset", "1"), ("a[]", "x")]);
        assert_eq!(query, json!({ "page[offset": "1", "a[]": "x" }));
    }

    #[test]
    fn test_view_includes_auth_and_shape_does_not() {
        let request = RequestData::new(AuthInfo::verified("alice"))
            .with_params([("username", "alice")])
            .with_body(json!({ "id": "alice" }));

        let shape = request.shape();
        assert!(shape.get("auth").is_none());
        assert_eq!(shape["params"]["username"], "alice");

        let view = request.view();
        assert_eq!(view["auth"]["username"], "alice");
        assert_eq!(view["auth"]["logged"], true);
        assert_eq!(view["auth"]["loggedUnverified"], false);
    }

    #[test]
    fn test_anonymous_view_has_no_username() {
        let view = RequestData::new(AuthInfo::anonymous()).view();
        assert!(view["auth"].get("username").is_none());
        assert!(view.get("body").is_none());
    }
}
