//! Typed field paths into a request
//!
//! A path starts with the request part it reads from (`body`, `params`,
//! `query` or `auth`) followed by property (`.name`) and index (`[n]`)
//! accessors: `body.to.username`, `query.filter.with[0]`. Paths are parsed
//! once, when requirements are declared, and resolving them is a plain walk
//! over the request view.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use super::errors::{PathError, PathResult};

/// The part of a request a path reads from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestPart {
    Body,
    Params,
    Query,
    Auth,
}

impl RequestPart {
    pub fn key(&self) -> &'static str {
        match self {
            RequestPart::Body => "body",
            RequestPart::Params => "params",
            RequestPart::Query => "query",
            RequestPart::Auth => "auth",
        }
    }

    fn parse(name: &str) -> Option<Self> {
        match name {
            "body" => Some(RequestPart::Body),
            "params" => Some(RequestPart::Params),
            "query" => Some(RequestPart::Query),
            "auth" => Some(RequestPart::Auth),
            _ => None,
        }
    }
}

/// One accessor step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Property(String),
    Index(usize),
}

/// A parsed field path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldPath {
    source: String,
    part: RequestPart,
    segments: Vec<Segment>,
}

impl FieldPath {
    /// Parses a path such as `body.tags[0].tagname`
    pub fn parse(source: &str) -> PathResult<Self> {
        if source.is_empty() {
            return Err(PathError::Empty);
        }

        let malformed = |reason: &str| PathError::Malformed {
            path: source.to_string(),
            reason: reason.to_string(),
        };

        let mut chars = source.char_indices().peekable();
        let mut names: Vec<Segment> = Vec::new();
        let mut expect_name = true;

        while let Some((start, c)) = chars.next() {
            if expect_name {
                if !is_name_char(c) {
                    return Err(malformed("expected a property name"));
                }
                let mut end = start + c.len_utf8();
                while let Some(&(i, next)) = chars.peek() {
                    if !is_name_char(next) {
                        break;
                    }
                    end = i + next.len_utf8();
                    chars.next();
                }
                names.push(Segment::Property(source[start..end].to_string()));
                expect_name = false;
                continue;
            }

            match c {
                '.' => expect_name = true,
                '[' => {
                    let mut digits = String::new();
                    loop {
                        match chars.next() {
                            Some((_, d)) if d.is_ascii_digit() => digits.push(d),
                            Some((_, ']')) if !digits.is_empty() => break,
                            _ => return Err(malformed("expected a numeric index")),
                        }
                    }
                    let index = digits.parse().map_err(|_| malformed("index out of range"))?;
                    names.push(Segment::Index(index));
                }
                _ => return Err(malformed("unexpected character")),
            }
        }

        if expect_name {
            return Err(malformed("path ends with a separator"));
        }

        let mut segments = names.into_iter();
        let part = match segments.next() {
            Some(Segment::Property(first)) => {
                RequestPart::parse(&first).ok_or(PathError::UnknownPart(first))?
            }
            _ => return Err(malformed("path must start with a request part")),
        };

        Ok(Self {
            source: source.to_string(),
            part,
            segments: segments.collect(),
        })
    }

    pub fn part(&self) -> RequestPart {
        self.part
    }

    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    /// Resolves the path against a request view `{body, params, query, auth}`.
    ///
    /// Returns `None` when any step is missing or has the wrong shape.
    pub fn resolve<'v>(&self, request: &'v Value) -> Option<&'v Value> {
        let mut current = request.get(self.part.key())?;
        for segment in &self.segments {
            current = match segment {
                Segment::Property(name) => current.as_object()?.get(name)?,
                Segment::Index(index) => current.as_array()?.get(*index)?,
            };
        }
        Some(current)
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '$'
}

impl FromStr for FieldPath {
    type Err = PathError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for FieldPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

/// One side of a requirement: a single path, or several whose values are
/// collected into an ordered list before comparison
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSpec {
    Single(FieldPath),
    Composite(Vec<FieldPath>),
}

impl PathSpec {
    pub fn resolve<'v>(&self, request: &'v Value) -> Resolved<'v> {
        match self {
            PathSpec::Single(path) => Resolved::One(path.resolve(request)),
            PathSpec::Composite(paths) => {
                Resolved::Many(paths.iter().map(|path| path.resolve(request)).collect())
            }
        }
    }
}

impl fmt::Display for PathSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PathSpec::Single(path) => write!(f, "{}", path),
            PathSpec::Composite(paths) => {
                let names: Vec<&str> = paths.iter().map(FieldPath::as_str).collect();
                write!(f, "[{}]", names.join(", "))
            }
        }
    }
}

/// Conversion into a `PathSpec`, used by requirement constructors
pub trait IntoPathSpec {
    fn into_path_spec(self) -> PathResult<PathSpec>;
}

impl IntoPathSpec for &str {
    fn into_path_spec(self) -> PathResult<PathSpec> {
        FieldPath::parse(self).map(PathSpec::Single)
    }
}

impl IntoPathSpec for &[&str] {
    fn into_path_spec(self) -> PathResult<PathSpec> {
        if self.is_empty() {
            return Err(PathError::Empty);
        }
        self.iter()
            .map(|source| FieldPath::parse(source))
            .collect::<PathResult<Vec<_>>>()
            .map(PathSpec::Composite)
    }
}

impl<const N: usize> IntoPathSpec for [&str; N] {
    fn into_path_spec(self) -> PathResult<PathSpec> {
        self.as_slice().into_path_spec()
    }
}

impl IntoPathSpec for PathSpec {
    fn into_path_spec(self) -> PathResult<PathSpec> {
        Ok(self)
    }
}

/// Values a `PathSpec` resolved to
#[derive(Debug, Clone, PartialEq)]
pub enum Resolved<'v> {
    One(Option<&'v Value>),
    Many(Vec<Option<&'v Value>>),
}

impl<'v> Resolved<'v> {
    /// The single value as a string, if that is what it is
    pub fn as_str(&self) -> Option<&'v str> {
        match self {
            Resolved::One(Some(value)) => value.as_str(),
            _ => None,
        }
    }

    /// Owned form for diagnostics; missing values become `null`
    pub fn to_value(&self) -> Value {
        match self {
            Resolved::One(value) => value.cloned().unwrap_or(Value::Null),
            Resolved::Many(values) => Value::Array(
                values
                    .iter()
                    .map(|value| value.cloned().unwrap_or(Value::Null))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_properties_and_indexes() {
        let path = FieldPath::parse("body.tags[2].tagname").unwrap();
        assert_eq!(path.part(), RequestPart::Body);
        assert_eq!(
            path.segments(),
            &[
                Segment::Property("tags".into()),
                Segment::Index(2),
                Segment::Property("tagname".into())
            ]
        );
        assert_eq!(path.to_string(), "body.tags[2].tagname");
    }

    #[test]
    fn test_bare_part_is_valid() {
        let path = FieldPath::parse("params").unwrap();
        assert!(path.segments().is_empty());
    }

    #[test]
    fn test_unknown_part_rejected() {
        assert_eq!(
            FieldPath::parse("headers.host").unwrap_err(),
            PathError::UnknownPart("headers".into())
        );
    }

    #[test]
    fn test_malformed_paths_rejected() {
        for source in ["body.", "body..id", ".body", "body[x]", "body[]", "body id", "[0]"] {
            assert!(FieldPath::parse(source).is_err(), "{} should be rejected", source);
        }
        assert_eq!(FieldPath::parse("").unwrap_err(), PathError::Empty);
    }

    #[test]
    fn test_resolve() {
        let request = json!({
            "body": { "to": { "username": "bob" }, "list": [1, 2] },
            "auth": { "username": "alice" }
        });

        let to: FieldPath = "body.to.username".parse().unwrap();
        assert_eq!(to.resolve(&request), Some(&json!("bob")));

        let second: FieldPath = "body.list[1]".parse().unwrap();
        assert_eq!(second.resolve(&request), Some(&json!(2)));

        let missing: FieldPath = "body.list[5]".parse().unwrap();
        assert_eq!(missing.resolve(&request), None);

        let wrong_shape: FieldPath = "body.to[0]".parse().unwrap();
        assert_eq!(wrong_shape.resolve(&request), None);

        let absent_part: FieldPath = "params.id".parse().unwrap();
        assert_eq!(absent_part.resolve(&request), None);
    }

    #[test]
    fn test_composite_resolution_keeps_order() {
        let request = json!({ "params": { "from": "user0", "to": "user1" } });
        let spec = ["params.from", "params.to", "params.nope"].into_path_spec().unwrap();

        let resolved = spec.resolve(&request);
        assert_eq!(resolved.to_value(), json!(["user0", "user1", null]));
        assert_eq!(spec.to_string(), "[params.from, params.to, params.nope]");
    }
}
