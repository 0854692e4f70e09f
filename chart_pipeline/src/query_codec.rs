//! URL query-string codec for chart parameters.
//!
//! Scalars encode as `key=value`. Sequences use the indexed bracket form
//! (`key[0]=a&key[1]=b`, brackets percent-encoded), which is what browser-side
//! query libraries emit by default. Values are form-urlencoded, so `EUR/USD`
//! travels as `EUR%2FUSD`.
//!
//! Decoding never fails: a leading `?` is ignored, unparsable fragments are
//! decoded lossily and empty keys are dropped. Callers treat a missing key as
//! "use the default".

use indexmap::IndexMap;
use url::form_urlencoded;

/// One decoded query parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum QueryValue {
    Scalar(String),
    List(Vec<String>),
}

impl QueryValue {
    /// The scalar value, or the first element of a list.
    pub fn first(&self) -> Option<&str> {
        match self {
            QueryValue::Scalar(v) => Some(v),
            QueryValue::List(items) => items.first().map(String::as_str),
        }
    }
}

impl From<&str> for QueryValue {
    fn from(value: &str) -> Self {
        QueryValue::Scalar(value.to_string())
    }
}

impl From<String> for QueryValue {
    fn from(value: String) -> Self {
        QueryValue::Scalar(value)
    }
}

impl From<Vec<String>> for QueryValue {
    fn from(items: Vec<String>) -> Self {
        QueryValue::List(items)
    }
}

/// Insertion-ordered parameter map.
pub type QueryMap = IndexMap<String, QueryValue>;

/// Serialize a parameter map into a query string (without a leading `?`).
///
/// Empty lists produce no pairs at all.
pub fn encode(params: &QueryMap) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in params {
        match value {
            QueryValue::Scalar(v) => {
                serializer.append_pair(key, v);
            }
            QueryValue::List(items) => {
                for (i, item) in items.iter().enumerate() {
                    serializer.append_pair(&format!("{key}[{i}]"), item);
                }
            }
        }
    }
    serializer.finish()
}

enum Pending {
    Plain(Vec<String>),
    Bracketed(Vec<(Option<usize>, String)>),
}

/// Parse a query string into a parameter map.
///
/// `key[]=`, `key[n]=` and a repeated plain `key=` all decode as lists; indexed
/// entries are ordered by their index, unindexed ones keep arrival order after
/// them.
pub fn decode(query: &str) -> QueryMap {
    let query = query.trim();
    let query = query.strip_prefix('?').unwrap_or(query);

    let mut pending: IndexMap<String, Pending> = IndexMap::new();
    for (raw_key, value) in form_urlencoded::parse(query.as_bytes()) {
        let value = value.into_owned();
        match split_bracket(&raw_key) {
            Some((base, index)) => {
                if base.is_empty() {
                    continue;
                }
                let slot = pending
                    .entry(base.to_string())
                    .or_insert_with(|| Pending::Bracketed(Vec::new()));
                if let Pending::Plain(values) = slot {
                    let moved = std::mem::take(values).into_iter().map(|v| (None, v)).collect();
                    *slot = Pending::Bracketed(moved);
                }
                if let Pending::Bracketed(entries) = slot {
                    entries.push((index, value));
                }
            }
            None => {
                if raw_key.is_empty() {
                    continue;
                }
                match pending
                    .entry(raw_key.to_string())
                    .or_insert_with(|| Pending::Plain(Vec::new()))
                {
                    Pending::Plain(values) => values.push(value),
                    Pending::Bracketed(entries) => entries.push((None, value)),
                }
            }
        }
    }

    pending
        .into_iter()
        .map(|(key, slot)| {
            let value = match slot {
                Pending::Plain(mut values) if values.len() == 1 => {
                    QueryValue::Scalar(values.remove(0))
                }
                Pending::Plain(values) => QueryValue::List(values),
                Pending::Bracketed(mut entries) => {
                    entries.sort_by_key(|(index, _)| index.unwrap_or(usize::MAX));
                    QueryValue::List(entries.into_iter().map(|(_, v)| v).collect())
                }
            };
            (key, value)
        })
        .collect()
}

/// `pair[3]` -> `("pair", Some(3))`, `pair[]` -> `("pair", None)`.
fn split_bracket(key: &str) -> Option<(&str, Option<usize>)> {
    let inner = key.strip_suffix(']')?;
    let open = inner.find('[')?;
    let index = inner[open + 1..].parse::<usize>().ok();
    Some((&inner[..open], index))
}
