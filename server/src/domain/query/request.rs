//! Raw request and schema types

use indexmap::IndexMap;
use serde::Deserialize;

/// Comma-separated projection list
pub const FIELDS_KEY: &str = "fields";
/// Row limit
pub const LIMIT_KEY: &str = "limit";
/// Single grouping field
pub const GROUP_BY_KEY: &str = "group_by";
/// `field` or `field,asc` / `field,desc`
pub const ORDER_BY_KEY: &str = "order_by";

const RESERVED_KEYS: [&str; 4] = [FIELDS_KEY, LIMIT_KEY, GROUP_BY_KEY, ORDER_BY_KEY];

/// Untrusted request: option and filter keys mapped to raw string values.
///
/// Keys keep their insertion order so predicates render in the order the
/// caller sent them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct RawRequest(IndexMap<String, String>);

impl RawRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.0.insert(key.into(), value.into());
    }

    /// Value of a reserved option. Empty values count as absent.
    pub fn option(&self, key: &str) -> Option<&str> {
        self.0
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Every non-reserved entry, in request order
    pub fn filters(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0
            .iter()
            .filter(|(key, _)| !is_reserved(key))
            .map(|(key, value)| (key.as_str(), value.as_str()))
    }

    /// Build a request from `key=value` arguments
    pub fn from_pairs<I, S>(pairs: I) -> Result<Self, String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut request = Self::new();
        for pair in pairs {
            let pair = pair.as_ref();
            let (key, value) = pair
                .split_once('=')
                .ok_or_else(|| format!("Expected key=value, got '{}'", pair))?;
            request.insert(key, value);
        }
        Ok(request)
    }
}

impl<K, V> FromIterator<(K, V)> for RawRequest
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }
}

fn is_reserved(key: &str) -> bool {
    RESERVED_KEYS.contains(&key)
}

/// Ordered column names of one table, fetched fresh for every request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    table: String,
    columns: Vec<String>,
}

impl Schema {
    pub fn new(table: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            table: table.into(),
            columns,
        }
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn contains(&self, field: &str) -> bool {
        self.columns.iter().any(|column| column == field)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
