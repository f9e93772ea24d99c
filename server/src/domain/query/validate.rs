//! Request validation
//!
//! Checks a [`RawRequest`] against the table schema. The checks run in a
//! fixed order and the first failure is returned; on success every field
//! named anywhere in the resulting [`ValidatedQuery`] is a schema member.

use indexmap::IndexMap;
use thiserror::Error;

use crate::core::config::{QueryConfig, TextMatch};

use super::request::{FIELDS_KEY, GROUP_BY_KEY, LIMIT_KEY, ORDER_BY_KEY, RawRequest, Schema};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Limit should be a non-negative integer, got '{0}'")]
    BadLimit(String),

    #[error("Can't group by non-existing field '{0}'")]
    UnknownGroupField(String),

    #[error("Can't order by non-existing field '{0}'")]
    UnknownOrderField(String),

    #[error("Order direction must be 'asc' or 'desc', got '{0}'")]
    BadOrderDirection(String),

    #[error("Field '{0}' is not available")]
    UnknownProjectionField(String),

    #[error("Filter '{0}' is not an available field")]
    UnknownFilterField(String),
}

impl ValidationError {
    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Self::BadLimit(_) => "BAD_LIMIT",
            Self::UnknownGroupField(_) => "UNKNOWN_GROUP_FIELD",
            Self::UnknownOrderField(_) => "UNKNOWN_ORDER_FIELD",
            Self::BadOrderDirection(_) => "BAD_ORDER_DIRECTION",
            Self::UnknownProjectionField(_) => "UNKNOWN_PROJECTION_FIELD",
            Self::UnknownFilterField(_) => "UNKNOWN_FILTER_FIELD",
        }
    }

    /// The offending field name or value
    pub fn value(&self) -> &str {
        match self {
            Self::BadLimit(v)
            | Self::UnknownGroupField(v)
            | Self::UnknownOrderField(v)
            | Self::BadOrderDirection(v)
            | Self::UnknownProjectionField(v)
            | Self::UnknownFilterField(v) => v,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OrderDirection {
    #[default]
    Unspecified,
    Asc,
    Desc,
}

impl OrderDirection {
    /// SQL keyword; an unspecified direction sorts ascending
    pub fn as_sql(&self) -> &'static str {
        match self {
            Self::Desc => "desc",
            Self::Asc | Self::Unspecified => "asc",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub direction: OrderDirection,
}

/// A request that passed validation. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedQuery {
    table: String,
    projected_fields: Vec<String>,
    filters: IndexMap<String, String>,
    limit: u64,
    order: Option<OrderBy>,
    group_by: Option<String>,
    text_match: TextMatch,
}

impl ValidatedQuery {
    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn projected_fields(&self) -> &[String] {
        &self.projected_fields
    }

    /// Filter field to raw value, in request order
    pub fn filters(&self) -> &IndexMap<String, String> {
        &self.filters
    }

    pub fn limit(&self) -> u64 {
        self.limit
    }

    pub fn order(&self) -> Option<&OrderBy> {
        self.order.as_ref()
    }

    pub fn group_by(&self) -> Option<&str> {
        self.group_by.as_deref()
    }

    /// How plain filter values are matched
    pub fn text_match(&self) -> TextMatch {
        self.text_match
    }
}

/// Validate `raw` against `schema`.
pub fn validate(
    raw: &RawRequest,
    schema: &Schema,
    config: &QueryConfig,
) -> Result<ValidatedQuery, ValidationError> {
    let limit = match raw.option(LIMIT_KEY) {
        Some(value) => value
            .trim()
            .parse::<u64>()
            .map_err(|_| ValidationError::BadLimit(value.to_string()))?,
        None => config.default_limit,
    };

    let group_by = match raw.option(GROUP_BY_KEY) {
        Some(field) if schema.contains(field) => Some(field.to_string()),
        Some(field) => return Err(ValidationError::UnknownGroupField(field.to_string())),
        None => None,
    };

    let order = raw.option(ORDER_BY_KEY).map(|value| parse_order(value, schema)).transpose()?;

    let projected_fields = match raw.option(FIELDS_KEY) {
        Some(list) => {
            let fields: Vec<String> = list.split(',').map(|f| f.trim().to_string()).collect();
            if let Some(unknown) = fields.iter().find(|f| !schema.contains(f)) {
                return Err(ValidationError::UnknownProjectionField(unknown.clone()));
            }
            fields
        }
        None => schema.columns().to_vec(),
    };

    let mut filters = IndexMap::new();
    for (field, value) in raw.filters() {
        if !schema.contains(field) {
            return Err(ValidationError::UnknownFilterField(field.to_string()));
        }
        filters.insert(field.to_string(), value.to_string());
    }

    Ok(ValidatedQuery {
        table: schema.table().to_string(),
        projected_fields,
        filters,
        limit,
        order,
        group_by,
        text_match: config.text_match,
    })
}

fn parse_order(value: &str, schema: &Schema) -> Result<OrderBy, ValidationError> {
    let (field, direction) = match value.split_once(',') {
        Some((field, direction)) => (field, Some(direction.trim())),
        None => (value, None),
    };

    if !schema.contains(field) {
        return Err(ValidationError::UnknownOrderField(field.to_string()));
    }

    let direction = match direction {
        None => OrderDirection::Unspecified,
        Some("asc") => OrderDirection::Asc,
        Some("desc") => OrderDirection::Desc,
        Some(other) => return Err(ValidationError::BadOrderDirection(other.to_string())),
    };

    Ok(OrderBy {
        field: field.to_string(),
        direction,
    })
}
