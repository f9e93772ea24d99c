//! Filter classification and predicate rendering
//!
//! A raw filter value is classified once into a [`FilterOperator`] by the
//! shape of its text, then rendered as a SQL predicate. Field names are
//! interpolated (they are schema-checked before reaching this module);
//! values only ever reach the SQL text through [`SqlParams`].

use std::sync::OnceLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::core::config::TextMatch;
use crate::utils::sql::quote_literal;

/// Operator inferred from a raw filter value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterOperator {
    Equals(String),
    /// Full-text prefix match
    Prefix(String),
    Range { start: String, end: String },
    AtLeast(String),
    AtMost(String),
    IsNull,
    IsNotNull,
}

impl FilterOperator {
    /// Classify a raw value. The first matching rule wins:
    /// `null` check, `<` lower bound, `>` upper bound, `dddd-dddd` range,
    /// then plain text.
    pub fn classify(raw: &str, text_match: TextMatch) -> Self {
        let value = raw.trim().replace(['|', '!'], "");

        if value.contains("null") {
            return if raw.contains('!') {
                Self::IsNotNull
            } else {
                Self::IsNull
            };
        }
        if value.contains('<') {
            return Self::AtLeast(value.replace('<', ""));
        }
        if value.contains('>') {
            return Self::AtMost(value.replace('>', ""));
        }
        if range_pattern().is_match(&value)
            && let Some((start, end)) = value.split_once('-')
        {
            return Self::Range {
                start: start.to_string(),
                end: end.to_string(),
            };
        }

        match text_match {
            TextMatch::Prefix => Self::Prefix(value),
            TextMatch::Equals => Self::Equals(value),
        }
    }
}

fn range_pattern() -> &'static Regex {
    static RE_RANGE: OnceLock<Regex> = OnceLock::new();
    RE_RANGE.get_or_init(|| Regex::new(r"^\d{4}-\d{4}$").expect("Invalid regex"))
}

/// Collects SQL parameters during query building (maintains insertion order).
///
/// In inline mode values are rendered as quoted literals instead of `?`
/// placeholders; that text is for display and export only.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SqlParams {
    pub values: Vec<String>,
    inline: bool,
}

impl SqlParams {
    /// Collector that renders values inline as escaped literals
    pub fn inline() -> Self {
        Self {
            values: Vec::new(),
            inline: true,
        }
    }

    /// Record a value and return the SQL text that stands for it
    pub fn bind(&mut self, value: impl Into<String>) -> String {
        let value = value.into();
        let token = if self.inline {
            quote_literal(&value)
        } else {
            "?".to_string()
        };
        self.values.push(value);
        token
    }
}

/// One validated filter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub field: String,
    pub operator: FilterOperator,
}

impl Filter {
    pub fn parse(field: impl Into<String>, raw: &str, text_match: TextMatch) -> Self {
        Self {
            field: field.into(),
            operator: FilterOperator::classify(raw, text_match),
        }
    }

    /// Generate SQL predicate
    /// Returns the predicate text and pushes bound values onto `params`
    pub fn to_sql(&self, table: &str, params: &mut SqlParams) -> String {
        let field = &self.field;
        match &self.operator {
            FilterOperator::IsNull => format!("{}.{} IS NULL", table, field),
            FilterOperator::IsNotNull => format!("{}.{} IS NOT NULL", table, field),
            FilterOperator::AtLeast(v) => format!("{} >= {}", field, params.bind(v.as_str())),
            FilterOperator::AtMost(v) => format!("{} <= {}", field, params.bind(v.as_str())),
            FilterOperator::Range { start, end } => {
                let start = params.bind(start.as_str());
                let end = params.bind(end.as_str());
                format!("{} BETWEEN {} AND {}", field, start, end)
            }
            FilterOperator::Prefix(v) => {
                format!("{}.{} MATCH {}", table, field, params.bind(format!("{}*", v)))
            }
            FilterOperator::Equals(v) => format!("{} = {}", field, params.bind(v.as_str())),
        }
    }
}

/// Render the WHERE clause for `filters`, or an empty string when there are
/// none.
pub fn translate(
    filters: &IndexMap<String, String>,
    table: &str,
    text_match: TextMatch,
    params: &mut SqlParams,
) -> String {
    if filters.is_empty() {
        return String::new();
    }

    let predicates: Vec<String> = filters
        .iter()
        .map(|(field, raw)| Filter::parse(field.as_str(), raw, text_match).to_sql(table, params))
        .collect();

    format!("WHERE {}", predicates.join(" AND "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn classify(raw: &str) -> FilterOperator {
        FilterOperator::classify(raw, TextMatch::Prefix)
    }

    fn filters(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn classify_null_checks() {
        assert_eq!(classify("null"), FilterOperator::IsNull);
        assert_eq!(classify("!null"), FilterOperator::IsNotNull);
        assert_eq!(classify("|null|"), FilterOperator::IsNull);
        assert_eq!(classify("n!ull"), FilterOperator::IsNotNull);
    }

    #[test]
    fn classify_bounds() {
        assert_eq!(classify("<5"), FilterOperator::AtLeast("5".into()));
        assert_eq!(classify("<<1999"), FilterOperator::AtLeast("1999".into()));
        assert_eq!(classify(">10"), FilterOperator::AtMost("10".into()));
        assert_eq!(classify(" !<5| "), FilterOperator::AtLeast("5".into()));
    }

    #[test]
    fn classify_priority_order() {
        // null beats comparison, lower bound beats upper bound and range
        assert_eq!(classify("<null"), FilterOperator::IsNull);
        assert_eq!(classify("<5>"), FilterOperator::AtLeast("5>".into()));
        assert_eq!(classify("<1999-2000"), FilterOperator::AtLeast("1999-2000".into()));
        assert_eq!(classify(">1999-2000"), FilterOperator::AtMost("1999-2000".into()));
    }

    #[test]
    fn classify_range() {
        assert_eq!(
            classify("2000-2010"),
            FilterOperator::Range {
                start: "2000".into(),
                end: "2010".into()
            }
        );
        assert_eq!(
            classify("2010-2000"),
            FilterOperator::Range {
                start: "2010".into(),
                end: "2000".into()
            }
        );
    }

    #[test]
    fn classify_range_requires_four_digit_halves() {
        assert_eq!(classify("5-10"), FilterOperator::Prefix("5-10".into()));
        assert_eq!(classify("20000-2010"), FilterOperator::Prefix("20000-2010".into()));
        assert_eq!(classify("x2000-2010"), FilterOperator::Prefix("x2000-2010".into()));
    }

    #[test]
    fn classify_text() {
        assert_eq!(classify("0001"), FilterOperator::Prefix("0001".into()));
        assert_eq!(classify(""), FilterOperator::Prefix("".into()));
        assert_eq!(
            FilterOperator::classify("Rex", TextMatch::Equals),
            FilterOperator::Equals("Rex".into())
        );
    }

    #[test]
    fn to_sql_prefix_binds_pattern() {
        let filter = Filter::parse("id", "0001", TextMatch::Prefix);
        let mut params = SqlParams::default();
        let sql = filter.to_sql("dogs", &mut params);

        assert_eq!(sql, "dogs.id MATCH ?");
        assert_eq!(params.values, vec!["0001*"]);
    }

    #[test]
    fn to_sql_lower_bound() {
        let filter = Filter::parse("age", "<5", TextMatch::Prefix);
        let mut params = SqlParams::default();
        let sql = filter.to_sql("dogs", &mut params);

        assert_eq!(sql, "age >= ?");
        assert_eq!(params.values, vec!["5"]);
    }

    #[test]
    fn to_sql_range_keeps_order() {
        let filter = Filter::parse("age", "2000-2010", TextMatch::Prefix);
        let mut params = SqlParams::default();
        let sql = filter.to_sql("dogs", &mut params);

        assert_eq!(sql, "age BETWEEN ? AND ?");
        assert_eq!(params.values, vec!["2000", "2010"]);
    }

    #[test]
    fn to_sql_null_checks_bind_nothing() {
        let mut params = SqlParams::default();
        let sql = Filter::parse("age", "!null", TextMatch::Prefix).to_sql("dogs", &mut params);
        assert_eq!(sql, "dogs.age IS NOT NULL");
        let sql = Filter::parse("age", "null", TextMatch::Prefix).to_sql("dogs", &mut params);
        assert_eq!(sql, "dogs.age IS NULL");
        assert!(params.values.is_empty());
    }

    #[test]
    fn to_sql_equals() {
        let filter = Filter::parse("name", "Tom", TextMatch::Equals);
        let mut params = SqlParams::default();
        assert_eq!(filter.to_sql("cat", &mut params), "name = ?");
        assert_eq!(params.values, vec!["Tom"]);
    }

    #[test]
    fn to_sql_inline_escapes_quotes() {
        let filter = Filter::parse("name", "<x' OR 1=1 --", TextMatch::Prefix);
        let mut params = SqlParams::inline();
        let sql = filter.to_sql("dogs", &mut params);

        assert_eq!(sql, "name >= 'x'' OR 1=1 --'");
        assert_eq!(params.values, vec!["x' OR 1=1 --"]);
    }

    #[test]
    fn translate_empty() {
        let mut params = SqlParams::default();
        assert_eq!(translate(&IndexMap::new(), "dogs", TextMatch::Prefix, &mut params), "");
        assert!(params.values.is_empty());
    }

    #[test]
    fn translate_joins_with_and() {
        let mut params = SqlParams::default();
        let sql = translate(
            &filters(&[("id", "0001"), ("age", "<5"), ("name", "!null")]),
            "dogs",
            TextMatch::Prefix,
            &mut params,
        );

        assert_eq!(
            sql,
            "WHERE dogs.id MATCH ? AND age >= ? AND dogs.name IS NOT NULL"
        );
        assert_eq!(params.values, vec!["0001*", "5"]);
    }

    #[test]
    fn translate_single_inline() {
        let mut params = SqlParams::inline();
        let sql = translate(&filters(&[("id", "0001")]), "dogs", TextMatch::Prefix, &mut params);
        assert_eq!(sql, "WHERE dogs.id MATCH '0001*'");
    }

    #[test]
    fn translate_values_never_reach_sql_text() {
        let mut params = SqlParams::default();
        let sql = translate(
            &filters(&[("name", "'; DROP TABLE dogs; --")]),
            "dogs",
            TextMatch::Prefix,
            &mut params,
        );
        assert_eq!(sql, "WHERE dogs.name MATCH ?");
        assert!(!sql.contains("DROP"));
        assert_eq!(params.values, vec!["'; DROP TABLE dogs; --*"]);
    }
}
