//! SQL text helpers

/// Render a value as a single-quoted SQL string literal.
///
/// Embedded single quotes are doubled, so the result is always one literal
/// token no matter what the input contains.
///
/// ```
/// use sieve_server::utils::sql::quote_literal;
///
/// assert_eq!(quote_literal("O'Brien"), "'O''Brien'");
/// ```
pub fn quote_literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}
