//! Query assembly

use super::filters::{SqlParams, translate};
use super::validate::ValidatedQuery;

/// What the compiled statement is for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMode {
    /// Projection with ORDER BY / GROUP BY / LIMIT
    Select,
    /// `count(*)` over the filtered rows
    Count,
    /// Select without LIMIT, for bulk export
    Export,
}

/// Executable statement plus everything needed to label its rows
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledQuery {
    sql: String,
    params: Vec<String>,
    inlined: String,
    fields: Vec<String>,
    mode: QueryMode,
}

impl CompiledQuery {
    /// Statement text with `?` placeholders
    pub fn sql(&self) -> &str {
        &self.sql
    }

    /// Bound values, in placeholder order
    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Same statement with values inlined as escaped literals.
    /// For display and logging only, never executed.
    pub fn inlined(&self) -> &str {
        &self.inlined
    }

    /// Projected fields, in select-list order
    pub fn fields(&self) -> &[String] {
        &self.fields
    }

    pub fn mode(&self) -> QueryMode {
        self.mode
    }
}

/// Compile a validated query. Pure: the same input always yields the same
/// statement and parameters.
pub fn compile(query: &ValidatedQuery, mode: QueryMode) -> CompiledQuery {
    let mut params = SqlParams::default();
    let sql = render(query, mode, &mut params);

    let mut inline = SqlParams::inline();
    let inlined = render(query, mode, &mut inline);

    tracing::trace!(sql = %inlined, ?mode, "Compiled query");

    CompiledQuery {
        sql,
        params: params.values,
        inlined,
        fields: query.projected_fields().to_vec(),
        mode,
    }
}

fn render(query: &ValidatedQuery, mode: QueryMode, params: &mut SqlParams) -> String {
    let table = query.table();
    let predicate = translate(query.filters(), table, query.text_match(), params);

    let head = match mode {
        QueryMode::Count => format!("SELECT count(*) FROM {}", table),
        QueryMode::Select | QueryMode::Export => {
            format!("SELECT {} FROM {}", query.projected_fields().join(","), table)
        }
    };

    let mut parts = vec![head];
    if !predicate.is_empty() {
        parts.push(predicate);
    }

    if mode != QueryMode::Count {
        if let Some(order) = query.order() {
            parts.push(format!("ORDER BY {} {}", order.field, order.direction.as_sql()));
        }
        if let Some(group_by) = query.group_by() {
            parts.push(format!("GROUP BY {}", group_by));
        }
    }

    if mode == QueryMode::Select {
        parts.push(format!("LIMIT {}", query.limit()));
    }

    parts.join(" ")
}
