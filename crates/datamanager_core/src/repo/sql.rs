//! Compiles finder state into parameterized SQLite statements.

use crate::finder::{SortCriterion, SortDirection, SortSpec, Window};
use rusqlite::types::Value;

/// Conjunction of `WHERE` predicates with their bind values.
#[derive(Debug, Default)]
pub(crate) struct Conditions {
    clauses: Vec<&'static str>,
    bind_values: Vec<Value>,
}

impl Conditions {
    /// Adds one predicate holding exactly one `?` placeholder.
    pub(crate) fn push(&mut self, clause: &'static str, value: impl Into<String>) {
        self.clauses.push(clause);
        self.bind_values.push(Value::Text(value.into()));
    }

    fn render(&self, sql: &mut String) {
        for (index, clause) in self.clauses.iter().enumerate() {
            sql.push_str(if index == 0 { " WHERE " } else { " AND " });
            sql.push_str(clause);
        }
    }
}

/// Builds `select` + filters + ordering + pagination.
///
/// The ordering always ends with `id_column` so equal sort values come back
/// in a stable order across executions and pages.
pub(crate) fn compile_select<C: SortCriterion>(
    select: &str,
    id_column: &'static str,
    conditions: Conditions,
    sorts: &[SortSpec<C>],
    window: Window,
) -> (String, Vec<Value>) {
    let mut sql = select.to_string();
    conditions.render(&mut sql);
    let mut bind_values = conditions.bind_values;

    let mut order_by = sorts
        .iter()
        .map(|spec| {
            let direction = match spec.direction {
                SortDirection::Ascending => "ASC",
                SortDirection::Descending => "DESC",
            };
            format!("{} {direction}", spec.criterion.column())
        })
        .collect::<Vec<_>>();
    if !sorts.iter().any(|spec| spec.criterion.column() == id_column) {
        order_by.push(format!("{id_column} ASC"));
    }
    sql.push_str(" ORDER BY ");
    sql.push_str(&order_by.join(", "));

    if let Some(limit) = window.limit {
        sql.push_str(" LIMIT ?");
        bind_values.push(Value::Integer(i64::from(limit)));
        if window.offset > 0 {
            sql.push_str(" OFFSET ?");
            bind_values.push(Value::Integer(i64::from(window.offset)));
        }
    } else if window.offset > 0 {
        sql.push_str(" LIMIT -1 OFFSET ?");
        bind_values.push(Value::Integer(i64::from(window.offset)));
    }

    sql.push(';');
    (sql, bind_values)
}

/// Builds `SELECT COUNT(*) FROM table` + filters.
pub(crate) fn compile_count(table: &str, conditions: Conditions) -> (String, Vec<Value>) {
    let mut sql = format!("SELECT COUNT(*) FROM {table}");
    conditions.render(&mut sql);
    sql.push(';');
    (sql, conditions.bind_values)
}
