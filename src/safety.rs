//! Read-only gate for generated SQL.
//!
//! The engine executes model output without a human in the loop, so only a
//! single read-only statement is allowed through. Everything else is
//! rejected before it reaches the database.

use crate::error::{Result, SageError};
use sqlparser::ast::{Query, SetExpr, Statement, TableFactor, TableWithJoins};
use sqlparser::dialect::SQLiteDialect;
use sqlparser::parser::Parser;

/// Validates that `sql` is exactly one read-only statement.
///
/// SQLite accepts some syntax sqlparser does not, so a parse failure falls
/// back to checking the leading keyword instead of rejecting outright.
pub fn ensure_read_only(sql: &str) -> Result<()> {
    match Parser::parse_sql(&SQLiteDialect {}, sql) {
        Ok(statements) => check_statements(&statements),
        Err(_) => check_first_keyword(sql),
    }
}

fn check_statements(statements: &[Statement]) -> Result<()> {
    match statements {
        [] => Err(SageError::database("Generated SQL is empty")),
        [statement] if statement_is_read_only(statement) => Ok(()),
        [statement] => Err(SageError::database(format!(
            "Refusing to execute non-read-only SQL: {}",
            statement
        ))),
        _ => Err(SageError::database(
            "Refusing to execute multiple SQL statements",
        )),
    }
}

fn check_first_keyword(sql: &str) -> Result<()> {
    let first = sql
        .trim()
        .split_whitespace()
        .next()
        .unwrap_or("")
        .to_lowercase();

    match first.as_str() {
        "select" | "with" | "values" => Ok(()),
        "" => Err(SageError::database("Generated SQL is empty")),
        _ => Err(SageError::database(format!(
            "Refusing to execute non-read-only SQL starting with '{}'",
            first.to_uppercase()
        ))),
    }
}

fn statement_is_read_only(statement: &Statement) -> bool {
    match statement {
        Statement::Query(query) => query_is_read_only(query),
        _ => false,
    }
}

/// Recurses through CTEs, set operations, and derived tables; any embedded
/// data modification poisons the whole query.
fn query_is_read_only(query: &Query) -> bool {
    if let Some(with) = &query.with {
        if !with.cte_tables.iter().all(|cte| query_is_read_only(&cte.query)) {
            return false;
        }
    }
    set_expr_is_read_only(&query.body)
}

fn set_expr_is_read_only(set_expr: &SetExpr) -> bool {
    match set_expr {
        SetExpr::Select(select) => select.from.iter().all(table_with_joins_is_read_only),
        SetExpr::Query(query) => query_is_read_only(query),
        SetExpr::SetOperation { left, right, .. } => {
            set_expr_is_read_only(left) && set_expr_is_read_only(right)
        }
        SetExpr::Values(_) | SetExpr::Table(_) => true,
        SetExpr::Insert(_) | SetExpr::Update(_) | SetExpr::Delete(_) | SetExpr::Merge(_) => false,
    }
}

fn table_with_joins_is_read_only(twj: &TableWithJoins) -> bool {
    table_factor_is_read_only(&twj.relation)
        && twj
            .joins
            .iter()
            .all(|join| table_factor_is_read_only(&join.relation))
}

fn table_factor_is_read_only(factor: &TableFactor) -> bool {
    match factor {
        TableFactor::Derived { subquery, .. } => query_is_read_only(subquery),
        TableFactor::NestedJoin {
            table_with_joins, ..
        } => table_with_joins_is_read_only(table_with_joins),
        _ => true,
    }
}
