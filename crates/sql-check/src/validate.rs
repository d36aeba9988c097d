//! Query validation against a schema.
//!
//! This is the entry point the `query!` macro calls. It parses the SQL
//! exactly once and then runs it through two stages:
//!
//! 1. [`probe`] — syntactic validation against the schema (does every
//!    table/column referenced actually exist). Failures here are genuine SQL
//!    errors and always propagate.
//! 2. [`ast::lower_statement`] + [`infer::infer`] — the nullability/row-count
//!    analyzer. A failure here is either [`Error::is_fatal`] (an analyzer
//!    bug, propagate) or recoverable, in which case we log a warning and
//!    fall back to the conservative, all-nullable description `probe`
//!    already produced.

use crate::ast::lower_statement;
use crate::error::{Error, Result};
use crate::infer;
use crate::model::StatementDescription;
use crate::probe::{self, RawStatement};
use crate::rowcount::RowCount;
use crate::schema::Schema;
use sqlparser::dialect::PostgreSqlDialect;
use sqlparser::parser::Parser;

/// Validate a query against a schema and return its enriched description:
/// output columns (with nullability), positional parameters (with
/// nullability), and a conservative row-count estimate.
pub fn validate_query(schema: &Schema, sql: &str) -> Result<StatementDescription> {
    let dialect = PostgreSqlDialect {};
    let statements = Parser::parse_sql(&dialect, sql).map_err(|e| {
        log::warn!("failed to parse query {sql:?}: {e}");
        Error::QueryParse(e.to_string())
    })?;

    if statements.len() != 1 {
        return Err(Error::InvalidQuery(
            "Expected exactly one statement".to_string(),
        ));
    }
    let stmt = &statements[0];

    let raw = probe::probe(schema, stmt)?;

    match infer_with_fallback(schema, &raw, stmt, sql) {
        Ok(description) => Ok(description),
        Err(e) if e.is_fatal() => Err(e),
        Err(_) => Ok(raw_to_description(raw)),
    }
}

fn infer_with_fallback(
    schema: &Schema,
    raw: &RawStatement,
    stmt: &sqlparser::ast::Statement,
    sql: &str,
) -> Result<StatementDescription> {
    let lowered = lower_statement(stmt).map_err(|e| {
        log::warn!("falling back to conservative nullability for {sql:?}: {e}");
        e
    })?;

    infer::infer(schema, raw, &lowered).map_err(|e| {
        if !e.is_fatal() {
            log::warn!("falling back to conservative nullability for {sql:?}: {e}");
        }
        e
    })
}

/// The conservative description for a query whose nullability/row-count
/// couldn't be refined: every column and parameter stays nullable (as
/// `probe` already left them) and the row count is the least-informative
/// `Many`, since we have no statement shape left to reason from.
fn raw_to_description(raw: RawStatement) -> StatementDescription {
    StatementDescription {
        columns: raw.columns,
        params: raw.params,
        row_count: RowCount::Many,
    }
}
