//! Orchestrates the three nullability/row-count passes into the single
//! `infer(schema, raw, ast) -> enriched | error` entry point.
//!
//! This module only composes; the passes themselves live in `columns.rs`,
//! `params.rs`, and `rowcount.rs`. The only way this can fail is if
//! [`columns::infer_select_columns`]/[`columns::infer_returning_columns`]
//! does — everything else here is infallible. Callers (`validate.rs`) are
//! responsible for telling a recoverable [`Error`] (log a warning, fall back
//! to `raw`) apart from a fatal one ([`Error::is_fatal`]) that must propagate.

use crate::ast::Statement;
use crate::columns;
use crate::error::Result;
use crate::model::StatementDescription;
use crate::params;
use crate::probe::RawStatement;
use crate::rowcount;
use crate::schema::Schema;

pub fn infer(schema: &Schema, raw: &RawStatement, stmt: &Statement) -> Result<StatementDescription> {
    let columns = match stmt {
        Statement::Select(select) => columns::infer_select_columns(schema, &raw.columns, select)?,
        Statement::Insert(insert) => columns::infer_returning_columns(
            schema,
            &raw.columns,
            &insert.table,
            &insert.returning,
        )?,
        Statement::Update(update) => columns::infer_returning_columns(
            schema,
            &raw.columns,
            &update.table,
            &update.returning,
        )?,
        Statement::Delete(delete) => columns::infer_returning_columns(
            schema,
            &raw.columns,
            &delete.table,
            &delete.returning,
        )?,
    };

    let params = params::infer_param_nullability(schema, &raw.params, stmt);
    let row_count = rowcount::infer_row_count(stmt);

    Ok(StatementDescription {
        columns,
        params,
        row_count,
    })
}
