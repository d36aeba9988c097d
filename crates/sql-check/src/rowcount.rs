//! Conservative row-count estimation from statement shape alone — no schema,
//! no data. The estimate is a upper bound on how many rows a caller needs to
//! be ready to handle, never a promise of exactness.

use crate::ast::{SelectStatement, SetExpr, Statement};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowCount {
    /// Statement can never produce rows (e.g. `DELETE` with no `RETURNING`).
    Zero,
    /// Statement always produces exactly one row.
    One,
    /// Zero or one row, never more (e.g. `SELECT ... LIMIT 1`).
    ZeroOrOne,
    /// Any number of rows, including zero.
    Many,
}

pub fn infer_row_count(stmt: &Statement) -> RowCount {
    match stmt {
        Statement::Select(select) => select_row_count(select),
        Statement::Insert(insert) => {
            if insert.returning.is_empty() {
                return RowCount::Zero;
            }
            if insert.has_default_values {
                return RowCount::One;
            }
            if insert.select.is_some() {
                return RowCount::Many;
            }
            match insert.rows.len() {
                1 => RowCount::One,
                _ => RowCount::Many,
            }
        }
        Statement::Update(update) => {
            if update.returning.is_empty() {
                RowCount::Zero
            } else {
                RowCount::Many
            }
        }
        Statement::Delete(delete) => {
            if delete.returning.is_empty() {
                RowCount::Zero
            } else {
                RowCount::Many
            }
        }
    }
}

fn select_row_count(select: &SelectStatement) -> RowCount {
    if is_limit_one(select) {
        return RowCount::ZeroOrOne;
    }
    match set_expr_always_one_row(&select.body) {
        true => RowCount::One,
        false => RowCount::Many,
    }
}

fn is_limit_one(select: &SelectStatement) -> bool {
    matches!(
        &select.limit,
        Some(crate::ast::Expr::Constant { text }) if text.trim() == "1"
    )
}

/// `SELECT <aggregates only>` with no `FROM` always produces exactly one row
/// (e.g. `SELECT 1`, `SELECT now()`). Anything with a `FROM` clause is
/// treated as `Many` — even a `FROM` on a single-row table can return zero
/// rows if the table is empty, so this is the only `FROM`-less special case
/// that's actually safe to call `One`.
fn set_expr_always_one_row(set_expr: &SetExpr) -> bool {
    match set_expr {
        SetExpr::Select(body) => body.from.is_empty(),
        SetExpr::SetOperation { .. } => false,
    }
}
