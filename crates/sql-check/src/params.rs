//! Positional-parameter (`$N`) nullability.
//!
//! A parameter's nullability is decided at its *binding sites*: the column
//! it's assigned into for `INSERT ... VALUES` and `UPDATE ... SET`. `SELECT`
//! and `DELETE` contribute no binding sites. A parameter can appear more
//! than once (`$1` reused across a query); when it does, its final
//! nullability is the pessimistic union — nullable if *any* occurrence binds
//! it against a nullable column, since sqlx binds a single value to every
//! occurrence of the same index and the caller has to satisfy the strictest
//! site.
//!
//! Parameters with no discoverable binding site (e.g. `SELECT $1`) are left
//! nullable — there's nothing to refine from.

use std::collections::HashMap;

use crate::ast::{
    Assignment, BinaryOperator, Expr, InsertStatement, SelectStatement, Statement, UnaryOperator,
    UpdateStatement,
};
use crate::model::ParamDescr;
use crate::schema::Schema;
use crate::visitor::ExprVisitor;

pub fn infer_param_nullability(schema: &Schema, raw: &[ParamDescr], stmt: &Statement) -> Vec<ParamDescr> {
    let mut nullable_by_index: HashMap<usize, bool> = HashMap::new();

    // `SELECT` and `DELETE` contribute no column-bound sites (spec.md §4.3);
    // a `$N` appearing there is left at the probe's default nullability.
    match stmt {
        Statement::Select(_) | Statement::Delete(_) => {}
        Statement::Insert(insert) => scan_insert(schema, insert, &mut nullable_by_index),
        Statement::Update(update) => scan_update(schema, update, &mut nullable_by_index),
    }

    raw.iter()
        .cloned()
        .map(|mut param| {
            if let Some(&nullable) = nullable_by_index.get(&param.index) {
                param.nullable = nullable;
            }
            param
        })
        .collect()
}

fn bind(nullable_by_index: &mut HashMap<usize, bool>, index: usize, nullable: bool) {
    nullable_by_index
        .entry(index)
        .and_modify(|existing| *existing = *existing || nullable)
        .or_insert(nullable);
}

fn scan_insert(schema: &Schema, insert: &InsertStatement, out: &mut HashMap<usize, bool>) {
    let table = schema.get_table(&insert.table);
    for row in &insert.rows {
        for (col_name, value) in insert.columns.iter().zip(row.iter()) {
            let col_nullable = table.and_then(|t| t.get_column(col_name)).map(|c| c.nullable);
            scan_bound_expr(value, col_nullable, out);
        }
    }
}

fn scan_update(schema: &Schema, update: &UpdateStatement, out: &mut HashMap<usize, bool>) {
    let table = schema.get_table(&update.table);
    for Assignment { columns, value } in &update.assignments {
        let col_nullable = columns
            .first()
            .and_then(|name| table.and_then(|t| t.get_column(name)))
            .map(|c| c.nullable);
        scan_bound_expr(value, col_nullable, out);
    }
}

/// Records a parameter's nullability from the column it's directly bound to,
/// if `expr` is a bare `$N` (optionally wrapped in casts) — `$1 + 1` or
/// similar isn't a simple bind and is left untouched.
///
/// "Bare" is decided by walking `expr` with [`BareParamFinder`], an
/// [`ExprVisitor`] that tracks whether it's still on the straight-line path
/// to a parameter: any node other than a cast breaks the path, so a
/// parameter found after that point doesn't count.
fn scan_bound_expr(expr: &Expr, col_nullable: Option<bool>, out: &mut HashMap<usize, bool>) {
    if let Some(index) = bare_parameter_index(expr) {
        bind(out, index, col_nullable.unwrap_or(true));
    }
}

fn bare_parameter_index(expr: &Expr) -> Option<usize> {
    let mut finder = BareParamFinder::default();
    crate::visitor::walk_expr(expr, &mut finder);
    finder.found
}

#[derive(Default)]
struct BareParamFinder {
    path_broken: bool,
    found: Option<usize>,
}

impl ExprVisitor for BareParamFinder {
    fn visit_parameter(&mut self, index: usize) {
        if !self.path_broken {
            self.found = Some(index);
        }
    }

    fn visit_column_ref(&mut self, _column: &str) {
        self.path_broken = true;
    }

    fn visit_table_column_ref(&mut self, _table: &str, _column: &str) {
        self.path_broken = true;
    }

    fn visit_constant(&mut self, _text: &str) {
        self.path_broken = true;
    }

    fn visit_unary_op(&mut self, _op: UnaryOperator, _operand: &Expr) {
        self.path_broken = true;
    }

    fn visit_binary_op(&mut self, _op: &BinaryOperator, _lhs: &Expr, _rhs: &Expr) {
        self.path_broken = true;
    }

    fn visit_function_call(&mut self, _name: &str, _args: &[Expr]) {
        self.path_broken = true;
    }

    fn visit_exists(&mut self, _subquery: &SelectStatement) {
        self.path_broken = true;
    }

    fn visit_in(&mut self, _subquery: &SelectStatement) {
        self.path_broken = true;
    }

    fn visit_array_subquery(&mut self, _subquery: &SelectStatement) {
        self.path_broken = true;
    }

    fn visit_unsupported(&mut self, _description: &str) {
        self.path_broken = true;
    }

    // `visit_type_cast` keeps the default no-op: a cast doesn't break the
    // straight-line path to the parameter it wraps.
}
