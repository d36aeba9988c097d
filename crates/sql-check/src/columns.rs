//! Output-column nullability: resolves a statement's `FROM`/`JOIN` tree into
//! a [`Scope`], narrows it using non-null-implying `WHERE` conjuncts, then
//! walks the projection list assigning each output a [`FieldNullability`].
//!
//! Two entry points: [`infer_select_columns`] for a full `SELECT` (handles
//! CTEs, joins, set operations, subqueries), and [`infer_returning_columns`]
//! for an `INSERT`/`UPDATE`/`DELETE ... RETURNING` clause, which only ever
//! projects from the one target table.

use std::collections::{HashMap, HashSet};

use crate::ast::{BinaryOperator, Expr, SelectBody, SelectItem, SelectStatement, SetExpr, TableExpression, UnaryOperator};
use crate::error::{Error, Result};
use crate::model::ColumnDescr;
use crate::nullsafety::{self, Category};
use crate::schema::Schema;
use crate::scope::{FieldNullability, Scope, VirtualTable};
use crate::types::PostgresType;

/// CTEs visible at a point in the query, threaded explicitly (not mutated in
/// place) so both arms of a set operation see the same definitions — the
/// CTEs defined in a `WITH` clause shouldn't vanish for the right-hand side
/// of a `UNION`.
#[derive(Debug, Default, Clone)]
struct CteEnv {
    tables: HashMap<String, VirtualTable>,
}

impl CteEnv {
    fn get(&self, name: &str) -> Option<&VirtualTable> {
        self.tables.get(&name.to_lowercase())
    }

    fn insert(&mut self, table: VirtualTable) {
        self.tables.insert(table.name.to_lowercase(), table);
    }
}

pub fn infer_select_columns(
    schema: &Schema,
    raw: &[ColumnDescr],
    select: &SelectStatement,
) -> Result<Vec<ColumnDescr>> {
    let fields = infer_select_statement(schema, &CteEnv::default(), select)?;
    combine(raw, fields)
}

pub fn infer_returning_columns(
    schema: &Schema,
    raw: &[ColumnDescr],
    table_name: &str,
    returning: &[SelectItem],
) -> Result<Vec<ColumnDescr>> {
    let table = schema
        .get_table(table_name)
        .ok_or_else(|| Error::UnknownTable(table_name.to_string()))?;
    let mut scope = Scope::default();
    scope.push_table(table_name, table);
    let fields = project(schema, &CteEnv::default(), &scope, returning, &[])?;
    combine(raw, fields)
}

fn combine(raw: &[ColumnDescr], fields: Vec<FieldNullability>) -> Result<Vec<ColumnDescr>> {
    if raw.len() != fields.len() {
        return Err(Error::Internal(format!(
            "probe saw {} output columns but inference computed {}",
            raw.len(),
            fields.len()
        )));
    }
    Ok(raw
        .iter()
        .cloned()
        .zip(fields)
        .map(|(col, nullability)| {
            let elem_nullable = match nullability {
                FieldNullability::Array { elem_nullable, .. } => Some(elem_nullable),
                FieldNullability::Scalar { .. } => {
                    matches!(col.data_type, PostgresType::Array(_)).then_some(true)
                }
            };
            ColumnDescr {
                name: col.name,
                data_type: col.data_type,
                nullable: nullability.nullable(),
                elem_nullable,
            }
        })
        .collect())
}

fn infer_select_statement(
    schema: &Schema,
    outer_ctes: &CteEnv,
    select: &SelectStatement,
) -> Result<Vec<FieldNullability>> {
    let mut ctes = outer_ctes.clone();
    for with in &select.ctes {
        let fields = infer_select_statement(schema, &ctes, &with.query)?;
        let names: Vec<String> = if !with.column_names.is_empty() {
            with.column_names.clone()
        } else {
            (0..fields.len()).map(|i| format!("column{i}")).collect()
        };
        let columns = fields
            .into_iter()
            .zip(names)
            .map(|(nullability, name)| crate::scope::VirtualField { name, nullability })
            .collect();
        ctes.insert(VirtualTable {
            name: with.name.clone(),
            columns,
        });
    }

    infer_set_expr(schema, &ctes, &select.body)
}

fn infer_set_expr(schema: &Schema, ctes: &CteEnv, set_expr: &SetExpr) -> Result<Vec<FieldNullability>> {
    match set_expr {
        SetExpr::Select(body) => infer_select_body(schema, ctes, body),
        SetExpr::SetOperation { left, right, .. } => {
            let left_fields = infer_set_expr(schema, ctes, left)?;
            let right_fields = infer_set_expr(schema, ctes, right)?;
            if left_fields.len() != right_fields.len() {
                return Err(Error::Internal(
                    "set operation arms produced different column counts".to_string(),
                ));
            }
            Ok(left_fields
                .into_iter()
                .zip(right_fields)
                .map(|(l, r)| l.or(r))
                .collect())
        }
    }
}

fn infer_select_body(schema: &Schema, ctes: &CteEnv, body: &SelectBody) -> Result<Vec<FieldNullability>> {
    let mut scope = Scope::default();
    for table_expr in &body.from {
        let sub = build_table_expr_scope(schema, ctes, table_expr)?;
        scope.sources.extend(sub.sources);
    }
    let mut nonnull = Vec::new();
    if let Some(selection) = &body.selection {
        refine_scope_from_where(&mut scope, selection);
        collect_nonnull_exprs(selection, &mut nonnull);
    }
    project(schema, ctes, &scope, &body.projection, &nonnull)
}

fn build_table_expr_scope(schema: &Schema, ctes: &CteEnv, expr: &TableExpression) -> Result<Scope> {
    match expr {
        TableExpression::Table { name, alias } => {
            let alias = alias.clone().unwrap_or_else(|| name.clone());
            let mut scope = Scope::default();
            if let Some(vt) = ctes.get(name) {
                scope.push_virtual_table(&alias, vt);
            } else {
                let table = schema
                    .get_table(name)
                    .ok_or_else(|| Error::UnknownTable(name.clone()))?;
                scope.push_table(&alias, table);
            }
            Ok(scope)
        }
        TableExpression::SubQuery { query, alias } => {
            let fields = infer_select_statement(schema, ctes, query)?;
            let columns = fields
                .into_iter()
                .enumerate()
                .map(|(i, nullability)| crate::scope::VirtualField {
                    name: format!("column{i}"),
                    nullability,
                })
                .collect();
            let vt = VirtualTable {
                name: alias.clone(),
                columns,
            };
            let mut scope = Scope::default();
            scope.push_virtual_table(alias, &vt);
            Ok(scope)
        }
        TableExpression::CrossJoin { left, right } => {
            let mut left_scope = build_table_expr_scope(schema, ctes, left)?;
            let right_scope = build_table_expr_scope(schema, ctes, right)?;
            left_scope.sources.extend(right_scope.sources);
            Ok(left_scope)
        }
        TableExpression::QualifiedJoin {
            left,
            join_type,
            right,
        } => {
            let left_scope = build_table_expr_scope(schema, ctes, left)?;
            let right_scope = build_table_expr_scope(schema, ctes, right)?;
            let left_aliases: HashSet<String> = left_scope
                .sources
                .iter()
                .map(|s| s.table_alias.clone())
                .collect();
            let right_aliases: HashSet<String> = right_scope
                .sources
                .iter()
                .map(|s| s.table_alias.clone())
                .collect();

            let mut merged = Scope::default();
            merged.sources.extend(left_scope.sources);
            merged.sources.extend(right_scope.sources);

            use crate::ast::JoinType;
            match join_type {
                JoinType::Inner => {}
                JoinType::Left => {
                    for alias in &right_aliases {
                        merged.mark_nullable(alias);
                    }
                }
                JoinType::Right => {
                    for alias in &left_aliases {
                        merged.mark_nullable(alias);
                    }
                }
                JoinType::Full => {
                    for alias in left_aliases.iter().chain(right_aliases.iter()) {
                        merged.mark_nullable(alias);
                    }
                }
            }
            Ok(merged)
        }
    }
}

enum ColumnKey {
    Unqualified(String),
    Qualified(String, String),
}

/// Conjuncts of the `WHERE` clause that guarantee a referenced column is
/// non-null among rows passing the filter: `IS NOT NULL`, and either side of
/// a comparison or `LIKE` (a `NULL` operand makes the whole comparison
/// `NULL`, which `WHERE` treats as false). Stops at `OR` and anything not in
/// this short list — soundness over recall.
fn collect_nonnull_columns(expr: &Expr, out: &mut Vec<ColumnKey>) {
    match expr {
        Expr::BinaryOp {
            op: BinaryOperator::And,
            lhs,
            rhs,
        } => {
            collect_nonnull_columns(lhs, out);
            collect_nonnull_columns(rhs, out);
        }
        Expr::UnaryOp {
            op: UnaryOperator::IsNotNull,
            operand,
        } => collect_column_ref(operand, out),
        Expr::BinaryOp {
            op: BinaryOperator::Comparison | BinaryOperator::Like,
            lhs,
            rhs,
        } => {
            collect_column_ref(lhs, out);
            collect_column_ref(rhs, out);
        }
        _ => {}
    }
}

/// Same traversal as [`collect_nonnull_columns`], but collects the guaranteed
/// non-null sub-expressions themselves rather than just the column refs
/// inside them, so arbitrary expressions (`a + b`, `f(x)`) can be matched by
/// structural equality in [`infer_expr_nullability`], not just bare columns.
fn collect_nonnull_exprs(expr: &Expr, out: &mut Vec<Expr>) {
    match expr {
        Expr::BinaryOp {
            op: BinaryOperator::And,
            lhs,
            rhs,
        } => {
            collect_nonnull_exprs(lhs, out);
            collect_nonnull_exprs(rhs, out);
        }
        Expr::UnaryOp {
            op: UnaryOperator::IsNotNull,
            operand,
        } => out.push((**operand).clone()),
        Expr::BinaryOp { op, lhs, rhs }
            if matches!(nullsafety::binary_category(op), Category::Safe) =>
        {
            out.push((**lhs).clone());
            out.push((**rhs).clone());
        }
        Expr::FunctionCall { name, args } if matches!(nullsafety::function_category(name), Category::Safe) => {
            out.extend(args.iter().cloned());
        }
        _ => {}
    }
}

fn collect_column_ref(expr: &Expr, out: &mut Vec<ColumnKey>) {
    match expr {
        Expr::ColumnRef { column } => out.push(ColumnKey::Unqualified(column.clone())),
        Expr::TableColumnRef { table, column } => {
            out.push(ColumnKey::Qualified(table.clone(), column.clone()))
        }
        _ => {}
    }
}

/// An unqualified `WHERE col IS NOT NULL` is matched by column name alone,
/// without checking which table it came from — aggressive when the same
/// name exists under multiple aliases, but sound in the much more common
/// unambiguous case, and erring toward non-null here only ever makes the
/// generated type *stricter* than reality, never the reverse.
fn refine_scope_from_where(scope: &mut Scope, selection: &Expr) {
    let mut keys = Vec::new();
    collect_nonnull_columns(selection, &mut keys);
    for key in keys {
        match key {
            ColumnKey::Unqualified(name) => {
                if let Ok(src) = scope.resolve_unqualified(&name) {
                    let alias = src.table_alias.clone();
                    force_non_null(scope, &alias, &name);
                }
            }
            ColumnKey::Qualified(alias, name) => {
                force_non_null(scope, &alias, &name);
            }
        }
    }
}

fn force_non_null(scope: &mut Scope, alias: &str, name: &str) {
    for source in scope.sources.iter_mut() {
        if source.table_alias.eq_ignore_ascii_case(alias) && source.column_name.eq_ignore_ascii_case(name) {
            source.nullability = source.nullability.with_nullable(false);
        }
    }
}

fn project(
    schema: &Schema,
    ctes: &CteEnv,
    scope: &Scope,
    items: &[SelectItem],
    nonnull: &[Expr],
) -> Result<Vec<FieldNullability>> {
    let mut fields = Vec::new();
    for item in items {
        match item {
            SelectItem::Wildcard => {
                for col in scope.all_columns() {
                    fields.push(col.nullability);
                }
            }
            SelectItem::QualifiedWildcard(alias) => {
                for col in scope.columns_for_alias(alias) {
                    fields.push(col.nullability);
                }
            }
            SelectItem::Expr(expr) | SelectItem::ExprWithAlias(expr, _) => {
                fields.push(infer_expr_nullability(schema, ctes, scope, expr, nonnull)?);
            }
        }
    }
    Ok(fields)
}

fn infer_expr_nullability(
    schema: &Schema,
    ctes: &CteEnv,
    scope: &Scope,
    expr: &Expr,
    nonnull: &[Expr],
) -> Result<FieldNullability> {
    if nonnull.contains(expr) {
        return Ok(FieldNullability::Scalar { nullable: false });
    }
    Ok(match expr {
        Expr::ColumnRef { column } => scope
            .resolve_unqualified(column)
            .map(|c| c.nullability)
            .unwrap_or(FieldNullability::Scalar { nullable: true }),
        Expr::TableColumnRef { table, column } => scope
            .resolve_qualified(table, column)
            .map(|c| c.nullability)
            .unwrap_or(FieldNullability::Scalar { nullable: true }),
        Expr::Constant { .. } => FieldNullability::Scalar { nullable: false },
        Expr::Parameter { .. } => FieldNullability::Scalar { nullable: true },
        Expr::UnaryOp { op, operand } => match nullsafety::unary_category(*op) {
            Category::NeverNull => FieldNullability::Scalar { nullable: false },
            Category::AlwaysNull => FieldNullability::Scalar { nullable: true },
            Category::Safe => {
                let inner = infer_expr_nullability(schema, ctes, scope, operand, nonnull)?;
                FieldNullability::Scalar {
                    nullable: inner.nullable(),
                }
            }
            Category::Unsafe => FieldNullability::Scalar { nullable: true },
        },
        Expr::BinaryOp { op, lhs, rhs } => match nullsafety::binary_category(op) {
            Category::NeverNull => FieldNullability::Scalar { nullable: false },
            Category::AlwaysNull => FieldNullability::Scalar { nullable: true },
            Category::Safe => {
                let l = infer_expr_nullability(schema, ctes, scope, lhs, nonnull)?;
                let r = infer_expr_nullability(schema, ctes, scope, rhs, nonnull)?;
                FieldNullability::Scalar {
                    nullable: l.nullable() || r.nullable(),
                }
            }
            Category::Unsafe => FieldNullability::Scalar { nullable: true },
        },
        Expr::FunctionCall { name, args } => match nullsafety::function_category(name) {
            Category::NeverNull => FieldNullability::Scalar { nullable: false },
            Category::AlwaysNull => FieldNullability::Scalar { nullable: true },
            Category::Safe => {
                let mut nullable = false;
                for arg in args {
                    if infer_expr_nullability(schema, ctes, scope, arg, nonnull)?.nullable() {
                        nullable = true;
                    }
                }
                FieldNullability::Scalar { nullable }
            }
            Category::Unsafe => FieldNullability::Scalar { nullable: true },
        },
        // `EXISTS (...)` always yields true/false, never NULL.
        Expr::ExistsOp { .. } => FieldNullability::Scalar { nullable: false },
        // `x IN (subquery)` is NULL when `x` is NULL; the subquery's own rows
        // don't change that (Postgres's `IN` against an empty set is `false`,
        // not `NULL`).
        Expr::InOp { lhs, .. } => {
            let inner = infer_expr_nullability(schema, ctes, scope, lhs, nonnull)?;
            FieldNullability::Scalar {
                nullable: inner.nullable(),
            }
        }
        // `ARRAY(subquery)` always produces an array value (empty if the
        // subquery has no rows), never NULL itself; its elements carry the
        // nullability of the subquery's single projected column.
        Expr::ArraySubQuery { subquery } => {
            let fields = infer_select_statement(schema, ctes, subquery)?;
            let elem_nullable = fields.first().map(|f| f.nullable()).unwrap_or(true);
            FieldNullability::Array {
                nullable: false,
                elem_nullable,
            }
        }
        Expr::TypeCast { lhs, .. } => infer_expr_nullability(schema, ctes, scope, lhs, nonnull)?,
        Expr::Unsupported(description) => {
            return Err(Error::UnsupportedConstruct(description.clone()))
        }
    })
}
