//! Stands in for the out-of-scope external "driver probe": syntactic
//! validation that every referenced table/column exists, plus a best-effort
//! base type for every output column and bound parameter. Everything it
//! produces is maximally conservative on nullability — every column and
//! every parameter comes back `nullable: true` — because telling what can
//! actually be `NULL` is [`crate::infer`]'s job, not this one's.
//!
//! The table/column resolution logic here is the same shape the schema-aware
//! validator in this crate has always used (alias tracking, CTE definitions,
//! JOIN traversal, wildcard expansion); probing only asks "does this resolve,
//! and to what base type", never "can it be null".

use crate::error::{Error, Result};
use crate::model::{ColumnDescr, ParamDescr};
use crate::schema::Schema;
use crate::types::PostgresType;
use sqlparser::ast::{
    AssignmentTarget, Delete, Expr, FromTable, FunctionArg, FunctionArgExpr, FunctionArguments,
    Insert, Query, Select, SelectItem, SetExpr, SetOperator, Statement, TableFactor,
    TableWithJoins, Update, Value,
};
use std::collections::HashMap;

/// The conservative, all-nullable description [`crate::infer`] refines.
#[derive(Debug, Clone)]
pub struct RawStatement {
    pub columns: Vec<ColumnDescr>,
    pub params: Vec<ParamDescr>,
}

fn column_descr(name: String, data_type: PostgresType) -> ColumnDescr {
    let elem_nullable = matches!(data_type, PostgresType::Array(_)).then_some(true);
    ColumnDescr {
        name,
        data_type,
        nullable: true,
        elem_nullable,
    }
}

pub fn probe(schema: &Schema, stmt: &Statement) -> Result<RawStatement> {
    let (raw_columns, param_types) = match stmt {
        Statement::Query(query) => {
            let mut params = HashMap::new();
            let columns = probe_select(schema, query, &mut params)?;
            (columns, params)
        }
        Statement::Insert(insert) => probe_insert(schema, insert)?,
        Statement::Update(update) => probe_update(schema, update)?,
        Statement::Delete(delete) => probe_delete(schema, delete)?,
        other => {
            return Err(Error::InvalidQuery(format!(
                "statement kind {other:?} is not supported"
            )))
        }
    };

    let columns = raw_columns
        .into_iter()
        .map(|(name, ty)| column_descr(name, ty))
        .collect();

    let mut max_index = 0;
    for &index in param_types.keys() {
        max_index = max_index.max(index);
    }
    let params = (1..=max_index)
        .map(|index| ParamDescr {
            index,
            data_type: param_types
                .get(&index)
                .cloned()
                .unwrap_or(PostgresType::Custom("unknown".to_string())),
            nullable: true,
        })
        .collect();

    Ok(RawStatement { columns, params })
}

/// A CTE's columns, carried as (name, type) pairs.
#[derive(Debug, Clone)]
struct CteDefinition {
    columns: Vec<(String, PostgresType)>,
}

#[derive(Debug, Default, Clone)]
struct ResolveContext {
    table_aliases: HashMap<String, String>,
    /// Aliases in the order they were pushed from the `FROM`/`JOIN` tree,
    /// left to right — the order `SELECT *`/`tbl.*` must expand in so probed
    /// columns line up positionally with `columns::combine`'s deterministic
    /// `scope.all_columns()` order, not the arbitrary order a `HashMap`
    /// iterates in.
    table_order: Vec<String>,
    cte_definitions: HashMap<String, CteDefinition>,
}

impl ResolveContext {
    fn get_cte(&self, name: &str) -> Option<&CteDefinition> {
        self.cte_definitions.get(&name.to_lowercase())
    }

    fn add_cte(&mut self, name: String, columns: Vec<(String, PostgresType)>) {
        self.cte_definitions
            .insert(name.to_lowercase(), CteDefinition { columns });
    }

    fn push_alias(&mut self, alias: String, table_ref: String) {
        let alias = alias.to_lowercase();
        if !self.table_aliases.contains_key(&alias) {
            self.table_order.push(alias.clone());
        }
        self.table_aliases.insert(alias, table_ref);
    }
}

fn probe_select(
    schema: &Schema,
    query: &Query,
    params: &mut HashMap<usize, PostgresType>,
) -> Result<Vec<(String, PostgresType)>> {
    let mut ctx = ResolveContext::default();

    if let Some(with_clause) = &query.with {
        for cte in &with_clause.cte_tables {
            let cte_name = cte.alias.name.value.clone();
            let cte_columns = probe_select(schema, &cte.query, params)?;
            let columns = if !cte.alias.columns.is_empty() {
                cte_columns
                    .into_iter()
                    .zip(cte.alias.columns.iter())
                    .map(|((_, ty), alias_col)| (alias_col.name.value.clone(), ty))
                    .collect()
            } else {
                cte_columns
            };
            ctx.add_cte(cte_name, columns);
        }
    }

    probe_set_expr(schema, query.body.as_ref(), ctx, params)
}

fn probe_set_expr(
    schema: &Schema,
    set_expr: &SetExpr,
    ctx: ResolveContext,
    params: &mut HashMap<usize, PostgresType>,
) -> Result<Vec<(String, PostgresType)>> {
    match set_expr {
        SetExpr::Select(select) => probe_select_body(schema, select, ctx, params),
        SetExpr::SetOperation { op, left, right, .. } => {
            // Both arms see the same outer CTEs (a `WITH` clause wrapping a
            // `UNION` is visible to either side), but don't share each
            // other's FROM-clause table aliases.
            let left_cols = probe_set_expr(schema, left, ctx.clone(), params)?;
            let right_cols = probe_set_expr(schema, right, ctx, params)?;
            if left_cols.len() != right_cols.len() {
                return Err(Error::InvalidQuery(format!(
                    "{} requires both sides to have the same number of columns (left: {}, right: {})",
                    set_op_name(op),
                    left_cols.len(),
                    right_cols.len()
                )));
            }
            Ok(left_cols)
        }
        SetExpr::Query(subquery) => probe_select(schema, subquery, params),
        other => Err(Error::InvalidQuery(format!(
            "set expression {other:?} is not supported"
        ))),
    }
}

fn set_op_name(op: &SetOperator) -> &'static str {
    match op {
        SetOperator::Union => "UNION",
        SetOperator::Intersect => "INTERSECT",
        SetOperator::Except => "EXCEPT",
        SetOperator::Minus => "MINUS",
    }
}

fn probe_select_body(
    schema: &Schema,
    select: &Select,
    mut ctx: ResolveContext,
    params: &mut HashMap<usize, PostgresType>,
) -> Result<Vec<(String, PostgresType)>> {
    for twj in &select.from {
        resolve_table_refs(schema, twj, &mut ctx, params)?;
    }

    if let Some(selection) = &select.selection {
        scan_params(schema, &ctx, selection, None, params);
    }

    let mut columns = Vec::new();
    for item in &select.projection {
        match item {
            SelectItem::UnnamedExpr(expr) => {
                let (name, ty) = infer_expr_pg_type(schema, &ctx, expr)?;
                columns.push((name, ty));
            }
            SelectItem::ExprWithAlias { expr, alias } => {
                let (_, ty) = infer_expr_pg_type(schema, &ctx, expr)?;
                columns.push((alias.value.clone(), ty));
            }
            SelectItem::Wildcard(_) => {
                for alias in &ctx.table_order {
                    let table_ref = &ctx.table_aliases[alias];
                    if let Some(cte_name) = table_ref.strip_prefix("_cte:") {
                        if let Some(cte) = ctx.get_cte(cte_name) {
                            columns.extend(cte.columns.iter().cloned());
                        }
                    } else if let Some(table) = schema.get_table(table_ref) {
                        for col in &table.columns {
                            if !col.hidden {
                                columns.push((col.name.clone(), col.data_type.clone()));
                            }
                        }
                    }
                }
            }
            SelectItem::QualifiedWildcard(kind, _) => {
                use sqlparser::ast::SelectItemQualifiedWildcardKind;
                let table_alias = match kind {
                    SelectItemQualifiedWildcardKind::ObjectName(obj_name) => obj_name
                        .0
                        .first()
                        .and_then(|part| part.as_ident())
                        .map(|i| i.value.clone())
                        .ok_or_else(|| {
                            Error::InvalidQuery("Empty qualified wildcard".to_string())
                        })?,
                    SelectItemQualifiedWildcardKind::Expr(_) => {
                        return Err(Error::InvalidQuery(
                            "expression wildcards are not supported".to_string(),
                        ));
                    }
                };

                let table_ref = ctx
                    .table_aliases
                    .get(&table_alias.to_lowercase())
                    .ok_or_else(|| Error::UnknownTable(table_alias.clone()))?;

                if let Some(cte_name) = table_ref.strip_prefix("_cte:") {
                    let cte = ctx
                        .get_cte(cte_name)
                        .ok_or_else(|| Error::UnknownTable(cte_name.to_string()))?;
                    columns.extend(cte.columns.iter().cloned());
                } else {
                    let table = schema
                        .get_table(table_ref)
                        .ok_or_else(|| Error::UnknownTable(table_ref.clone()))?;
                    for col in &table.columns {
                        if !col.hidden {
                            columns.push((col.name.clone(), col.data_type.clone()));
                        }
                    }
                }
            }
        }
    }

    Ok(columns)
}

fn resolve_table_refs(
    schema: &Schema,
    twj: &TableWithJoins,
    ctx: &mut ResolveContext,
    params: &mut HashMap<usize, PostgresType>,
) -> Result<()> {
    resolve_table_factor(schema, &twj.relation, ctx, params)?;
    for join in &twj.joins {
        resolve_table_factor(schema, &join.relation, ctx, params)?;
    }
    Ok(())
}

fn resolve_table_factor(
    schema: &Schema,
    factor: &TableFactor,
    ctx: &mut ResolveContext,
    params: &mut HashMap<usize, PostgresType>,
) -> Result<()> {
    match factor {
        TableFactor::Table { name, alias, .. } => {
            let table_name = name
                .0
                .last()
                .and_then(|part| part.as_ident())
                .map(|i| i.value.clone())
                .ok_or_else(|| Error::InvalidQuery("Empty table name".to_string()))?;

            let alias_name = alias
                .as_ref()
                .map(|a| a.name.value.clone())
                .unwrap_or_else(|| table_name.clone());

            if ctx.get_cte(&table_name).is_some() {
                ctx.push_alias(alias_name, format!("_cte:{}", table_name.to_lowercase()));
            } else {
                if !schema.has_table(&table_name) {
                    return Err(Error::UnknownTable(table_name));
                }
                ctx.push_alias(alias_name, table_name.clone());
            }
        }
        // A subquery in `FROM` is probed exactly like a CTE and registered
        // under its alias in the same `cte_definitions` table, so every
        // downstream lookup (wildcard expansion, qualified column refs) that
        // already knows how to read a CTE handles it for free.
        TableFactor::Derived {
            subquery,
            alias: Some(a),
            ..
        } => {
            let columns = probe_select(schema, subquery, params)?;
            ctx.add_cte(a.name.value.clone(), columns);
            ctx.push_alias(
                a.name.value.clone(),
                format!("_cte:{}", a.name.value.to_lowercase()),
            );
        }
        TableFactor::Derived { alias: None, .. } => {
            return Err(Error::InvalidQuery(
                "subquery in FROM requires an alias".to_string(),
            ))
        }
        _ => {}
    }
    Ok(())
}

fn infer_expr_pg_type(
    schema: &Schema,
    ctx: &ResolveContext,
    expr: &Expr,
) -> Result<(String, PostgresType)> {
    match expr {
        Expr::Identifier(ident) => {
            let col_name = &ident.value;
            if let Some((_, ty)) = find_column_in_ctes(ctx, col_name) {
                return Ok((col_name.clone(), ty));
            }
            let (_, col) = find_column_in_tables(schema, ctx, col_name)?;
            Ok((col_name.clone(), col.data_type.clone()))
        }
        Expr::CompoundIdentifier(idents) => {
            if idents.len() != 2 {
                return Err(Error::InvalidQuery(format!(
                    "Expected table.column, got {} parts",
                    idents.len()
                )));
            }
            let table_alias = &idents[0].value;
            let col_name = &idents[1].value;

            let table_ref = ctx
                .table_aliases
                .get(&table_alias.to_lowercase())
                .ok_or_else(|| Error::UnknownTable(table_alias.clone()))?;

            if let Some(cte_name) = table_ref.strip_prefix("_cte:") {
                let cte = ctx
                    .get_cte(cte_name)
                    .ok_or_else(|| Error::UnknownTable(cte_name.to_string()))?;
                let (_, ty) = cte
                    .columns
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(col_name))
                    .ok_or_else(|| Error::UnknownColumn {
                        table: cte_name.to_string(),
                        column: col_name.clone(),
                    })?;
                return Ok((col_name.clone(), ty.clone()));
            }

            let table = schema
                .get_table(table_ref)
                .ok_or_else(|| Error::UnknownTable(table_ref.clone()))?;
            let col = table
                .get_column(col_name)
                .ok_or_else(|| Error::UnknownColumn {
                    table: table_ref.clone(),
                    column: col_name.clone(),
                })?;
            Ok((col_name.clone(), col.data_type.clone()))
        }
        Expr::Function(func) => {
            let func_name = func
                .name
                .0
                .last()
                .and_then(|part| part.as_ident())
                .map(|i| i.value.to_lowercase())
                .unwrap_or_default();

            let ty = match func_name.as_str() {
                "count" => PostgresType::BigInt,
                "sum" | "avg" => PostgresType::Numeric,
                "min" | "max" | "coalesce" => get_first_arg_type(schema, ctx, &func.args)?
                    .unwrap_or(PostgresType::Text),
                "now" | "current_timestamp" | "localtimestamp" | "to_timestamp"
                | "make_timestamp" | "make_timestamptz" | "date_trunc" => PostgresType::TimestampTz,
                "current_date" | "to_date" | "make_date" => PostgresType::Date,
                "current_time" | "make_time" => PostgresType::Time,
                "age" | "make_interval" => PostgresType::Interval,
                "length" | "char_length" | "character_length" | "octet_length" | "bit_length"
                | "position" | "strpos" | "ascii" => PostgresType::Integer,
                "extract" | "date_part" => PostgresType::DoublePrecision,
                _ => PostgresType::Text,
            };
            Ok((func_name, ty))
        }
        Expr::Value(val) => {
            let ty = match &val.value {
                Value::Number(_, _) => PostgresType::BigInt,
                Value::SingleQuotedString(_) => PostgresType::Text,
                Value::Boolean(_) => PostgresType::Boolean,
                Value::Null => PostgresType::Text,
                _ => PostgresType::Text,
            };
            Ok(("?column?".to_string(), ty))
        }
        Expr::Cast { expr, data_type, .. } => {
            let ty = PostgresType::from_sql_name(&format!("{data_type}"));
            let (name, _) = infer_expr_pg_type(schema, ctx, expr)?;
            Ok((name, ty))
        }
        Expr::BinaryOp { left, .. } => infer_expr_pg_type(schema, ctx, left),
        Expr::Nested(inner) => infer_expr_pg_type(schema, ctx, inner),
        Expr::Extract { .. } => Ok(("extract".to_string(), PostgresType::DoublePrecision)),
        Expr::Position { .. } => Ok(("position".to_string(), PostgresType::Integer)),
        Expr::Substring { .. } => Ok(("substring".to_string(), PostgresType::Text)),
        Expr::Trim { .. } => Ok(("trim".to_string(), PostgresType::Text)),
        Expr::Overlay { .. } => Ok(("overlay".to_string(), PostgresType::Text)),
        _ => Ok(("?column?".to_string(), PostgresType::Text)),
    }
}

fn get_first_arg_type(
    schema: &Schema,
    ctx: &ResolveContext,
    args: &FunctionArguments,
) -> Result<Option<PostgresType>> {
    match args {
        FunctionArguments::List(list) => {
            if let Some(FunctionArg::Unnamed(FunctionArgExpr::Expr(e))) = list.args.first() {
                let (_, ty) = infer_expr_pg_type(schema, ctx, e)?;
                return Ok(Some(ty));
            }
            Ok(None)
        }
        _ => Ok(None),
    }
}

fn find_column_in_ctes(ctx: &ResolveContext, col_name: &str) -> Option<(String, PostgresType)> {
    let mut found = None;
    for (alias, table_ref) in &ctx.table_aliases {
        if let Some(cte_name) = table_ref.strip_prefix("_cte:") {
            if let Some(cte) = ctx.get_cte(cte_name) {
                if let Some((name, ty)) = cte
                    .columns
                    .iter()
                    .find(|(name, _)| name.eq_ignore_ascii_case(col_name))
                {
                    if found.is_some() {
                        return None;
                    }
                    found = Some((alias.clone(), name.clone(), ty.clone()));
                }
            }
        }
    }
    found.map(|(alias, _, ty)| (alias, ty))
}

fn find_column_in_tables<'a>(
    schema: &'a Schema,
    ctx: &ResolveContext,
    col_name: &str,
) -> Result<(String, &'a crate::schema::Column)> {
    let mut found: Option<(String, &crate::schema::Column)> = None;
    for (alias, table_name) in &ctx.table_aliases {
        if table_name.starts_with("_cte:") {
            continue;
        }
        if let Some(table) = schema.get_table(table_name) {
            if let Some(col) = table.get_column(col_name) {
                if found.is_some() {
                    return Err(Error::AmbiguousColumn(col_name.to_string()));
                }
                found = Some((alias.clone(), col));
            }
        }
    }
    found.ok_or_else(|| Error::UnknownColumn {
        table: "<unknown>".to_string(),
        column: col_name.to_string(),
    })
}

/// Best-effort `$N` typing: when a placeholder sits directly across a
/// comparison/assignment from a known column, it's typed as that column;
/// anything else is left untyped (and defaults to `Custom("unknown")`).
fn scan_params(
    schema: &Schema,
    ctx: &ResolveContext,
    expr: &Expr,
    hint: Option<PostgresType>,
    params: &mut HashMap<usize, PostgresType>,
) {
    match expr {
        Expr::Value(v) => {
            if let Value::Placeholder(p) = &v.value {
                if let Some(ty) = hint {
                    let index: usize = p.trim_start_matches('$').parse().unwrap_or(0);
                    if index > 0 {
                        params.entry(index).or_insert(ty);
                    }
                }
            }
        }
        Expr::Nested(inner) => scan_params(schema, ctx, inner, hint, params),
        Expr::UnaryOp { expr: inner, .. } => scan_params(schema, ctx, inner, None, params),
        Expr::BinaryOp { left, right, .. } => {
            let left_ty = infer_expr_pg_type(schema, ctx, left).ok().map(|(_, t)| t);
            let right_ty = infer_expr_pg_type(schema, ctx, right).ok().map(|(_, t)| t);
            scan_params(schema, ctx, left, right_ty, params);
            scan_params(schema, ctx, right, left_ty, params);
        }
        Expr::InList { expr: inner, list, .. } => {
            let inner_ty = infer_expr_pg_type(schema, ctx, inner).ok().map(|(_, t)| t);
            scan_params(schema, ctx, inner, None, params);
            for item in list {
                scan_params(schema, ctx, item, inner_ty.clone(), params);
            }
        }
        Expr::Function(func) => {
            if let FunctionArguments::List(list) = &func.args {
                for arg in &list.args {
                    if let FunctionArg::Unnamed(FunctionArgExpr::Expr(e))
                    | FunctionArg::Named {
                        arg: FunctionArgExpr::Expr(e),
                        ..
                    } = arg
                    {
                        scan_params(schema, ctx, e, None, params);
                    }
                }
            }
        }
        _ => {}
    }
}

fn probe_insert(
    schema: &Schema,
    insert: &Insert,
) -> Result<(Vec<(String, PostgresType)>, HashMap<usize, PostgresType>)> {
    let table_name = insert.table.to_string();
    let table = schema
        .get_table(&table_name)
        .ok_or_else(|| Error::UnknownTable(table_name.clone()))?;

    for col_ident in &insert.columns {
        if !table.has_column(&col_ident.value) {
            return Err(Error::UnknownColumn {
                table: table_name.clone(),
                column: col_ident.value.clone(),
            });
        }
    }

    let mut params = HashMap::new();
    if let Some(source) = &insert.source {
        if let SetExpr::Values(values) = source.body.as_ref() {
            for row in &values.rows {
                for (col_ident, value_expr) in insert.columns.iter().zip(row.iter()) {
                    let col_ty = table.get_column(&col_ident.value).map(|c| c.data_type.clone());
                    scan_params(schema, &ResolveContext::default(), value_expr, col_ty, &mut params);
                }
            }
        } else {
            probe_select(schema, source, &mut params)?;
        }
    }

    let mut ctx = ResolveContext::default();
    ctx.table_aliases
        .insert(table_name.to_lowercase(), table_name.clone());

    let columns = if let Some(returning) = &insert.returning {
        probe_returning(schema, &ctx, table, returning)?
    } else {
        vec![]
    };

    Ok((columns, params))
}

fn probe_update(
    schema: &Schema,
    update: &Update,
) -> Result<(Vec<(String, PostgresType)>, HashMap<usize, PostgresType>)> {
    let table_name = extract_table_name_from_table_with_joins(&update.table)?;
    let table = schema
        .get_table(&table_name)
        .ok_or_else(|| Error::UnknownTable(table_name.clone()))?;

    let mut ctx = ResolveContext::default();
    ctx.table_aliases
        .insert(table_name.to_lowercase(), table_name.clone());

    let mut params = HashMap::new();
    for assignment in &update.assignments {
        let col_names = extract_assignment_target_columns(&assignment.target)?;
        for col_name in &col_names {
            if !table.has_column(col_name) {
                return Err(Error::UnknownColumn {
                    table: table_name.clone(),
                    column: col_name.clone(),
                });
            }
        }
        let hint = col_names
            .first()
            .and_then(|c| table.get_column(c))
            .map(|c| c.data_type.clone());
        scan_params(schema, &ctx, &assignment.value, hint, &mut params);
    }

    if let Some(selection) = &update.selection {
        scan_params(schema, &ctx, selection, None, &mut params);
    }

    let columns = if let Some(returning) = &update.returning {
        probe_returning(schema, &ctx, table, returning)?
    } else {
        vec![]
    };

    Ok((columns, params))
}

fn probe_delete(
    schema: &Schema,
    delete: &Delete,
) -> Result<(Vec<(String, PostgresType)>, HashMap<usize, PostgresType>)> {
    let table_name = extract_table_name_from_delete_from(&delete.from)?;
    let table = schema
        .get_table(&table_name)
        .ok_or_else(|| Error::UnknownTable(table_name.clone()))?;

    let mut ctx = ResolveContext::default();
    ctx.table_aliases
        .insert(table_name.to_lowercase(), table_name.clone());

    let mut params = HashMap::new();
    if let Some(selection) = &delete.selection {
        scan_params(schema, &ctx, selection, None, &mut params);
    }

    let columns = if let Some(returning) = &delete.returning {
        probe_returning(schema, &ctx, table, returning)?
    } else {
        vec![]
    };

    Ok((columns, params))
}

fn probe_returning(
    schema: &Schema,
    ctx: &ResolveContext,
    table: &crate::schema::Table,
    returning: &[SelectItem],
) -> Result<Vec<(String, PostgresType)>> {
    let mut columns = Vec::new();
    for item in returning {
        match item {
            SelectItem::UnnamedExpr(expr) => {
                let (name, ty) = infer_expr_pg_type(schema, ctx, expr)?;
                columns.push((name, ty));
            }
            SelectItem::ExprWithAlias { expr, alias } => {
                let (_, ty) = infer_expr_pg_type(schema, ctx, expr)?;
                columns.push((alias.value.clone(), ty));
            }
            SelectItem::Wildcard(_) => {
                for col in &table.columns {
                    if !col.hidden {
                        columns.push((col.name.clone(), col.data_type.clone()));
                    }
                }
            }
            SelectItem::QualifiedWildcard(_, _) => {
                for col in &table.columns {
                    if !col.hidden {
                        columns.push((col.name.clone(), col.data_type.clone()));
                    }
                }
            }
        }
    }
    Ok(columns)
}

fn extract_table_name_from_table_with_joins(twj: &TableWithJoins) -> Result<String> {
    match &twj.relation {
        TableFactor::Table { name, .. } => name
            .0
            .last()
            .and_then(|part| part.as_ident())
            .map(|i| i.value.clone())
            .ok_or_else(|| Error::InvalidQuery("Empty table name".to_string())),
        _ => Err(Error::InvalidQuery(
            "Complex table expressions not supported in UPDATE".to_string(),
        )),
    }
}

fn extract_table_name_from_delete_from(from: &FromTable) -> Result<String> {
    match from {
        FromTable::WithFromKeyword(tables) | FromTable::WithoutKeyword(tables) => {
            if tables.is_empty() {
                return Err(Error::InvalidQuery(
                    "DELETE requires at least one table".to_string(),
                ));
            }
            extract_table_name_from_table_with_joins(&tables[0])
        }
    }
}

fn extract_assignment_target_columns(target: &AssignmentTarget) -> Result<Vec<String>> {
    match target {
        AssignmentTarget::ColumnName(obj_name) => {
            let col_name = obj_name
                .0
                .last()
                .and_then(|part| part.as_ident())
                .map(|i| i.value.clone())
                .ok_or_else(|| Error::InvalidQuery("Empty column name in assignment".to_string()))?;
            Ok(vec![col_name])
        }
        AssignmentTarget::Tuple(obj_names) => obj_names
            .iter()
            .map(|obj_name| {
                obj_name
                    .0
                    .last()
                    .and_then(|part| part.as_ident())
                    .map(|i| i.value.clone())
                    .ok_or_else(|| {
                        Error::InvalidQuery("Empty column name in tuple assignment".to_string())
                    })
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlparser::dialect::PostgreSqlDialect;
    use sqlparser::parser::Parser;

    fn test_schema() -> Schema {
        Schema::from_sql(
            r#"
            CREATE TABLE users (
                id uuid NOT NULL,
                name text NOT NULL,
                email text NOT NULL,
                tags text[] NOT NULL,
                CONSTRAINT users_pkey PRIMARY KEY (id)
            );
            "#,
        )
        .unwrap()
    }

    fn parse_one(sql: &str) -> Statement {
        Parser::parse_sql(&PostgreSqlDialect {}, sql)
            .unwrap()
            .remove(0)
    }

    #[test]
    fn probes_simple_select_all_nullable() {
        let schema = test_schema();
        let stmt = parse_one("SELECT id, name FROM users");
        let raw = probe(&schema, &stmt).unwrap();
        assert_eq!(raw.columns.len(), 2);
        assert!(raw.columns.iter().all(|c| c.nullable));
        assert_eq!(raw.columns[0].data_type, PostgresType::Uuid);
    }

    #[test]
    fn probes_array_column_with_elem_nullable() {
        let schema = test_schema();
        let stmt = parse_one("SELECT tags FROM users");
        let raw = probe(&schema, &stmt).unwrap();
        assert_eq!(raw.columns[0].elem_nullable, Some(true));
    }

    #[test]
    fn probes_unknown_table() {
        let schema = test_schema();
        let stmt = parse_one("SELECT * FROM nonexistent");
        assert!(matches!(probe(&schema, &stmt), Err(Error::UnknownTable(_))));
    }

    #[test]
    fn probes_param_type_from_where_comparison() {
        let schema = test_schema();
        let stmt = parse_one("SELECT id FROM users WHERE id = $1");
        let raw = probe(&schema, &stmt).unwrap();
        assert_eq!(raw.params.len(), 1);
        assert_eq!(raw.params[0].data_type, PostgresType::Uuid);
        assert!(raw.params[0].nullable);
    }

    #[test]
    fn probes_insert_returning() {
        let schema = test_schema();
        let stmt = parse_one(
            "INSERT INTO users (id, name, email, tags) VALUES ($1, $2, $3, $4) RETURNING id, name",
        );
        let raw = probe(&schema, &stmt).unwrap();
        assert_eq!(raw.columns.len(), 2);
        assert_eq!(raw.params.len(), 4);
        assert_eq!(raw.params[0].data_type, PostgresType::Uuid);
    }

    #[test]
    fn probes_subquery_in_from() {
        let schema = test_schema();
        let stmt = parse_one("SELECT u.id, u.name FROM (SELECT id, name FROM users) u");
        let raw = probe(&schema, &stmt).unwrap();
        assert_eq!(raw.columns.len(), 2);
        assert_eq!(raw.columns[0].data_type, PostgresType::Uuid);
    }

    #[test]
    fn probes_wildcard_in_from_order_across_joined_tables() {
        let schema = Schema::from_sql(
            r#"
            CREATE TABLE users (
                id uuid NOT NULL,
                name text NOT NULL
            );
            CREATE TABLE profiles (
                id uuid NOT NULL,
                bio text
            );
            "#,
        )
        .unwrap();
        let stmt = parse_one("SELECT * FROM users u JOIN profiles p ON p.id = u.id");
        let raw = probe(&schema, &stmt).unwrap();
        let names: Vec<&str> = raw.columns.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["id", "name", "id", "bio"]);
    }

    #[test]
    fn probes_union_sees_outer_cte_on_both_arms() {
        let schema = test_schema();
        let stmt = parse_one(
            "WITH u AS (SELECT id FROM users) SELECT id FROM u UNION SELECT id FROM u",
        );
        let raw = probe(&schema, &stmt).unwrap();
        assert_eq!(raw.columns.len(), 1);
        assert_eq!(raw.columns[0].data_type, PostgresType::Uuid);
    }
}
