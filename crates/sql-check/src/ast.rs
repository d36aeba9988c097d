//! A narrow, closed statement/expression model used by the nullability and
//! row-count passes.
//!
//! `sqlparser`'s own AST is large and keeps growing as Postgres syntax gets
//! added to it; the inference passes only need to reason about a handful of
//! shapes (see the Non-goals in the analyzer's design: unrecognized SQL
//! degrades to nullable rather than crashing). Lowering once, here, keeps
//! that degrade-gracefully boundary in one place instead of scattered
//! `_ => ...` arms through every pass.
//!
//! `lower_statement` is the only entry point; everything else in this module
//! is lowering detail. Constructs outside the closed sum lower to
//! [`Expr::Unsupported`] / are rejected with [`Error::UnsupportedConstruct`]
//! rather than panicking.

use crate::error::{Error, Result};
use sqlparser::ast as sp;

#[derive(Debug, Clone)]
pub enum Statement {
    Select(SelectStatement),
    Insert(InsertStatement),
    Update(UpdateStatement),
    Delete(DeleteStatement),
}

#[derive(Debug, Clone)]
pub struct WithQuery {
    pub name: String,
    pub column_names: Vec<String>,
    pub query: SelectStatement,
}

#[derive(Debug, Clone)]
pub struct SelectStatement {
    pub ctes: Vec<WithQuery>,
    pub body: SetExpr,
    /// `LIMIT` on the top-level query only; nested subqueries carry their own.
    pub limit: Option<Expr>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SetOperator {
    Union,
    Intersect,
    Except,
}

#[derive(Debug, Clone)]
pub enum SetExpr {
    Select(Box<SelectBody>),
    SetOperation {
        op: SetOperator,
        left: Box<SetExpr>,
        right: Box<SetExpr>,
    },
}

#[derive(Debug, Clone)]
pub struct SelectBody {
    pub projection: Vec<SelectItem>,
    pub from: Vec<TableExpression>,
    pub selection: Option<Expr>,
}

#[derive(Debug, Clone)]
pub enum SelectItem {
    Wildcard,
    QualifiedWildcard(String),
    Expr(Expr),
    ExprWithAlias(Expr, String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    Left,
    Right,
    Full,
}

#[derive(Debug, Clone)]
pub enum TableExpression {
    Table {
        name: String,
        alias: Option<String>,
    },
    SubQuery {
        query: Box<SelectStatement>,
        alias: String,
    },
    CrossJoin {
        left: Box<TableExpression>,
        right: Box<TableExpression>,
    },
    QualifiedJoin {
        left: Box<TableExpression>,
        join_type: JoinType,
        right: Box<TableExpression>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOperator {
    Not,
    Plus,
    Minus,
    IsNull,
    IsNotNull,
    IsTrue,
    IsFalse,
    IsNotTrue,
    IsNotFalse,
    IsUnknown,
    IsNotUnknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BinaryOperator {
    Arithmetic,
    Comparison,
    Concat,
    And,
    Or,
    Like,
    Custom(String),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    ColumnRef {
        column: String,
    },
    TableColumnRef {
        table: String,
        column: String,
    },
    Constant {
        text: String,
    },
    /// 1-based positional parameter, `$N`.
    Parameter {
        index: usize,
    },
    UnaryOp {
        op: UnaryOperator,
        operand: Box<Expr>,
    },
    BinaryOp {
        op: BinaryOperator,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    FunctionCall {
        name: String,
        args: Vec<Expr>,
    },
    ExistsOp {
        subquery: Box<SelectStatement>,
    },
    InOp {
        lhs: Box<Expr>,
        subquery: Box<SelectStatement>,
    },
    ArraySubQuery {
        subquery: Box<SelectStatement>,
    },
    TypeCast {
        lhs: Box<Expr>,
        target_type: String,
    },
    /// Anything the closed sum above doesn't name (CASE, window functions,
    /// scalar subqueries outside `IN`/`EXISTS`/`ARRAY(...)`, ...). Always
    /// treated as nullable by the passes that consume it.
    Unsupported(String),
}

#[derive(Debug, Clone)]
pub struct InsertStatement {
    pub table: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Expr>>,
    pub has_default_values: bool,
    pub select: Option<Box<SelectStatement>>,
    pub returning: Vec<SelectItem>,
}

#[derive(Debug, Clone)]
pub struct Assignment {
    pub columns: Vec<String>,
    pub value: Expr,
}

#[derive(Debug, Clone)]
pub struct UpdateStatement {
    pub table: String,
    pub assignments: Vec<Assignment>,
    pub returning: Vec<SelectItem>,
}

#[derive(Debug, Clone)]
pub struct DeleteStatement {
    pub table: String,
    pub returning: Vec<SelectItem>,
}

pub fn lower_statement(stmt: &sp::Statement) -> Result<Statement> {
    match stmt {
        sp::Statement::Query(q) => Ok(Statement::Select(lower_query(q)?)),
        sp::Statement::Insert(insert) => Ok(Statement::Insert(lower_insert(insert)?)),
        sp::Statement::Update(update) => Ok(Statement::Update(lower_update(update)?)),
        sp::Statement::Delete(delete) => Ok(Statement::Delete(lower_delete(delete)?)),
        other => Err(Error::UnsupportedConstruct(format!(
            "statement kind {other:?} is not modeled"
        ))),
    }
}

fn lower_query(q: &sp::Query) -> Result<SelectStatement> {
    let mut ctes = Vec::new();
    if let Some(with) = &q.with {
        for cte in &with.cte_tables {
            let name = cte.alias.name.value.clone();
            let column_names = cte
                .alias
                .columns
                .iter()
                .map(|c| c.name.value.clone())
                .collect();
            let query = lower_query(&cte.query)?;
            ctes.push(WithQuery {
                name,
                column_names,
                query,
            });
        }
    }

    let body = lower_set_expr(&q.body)?;
    let limit = q.limit.as_ref().map(lower_expr).transpose()?;

    Ok(SelectStatement { ctes, body, limit })
}

fn lower_set_expr(set_expr: &sp::SetExpr) -> Result<SetExpr> {
    match set_expr {
        sp::SetExpr::Select(select) => Ok(SetExpr::Select(Box::new(lower_select(select)?))),
        sp::SetExpr::Query(q) => lower_set_expr(&q.body),
        sp::SetExpr::SetOperation { op, left, right, .. } => {
            let op = match op {
                sp::SetOperator::Union => SetOperator::Union,
                sp::SetOperator::Intersect => SetOperator::Intersect,
                sp::SetOperator::Except | sp::SetOperator::Minus => SetOperator::Except,
            };
            Ok(SetExpr::SetOperation {
                op,
                left: Box::new(lower_set_expr(left)?),
                right: Box::new(lower_set_expr(right)?),
            })
        }
        other => Err(Error::UnsupportedConstruct(format!(
            "set expression {other:?} is not modeled"
        ))),
    }
}

fn lower_select(select: &sp::Select) -> Result<SelectBody> {
    let projection = select
        .projection
        .iter()
        .map(lower_select_item)
        .collect::<Result<Vec<_>>>()?;

    let from = select
        .from
        .iter()
        .map(lower_table_with_joins)
        .collect::<Result<Vec<_>>>()?;

    let selection = select.selection.as_ref().map(lower_expr).transpose()?;

    Ok(SelectBody {
        projection,
        from,
        selection,
    })
}

fn lower_select_item(item: &sp::SelectItem) -> Result<SelectItem> {
    match item {
        sp::SelectItem::UnnamedExpr(e) => Ok(SelectItem::Expr(lower_expr(e)?)),
        sp::SelectItem::ExprWithAlias { expr, alias } => Ok(SelectItem::ExprWithAlias(
            lower_expr(expr)?,
            alias.value.clone(),
        )),
        sp::SelectItem::Wildcard(_) => Ok(SelectItem::Wildcard),
        sp::SelectItem::QualifiedWildcard(kind, _) => match kind {
            sp::SelectItemQualifiedWildcardKind::ObjectName(obj_name) => {
                let name = object_name_to_string(obj_name)
                    .ok_or_else(|| Error::InvalidQuery("Empty qualified wildcard".to_string()))?;
                Ok(SelectItem::QualifiedWildcard(name))
            }
            sp::SelectItemQualifiedWildcardKind::Expr(_) => Err(Error::UnsupportedConstruct(
                "expression wildcards are not modeled".to_string(),
            )),
        },
    }
}

fn lower_table_with_joins(twj: &sp::TableWithJoins) -> Result<TableExpression> {
    let mut acc = lower_table_factor(&twj.relation)?;
    for join in &twj.joins {
        let right = lower_table_factor(&join.relation)?;
        acc = match &join.join_operator {
            sp::JoinOperator::Inner(_) => TableExpression::QualifiedJoin {
                left: Box::new(acc),
                join_type: JoinType::Inner,
                right: Box::new(right),
            },
            sp::JoinOperator::LeftOuter(_)
            | sp::JoinOperator::Left(_)
            | sp::JoinOperator::LeftSemi(_)
            | sp::JoinOperator::LeftAnti(_) => TableExpression::QualifiedJoin {
                left: Box::new(acc),
                join_type: JoinType::Left,
                right: Box::new(right),
            },
            sp::JoinOperator::RightOuter(_)
            | sp::JoinOperator::Right(_)
            | sp::JoinOperator::RightSemi(_)
            | sp::JoinOperator::RightAnti(_) => TableExpression::QualifiedJoin {
                left: Box::new(acc),
                join_type: JoinType::Right,
                right: Box::new(right),
            },
            sp::JoinOperator::FullOuter(_) => TableExpression::QualifiedJoin {
                left: Box::new(acc),
                join_type: JoinType::Full,
                right: Box::new(right),
            },
            sp::JoinOperator::CrossJoin => TableExpression::CrossJoin {
                left: Box::new(acc),
                right: Box::new(right),
            },
            other => {
                return Err(Error::UnsupportedConstruct(format!(
                    "join operator {other:?} is not modeled"
                )))
            }
        };
    }
    Ok(acc)
}

fn lower_table_factor(factor: &sp::TableFactor) -> Result<TableExpression> {
    match factor {
        sp::TableFactor::Table { name, alias, .. } => {
            let name = name
                .0
                .last()
                .and_then(|part| part.as_ident())
                .map(|i| i.value.clone())
                .ok_or_else(|| Error::InvalidQuery("Empty table name".to_string()))?;
            let alias = alias.as_ref().map(|a| a.name.value.clone());
            Ok(TableExpression::Table { name, alias })
        }
        sp::TableFactor::Derived {
            subquery,
            alias: Some(a),
            ..
        } => Ok(TableExpression::SubQuery {
            query: Box::new(lower_query(subquery)?),
            alias: a.name.value.clone(),
        }),
        other => Err(Error::UnsupportedConstruct(format!(
            "table expression {other:?} is not modeled"
        ))),
    }
}

fn lower_expr(expr: &sp::Expr) -> Result<Expr> {
    use sp::Expr as E;

    Ok(match expr {
        E::Identifier(ident) => Expr::ColumnRef {
            column: ident.value.clone(),
        },
        E::CompoundIdentifier(idents) if idents.len() == 2 => Expr::TableColumnRef {
            table: idents[0].value.clone(),
            column: idents[1].value.clone(),
        },
        E::Nested(inner) => lower_expr(inner)?,
        E::Value(v) => match &v.value {
            sp::Value::Placeholder(p) => Expr::Parameter {
                index: parse_placeholder_index(p),
            },
            other => Expr::Constant {
                text: format!("{other}"),
            },
        },
        E::UnaryOp { op, expr: operand } => Expr::UnaryOp {
            op: match op {
                sp::UnaryOperator::Not => UnaryOperator::Not,
                sp::UnaryOperator::Plus => UnaryOperator::Plus,
                sp::UnaryOperator::Minus => UnaryOperator::Minus,
                other => {
                    return Err(Error::UnsupportedConstruct(format!(
                        "unary operator {other:?} is not modeled"
                    )))
                }
            },
            operand: Box::new(lower_expr(operand)?),
        },
        E::IsNull(inner) => Expr::UnaryOp {
            op: UnaryOperator::IsNull,
            operand: Box::new(lower_expr(inner)?),
        },
        E::IsNotNull(inner) => Expr::UnaryOp {
            op: UnaryOperator::IsNotNull,
            operand: Box::new(lower_expr(inner)?),
        },
        E::IsTrue(inner) => Expr::UnaryOp {
            op: UnaryOperator::IsTrue,
            operand: Box::new(lower_expr(inner)?),
        },
        E::IsFalse(inner) => Expr::UnaryOp {
            op: UnaryOperator::IsFalse,
            operand: Box::new(lower_expr(inner)?),
        },
        E::IsNotTrue(inner) => Expr::UnaryOp {
            op: UnaryOperator::IsNotTrue,
            operand: Box::new(lower_expr(inner)?),
        },
        E::IsNotFalse(inner) => Expr::UnaryOp {
            op: UnaryOperator::IsNotFalse,
            operand: Box::new(lower_expr(inner)?),
        },
        E::IsUnknown(inner) => Expr::UnaryOp {
            op: UnaryOperator::IsUnknown,
            operand: Box::new(lower_expr(inner)?),
        },
        E::IsNotUnknown(inner) => Expr::UnaryOp {
            op: UnaryOperator::IsNotUnknown,
            operand: Box::new(lower_expr(inner)?),
        },
        E::BinaryOp { left, op, right } => Expr::BinaryOp {
            op: lower_binary_operator(op),
            lhs: Box::new(lower_expr(left)?),
            rhs: Box::new(lower_expr(right)?),
        },
        E::Function(func) => {
            let name = func
                .name
                .0
                .last()
                .and_then(|part| part.as_ident())
                .map(|i| i.value.to_lowercase())
                .unwrap_or_default();
            // `ARRAY(SELECT ...)` parses as a call to a function named
            // `ARRAY` whose argument list is a bare subquery, not a
            // normal expression list — the Postgres array constructor,
            // distinct from the `ARRAY[1, 2]` literal and from a plain
            // scalar subquery.
            if name == "array" {
                if let sp::FunctionArguments::Subquery(q) = &func.args {
                    return Ok(Expr::ArraySubQuery {
                        subquery: Box::new(lower_query(q)?),
                    });
                }
            }
            let args = lower_function_args(&func.args)?;
            Expr::FunctionCall { name, args }
        }
        E::Exists { subquery, .. } => Expr::ExistsOp {
            subquery: Box::new(lower_query(subquery)?),
        },
        E::InSubquery {
            expr, subquery, ..
        } => Expr::InOp {
            lhs: Box::new(lower_expr(expr)?),
            subquery: Box::new(lower_query(subquery)?),
        },
        // A bare, parenthesized scalar subquery. Its nullability depends on
        // whether it can return zero rows, which the closed sum doesn't
        // track; fall back to the conservative nullable default.
        E::Subquery(_) => Expr::Unsupported("scalar subquery".to_string()),
        E::Cast {
            expr, data_type, ..
        } => Expr::TypeCast {
            lhs: Box::new(lower_expr(expr)?),
            target_type: format!("{data_type}"),
        },
        other => Expr::Unsupported(format!("{other:?}")),
    })
}

fn lower_binary_operator(op: &sp::BinaryOperator) -> BinaryOperator {
    use sp::BinaryOperator as B;
    match op {
        B::Plus | B::Minus | B::Multiply | B::Divide | B::Modulo => BinaryOperator::Arithmetic,
        B::Eq | B::NotEq | B::Lt | B::LtEq | B::Gt | B::GtEq => BinaryOperator::Comparison,
        B::StringConcat => BinaryOperator::Concat,
        B::And => BinaryOperator::And,
        B::Or => BinaryOperator::Or,
        B::PGLikeMatch | B::PGNotLikeMatch | B::PGILikeMatch | B::PGNotILikeMatch => {
            BinaryOperator::Like
        }
        other => BinaryOperator::Custom(format!("{other:?}")),
    }
}

fn lower_function_args(args: &sp::FunctionArguments) -> Result<Vec<Expr>> {
    match args {
        sp::FunctionArguments::List(list) => list
            .args
            .iter()
            .filter_map(|a| match a {
                sp::FunctionArg::Unnamed(sp::FunctionArgExpr::Expr(e)) => Some(lower_expr(e)),
                sp::FunctionArg::Named {
                    arg: sp::FunctionArgExpr::Expr(e),
                    ..
                } => Some(lower_expr(e)),
                _ => None,
            })
            .collect(),
        _ => Ok(vec![]),
    }
}

fn parse_placeholder_index(p: &str) -> usize {
    p.trim_start_matches('$').parse().unwrap_or(0)
}

fn object_name_to_string(name: &sp::ObjectName) -> Option<String> {
    name.0
        .first()
        .and_then(|part| part.as_ident())
        .map(|i| i.value.clone())
}

fn lower_insert(insert: &sp::Insert) -> Result<InsertStatement> {
    let table = insert.table.to_string();
    let columns = insert.columns.iter().map(|c| c.value.clone()).collect();

    let mut rows = Vec::new();
    let mut select = None;
    let mut has_default_values = false;

    match insert.source.as_deref() {
        None => has_default_values = true,
        Some(sp::Query { body, .. }) => match body.as_ref() {
            sp::SetExpr::Values(values) => {
                for row in &values.rows {
                    rows.push(row.iter().map(lower_expr).collect::<Result<Vec<_>>>()?);
                }
            }
            _ => {
                select = Some(Box::new(lower_query(insert.source.as_ref().unwrap())?));
            }
        },
    }

    let returning = insert
        .returning
        .as_ref()
        .map(|items| items.iter().map(lower_select_item).collect::<Result<Vec<_>>>())
        .transpose()?
        .unwrap_or_default();

    Ok(InsertStatement {
        table,
        columns,
        rows,
        has_default_values,
        select,
        returning,
    })
}

fn lower_update(update: &sp::Update) -> Result<UpdateStatement> {
    let table = match &update.table.relation {
        sp::TableFactor::Table { name, .. } => name
            .0
            .last()
            .and_then(|part| part.as_ident())
            .map(|i| i.value.clone())
            .ok_or_else(|| Error::InvalidQuery("Empty table name".to_string()))?,
        other => {
            return Err(Error::UnsupportedConstruct(format!(
                "UPDATE target {other:?} is not modeled"
            )))
        }
    };

    let assignments = update
        .assignments
        .iter()
        .map(|a| {
            Ok(Assignment {
                columns: assignment_target_columns(&a.target)?,
                value: lower_expr(&a.value)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    let returning = update
        .returning
        .as_ref()
        .map(|items| items.iter().map(lower_select_item).collect::<Result<Vec<_>>>())
        .transpose()?
        .unwrap_or_default();

    Ok(UpdateStatement {
        table,
        assignments,
        returning,
    })
}

fn assignment_target_columns(target: &sp::AssignmentTarget) -> Result<Vec<String>> {
    match target {
        sp::AssignmentTarget::ColumnName(obj_name) => {
            let col = obj_name
                .0
                .last()
                .and_then(|part| part.as_ident())
                .map(|i| i.value.clone())
                .ok_or_else(|| Error::InvalidQuery("Empty column name in assignment".to_string()))?;
            Ok(vec![col])
        }
        sp::AssignmentTarget::Tuple(names) => names
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

fn lower_delete(delete: &sp::Delete) -> Result<DeleteStatement> {
    let tables = match &delete.from {
        sp::FromTable::WithFromKeyword(t) | sp::FromTable::WithoutKeyword(t) => t,
    };
    let first = tables
        .first()
        .ok_or_else(|| Error::InvalidQuery("DELETE requires at least one table".to_string()))?;
    let table = match &first.relation {
        sp::TableFactor::Table { name, .. } => name
            .0
            .last()
            .and_then(|part| part.as_ident())
            .map(|i| i.value.clone())
            .ok_or_else(|| Error::InvalidQuery("Empty table name".to_string()))?,
        other => {
            return Err(Error::UnsupportedConstruct(format!(
                "DELETE target {other:?} is not modeled"
            )))
        }
    };

    let returning = delete
        .returning
        .as_ref()
        .map(|items| items.iter().map(lower_select_item).collect::<Result<Vec<_>>>())
        .transpose()?
        .unwrap_or_default();

    Ok(DeleteStatement { table, returning })
}
