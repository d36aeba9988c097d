//! Expression traversal over the [`crate::ast`] model.
//!
//! `ExprVisitor` is an exhaustive dispatcher (`walk_expr` matches every
//! `Expr` variant, so adding a new one is a compile error until every
//! visitor is updated); `visit_*` methods default to a no-op, which gives
//! the "walk everything, override only what you care about" shape a caller
//! needs for a narrow scan (e.g. [`collect_parameters`] only cares about
//! `Parameter` nodes and ignores the rest of the tree).

use crate::ast::{BinaryOperator, Expr, SelectStatement, UnaryOperator};

#[allow(unused_variables)]
pub trait ExprVisitor {
    fn visit_column_ref(&mut self, column: &str) {}
    fn visit_table_column_ref(&mut self, table: &str, column: &str) {}
    fn visit_constant(&mut self, text: &str) {}
    fn visit_parameter(&mut self, index: usize) {}
    fn visit_unary_op(&mut self, op: UnaryOperator, operand: &Expr) {}
    fn visit_binary_op(&mut self, op: &BinaryOperator, lhs: &Expr, rhs: &Expr) {}
    fn visit_function_call(&mut self, name: &str, args: &[Expr]) {}
    fn visit_exists(&mut self, subquery: &SelectStatement) {}
    fn visit_in(&mut self, subquery: &SelectStatement) {}
    fn visit_array_subquery(&mut self, subquery: &SelectStatement) {}
    fn visit_type_cast(&mut self, target_type: &str) {}
    fn visit_unsupported(&mut self, description: &str) {}
}

/// Walk `expr`, invoking the matching `visit_*` callback at every node and
/// recursing into children. Exhaustive over [`Expr`] by construction.
pub fn walk_expr<V: ExprVisitor + ?Sized>(expr: &Expr, visitor: &mut V) {
    match expr {
        Expr::ColumnRef { column } => visitor.visit_column_ref(column),
        Expr::TableColumnRef { table, column } => visitor.visit_table_column_ref(table, column),
        Expr::Constant { text } => visitor.visit_constant(text),
        Expr::Parameter { index } => visitor.visit_parameter(*index),
        Expr::UnaryOp { op, operand } => {
            visitor.visit_unary_op(*op, operand);
            walk_expr(operand, visitor);
        }
        Expr::BinaryOp { op, lhs, rhs } => {
            visitor.visit_binary_op(op, lhs, rhs);
            walk_expr(lhs, visitor);
            walk_expr(rhs, visitor);
        }
        Expr::FunctionCall { name, args } => {
            visitor.visit_function_call(name, args);
            for arg in args {
                walk_expr(arg, visitor);
            }
        }
        Expr::ExistsOp { subquery } => visitor.visit_exists(subquery),
        Expr::InOp { lhs, subquery } => {
            walk_expr(lhs, visitor);
            visitor.visit_in(subquery);
        }
        Expr::ArraySubQuery { subquery } => visitor.visit_array_subquery(subquery),
        Expr::TypeCast { lhs, target_type } => {
            visitor.visit_type_cast(target_type);
            walk_expr(lhs, visitor);
        }
        Expr::Unsupported(description) => visitor.visit_unsupported(description),
    }
}

/// Every `$N` placeholder reachable from `expr`, in the order encountered.
/// Built on [`ExprVisitor`] as the "override one callback" case the trait
/// exists for.
pub fn collect_parameters(expr: &Expr) -> Vec<usize> {
    struct Collector(Vec<usize>);
    impl ExprVisitor for Collector {
        fn visit_parameter(&mut self, index: usize) {
            self.0.push(index);
        }
    }
    let mut collector = Collector(Vec::new());
    walk_expr(expr, &mut collector);
    collector.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::BinaryOperator;

    #[test]
    fn collects_parameters_from_nested_binary_op() {
        let expr = Expr::BinaryOp {
            op: BinaryOperator::And,
            lhs: Box::new(Expr::BinaryOp {
                op: BinaryOperator::Comparison,
                lhs: Box::new(Expr::ColumnRef {
                    column: "id".to_string(),
                }),
                rhs: Box::new(Expr::Parameter { index: 1 }),
            }),
            rhs: Box::new(Expr::Parameter { index: 2 }),
        };

        assert_eq!(collect_parameters(&expr), vec![1, 2]);
    }
}
