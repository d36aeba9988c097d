//! The column-resolution scope built up while walking a statement's `FROM`
//! clause, plus the small value types ([`FieldNullability`], [`VirtualField`],
//! [`VirtualTable`], [`SourceColumn`]) that the nullability pass threads
//! through it.

use crate::error::{Error, Result};
use crate::schema::Table;
use crate::types::PostgresType;

/// The nullability of a single projected/source value. Scalars carry one bit;
/// arrays carry two, since `int[]` being itself non-null says nothing about
/// whether its elements can be NULL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldNullability {
    Scalar { nullable: bool },
    Array { nullable: bool, elem_nullable: bool },
}

impl FieldNullability {
    pub fn nullable(&self) -> bool {
        match self {
            FieldNullability::Scalar { nullable } => *nullable,
            FieldNullability::Array { nullable, .. } => *nullable,
        }
    }

    /// Applied when a JOIN or WHERE-refinement forces the outer nullability
    /// without changing anything known about array elements.
    pub fn with_nullable(self, nullable: bool) -> Self {
        match self {
            FieldNullability::Scalar { .. } => FieldNullability::Scalar { nullable },
            FieldNullability::Array { elem_nullable, .. } => FieldNullability::Array {
                nullable,
                elem_nullable,
            },
        }
    }

    /// OR across set-operation arms: nullable if either arm says nullable.
    /// Falls back to the less precise `Scalar` shape on a Scalar/Array
    /// mismatch, which should not occur for a well-typed `UNION`.
    pub fn or(self, other: Self) -> Self {
        match (self, other) {
            (
                FieldNullability::Scalar { nullable: a },
                FieldNullability::Scalar { nullable: b },
            ) => FieldNullability::Scalar { nullable: a || b },
            (
                FieldNullability::Array {
                    nullable: a,
                    elem_nullable: ea,
                },
                FieldNullability::Array {
                    nullable: b,
                    elem_nullable: eb,
                },
            ) => FieldNullability::Array {
                nullable: a || b,
                elem_nullable: ea || eb,
            },
            (a, b) => FieldNullability::Scalar {
                nullable: a.nullable() || b.nullable(),
            },
        }
    }
}

/// A named, nullability-tagged output column — what a SELECT list (or a
/// CTE's own output) produces.
#[derive(Debug, Clone)]
pub struct VirtualField {
    pub name: String,
    pub nullability: FieldNullability,
}

/// A CTE or derived-table's result shape, once it has itself been inferred.
#[derive(Debug, Clone)]
pub struct VirtualTable {
    pub name: String,
    pub columns: Vec<VirtualField>,
}

/// One column visible under a given FROM-clause alias: either straight from
/// the schema or from a [`VirtualTable`] (CTE / subquery).
#[derive(Debug, Clone)]
pub struct SourceColumn {
    pub table_alias: String,
    pub column_name: String,
    pub nullability: FieldNullability,
    /// System columns that `SELECT *`/`table.*` never expand into.
    pub hidden: bool,
}

/// All columns visible at a point in a `FROM` clause, built up left-to-right
/// as joins are resolved.
#[derive(Debug, Default, Clone)]
pub struct Scope {
    pub sources: Vec<SourceColumn>,
}

impl Scope {
    pub fn push_table(&mut self, alias: &str, table: &Table) {
        for col in &table.columns {
            // DDL never pins down element-level NOT NULL for arrays, so an array
            // column's elements are conservatively nullable until WHERE-refined.
            let nullability = match &col.data_type {
                PostgresType::Array(_) => FieldNullability::Array {
                    nullable: col.nullable,
                    elem_nullable: true,
                },
                _ => FieldNullability::Scalar {
                    nullable: col.nullable,
                },
            };
            self.sources.push(SourceColumn {
                table_alias: alias.to_string(),
                column_name: col.name.clone(),
                nullability,
                hidden: col.hidden,
            });
        }
    }

    pub fn push_virtual_table(&mut self, alias: &str, table: &VirtualTable) {
        for field in &table.columns {
            self.sources.push(SourceColumn {
                table_alias: alias.to_string(),
                column_name: field.name.clone(),
                nullability: field.nullability,
                hidden: false,
            });
        }
    }

    /// Force every column carried under `alias` to be nullable (the outer side
    /// of a LEFT/RIGHT/FULL join).
    pub fn mark_nullable(&mut self, alias: &str) {
        for source in self
            .sources
            .iter_mut()
            .filter(|s| s.table_alias.eq_ignore_ascii_case(alias))
        {
            source.nullability = source.nullability.with_nullable(true);
        }
    }

    pub fn resolve_unqualified(&self, column: &str) -> Result<&SourceColumn> {
        let mut matches = self
            .sources
            .iter()
            .filter(|s| s.column_name.eq_ignore_ascii_case(column));
        let first = matches.next().ok_or_else(|| Error::UnknownColumn {
            table: "<unknown>".to_string(),
            column: column.to_string(),
        })?;
        if matches.next().is_some() {
            return Err(Error::AmbiguousColumn(column.to_string()));
        }
        Ok(first)
    }

    pub fn resolve_qualified(&self, table_alias: &str, column: &str) -> Result<&SourceColumn> {
        self.sources
            .iter()
            .find(|s| {
                s.table_alias.eq_ignore_ascii_case(table_alias)
                    && s.column_name.eq_ignore_ascii_case(column)
            })
            .ok_or_else(|| Error::UnknownColumn {
                table: table_alias.to_string(),
                column: column.to_string(),
            })
    }

    /// Non-hidden columns carried under `alias`, in FROM order — what `table.*`
    /// expands to.
    pub fn columns_for_alias(&self, alias: &str) -> Vec<&SourceColumn> {
        self.sources
            .iter()
            .filter(|s| s.table_alias.eq_ignore_ascii_case(alias) && !s.hidden)
            .collect()
    }

    /// Every non-hidden column in FROM order — what a bare `*` expands to.
    pub fn all_columns(&self) -> Vec<&SourceColumn> {
        self.sources.iter().filter(|s| !s.hidden).collect()
    }
}
