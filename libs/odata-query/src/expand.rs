//! `$expand` clauses and their nested query options.

use crate::ast::FilterExpr;
use crate::OrderBy;

/// One `$expand` clause: a child entity plus the query options applied to
/// the expanded rows.
///
/// Rendered as `Field($select=...; $filter=...)` with options joined by
/// `"; "`. A clause with no options renders as the bare field name, and a
/// join key turns the head into `Field.JoinColumn(...)`.
#[derive(Clone, Debug, PartialEq)]
pub struct Expand {
    pub field: String,
    pub select: Vec<String>,
    pub filter: Option<FilterExpr>,
    pub order_by: Option<OrderBy>,
    pub top: Option<u64>,
    pub skip: Option<u64>,
    pub join_key: Option<String>,
}

impl Expand {
    pub fn new(field: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            select: Vec::new(),
            filter: None,
            order_by: None,
            top: None,
            skip: None,
            join_key: None,
        }
    }

    #[must_use]
    pub fn select<S>(mut self, fields: impl IntoIterator<Item = S>) -> Self
    where
        S: Into<String>,
    {
        self.select = fields.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn filter(mut self, expr: FilterExpr) -> Self {
        self.filter = Some(expr);
        self
    }

    #[must_use]
    pub fn order_by(mut self, clause: OrderBy) -> Self {
        self.order_by = Some(clause);
        self
    }

    #[must_use]
    pub fn top(mut self, top: u64) -> Self {
        self.top = Some(top);
        self
    }

    #[must_use]
    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = Some(skip);
        self
    }

    /// Expand through an explicit join column instead of the default
    /// parent/child linkage.
    #[must_use]
    pub fn join_key(mut self, column: impl Into<String>) -> Self {
        self.join_key = Some(column.into());
        self
    }
}
