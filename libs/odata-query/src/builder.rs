//! Fluent query builder
//!
//! Accumulates filter, ordering, paging, projection and the iDempiere
//! extension options (`$valrule`, `$context`, `showsql`, `label`,
//! `showlabel`) and emits them as ordered wire parameters.
//!
//! # Example
//!
//! ```rust,ignore
//! use odata_query::ast::{self, CompareOp, MethodOp};
//! use odata_query::{QueryBuilder, SortDir};
//!
//! let params = QueryBuilder::new()
//!     .filter(ast::filter("IsActive", CompareOp::Eq, true))
//!     .and(ast::method_filter(MethodOp::Contains, "Name", "Smith"))
//!     .order_by("Created", SortDir::Desc)
//!     .top(50)
//!     .select(["Name", "Value"])
//!     .build();
//!
//! assert_eq!(
//!     params.get("$filter"),
//!     Some("IsActive eq true AND contains(Name,'Smith')"),
//! );
//! ```

use crate::ast::FilterExpr;
use crate::{Expand, OrderBy, QueryConfig, QueryParams, ShowLabel, ShowSql, SortDir};

/// Fluent builder for entity list queries.
///
/// Filter-combining methods fold progressively: the first expression becomes
/// the tree as-is, later ones attach with the connective of the method used.
/// `build` borrows, so one builder can emit parameters for several pages in
/// a row.
#[derive(Clone, Debug, Default)]
#[must_use]
pub struct QueryBuilder {
    config: QueryConfig,
}

impl QueryBuilder {
    /// Create a new empty query builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the filter expression; a later call ANDs the new expression into
    /// the existing tree.
    pub fn filter(self, expr: FilterExpr) -> Self {
        self.and(expr)
    }

    /// AND an expression into the current filter. Without a current filter
    /// this behaves like [`filter`](Self::filter).
    pub fn and(mut self, expr: FilterExpr) -> Self {
        self.config.filter = Some(match self.config.filter.take() {
            Some(current) => current.and(expr),
            None => expr,
        });
        self
    }

    /// OR an expression into the current filter.
    pub fn or(mut self, expr: FilterExpr) -> Self {
        self.config.filter = Some(match self.config.filter.take() {
            Some(current) => current.or(expr),
            None => expr,
        });
        self
    }

    /// Negate the whole filter built so far. Does nothing when no filter is
    /// set.
    #[allow(clippy::should_implement_trait)]
    pub fn not(mut self) -> Self {
        if let Some(current) = self.config.filter.take() {
            self.config.filter = Some(!current);
        }
        self
    }

    /// Sort by a single field, replacing any previous ordering.
    pub fn order_by(mut self, field: impl Into<String>, dir: SortDir) -> Self {
        self.config.order = vec![OrderBy::new(field, dir)];
        self
    }

    /// Sort by several keys at once, replacing any previous ordering.
    pub fn order_by_multiple(mut self, clauses: impl IntoIterator<Item = OrderBy>) -> Self {
        self.config.order = clauses.into_iter().collect();
        self
    }

    pub fn top(mut self, top: u64) -> Self {
        self.config.top = Some(top);
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.config.skip = Some(skip);
        self
    }

    /// Position on a 1-based page: sets `$skip = (page - 1) * page_size` and
    /// `$top = page_size`.
    pub fn paginate(mut self, page: u64, page_size: u64) -> Self {
        self.config.skip = Some(page.saturating_sub(1).saturating_mul(page_size));
        self.config.top = Some(page_size);
        self
    }

    /// Project the listed columns, replacing any previous `$select`.
    pub fn select<S>(mut self, fields: impl IntoIterator<Item = S>) -> Self
    where
        S: Into<String>,
    {
        self.config.select = fields.into_iter().map(Into::into).collect();
        self
    }

    /// Expand the listed child entities, replacing any previous `$expand`.
    pub fn expand(mut self, clauses: impl IntoIterator<Item = Expand>) -> Self {
        self.config.expand = clauses.into_iter().collect();
        self
    }

    /// Restrict rows through a validation rule id (`$valrule`).
    pub fn with_val_rule(mut self, id: u32) -> Self {
        self.config.val_rule = Some(id);
        self
    }

    /// Add one `$context` entry. Repeated calls accumulate in insertion
    /// order and render as `key:value,key2:value2`.
    pub fn with_context(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.config.context.push((key.into(), value.to_string()));
        self
    }

    /// Ask the server to echo the generated SQL. `with_show_sql(false)`
    /// still returns records; `with_show_sql(true)` sends `nodata` so only
    /// the SQL comes back.
    pub fn with_show_sql(mut self, nodata: bool) -> Self {
        self.config.show_sql = Some(if nodata {
            ShowSql::NoData
        } else {
            ShowSql::Enabled
        });
        self
    }

    pub fn with_label(mut self, text: impl Into<String>) -> Self {
        self.config.label = Some(text.into());
        self
    }

    /// Request label columns for every labeled field (`showlabel=true`).
    pub fn with_show_label(mut self) -> Self {
        self.config.show_label = Some(ShowLabel::All);
        self
    }

    /// Request label columns for the named fields only.
    pub fn with_show_label_columns<S>(mut self, columns: impl IntoIterator<Item = S>) -> Self
    where
        S: Into<String>,
    {
        self.config.show_label =
            Some(ShowLabel::Columns(columns.into_iter().map(Into::into).collect()));
        self
    }

    /// Emit the ordered wire parameters for the accumulated state.
    #[must_use]
    pub fn build(&self) -> QueryParams {
        self.config.to_params()
    }

    /// Emit a percent-encoded query string for the accumulated state.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        self.config.to_query_string()
    }

    /// Clear all accumulated state in place.
    pub fn reset(&mut self) {
        self.config = QueryConfig::default();
    }

    #[must_use]
    pub fn config(&self) -> &QueryConfig {
        &self.config
    }

    #[must_use]
    pub fn into_config(self) -> QueryConfig {
        self.config
    }
}

impl From<QueryConfig> for QueryBuilder {
    fn from(config: QueryConfig) -> Self {
        Self { config }
    }
}
