//! Client-side construction of iDempiere REST query strings.
//!
//! `$filter` expressions are modeled as a small AST and rendered to the exact
//! wire form the server expects; the remaining query options (`$orderby`,
//! `$top`, `$skip`, `$select`, `$expand` and the iDempiere extensions) are
//! collected by [`QueryBuilder`] and emitted as ordered [`QueryParams`].

pub mod builder;
pub mod expand;
pub mod params;
pub mod serialize;

pub use builder::QueryBuilder;
pub use expand::Expand;
pub use params::QueryParams;

pub mod ast {
    use bigdecimal::BigDecimal;
    use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};

    use crate::Error;

    /// A `$filter` expression tree.
    #[derive(Clone, Debug, PartialEq)]
    pub enum FilterExpr {
        /// Infix comparison: `Name eq 'John'`.
        Logical {
            field: String,
            op: CompareOp,
            value: Scalar,
        },
        /// String-method call: `contains(Name,'John')`.
        Method {
            op: MethodOp,
            field: String,
            value: Scalar,
        },
        /// Membership test: `Status in ('Active','Pending')`.
        In { field: String, values: Vec<Scalar> },
        /// Two subtrees joined with `AND` / `OR`.
        Compound {
            op: LogicOp,
            left: Box<FilterExpr>,
            right: Box<FilterExpr>,
        },
        /// Prefix negation: `NOT expr`.
        Not(Box<FilterExpr>),
    }

    impl FilterExpr {
        /// Combine two expressions with AND.
        #[must_use]
        pub fn and(self, other: FilterExpr) -> FilterExpr {
            FilterExpr::Compound {
                op: LogicOp::And,
                left: Box::new(self),
                right: Box::new(other),
            }
        }

        /// Combine two expressions with OR.
        #[must_use]
        pub fn or(self, other: FilterExpr) -> FilterExpr {
            FilterExpr::Compound {
                op: LogicOp::Or,
                left: Box::new(self),
                right: Box::new(other),
            }
        }

        /// Negate an expression.
        #[must_use]
        #[allow(clippy::should_implement_trait)]
        pub fn not(self) -> FilterExpr {
            !self
        }
    }

    impl std::ops::Not for FilterExpr {
        type Output = FilterExpr;

        fn not(self) -> Self::Output {
            FilterExpr::Not(Box::new(self))
        }
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum CompareOp {
        Eq,
        Neq,
        Gt,
        Ge,
        Lt,
        Le,
    }

    impl CompareOp {
        /// Wire keyword. Note the server spells inequality `neq`, not `ne`.
        #[must_use]
        pub fn as_str(self) -> &'static str {
            match self {
                CompareOp::Eq => "eq",
                CompareOp::Neq => "neq",
                CompareOp::Gt => "gt",
                CompareOp::Ge => "ge",
                CompareOp::Lt => "lt",
                CompareOp::Le => "le",
            }
        }
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum MethodOp {
        Contains,
        StartsWith,
        EndsWith,
    }

    impl MethodOp {
        #[must_use]
        pub fn as_str(self) -> &'static str {
            match self {
                MethodOp::Contains => "contains",
                MethodOp::StartsWith => "startswith",
                MethodOp::EndsWith => "endswith",
            }
        }
    }

    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub enum LogicOp {
        And,
        Or,
    }

    impl LogicOp {
        /// Uppercase connective placed between serialized subtrees.
        #[must_use]
        pub fn as_str(self) -> &'static str {
            match self {
                LogicOp::And => "AND",
                LogicOp::Or => "OR",
            }
        }
    }

    /// A literal operand. The variant decides quoting on the wire: strings
    /// are single-quoted, numbers and booleans stay bare.
    #[derive(Clone, Debug, PartialEq)]
    pub enum Scalar {
        String(String),
        Number(BigDecimal),
        Bool(bool),
    }

    impl From<&str> for Scalar {
        fn from(v: &str) -> Self {
            Scalar::String(v.to_owned())
        }
    }

    impl From<String> for Scalar {
        fn from(v: String) -> Self {
            Scalar::String(v)
        }
    }

    impl From<bool> for Scalar {
        fn from(v: bool) -> Self {
            Scalar::Bool(v)
        }
    }

    impl From<i32> for Scalar {
        fn from(v: i32) -> Self {
            Scalar::Number(BigDecimal::from(v))
        }
    }

    impl From<i64> for Scalar {
        fn from(v: i64) -> Self {
            Scalar::Number(BigDecimal::from(v))
        }
    }

    impl From<u32> for Scalar {
        fn from(v: u32) -> Self {
            Scalar::Number(BigDecimal::from(v))
        }
    }

    impl From<u64> for Scalar {
        fn from(v: u64) -> Self {
            Scalar::Number(BigDecimal::from(v))
        }
    }

    impl From<BigDecimal> for Scalar {
        fn from(v: BigDecimal) -> Self {
            Scalar::Number(v)
        }
    }

    /// Dates travel as quoted `YYYY-MM-DD` literals.
    impl From<NaiveDate> for Scalar {
        fn from(v: NaiveDate) -> Self {
            Scalar::String(v.format("%Y-%m-%d").to_string())
        }
    }

    /// Timestamps travel as quoted RFC 3339 literals in UTC.
    impl From<DateTime<Utc>> for Scalar {
        fn from(v: DateTime<Utc>) -> Self {
            Scalar::String(v.to_rfc3339_opts(SecondsFormat::Secs, true))
        }
    }

    /// Build a comparison leaf: `filter("Name", CompareOp::Eq, "John")`.
    pub fn filter(
        field: impl Into<String>,
        op: CompareOp,
        value: impl Into<Scalar>,
    ) -> FilterExpr {
        FilterExpr::Logical {
            field: field.into(),
            op,
            value: value.into(),
        }
    }

    /// Build a string-method leaf rendered as `op(field,value)`.
    pub fn method_filter(
        op: MethodOp,
        field: impl Into<String>,
        value: impl Into<Scalar>,
    ) -> FilterExpr {
        FilterExpr::Method {
            op,
            field: field.into(),
            value: value.into(),
        }
    }

    /// Build a membership leaf rendered as `field in (v1,v2,...)`.
    pub fn in_filter<V>(field: impl Into<String>, values: impl IntoIterator<Item = V>) -> FilterExpr
    where
        V: Into<Scalar>,
    {
        FilterExpr::In {
            field: field.into(),
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Left-fold expressions into a chain of ANDs.
    ///
    /// A single expression comes back unchanged.
    ///
    /// # Errors
    /// Returns `Error::InvalidArgument` when `exprs` is empty.
    pub fn and(exprs: impl IntoIterator<Item = FilterExpr>) -> Result<FilterExpr, Error> {
        combine(LogicOp::And, exprs)
    }

    /// Left-fold expressions into a chain of ORs. See [`and`].
    ///
    /// # Errors
    /// Returns `Error::InvalidArgument` when `exprs` is empty.
    pub fn or(exprs: impl IntoIterator<Item = FilterExpr>) -> Result<FilterExpr, Error> {
        combine(LogicOp::Or, exprs)
    }

    /// Negate an expression. The serializer never parenthesizes the operand.
    #[must_use]
    pub fn not(expr: FilterExpr) -> FilterExpr {
        !expr
    }

    fn combine(
        op: LogicOp,
        exprs: impl IntoIterator<Item = FilterExpr>,
    ) -> Result<FilterExpr, Error> {
        let mut iter = exprs.into_iter();
        let first = iter
            .next()
            .ok_or_else(|| Error::InvalidArgument("expected at least one expression".into()))?;
        Ok(iter.fold(first, |acc, next| FilterExpr::Compound {
            op,
            left: Box::new(acc),
            right: Box::new(next),
        }))
    }
}

// Ordering primitives
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum SortDir {
    #[serde(rename = "asc")]
    Asc,
    #[serde(rename = "desc")]
    Desc,
}

impl SortDir {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SortDir::Asc => "asc",
            SortDir::Desc => "desc",
        }
    }
}

/// One `$orderby` key, rendered as `field dir`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OrderBy {
    pub field: String,
    pub dir: SortDir,
}

impl OrderBy {
    pub fn new(field: impl Into<String>, dir: SortDir) -> Self {
        Self {
            field: field.into(),
            dir,
        }
    }

    pub fn asc(field: impl Into<String>) -> Self {
        Self::new(field, SortDir::Asc)
    }

    pub fn desc(field: impl Into<String>) -> Self {
        Self::new(field, SortDir::Desc)
    }
}

impl std::fmt::Display for OrderBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.field, self.dir.as_str())
    }
}

/// `showsql` flavor: `Enabled` returns records plus the generated SQL,
/// `NoData` skips record retrieval and returns the SQL alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShowSql {
    Enabled,
    NoData,
}

/// `showlabel` scope: every label column, or only the named ones.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ShowLabel {
    All,
    Columns(Vec<String>),
}

/// Errors raised while assembling query expressions.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

/// Snapshot of every query option the builder accumulates.
///
/// `to_params` in [`serialize`] turns a config into the ordered wire
/// parameters. All fields are public, so callers that outgrow the fluent
/// chain can fill one in directly and lift it back with
/// `QueryBuilder::from`.
#[derive(Clone, Debug, Default, PartialEq)]
#[must_use]
pub struct QueryConfig {
    pub filter: Option<ast::FilterExpr>,
    pub order: Vec<OrderBy>,
    pub top: Option<u64>,
    pub skip: Option<u64>,
    pub select: Vec<String>,
    pub expand: Vec<Expand>,
    pub val_rule: Option<u32>,
    pub context: Vec<(String, String)>,
    pub show_sql: Option<ShowSql>,
    pub label: Option<String>,
    pub show_label: Option<ShowLabel>,
}

impl QueryConfig {
    pub fn new() -> Self {
        Self::default()
    }
}
