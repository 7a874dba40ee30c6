//! Rendering of expression trees and query configurations to wire form.
//!
//! Serialization is total: any tree the constructors can produce renders to
//! a string. Parenthesization is structural and minimal; only compound
//! children are grouped, so leaves and `NOT` nodes keep their flat form.

use crate::ast::{FilterExpr, Scalar};
use crate::{Expand, OrderBy, QueryConfig, QueryParams, ShowLabel, ShowSql};

/// Render a filter tree to the `$filter` wire form.
#[must_use]
pub fn render_filter(expr: &FilterExpr) -> String {
    match expr {
        FilterExpr::Logical { field, op, value } => {
            format!("{} {} {}", field, op.as_str(), render_scalar(value))
        }
        FilterExpr::Method { op, field, value } => {
            format!("{}({},{})", op.as_str(), field, render_scalar(value))
        }
        FilterExpr::In { field, values } => {
            let list = values
                .iter()
                .map(render_scalar)
                .collect::<Vec<_>>()
                .join(",");
            format!("{field} in ({list})")
        }
        FilterExpr::Compound { op, left, right } => {
            format!("{} {} {}", group(left), op.as_str(), group(right))
        }
        FilterExpr::Not(inner) => format!("NOT {}", render_filter(inner)),
    }
}

/// Parenthesize compound children only.
fn group(expr: &FilterExpr) -> String {
    let rendered = render_filter(expr);
    if matches!(expr, FilterExpr::Compound { .. }) {
        format!("({rendered})")
    } else {
        rendered
    }
}

/// Render a literal operand.
///
/// Strings are single-quoted; embedded quotes pass through unescaped, so a
/// value containing `'` produces a malformed literal. Numbers render as
/// plain normalized decimals (never scientific notation, which `Display`
/// switches to for extreme magnitudes) and booleans stay bare lowercase.
#[must_use]
pub fn render_scalar(value: &Scalar) -> String {
    match value {
        Scalar::String(s) => format!("'{s}'"),
        Scalar::Number(n) => n.normalized().to_plain_string(),
        Scalar::Bool(b) => b.to_string(),
    }
}

#[must_use]
pub fn render_order(clauses: &[OrderBy]) -> String {
    clauses
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

/// Render one `$expand` clause.
#[must_use]
pub fn render_expand(clause: &Expand) -> String {
    let mut opts = Vec::new();
    if !clause.select.is_empty() {
        opts.push(format!("$select={}", clause.select.join(",")));
    }
    if let Some(f) = &clause.filter {
        opts.push(format!("$filter={}", render_filter(f)));
    }
    if let Some(o) = &clause.order_by {
        opts.push(format!("$orderby={o}"));
    }
    if let Some(t) = clause.top {
        opts.push(format!("$top={t}"));
    }
    if let Some(s) = clause.skip {
        opts.push(format!("$skip={s}"));
    }
    let head = match &clause.join_key {
        Some(k) => format!("{}.{}", clause.field, k),
        None => clause.field.clone(),
    };
    if opts.is_empty() {
        head
    } else {
        format!("{}({})", head, opts.join("; "))
    }
}

impl QueryConfig {
    /// Emit the ordered wire parameters for this configuration.
    ///
    /// Only options that were set produce a pair; an empty configuration
    /// yields no parameters at all.
    #[must_use]
    pub fn to_params(&self) -> QueryParams {
        let mut params = QueryParams::new();
        if let Some(filter) = &self.filter {
            params.append("$filter", render_filter(filter));
        }
        if !self.order.is_empty() {
            params.append("$orderby", render_order(&self.order));
        }
        if let Some(top) = self.top {
            params.append("$top", top.to_string());
        }
        if let Some(skip) = self.skip {
            params.append("$skip", skip.to_string());
        }
        if !self.select.is_empty() {
            params.append("$select", self.select.join(","));
        }
        if !self.expand.is_empty() {
            let rendered = self
                .expand
                .iter()
                .map(render_expand)
                .collect::<Vec<_>>()
                .join(",");
            params.append("$expand", rendered);
        }
        if let Some(id) = self.val_rule {
            params.append("$valrule", id.to_string());
        }
        if !self.context.is_empty() {
            let rendered = self
                .context
                .iter()
                .map(|(k, v)| format!("{k}:{v}"))
                .collect::<Vec<_>>()
                .join(",");
            params.append("$context", rendered);
        }
        if let Some(mode) = self.show_sql {
            let value = match mode {
                ShowSql::Enabled => "true",
                ShowSql::NoData => "nodata",
            };
            params.append("showsql", value);
        }
        if let Some(label) = &self.label {
            params.append("label", label.clone());
        }
        if let Some(scope) = &self.show_label {
            let value = match scope {
                ShowLabel::All => "true".to_owned(),
                ShowLabel::Columns(cols) => cols.join(","),
            };
            params.append("showlabel", value);
        }
        params
    }

    /// Shortcut for `to_params().to_query_string()`.
    #[must_use]
    pub fn to_query_string(&self) -> String {
        self.to_params().to_query_string()
    }
}
