//! UI-facing filter state: flat active-filter records, the field schema
//! that types them, and their mapping to wire filters and URL parameters.
//!
//! The flat representation is deliberately separate from the expression
//! tree in `odata-query`. List pages edit these records in place; only the
//! adapter decides how a record reaches the wire, driven by [`FieldMeta`].

pub mod adapter;
pub mod url_state;

pub use adapter::{build_odata_filter, client_side_filters, matches_record};
pub use url_state::{HistoryMode, UrlFilterState, UrlQueryUpdate};

use std::collections::HashMap;

/// Operator carried by an active filter. `as_str` yields the wire keyword.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ODataOperator {
    Eq,
    Neq,
    Gt,
    Ge,
    Lt,
    Le,
    Contains,
    StartsWith,
    EndsWith,
    In,
}

impl ODataOperator {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ODataOperator::Eq => "eq",
            ODataOperator::Neq => "neq",
            ODataOperator::Gt => "gt",
            ODataOperator::Ge => "ge",
            ODataOperator::Lt => "lt",
            ODataOperator::Le => "le",
            ODataOperator::Contains => "contains",
            ODataOperator::StartsWith => "startswith",
            ODataOperator::EndsWith => "endswith",
            ODataOperator::In => "in",
        }
    }

    /// Parse a wire keyword; `None` for anything unknown.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "eq" => Some(ODataOperator::Eq),
            "neq" => Some(ODataOperator::Neq),
            "gt" => Some(ODataOperator::Gt),
            "ge" => Some(ODataOperator::Ge),
            "lt" => Some(ODataOperator::Lt),
            "le" => Some(ODataOperator::Le),
            "contains" => Some(ODataOperator::Contains),
            "startswith" => Some(ODataOperator::StartsWith),
            "endswith" => Some(ODataOperator::EndsWith),
            "in" => Some(ODataOperator::In),
            _ => None,
        }
    }

    /// Whether the operator renders as a function call rather than an infix
    /// comparison.
    #[must_use]
    pub fn is_method(self) -> bool {
        matches!(
            self,
            ODataOperator::Contains | ODataOperator::StartsWith | ODataOperator::EndsWith
        )
    }
}

/// Value of an active filter: one string from a plain input, or several
/// from a multi-select.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(untagged)]
pub enum FilterValue {
    Single(String),
    Many(Vec<String>),
}

impl FilterValue {
    /// View as a slice regardless of arity.
    #[must_use]
    pub fn values(&self) -> &[String] {
        match self {
            FilterValue::Single(v) => std::slice::from_ref(v),
            FilterValue::Many(vs) => vs.as_slice(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, FilterValue::Many(vs) if vs.is_empty())
    }

    /// Flatten to the single string a URL parameter carries.
    #[must_use]
    pub fn to_query_value(&self) -> String {
        match self {
            FilterValue::Single(v) => v.clone(),
            FilterValue::Many(vs) => vs.join(","),
        }
    }
}

impl From<&str> for FilterValue {
    fn from(v: &str) -> Self {
        FilterValue::Single(v.to_owned())
    }
}

impl From<String> for FilterValue {
    fn from(v: String) -> Self {
        FilterValue::Single(v)
    }
}

impl From<Vec<String>> for FilterValue {
    fn from(vs: Vec<String>) -> Self {
        FilterValue::Many(vs)
    }
}

/// One UI-level filter row: field, operator, raw value(s).
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ActiveFilter {
    pub field: String,
    pub operator: ODataOperator,
    pub value: FilterValue,
}

impl ActiveFilter {
    pub fn new(
        field: impl Into<String>,
        operator: ODataOperator,
        value: impl Into<FilterValue>,
    ) -> Self {
        Self {
            field: field.into(),
            operator,
            value: value.into(),
        }
    }
}

/// Declared type of a filterable field; decides quoting on the wire.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    Boolean,
    String,
    Enum,
    Number,
    Date,
    Reference,
}

impl FieldType {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::String => "string",
            Self::Enum => "enum",
            Self::Number => "number",
            Self::Date => "date",
            Self::Reference => "reference",
        }
    }
}

/// A fixed choice for an enum-typed field.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct FieldOption {
    pub value: String,
    pub label: String,
}

/// Where a reference-typed field resolves its choices.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReferenceMeta {
    pub entity: String,
    pub key_column: String,
    pub display_column: String,
}

/// Per-field filter metadata: label, type, allowed operators, and whether
/// the backend can evaluate the field at all.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldMeta {
    pub label: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub operators: Vec<ODataOperator>,
    /// Excluded from the wire filter; applied in memory after fetch.
    #[serde(default)]
    pub client_side: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<FieldOption>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<ReferenceMeta>,
}

impl FieldMeta {
    pub fn new(
        label: impl Into<String>,
        field_type: FieldType,
        operators: impl IntoIterator<Item = ODataOperator>,
    ) -> Self {
        Self {
            label: label.into(),
            field_type,
            operators: operators.into_iter().collect(),
            client_side: false,
            options: Vec::new(),
            reference: None,
        }
    }

    /// Mark the field as client-side only.
    #[must_use]
    pub fn client_side(mut self) -> Self {
        self.client_side = true;
        self
    }

    #[must_use]
    pub fn with_options(mut self, options: Vec<FieldOption>) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_reference(mut self, reference: ReferenceMeta) -> Self {
        self.reference = Some(reference);
        self
    }

    /// First declared operator; `eq` when none are declared.
    #[must_use]
    pub fn default_operator(&self) -> ODataOperator {
        self.operators.first().copied().unwrap_or(ODataOperator::Eq)
    }
}

/// Filter metadata keyed by column name.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct FilterSchema(pub HashMap<String, FieldMeta>);

impl FilterSchema {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_field(mut self, name: impl Into<String>, meta: FieldMeta) -> Self {
        self.0.insert(name.into(), meta);
        self
    }

    #[must_use]
    pub fn get(&self, field: &str) -> Option<&FieldMeta> {
        self.0.get(field)
    }

    /// Default operator for `field`: its first declared operator, or `eq`
    /// when the field is unknown.
    #[must_use]
    pub fn default_operator(&self, field: &str) -> ODataOperator {
        self.get(field)
            .map_or(ODataOperator::Eq, FieldMeta::default_operator)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_meta_serializes_to_schema_shape() {
        let meta = FieldMeta::new(
            "Grade level",
            FieldType::Enum,
            [ODataOperator::Eq, ODataOperator::In],
        )
        .with_options(vec![
            FieldOption {
                value: "P".to_owned(),
                label: "Primary".to_owned(),
            },
            FieldOption {
                value: "S".to_owned(),
                label: "Secondary".to_owned(),
            },
        ]);

        assert_eq!(
            serde_json::to_value(&meta).unwrap(),
            json!({
                "label": "Grade level",
                "type": "enum",
                "operators": ["eq", "in"],
                "clientSide": false,
                "options": [
                    {"value": "P", "label": "Primary"},
                    {"value": "S", "label": "Secondary"},
                ],
            }),
        );
    }

    #[test]
    fn test_reference_field_round_trips_camel_case() {
        let meta = FieldMeta::new("Partner group", FieldType::Reference, [ODataOperator::Eq])
            .with_reference(ReferenceMeta {
                entity: "c_bp_group".to_owned(),
                key_column: "C_BP_Group_ID".to_owned(),
                display_column: "Name".to_owned(),
            });

        let value = serde_json::to_value(&meta).unwrap();
        assert_eq!(value["reference"]["keyColumn"], "C_BP_Group_ID");
        assert_eq!(value["reference"]["displayColumn"], "Name");

        let back: FieldMeta = serde_json::from_value(value).unwrap();
        assert_eq!(back, meta);
    }

    #[test]
    fn test_schema_decodes_from_plain_map() {
        let schema: FilterSchema = serde_json::from_value(json!({
            "IsActive": {"label": "Active", "type": "boolean", "operators": ["eq"]},
            "Section": {
                "label": "Section",
                "type": "string",
                "operators": ["eq"],
                "clientSide": true,
            },
        }))
        .unwrap();

        assert!(schema.get("IsActive").is_some_and(|m| !m.client_side));
        assert!(schema.get("Section").is_some_and(|m| m.client_side));
        assert_eq!(schema.default_operator("IsActive"), ODataOperator::Eq);
        assert_eq!(schema.default_operator("Unknown"), ODataOperator::Eq);
    }

    #[test]
    fn test_operator_tokens_round_trip() {
        for op in [
            ODataOperator::Eq,
            ODataOperator::Neq,
            ODataOperator::Gt,
            ODataOperator::Ge,
            ODataOperator::Lt,
            ODataOperator::Le,
            ODataOperator::Contains,
            ODataOperator::StartsWith,
            ODataOperator::EndsWith,
            ODataOperator::In,
        ] {
            assert_eq!(ODataOperator::parse(op.as_str()), Some(op));
        }
        assert_eq!(ODataOperator::parse("between"), None);
    }
}
