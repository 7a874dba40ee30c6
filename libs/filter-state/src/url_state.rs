//! URL round-tripping of filter and search state.
//!
//! Active filters become `f[Field]` / `f[Field][op]` query parameters and
//! the search box occupies `q`. Other parameters belong to the router and
//! are never touched; decoding ignores them.

use regex::Regex;
use url::form_urlencoded;

use crate::{ActiveFilter, FilterSchema, FilterValue};

const SEARCH_PARAM: &str = "q";

/// How the host should commit a query update to its history stack.
///
/// Filter and search edits use `Replace` so typing and toggling never
/// pollute the back stack; a reset navigates fresh with `Push`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HistoryMode {
    Replace,
    Push,
}

/// A serialized query string plus its history semantics.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UrlQueryUpdate {
    pub query: String,
    pub mode: HistoryMode,
}

/// Filter and search state decoded from a URL.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct UrlFilterState {
    pub filters: Vec<ActiveFilter>,
    pub search: String,
}

impl UrlFilterState {
    /// True when some decoded filter carries `field` with exactly `value`.
    #[must_use]
    pub fn is_filter_active(&self, field: &str, value: &str) -> bool {
        self.filters
            .iter()
            .any(|f| f.field == field && f.value.values().iter().any(|v| v == value))
    }
}

/// Encode filters and search into a query string.
///
/// A filter keeps the short `f[Field]` key unless the field appears more
/// than once or its operator differs from the schema default; those cases
/// carry the explicit `f[Field][op]` suffix so decoding stays lossless.
#[must_use]
pub fn encode(filters: &[ActiveFilter], search: &str, schema: &FilterSchema) -> UrlQueryUpdate {
    let mut pairs = form_urlencoded::Serializer::new(String::new());
    for filter in filters {
        // A cleared multi-select never reaches the URL.
        if filter.value.is_empty() {
            continue;
        }
        let duplicated = filters.iter().filter(|f| f.field == filter.field).count() > 1;
        let needs_op = duplicated || filter.operator != schema.default_operator(&filter.field);
        let key = if needs_op {
            format!("f[{}][{}]", filter.field, filter.operator.as_str())
        } else {
            format!("f[{}]", filter.field)
        };
        pairs.append_pair(&key, &filter.value.to_query_value());
    }
    if !search.is_empty() {
        pairs.append_pair(SEARCH_PARAM, search);
    }
    UrlQueryUpdate {
        query: pairs.finish(),
        mode: HistoryMode::Replace,
    }
}

/// A cleared URL, committed as a fresh navigation.
#[must_use]
pub fn reset() -> UrlQueryUpdate {
    UrlQueryUpdate {
        query: String::new(),
        mode: HistoryMode::Push,
    }
}

/// Decode filter and search state from a raw query string.
///
/// Decoding is total: keys that do not parse as filter parameters are
/// ignored, so any URL yields some state. A filter key without an operator
/// suffix gets the field's default operator from the schema, or `eq` when
/// the field is unknown there.
#[must_use]
pub fn decode(query: &str, schema: &FilterSchema) -> UrlFilterState {
    let key_re = Regex::new(r"^f\[([^\[\]]+)\](?:\[([^\[\]]+)\])?$").unwrap();
    let mut state = UrlFilterState::default();
    for (key, value) in form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
        if key == SEARCH_PARAM {
            state.search = value.into_owned();
            continue;
        }
        let Some(caps) = key_re.captures(&key) else {
            continue;
        };
        let field = caps[1].to_owned();
        let operator = match caps.get(2) {
            Some(m) => match crate::ODataOperator::parse(m.as_str()) {
                Some(op) => op,
                None => continue,
            },
            None => schema.default_operator(&field),
        };
        state.filters.push(ActiveFilter {
            field,
            operator,
            value: FilterValue::Single(value.into_owned()),
        });
    }
    state
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{FieldMeta, FieldType, ODataOperator};

    fn schema() -> FilterSchema {
        FilterSchema::new()
            .with_field(
                "IsActive",
                FieldMeta::new("Active", FieldType::Boolean, [ODataOperator::Eq]),
            )
            .with_field(
                "Name",
                FieldMeta::new(
                    "Name",
                    FieldType::String,
                    [ODataOperator::Contains, ODataOperator::Eq],
                ),
            )
            .with_field(
                "Created",
                FieldMeta::new(
                    "Created",
                    FieldType::Date,
                    [ODataOperator::Ge, ODataOperator::Le],
                ),
            )
    }

    #[test]
    fn test_encode_default_operator_omits_suffix() {
        let filters = [ActiveFilter::new("IsActive", ODataOperator::Eq, "true")];
        let update = encode(&filters, "", &schema());

        assert_eq!(update.query, "f%5BIsActive%5D=true");
        assert_eq!(update.mode, HistoryMode::Replace);
    }

    #[test]
    fn test_encode_non_default_operator_adds_suffix() {
        let filters = [ActiveFilter::new("Name", ODataOperator::Eq, "Smith")];
        let update = encode(&filters, "", &schema());

        assert_eq!(update.query, "f%5BName%5D%5Beq%5D=Smith");
    }

    #[test]
    fn test_encode_duplicate_field_always_suffixes() {
        let filters = [
            ActiveFilter::new("Created", ODataOperator::Ge, "2024-01-01"),
            ActiveFilter::new("Created", ODataOperator::Le, "2024-12-31"),
        ];
        let update = encode(&filters, "", &schema());

        assert_eq!(
            update.query,
            "f%5BCreated%5D%5Bge%5D=2024-01-01&f%5BCreated%5D%5Ble%5D=2024-12-31",
        );
    }

    #[test]
    fn test_encode_search_only_when_non_empty() {
        let update = encode(&[], "smith", &schema());
        assert_eq!(update.query, "q=smith");

        let update = encode(&[], "", &schema());
        assert_eq!(update.query, "");
    }

    #[test]
    fn test_encode_skips_empty_multi_value() {
        let filters = [
            ActiveFilter::new("Name", ODataOperator::Contains, FilterValue::Many(Vec::new())),
            ActiveFilter::new("IsActive", ODataOperator::Eq, "true"),
        ];
        let update = encode(&filters, "", &schema());

        assert_eq!(update.query, "f%5BIsActive%5D=true");
    }

    #[test]
    fn test_decode_single_filter_with_default_operator() {
        let state = decode("f%5BIsActive%5D=true", &schema());
        assert_eq!(
            state.filters,
            vec![ActiveFilter::new("IsActive", ODataOperator::Eq, "true")],
        );
    }

    #[test]
    fn test_decode_accepts_literal_brackets() {
        let state = decode("f[IsActive]=true", &schema());
        assert_eq!(
            state.filters,
            vec![ActiveFilter::new("IsActive", ODataOperator::Eq, "true")],
        );
    }

    #[test]
    fn test_decode_unknown_field_defaults_to_eq() {
        let state = decode("f[Mystery]=42", &schema());
        assert_eq!(
            state.filters,
            vec![ActiveFilter::new("Mystery", ODataOperator::Eq, "42")],
        );
    }

    #[test]
    fn test_decode_ignores_unrelated_and_junk_keys() {
        let state = decode("page=2&foo=bar&f%5B=broken&f[A][b][c]=x", &schema());
        assert!(state.filters.is_empty());
        assert!(state.search.is_empty());
    }

    #[test]
    fn test_decode_skips_unknown_operator_suffix() {
        let state = decode("f[Name][zz]=x", &schema());
        assert!(state.filters.is_empty());
    }

    #[test]
    fn test_decode_reads_search_param() {
        let state = decode("?q=smith&f[IsActive]=true", &schema());
        assert_eq!(state.search, "smith");
        assert_eq!(state.filters.len(), 1);
    }

    #[test]
    fn test_reset_pushes_empty_query() {
        let update = reset();
        assert_eq!(update.query, "");
        assert_eq!(update.mode, HistoryMode::Push);
    }

    #[test]
    fn test_is_filter_active_matches_on_field_and_value() {
        let state = decode("f[IsActive]=true", &schema());
        assert!(state.is_filter_active("IsActive", "true"));
        assert!(!state.is_filter_active("IsActive", "false"));
        assert!(!state.is_filter_active("Name", "true"));
    }
}
