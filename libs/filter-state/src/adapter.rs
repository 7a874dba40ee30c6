//! Flat active-filter records to wire `$filter` conversion.
//!
//! This path is independent of the fluent builder and joins clauses with
//! lowercase connectives; the backend accepts both spellings and sees both,
//! one per call path.

use serde_json::Value;
use tracing::debug;

use crate::{ActiveFilter, FieldMeta, FieldType, FilterSchema, ODataOperator};

/// Render active filters to one `$filter` string, or `None` when nothing
/// remains for the server.
///
/// Filters are skipped, not failed, when their field is missing from the
/// schema or marked client-side; stale saved views routinely carry fields
/// the schema no longer declares.
#[must_use]
pub fn build_odata_filter(filters: &[ActiveFilter], schema: &FilterSchema) -> Option<String> {
    let mut clauses = Vec::new();
    for filter in filters {
        let Some(meta) = schema.get(&filter.field) else {
            debug!(field = %filter.field, "dropping filter: field not in schema");
            continue;
        };
        if meta.client_side {
            continue;
        }
        if let Some(clause) = render_filter_clause(filter, meta) {
            clauses.push(clause);
        }
    }
    if clauses.is_empty() {
        None
    } else {
        Some(clauses.join(" and "))
    }
}

/// The filters [`build_odata_filter`] held back for in-memory evaluation.
#[must_use]
pub fn client_side_filters(filters: &[ActiveFilter], schema: &FilterSchema) -> Vec<ActiveFilter> {
    filters
        .iter()
        .filter(|f| schema.get(&f.field).is_some_and(|m| m.client_side))
        .cloned()
        .collect()
}

fn render_filter_clause(filter: &ActiveFilter, meta: &FieldMeta) -> Option<String> {
    match filter.value.values() {
        [] => None,
        [single] => Some(render_single(&filter.field, filter.operator, single, meta)),
        many => {
            let ors = many
                .iter()
                .map(|v| render_single(&filter.field, filter.operator, v, meta))
                .collect::<Vec<_>>()
                .join(" or ");
            Some(format!("({ors})"))
        }
    }
}

fn render_single(field: &str, operator: ODataOperator, raw: &str, meta: &FieldMeta) -> String {
    match operator {
        op if op.is_method() => format!("{}({},'{}')", op.as_str(), field, raw),
        ODataOperator::In => {
            let list = raw
                .split(',')
                .map(|v| format!("'{}'", v.trim()))
                .collect::<Vec<_>>()
                .join(",");
            format!("{field} in ({list})")
        }
        _ => format!(
            "{} {} {}",
            field,
            operator.as_str(),
            format_value(raw, meta.field_type)
        ),
    }
}

/// Quote per the declared field type: booleans and numbers stay bare,
/// everything else is single-quoted.
fn format_value(raw: &str, field_type: FieldType) -> String {
    match field_type {
        FieldType::Boolean | FieldType::Number => raw.to_owned(),
        FieldType::String | FieldType::Enum | FieldType::Date | FieldType::Reference => {
            format!("'{raw}'")
        }
    }
}

/// Evaluate one filter against a fetched record, for client-side fields.
///
/// Comparison is textual; the ordering operators compare numerically when
/// both sides parse as numbers. Method operators match case-insensitively,
/// the way the list pages filter in memory.
#[must_use]
pub fn matches_record(filter: &ActiveFilter, record: &Value) -> bool {
    let actual = field_text(record, &filter.field);
    filter
        .value
        .values()
        .iter()
        .any(|wanted| matches_value(filter.operator, &actual, wanted))
}

fn matches_value(operator: ODataOperator, actual: &str, wanted: &str) -> bool {
    match operator {
        ODataOperator::Eq => actual == wanted,
        ODataOperator::Neq => actual != wanted,
        ODataOperator::Gt => compare(actual, wanted).is_gt(),
        ODataOperator::Ge => compare(actual, wanted).is_ge(),
        ODataOperator::Lt => compare(actual, wanted).is_lt(),
        ODataOperator::Le => compare(actual, wanted).is_le(),
        ODataOperator::Contains => actual.to_lowercase().contains(&wanted.to_lowercase()),
        ODataOperator::StartsWith => actual.to_lowercase().starts_with(&wanted.to_lowercase()),
        ODataOperator::EndsWith => actual.to_lowercase().ends_with(&wanted.to_lowercase()),
        ODataOperator::In => wanted.split(',').any(|v| v.trim() == actual),
    }
}

fn compare(actual: &str, wanted: &str) -> std::cmp::Ordering {
    match (actual.parse::<f64>(), wanted.parse::<f64>()) {
        (Ok(a), Ok(w)) => a.partial_cmp(&w).unwrap_or(std::cmp::Ordering::Equal),
        _ => actual.cmp(wanted),
    }
}

/// Text form of a record field: scalars print as-is, iDempiere reference
/// objects contribute their `identifier`, anything else is empty.
fn field_text(record: &Value, field: &str) -> String {
    match record.get(field) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        Some(Value::Object(obj)) => obj
            .get("identifier")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_owned(),
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FilterValue;
    use serde_json::json;

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
                "GrandTotal",
                FieldMeta::new(
                    "Total",
                    FieldType::Number,
                    [ODataOperator::Ge, ODataOperator::Le],
                ),
            )
            .with_field(
                "Status",
                FieldMeta::new(
                    "Status",
                    FieldType::Enum,
                    [ODataOperator::Eq, ODataOperator::In],
                ),
            )
            .with_field(
                "Section",
                FieldMeta::new("Section", FieldType::Reference, [ODataOperator::Eq])
                    .client_side(),
            )
    }

    #[test]
    fn test_empty_filter_list_yields_none() {
        assert_eq!(build_odata_filter(&[], &schema()), None);
    }

    #[test]
    fn test_boolean_value_stays_bare() {
        let filters = [ActiveFilter::new("IsActive", ODataOperator::Eq, "true")];
        assert_eq!(
            build_odata_filter(&filters, &schema()).as_deref(),
            Some("IsActive eq true"),
        );
    }

    #[test]
    fn test_string_value_is_quoted() {
        let filters = [ActiveFilter::new("Name", ODataOperator::Eq, "Smith")];
        assert_eq!(
            build_odata_filter(&filters, &schema()).as_deref(),
            Some("Name eq 'Smith'"),
        );
    }

    #[test]
    fn test_number_value_stays_bare() {
        let filters = [ActiveFilter::new("GrandTotal", ODataOperator::Ge, "1000")];
        assert_eq!(
            build_odata_filter(&filters, &schema()).as_deref(),
            Some("GrandTotal ge 1000"),
        );
    }

    #[test]
    fn test_method_operator_renders_function_call() {
        let filters = [ActiveFilter::new("Name", ODataOperator::Contains, "Smi")];
        assert_eq!(
            build_odata_filter(&filters, &schema()).as_deref(),
            Some("contains(Name,'Smi')"),
        );
    }

    #[test]
    fn test_filters_join_with_lowercase_and() {
        let filters = [
            ActiveFilter::new("IsActive", ODataOperator::Eq, "true"),
            ActiveFilter::new("Name", ODataOperator::Contains, "Smith"),
        ];
        assert_eq!(
            build_odata_filter(&filters, &schema()).as_deref(),
            Some("IsActive eq true and contains(Name,'Smith')"),
        );
    }

    #[test]
    fn test_multi_value_renders_parenthesized_or_group() {
        let filters = [ActiveFilter::new(
            "Status",
            ODataOperator::Eq,
            vec!["Active".to_owned(), "Pending".to_owned()],
        )];
        assert_eq!(
            build_odata_filter(&filters, &schema()).as_deref(),
            Some("(Status eq 'Active' or Status eq 'Pending')"),
        );
    }

    #[test]
    fn test_single_element_array_behaves_like_scalar() {
        let filters = [ActiveFilter::new(
            "Status",
            ODataOperator::Eq,
            vec!["Active".to_owned()],
        )];
        assert_eq!(
            build_odata_filter(&filters, &schema()).as_deref(),
            Some("Status eq 'Active'"),
        );
    }

    #[test]
    fn test_empty_array_contributes_nothing() {
        let filters = [
            ActiveFilter::new("Status", ODataOperator::Eq, FilterValue::Many(Vec::new())),
            ActiveFilter::new("IsActive", ODataOperator::Eq, "true"),
        ];
        assert_eq!(
            build_odata_filter(&filters, &schema()).as_deref(),
            Some("IsActive eq true"),
        );

        let only_empty = [ActiveFilter::new(
            "Status",
            ODataOperator::Eq,
            FilterValue::Many(Vec::new()),
        )];
        assert_eq!(build_odata_filter(&only_empty, &schema()), None);
    }

    #[test]
    fn test_in_operator_splits_comma_list() {
        let filters = [ActiveFilter::new("Status", ODataOperator::In, "Active, Pending")];
        assert_eq!(
            build_odata_filter(&filters, &schema()).as_deref(),
            Some("Status in ('Active','Pending')"),
        );
    }

    #[test]
    fn test_unknown_field_is_skipped() {
        let filters = [
            ActiveFilter::new("NoSuchField", ODataOperator::Eq, "x"),
            ActiveFilter::new("IsActive", ODataOperator::Eq, "true"),
        ];
        assert_eq!(
            build_odata_filter(&filters, &schema()).as_deref(),
            Some("IsActive eq true"),
        );
    }

    #[test]
    fn test_client_side_field_is_excluded_and_complemented() {
        let filters = [
            ActiveFilter::new("Section", ODataOperator::Eq, "A"),
            ActiveFilter::new("IsActive", ODataOperator::Eq, "true"),
        ];

        assert_eq!(
            build_odata_filter(&filters, &schema()).as_deref(),
            Some("IsActive eq true"),
        );

        let local = client_side_filters(&filters, &schema());
        assert_eq!(local, vec![filters[0].clone()]);
    }

    #[test]
    fn test_all_filters_skipped_yields_none() {
        let filters = [ActiveFilter::new("Section", ODataOperator::Eq, "A")];
        assert_eq!(build_odata_filter(&filters, &schema()), None);
    }

    #[test]
    fn test_matches_record_eq_on_string() {
        let record = json!({ "Name": "Joe Block" });
        let filter = ActiveFilter::new("Name", ODataOperator::Eq, "Joe Block");
        assert!(matches_record(&filter, &record));

        let other = ActiveFilter::new("Name", ODataOperator::Eq, "Jane");
        assert!(!matches_record(&other, &record));
    }

    #[test]
    fn test_matches_record_contains_is_case_insensitive() {
        let record = json!({ "Name": "Joe Block" });
        let filter = ActiveFilter::new("Name", ODataOperator::Contains, "block");
        assert!(matches_record(&filter, &record));
    }

    #[test]
    fn test_matches_record_compares_numbers_numerically() {
        let record = json!({ "GrandTotal": 1500 });
        assert!(matches_record(
            &ActiveFilter::new("GrandTotal", ODataOperator::Ge, "1000"),
            &record,
        ));
        assert!(!matches_record(
            &ActiveFilter::new("GrandTotal", ODataOperator::Lt, "1000"),
            &record,
        ));
    }

    #[test]
    fn test_matches_record_uses_reference_identifier() {
        let record = json!({
            "C_BP_Group_ID": { "propertyLabel": "Group", "id": 104, "identifier": "Gold" }
        });
        let filter = ActiveFilter::new("C_BP_Group_ID", ODataOperator::Eq, "Gold");
        assert!(matches_record(&filter, &record));
    }

    #[test]
    fn test_matches_record_multi_value_matches_any() {
        let record = json!({ "Status": "Pending" });
        let filter = ActiveFilter::new(
            "Status",
            ODataOperator::Eq,
            vec!["Active".to_owned(), "Pending".to_owned()],
        );
        assert!(matches_record(&filter, &record));
    }

    #[test]
    fn test_matches_record_missing_field_does_not_match() {
        let record = json!({ "Name": "Joe" });
        let filter = ActiveFilter::new("Missing", ODataOperator::Eq, "x");
        assert!(!matches_record(&filter, &record));
    }
}
