//! Currency text -> number coercion.

use crate::domain::table::{Table, Value};

const CURRENCY_CHARS: [char; 2] = ['$', ','];

/// Parse a currency-formatted amount such as `"$1,234.50"`.
///
/// Returns `None` for anything that is not a finite number once the currency
/// symbol and thousands separators are removed.
pub fn parse_amount(text: &str) -> Option<f64> {
    let cleaned: String = text.chars().filter(|c| !CURRENCY_CHARS.contains(c)).collect();
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }
    cleaned.parse::<f64>().ok().filter(|n| n.is_finite())
}

pub fn normalize_value(value: &Value) -> Value {
    match value {
        Value::Number(n) if n.is_finite() => Value::Number(*n),
        Value::Text(text) => parse_amount(text).map(Value::Number).unwrap_or(Value::Missing),
        _ => Value::Missing,
    }
}

/// Cells coerced to missing, per column.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizeReport {
    pub coerced_missing: Vec<(String, usize)>,
}

impl NormalizeReport {
    pub fn total(&self) -> usize {
        self.coerced_missing.iter().map(|(_, n)| n).sum()
    }
}

pub fn normalize(table: &Table, columns: &[&str]) -> Table {
    normalize_with_report(table, columns).0
}

/// Normalize `columns`, counting cells that held something but failed to parse.
/// Columns the table does not have are skipped.
pub fn normalize_with_report(table: &Table, columns: &[&str]) -> (Table, NormalizeReport) {
    let mut report = NormalizeReport::default();
    let mut result = table.clone();

    for column in columns.iter().filter(|c| table.has_column(c)) {
        let mut failed = 0;
        result = result.map_column(column, |value| {
            let normalized = normalize_value(value);
            if normalized.is_missing() && !value.is_missing() {
                failed += 1;
            }
            normalized
        });
        report.coerced_missing.push((column.to_string(), failed));
    }

    (result, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::table::Record;
    use proptest::prelude::*;

    fn table_with(values: Vec<Value>) -> Table {
        let mut table = Table::new(vec!["name".into(), "total_activos".into()]);
        for (i, v) in values.into_iter().enumerate() {
            let mut record = Record::new().with("name", format!("E{i}").as_str());
            record.set("total_activos", v);
            table.push(record);
        }
        table
    }

    #[test]
    fn parse_amount_strips_currency_formatting() {
        assert_eq!(parse_amount("$1,234"), Some(1234.0));
        assert_eq!(parse_amount(" $ 12,345,678.90 "), Some(12_345_678.90));
        assert_eq!(parse_amount("-$500"), Some(-500.0));
    }

    #[test]
    fn parse_amount_rejects_garbage() {
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("$"), None);
        assert_eq!(parse_amount("NaN"), None);
        assert_eq!(parse_amount("inf"), None);
    }

    #[test]
    fn normalize_converts_text_and_marks_bad_cells_missing() {
        let table = table_with(vec![
            Value::Text("$1,234".into()),
            Value::Text("abc".into()),
            Value::Missing,
        ]);
        let (normalized, report) = normalize_with_report(&table, &["total_activos"]);

        assert_eq!(normalized.rows()[0].get("total_activos"), &Value::Number(1234.0));
        assert!(normalized.rows()[1].get("total_activos").is_missing());
        assert!(normalized.rows()[2].get("total_activos").is_missing());
        assert_eq!(report.coerced_missing, vec![("total_activos".to_string(), 1)]);
        assert_eq!(report.total(), 1);
    }

    #[test]
    fn normalize_leaves_input_untouched() {
        let table = table_with(vec![Value::Text("$10".into())]);
        let _ = normalize(&table, &["total_activos"]);
        assert_eq!(table.rows()[0].get("total_activos"), &Value::Text("$10".into()));
    }

    #[test]
    fn normalize_skips_unknown_columns() {
        let table = table_with(vec![Value::Text("$10".into())]);
        let (normalized, report) = normalize_with_report(&table, &["total_pasivos"]);
        assert_eq!(normalized, table);
        assert!(report.coerced_missing.is_empty());
    }

    #[test]
    fn numeric_column_is_unchanged() {
        let table = table_with(vec![Value::Number(1.5), Value::Number(-3.0)]);
        assert_eq!(normalize(&table, &["total_activos"]), table);
    }

    proptest! {
        #[test]
        fn normalize_is_idempotent(amounts in prop::collection::vec(
            prop_oneof![
                any::<f64>().prop_map(Value::Number),
                "[$0-9,.a-z ]{0,12}".prop_map(Value::Text),
                Just(Value::Missing),
            ],
            0..20,
        )) {
            let once = normalize(&table_with(amounts), &["total_activos"]);
            let twice = normalize(&once, &["total_activos"]);
            prop_assert_eq!(once, twice);
        }

        #[test]
        fn formatted_integers_round_trip(n in 0u64..1_000_000_000_000) {
            let digits = n.to_string();
            let mut grouped = String::new();
            for (i, ch) in digits.chars().enumerate() {
                if i > 0 && (digits.len() - i) % 3 == 0 {
                    grouped.push(',');
                }
                grouped.push(ch);
            }
            prop_assert_eq!(parse_amount(&format!("${grouped}")), Some(n as f64));
        }
    }
}
