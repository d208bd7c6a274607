use polars::prelude::*;
use serde_json::Value;

/// Column appended to every normalized dataset, holding the source symbol.
pub const INSTRUMENT_COLUMN: &str = "instrument";

/// Column dtype inferred from the JSON values one wire key carries.
///
/// Absent cells do not vote. A key that never carries a value is `Null`;
/// [`build_series`] materializes such a key as an all-missing text column.
pub fn infer_dtype(values: &[Option<&Value>]) -> DataType {
    let mut present = values.iter().flatten().peekable();
    if present.peek().is_none() {
        return DataType::Null;
    }

    let (mut all_bool, mut all_int, mut all_number) = (true, true, true);
    for value in present {
        all_bool &= value.is_boolean();
        all_int &= value.is_i64();
        all_number &= value.is_number();
    }

    if all_bool {
        DataType::Boolean
    } else if all_int {
        DataType::Int64
    } else if all_number {
        DataType::Float64
    } else {
        DataType::String
    }
}

/// Materialize one wire key's cells into a typed series.
pub fn build_series(name: &str, values: &[Option<&Value>]) -> Series {
    let name: PlSmallStr = name.into();
    match infer_dtype(values) {
        DataType::Boolean => {
            let cells: Vec<Option<bool>> = values.iter().map(|v| v.and_then(Value::as_bool)).collect();
            Series::new(name, cells)
        }
        DataType::Int64 => {
            let cells: Vec<Option<i64>> = values.iter().map(|v| v.and_then(Value::as_i64)).collect();
            Series::new(name, cells)
        }
        DataType::Float64 => {
            let cells: Vec<Option<f64>> = values.iter().map(|v| v.and_then(Value::as_f64)).collect();
            Series::new(name, cells)
        }
        DataType::Null => Series::full_null(name, values.len(), &DataType::String),
        _ => {
            let cells: Vec<Option<String>> = values.iter().map(|v| v.map(text_cell)).collect();
            Series::new(name, cells)
        }
    }
}

fn text_cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn cells(values: &[Value]) -> Vec<Option<&Value>> {
        values.iter().map(|v| if v.is_null() { None } else { Some(v) }).collect()
    }

    #[test]
    fn integers_stay_integers() {
        let values = [json!(1), Value::Null, json!(3)];
        assert_eq!(infer_dtype(&cells(&values)), DataType::Int64);
    }

    #[test]
    fn mixed_numbers_widen_to_float() {
        let values = [json!(1), json!(2.5)];
        assert_eq!(infer_dtype(&cells(&values)), DataType::Float64);
        let s = build_series("v", &cells(&values));
        assert_eq!(s.f64().unwrap().get(0), Some(1.0));
    }

    #[test]
    fn booleans_and_text() {
        assert_eq!(infer_dtype(&cells(&[json!(true), json!(false)])), DataType::Boolean);
        assert_eq!(infer_dtype(&cells(&[json!("a"), json!(1)])), DataType::String);
    }

    #[test]
    fn never_present_is_all_missing_text() {
        let values = [Value::Null, Value::Null];
        assert_eq!(infer_dtype(&cells(&values)), DataType::Null);
        let s = build_series("x", &cells(&values));
        assert_eq!(s.dtype(), &DataType::String);
        assert_eq!(s.len(), 2);
        assert_eq!(s.null_count(), 2);
    }

    #[test]
    fn text_keeps_missing_cells_missing() {
        let values = [json!("a"), Value::Null, json!(7)];
        let s = build_series("x", &cells(&values));
        let ca = s.str().unwrap();
        assert_eq!(ca.get(0), Some("a"));
        assert_eq!(ca.get(1), None);
        assert_eq!(ca.get(2), Some("7"));
    }
}
