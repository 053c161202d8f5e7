use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::domain::{UdfMap, UdfValue};
use crate::error::PrepdocError;
use crate::schema::{FieldKind, FieldSchema, FieldSpec};

/// A validated, typed record extracted from one UDF map: output field name to
/// coerced value. Absent optional fields have no key.
pub type Record = BTreeMap<String, UdfValue>;

/// Extracts the schema's fields from a raw UDF map. Fail-fast: the first
/// missing required field or failed coercion aborts the whole extraction.
/// Absent optional fields are omitted, never defaulted.
pub fn extract(schema: &FieldSchema, udf_map: &UdfMap) -> Result<Record, PrepdocError> {
    let mut record = Record::new();
    for spec in schema.fields() {
        match udf_map.get(spec.udf) {
            Some(raw) => {
                let value = coerce(spec, raw)?;
                record.insert(spec.name.to_string(), value);
            }
            None if spec.required => {
                return Err(PrepdocError::MissingField {
                    field: spec.name.to_string(),
                    udf: spec.udf.to_string(),
                });
            }
            None => {}
        }
    }
    Ok(record)
}

fn coerce(spec: &FieldSpec, raw: &UdfValue) -> Result<UdfValue, PrepdocError> {
    let coerced = match (spec.kind, raw) {
        (FieldKind::Str, value) => Some(UdfValue::Str(value.to_string())),

        (FieldKind::Int, UdfValue::Int(value)) => Some(UdfValue::Int(*value)),
        (FieldKind::Int, UdfValue::Float(value)) if value.fract() == 0.0 => {
            Some(UdfValue::Int(*value as i64))
        }
        (FieldKind::Int, UdfValue::Str(value)) => {
            value.trim().parse::<i64>().ok().map(UdfValue::Int)
        }

        (FieldKind::Float, UdfValue::Float(value)) => Some(UdfValue::Float(*value)),
        (FieldKind::Float, UdfValue::Int(value)) => Some(UdfValue::Float(*value as f64)),
        (FieldKind::Float, UdfValue::Str(value)) => {
            value.trim().parse::<f64>().ok().map(UdfValue::Float)
        }

        (FieldKind::Date, UdfValue::Date(value)) => Some(UdfValue::Date(*value)),
        (FieldKind::Date, UdfValue::Str(value)) => {
            NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
                .ok()
                .map(UdfValue::Date)
        }

        _ => None,
    };

    coerced.ok_or_else(|| PrepdocError::InvalidValue {
        field: spec.name.to_string(),
        udf: spec.udf.to_string(),
        value: raw.to_string(),
        expected: kind_name(spec.kind),
    })
}

fn kind_name(kind: FieldKind) -> &'static str {
    match kind {
        FieldKind::Str => "string",
        FieldKind::Int => "integer",
        FieldKind::Float => "float",
        FieldKind::Date => "calendar date (YYYY-MM-DD)",
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::NaiveDate;

    use super::*;
    use crate::schema::FieldSpec;

    fn udfs(entries: &[(&str, UdfValue)]) -> UdfMap {
        entries
            .iter()
            .map(|(key, value)| (key.to_string(), value.clone()))
            .collect()
    }

    #[test]
    fn extracts_required_and_omits_absent_optional() {
        let schema = FieldSchema::new()
            .field(FieldSpec::required("concentration", "Concentration", FieldKind::Float))
            .field(FieldSpec::optional("comment", "Comment", FieldKind::Str));
        let map = udfs(&[("Concentration", UdfValue::Float(12.4))]);

        let record = extract(&schema, &map).unwrap();
        assert_eq!(record.get("concentration"), Some(&UdfValue::Float(12.4)));
        assert!(!record.contains_key("comment"));
    }

    #[test]
    fn missing_required_field_fails() {
        let schema = FieldSchema::new().field(FieldSpec::required(
            "concentration",
            "Concentration",
            FieldKind::Float,
        ));
        let err = extract(&schema, &UdfMap::new()).unwrap_err();
        assert_matches!(err, PrepdocError::MissingField { field, .. } if field == "concentration");
    }

    #[test]
    fn numeric_coercion_from_strings() {
        let schema = FieldSchema::new()
            .field(FieldSpec::required("cycles", "Nr of PCR cycles", FieldKind::Int))
            .field(FieldSpec::required("volume", "Volume", FieldKind::Float));
        let map = udfs(&[
            ("Nr of PCR cycles", UdfValue::Str("8".to_string())),
            ("Volume", UdfValue::Str(" 25.5 ".to_string())),
        ]);

        let record = extract(&schema, &map).unwrap();
        assert_eq!(record.get("cycles"), Some(&UdfValue::Int(8)));
        assert_eq!(record.get("volume"), Some(&UdfValue::Float(25.5)));
    }

    #[test]
    fn int_field_rejects_fractional_value() {
        let schema = FieldSchema::new().field(FieldSpec::required(
            "cycles",
            "Nr of PCR cycles",
            FieldKind::Int,
        ));
        let map = udfs(&[("Nr of PCR cycles", UdfValue::Float(8.5))]);
        let err = extract(&schema, &map).unwrap_err();
        assert_matches!(err, PrepdocError::InvalidValue { expected: "integer", .. });
    }

    #[test]
    fn int_field_accepts_integral_float() {
        let schema = FieldSchema::new().field(FieldSpec::required(
            "cycles",
            "Nr of PCR cycles",
            FieldKind::Int,
        ));
        let map = udfs(&[("Nr of PCR cycles", UdfValue::Float(8.0))]);
        let record = extract(&schema, &map).unwrap();
        assert_eq!(record.get("cycles"), Some(&UdfValue::Int(8)));
    }

    #[test]
    fn date_parses_calendar_dates_only() {
        let schema = FieldSchema::new().field(FieldSpec::required(
            "run_date",
            "Run Date",
            FieldKind::Date,
        ));

        let map = udfs(&[("Run Date", UdfValue::Str("2024-03-01".to_string()))]);
        let record = extract(&schema, &map).unwrap();
        assert_eq!(
            record.get("run_date"),
            Some(&UdfValue::Date(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap()))
        );

        let map = udfs(&[("Run Date", UdfValue::Str("2024-03-01T10:00:00".to_string()))]);
        let err = extract(&schema, &map).unwrap_err();
        assert_matches!(err, PrepdocError::InvalidValue { .. });
    }

    #[test]
    fn malformed_value_names_the_field() {
        let schema = FieldSchema::new().field(FieldSpec::required(
            "concentration",
            "Concentration",
            FieldKind::Float,
        ));
        let map = udfs(&[("Concentration", UdfValue::Str("n/a".to_string()))]);
        let err = extract(&schema, &map).unwrap_err();
        assert_matches!(
            err,
            PrepdocError::InvalidValue { field, udf, .. }
                if field == "concentration" && udf == "Concentration"
        );
    }
}
