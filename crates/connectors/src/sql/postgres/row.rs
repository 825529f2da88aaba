use chrono::{DateTime, NaiveDateTime, Utc};
use engine_core::error::SourceError;
use model::{
    core::value::Value,
    records::row::{FieldValue, RowData},
};
use rust_decimal::Decimal;
use tokio_postgres::{Row as PgRow, types::Json as PgJson};
use tracing::warn;
use uuid::Uuid;

/// Decodes every column of a result row into the tagged value model.
pub fn to_row_data(row: &PgRow) -> Result<RowData, SourceError> {
    let fields = row
        .columns()
        .iter()
        .enumerate()
        .map(|(idx, column)| {
            let value =
                decode(row, idx, column.type_().name()).map_err(|e| SourceError::Decode {
                    column: column.name().to_string(),
                    reason: e.to_string(),
                })?;
            Ok(FieldValue {
                name: column.name().to_string(),
                value,
            })
        })
        .collect::<Result<Vec<_>, SourceError>>()?;

    Ok(RowData::new(fields))
}

fn decode(row: &PgRow, idx: usize, type_name: &str) -> Result<Value, tokio_postgres::Error> {
    let value = match type_name {
        "int2" => row.try_get::<_, Option<i16>>(idx)?.map(|v| Value::Int(v as i64)),
        "int4" => row.try_get::<_, Option<i32>>(idx)?.map(|v| Value::Int(v as i64)),
        "int8" => row.try_get::<_, Option<i64>>(idx)?.map(Value::Int),
        "float4" => row
            .try_get::<_, Option<f32>>(idx)?
            .map(|v| Value::Float(v as f64)),
        "float8" => row.try_get::<_, Option<f64>>(idx)?.map(Value::Float),
        "numeric" => row.try_get::<_, Option<Decimal>>(idx)?.map(exact_decimal),
        "bool" => row.try_get::<_, Option<bool>>(idx)?.map(Value::Boolean),
        "uuid" => row.try_get::<_, Option<Uuid>>(idx)?.map(Value::Uuid),
        "timestamptz" => row
            .try_get::<_, Option<DateTime<Utc>>>(idx)?
            .map(Value::Timestamp),
        "timestamp" => row
            .try_get::<_, Option<NaiveDateTime>>(idx)?
            .map(|naive| Value::Timestamp(DateTime::from_naive_utc_and_offset(naive, Utc))),
        "json" | "jsonb" => row
            .try_get::<_, Option<PgJson<serde_json::Value>>>(idx)?
            .map(|json| Value::String(json.0.to_string())),
        "text" | "varchar" | "bpchar" | "name" => {
            row.try_get::<_, Option<String>>(idx)?.map(Value::String)
        }
        other => match row.try_get::<_, Option<String>>(idx) {
            Ok(text) => text.map(Value::String),
            Err(error) => {
                warn!(column = idx, type_name = other, %error, "Unsupported column type, reading as NULL");
                None
            }
        },
    };

    Ok(value.unwrap_or(Value::Null))
}

/// Keeps every digit and the declared scale, e.g. `12.50` stays `12.50`.
fn exact_decimal(value: Decimal) -> Value {
    Value::String(value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn numeric_keeps_exact_text() {
        let cases = ["12345678901234567.89", "12.50", "-0.001", "42"];

        for text in cases {
            let decimal = Decimal::from_str(text).unwrap();
            assert_eq!(exact_decimal(decimal), Value::from(text), "numeric {text}");
        }
    }
}
