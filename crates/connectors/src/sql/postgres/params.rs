use engine_core::error::SourceError;
use model::core::value::Value;
use rust_decimal::Decimal;
use tokio_postgres::types::{ToSql, Type};
use uuid::Uuid;

/// A cursor value converted to the Rust type the server inferred for `$1`.
///
/// tokio-postgres refuses to bind e.g. an `i64` to an `int4` parameter, so the
/// value is narrowed or parsed to match the prepared statement.
pub struct PgParam(Box<dyn ToSql + Sync + Send>);

impl PgParam {
    pub fn for_type(value: &Value, ty: &Type) -> Result<Self, SourceError> {
        let mismatch = || SourceError::Other(format!(
            "cannot bind cursor value {value} ({}) to parameter of type {}",
            value.type_name(),
            ty.name()
        ));

        let param: Box<dyn ToSql + Sync + Send> = match (ty.name(), value) {
            (_, Value::Null) => Box::new(Option::<String>::None),
            ("int2", Value::Int(v)) => Box::new(i16::try_from(*v).map_err(|_| mismatch())?),
            ("int4", Value::Int(v)) => Box::new(i32::try_from(*v).map_err(|_| mismatch())?),
            ("int8", Value::Int(v)) => Box::new(*v),
            ("numeric", Value::Int(v)) => Box::new(Decimal::from(*v)),
            ("float8", Value::Int(v)) => Box::new(*v as f64),
            ("float8", Value::Float(v)) => Box::new(*v),
            ("uuid", Value::Uuid(v)) => Box::new(*v),
            ("uuid", Value::String(s)) => {
                Box::new(Uuid::parse_str(s).map_err(|_| mismatch())?)
            }
            ("bool", Value::Boolean(v)) => Box::new(*v),
            ("timestamptz", Value::Timestamp(v)) => Box::new(*v),
            ("timestamp", Value::Timestamp(v)) => Box::new(v.naive_utc()),
            ("text" | "varchar" | "bpchar" | "name" | "unknown", other) => {
                Box::new(other.as_text())
            }
            _ => return Err(mismatch()),
        };

        Ok(PgParam(param))
    }
}

impl AsRef<dyn ToSql + Sync> for PgParam {
    fn as_ref(&self) -> &(dyn ToSql + Sync + 'static) {
        &*self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn narrows_integers_to_parameter_width() {
        assert!(PgParam::for_type(&Value::Int(-1), &Type::INT4).is_ok());
        assert!(PgParam::for_type(&Value::Int(i64::MAX), &Type::INT4).is_err());
        assert!(PgParam::for_type(&Value::Int(i64::MAX), &Type::INT8).is_ok());
    }

    #[test]
    fn parses_uuid_text() {
        let text = Value::from("00000000-0000-7300-8f14-e6ee9ef0c3f1");
        assert!(PgParam::for_type(&text, &Type::UUID).is_ok());
        assert!(PgParam::for_type(&Value::from("nope"), &Type::UUID).is_err());
    }

    #[test]
    fn text_parameters_accept_any_value() {
        assert!(PgParam::for_type(&Value::Int(3), &Type::TEXT).is_ok());
        assert!(PgParam::for_type(&Value::from("a"), &Type::VARCHAR).is_ok());
    }

    #[test]
    fn rejects_incompatible_types() {
        assert!(PgParam::for_type(&Value::from("a"), &Type::INT8).is_err());
    }
}
