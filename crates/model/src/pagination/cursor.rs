use crate::{core::value::Value, error::CursorError};
use serde::{Deserialize, Serialize};
use std::{borrow::Cow, cmp::Ordering, fmt, str::FromStr};
use uuid::Uuid;

/// Declared type of the progress column.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CursorType {
    Int64,
    Int32,
    Int,
    String,
    Uuid,
}

/// Operand after coercion into the cursor's comparison domain.
enum Coerced<'a> {
    Int(i64),
    Text(Cow<'a, str>),
}

impl CursorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CursorType::Int64 => "int64",
            CursorType::Int32 => "int32",
            CursorType::Int => "int",
            CursorType::String => "string",
            CursorType::Uuid => "uuid",
        }
    }

    fn is_integer(&self) -> bool {
        matches!(self, CursorType::Int64 | CursorType::Int32 | CursorType::Int)
    }

    /// Parses the external textual form (e.g. a persisted cursor) into a value.
    pub fn convert(&self, text: &str) -> Result<Value, CursorError> {
        let fail = |reason: String| CursorError::Conversion {
            cursor_type: self.as_str().to_string(),
            input: text.to_string(),
            reason,
        };

        match self {
            CursorType::Int64 | CursorType::Int => text
                .parse::<i64>()
                .map(Value::Int)
                .map_err(|e| fail(e.to_string())),
            CursorType::Int32 => text
                .parse::<i32>()
                .map(|v| Value::Int(v as i64))
                .map_err(|e| fail(e.to_string())),
            CursorType::String => Ok(Value::String(text.to_string())),
            CursorType::Uuid => Uuid::parse_str(text)
                .map(|_| Value::String(text.to_string()))
                .map_err(|e| fail(e.to_string())),
        }
    }

    /// Total order over the declared type. Numeric types compare numerically,
    /// `string` and `uuid` compare byte-wise.
    pub fn compare(&self, a: &Value, b: &Value) -> Result<Ordering, CursorError> {
        let mismatch = || CursorError::Mismatch {
            cursor_type: self.as_str().to_string(),
            left: format!("{a} ({})", a.type_name()),
            right: format!("{b} ({})", b.type_name()),
        };

        match (self.coerce(a), self.coerce(b)) {
            (Some(Coerced::Int(x)), Some(Coerced::Int(y))) => Ok(x.cmp(&y)),
            (Some(Coerced::Text(x)), Some(Coerced::Text(y))) => {
                Ok(x.as_bytes().cmp(y.as_bytes()))
            }
            _ => Err(mismatch()),
        }
    }

    fn coerce<'a>(&self, value: &'a Value) -> Option<Coerced<'a>> {
        match (self, value) {
            (t, Value::Int(v)) if t.is_integer() => Some(Coerced::Int(*v)),
            (CursorType::String, Value::String(s)) => Some(Coerced::Text(Cow::Borrowed(s))),
            (CursorType::Uuid, Value::String(s)) => Some(Coerced::Text(Cow::Borrowed(s))),
            (CursorType::Uuid, Value::Uuid(u)) => {
                Some(Coerced::Text(Cow::Owned(u.hyphenated().to_string())))
            }
            _ => None,
        }
    }
}

impl FromStr for CursorType {
    type Err = CursorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "int64" => Ok(CursorType::Int64),
            "int32" => Ok(CursorType::Int32),
            "int" => Ok(CursorType::Int),
            "string" => Ok(CursorType::String),
            "uuid" => Ok(CursorType::Uuid),
            other => Err(CursorError::UnsupportedType(other.to_string())),
        }
    }
}

impl fmt::Display for CursorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static description of the progress column, loaded once at startup.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct CursorDescriptor {
    pub column: String,
    pub cursor_type: CursorType,
    pub default: Value,
}

impl CursorDescriptor {
    pub fn new(column: &str, type_name: &str, default_literal: &str) -> Result<Self, CursorError> {
        let cursor_type = CursorType::from_str(type_name)?;
        let default = cursor_type.convert(default_literal)?;

        Ok(CursorDescriptor {
            column: column.to_string(),
            cursor_type,
            default,
        })
    }

    pub fn compare(&self, a: &Value, b: &Value) -> Result<Ordering, CursorError> {
        self.cursor_type.compare(a, b)
    }

    pub fn convert(&self, text: &str) -> Result<Value, CursorError> {
        self.cursor_type.convert(text)
    }

    /// Persisted textual form of a cursor value.
    pub fn format(&self, value: &Value) -> String {
        value.as_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unknown_type() {
        let err = CursorDescriptor::new("id", "float", "0").unwrap_err();
        assert_eq!(err, CursorError::UnsupportedType("float".into()));
    }

    #[test]
    fn converts_default_into_declared_type() {
        let desc = CursorDescriptor::new("id", "int64", "-1").unwrap();
        assert_eq!(desc.default, Value::Int(-1));
        assert_eq!(desc.cursor_type, CursorType::Int64);
    }

    #[test]
    fn bad_default_is_a_conversion_error() {
        let err = CursorDescriptor::new("id", "int64", "abc").unwrap_err();
        assert!(matches!(err, CursorError::Conversion { .. }));
    }

    #[test]
    fn int32_conversion_is_range_checked() {
        assert_eq!(CursorType::Int32.convert("2147483647"), Ok(Value::Int(i32::MAX as i64)));
        assert!(CursorType::Int32.convert("2147483648").is_err());
        assert!(CursorType::Int64.convert("2147483648").is_ok());
    }

    #[test]
    fn uuid_conversion_validates_but_keeps_text() {
        let text = "00000000-0000-7300-8f14-e6ee9ef0c3f1";
        assert_eq!(CursorType::Uuid.convert(text), Ok(Value::String(text.into())));
        assert!(CursorType::Uuid.convert("not-a-uuid").is_err());
    }

    #[test]
    fn integers_compare_numerically() {
        let t = CursorType::Int64;
        assert_eq!(t.compare(&Value::Int(9), &Value::Int(10)), Ok(Ordering::Less));
        assert_eq!(t.compare(&Value::Int(-1), &Value::Int(-1)), Ok(Ordering::Equal));
        assert_eq!(t.compare(&Value::Int(3), &Value::Int(2)), Ok(Ordering::Greater));
    }

    #[test]
    fn strings_compare_lexicographically() {
        let t = CursorType::String;
        assert_eq!(
            t.compare(&Value::from("9"), &Value::from("10")),
            Ok(Ordering::Greater)
        );
    }

    #[test]
    fn uuid_accepts_native_and_text_operands() {
        let t = CursorType::Uuid;
        let native = Value::Uuid(Uuid::parse_str("01926cc6-6430-7359-8ba1-02f348b55d36").unwrap());
        let text = Value::from("01926cc4-cece-72d3-b801-abcb74b68556");
        assert_eq!(t.compare(&text, &native), Ok(Ordering::Less));
    }

    #[test]
    fn mismatched_operand_is_an_error_not_a_panic() {
        let t = CursorType::Int64;
        let err = t.compare(&Value::Int(1), &Value::from("2")).unwrap_err();
        assert!(matches!(err, CursorError::Mismatch { .. }));
        assert!(t.compare(&Value::Int(1), &Value::Float(2.0)).is_err());
        assert!(CursorType::String.compare(&Value::Int(1), &Value::from("a")).is_err());
    }

    #[test]
    fn format_round_trips_through_convert() {
        let desc = CursorDescriptor::new("id", "int", "0").unwrap();
        let text = desc.format(&Value::Int(42));
        assert_eq!(desc.convert(&text), Ok(Value::Int(42)));
    }
}
