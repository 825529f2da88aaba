use crate::core::value::Value;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FieldValue {
    pub name: String,
    pub value: Value,
}

/// One fetched source record, keyed by column name.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RowData {
    pub field_values: Vec<FieldValue>,
}

impl RowData {
    pub fn new(field_values: Vec<FieldValue>) -> Self {
        RowData { field_values }
    }

    /// Builds a row from `(column, value)` pairs, preserving order.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let field_values = pairs
            .into_iter()
            .map(|(name, value)| FieldValue {
                name: name.into(),
                value: value.into(),
            })
            .collect();
        RowData { field_values }
    }

    /// Looks up a column by its exact result-set name.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.field_values
            .iter()
            .find(|f| f.name == field)
            .map(|f| &f.value)
    }

    /// Returns the column value, or `Value::Null` when the column is absent.
    pub fn get_value(&self, field: &str) -> Value {
        self.get(field).cloned().unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_is_case_sensitive() {
        let row = RowData::from_pairs([("ID", 1i64), ("partition_key", 2i64)]);
        assert_eq!(row.get("ID"), Some(&Value::Int(1)));
        assert_eq!(row.get("id"), None);
        assert_eq!(row.get("Partition_Key"), None);
    }

    #[test]
    fn missing_column_is_null() {
        let row = RowData::from_pairs([("id", 1i64)]);
        assert!(row.get("partition").is_none());
        assert_eq!(row.get_value("partition"), Value::Null);
    }
}
