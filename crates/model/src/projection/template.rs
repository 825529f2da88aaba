use crate::{core::value::Value, error::TemplateError, records::row::RowData};
use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

lazy_static! {
    static ref PLACEHOLDER: Regex = Regex::new(r"\$\{(.+?)\}").expect("valid placeholder regex");
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    /// Index into `Template::columns`.
    Column(usize),
}

/// Compiled `${column}` template used to project a row into a cache key or value.
///
/// Compiled once at startup and shared read-only afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    source: String,
    segments: Vec<Segment>,
    columns: Vec<String>,
}

impl Template {
    pub fn compile(text: &str) -> Result<Self, TemplateError> {
        let mut segments = Vec::new();
        let mut columns = Vec::new();
        let mut index = 0;

        for caps in PLACEHOLDER.captures_iter(text) {
            let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
                continue;
            };

            if whole.start() > index {
                segments.push(Segment::Literal(text[index..whole.start()].to_string()));
            }
            segments.push(Segment::Column(columns.len()));
            columns.push(name.as_str().to_string());
            index = whole.end();
        }

        if columns.is_empty() {
            return Err(TemplateError::NoPlaceholders(text.to_string()));
        }

        if index < text.len() {
            segments.push(Segment::Literal(text[index..].to_string()));
        }

        Ok(Template {
            source: text.to_string(),
            segments,
            columns,
        })
    }

    /// Column names referenced by the template, in order of appearance.
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// True when the template is a single placeholder with no literal text.
    pub fn is_passthrough(&self) -> bool {
        matches!(self.segments.as_slice(), [Segment::Column(_)])
    }

    /// Renders the template to a string. Missing columns render empty.
    pub fn render(&self, row: &RowData) -> String {
        let mut out = String::with_capacity(self.source.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Column(i) => {
                    if let Some(value) = row.get(&self.columns[*i]) {
                        out.push_str(&value.as_text());
                    }
                }
            }
        }
        out
    }

    /// Renders the template as a value. A passthrough template keeps the
    /// row's native type; anything else is stringified.
    pub fn render_value(&self, row: &RowData) -> Value {
        if self.is_passthrough() {
            return row.get_value(&self.columns[0]);
        }
        Value::String(self.render(row))
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> RowData {
        RowData::from_pairs([("id", Value::Int(1)), ("hello", Value::from("world"))])
    }

    #[test]
    fn rejects_template_without_placeholders() {
        assert_eq!(
            Template::compile("worker"),
            Err(TemplateError::NoPlaceholders("worker".into()))
        );
        assert!(Template::compile("worker:${}").is_err());
    }

    #[test]
    fn renders_keys() {
        let cases = [
            ("worker:${id}", "worker:1"),
            ("worker:${id}:latest", "worker:1:latest"),
            ("worker:${id}:hello:${hello}", "worker:1:hello:world"),
            ("worker:${id}:hello:${hello}:last", "worker:1:hello:world:last"),
            ("${hello}${id}", "world1"),
        ];

        for (text, expected) in cases {
            let template = Template::compile(text).unwrap();
            assert_eq!(template.render(&row()), expected, "template {text}");
        }
    }

    #[test]
    fn collects_columns_in_order() {
        let template = Template::compile("a:${hello}:${id}:${hello}").unwrap();
        assert_eq!(template.columns(), ["hello", "id", "hello"]);
    }

    #[test]
    fn single_placeholder_value_keeps_native_type() {
        let template = Template::compile("${id}").unwrap();
        assert!(template.is_passthrough());
        assert_eq!(template.render_value(&row()), Value::Int(1));

        let template = Template::compile("${hello}").unwrap();
        assert_eq!(template.render_value(&row()), Value::from("world"));
    }

    #[test]
    fn composite_value_is_stringified() {
        let template = Template::compile("worker:${id}:test:${hello}").unwrap();
        assert!(!template.is_passthrough());
        assert_eq!(
            template.render_value(&row()),
            Value::from("worker:1:test:world")
        );
    }

    #[test]
    fn missing_column_renders_empty_or_null() {
        let key = Template::compile("worker:${missing}:key").unwrap();
        assert_eq!(key.render(&row()), "worker::key");

        let value = Template::compile("${missing}").unwrap();
        assert_eq!(value.render_value(&row()), Value::Null);
    }
}
