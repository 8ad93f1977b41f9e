//! Console encoder that appends a record's key/value pairs after the
//! pattern output, e.g. `... HTTP request request_id=4f1c.. method=GET`.
//!
//! Values containing whitespace or quotes are written as quoted strings so
//! audit lines with headers and bodies stay parseable.

use std::io;

use log::{
    Record,
    kv::{Error, Key, Value, VisitSource},
};
use log4rs::encode::pattern::PatternEncoder;
use log4rs::encode::{Color, Encode, Style, Write};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct StructuredConsoleEncoderConfig {
    pub pattern: Option<String>,
    pub colored: Option<bool>,
}

#[derive(Debug)]
pub struct StructuredConsoleEncoder {
    delegate: PatternEncoder,
    colored: bool,
}

impl StructuredConsoleEncoder {
    pub fn new(pattern: &str, colored: bool) -> Self {
        Self {
            delegate: PatternEncoder::new(pattern),
            colored,
        }
    }
}

impl Encode for StructuredConsoleEncoder {
    fn encode(&self, w: &mut dyn Write, record: &Record) -> anyhow::Result<()> {
        self.delegate.encode(w, record)?;

        let mut visitor = KeyValueWriter {
            writer: w,
            colored: self.colored,
            io_err: None,
        };

        if let Err(kv_err) = record.key_values().visit(&mut visitor) {
            if let Some(io_err) = visitor.io_err {
                return Err(io_err.into());
            }
            write!(w, " [KV Error: {}]", kv_err)?;
        }

        w.write_all(b"\n")?;
        Ok(())
    }
}

/// Formats a value, quoting it when it would otherwise be ambiguous.
fn render_value(value: &str) -> String {
    if value.is_empty() || value.chars().any(|c| c.is_whitespace() || c == '"' || c == '=') {
        format!("{:?}", value)
    } else {
        value.to_string()
    }
}

struct KeyValueWriter<'a> {
    writer: &'a mut dyn Write,
    colored: bool,
    io_err: Option<io::Error>,
}

impl KeyValueWriter<'_> {
    fn write_pair(&mut self, key: &str, value: &str) -> io::Result<()> {
        if self.colored {
            self.writer.set_style(Style::new().text(Color::Cyan))?;
        }
        write!(self.writer, " {}=", key)?;
        if self.colored {
            self.writer.set_style(&Style::default())?;
        }
        write!(self.writer, "{}", render_value(value))
    }
}

impl<'kvs> VisitSource<'kvs> for KeyValueWriter<'_> {
    fn visit_pair(&mut self, key: Key<'kvs>, value: Value<'kvs>) -> Result<(), Error> {
        if let Err(e) = self.write_pair(key.as_str(), &value.to_string()) {
            self.io_err = Some(e);
            return Err(Error::msg("io error during visit"));
        }

        Ok(())
    }
}

pub struct StructuredConsoleEncoderDeserializer;

impl log4rs::config::Deserialize for StructuredConsoleEncoderDeserializer {
    type Trait = dyn Encode;
    type Config = StructuredConsoleEncoderConfig;

    fn deserialize(
        &self,
        config: StructuredConsoleEncoderConfig,
        _: &log4rs::config::Deserializers,
    ) -> anyhow::Result<Box<dyn Encode>> {
        let pattern = config.pattern.as_deref().unwrap_or("{d} {l} {t} - {m}");
        Ok(Box::new(StructuredConsoleEncoder::new(pattern, config.colored.unwrap_or(true))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_value_quotes_when_needed() {
        assert_eq!(render_value("GET"), "GET");
        assert_eq!(render_value("accept: application/json"), "\"accept: application/json\"");
        assert_eq!(render_value(r#"{"a":1}"#), r#""{\"a\":1}""#);
        assert_eq!(render_value(""), "\"\"");
    }
}
