//! Locale-aware number rendering

use crate::error::{Error, Result};
use crate::locale::Locale;
use crate::model::Value;

use super::{printf, AttributeRenderer};

/// Renders integers and floats through printf-style formats
///
/// Without a format the value's plain decimal form is used.
#[derive(Debug, Clone, Copy, Default)]
pub struct NumberRenderer;

impl AttributeRenderer for NumberRenderer {
    fn render(&self, value: &Value, format: Option<&str>, locale: &Locale) -> Result<String> {
        match (value, format) {
            (Value::Int(_) | Value::Float(_), None) => Ok(value.to_string()),
            (Value::Int(_) | Value::Float(_), Some(format)) => printf::format(format, value, locale),
            (other, format) => Err(Error::render(
                format.unwrap_or(""),
                other.type_name(),
                "not a number",
            )),
        }
    }
}
