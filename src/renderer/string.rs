//! Case conversion, XML escaping and `%s` formatting for strings

use crate::error::{Error, Result};
use crate::locale::Locale;
use crate::model::Value;

use super::{printf, AttributeRenderer};

/// Renders strings with `upper`, `lower`, `cap`, `xml-encode` or a `%s` format
#[derive(Debug, Clone, Copy, Default)]
pub struct StringRenderer;

impl AttributeRenderer for StringRenderer {
    fn render(&self, value: &Value, format: Option<&str>, locale: &Locale) -> Result<String> {
        let text = value.to_string();
        let Some(format) = format else {
            return Ok(text);
        };

        match format {
            "upper" => Ok(text.to_uppercase()),
            "lower" => Ok(text.to_lowercase()),
            "cap" => {
                let mut chars = text.chars();
                Ok(match chars.next() {
                    Some(first) => first.to_uppercase().chain(chars).collect(),
                    None => String::new(),
                })
            }
            "xml-encode" => Ok(xml_encode(&text)),
            f if f.contains('%') => printf::format(f, value, locale),
            other => Err(Error::render(other, value.type_name(), "unknown string format")),
        }
    }
}

fn xml_encode(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(text: &str, format: &str) -> Result<String> {
        StringRenderer.render(&Value::from(text), Some(format), &Locale::root())
    }

    #[test]
    fn test_case_formats() {
        assert_eq!(render("parrt", "upper").unwrap(), "PARRT");
        assert_eq!(render("PARRT", "lower").unwrap(), "parrt");
        assert_eq!(render("parrt", "cap").unwrap(), "Parrt");
        assert_eq!(render("", "cap").unwrap(), "");
    }

    #[test]
    fn test_xml_encode() {
        assert_eq!(
            render("<a href=\"x\">&</a>", "xml-encode").unwrap(),
            "&lt;a href=&quot;x&quot;&gt;&amp;&lt;/a&gt;"
        );
    }

    #[test]
    fn test_printf_string() {
        assert_eq!(render("ab", "%-4s|").unwrap(), "ab  |");
    }

    #[test]
    fn test_unknown_format_fails() {
        assert!(matches!(
            render("x", "shout"),
            Err(Error::Render { .. })
        ));
    }
}
