//! printf-style formatting with locale-aware separators
//!
//! Supported: `%[-+ 0,(][width][.precision](d|x|X|o|f|e|E|s|S|%|n)` with
//! literal text around the specifier. Exactly one specifier may consume the
//! value.

use crate::error::{Error, Result};
use crate::locale::Locale;
use crate::model::Value;

/// Largest width or precision a format may ask for
const MAX_FIELD: usize = 4096;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Flags {
    left: bool,
    plus: bool,
    space: bool,
    zero: bool,
    group: bool,
    paren: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Spec {
    flags: Flags,
    width: Option<usize>,
    precision: Option<usize>,
    conversion: char,
}

/// Format `value` according to `format` using `locale` separators
pub fn format(format: &str, value: &Value, locale: &Locale) -> Result<String> {
    let fail = |reason: String| Error::render(format, value.type_name(), reason);

    let mut out = String::new();
    let mut consumed = false;
    let mut chars = format.char_indices().peekable();

    while let Some((_, c)) = chars.next() {
        if c != '%' {
            out.push(c);
            continue;
        }

        let mut flags = Flags::default();
        while let Some(&(_, f)) = chars.peek() {
            match f {
                '-' => flags.left = true,
                '+' => flags.plus = true,
                ' ' => flags.space = true,
                '0' => flags.zero = true,
                ',' => flags.group = true,
                '(' => flags.paren = true,
                _ => break,
            }
            chars.next();
        }

        let width = take_number(&mut chars).map_err(fail)?;
        let precision = match chars.peek() {
            Some(&(_, '.')) => {
                chars.next();
                Some(
                    take_number(&mut chars)
                        .map_err(fail)?
                        .ok_or_else(|| fail("precision expected after '.'".to_string()))?,
                )
            }
            _ => None,
        };

        let conversion = chars
            .next()
            .map(|(_, c)| c)
            .ok_or_else(|| fail("format ends inside a specifier".to_string()))?;

        let spec = Spec {
            flags,
            width,
            precision,
            conversion,
        };

        match conversion {
            '%' => out.push('%'),
            'n' => out.push('\n'),
            'd' | 'x' | 'X' | 'o' | 'f' | 'e' | 'E' | 's' | 'S' => {
                if consumed {
                    return Err(fail("only one value is available to format".to_string()));
                }
                consumed = true;
                out.push_str(&apply(&spec, value, locale).map_err(fail)?);
            }
            other => return Err(fail(format!("unknown conversion '{}'", other))),
        }
    }

    Ok(out)
}

fn take_number(
    chars: &mut std::iter::Peekable<std::str::CharIndices<'_>>,
) -> std::result::Result<Option<usize>, String> {
    let mut digits = String::new();
    while let Some(&(_, c)) = chars.peek() {
        if !c.is_ascii_digit() {
            break;
        }
        digits.push(c);
        chars.next();
    }
    if digits.is_empty() {
        return Ok(None);
    }
    match digits.parse::<usize>() {
        Ok(n) if n <= MAX_FIELD => Ok(Some(n)),
        _ => Err(format!("field size {} is larger than {}", digits, MAX_FIELD)),
    }
}

fn apply(spec: &Spec, value: &Value, locale: &Locale) -> std::result::Result<String, String> {
    match spec.conversion {
        'd' => {
            let n = integer(value, 'd')?;
            let digits = n.unsigned_abs().to_string();
            let digits = if spec.flags.group {
                group(&digits, locale)
            } else {
                digits
            };
            Ok(signed(spec, n < 0, digits))
        }
        'x' | 'X' | 'o' => {
            let n = integer(value, spec.conversion)?;
            if spec.flags.group || spec.flags.plus || spec.flags.space || spec.flags.paren {
                return Err(format!(
                    "flags other than '-' and '0' are not allowed with %{}",
                    spec.conversion
                ));
            }
            let bits = n as u64;
            let digits = match spec.conversion {
                'x' => format!("{:x}", bits),
                'X' => format!("{:X}", bits),
                _ => format!("{:o}", bits),
            };
            Ok(signed(spec, false, digits))
        }
        'f' => {
            let x = float(value, 'f')?;
            if !x.is_finite() {
                return Ok(pad(spec, non_finite(x)));
            }
            let fixed = fixed_half_up(x.abs(), spec.precision.unwrap_or(6));
            let (int_part, frac_part) = match fixed.split_once('.') {
                Some((i, f)) => (i.to_string(), Some(f.to_string())),
                None => (fixed.clone(), None),
            };
            let mut body = if spec.flags.group {
                group(&int_part, locale)
            } else {
                int_part
            };
            if let Some(frac) = frac_part {
                body.push(locale.decimal_separator());
                body.push_str(&frac);
            }
            Ok(signed(spec, x.is_sign_negative() && x != 0.0, body))
        }
        'e' | 'E' => {
            if spec.flags.group {
                return Err("',' flag is not allowed with %e".to_string());
            }
            let x = float(value, spec.conversion)?;
            if !x.is_finite() {
                return Ok(pad(spec, non_finite(x)));
            }
            let sci = format!("{:.*e}", spec.precision.unwrap_or(6), x.abs());
            let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
            let exponent: i32 = exponent.parse().unwrap_or(0);
            let mantissa = mantissa.replace('.', &locale.decimal_separator().to_string());
            let mut body = format!(
                "{}e{}{:02}",
                mantissa,
                if exponent < 0 { '-' } else { '+' },
                exponent.unsigned_abs()
            );
            if spec.conversion == 'E' {
                body = body.to_uppercase();
            }
            Ok(signed(spec, x.is_sign_negative() && x != 0.0, body))
        }
        's' | 'S' => {
            if spec.flags.zero || spec.flags.group || spec.flags.plus || spec.flags.paren {
                return Err(format!("numeric flags are not allowed with %{}", spec.conversion));
            }
            let mut text = value.to_string();
            if let Some(limit) = spec.precision {
                text = text.chars().take(limit).collect();
            }
            if spec.conversion == 'S' {
                text = text.to_uppercase();
            }
            Ok(pad(spec, text))
        }
        other => Err(format!("unknown conversion '{}'", other)),
    }
}

fn integer(value: &Value, conversion: char) -> std::result::Result<i64, String> {
    match value {
        Value::Int(n) => Ok(*n),
        other => Err(format!(
            "%{} requires an integer, not {}",
            conversion,
            other.type_name()
        )),
    }
}

fn float(value: &Value, conversion: char) -> std::result::Result<f64, String> {
    match value {
        Value::Float(x) => Ok(*x),
        Value::Int(n) => Ok(*n as f64),
        other => Err(format!(
            "%{} requires a number, not {}",
            conversion,
            other.type_name()
        )),
    }
}

/// `x` with `precision` fraction digits, rounding half up from the shortest
/// decimal form of `x` so `0.125` becomes `0.13`
fn fixed_half_up(x: f64, precision: usize) -> String {
    let sci = format!("{:e}", x);
    let (mantissa, exponent) = sci.split_once('e').unwrap_or((sci.as_str(), "0"));
    let exponent: i64 = exponent.parse().unwrap_or(0);

    // digits[..point] is the integer part
    let mut digits: Vec<u8> = mantissa
        .bytes()
        .filter(u8::is_ascii_digit)
        .map(|b| b - b'0')
        .collect();
    let mut point = exponent + 1;
    if point < 1 {
        let mut padded = vec![0; (1 - point) as usize];
        padded.append(&mut digits);
        digits = padded;
        point = 1;
    }
    let mut point = point as usize;

    let keep = point + precision;
    if digits.len() < keep {
        digits.resize(keep, 0);
    }
    let round_up = digits.get(keep).is_some_and(|&d| d >= 5);
    digits.truncate(keep);
    if round_up {
        let mut carry = true;
        for d in digits.iter_mut().rev() {
            if *d == 9 {
                *d = 0;
            } else {
                *d += 1;
                carry = false;
                break;
            }
        }
        if carry {
            digits.insert(0, 1);
            point += 1;
        }
    }

    let to_char = |d: &u8| char::from(b'0' + d);
    let int_part: String = digits[..point].iter().map(to_char).collect();
    let int_part = match int_part.trim_start_matches('0') {
        "" => "0",
        trimmed => trimmed,
    };
    if precision == 0 {
        int_part.to_string()
    } else {
        let frac: String = digits[point..].iter().map(to_char).collect();
        format!("{}.{}", int_part, frac)
    }
}

fn non_finite(x: f64) -> String {
    if x.is_nan() {
        "NaN".to_string()
    } else if x > 0.0 {
        "Infinity".to_string()
    } else {
        "-Infinity".to_string()
    }
}

/// Insert the locale's grouping separator every `grouping_size` digits
fn group(digits: &str, locale: &Locale) -> String {
    let Some(sep) = locale.grouping_separator() else {
        return digits.to_string();
    };
    let size = locale.grouping_size();
    let count = digits.chars().count();
    let mut out = String::with_capacity(digits.len() + count / size);
    for (idx, c) in digits.chars().enumerate() {
        if idx > 0 && (count - idx) % size == 0 {
            out.push(sep);
        }
        out.push(c);
    }
    out
}

/// Attach sign decorations, then pad to width
fn signed(spec: &Spec, negative: bool, body: String) -> String {
    let (prefix, suffix) = match (negative, spec.flags.paren) {
        (true, true) => ("(", ")"),
        (true, false) => ("-", ""),
        (false, _) if spec.flags.plus => ("+", ""),
        (false, _) if spec.flags.space => (" ", ""),
        _ => ("", ""),
    };

    let len = prefix.chars().count() + body.chars().count() + suffix.chars().count();
    match spec.width {
        Some(width) if spec.flags.zero && !spec.flags.left && len < width => {
            format!("{}{}{}{}", prefix, "0".repeat(width - len), body, suffix)
        }
        _ => pad(spec, format!("{}{}{}", prefix, body, suffix)),
    }
}

fn pad(spec: &Spec, text: String) -> String {
    let len = text.chars().count();
    match spec.width {
        Some(width) if len < width => {
            let fill = " ".repeat(width - len);
            if spec.flags.left {
                format!("{}{}", text, fill)
            } else {
                format!("{}{}", fill, text)
            }
        }
        _ => text,
    }
}
