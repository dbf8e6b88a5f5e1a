//! Exact decimal extraction from document fields.
//!
//! The scale of the source text is kept: `"17.880"` reads as a decimal
//! with 3 fractional digits, equal to but distinguishable from `"17.88"`.

use rust_decimal::Decimal;

use super::element::Element;
use super::error::FacturaeError;

/// Read the decimal at `path` below `elem`.
///
/// A missing element or empty text is a hard [`FacturaeError::MissingField`],
/// never zero.
pub fn decimal(elem: &Element, path: &str) -> Result<Decimal, FacturaeError> {
    let text = elem
        .text_at(path)
        .ok_or_else(|| missing_field(elem, path))?;
    parse_decimal(&field_path(elem, path), text)
}

/// Read the decimal at `path` if the element exists.
///
/// Returns `Ok(None)` when the element is absent; an element that is
/// present but empty or malformed is still an error.
pub fn optional_decimal(elem: &Element, path: &str) -> Result<Option<Decimal>, FacturaeError> {
    if elem.find_path(path).is_none() {
        return Ok(None);
    }
    decimal(elem, path).map(Some)
}

/// Parse decimal text, keeping its scale.
///
/// Only signs, digits, one decimal point and an exponent are accepted.
/// Text that cannot be held without rounding (more than 28 fractional
/// digits, or more than 96 bits of mantissa) is rejected, never rounded.
pub fn parse_decimal(path: &str, text: &str) -> Result<Decimal, FacturaeError> {
    let trimmed = text.trim();
    let well_formed = !trimmed.is_empty()
        && trimmed
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'));

    let parsed = if well_formed {
        match trimmed.split_once(['e', 'E']) {
            Some((mantissa, exponent)) => scientific_exact(mantissa, exponent),
            None => Decimal::from_str_exact(trimmed).ok(),
        }
    } else {
        None
    };

    parsed.ok_or_else(|| FacturaeError::InvalidValue {
        path: path.to_string(),
        value: text.to_string(),
        expected: "decimal",
    })
}

/// `mantissa × 10^exponent`, or `None` when it does not fit exactly.
fn scientific_exact(mantissa: &str, exponent: &str) -> Option<Decimal> {
    let mantissa = Decimal::from_str_exact(mantissa).ok()?;
    let exponent: i64 = exponent.parse().ok()?;
    let scale = i64::from(mantissa.scale()) - exponent;
    if scale >= 0 {
        Decimal::try_from_i128_with_scale(mantissa.mantissa(), u32::try_from(scale).ok()?).ok()
    } else {
        let factor = 10i128.checked_pow(u32::try_from(-scale).ok()?)?;
        Decimal::try_from_i128_with_scale(mantissa.mantissa().checked_mul(factor)?, 0).ok()
    }
}

/// Number of fractional digits carried by `value`.
pub fn decimal_places(value: &Decimal) -> u32 {
    value.scale()
}

pub(crate) fn field_path(elem: &Element, path: &str) -> String {
    format!("{}/{}", elem.tag(), path)
}

pub(crate) fn missing_field(elem: &Element, path: &str) -> FacturaeError {
    FacturaeError::MissingField {
        path: field_path(elem, path),
    }
}

pub(crate) fn checked_add(a: Decimal, b: Decimal) -> Result<Decimal, FacturaeError> {
    a.checked_add(b)
        .ok_or_else(|| FacturaeError::Arithmetic(format!("overflow adding {a} and {b}")))
}

pub(crate) fn checked_sub(a: Decimal, b: Decimal) -> Result<Decimal, FacturaeError> {
    a.checked_sub(b)
        .ok_or_else(|| FacturaeError::Arithmetic(format!("overflow subtracting {b} from {a}")))
}
