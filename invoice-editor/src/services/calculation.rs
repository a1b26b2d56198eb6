//! Invoice arithmetic: coercion of raw input, line amounts and totals.
//!
//! Everything here is pure. Bad input never fails; anything that does not
//! start with a number counts as zero, and so does any product, difference or
//! sum that falls outside the decimal range.

use rust_decimal::prelude::FromPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;

use crate::models::{LineItem, LineItemId, Totals};

/// Per-line result of a calculation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LineAmount {
    pub id: LineItemId,
    #[serde(with = "rust_decimal::serde::float")]
    pub quantity: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub rate: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub discount: Decimal,
    /// `quantity * rate - discount`, unclamped.
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Calculation {
    pub lines: Vec<LineAmount>,
    pub totals: Totals,
}

/// Coerce raw user input to a number.
///
/// Uses the longest numeric prefix after leading whitespace, so `"12abc"` is
/// 12, `".5"` is 0.5 and `"1e3"` is 1000. Input with no numeric prefix, or a
/// value outside the decimal range, is zero.
pub fn coerce(raw: &str) -> Decimal {
    parse_prefix(raw.trim_start()).unwrap_or(Decimal::ZERO)
}

fn parse_prefix(s: &str) -> Option<Decimal> {
    let bytes = s.as_bytes();
    let mut pos = 0;

    let negative = match bytes.first() {
        Some(b'-') => {
            pos += 1;
            true
        }
        Some(b'+') => {
            pos += 1;
            false
        }
        _ => false,
    };

    let int_start = pos;
    while pos < bytes.len() && bytes[pos].is_ascii_digit() {
        pos += 1;
    }
    let int_digits = &s[int_start..pos];

    let mut frac_digits = "";
    if pos < bytes.len() && bytes[pos] == b'.' {
        let frac_start = pos + 1;
        let mut end = frac_start;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        frac_digits = &s[frac_start..end];
        pos = end;
    }

    if int_digits.is_empty() && frac_digits.is_empty() {
        return None;
    }

    let mut exponent: i64 = 0;
    if pos < bytes.len() && (bytes[pos] == b'e' || bytes[pos] == b'E') {
        let mut end = pos + 1;
        let exp_negative = match bytes.get(end) {
            Some(b'-') => {
                end += 1;
                true
            }
            Some(b'+') => {
                end += 1;
                false
            }
            _ => false,
        };
        let digits_start = end;
        while end < bytes.len() && bytes[end].is_ascii_digit() {
            end += 1;
        }
        // An exponent marker without digits is not part of the number.
        if end > digits_start {
            let magnitude: i64 = s[digits_start..end].parse().unwrap_or(i64::MAX);
            exponent = if exp_negative { -magnitude } else { magnitude };
        }
    }

    let mut mantissa = if int_digits.is_empty() {
        "0".to_string()
    } else {
        int_digits.to_string()
    };
    if !frac_digits.is_empty() {
        mantissa.push('.');
        mantissa.push_str(frac_digits);
    }

    let value = match mantissa.parse::<Decimal>() {
        Ok(value) => value,
        // Too many significant digits for a decimal; settle for float precision.
        Err(_) => Decimal::from_f64(mantissa.parse::<f64>().ok()?)?,
    };
    let value = apply_exponent(value, exponent)?;

    Some(if negative { -value } else { value })
}

fn apply_exponent(mut value: Decimal, exponent: i64) -> Option<Decimal> {
    let ten = Decimal::TEN;
    if exponent >= 0 {
        for _ in 0..exponent {
            if value.is_zero() {
                break;
            }
            value = value.checked_mul(ten)?;
        }
    } else {
        for _ in 0..exponent.unsigned_abs() {
            if value.is_zero() {
                break;
            }
            value = value.checked_div(ten).unwrap_or(Decimal::ZERO);
        }
    }
    Some(value.normalize())
}

fn mul_or_zero(a: Decimal, b: Decimal) -> Decimal {
    a.checked_mul(b).unwrap_or(Decimal::ZERO)
}

fn add_or_zero(a: Decimal, b: Decimal) -> Decimal {
    a.checked_add(b).unwrap_or(Decimal::ZERO)
}

fn sub_or_zero(a: Decimal, b: Decimal) -> Decimal {
    a.checked_sub(b).unwrap_or(Decimal::ZERO)
}

/// `quantity * rate - discount` for one item. Overflow counts as zero, like
/// any other unrepresentable input.
pub fn line_amount(item: &LineItem) -> Decimal {
    price_line(item).amount
}

fn price_line(item: &LineItem) -> LineAmount {
    let quantity = coerce(&item.quantity);
    let rate = coerce(&item.rate);
    let discount = coerce(&item.discount);

    LineAmount {
        id: item.id,
        quantity,
        rate,
        discount,
        amount: sub_or_zero(mul_or_zero(quantity, rate), discount),
    }
}

/// Compute per-line amounts and invoice totals.
///
/// A running sum that overflows restarts from zero.
pub fn calculate(items: &[LineItem]) -> Calculation {
    let mut totals = Totals::default();

    let lines = items
        .iter()
        .map(|item| {
            let line = price_line(item);
            totals.subtotal = add_or_zero(totals.subtotal, mul_or_zero(line.quantity, line.rate));
            totals.discount = add_or_zero(totals.discount, line.discount);
            line
        })
        .collect();

    totals.total = sub_or_zero(totals.subtotal, totals.discount);

    Calculation { lines, totals }
}

/// Format an amount with thousands separators and exactly two fraction digits,
/// e.g. `1,234.50`. Midpoints round away from zero.
pub fn format_money(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let fixed = format!("{:.2}", rounded.abs());

    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    format!("{}{}.{}", if negative { "-" } else { "" }, grouped, frac_part)
}
