//! Money type and pt-BR currency formatting/parsing.
//!
//! # Responsibility
//! - Represent monetary amounts as integer centavos.
//! - Render amounts the way the CRM screens display them (`160.000,00`).
//! - Parse what a user types into a currency field back into centavos.
//!
//! # Invariants
//! - Amounts never pass through floating point.
//! - Parsing treats the first comma as the decimal separator; dots are
//!   thousand separators and are discarded.

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

const CENTS_PER_REAL: i64 = 100;
const MAX_FRACTION_DIGITS: usize = 2;

/// Monetary amount in centavos (1/100 BRL).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    pub const fn from_reais(reais: i64) -> Self {
        Self(reais * CENTS_PER_REAL)
    }

    pub const fn cents(self) -> i64 {
        self.0
    }

    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }
}

impl Display for Money {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&format_brl(*self))
    }
}

/// Formats an amount with pt-BR grouping and exactly two decimals.
///
/// `160000,00` reais -> `160.000,00`.
pub fn format_currency_display(value: Money) -> String {
    let (sign, reais, cents) = split(value);
    format!("{sign}{},{cents:02}", group_thousands(reais))
}

/// Formats an amount as `R$ 160.000,00`.
pub fn format_brl(value: Money) -> String {
    let (sign, reais, cents) = split(value);
    format!("{sign}R$ {},{cents:02}", group_thousands(reais))
}

/// Formats an amount as `R$ 160.000`, keeping the fraction only when it is
/// not zero (`R$ 1.234,5`, `R$ 1.234,56`).
pub fn format_brl_compact(value: Money) -> String {
    let (sign, reais, cents) = split(value);
    let grouped = group_thousands(reais);
    match cents {
        0 => format!("{sign}R$ {grouped}"),
        c if c % 10 == 0 => format!("{sign}R$ {grouped},{}", c / 10),
        c => format!("{sign}R$ {grouped},{c:02}"),
    }
}

/// Formats an optional amount, rendering missing or zero values as `-`.
pub fn format_brl_or_dash(value: Option<Money>) -> String {
    match value {
        Some(amount) if amount != Money::ZERO => format_brl(amount),
        _ => "-".to_string(),
    }
}

/// Normalizes raw keystrokes of a currency field.
///
/// Keeps digits and a single comma, and caps the fraction at two digits.
pub fn sanitize_currency_input(raw: &str) -> String {
    let kept: String = raw
        .chars()
        .filter(|ch| ch.is_ascii_digit() || *ch == ',')
        .collect();

    match kept.find(',') {
        Some(comma) => {
            let before = &kept[..comma];
            let after: String = kept[comma + 1..]
                .chars()
                .filter(|ch| *ch != ',')
                .take(MAX_FRACTION_DIGITS)
                .collect();
            format!("{before},{after}")
        }
        None => kept,
    }
}

/// Parses a formatted currency string (`160.000,00`, `R$ 1.500`, `12,5`).
///
/// Returns `None` for input without digits. Fraction digits beyond the second
/// are rounded half-up into centavos; text after a second comma is ignored.
pub fn parse_currency_value(formatted: &str) -> Option<Money> {
    let clean: String = formatted
        .chars()
        .filter(|ch| ch.is_ascii_digit() || *ch == ',')
        .collect();
    if clean.is_empty() {
        return None;
    }

    let mut parts = clean.splitn(2, ',');
    let integer_part = parts.next().unwrap_or_default();
    let fraction_part = parts
        .next()
        .map(|rest| rest.split(',').next().unwrap_or_default())
        .unwrap_or_default();

    if integer_part.is_empty() && fraction_part.is_empty() {
        return None;
    }

    let reais = if integer_part.is_empty() {
        0
    } else {
        integer_part.parse::<i64>().ok()?
    };

    let digits: Vec<i64> = fraction_part
        .bytes()
        .map(|byte| i64::from(byte - b'0'))
        .collect();
    let tenths = digits.first().copied().unwrap_or(0);
    let hundredths = digits.get(1).copied().unwrap_or(0);
    let round_up = digits.get(2).is_some_and(|digit| *digit >= 5);
    let cents = tenths * 10 + hundredths + i64::from(round_up);

    reais
        .checked_mul(CENTS_PER_REAL)
        .and_then(|value| value.checked_add(cents))
        .map(Money::from_cents)
}

fn split(value: Money) -> (&'static str, u64, u64) {
    let sign = if value.0 < 0 { "-" } else { "" };
    let abs = value.0.unsigned_abs();
    (sign, abs / 100, abs % 100)
}

fn group_thousands(value: u64) -> String {
    let digits = value.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, ch) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            grouped.push('.');
        }
        grouped.push(ch);
    }
    grouped
}
