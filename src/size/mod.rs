//! Conversion between byte counts and human-readable resource-quantity
//! strings, covering the SI decimal (k=10^3 .. E=10^18) and binary
//! (Ki=2^10 .. Ei=2^60) unit families.

use lazy_static::lazy_static;
use regex::Regex;

use crate::core::{RuntimeError, RuntimeResult};

const SI_BASE: i64 = 1000;
const BINARY_BASE: i64 = 1024;

const SI_SUFFIXES: [&str; 7] = ["B", "kB", "MB", "GB", "TB", "PB", "EB"];
const BINARY_SUFFIXES: [&str; 7] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB", "EiB"];

/// Lowercased unit letters, index = power of the base minus one.
const UNIT_LETTERS: [char; 6] = ['k', 'm', 'g', 't', 'p', 'e'];

lazy_static! {
    static ref QUANTITY_PATTERN: Regex =
        Regex::new(r"^\s*([+-]?[0-9]*\.?[0-9]+(?:[eE][+-]?[0-9]+)?)\s*([a-zA-Z]*)\s*$")
            .expect("quantity pattern must compile");
}

/// Parses a `<number>[<unit>]` quantity into an exact byte count.
///
/// The suffix is case-insensitive and may carry a trailing `b`/`B`
/// (`1k`, `1kB`, `1Ki` and `1KiB` are all accepted); no suffix means raw
/// bytes. Integral inputs convert exactly; fractional mantissas are rounded
/// to the nearest byte.
pub fn to_bytes(text: &str) -> RuntimeResult<i64> {
    let caps = QUANTITY_PATTERN
        .captures(text)
        .ok_or_else(|| RuntimeError::Conversion(format!("malformed size '{}'", text)))?;

    let mantissa = &caps[1];
    let multiplier = suffix_multiplier(&caps[2], text)?;

    // Integral mantissas stay in integer arithmetic so large counts convert
    // without floating-point loss.
    if let Ok(value) = mantissa.parse::<i64>() {
        return value.checked_mul(multiplier).ok_or_else(|| {
            RuntimeError::Conversion(format!("size '{}' overflows the byte range", text))
        });
    }

    let value: f64 = mantissa
        .parse()
        .map_err(|_| RuntimeError::Conversion(format!("malformed size '{}'", text)))?;
    let bytes = value * multiplier as f64;
    if !bytes.is_finite() || bytes.abs() >= i64::MAX as f64 {
        return Err(RuntimeError::Conversion(format!(
            "size '{}' overflows the byte range",
            text
        )));
    }
    Ok(bytes.round() as i64)
}

/// Formats a byte count with the largest unit whose scaled value is >= 1.
///
/// Exact values in the chosen unit print with no decimals, everything else
/// with one; counts below the smallest multiplier keep the plain `B` suffix,
/// as do negative counts close to zero (the exponent never goes negative).
pub fn to_human_size(bytes: i64, use_si: bool) -> String {
    if bytes == 0 {
        return "0B".to_string();
    }

    let base = if use_si { SI_BASE } else { BINARY_BASE } as u64;
    let suffixes = if use_si { &SI_SUFFIXES } else { &BINARY_SUFFIXES };

    let mut exponent = 0usize;
    let mut remaining = bytes.unsigned_abs();
    while remaining >= base && exponent < suffixes.len() - 1 {
        remaining /= base;
        exponent += 1;
    }

    let scaled = bytes as f64 / (base as f64).powi(exponent as i32);
    let suffix = suffixes[exponent];
    if scaled == scaled.trunc() {
        format!("{:.0}{}", scaled, suffix)
    } else {
        format!("{:.1}{}", scaled, suffix)
    }
}

fn suffix_multiplier(suffix: &str, original: &str) -> RuntimeResult<i64> {
    let lowered = suffix.to_ascii_lowercase();
    if lowered.is_empty() || lowered == "b" {
        return Ok(1);
    }

    let trimmed = lowered.strip_suffix('b').unwrap_or(&lowered);
    let (letter, base) = match trimmed.strip_suffix('i') {
        Some(rest) => (rest, BINARY_BASE),
        None => (trimmed, SI_BASE),
    };

    let mut chars = letter.chars();
    let unit = chars.next();
    if chars.next().is_some() {
        return Err(RuntimeError::Conversion(format!(
            "unrecognized unit in size '{}'",
            original
        )));
    }
    let position = unit.and_then(|c| UNIT_LETTERS.iter().position(|&l| l == c));
    match position {
        Some(index) => Ok(base.pow(index as u32 + 1)),
        None => Err(RuntimeError::Conversion(format!(
            "unrecognized unit in size '{}'",
            original
        ))),
    }
}
