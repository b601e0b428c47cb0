use crate::config::ScalarRange;

/// Largest magnitude written as a real in [`ScalarRange::Narrow`].
pub const NARROW_MAX: f32 = 32767.0;
/// Largest magnitude written as a real in [`ScalarRange::Wide`].
pub const WIDE_MAX: f32 = (1 << 24) as f32;
/// Smallest non zero magnitude, the resolution of a 16.16 fixed point value.
pub const MIN_MAGNITUDE: f32 = 1.0 / 65536.0;

const FIXED_ONE: i64 = 1 << 16;
const FRACTION_DIGITS: u32 = 5;

/// Format an unsigned value with at least `min_digits` digits, zero padded.
pub fn format_size(value: usize, min_digits: usize) -> String {
    format!("{:0width$}", value, width = min_digits)
}

/// Format a real number so it never leaves the configured range and never
/// uses exponent notation.
pub fn format_scalar(value: f32, range: ScalarRange) -> String {
    match range {
        ScalarRange::Narrow => format_narrow(value),
        ScalarRange::Wide => format_wide(value),
    }
}

fn format_narrow(value: f32) -> String {
    if value > NARROW_MAX || value < -NARROW_MAX {
        return (value as i32).to_string();
    }
    let fixed = (f64::from(value) * FIXED_ONE as f64).round() as i64;
    format_fixed(fixed)
}

/// Writes a 16.16 fixed point value with enough fractional digits to get the
/// same fixed point value back when parsing it.
fn format_fixed(fixed: i64) -> String {
    let negative = fixed < 0;
    let magnitude = fixed.unsigned_abs();

    let scale = 10u64.pow(FRACTION_DIGITS);
    let mut integer = magnitude >> 16;
    let mut fraction = ((magnitude & 0xFFFF) * scale + (FIXED_ONE as u64 / 2)) >> 16;
    if fraction == scale {
        integer += 1;
        fraction = 0;
    }

    let mut out = String::with_capacity(14);
    if negative && (integer != 0 || fraction != 0) {
        out.push('-');
    }
    out.push_str(&integer.to_string());
    if fraction != 0 {
        let digits = format!("{:0width$}", fraction, width = FRACTION_DIGITS as usize);
        out.push('.');
        out.push_str(digits.trim_end_matches('0'));
    }
    out
}

fn format_wide(value: f32) -> String {
    if value > WIDE_MAX || value < -WIDE_MAX {
        return (value as i32).to_string();
    }
    // also catches NaN
    if !(value.abs() >= MIN_MAGNITUDE) {
        return "0".to_owned();
    }
    let formatted = format!("{:.8}", value);
    let trimmed = formatted.trim_end_matches('0').trim_end_matches('.');
    if trimmed == "-0" {
        "0".to_owned()
    } else {
        trimmed.to_owned()
    }
}
