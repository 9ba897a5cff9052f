//! Integral Kubernetes quantity parsing.
//!
//! Extended resources are counted in whole devices, so only quantities
//! that evaluate to a non-negative integer are accepted. Everything the
//! API server accepts is understood: plain numbers, decimal fractions,
//! decimal SI suffixes (`m`, `k`, `M`, `G`, `T`, `P`, `E`), binary suffixes
//! (`Ki` … `Ei`) and decimal exponents (`1e3`).

const BINARY_SUFFIXES: [(&str, u32); 6] = [
    ("Ki", 10),
    ("Mi", 20),
    ("Gi", 30),
    ("Ti", 40),
    ("Pi", 50),
    ("Ei", 60),
];

const DECIMAL_SUFFIXES: [(char, i32); 7] = [
    ('m', -3),
    ('k', 3),
    ('M', 6),
    ('G', 9),
    ('T', 12),
    ('P', 15),
    ('E', 18),
];

enum Scale {
    Binary(u32),
    Decimal(i32),
}

/// Parse a quantity string into a whole count.
///
/// Returns `None` for malformed, negative, fractional or out-of-range
/// quantities.
pub fn parse_integral(quantity: &str) -> Option<i64> {
    let (number, scale) = split_scale(quantity.trim())?;
    let (mantissa, exp10) = parse_decimal(number)?;

    let value = match scale {
        Scale::Binary(shift) => apply_exp10(mantissa.checked_mul(1i128 << shift)?, exp10)?,
        Scale::Decimal(exp) => apply_exp10(mantissa, exp10.checked_add(exp)?)?,
    };
    i64::try_from(value).ok()
}

fn split_scale(s: &str) -> Option<(&str, Scale)> {
    for (suffix, shift) in BINARY_SUFFIXES {
        if let Some(number) = s.strip_suffix(suffix) {
            return Some((number, Scale::Binary(shift)));
        }
    }

    if let Some(pos) = s.find(['e', 'E']) {
        let exponent = &s[pos + 1..];
        if !exponent.is_empty() {
            let exp = exponent.parse::<i32>().ok()?;
            return Some((&s[..pos], Scale::Decimal(exp)));
        }
    }

    for (suffix, exp) in DECIMAL_SUFFIXES {
        if let Some(number) = s.strip_suffix(suffix) {
            return Some((number, Scale::Decimal(exp)));
        }
    }

    Some((s, Scale::Decimal(0)))
}

/// Split `123.45` into mantissa `12345` and exponent `-2`.
fn parse_decimal(s: &str) -> Option<(i128, i32)> {
    let s = s.strip_prefix('+').unwrap_or(s);
    let (int_part, frac_part) = s.split_once('.').unwrap_or((s, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }

    let mut mantissa: i128 = 0;
    for c in int_part.chars().chain(frac_part.chars()) {
        let digit = c.to_digit(10)?;
        mantissa = mantissa.checked_mul(10)?.checked_add(i128::from(digit))?;
    }
    let exp10 = -i32::try_from(frac_part.len()).ok()?;
    Some((mantissa, exp10))
}

fn apply_exp10(mantissa: i128, exp10: i32) -> Option<i128> {
    if exp10 >= 0 {
        mantissa.checked_mul(10i128.checked_pow(exp10.unsigned_abs())?)
    } else {
        let divisor = 10i128.checked_pow(exp10.unsigned_abs())?;
        (mantissa % divisor == 0).then(|| mantissa / divisor)
    }
}
