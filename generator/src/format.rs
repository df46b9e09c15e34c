/// printf style `%.{precision}e`: signed exponent with at least two digits
pub fn exponential(value: f64, precision: usize) -> String {
    if !value.is_finite() {
        return non_finite(value);
    }

    let formatted = format!("{value:.precision$e}");

    match formatted.split_once('e') {
        Some((mantissa, exponent)) => {
            let (sign, digits) = match exponent.strip_prefix('-') {
                Some(digits) => ('-', digits),
                None => ('+', exponent),
            };

            format!("{mantissa}e{sign}{digits:0>2}")
        }
        None => formatted,
    }
}

/// printf style `%.{precision}f`
pub fn fixed(value: f64, precision: usize) -> String {
    if !value.is_finite() {
        return non_finite(value);
    }

    format!("{value:.precision$}")
}

fn non_finite(value: f64) -> String {
    if value.is_nan() {
        "nan".to_string()
    } else if value.is_sign_negative() {
        "-inf".to_string()
    } else {
        "inf".to_string()
    }
}
