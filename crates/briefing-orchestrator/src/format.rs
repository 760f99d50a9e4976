/// Fixed-point with `,` thousands separators: `format_thousands(65432.1, 0) == "65,432"`.
pub fn format_thousands(value: f64, decimals: usize) -> String {
    if !value.is_finite() {
        return "n/a".to_string();
    }

    let fixed = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };

    let mut grouped = String::with_capacity(fixed.len() + int_part.len() / 3 + 1);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if let Some(frac) = frac_part {
        grouped.push('.');
        grouped.push_str(frac);
    }

    let is_zero = fixed.chars().all(|c| c == '0' || c == '.');
    if value < 0.0 && !is_zero {
        format!("-{}", grouped)
    } else {
        grouped
    }
}

/// `+1.56%` / `-0.40%`, or `n/a`.
pub fn format_signed_pct(value: Option<f64>) -> String {
    match value {
        Some(v) if v.is_finite() => format!("{:+.2}%", v),
        _ => "n/a".to_string(),
    }
}

pub fn format_price(value: Option<f64>, decimals: usize, currency: bool) -> String {
    match value {
        Some(v) if v.is_finite() => {
            let number = format_thousands(v, decimals);
            if currency {
                match number.strip_prefix('-') {
                    Some(abs) => format!("-${}", abs),
                    None => format!("${}", number),
                }
            } else {
                number
            }
        }
        _ => "n/a".to_string(),
    }
}

/// Compact volume label for chart axes: `1.2K`, `3.4M`.
pub fn format_compact(value: f64) -> String {
    let abs = value.abs();
    if abs >= 1e9 {
        format!("{:.1}B", value / 1e9)
    } else if abs >= 1e6 {
        format!("{:.1}M", value / 1e6)
    } else if abs >= 1e3 {
        format!("{:.1}K", value / 1e3)
    } else {
        format!("{:.0}", value)
    }
}
