/// Formats an amount with the currency's symbol. Amounts of 1000 or more get
/// thousands separators.
pub fn format_currency(value: f64, currency: &str) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let magnitude = value.abs();

    let formatted_number = match currency {
        "JPY" => group_thousands(&format!("{magnitude:.0}")),
        _ if magnitude >= 1000.0 => format_with_commas(magnitude),
        _ => format!("{magnitude:.2}"),
    };

    match currency {
        "INR" => format!("{sign}₹{formatted_number}"),
        "USD" | "CAD" | "AUD" | "HKD" | "SGD" => format!("{sign}${formatted_number}"),
        "EUR" => format!("{sign}{formatted_number} €"),
        "GBP" => format!("{sign}£{formatted_number}"),
        "JPY" => format!("{sign}¥{formatted_number}"),
        _ => format!("{sign}{formatted_number} {currency}"),
    }
}

pub fn format_with_commas(value: f64) -> String {
    let formatted = format!("{:.2}", value.abs());
    let (integer_part, decimal_part) = formatted.split_once('.').unwrap_or((formatted.as_str(), "00"));
    let sign = if value < 0.0 { "-" } else { "" };

    format!("{sign}{}.{decimal_part}", group_thousands(integer_part))
}

fn group_thousands(digits: &str) -> String {
    digits
        .chars()
        .rev()
        .collect::<Vec<_>>()
        .chunks(3)
        .map(|chunk| chunk.iter().collect::<String>())
        .collect::<Vec<_>>()
        .join(",")
        .chars()
        .rev()
        .collect()
}

pub fn format_units(units: f64) -> String {
    if units.fract() == 0.0 {
        format!("{units:.0}")
    } else if units >= 1.0 {
        format!("{units:.3}")
    } else {
        format!("{units:.4}")
    }
}

pub fn format_percent(value: f64) -> String {
    format!("{value:.2}%")
}
