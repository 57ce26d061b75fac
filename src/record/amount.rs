/// Parse a user-typed amount. Both '.' and ',' work as decimal separator;
/// empty or unreadable text counts as zero.
pub fn parse_amount(text: &str) -> f64 {
    let text = text.trim();
    if text.is_empty() {
        return 0.0;
    }
    text.replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}

/// quantity × unit price, rounded to cents
pub fn line_total(quantity: f64, unit_price: f64) -> f64 {
    round_cents(quantity * unit_price)
}

pub fn format_amount(value: f64) -> String {
    format!("{:.2}", value)
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comma_and_dot_parse_the_same() {
        assert_eq!(parse_amount("10,50"), 10.5);
        assert_eq!(parse_amount("10.50"), 10.5);
        assert_eq!(parse_amount(" 7 "), 7.0);
    }

    #[test]
    fn garbage_parses_as_zero() {
        assert_eq!(parse_amount(""), 0.0);
        assert_eq!(parse_amount("dieci"), 0.0);
        assert_eq!(parse_amount("1,2,3"), 0.0);
        assert_eq!(parse_amount("inf"), 0.0);
    }

    #[test]
    fn line_total_rounds_to_two_decimals() {
        assert_eq!(line_total(3.0, 0.333), 1.0);
        assert_eq!(line_total(12.0, 1.25), 15.0);
        assert_eq!(line_total(4.0, 2.125), 8.5);
        assert_eq!(format_amount(line_total(2.0, 10.5)), "21.00");
    }
}
