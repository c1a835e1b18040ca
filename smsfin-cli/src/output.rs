//! Output formatting utilities

use colored::{ColoredString, Colorize};
use comfy_table::{presets::UTF8_FULL_CONDENSED, ContentArrangement, Table};
use rust_decimal::Decimal;
use smsfin_core::Direction;

/// Print a success message
pub fn success(msg: &str) {
    println!("{}", msg.green());
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

/// Print a warning message
pub fn warning(msg: &str) {
    println!("{}", msg.yellow());
}

/// Print an info message
pub fn info(msg: &str) {
    println!("{}", msg.cyan());
}

/// Create a styled table
pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// "KES 1,000.00" with thousands separators
pub fn format_amount(amount: Decimal, currency: &str) -> String {
    let rounded = amount.round_dp(2);
    let text = format!("{:.2}", rounded);
    let (whole, frac) = text.split_once('.').unwrap_or((text.as_str(), "00"));

    let digits: Vec<char> = whole.chars().collect();
    let mut grouped = String::new();
    for (i, c) in digits.iter().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(*c);
    }
    format!("{} {}.{}", currency, grouped, frac)
}

/// Direction with a sign colour: green in, red out, blue between accounts
pub fn direction_label(direction: Direction) -> ColoredString {
    match direction {
        Direction::Income => "income".green(),
        Direction::Expense => "expense".red(),
        Direction::Transfer => "transfer".blue(),
    }
}

/// Confidence as a percentage, dimmed when it needs review
pub fn confidence_label(confidence: f64, needs_review: bool) -> ColoredString {
    let text = format!("{:.0}%", confidence * 100.0);
    if needs_review {
        text.yellow()
    } else {
        text.normal()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_amount_groups_thousands() {
        assert_eq!(format_amount(Decimal::new(100000, 2), "KES"), "KES 1,000.00");
        assert_eq!(format_amount(Decimal::new(123456789, 2), "NGN"), "NGN 1,234,567.89");
        assert_eq!(format_amount(Decimal::new(5, 0), "ZAR"), "ZAR 5.00");
    }
}
