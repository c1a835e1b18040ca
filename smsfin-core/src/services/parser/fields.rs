//! Field extraction helpers shared by all template tiers
//!
//! Amounts, balances, references, currencies, counterparties and embedded
//! timestamps. Everything here is total: a field that cannot be read comes
//! back as None.

use std::sync::OnceLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use regex::Regex;
use rust_decimal::Decimal;

/// Currency codes accepted in front of an amount inside a template
pub(crate) const CURRENCY_PREFIX: &str = r"(?:KES|Ksh|UGX|TZS|NGN|ZAR|USD)";

/// Capture slot for an amount token ("1,000.00", "500", "12.5")
pub(crate) const AMOUNT_SLOT: &str = r"(?P<amount>\d[\d,]*(?:\.\d+)?)";

/// Capture slots for the "1/1/26" and "10:30 AM" pieces of mobile-money messages
pub(crate) const DATE_SLOT: &str = r"(?P<date>\d{1,2}/\d{1,2}/\d{2,4})";
pub(crate) const TIME_SLOT: &str = r"(?P<time>\d{1,2}:\d{2}\s*[AP]M)";

fn balance_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\bbal(?:ance)?\b(?:\s+is)?\s*[:\-]?\s*(?:KES|Ksh|UGX|TZS|NGN|ZAR|USD|GBP|EUR|[₦$£€])?\.?\s*(?P<amount>\d[\d,]*(?:\.\d+)?)",
        )
        .expect("invalid balance regex")
    })
}

fn reference_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\bref(?:erence)?(?:\s*(?:no|number))?\.?(?:\s*[:#]\s*|\s+)(?P<reference>[A-Z0-9]+)",
        )
        .expect("invalid reference regex")
    })
}

fn recipient_res() -> &'static [Regex] {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        [
            r"(?i)\b(?:to|for)\s+(?P<name>[A-Z][A-Z\s]+?)(?:\s+on\b|\s+ref\b|\s+at\b|\.|$)",
            r"(?i)\b(?:paid|sent)\s+(?:to\s+)?(?P<name>[A-Z][A-Z\s]+?)(?:\s+on\b|\s+ref\b|\s+at\b|\.|$)",
        ]
        .iter()
        .map(|p| Regex::new(p).expect("invalid recipient regex"))
        .collect()
    })
}

fn trailing_phone_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*\+?\d{9,12}\s*$").expect("invalid phone regex"))
}

fn clock_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)^(\d{1,2}):(\d{2})\s*([AP]M)$").expect("invalid clock regex"))
}

/// Currency markers in detection priority order: (code, pattern)
///
/// Codes are matched case-insensitively at a word start; the bare "R" for
/// rand only counts when upper-case and followed by a digit.
fn currency_markers() -> &'static [(&'static str, Regex)] {
    static MARKERS: OnceLock<Vec<(&'static str, Regex)>> = OnceLock::new();
    MARKERS.get_or_init(|| {
        [
            ("KES", r"(?i)\b(?:KES|Ksh)"),
            ("UGX", r"(?i)\bUGX"),
            ("TZS", r"(?i)\bTZS"),
            ("NGN", r"(?i)\bNGN|₦"),
            ("ZAR", r"(?i:\bZAR)|\bR\s?\d"),
            ("USD", r"(?i)\bUSD|\$"),
            ("GBP", r"(?i)\bGBP|£"),
            ("EUR", r"(?i)\bEUR|€"),
        ]
        .into_iter()
        .map(|(code, p)| (code, Regex::new(p).expect("invalid currency regex")))
        .collect()
    })
}

/// Convert an amount token to a positive decimal
///
/// Thousands separators are stripped first, so "1,000.00" and "1000.00"
/// give the same value. Zero, negative and unreadable tokens return None:
/// a template whose amount cannot be read has not matched.
pub fn parse_amount(token: &str) -> Option<Decimal> {
    let cleaned: String = token.trim().chars().filter(|c| *c != ',').collect();
    let cleaned = cleaned.trim_end_matches('.');
    if cleaned.is_empty() {
        return None;
    }
    let amount: Decimal = cleaned.parse().ok()?;
    (amount > Decimal::ZERO).then_some(amount)
}

/// First currency marker found in the body, else the institution's currency
pub fn detect_currency(body: &str, default: &str) -> String {
    currency_markers()
        .iter()
        .find(|(_, re)| re.is_match(body))
        .map(|(code, _)| code.to_string())
        .unwrap_or_else(|| default.to_string())
}

/// Balance after the transaction, if the message states one
pub fn extract_balance(body: &str) -> Option<Decimal> {
    balance_re()
        .captures(body)
        .and_then(|caps| caps.name("amount"))
        .and_then(|m| parse_amount(m.as_str()))
}

/// Transaction reference ("Ref: TXN123456"); must contain a digit
pub fn extract_reference(body: &str) -> Option<String> {
    reference_re()
        .captures_iter(body)
        .filter_map(|caps| caps.name("reference").map(|m| m.as_str().to_string()))
        .find(|r| r.chars().any(|c| c.is_ascii_digit()))
}

/// Best guess at who was paid, for messages without a dedicated template
pub fn extract_recipient(body: &str) -> Option<String> {
    recipient_res()
        .iter()
        .find_map(|re| re.captures(body).and_then(|caps| caps.name("name")))
        .and_then(|m| clean_counterparty(m.as_str()))
}

/// Trim trailing punctuation and a trailing phone number off a name
pub fn clean_counterparty(raw: &str) -> Option<String> {
    let mut name = raw.trim().to_string();
    loop {
        let before = name.len();
        name = trailing_phone_re().replace(&name, "").to_string();
        name = name
            .trim_end_matches(|c: char| c.is_ascii_punctuation() && c != ')')
            .trim()
            .to_string();
        if name.len() == before {
            break;
        }
    }
    (!name.is_empty()).then_some(name)
}

/// Trim surrounding whitespace and trailing punctuation only
pub fn trim_label(raw: &str) -> Option<String> {
    let label = raw
        .trim()
        .trim_end_matches(|c: char| c.is_ascii_punctuation())
        .trim();
    (!label.is_empty()).then(|| label.to_string())
}

/// Parse "d/m/yy" + "h:mm AM" as printed by mobile-money providers
///
/// Two-digit years are 20yy. The wall-clock time is taken as UTC because
/// the message carries no zone.
pub fn parse_embedded_datetime(date: &str, time: Option<&str>) -> Option<DateTime<Utc>> {
    let mut parts = date.trim().split('/');
    let day: u32 = parts.next()?.parse().ok()?;
    let month: u32 = parts.next()?.parse().ok()?;
    let year: i32 = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    let year = if year < 100 { 2000 + year } else { year };
    let date = NaiveDate::from_ymd_opt(year, month, day)?;

    let clock = match time {
        Some(t) => parse_clock(t)?,
        None => NaiveTime::MIN,
    };
    Some(Utc.from_utc_datetime(&NaiveDateTime::new(date, clock)))
}

fn parse_clock(time: &str) -> Option<NaiveTime> {
    let caps = clock_re().captures(time.trim())?;
    let mut hours: u32 = caps[1].parse().ok()?;
    let minutes: u32 = caps[2].parse().ok()?;
    let pm = caps[3].eq_ignore_ascii_case("PM");
    if hours == 0 || hours > 12 {
        return None;
    }
    if pm && hours != 12 {
        hours += 12;
    }
    if !pm && hours == 12 {
        hours = 0;
    }
    NaiveTime::from_hms_opt(hours, minutes, 0)
}
