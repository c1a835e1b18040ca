//! Parser behaviour against realistic institution messages
//!
//! Run with: cargo test --test parser_test

use chrono::{Datelike, Timelike, Utc};
use rust_decimal::Decimal;

use smsfin_core::services::parser::{
    ANCHORED_CONFIDENCE, FALLBACK_CONFIDENCE, GENERIC_CONFIDENCE, WITHDRAW_CONFIDENCE,
};
use smsfin_core::services::{CategorySuggester, MessageParser, ParseOutcome, SenderIdentifier, Tier};
use smsfin_core::{Direction, InstitutionRegistry, ParsedTransaction, RawMessage};

const RECEIVED_AT: i64 = 1_767_600_000_000;

fn parse(address: &str, body: &str) -> Option<ParsedTransaction> {
    MessageParser::default().parse(&RawMessage::new("1", address, body, RECEIVED_AT))
}

fn dec(units: i64, scale: u32) -> Decimal {
    Decimal::new(units, scale)
}

fn category(tx: &ParsedTransaction) -> String {
    CategorySuggester::builtin().unwrap().suggest(tx)
}

// =============================================================================
// Mobile money
// =============================================================================

#[test]
fn test_mpesa_received() {
    let tx = parse(
        "MPESA",
        "QK7ABCDEF Confirmed. You have received Ksh1,000.00 from JOHN DOE 0712345678 on 1/1/26 at 10:30 AM. New M-PESA balance is Ksh5,000.00.",
    )
    .unwrap();

    assert_eq!(tx.direction, Direction::Income);
    assert_eq!(tx.amount, dec(100000, 2));
    assert_eq!(tx.currency, "KES");
    assert_eq!(tx.counterparty_name.as_deref(), Some("JOHN DOE"));
    assert_eq!(tx.reference_code.as_deref(), Some("QK7ABCDEF"));
    assert_eq!(tx.balance_after, Some(dec(500000, 2)));
    assert_eq!(tx.confidence, ANCHORED_CONFIDENCE);
    assert_eq!(tx.institution_id, "MPESA");

    assert_eq!((tx.occurred_at.year(), tx.occurred_at.month(), tx.occurred_at.day()), (2026, 1, 1));
    assert_eq!((tx.occurred_at.hour(), tx.occurred_at.minute()), (10, 30));
    assert_eq!(category(&tx), "Income");
}

#[test]
fn test_mpesa_sent_to_person() {
    let tx = parse(
        "MPESA",
        "QK8XYZ123 Confirmed. Ksh500.00 sent to JANE DOE 0722000000 on 2/1/26 at 1:15 PM. New M-PESA balance is Ksh4,500.00. Transaction cost, Ksh7.00.",
    )
    .unwrap();

    assert_eq!(tx.direction, Direction::Expense);
    assert_eq!(tx.amount, dec(50000, 2));
    assert_eq!(tx.counterparty_name.as_deref(), Some("JANE DOE"));
    assert_eq!(tx.balance_after, Some(dec(450000, 2)));
    assert_eq!(tx.occurred_at.hour(), 13);
    assert_eq!(tx.confidence, ANCHORED_CONFIDENCE);
}

#[test]
fn test_mpesa_paybill_keeps_account() {
    let tx = parse(
        "MPESA",
        "QK9PAY001 Confirmed. Ksh1,200.00 sent to KPLC PREPAID for account 37123456789 on 3/1/26 at 9:00 AM New M-PESA balance is Ksh3,300.00.",
    )
    .unwrap();

    assert_eq!(tx.direction, Direction::Expense);
    assert_eq!(tx.counterparty_name.as_deref(), Some("KPLC PREPAID (37123456789)"));
    assert_eq!(tx.confidence, ANCHORED_CONFIDENCE);
    assert_eq!(category(&tx), "Utilities");
}

#[test]
fn test_mpesa_paid_to_merchant() {
    let tx = parse(
        "MPESA",
        "QKAPAID01 Confirmed. Ksh350.00 paid to JAVA HOUSE. on 4/1/26 at 12:30 PM.New M-PESA balance is Ksh2,950.00.",
    )
    .unwrap();

    assert_eq!(tx.direction, Direction::Expense);
    assert_eq!(tx.amount, dec(35000, 2));
    assert_eq!(tx.counterparty_name.as_deref(), Some("JAVA HOUSE"));
    assert_eq!(tx.occurred_at.hour(), 12);
    assert_eq!(category(&tx), "Food & Dining");
}

#[test]
fn test_mpesa_agent_withdrawal() {
    let tx = parse(
        "MPESA",
        "QKBWD0001 Confirmed.on 5/1/26 at 6:45 PMWithdraw Ksh1,000.00 from 123456 - MAMA MBOGA SHOP New M-PESA balance is Ksh1,950.00.",
    )
    .unwrap();

    assert_eq!(tx.direction, Direction::Expense);
    assert_eq!(tx.amount, dec(100000, 2));
    assert_eq!(tx.counterparty_name.as_deref(), Some("123456 - MAMA MBOGA SHOP"));
    assert_eq!(tx.balance_after, Some(dec(195000, 2)));
    assert_eq!(tx.occurred_at.hour(), 18);
    assert_eq!(tx.confidence, WITHDRAW_CONFIDENCE);
}

#[test]
fn test_mpesa_airtime() {
    let tx = parse(
        "MPESA",
        "QKCAIR001 confirmed.You bought Ksh100.00 of airtime on 6/1/26 at 8:00 AM.New M-PESA balance is Ksh1,850.00.",
    )
    .unwrap();

    assert_eq!(tx.direction, Direction::Expense);
    assert_eq!(tx.counterparty_name.as_deref(), Some("Airtime"));
    assert_eq!(tx.confidence, ANCHORED_CONFIDENCE);
    assert_eq!(category(&tx), "Communication");
}

#[test]
fn test_malformed_embedded_date_uses_processing_time() {
    let before = Utc::now();
    let tx = parse(
        "MPESA",
        "QK7ABCDEF Confirmed. You have received Ksh1,000.00 from JOHN DOE on 31/2/26 at 10:30 AM.",
    )
    .unwrap();
    assert!(tx.occurred_at >= before);
    assert_eq!(tx.confidence, ANCHORED_CONFIDENCE);
}

// =============================================================================
// Generic bank templates
// =============================================================================

#[test]
fn test_generic_debit_without_dedicated_template() {
    let tx = parse("KCB", "Your account has been debited with KES 2,000.00. Ref: TXN123456").unwrap();

    assert_eq!(tx.direction, Direction::Expense);
    assert_eq!(tx.amount, dec(200000, 2));
    assert_eq!(tx.reference_code.as_deref(), Some("TXN123456"));
    assert_eq!(tx.currency, "KES");
    assert_eq!(tx.confidence, GENERIC_CONFIDENCE);
    assert_eq!(tx.occurred_at.timestamp_millis(), RECEIVED_AT);
}

#[test]
fn test_generic_credit_detects_currency_and_balance() {
    let tx = parse(
        "GTBank",
        "Acct:****1234 credited with NGN 25,000.00 on 07-Jan-2026. Bal: NGN 80,500.00",
    )
    .unwrap();

    assert_eq!(tx.institution_id, "GTB");
    assert_eq!(tx.direction, Direction::Income);
    assert_eq!(tx.amount, dec(2500000, 2));
    assert_eq!(tx.currency, "NGN");
    assert_eq!(tx.balance_after, Some(dec(8050000, 2)));
    assert_eq!(tx.confidence, GENERIC_CONFIDENCE);
}

#[test]
fn test_generic_transfer() {
    let tx = parse(
        "EQUITY",
        "Transfer of KES 3,000.00 to SAVINGS ACCOUNT 0123 was successful. Ref: EQ12345",
    )
    .unwrap();

    assert_eq!(tx.direction, Direction::Transfer);
    assert_eq!(tx.counterparty_name.as_deref(), Some("SAVINGS ACCOUNT 0123"));
    assert_eq!(tx.reference_code.as_deref(), Some("EQ12345"));
    assert_eq!(category(&tx), "Transfer");
}

// =============================================================================
// Fallback and misses
// =============================================================================

#[test]
fn test_fallback_infers_direction_from_keywords() {
    let tx = parse(
        "FNB",
        "FNB: R1,250.00 paid from cheque a/c..1234 @ Spar Menlyn. Avail R5,000.00",
    )
    .unwrap();

    assert_eq!(tx.direction, Direction::Expense);
    assert_eq!(tx.amount, dec(125000, 2));
    assert_eq!(tx.currency, "ZAR");
    assert_eq!(tx.confidence, FALLBACK_CONFIDENCE);
    assert_eq!(category(&tx), "Groceries");
}

#[test]
fn test_fallback_drops_mixed_keywords() {
    assert!(parse("KCB", "Reversal: your debit of KES 500.00 has been credited back").is_none());
}

#[test]
fn test_unparseable_body_from_known_sender() {
    assert!(parse("MPESA", "Dear customer, thank you for using our service.").is_none());
}

#[test]
fn test_unknown_sender_is_not_financial() {
    let parser = MessageParser::default();
    let msg = RawMessage::new("1", "+254712345678", "You have received Ksh1,000.00", RECEIVED_AT);
    assert!(matches!(parser.parse_detailed(&msg), ParseOutcome::NotFinancial));
}

#[test]
fn test_zero_amount_never_parses() {
    assert!(parse(
        "MPESA",
        "QK7ABCDEF Confirmed. You have received Ksh0.00 from JOHN DOE on 1/1/26 at 10:30 AM."
    )
    .is_none());
}

#[test]
fn test_thousands_separator_does_not_change_amount() {
    let with = parse("KCB", "Your account has been credited with KES 12,500.00").unwrap();
    let without = parse("KCB", "Your account has been credited with KES 12500.00").unwrap();
    assert_eq!(with.amount, without.amount);
}

#[test]
fn test_custom_sender_uses_generic_tiers() {
    let registry = InstitutionRegistry::with_custom(&[("MY_SACCO".to_string(), "My Sacco".to_string())]);
    let parser = MessageParser::new(SenderIdentifier::new(std::sync::Arc::new(registry)));
    let msg = RawMessage::new("1", "MY_SACCO", "Deposit of KES 2,000.00 received", RECEIVED_AT);

    match parser.parse_detailed(&msg) {
        ParseOutcome::Parsed { transaction, tier, .. } => {
            assert_eq!(tier, Tier::Fallback);
            assert_eq!(transaction.institution_id, "MY_SACCO");
            assert_eq!(transaction.direction, Direction::Income);
        }
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[test]
fn test_parsing_is_deterministic() {
    let body = "Your account has been debited with KES 2,000.00. Ref: TXN123456";
    assert_eq!(parse("KCB", body), parse("KCB", body));
}
