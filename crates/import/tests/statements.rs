use chrono::NaiveDate;
use ledgerline_core::{StatementResult, TransactionType};
use ledgerline_import::{ingest, parse, repair, Anomaly, OfxError, ParseOptions};
use rust_decimal::Decimal;

const HEADER: &str = "OFXHEADER:100\nDATA:OFXSGML\nVERSION:102\nENCODING:USASCII\nCHARSET:1252\n\n";

fn statement(account: &str, transactions: &str) -> String {
    format!(
        "<STMTRS>\n<CURDEF>GBP\n<BANKACCTFROM>\n<BANKID>123456\n<ACCTID>{account}\n</BANKACCTFROM>\n\
         <BANKTRANLIST>\n<DTSTART>20240101\n<DTEND>20240131\n{transactions}</BANKTRANLIST>\n</STMTRS>\n"
    )
}

fn document(statements: &[String]) -> String {
    format!(
        "{HEADER}<OFX>\n<BANKMSGSRSV1>\n<STMTTRNRS>\n{}</STMTTRNRS>\n</BANKMSGSRSV1>\n</OFX>\n",
        statements.concat()
    )
}

fn trn(kind: &str, date: &str, amount: &str, extra: &str) -> String {
    format!(
        "<STMTTRN>\n<TRNTYPE>{kind}\n<DTPOSTED>{date}\n<TRNAMT>{amount}\n<FITID>{date}{amount}\n<MEMO>memo\n{extra}</STMTTRN>\n"
    )
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

// ── repair ────────────────────────────────────────────────────────────────────

#[test]
fn well_formed_ofx2_survives_repair_unchanged() {
    let xml = "<OFX>\n  <BANKMSGSRSV1>\n    <STMTTRNRS>\n      <STMTRS>\n        <CURDEF>GBP</CURDEF>\n      </STMTRS>\n    </STMTTRNRS>\n  </BANKMSGSRSV1>\n</OFX>";
    assert_eq!(repair::repair(xml), xml);
}

#[test]
fn ofx2_xml_document_parses() {
    let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<?OFX OFXHEADER="200" VERSION="211" SECURITY="NONE" OLDFILEUID="NONE" NEWFILEUID="NONE"?>
<OFX>
  <CREDITCARDMSGSRSV1>
    <CCSTMTTRNRS>
      <CCSTMTRS>
        <CURDEF>USD</CURDEF>
        <CCACCTFROM><ACCTID>4111111111111111</ACCTID></CCACCTFROM>
        <BANKTRANLIST>
          <STMTTRN>
            <TRNTYPE>PAYMENT</TRNTYPE>
            <DTPOSTED>20240105000000.000[-5:EST]</DTPOSTED>
            <TRNAMT>250.00</TRNAMT>
            <FITID>X1</FITID>
            <NAME>THANK YOU</NAME>
            <MEMO>Payment</MEMO>
          </STMTTRN>
        </BANKTRANLIST>
      </CCSTMTRS>
    </CCSTMTTRNRS>
  </CREDITCARDMSGSRSV1>
</OFX>"#;
    let results = parse(xml.as_bytes(), true).unwrap();
    assert_eq!(results.len(), 1);
    let stmt = &results[0];
    assert!(stmt.account.sort_code.is_none());
    assert_eq!(stmt.currency.as_str(), "USD");
    assert_eq!(stmt.transactions[0].transaction_type, TransactionType::Payment);
    assert_eq!(
        stmt.transactions[0].date,
        NaiveDate::from_ymd_opt(2024, 1, 5).unwrap()
    );
}

// ── accounts ──────────────────────────────────────────────────────────────────

#[test]
fn bank_account_block_round_trip() {
    let text = "<OFX><STMTRS><BANKACCTFROM><BANKID>123456</BANKID><ACCTID>12345678</ACCTID><ACCTNAME>Main</ACCTNAME></BANKACCTFROM></STMTRS></OFX>";
    let results = parse(text.as_bytes(), true).unwrap();
    let account = &results[0].account;
    assert_eq!(account.sort_code.as_deref(), Some("123456"));
    assert_eq!(account.number, "12345678");
    assert_eq!(account.name, "Main");
}

// ── transactions ──────────────────────────────────────────────────────────────

#[test]
fn missing_type_gives_unknown_with_one_warning_and_extensions_are_kept() {
    let body = "<STMTTRN>\n<DTPOSTED>20240110\n<TRNAMT>-5.00\n<MEMO>coffee\n<FOO>bar\n</STMTTRN>\n";
    let text = document(&[statement("12345678", body)]);
    let results = parse(text.as_bytes(), false).unwrap();
    let stmt = &results[0];

    assert_eq!(stmt.transactions.len(), 1);
    let t = &stmt.transactions[0];
    assert_eq!(t.transaction_type, TransactionType::Unknown);
    assert_eq!(t.extensions.get("FOO"), Some("bar"));
    assert_eq!(stmt.warnings.len(), 1);
    assert!(stmt.warnings[0].contains("TRNTYPE"));
}

#[test]
fn ampersands_and_undefined_entities_survive_as_text() {
    let body = trn("POS", "20240110", "-3.20", "<NAME>M&S&nbsp;Food\n");
    let text = document(&[statement("12345678", &body)]);
    let results = parse(text.as_bytes(), false).unwrap();

    let t = &results[0].transactions[0];
    assert_eq!(t.description, "M&S&nbsp;Food");
    assert!(!t.description.contains("&amp;"));
}

#[test]
fn missing_amount_strict_fails_lenient_drops() {
    let body = "<STMTTRN>\n<TRNTYPE>DEBIT\n<DTPOSTED>20240110\n<MEMO>no amount\n</STMTTRN>\n";
    let text = document(&[statement("12345678", body)]);

    let err = parse(text.as_bytes(), true).unwrap_err();
    assert!(matches!(
        err,
        OfxError::Anomaly(Anomaly::UnusableTransaction { field: "TRNAMT", .. })
    ));

    let results = parse(text.as_bytes(), false).unwrap();
    assert!(results[0].transactions.is_empty());
    assert!(!results[0].warnings.is_empty());
    // Counted in the original file, header included.
    assert!(results[0].warnings[0].contains("at line 19"));
}

#[test]
fn amount_notations_agree_and_clamp() {
    let body = [
        trn("DEBIT", "20240102", "(10.00)", ""),
        trn("DEBIT", "20240103", "10.00-", ""),
        trn("DEBIT", "20240104", "-10.00", ""),
        trn("CREDIT", "20240105", "99999999999.99", ""),
    ]
    .concat();
    let results = parse(document(&[statement("1", &body)]).as_bytes(), true).unwrap();
    let amounts: Vec<Decimal> = results[0]
        .transactions
        .iter()
        .map(|t| t.amount.as_decimal())
        .collect();
    assert_eq!(
        amounts,
        vec![dec("-10.00"), dec("-10.00"), dec("-10.00"), dec("1000000000")]
    );
}

#[test]
fn out_of_range_years_clamp_with_warning() {
    let body = [
        trn("DEBIT", "18991231", "-1", ""),
        trn("DEBIT", "21010101", "-1", ""),
    ]
    .concat();
    let text = format!(
        "<OFX><STMTRS><BANKACCTFROM><BANKID>1<ACCTID>2</BANKACCTFROM><BANKTRANLIST>{body}</BANKTRANLIST></STMTRS></OFX>"
    );
    let results = parse(text.as_bytes(), false).unwrap();
    let stmt = &results[0];
    assert_eq!(stmt.transactions[0].date, NaiveDate::from_ymd_opt(1900, 1, 1).unwrap());
    assert_eq!(stmt.transactions[1].date, NaiveDate::from_ymd_opt(2100, 12, 31).unwrap());
    assert_eq!(stmt.warnings.len(), 2);
    assert!(stmt.warnings.iter().all(|w| w.contains("year out of range")));
}

#[test]
fn outside_window_is_flagged_but_kept() {
    let body = trn("DEBIT", "20240215", "-3.00", "");
    let text = document(&[statement("1", &body)]);
    let results = parse(text.as_bytes(), false).unwrap();
    assert_eq!(results[0].transactions.len(), 1);
    assert!(results[0].warnings[0].contains("outside statement window 2024-01-01 to 2024-01-31"));
    assert!(parse(text.as_bytes(), true).is_err());
}

// ── running balance ───────────────────────────────────────────────────────────

#[test]
fn running_balance_mismatch_warns_and_rebaselines() {
    let body = [
        trn("CREDIT", "20240102", "100.00", "<RUNNINGBAL><BALAMT>100.00</BALAMT></RUNNINGBAL>\n"),
        // 100 - 20 is 80, but the bank says 75.
        trn("DEBIT", "20240103", "-20.00", "<RUNNINGBAL><BALAMT>75.00</BALAMT></RUNNINGBAL>\n"),
        // Consistent with the reported 75, not the computed 80.
        trn("DEBIT", "20240104", "-5.00", "<RUNNINGBAL><BALAMT>70.00</BALAMT></RUNNINGBAL>\n"),
    ]
    .concat();
    let results = parse(document(&[statement("1", &body)]).as_bytes(), false).unwrap();
    let stmt = &results[0];
    assert_eq!(stmt.transactions.len(), 3);
    assert_eq!(stmt.warnings.len(), 1);
    assert!(stmt.warnings[0].contains("RUNNINGBAL mismatch"));
    assert_eq!(stmt.closing_balance.map(|m| m.as_decimal()), Some(dec("70.00")));
}

#[test]
fn running_balance_mismatch_fails_in_strict_mode() {
    let body = [
        trn("CREDIT", "20240102", "100.00", "<RUNNINGBAL><BALAMT>100.00</BALAMT></RUNNINGBAL>\n"),
        trn("DEBIT", "20240103", "-20.00", "<RUNNINGBAL><BALAMT>75.00</BALAMT></RUNNINGBAL>\n"),
    ]
    .concat();
    let err = parse(document(&[statement("1", &body)]).as_bytes(), true).unwrap_err();
    assert!(matches!(err, OfxError::Anomaly(Anomaly::BalanceMismatch { .. })));
}

// ── multiple statements ───────────────────────────────────────────────────────

#[test]
fn two_statements_are_independent() {
    let first = [
        trn("CREDIT", "20240102", "10.00", "<RUNNINGBAL><BALAMT>10.00</BALAMT></RUNNINGBAL>\n"),
        trn("DEBIT", "20240103", "-1.00", ""),
    ]
    .concat();
    let second = "<STMTTRN>\n<TRNTYPE>DEBIT\n<DTPOSTED>20240105\n<TRNAMT>-2.00\n</STMTTRN>\n";
    let text = document(&[statement("11111111", &first), statement("22222222", second)]);

    let results = parse(text.as_bytes(), false).unwrap();
    assert_eq!(results.len(), 2);

    assert_eq!(results[0].account.number, "11111111");
    assert!(results[0].warnings.is_empty());
    assert_eq!(results[0].closing_balance.map(|m| m.as_decimal()), Some(dec("9.00")));

    assert_eq!(results[1].account.number, "22222222");
    assert_eq!(results[1].warnings.len(), 1);
    assert!(results[1].warnings[0].contains("MEMO"));
    assert_eq!(results[1].closing_balance.map(|m| m.as_decimal()), Some(dec("-2.00")));
}

#[test]
fn empty_date_leaf_loses_its_list_but_not_later_line_numbers() {
    let first = format!(
        "<STMTRS>\n<CURDEF>GBP\n<BANKACCTFROM>\n<BANKID>1\n<ACCTID>11111111\n</BANKACCTFROM>\n\
         <BANKTRANLIST>\n<DTSTART>\n<DTEND>20240131\n{}</BANKTRANLIST>\n</STMTRS>\n",
        trn("DEBIT", "20240103", "-1.00", "")
    );
    let second = statement("22222222", &trn("DEBIT", "20240105", "-2.00", ""));
    let text = document(&[first, second]);

    let results = parse(text.as_bytes(), false).unwrap();
    assert_eq!(results.len(), 2);
    assert!(results[0].transactions.is_empty());
    assert!(results[0].window.start.is_none());

    let t = &results[1].transactions[0];
    let offset = text.rfind("<STMTTRN>").unwrap();
    assert_eq!(t.line, Some(text[..offset].matches('\n').count() + 1));
    assert_eq!(t.byte_offset, Some(offset));
}

// ── encoding and ingestion ────────────────────────────────────────────────────

#[test]
fn windows_1252_names_are_decoded() {
    let mut raw = HEADER.as_bytes().to_vec();
    raw.extend_from_slice(
        b"<OFX><STMTRS><BANKACCTFROM><BANKID>1<ACCTID>2</BANKACCTFROM><BANKTRANLIST>\
          <STMTTRN><TRNTYPE>POS<DTPOSTED>20240110<TRNAMT>-4.20<NAME>Caf\xE9 Nero<MEMO>\x80 card</STMTTRN>\
          </BANKTRANLIST></STMTRS></OFX>",
    );
    let results = parse(&raw, true).unwrap();
    let t = &results[0].transactions[0];
    assert_eq!(t.description, "Caf\u{e9} Nero");
    assert_eq!(t.memo, "\u{20ac} card");
}

#[test]
fn ingest_reports_totals() {
    let text = document(&[
        statement("1", &trn("DEBIT", "20240102", "-1.00", "")),
        statement("2", &trn("DEBIT", "20240103", "-2.00", "")),
    ]);
    let mut sink: Vec<StatementResult> = Vec::new();
    let summary = ingest(text.as_bytes(), &ParseOptions::default(), &mut sink).unwrap();
    assert_eq!(summary.statements, 2);
    assert_eq!(summary.transactions, 2);
    assert_eq!(summary.warnings, 0);
    assert_eq!(sink.len(), 2);
}
