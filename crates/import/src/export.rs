//! Writes statements back out as OFX 1.02: an SGML header followed by fully
//! closed markup, which any OFX reader (including this crate) accepts.

use chrono::NaiveDate;
use ledgerline_core::{Account, Money, StatementResult, Transaction};
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;

use crate::error::{markup, OfxError};

const SGML_HEADER: &str = "OFXHEADER:100
DATA:OFXSGML
VERSION:102
SECURITY:NONE
ENCODING:UTF-8
CHARSET:NONE
COMPRESSION:NONE
OLDFILEUID:NONE
NEWFILEUID:NONE

";

type OfxWriter = Writer<Vec<u8>>;

pub fn to_ofx(statements: &[StatementResult]) -> Result<String, OfxError> {
    let mut wr = Writer::new_with_indent(Vec::new(), b' ', 2);

    open(&mut wr, "OFX")?;
    for (i, statement) in statements.iter().enumerate() {
        write_statement(&mut wr, i + 1, statement)?;
    }
    close(&mut wr, "OFX")?;

    let body = String::from_utf8(wr.into_inner()).map_err(markup)?;
    Ok(format!("{SGML_HEADER}{body}\n"))
}

fn write_statement(
    wr: &mut OfxWriter,
    trnuid: usize,
    st: &StatementResult,
) -> Result<(), OfxError> {
    let (message_set, response, statement) = if st.account.is_credit_card() {
        ("CREDITCARDMSGSRSV1", "CCSTMTTRNRS", "CCSTMTRS")
    } else {
        ("BANKMSGSRSV1", "STMTTRNRS", "STMTRS")
    };

    open(wr, message_set)?;
    open(wr, response)?;
    leaf(wr, "TRNUID", &trnuid.to_string())?;
    open(wr, "STATUS")?;
    leaf(wr, "CODE", "0")?;
    leaf(wr, "SEVERITY", "INFO")?;
    close(wr, "STATUS")?;

    open(wr, statement)?;
    leaf(wr, "CURDEF", st.currency.as_str())?;
    write_account(wr, &st.account)?;

    open(wr, "BANKTRANLIST")?;
    if let Some(start) = st.window.start {
        leaf(wr, "DTSTART", &ofx_date(start))?;
    }
    if let Some(end) = st.window.end {
        leaf(wr, "DTEND", &ofx_date(end))?;
    }
    for transaction in &st.transactions {
        write_transaction(wr, transaction)?;
    }
    close(wr, "BANKTRANLIST")?;

    if let Some(ledger) = &st.ledger {
        open(wr, "LEDGERBAL")?;
        leaf(wr, "BALAMT", &ofx_amount(ledger.balance))?;
        leaf(wr, "DTASOF", &ofx_date(ledger.date))?;
        close(wr, "LEDGERBAL")?;
    }

    close(wr, statement)?;
    close(wr, response)?;
    close(wr, message_set)
}

fn write_account(wr: &mut OfxWriter, account: &Account) -> Result<(), OfxError> {
    match &account.sort_code {
        Some(sort_code) => {
            open(wr, "BANKACCTFROM")?;
            leaf(wr, "BANKID", sort_code)?;
            leaf(wr, "ACCTID", &account.number)?;
            leaf(
                wr,
                "ACCTTYPE",
                account.account_type.as_deref().unwrap_or("CHECKING"),
            )?;
            leaf(wr, "ACCTNAME", &account.name)?;
            close(wr, "BANKACCTFROM")
        }
        None => {
            open(wr, "CCACCTFROM")?;
            leaf(wr, "ACCTID", &account.number)?;
            leaf(wr, "ACCTNAME", &account.name)?;
            close(wr, "CCACCTFROM")
        }
    }
}

fn write_transaction(wr: &mut OfxWriter, t: &Transaction) -> Result<(), OfxError> {
    open(wr, "STMTTRN")?;
    leaf(wr, "TRNTYPE", t.transaction_type.as_str())?;
    leaf(wr, "DTPOSTED", &ofx_date(t.date))?;
    leaf(wr, "TRNAMT", &ofx_amount(t.amount))?;
    optional_leaf(wr, "FITID", &t.bank_transaction_id)?;
    optional_leaf(wr, "NAME", &t.description)?;
    leaf(wr, "MEMO", &t.memo)?;
    optional_leaf(wr, "REFNUM", &t.reference)?;
    optional_leaf(wr, "CHECKNUM", &t.check)?;
    for (name, value) in t.extensions.iter() {
        leaf(wr, name, value)?;
    }
    close(wr, "STMTTRN")
}

/// Full precision; `Money`'s `Display` rounds to cents.
fn ofx_amount(amount: Money) -> String {
    amount.as_decimal().to_string()
}

fn ofx_date(date: NaiveDate) -> String {
    date.format("%Y%m%d").to_string()
}

fn open(wr: &mut OfxWriter, name: &str) -> Result<(), OfxError> {
    wr.write_event(Event::Start(BytesStart::new(name)))
        .map_err(markup)
}

fn close(wr: &mut OfxWriter, name: &str) -> Result<(), OfxError> {
    wr.write_event(Event::End(BytesEnd::new(name)))
        .map_err(markup)
}

fn leaf(wr: &mut OfxWriter, name: &str, text: &str) -> Result<(), OfxError> {
    open(wr, name)?;
    wr.write_event(Event::Text(BytesText::new(text)))
        .map_err(markup)?;
    close(wr, name)
}

fn optional_leaf(wr: &mut OfxWriter, name: &str, text: &str) -> Result<(), OfxError> {
    if text.is_empty() {
        return Ok(());
    }
    leaf(wr, name, text)
}
