use ledgerline_core::{
    Account, CurrencyCode, DateWindow, Ledger, Money, StatementResult, Transaction,
};
use tracing::{debug, warn};

use crate::config::ParseOptions;
use crate::cursor::{CursorEvent, ElementCursor, ElementStart, SourceLocator};
use crate::diagnostics::Diagnostics;
use crate::error::{Anomaly, OfxError};
use crate::extract::{extract_account, extract_date, extract_ledger, extract_transaction};
use crate::normalize::normalize_currency_or;
use crate::tree::Element;
use crate::util::re;

re!(re_child_open, r"<[A-Za-z]");
re!(re_stmttrn_open, r"<STMTTRN\b");

/// State for one `STMTRS`/`CCSTMTRS` while the cursor walks it.
pub struct StatementAssembler<'o> {
    options: &'o ParseOptions,
    currency: CurrencyCode,
    account: Option<Account>,
    ledger: Option<Ledger>,
    transactions: Vec<Transaction>,
    running: Option<Money>,
    window: DateWindow,
    diag: Diagnostics,
}

impl<'o> StatementAssembler<'o> {
    pub fn new(options: &'o ParseOptions) -> Self {
        Self {
            options,
            currency: options.default_currency.clone(),
            account: None,
            ledger: None,
            transactions: Vec::new(),
            running: None,
            window: DateWindow::default(),
            diag: Diagnostics::new(options.strict),
        }
    }

    /// Consumes the statement element the cursor has just entered.
    pub fn assemble(
        mut self,
        cursor: &mut ElementCursor<'_>,
        statement: &ElementStart,
        locator: &mut SourceLocator<'_>,
    ) -> Result<StatementResult, OfxError> {
        if statement.is_empty() {
            return self.finish();
        }
        while let Some(event) = cursor.next_within(statement.depth)? {
            let CursorEvent::Start(start) = event else {
                continue;
            };
            match start.name.as_str() {
                "CURDEF" => {
                    let el = Element::parse(cursor.take_element(&start)?)?;
                    self.currency = normalize_currency_or(&el.text, &self.options.default_currency);
                }
                "BANKACCTFROM" | "CCACCTFROM" | "ACCTFROM" => {
                    let xml = cursor.take_element(&start)?;
                    if self.account.is_some() {
                        debug!("ignoring additional {} block", start.name);
                        continue;
                    }
                    self.account = Some(extract_account(xml, &self.currency, &mut self.diag)?);
                }
                "LEDGERBAL" => {
                    let xml = cursor.take_element(&start)?;
                    self.ledger = extract_ledger(xml, &self.currency);
                }
                "BANKTRANLIST" if !start.is_empty() => {
                    self.transaction_list(cursor, start.depth, locator)?;
                }
                _ => {}
            }
        }
        self.finish()
    }

    fn transaction_list(
        &mut self,
        cursor: &mut ElementCursor<'_>,
        depth: usize,
        locator: &mut SourceLocator<'_>,
    ) -> Result<(), OfxError> {
        while let Some(event) = cursor.next_within(depth)? {
            let CursorEvent::Start(start) = event else {
                continue;
            };
            match start.name.as_str() {
                "DTSTART" => {
                    let xml = self.window_bound(cursor, &start, locator)?;
                    self.window.start = extract_date(xml, "DTSTART", &mut self.diag)?;
                }
                "DTEND" => {
                    let xml = self.window_bound(cursor, &start, locator)?;
                    self.window.end = extract_date(xml, "DTEND", &mut self.diag)?;
                }
                "STMTTRN" => {
                    let position = locator.next_transaction();
                    if position.is_none() {
                        debug!("no source position for STMTTRN");
                    }
                    let xml = cursor.take_element(&start)?;
                    if let Some(transaction) = extract_transaction(
                        xml,
                        self.window,
                        &mut self.running,
                        position,
                        self.options,
                        &mut self.diag,
                    )? {
                        self.transactions.push(transaction);
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Takes a `DTSTART`/`DTEND` element. An empty SGML date leaf swallows the
    /// siblings after it; anything it absorbed is logged, and its `STMTTRN`
    /// tags are skipped in the locator so later line numbers stay correct.
    fn window_bound<'a>(
        &self,
        cursor: &mut ElementCursor<'a>,
        start: &ElementStart,
        locator: &mut SourceLocator<'_>,
    ) -> Result<&'a str, OfxError> {
        let xml = cursor.take_element(start)?;
        if re_child_open().is_match(&xml[1..]) {
            let absorbed = re_stmttrn_open().find_iter(xml).count();
            for _ in 0..absorbed {
                locator.next_transaction();
            }
            warn!(
                element = %start.name,
                absorbed,
                "date element has child elements; absorbed transactions are not imported"
            );
        }
        Ok(xml)
    }

    fn finish(self) -> Result<StatementResult, OfxError> {
        let Self {
            currency,
            account,
            ledger,
            transactions,
            running,
            window,
            mut diag,
            ..
        } = self;

        let account = match account {
            Some(account) => account,
            None => {
                diag.report(Anomaly::MissingAccount)?;
                Account::placeholder(currency.clone())
            }
        };

        Ok(StatementResult {
            account: Account {
                currency: currency.clone(),
                ..account
            },
            ledger: ledger.map(|ledger| Ledger {
                currency: currency.clone(),
                ..ledger
            }),
            transactions,
            warnings: diag.into_warnings(),
            currency,
            window,
            closing_balance: running,
        })
    }
}
