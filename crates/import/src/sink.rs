use ledgerline_core::StatementResult;
use serde::Serialize;
use thiserror::Error;
use tracing::info;

use crate::config::ParseOptions;
use crate::error::OfxError;
use crate::ofx::parse_with;

/// Receives parsed statements, e.g. to map accounts and store transactions.
pub trait StatementSink {
    type Error: std::error::Error + 'static;

    fn accept(&mut self, statement: StatementResult) -> Result<(), Self::Error>;
}

impl StatementSink for Vec<StatementResult> {
    type Error = std::convert::Infallible;

    fn accept(&mut self, statement: StatementResult) -> Result<(), Self::Error> {
        self.push(statement);
        Ok(())
    }
}

#[derive(Error, Debug)]
pub enum IngestError<E: std::error::Error + 'static> {
    #[error(transparent)]
    Parse(#[from] OfxError),
    #[error("Statement for account {account} was rejected: {source}")]
    Sink {
        account: String,
        #[source]
        source: E,
    },
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    pub statements: usize,
    pub transactions: usize,
    pub warnings: usize,
}

/// Parses `raw` and hands every statement to `sink` in file order.
///
/// Nothing reaches the sink unless the whole file parses; a sink error stops
/// delivery of the remaining statements.
pub fn ingest<S: StatementSink>(
    raw: &[u8],
    options: &ParseOptions,
    sink: &mut S,
) -> Result<IngestSummary, IngestError<S::Error>> {
    let statements = parse_with(raw, options)?;
    let mut summary = IngestSummary::default();

    for statement in statements {
        let account = statement.account.to_string();
        let transactions = statement.transactions.len();
        let warnings = statement.warnings.len();

        sink.accept(statement)
            .map_err(|source| IngestError::Sink {
                account: account.clone(),
                source,
            })?;

        info!(%account, transactions, warnings, "statement delivered");
        summary.statements += 1;
        summary.transactions += transactions;
        summary.warnings += warnings;
    }

    Ok(summary)
}
