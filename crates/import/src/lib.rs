pub mod assembler;
pub mod config;
pub mod cursor;
pub mod diagnostics;
pub mod error;
pub mod export;
pub mod extract;
pub mod normalize;
pub mod ofx;
pub mod repair;
pub mod sink;
pub mod tree;
pub(crate) mod util;

pub use config::ParseOptions;
pub use error::{Anomaly, OfxError};
pub use export::to_ofx;
pub use ofx::{decode, parse, parse_with, OfxParser};
pub use sink::{ingest, IngestError, IngestSummary, StatementSink};

pub mod import {
    use crate::*;
    use ledgerline_core::StatementResult;

    pub fn import_ofx(data: &[u8], strict: bool) -> Result<Vec<StatementResult>, OfxError> {
        crate::ofx::parse(data, strict)
    }

    pub fn import_ofx_with_config(
        data: &[u8],
        config_toml: &str,
    ) -> Result<Vec<StatementResult>, OfxError> {
        let options = ParseOptions::from_toml(config_toml)?;
        crate::ofx::parse_with(data, &options)
    }

    pub fn export_ofx(statements: &[StatementResult]) -> Result<String, OfxError> {
        crate::export::to_ofx(statements)
    }
}
