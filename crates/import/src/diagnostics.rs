use tracing::warn;

use crate::error::{Anomaly, OfxError};

/// Collects one statement's anomalies, or turns the first into an error in
/// strict mode.
#[derive(Debug, Default)]
pub struct Diagnostics {
    strict: bool,
    warnings: Vec<String>,
}

impl Diagnostics {
    pub fn new(strict: bool) -> Self {
        Self {
            strict,
            warnings: Vec::new(),
        }
    }

    pub fn report(&mut self, anomaly: Anomaly) -> Result<(), OfxError> {
        if self.strict {
            return Err(anomaly.into());
        }
        let message = anomaly.to_string();
        warn!("{message}");
        self.warnings.push(message);
        Ok(())
    }

    pub fn warnings(&self) -> &[String] {
        &self.warnings
    }

    pub fn into_warnings(self) -> Vec<String> {
        self.warnings
    }
}
