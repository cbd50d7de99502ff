pub mod account;
pub mod money;
pub mod period;
pub mod statement;
pub mod transaction;

pub use account::{Account, Ledger, DEFAULT_ACCOUNT_NAME, PLACEHOLDER_ACCOUNT_NUMBER};
pub use money::{CurrencyCode, CurrencyError, Money, MAX_MAGNITUDE};
pub use period::DateWindow;
pub use statement::StatementResult;
pub use transaction::{Extensions, Transaction, TransactionType};
