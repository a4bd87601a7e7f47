//! Port contracts bridging the timing domain to storage adapters.

mod repository;
mod transaction;

pub use repository::{EventLogRepository, EventLogRepositoryError};
pub use transaction::{TimingTransaction, TimingTransactionError, TimingWriteOp, TimingWriteResult};
