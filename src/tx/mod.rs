//! Transaction lifecycle: fee policy, building, submission and receipt tracking

pub mod builder;
pub mod fee;
mod receipt;
mod sender;

pub use builder::ContractCall;
pub use sender::{SubmitOutcome, SubmitPolicy, TransactionSubmitter};
