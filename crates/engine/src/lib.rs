//! Domain engine for gruzzolo: accounts, ledger transactions, recurring
//! templates and budget alerts over a sea-orm backed store.
//!
//! All monetary values are integer minor units (cents). Multi-step writes run
//! inside a single DB transaction; the store's atomicity is the only locking
//! layer (no application-level locks).

pub use accounts::{Account, AccountKind};
pub use budgets::Budget;
pub use commands::{
    CreateAccountCmd, CreateTransactionCmd, RecurrencePatch, UpdateTransactionCmd,
};
pub use error::EngineError;
pub use ops::{AlertDecision, Engine, EngineBuilder, MaterializeOutcome, MonthlyStats};
pub use recurrence::{RecurringInterval, next_occurrence};
pub use transactions::{Transaction, TransactionKind, signed_amount};

pub mod accounts;
pub mod budgets;
mod commands;
mod error;
mod ops;
mod recurrence;
pub mod transactions;
pub mod users;
mod util;

pub type ResultEngine<T> = Result<T, EngineError>;
