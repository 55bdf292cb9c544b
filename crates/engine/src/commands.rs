//! Command structs for engine operations.
//!
//! These types group parameters for write operations, keeping call sites
//! readable and avoiding long argument lists.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{AccountKind, RecurringInterval, TransactionKind};

/// Create an account.
#[derive(Clone, Debug)]
pub struct CreateAccountCmd {
    pub user_id: String,
    pub name: String,
    pub kind: AccountKind,
    pub balance_minor: i64,
    pub is_default: bool,
}

/// Create a ledger transaction (optionally a recurring template).
#[derive(Clone, Debug)]
pub struct CreateTransactionCmd {
    pub user_id: String,
    pub account_id: Uuid,
    pub kind: TransactionKind,
    pub amount_minor: i64,
    pub category: String,
    pub description: Option<String>,
    pub occurred_at: DateTime<Utc>,
    /// `Some` makes the transaction a recurring template; its
    /// `next_recurring_date` is computed from `occurred_at`.
    pub recurring_interval: Option<RecurringInterval>,
}

/// How an update touches the recurrence fields.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RecurrencePatch {
    /// Leave the recurrence configuration as it is.
    #[default]
    Keep,
    /// Stop the template from recurring; clears interval, next date and
    /// last-processed marker.
    Clear,
    /// Set (or change) the interval; the next date is recomputed from the
    /// transaction's occurrence date.
    Set(RecurringInterval),
}

/// Update a transaction. `None` fields keep their current value.
#[derive(Clone, Debug)]
pub struct UpdateTransactionCmd {
    pub user_id: String,
    pub transaction_id: Uuid,
    pub kind: Option<TransactionKind>,
    pub amount_minor: Option<i64>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub occurred_at: Option<DateTime<Utc>>,
    pub recurrence: RecurrencePatch,
}
