//! Request/response payloads shared between the server and its clients.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AccountKind {
    Current,
    Saving,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    Income,
    Expense,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecurringInterval {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

pub mod account {
    use super::*;
    use uuid::Uuid;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountNew {
        pub name: String,
        pub kind: AccountKind,
        /// Opening balance in minor units (cents).
        pub balance_minor: i64,
        pub is_default: Option<bool>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct AccountView {
        pub id: Uuid,
        pub name: String,
        pub kind: AccountKind,
        pub balance_minor: i64,
        pub is_default: bool,
        pub created_at: DateTime<Utc>,
    }
}

pub mod transaction {
    use super::*;
    use uuid::Uuid;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionNew {
        pub account_id: Uuid,
        pub kind: TransactionKind,
        /// Amount in minor units (cents), > 0; the sign follows `kind`.
        pub amount_minor: i64,
        pub category: String,
        pub description: Option<String>,
        pub occurred_at: DateTime<Utc>,
        /// Present iff the transaction is a recurring template.
        pub recurring_interval: Option<RecurringInterval>,
    }

    /// Patch payload; absent fields keep their current value.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct TransactionUpdate {
        pub kind: Option<TransactionKind>,
        pub amount_minor: Option<i64>,
        pub category: Option<String>,
        pub description: Option<String>,
        pub occurred_at: Option<DateTime<Utc>>,
        pub recurring_interval: Option<RecurringInterval>,
        /// Set to stop the template from recurring. Mutually exclusive with
        /// `recurring_interval`.
        pub clear_recurring: Option<bool>,
    }

    /// Query parameters for the transaction list.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionList {
        pub account_id: Uuid,
        pub limit: Option<u64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionView {
        pub id: Uuid,
        pub account_id: Uuid,
        pub kind: TransactionKind,
        pub amount_minor: i64,
        pub category: String,
        pub description: Option<String>,
        pub occurred_at: DateTime<Utc>,
        pub is_recurring: bool,
        pub recurring_interval: Option<RecurringInterval>,
        pub next_recurring_date: Option<DateTime<Utc>>,
        pub last_processed: Option<DateTime<Utc>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct TransactionCreated {
        pub id: Uuid,
    }
}

pub mod budget {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetPut {
        /// Monthly ceiling in minor units (cents).
        pub amount_minor: i64,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct BudgetView {
        pub amount_minor: i64,
        pub last_alert_sent: Option<DateTime<Utc>>,
        /// EXPENSE total on the default account this month; `None` when the
        /// user has no default account.
        pub current_month_expenses_minor: Option<i64>,
        pub percentage_used: Option<f64>,
    }
}

pub mod receipt {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReceiptScan {
        /// Base64-encoded image bytes.
        pub image_base64: String,
        pub mime_type: String,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ReceiptView {
        pub amount_minor: i64,
        pub date: DateTime<Utc>,
        pub description: String,
        pub merchant_name: String,
        pub category: String,
    }
}
