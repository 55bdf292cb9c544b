//! Transaction primitives.
//!
//! A `Transaction` is a single ledger entry. Recurring templates are
//! transactions with `is_recurring = true`; they additionally carry the
//! interval and the next due date, and spawn concrete non-recurring entries
//! when materialized.

use chrono::{DateTime, Utc};
use sea_orm::{ActiveValue, entity::prelude::*};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{EngineError, RecurringInterval, ResultEngine};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Income => "INCOME",
            Self::Expense => "EXPENSE",
        }
    }
}

impl TryFrom<&str> for TransactionKind {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "INCOME" => Ok(Self::Income),
            "EXPENSE" => Ok(Self::Expense),
            other => Err(EngineError::Validation(format!(
                "invalid transaction kind: {other}"
            ))),
        }
    }
}

/// Signed contribution of a transaction to its account balance.
pub fn signed_amount(kind: TransactionKind, amount_minor: i64) -> i64 {
    match kind {
        TransactionKind::Income => amount_minor,
        TransactionKind::Expense => -amount_minor,
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: Uuid,
    pub user_id: String,
    pub account_id: Uuid,
    pub kind: TransactionKind,
    /// Amount in integer minor units (cents), always > 0; the sign comes
    /// from `kind`.
    pub amount_minor: i64,
    pub category: String,
    pub description: Option<String>,
    pub occurred_at: DateTime<Utc>,
    pub is_recurring: bool,
    pub recurring_interval: Option<RecurringInterval>,
    pub next_recurring_date: Option<DateTime<Utc>>,
    pub last_processed: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Transaction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        user_id: String,
        account_id: Uuid,
        kind: TransactionKind,
        amount_minor: i64,
        category: String,
        description: Option<String>,
        occurred_at: DateTime<Utc>,
        recurring_interval: Option<RecurringInterval>,
        next_recurring_date: Option<DateTime<Utc>>,
    ) -> ResultEngine<Self> {
        if amount_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "amount_minor must be > 0".to_string(),
            ));
        }
        // Recurrence fields come and go together.
        match (recurring_interval, next_recurring_date) {
            (Some(_), Some(_)) | (None, None) => {}
            _ => {
                return Err(EngineError::Validation(
                    "recurring_interval and next_recurring_date must be set together".to_string(),
                ));
            }
        }

        Ok(Self {
            id: Uuid::new_v4(),
            user_id,
            account_id,
            kind,
            amount_minor,
            category,
            description,
            occurred_at,
            is_recurring: recurring_interval.is_some(),
            recurring_interval,
            next_recurring_date,
            last_processed: None,
            created_at: occurred_at,
        })
    }
}

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: String,
    pub user_id: String,
    pub account_id: String,
    pub kind: String,
    pub amount_minor: i64,
    pub category: String,
    pub description: Option<String>,
    pub occurred_at: DateTimeUtc,
    pub is_recurring: bool,
    pub recurring_interval: Option<String>,
    pub next_recurring_date: Option<DateTimeUtc>,
    pub last_processed: Option<DateTimeUtc>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id"
    )]
    Accounts,
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Accounts.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl From<&Transaction> for ActiveModel {
    fn from(tx: &Transaction) -> Self {
        Self {
            id: ActiveValue::Set(tx.id.to_string()),
            user_id: ActiveValue::Set(tx.user_id.clone()),
            account_id: ActiveValue::Set(tx.account_id.to_string()),
            kind: ActiveValue::Set(tx.kind.as_str().to_string()),
            amount_minor: ActiveValue::Set(tx.amount_minor),
            category: ActiveValue::Set(tx.category.clone()),
            description: ActiveValue::Set(tx.description.clone()),
            occurred_at: ActiveValue::Set(tx.occurred_at),
            is_recurring: ActiveValue::Set(tx.is_recurring),
            recurring_interval: ActiveValue::Set(
                tx.recurring_interval.map(|i| i.as_str().to_string()),
            ),
            next_recurring_date: ActiveValue::Set(tx.next_recurring_date),
            last_processed: ActiveValue::Set(tx.last_processed),
            created_at: ActiveValue::Set(tx.created_at),
        }
    }
}

impl TryFrom<Model> for Transaction {
    type Error = EngineError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        Ok(Self {
            id: Uuid::parse_str(&model.id)
                .map_err(|_| EngineError::NotFound("transaction not exists".to_string()))?,
            user_id: model.user_id,
            account_id: Uuid::parse_str(&model.account_id)
                .map_err(|_| EngineError::NotFound("account not exists".to_string()))?,
            kind: TransactionKind::try_from(model.kind.as_str())?,
            amount_minor: model.amount_minor,
            category: model.category,
            description: model.description,
            occurred_at: model.occurred_at,
            is_recurring: model.is_recurring,
            recurring_interval: model
                .recurring_interval
                .as_deref()
                .map(RecurringInterval::try_from)
                .transpose()?,
            next_recurring_date: model.next_recurring_date,
            last_processed: model.last_processed,
            created_at: model.created_at,
        })
    }
}
