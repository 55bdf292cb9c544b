//! Recurring-transaction selection and materialization.
//!
//! The dispatcher delivers due events at-least-once. The materializer's
//! first statement therefore *claims* the template by advancing its schedule
//! with a guarded UPDATE; a redelivered event matches zero rows and the call
//! becomes a no-op instead of a duplicate fire.

use chrono::{DateTime, Utc};
use sea_orm::{
    Condition, QueryFilter, TransactionTrait, prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    EngineError, ResultEngine, Transaction, next_occurrence, signed_amount, transactions,
};

use super::{Engine, transactions::adjust_balance, with_tx};

/// Result of a materialization attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MaterializeOutcome {
    /// A ledger transaction was created and the balance adjusted.
    Fired { transaction_id: Uuid },
    /// The template was not due anymore (already claimed by an earlier
    /// delivery); nothing was written.
    Skipped,
}

/// The due predicate: recurring, and never processed or past its next date.
fn due_condition(now: DateTime<Utc>) -> Condition {
    Condition::all()
        .add(transactions::Column::IsRecurring.eq(true))
        .add(
            Condition::any()
                .add(transactions::Column::LastProcessed.is_null())
                .add(transactions::Column::NextRecurringDate.lte(now)),
        )
}

impl Engine {
    /// Recurring templates eligible to fire at `now`, across all users.
    ///
    /// Pure query; ordering between due templates is not significant because
    /// each one is materialized independently.
    pub async fn due_recurring_transactions(
        &self,
        now: DateTime<Utc>,
    ) -> ResultEngine<Vec<Transaction>> {
        let models = transactions::Entity::find()
            .filter(due_condition(now))
            .all(&self.database)
            .await?;
        models.into_iter().map(Transaction::try_from).collect()
    }

    /// Turn a due recurring template into a concrete ledger transaction.
    ///
    /// One DB transaction performs, in order:
    /// 1. the claim: `last_processed = now`, `next_recurring_date` advanced
    ///    by one interval, guarded by the due predicate;
    /// 2. the insert of a non-recurring ledger row dated `now`;
    /// 3. the atomic balance adjustment on the owning account.
    pub async fn materialize_recurring(
        &self,
        transaction_id: Uuid,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> ResultEngine<MaterializeOutcome> {
        with_tx!(self, |db_tx| {
            let model = transactions::Entity::find_by_id(transaction_id.to_string())
                .filter(transactions::Column::UserId.eq(user_id))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound("transaction not exists".to_string()))?;
            let template = Transaction::try_from(model)?;

            if !template.is_recurring {
                return Err(EngineError::Validation(
                    "transaction is not recurring".to_string(),
                ));
            }
            let interval = template.recurring_interval.ok_or_else(|| {
                EngineError::Validation("recurring transaction without interval".to_string())
            })?;
            let next = next_occurrence(now, interval)?;

            let claimed = transactions::Entity::update_many()
                .col_expr(transactions::Column::LastProcessed, Expr::value(Some(now)))
                .col_expr(
                    transactions::Column::NextRecurringDate,
                    Expr::value(Some(next)),
                )
                .filter(transactions::Column::Id.eq(transaction_id.to_string()))
                .filter(due_condition(now))
                .exec(&db_tx)
                .await?;

            if claimed.rows_affected == 0 {
                Ok(MaterializeOutcome::Skipped)
            } else {
                let description = match template.description.as_deref() {
                    Some(text) => format!("{text} (Recurring)"),
                    None => format!("{} (Recurring)", template.category),
                };
                let ledger = Transaction::new(
                    template.user_id.clone(),
                    template.account_id,
                    template.kind,
                    template.amount_minor,
                    template.category.clone(),
                    Some(description),
                    now,
                    None,
                    None,
                )?;
                transactions::ActiveModel::from(&ledger)
                    .insert(&db_tx)
                    .await?;

                adjust_balance(
                    &db_tx,
                    &template.account_id.to_string(),
                    signed_amount(template.kind, template.amount_minor),
                )
                .await?;

                Ok(MaterializeOutcome::Fired {
                    transaction_id: ledger.id,
                })
            }
        })
    }
}
