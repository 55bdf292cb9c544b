//! Transaction CRUD.
//!
//! Every write pairs the ledger change with an atomic adjustment of the
//! owning account's `balance_minor`, inside one DB transaction.

use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, QuerySelect, TransactionTrait,
    prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    CreateTransactionCmd, EngineError, RecurrencePatch, ResultEngine, Transaction, accounts,
    next_occurrence, signed_amount, transactions,
};

use super::{Engine, normalize_optional_text, normalize_required_text, with_tx};

/// Applies `delta_minor` to an account balance with a single UPDATE.
pub(super) async fn adjust_balance(
    db_tx: &DatabaseTransaction,
    account_id: &str,
    delta_minor: i64,
) -> ResultEngine<()> {
    let result = accounts::Entity::update_many()
        .col_expr(
            accounts::Column::BalanceMinor,
            Expr::col(accounts::Column::BalanceMinor).add(delta_minor),
        )
        .filter(accounts::Column::Id.eq(account_id))
        .exec(db_tx)
        .await?;
    if result.rows_affected == 0 {
        return Err(EngineError::NotFound("account not exists".to_string()));
    }
    Ok(())
}

/// Loads a transaction scoped to its owner, or NotFound.
pub(super) async fn require_owned_transaction(
    db_tx: &DatabaseTransaction,
    transaction_id: Uuid,
    user_id: &str,
) -> ResultEngine<transactions::Model> {
    transactions::Entity::find_by_id(transaction_id.to_string())
        .filter(transactions::Column::UserId.eq(user_id))
        .one(db_tx)
        .await?
        .ok_or_else(|| EngineError::NotFound("transaction not exists".to_string()))
}

impl Engine {
    /// Create a ledger transaction and apply its balance effect.
    ///
    /// When `recurring_interval` is set the row becomes a recurring template
    /// whose `next_recurring_date` is one interval after `occurred_at`.
    pub async fn create_transaction(
        &self,
        cmd: CreateTransactionCmd,
    ) -> ResultEngine<Transaction> {
        let category = normalize_required_text(&cmd.category, "category")?;
        let description = normalize_optional_text(cmd.description.as_deref());

        with_tx!(self, |db_tx| {
            // Ownership check before any write: the denormalized user/account
            // pair must agree.
            accounts::Entity::find_by_id(cmd.account_id.to_string())
                .filter(accounts::Column::UserId.eq(cmd.user_id.as_str()))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound("account not exists".to_string()))?;

            let next_recurring_date = cmd
                .recurring_interval
                .map(|interval| next_occurrence(cmd.occurred_at, interval))
                .transpose()?;

            let tx = Transaction::new(
                cmd.user_id.clone(),
                cmd.account_id,
                cmd.kind,
                cmd.amount_minor,
                category,
                description,
                cmd.occurred_at,
                cmd.recurring_interval,
                next_recurring_date,
            )?;

            transactions::ActiveModel::from(&tx).insert(&db_tx).await?;
            adjust_balance(
                &db_tx,
                &cmd.account_id.to_string(),
                signed_amount(cmd.kind, cmd.amount_minor),
            )
            .await?;

            Ok(tx)
        })
    }

    /// Update a transaction; the account balance absorbs the net change
    /// between the old and the new signed amount.
    pub async fn update_transaction(
        &self,
        cmd: crate::UpdateTransactionCmd,
    ) -> ResultEngine<Transaction> {
        with_tx!(self, |db_tx| {
            let model = require_owned_transaction(&db_tx, cmd.transaction_id, &cmd.user_id).await?;
            let current = Transaction::try_from(model)?;
            let old_signed = signed_amount(current.kind, current.amount_minor);

            let kind = cmd.kind.unwrap_or(current.kind);
            let amount_minor = cmd.amount_minor.unwrap_or(current.amount_minor);
            if amount_minor <= 0 {
                return Err(EngineError::InvalidAmount(
                    "amount_minor must be > 0".to_string(),
                ));
            }
            let category = match cmd.category.as_deref() {
                Some(value) => normalize_required_text(value, "category")?,
                None => current.category.clone(),
            };
            let description = match cmd.description.as_deref() {
                Some(value) => normalize_optional_text(Some(value)),
                None => current.description.clone(),
            };
            let occurred_at = cmd.occurred_at.unwrap_or(current.occurred_at);

            let interval = match cmd.recurrence {
                RecurrencePatch::Keep => current.recurring_interval,
                RecurrencePatch::Clear => None,
                RecurrencePatch::Set(interval) => Some(interval),
            };
            // The next due date follows the (possibly new) occurrence date.
            let next_recurring_date = interval
                .map(|interval| next_occurrence(occurred_at, interval))
                .transpose()?;
            let last_processed = interval.and(current.last_processed);

            let new_signed = signed_amount(kind, amount_minor);

            let active = transactions::ActiveModel {
                id: ActiveValue::Set(current.id.to_string()),
                kind: ActiveValue::Set(kind.as_str().to_string()),
                amount_minor: ActiveValue::Set(amount_minor),
                category: ActiveValue::Set(category),
                description: ActiveValue::Set(description),
                occurred_at: ActiveValue::Set(occurred_at),
                is_recurring: ActiveValue::Set(interval.is_some()),
                recurring_interval: ActiveValue::Set(interval.map(|i| i.as_str().to_string())),
                next_recurring_date: ActiveValue::Set(next_recurring_date),
                last_processed: ActiveValue::Set(last_processed),
                ..Default::default()
            };
            let updated = active.update(&db_tx).await?;

            adjust_balance(
                &db_tx,
                &current.account_id.to_string(),
                new_signed - old_signed,
            )
            .await?;

            Transaction::try_from(updated)
        })
    }

    /// Delete a transaction and revert its balance effect.
    pub async fn delete_transaction(
        &self,
        transaction_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let model = require_owned_transaction(&db_tx, transaction_id, user_id).await?;
            let tx = Transaction::try_from(model.clone())?;

            model.delete(&db_tx).await?;
            adjust_balance(
                &db_tx,
                &tx.account_id.to_string(),
                -signed_amount(tx.kind, tx.amount_minor),
            )
            .await?;

            Ok(())
        })
    }

    /// Return one transaction, scoped to its owner.
    pub async fn transaction(
        &self,
        transaction_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<Transaction> {
        let model = transactions::Entity::find_by_id(transaction_id.to_string())
            .filter(transactions::Column::UserId.eq(user_id))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::NotFound("transaction not exists".to_string()))?;
        Transaction::try_from(model)
    }

    /// List an account's transactions, most recent first.
    pub async fn list_transactions(
        &self,
        account_id: Uuid,
        user_id: &str,
        limit: u64,
    ) -> ResultEngine<Vec<Transaction>> {
        // Authorization check via account lookup.
        self.account(account_id, user_id).await?;

        let models = transactions::Entity::find()
            .filter(transactions::Column::AccountId.eq(account_id.to_string()))
            .order_by_desc(transactions::Column::OccurredAt)
            .limit(limit)
            .all(&self.database)
            .await?;
        models.into_iter().map(Transaction::try_from).collect()
    }
}
