//! Account operations.

use chrono::Utc;
use sea_orm::{
    ActiveValue, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder, TransactionTrait,
    prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{Account, CreateAccountCmd, EngineError, ResultEngine, accounts};

use super::{Engine, normalize_required_text, with_tx};

/// Clears `is_default` on every account of `user_id` that currently has it.
async fn demote_default(db_tx: &DatabaseTransaction, user_id: &str) -> ResultEngine<()> {
    accounts::Entity::update_many()
        .col_expr(accounts::Column::IsDefault, Expr::value(false))
        .filter(accounts::Column::UserId.eq(user_id))
        .filter(accounts::Column::IsDefault.eq(true))
        .exec(db_tx)
        .await?;
    Ok(())
}

impl Engine {
    /// Create an account.
    ///
    /// A user's first account is always the default; otherwise the flag comes
    /// from the command. Promoting a new default demotes the previous one in
    /// the same DB transaction.
    pub async fn create_account(&self, cmd: CreateAccountCmd) -> ResultEngine<Account> {
        let name = normalize_required_text(&cmd.name, "account name")?;

        with_tx!(self, |db_tx| {
            let existing = accounts::Entity::find()
                .filter(accounts::Column::UserId.eq(cmd.user_id.as_str()))
                .count(&db_tx)
                .await?;
            let is_default = existing == 0 || cmd.is_default;

            if is_default {
                demote_default(&db_tx, &cmd.user_id).await?;
            }

            let account = Account::new(
                cmd.user_id.clone(),
                name,
                cmd.kind,
                cmd.balance_minor,
                is_default,
                Utc::now(),
            )?;
            accounts::ActiveModel::from(&account).insert(&db_tx).await?;
            Ok(account)
        })
    }

    /// Promote an account to the user's default, demoting the previous one.
    pub async fn set_default_account(
        &self,
        account_id: Uuid,
        user_id: &str,
    ) -> ResultEngine<Account> {
        with_tx!(self, |db_tx| {
            let model = accounts::Entity::find_by_id(account_id.to_string())
                .filter(accounts::Column::UserId.eq(user_id))
                .one(&db_tx)
                .await?
                .ok_or_else(|| EngineError::NotFound("account not exists".to_string()))?;

            demote_default(&db_tx, user_id).await?;

            let mut active: accounts::ActiveModel = model.into();
            active.is_default = ActiveValue::Set(true);
            let updated = active.update(&db_tx).await?;
            Account::try_from(updated)
        })
    }

    /// Return one account, scoped to its owner.
    pub async fn account(&self, account_id: Uuid, user_id: &str) -> ResultEngine<Account> {
        let model = accounts::Entity::find_by_id(account_id.to_string())
            .filter(accounts::Column::UserId.eq(user_id))
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::NotFound("account not exists".to_string()))?;
        Account::try_from(model)
    }

    /// List a user's accounts, newest first.
    pub async fn list_accounts(&self, user_id: &str) -> ResultEngine<Vec<Account>> {
        let models = accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(user_id))
            .order_by_desc(accounts::Column::CreatedAt)
            .all(&self.database)
            .await?;
        models.into_iter().map(Account::try_from).collect()
    }

    /// The account with `is_default = true` for this user, if any.
    pub async fn default_account(&self, user_id: &str) -> ResultEngine<Option<Account>> {
        accounts::Entity::find()
            .filter(accounts::Column::UserId.eq(user_id))
            .filter(accounts::Column::IsDefault.eq(true))
            .one(&self.database)
            .await?
            .map(Account::try_from)
            .transpose()
    }
}
