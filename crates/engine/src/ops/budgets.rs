//! Budget operations and the alert evaluator.

use chrono::{DateTime, Utc};
use sea_orm::{
    ActiveValue, QueryFilter, Statement, TransactionTrait, prelude::*, sea_query::Expr,
};
use uuid::Uuid;

use crate::{
    Account, Budget, EngineError, ResultEngine, TransactionKind, budgets,
    util::{is_same_month, month_bounds},
};

use super::{Engine, with_tx};

/// Percentage of the monthly ceiling at which an alert fires.
const ALERT_THRESHOLD_PERCENT: f64 = 80.0;

/// What the alert evaluator decided for one budget.
#[derive(Clone, Debug, PartialEq)]
pub enum AlertDecision {
    /// Threshold crossed and no alert sent yet this calendar month.
    Send {
        account: Account,
        total_expenses_minor: i64,
        percentage_used: f64,
    },
    /// Below threshold, already alerted this month, or no default account.
    Skip,
}

impl Engine {
    /// Create or replace the user's single budget ceiling.
    pub async fn upsert_budget(&self, user_id: &str, amount_minor: i64) -> ResultEngine<Budget> {
        if amount_minor <= 0 {
            return Err(EngineError::InvalidAmount(
                "budget amount must be > 0".to_string(),
            ));
        }

        with_tx!(self, |db_tx| {
            let existing = budgets::Entity::find()
                .filter(budgets::Column::UserId.eq(user_id))
                .one(&db_tx)
                .await?;

            match existing {
                Some(model) => {
                    let mut active: budgets::ActiveModel = model.into();
                    active.amount_minor = ActiveValue::Set(amount_minor);
                    let updated = active.update(&db_tx).await?;
                    Budget::try_from(updated)
                }
                None => {
                    let budget = Budget::new(user_id.to_string(), amount_minor, Utc::now())?;
                    budgets::ActiveModel::from(&budget).insert(&db_tx).await?;
                    Ok(budget)
                }
            }
        })
    }

    /// The user's budget, if one exists.
    pub async fn budget(&self, user_id: &str) -> ResultEngine<Option<Budget>> {
        budgets::Entity::find()
            .filter(budgets::Column::UserId.eq(user_id))
            .one(&self.database)
            .await?
            .map(Budget::try_from)
            .transpose()
    }

    /// All budgets, for the alert sweep.
    pub async fn all_budgets(&self) -> ResultEngine<Vec<Budget>> {
        let models = budgets::Entity::find().all(&self.database).await?;
        models.into_iter().map(Budget::try_from).collect()
    }

    /// Sum of EXPENSE amounts on one account within the calendar month of
    /// `now`, in minor units.
    pub async fn current_month_expenses(
        &self,
        user_id: &str,
        account_id: Uuid,
        now: DateTime<Utc>,
    ) -> ResultEngine<i64> {
        let (start, end) = month_bounds(now)?;
        let backend = self.database.get_database_backend();

        let stmt = Statement::from_sql_and_values(
            backend,
            "SELECT COALESCE(SUM(amount_minor), 0) AS sum \
             FROM transactions \
             WHERE user_id = ? AND account_id = ? AND kind = ? \
               AND occurred_at >= ? AND occurred_at <= ?",
            [
                user_id.into(),
                account_id.to_string().into(),
                TransactionKind::Expense.as_str().into(),
                start.into(),
                end.into(),
            ],
        );
        let row = self.database.query_one(stmt).await?;
        Ok(row.and_then(|r| r.try_get("", "sum").ok()).unwrap_or(0))
    }

    /// Decide whether `budget` warrants an alert at `now`.
    ///
    /// Expenses are measured on the owner's default account; without one the
    /// evaluation is skipped, not failed. An alert already sent in the same
    /// calendar month suppresses a second one.
    pub async fn evaluate_budget_alert(
        &self,
        budget: &Budget,
        now: DateTime<Utc>,
    ) -> ResultEngine<AlertDecision> {
        let Some(account) = self.default_account(&budget.user_id).await? else {
            return Ok(AlertDecision::Skip);
        };

        let total_expenses_minor = self
            .current_month_expenses(&budget.user_id, account.id, now)
            .await?;
        let percentage_used =
            total_expenses_minor as f64 / budget.amount_minor as f64 * 100.0;

        let already_alerted = budget
            .last_alert_sent
            .is_some_and(|sent| is_same_month(sent, now));

        if percentage_used >= ALERT_THRESHOLD_PERCENT && !already_alerted {
            Ok(AlertDecision::Send {
                account,
                total_expenses_minor,
                percentage_used,
            })
        } else {
            Ok(AlertDecision::Skip)
        }
    }

    /// Record that an alert went out, suppressing further ones this month.
    pub async fn mark_alert_sent(&self, budget_id: Uuid, now: DateTime<Utc>) -> ResultEngine<()> {
        let result = budgets::Entity::update_many()
            .col_expr(budgets::Column::LastAlertSent, Expr::value(Some(now)))
            .filter(budgets::Column::Id.eq(budget_id.to_string()))
            .exec(&self.database)
            .await?;
        if result.rows_affected == 0 {
            return Err(EngineError::NotFound("budget not exists".to_string()));
        }
        Ok(())
    }
}
