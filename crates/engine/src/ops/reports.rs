//! Monthly report aggregation.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use sea_orm::{QueryFilter, prelude::*};

use crate::{ResultEngine, Transaction, TransactionKind, transactions, util::month_bounds};

use super::Engine;

/// One user's totals for a calendar month.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MonthlyStats {
    pub total_income_minor: i64,
    pub total_expenses_minor: i64,
    /// Expense totals keyed by category.
    pub expense_by_category: HashMap<String, i64>,
    pub transaction_count: usize,
}

impl Engine {
    /// Aggregate a user's transactions over the calendar month containing
    /// `month_anchor`.
    pub async fn monthly_stats(
        &self,
        user_id: &str,
        month_anchor: DateTime<Utc>,
    ) -> ResultEngine<MonthlyStats> {
        let (start, end) = month_bounds(month_anchor)?;

        let models = transactions::Entity::find()
            .filter(transactions::Column::UserId.eq(user_id))
            .filter(transactions::Column::OccurredAt.gte(start))
            .filter(transactions::Column::OccurredAt.lte(end))
            .all(&self.database)
            .await?;

        let mut stats = MonthlyStats {
            transaction_count: models.len(),
            ..Default::default()
        };
        for model in models {
            let tx = Transaction::try_from(model)?;
            match tx.kind {
                TransactionKind::Income => stats.total_income_minor += tx.amount_minor,
                TransactionKind::Expense => {
                    stats.total_expenses_minor += tx.amount_minor;
                    *stats.expense_by_category.entry(tx.category).or_insert(0) +=
                        tx.amount_minor;
                }
            }
        }
        Ok(stats)
    }
}
