//! User lookups for the background jobs.

use sea_orm::prelude::*;

use crate::{EngineError, ResultEngine, users};

use super::Engine;

impl Engine {
    /// Load one user row, or NotFound.
    pub async fn user(&self, username: &str) -> ResultEngine<users::Model> {
        users::Entity::find_by_id(username)
            .one(&self.database)
            .await?
            .ok_or_else(|| EngineError::NotFound("user not exists".to_string()))
    }

    /// Every user, for the monthly report sweep.
    pub async fn list_users(&self) -> ResultEngine<Vec<users::Model>> {
        Ok(users::Entity::find().all(&self.database).await?)
    }
}
