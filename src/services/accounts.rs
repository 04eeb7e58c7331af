use crate::{
    entities::{purchased_program, Program, ProgramModel, PurchasedProgram, User, UserModel},
    errors::ServiceError,
};
use chrono::{DateTime, Utc};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// Profile and purchase history reads
#[derive(Clone)]
pub struct AccountService {
    db: Arc<DatabaseConnection>,
}

/// One entry of a user's purchase history
#[derive(Debug, Serialize)]
pub struct PurchaseRecord {
    pub program: ProgramModel,
    pub payment_id: Uuid,
    pub granted_at: DateTime<Utc>,
}

impl AccountService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn get_profile(&self, user_id: Uuid) -> Result<UserModel, ServiceError> {
        User::find_by_id(user_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("User {} not found", user_id)))
    }

    /// Programs the user has been granted, newest first.
    #[instrument(skip(self))]
    pub async fn purchase_history(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<PurchaseRecord>, ServiceError> {
        let rows = PurchasedProgram::find()
            .filter(purchased_program::Column::UserId.eq(user_id))
            .order_by_desc(purchased_program::Column::GrantedAt)
            .find_also_related(Program)
            .all(&*self.db)
            .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(grant, program)| {
                program.map(|program| PurchaseRecord {
                    program,
                    payment_id: grant.payment_id,
                    granted_at: grant.granted_at,
                })
            })
            .collect())
    }
}
