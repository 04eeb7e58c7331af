use crate::{
    entities::{gym, Gym, GymModel},
    errors::ServiceError,
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::Deserialize;
use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;

/// Gym directory lookups
#[derive(Clone)]
pub struct GymService {
    db: Arc<DatabaseConnection>,
}

/// Input for registering a gym location
#[derive(Debug, Deserialize)]
pub struct CreateGymInput {
    pub name: String,
    pub city: String,
    pub address: String,
    pub description: String,
    pub image_url: Option<String>,
    pub phone: Option<String>,
}

impl GymService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn list_gyms(&self, city: Option<String>) -> Result<Vec<GymModel>, ServiceError> {
        let mut query = Gym::find().order_by_asc(gym::Column::Name);
        if let Some(city) = city {
            query = query.filter(gym::Column::City.eq(city));
        }
        Ok(query.all(&*self.db).await?)
    }

    pub async fn get_gym(&self, id: Uuid) -> Result<GymModel, ServiceError> {
        Gym::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Gym {} not found", id)))
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_gym(&self, input: CreateGymInput) -> Result<GymModel, ServiceError> {
        let now = Utc::now();
        let gym = gym::ActiveModel {
            id: Set(Uuid::new_v4()),
            name: Set(input.name),
            city: Set(input.city),
            address: Set(input.address),
            description: Set(input.description),
            image_url: Set(input.image_url),
            phone: Set(input.phone),
            created_at: Set(now),
            updated_at: Set(now),
        };
        Ok(gym.insert(&*self.db).await?)
    }
}
