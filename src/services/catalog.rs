use crate::{
    entities::{program, Program, ProgramLevel, ProgramModel},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

/// Catalog service for training programs.
///
/// Reads are public; mutations are reached only through admin-gated
/// handlers. Program prices set here are what the cart endpoint verifies
/// submitted carts against.
#[derive(Clone)]
pub struct CatalogService {
    db: Arc<DatabaseConnection>,
    event_sender: Arc<EventSender>,
}

/// Sort orders for the program listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramSort {
    PriceAsc,
    PriceDesc,
    RatingDesc,
    Newest,
}

/// Listing filter; all fields optional and combined with AND
#[derive(Debug, Default, Deserialize)]
pub struct ProgramFilter {
    pub category: Option<String>,
    pub level: Option<ProgramLevel>,
    pub search: Option<String>,
    pub sort: Option<ProgramSort>,
}

/// Input for creating a program
#[derive(Debug, Deserialize)]
pub struct CreateProgramInput {
    pub title: String,
    pub description: String,
    pub price: Decimal,
    pub original_price: Option<Decimal>,
    pub level: ProgramLevel,
    pub category: String,
    pub instructor: String,
    pub duration: String,
    pub image_url: Option<String>,
    pub features: Vec<String>,
    pub tags: Vec<String>,
}

/// Input for updating a program; absent fields are left unchanged
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateProgramInput {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub original_price: Option<Decimal>,
    #[schema(value_type = Option<String>)]
    pub level: Option<ProgramLevel>,
    pub category: Option<String>,
    pub instructor: Option<String>,
    pub duration: Option<String>,
    pub image_url: Option<String>,
    pub features: Option<Vec<String>>,
    pub tags: Option<Vec<String>>,
}

impl CatalogService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: Arc<EventSender>) -> Self {
        Self { db, event_sender }
    }

    /// List programs matching the filter.
    #[instrument(skip(self))]
    pub async fn list_programs(
        &self,
        filter: ProgramFilter,
    ) -> Result<Vec<ProgramModel>, ServiceError> {
        let mut query = Program::find();

        if let Some(category) = &filter.category {
            query = query.filter(program::Column::Category.eq(category.clone()));
        }
        if let Some(level) = filter.level {
            query = query.filter(program::Column::Level.eq(level));
        }
        if let Some(search) = &filter.search {
            query = query.filter(program::Column::Title.contains(search.clone()));
        }

        query = match filter.sort.unwrap_or(ProgramSort::Newest) {
            ProgramSort::PriceAsc => query.order_by_asc(program::Column::Price),
            ProgramSort::PriceDesc => query.order_by_desc(program::Column::Price),
            ProgramSort::RatingDesc => query.order_by_desc(program::Column::Rating),
            ProgramSort::Newest => query.order_by_desc(program::Column::CreatedAt),
        };

        Ok(query.all(&*self.db).await?)
    }

    pub async fn get_program(&self, id: Uuid) -> Result<ProgramModel, ServiceError> {
        Program::find_by_id(id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Program {} not found", id)))
    }

    /// Create a catalog entry. New programs start unrated with zero students.
    #[instrument(skip(self, input), fields(title = %input.title))]
    pub async fn create_program(
        &self,
        input: CreateProgramInput,
    ) -> Result<ProgramModel, ServiceError> {
        if input.price < Decimal::ZERO {
            return Err(ServiceError::ValidationError(
                "price must be non-negative".to_string(),
            ));
        }

        let now = Utc::now();
        let program = program::ActiveModel {
            id: Set(Uuid::new_v4()),
            title: Set(input.title),
            description: Set(input.description),
            price: Set(input.price),
            original_price: Set(input.original_price),
            level: Set(input.level),
            category: Set(input.category),
            instructor: Set(input.instructor),
            rating: Set(Decimal::ZERO),
            students_count: Set(0),
            duration: Set(input.duration),
            image_url: Set(input.image_url),
            features: Set(serde_json::json!(input.features)),
            tags: Set(serde_json::json!(input.tags)),
            created_at: Set(now),
            updated_at: Set(now),
        };

        let created = program.insert(&*self.db).await?;
        self.event_sender
            .send_or_log(Event::ProgramCreated(created.id))
            .await;

        info!("Created program: {}", created.id);
        Ok(created)
    }

    #[instrument(skip(self, input))]
    pub async fn update_program(
        &self,
        id: Uuid,
        input: UpdateProgramInput,
    ) -> Result<ProgramModel, ServiceError> {
        let existing = self.get_program(id).await?;
        let mut active: program::ActiveModel = existing.into();

        if let Some(title) = input.title {
            active.title = Set(title);
        }
        if let Some(description) = input.description {
            active.description = Set(description);
        }
        if let Some(price) = input.price {
            if price < Decimal::ZERO {
                return Err(ServiceError::ValidationError(
                    "price must be non-negative".to_string(),
                ));
            }
            active.price = Set(price);
        }
        if input.original_price.is_some() {
            active.original_price = Set(input.original_price);
        }
        if let Some(level) = input.level {
            active.level = Set(level);
        }
        if let Some(category) = input.category {
            active.category = Set(category);
        }
        if let Some(instructor) = input.instructor {
            active.instructor = Set(instructor);
        }
        if let Some(duration) = input.duration {
            active.duration = Set(duration);
        }
        if input.image_url.is_some() {
            active.image_url = Set(input.image_url);
        }
        if let Some(features) = input.features {
            active.features = Set(serde_json::json!(features));
        }
        if let Some(tags) = input.tags {
            active.tags = Set(serde_json::json!(tags));
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&*self.db).await?;
        self.event_sender
            .send_or_log(Event::ProgramUpdated(updated.id))
            .await;

        Ok(updated)
    }

    #[instrument(skip(self))]
    pub async fn delete_program(&self, id: Uuid) -> Result<(), ServiceError> {
        let result = Program::delete_by_id(id).exec(&*self.db).await?;
        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!("Program {} not found", id)));
        }

        self.event_sender
            .send_or_log(Event::ProgramDeleted(id))
            .await;
        Ok(())
    }
}
