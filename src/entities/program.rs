use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Training program catalog entity.
///
/// Prices here are authoritative: the cart endpoint rejects any submitted
/// line whose declared price does not match this row.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "programs")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub description: String,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub price: Decimal,
    /// Display-only list price; never used for charging
    #[sea_orm(column_type = "Decimal(Some((19, 4)))", nullable)]
    pub original_price: Option<Decimal>,
    pub level: ProgramLevel,
    pub category: String,
    pub instructor: String,
    #[sea_orm(column_type = "Decimal(Some((4, 2)))")]
    pub rating: Decimal,
    pub students_count: i32,
    pub duration: String,
    #[sea_orm(nullable)]
    pub image_url: Option<String>,
    #[sea_orm(column_type = "Json")]
    pub features: Json,
    #[sea_orm(column_type = "Json")]
    pub tags: Json,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::purchased_program::Entity")]
    PurchasedPrograms,
}

impl Related<super::purchased_program::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::PurchasedPrograms.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Program difficulty enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum ProgramLevel {
    #[sea_orm(string_value = "beginner")]
    Beginner,
    #[sea_orm(string_value = "intermediate")]
    Intermediate,
    #[sea_orm(string_value = "advanced")]
    Advanced,
}
