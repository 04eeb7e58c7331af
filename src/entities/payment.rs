use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Completed transaction record.
///
/// Append-only: rows are created once, after signature verification, and
/// never updated or deleted by the application. (order_id, payment_id) is
/// unique so a replayed provider callback cannot produce a second row.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "payments")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
    #[sea_orm(column_type = "Decimal(Some((19, 4)))")]
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
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
