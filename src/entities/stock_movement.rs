use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;
use uuid::Uuid;

/// Direction of a movement.
///
/// For a simple movement the quantity leaves (outbound) or enters (inbound)
/// the single stock record. For a paired movement, outbound drains
/// `stock_one` into `stock_two`; inbound reverses the direction.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MovementOperation {
    Outbound,
    Inbound,
}

/// Shape of a movement: one stock record touched, or a conserved transfer
/// between two records of the same product.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MovementStructure {
    Simple,
    Paired,
}

/// Immutable ledger entry describing a quantity transfer. Written exactly
/// once, inside the applier's transaction; never updated or deleted.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "stock_movements")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    /// Stored as string in the DB, converted through [`MovementOperation`].
    pub operation: String,
    pub structure: String,
    pub quantity: i32,
    pub motive: String,
    pub description: Option<String>,
    pub created_by: Uuid,
    pub stock_one_id: Uuid,
    pub stock_two_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

impl Model {
    pub fn operation(&self) -> Option<MovementOperation> {
        self.operation.parse().ok()
    }

    pub fn structure(&self) -> Option<MovementStructure> {
        self.structure.parse().ok()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::stock::Entity",
        from = "Column::StockOneId",
        to = "super::stock::Column::Id"
    )]
    StockOne,
    #[sea_orm(
        belongs_to = "super::stock::Entity",
        from = "Column::StockTwoId",
        to = "super::stock::Column::Id"
    )]
    StockTwo,
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;
        if let ActiveValue::NotSet = active_model.created_at {
            active_model.created_at = Set(Utc::now());
        }
        Ok(active_model)
    }
}
