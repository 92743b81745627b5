use chrono::{DateTime, Utc};
use sea_orm::FromJsonQueryResult;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A JSON array of strings, used for image references and compatibility notes.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, FromJsonQueryResult)]
pub struct StringList(pub Vec<String>);

/// One catalog row: one part fitting one model of one company, sold by one shop.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "parts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Defaults to "<company> <model>" when the vendor gives no name.
    pub name: String,
    pub model: Option<String>,
    pub company: Option<String>,
    pub brand: Option<String>,
    pub part_type: Option<String>,
    pub vehicle_year: Option<i32>,
    pub compatibility: StringList,
    pub count_in_stock: i32,
    pub price: f64,
    pub images: StringList,
    #[sea_orm(column_type = "Text", nullable)]
    pub description: Option<String>,
    /// Mean of all review ratings, recomputed on every review.
    pub rating: f64,
    pub num_reviews: i32,
    /// Mirrors the owning shop's vendor; set once at creation from the resolved shop.
    pub vendor_id: i32,
    pub shop_id: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::shop::Entity",
        from = "Column::ShopId",
        to = "super::shop::Column::Id"
    )]
    Shop,
    #[sea_orm(has_many = "super::review::Entity")]
    Review,
}

impl Related<super::shop::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Shop.def()
    }
}

impl Related<super::review::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Review.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
