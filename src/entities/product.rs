use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, Set};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{normalize_optional, validate_money, validate_required, Checked};

/// Product entity
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "products")]
pub struct Model {
    /// Primary key, assigned by the database
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Product name
    pub name: String,

    /// Free-form category; products without one are left out of category reports
    #[sea_orm(nullable)]
    pub category: Option<String>,

    /// Unit price
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub price: Decimal,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

/// Product entity relations
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::sale::Entity")]
    Sales,
}

impl Related<super::sale::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Sales.def()
    }
}

#[async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(self, _db: &C, insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        let mut active_model = self;

        if insert {
            if let ActiveValue::NotSet = active_model.created_at {
                active_model.created_at = Set(Utc::now());
            }
        }

        Ok(active_model)
    }
}

/// Fields a user supplies when adding or editing a product.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize, Validate)]
pub struct NewProduct {
    #[validate(
        custom = "validate_required",
        length(max = 255, message = "Product name cannot exceed 255 characters")
    )]
    pub name: String,

    #[validate(length(max = 255, message = "Category cannot exceed 255 characters"))]
    pub category: Option<String>,

    #[validate(custom = "validate_money")]
    pub price: Decimal,
}

impl NewProduct {
    pub fn new(name: impl Into<String>, category: Option<&str>, price: Decimal) -> Self {
        Self {
            name: name.into(),
            category: category.map(str::to_string),
            price,
        }
    }
}

impl Checked for NewProduct {
    /// Trims text and drops blank optionals before validation.
    fn normalized(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            category: normalize_optional(self.category),
            price: self.price,
        }
    }
}
