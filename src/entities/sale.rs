use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::entity::prelude::*;
use sea_orm::{ActiveValue, FromQueryResult, Set};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::{validate_money, Checked};

/// Sale entity; each row references exactly one product and one customer.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sales")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub product_id: i32,
    pub customer_id: i32,
    pub sale_date: NaiveDate,
    #[sea_orm(column_type = "Decimal(Some((10, 2)))")]
    pub amount: Decimal,
    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Product,
    #[sea_orm(
        belongs_to = "super::customer::Entity",
        from = "Column::CustomerId",
        to = "super::customer::Column::Id",
        on_update = "Cascade",
        on_delete = "Cascade"
    )]
    Customer,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl Related<super::customer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Customer.def()
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

/// A sale as entered by the user. The date defaults to today.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct NewSale {
    #[validate(range(min = 1, message = "Product ID is required"))]
    pub product_id: i32,

    #[validate(range(min = 1, message = "Customer ID is required"))]
    pub customer_id: i32,

    pub sale_date: Option<NaiveDate>,

    #[validate(custom = "validate_money")]
    pub amount: Decimal,
}

impl NewSale {
    pub fn new(
        product_id: i32,
        customer_id: i32,
        sale_date: Option<NaiveDate>,
        amount: Decimal,
    ) -> Self {
        Self {
            product_id,
            customer_id,
            sale_date,
            amount,
        }
    }

    pub fn sale_date_or_today(&self) -> NaiveDate {
        self.sale_date
            .unwrap_or_else(|| chrono::Local::now().date_naive())
    }
}

impl Checked for NewSale {
    fn normalized(self) -> Self {
        self
    }
}

/// Sale joined with the names of its product and customer, for listings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, FromQueryResult)]
pub struct SaleDetail {
    pub id: i32,
    pub product: String,
    pub customer: String,
    pub sale_date: NaiveDate,
    pub amount: Decimal,
}
