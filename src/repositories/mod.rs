use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::DatabaseConnection;
use std::sync::Arc;

use crate::entities::{
    CustomerModel, NewCustomer, NewProduct, NewSale, ProductModel, SaleDetail, SaleModel,
};
use crate::errors::ServiceError;

pub mod sql_store;

pub use sql_store::SqlDataStore;

/// Repository trait for common database operations
pub trait Repository {
    fn get_db(&self) -> &DatabaseConnection;
}

#[derive(Debug, Clone)]
pub struct BaseRepository {
    db: Arc<DatabaseConnection>,
}

impl BaseRepository {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl Repository for BaseRepository {
    fn get_db(&self) -> &DatabaseConnection {
        &self.db
    }
}

/// Durable storage for products, customers and sales.
///
/// Every mutating call is a single auto-committed statement and later reads
/// observe it. Inputs are normalized and validated before anything is written.
#[async_trait]
pub trait DataStore: Send + Sync {
    async fn list_products(&self) -> Result<Vec<ProductModel>, ServiceError>;
    async fn list_customers(&self) -> Result<Vec<CustomerModel>, ServiceError>;
    async fn list_sales(&self) -> Result<Vec<SaleModel>, ServiceError>;

    /// Sales joined with product and customer names, newest first.
    async fn list_sale_details(&self) -> Result<Vec<SaleDetail>, ServiceError>;

    async fn get_product(&self, id: i32) -> Result<Option<ProductModel>, ServiceError>;
    async fn get_customer(&self, id: i32) -> Result<Option<CustomerModel>, ServiceError>;

    async fn count_products(&self) -> Result<u64, ServiceError>;
    async fn count_customers(&self) -> Result<u64, ServiceError>;
    async fn count_sales(&self) -> Result<u64, ServiceError>;

    /// Sum of every sale amount, zero when there are no sales.
    async fn sum_sale_amounts(&self) -> Result<Decimal, ServiceError>;

    async fn insert_product(&self, input: NewProduct) -> Result<ProductModel, ServiceError>;
    async fn update_product(&self, id: i32, input: NewProduct)
        -> Result<ProductModel, ServiceError>;
    /// Removes the product and, through the foreign key, all of its sales.
    async fn delete_product(&self, id: i32) -> Result<(), ServiceError>;

    async fn insert_customer(&self, input: NewCustomer) -> Result<CustomerModel, ServiceError>;
    async fn update_customer(
        &self,
        id: i32,
        input: NewCustomer,
    ) -> Result<CustomerModel, ServiceError>;
    /// Removes the customer and, through the foreign key, all of their sales.
    async fn delete_customer(&self, id: i32) -> Result<(), ServiceError>;

    /// Fails with a validation error when the product or customer does not exist.
    async fn insert_sale(&self, input: NewSale) -> Result<SaleModel, ServiceError>;
    async fn delete_sale(&self, id: i32) -> Result<(), ServiceError>;
}
