use async_trait::async_trait;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, JoinType, PaginatorTrait, QueryOrder,
    QuerySelect, RelationTrait, Set,
};
use std::sync::Arc;
use tracing::{debug, error, info, instrument};

use crate::entities::{
    customer, product, sale, Checked, Customer, CustomerModel, NewCustomer, NewProduct, NewSale,
    Product, ProductModel, Sale, SaleDetail, SaleModel,
};
use crate::errors::ServiceError;
use crate::repositories::{BaseRepository, DataStore, Repository};

/// [`DataStore`] backed by a sea-orm connection.
#[derive(Debug, Clone)]
pub struct SqlDataStore {
    base: BaseRepository,
}

impl SqlDataStore {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    fn db(&self) -> &DatabaseConnection {
        self.base.get_db()
    }
}

fn log_db_error(operation: &str) -> impl Fn(sea_orm::DbErr) -> ServiceError + '_ {
    move |e| {
        error!("{} failed: {}", operation, e);
        ServiceError::db_error(e)
    }
}

#[async_trait]
impl DataStore for SqlDataStore {
    async fn list_products(&self) -> Result<Vec<ProductModel>, ServiceError> {
        Product::find()
            .order_by_asc(product::Column::Id)
            .all(self.db())
            .await
            .map_err(log_db_error("list_products"))
    }

    async fn list_customers(&self) -> Result<Vec<CustomerModel>, ServiceError> {
        Customer::find()
            .order_by_asc(customer::Column::Id)
            .all(self.db())
            .await
            .map_err(log_db_error("list_customers"))
    }

    async fn list_sales(&self) -> Result<Vec<SaleModel>, ServiceError> {
        Sale::find()
            .order_by_asc(sale::Column::Id)
            .all(self.db())
            .await
            .map_err(log_db_error("list_sales"))
    }

    async fn list_sale_details(&self) -> Result<Vec<SaleDetail>, ServiceError> {
        Sale::find()
            .select_only()
            .column(sale::Column::Id)
            .column_as(product::Column::Name, "product")
            .column_as(customer::Column::Name, "customer")
            .column(sale::Column::SaleDate)
            .column(sale::Column::Amount)
            .join(JoinType::InnerJoin, sale::Relation::Product.def())
            .join(JoinType::InnerJoin, sale::Relation::Customer.def())
            .order_by_desc(sale::Column::SaleDate)
            .order_by_desc(sale::Column::Id)
            .into_model::<SaleDetail>()
            .all(self.db())
            .await
            .map_err(log_db_error("list_sale_details"))
    }

    async fn get_product(&self, id: i32) -> Result<Option<ProductModel>, ServiceError> {
        Product::find_by_id(id)
            .one(self.db())
            .await
            .map_err(log_db_error("get_product"))
    }

    async fn get_customer(&self, id: i32) -> Result<Option<CustomerModel>, ServiceError> {
        Customer::find_by_id(id)
            .one(self.db())
            .await
            .map_err(log_db_error("get_customer"))
    }

    async fn count_products(&self) -> Result<u64, ServiceError> {
        Product::find()
            .count(self.db())
            .await
            .map_err(log_db_error("count_products"))
    }

    async fn count_customers(&self) -> Result<u64, ServiceError> {
        Customer::find()
            .count(self.db())
            .await
            .map_err(log_db_error("count_customers"))
    }

    async fn count_sales(&self) -> Result<u64, ServiceError> {
        Sale::find()
            .count(self.db())
            .await
            .map_err(log_db_error("count_sales"))
    }

    async fn sum_sale_amounts(&self) -> Result<Decimal, ServiceError> {
        let amounts: Vec<Decimal> = Sale::find()
            .select_only()
            .column(sale::Column::Amount)
            .into_tuple()
            .all(self.db())
            .await
            .map_err(log_db_error("sum_sale_amounts"))?;

        Ok(amounts.iter().sum())
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    async fn insert_product(&self, input: NewProduct) -> Result<ProductModel, ServiceError> {
        let input = input.checked()?;

        let model = product::ActiveModel {
            name: Set(input.name),
            category: Set(input.category),
            price: Set(input.price),
            ..Default::default()
        }
        .insert(self.db())
        .await
        .map_err(log_db_error("insert_product"))?;

        info!(product_id = model.id, "Product created");
        Ok(model)
    }

    #[instrument(skip(self, input))]
    async fn update_product(
        &self,
        id: i32,
        input: NewProduct,
    ) -> Result<ProductModel, ServiceError> {
        let input = input.checked()?;

        let existing = self
            .get_product(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Product", id))?;

        let mut active_model: product::ActiveModel = existing.into();
        active_model.name = Set(input.name);
        active_model.category = Set(input.category);
        active_model.price = Set(input.price);

        let model = active_model
            .update(self.db())
            .await
            .map_err(log_db_error("update_product"))?;

        info!(product_id = id, "Product updated");
        Ok(model)
    }

    #[instrument(skip(self))]
    async fn delete_product(&self, id: i32) -> Result<(), ServiceError> {
        let result = Product::delete_by_id(id)
            .exec(self.db())
            .await
            .map_err(log_db_error("delete_product"))?;

        if result.rows_affected == 0 {
            return Err(ServiceError::not_found("Product", id));
        }

        info!(product_id = id, "Product deleted with its sales");
        Ok(())
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    async fn insert_customer(&self, input: NewCustomer) -> Result<CustomerModel, ServiceError> {
        let input = input.checked()?;

        let model = customer::ActiveModel {
            name: Set(input.name),
            email: Set(input.email),
            phone: Set(input.phone),
            ..Default::default()
        }
        .insert(self.db())
        .await
        .map_err(log_db_error("insert_customer"))?;

        info!(customer_id = model.id, "Customer created");
        Ok(model)
    }

    #[instrument(skip(self, input))]
    async fn update_customer(
        &self,
        id: i32,
        input: NewCustomer,
    ) -> Result<CustomerModel, ServiceError> {
        let input = input.checked()?;

        let existing = self
            .get_customer(id)
            .await?
            .ok_or_else(|| ServiceError::not_found("Customer", id))?;

        let mut active_model: customer::ActiveModel = existing.into();
        active_model.name = Set(input.name);
        active_model.email = Set(input.email);
        active_model.phone = Set(input.phone);

        let model = active_model
            .update(self.db())
            .await
            .map_err(log_db_error("update_customer"))?;

        info!(customer_id = id, "Customer updated");
        Ok(model)
    }

    #[instrument(skip(self))]
    async fn delete_customer(&self, id: i32) -> Result<(), ServiceError> {
        let result = Customer::delete_by_id(id)
            .exec(self.db())
            .await
            .map_err(log_db_error("delete_customer"))?;

        if result.rows_affected == 0 {
            return Err(ServiceError::not_found("Customer", id));
        }

        info!(customer_id = id, "Customer deleted with their sales");
        Ok(())
    }

    #[instrument(
        skip(self, input),
        fields(product_id = input.product_id, customer_id = input.customer_id)
    )]
    async fn insert_sale(&self, input: NewSale) -> Result<SaleModel, ServiceError> {
        let input = input.checked()?;

        if self.get_product(input.product_id).await?.is_none() {
            return Err(ServiceError::ValidationError(format!(
                "Product with ID {} does not exist",
                input.product_id
            )));
        }
        if self.get_customer(input.customer_id).await?.is_none() {
            return Err(ServiceError::ValidationError(format!(
                "Customer with ID {} does not exist",
                input.customer_id
            )));
        }

        let sale_date = input.sale_date_or_today();
        debug!(%sale_date, "Recording sale");

        let model = sale::ActiveModel {
            product_id: Set(input.product_id),
            customer_id: Set(input.customer_id),
            sale_date: Set(sale_date),
            amount: Set(input.amount),
            ..Default::default()
        }
        .insert(self.db())
        .await
        .map_err(log_db_error("insert_sale"))?;

        info!(sale_id = model.id, "Sale recorded");
        Ok(model)
    }

    #[instrument(skip(self))]
    async fn delete_sale(&self, id: i32) -> Result<(), ServiceError> {
        let result = Sale::delete_by_id(id)
            .exec(self.db())
            .await
            .map_err(log_db_error("delete_sale"))?;

        if result.rows_affected == 0 {
            return Err(ServiceError::not_found("Sale", id));
        }

        info!(sale_id = id, "Sale deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::db::{establish_connection_from_app_config, run_migrations};
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    async fn store() -> SqlDataStore {
        let cfg = AppConfig::new("sqlite::memory:".into(), "test".into());
        let db = establish_connection_from_app_config(&cfg).await.unwrap();
        run_migrations(&db).await.unwrap();
        SqlDataStore::new(Arc::new(db))
    }

    #[tokio::test]
    async fn empty_store_sums_to_zero() {
        let store = store().await;
        assert_eq!(store.sum_sale_amounts().await.unwrap(), Decimal::ZERO);
        assert_eq!(store.count_sales().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn update_of_missing_product_is_not_found() {
        let store = store().await;
        let result = store
            .update_product(42, NewProduct::new("Lamp", None, dec!(10)))
            .await;
        assert_matches!(result, Err(ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn sale_for_unknown_customer_is_rejected() {
        let store = store().await;
        let product = store
            .insert_product(NewProduct::new("Laptop", Some("Electronics"), dec!(900)))
            .await
            .unwrap();

        let result = store
            .insert_sale(NewSale::new(product.id, 99, None, dec!(900)))
            .await;
        assert_matches!(result, Err(ServiceError::ValidationError(_)));
        assert_eq!(store.count_sales().await.unwrap(), 0);
    }
}
