use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::{
    entities::{Checked, NewSale, SaleDetail, SaleModel},
    errors::ServiceError,
    repositories::DataStore,
};

/// Records and removes sales. Sales are never edited in place.
#[derive(Clone)]
pub struct SaleService {
    store: Arc<dyn DataStore>,
}

impl SaleService {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<SaleModel>, ServiceError> {
        self.store.list_sales().await
    }

    /// Sales with product and customer names, newest first
    pub async fn list_details(&self) -> Result<Vec<SaleDetail>, ServiceError> {
        self.store.list_sale_details().await
    }

    #[instrument(
        skip(self, input),
        fields(product_id = input.product_id, customer_id = input.customer_id)
    )]
    pub async fn record(&self, input: NewSale) -> Result<SaleModel, ServiceError> {
        let input = input.checked().map_err(|e| {
            warn!("Rejected sale: {}", e);
            e
        })?;

        let sale = self.store.insert_sale(input).await?;
        info!(sale_id = sale.id, amount = %sale.amount, date = %sale.sale_date, "Sale added");
        Ok(sale)
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        self.store.delete_sale(id).await
    }
}
