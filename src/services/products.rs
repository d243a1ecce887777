use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::{
    entities::{Checked, NewProduct, ProductModel},
    errors::ServiceError,
    repositories::DataStore,
};

/// Service for managing products
#[derive(Clone)]
pub struct ProductService {
    store: Arc<dyn DataStore>,
}

impl ProductService {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<ProductModel>, ServiceError> {
        self.store.list_products().await
    }

    /// Creates a new product
    #[instrument(skip(self, input))]
    pub async fn create(&self, input: NewProduct) -> Result<ProductModel, ServiceError> {
        let input = input.checked().map_err(|e| {
            warn!("Rejected product: {}", e);
            e
        })?;

        let product = self.store.insert_product(input).await?;
        info!(product_id = product.id, name = %product.name, "Product added");
        Ok(product)
    }

    /// Replaces name, category and price of an existing product
    #[instrument(skip(self, input))]
    pub async fn update(&self, id: i32, input: NewProduct) -> Result<ProductModel, ServiceError> {
        let input = input.checked().map_err(|e| {
            warn!(product_id = id, "Rejected product update: {}", e);
            e
        })?;

        self.store.update_product(id, input).await
    }

    /// Deletes a product together with every sale that references it
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        self.store.delete_product(id).await
    }
}
