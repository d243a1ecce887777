use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::{
    entities::{Checked, CustomerModel, NewCustomer},
    errors::ServiceError,
    repositories::DataStore,
};

/// Service for managing customers
#[derive(Clone)]
pub struct CustomerService {
    store: Arc<dyn DataStore>,
}

impl CustomerService {
    /// Creates a new customer service instance
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    pub async fn list(&self) -> Result<Vec<CustomerModel>, ServiceError> {
        self.store.list_customers().await
    }

    /// Creates a new customer
    #[instrument(skip(self, input))]
    pub async fn create(&self, input: NewCustomer) -> Result<CustomerModel, ServiceError> {
        let input = input.checked().map_err(|e| {
            warn!("Rejected customer: {}", e);
            e
        })?;

        let customer = self.store.insert_customer(input).await?;
        info!(customer_id = customer.id, "Customer added");
        Ok(customer)
    }

    /// Updates a customer
    #[instrument(skip(self, input))]
    pub async fn update(&self, id: i32, input: NewCustomer) -> Result<CustomerModel, ServiceError> {
        let input = input.checked().map_err(|e| {
            warn!(customer_id = id, "Rejected customer update: {}", e);
            e
        })?;

        self.store.update_customer(id, input).await
    }

    /// Deletes a customer and their sales
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i32) -> Result<(), ServiceError> {
        self.store.delete_customer(id).await
    }
}
