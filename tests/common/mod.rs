#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use salesdesk::{
    config::AppConfig,
    db,
    entities::{CustomerModel, NewCustomer, NewProduct, NewSale, ProductModel, SaleModel},
    text_generation::TextGenerator,
    AppState,
};

/// Text generator that records every prompt and answers with a fixed reply.
pub struct RecordingGenerator {
    reply: String,
    prompts: Mutex<Vec<String>>,
}

impl RecordingGenerator {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for RecordingGenerator {
    async fn generate(&self, prompt: &str) -> String {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.reply.clone()
    }
}

/// Helper harness for an application state backed by an in-memory SQLite database.
pub struct TestApp {
    pub state: AppState,
    pub generator: Arc<RecordingGenerator>,
}

impl TestApp {
    /// Construct a new test application with a freshly provisioned schema.
    pub async fn new() -> Self {
        let cfg = AppConfig::new("sqlite::memory:".to_string(), "test".to_string());

        let pool = db::establish_connection_from_app_config(&cfg)
            .await
            .expect("failed to create test database");
        db::run_migrations(&pool)
            .await
            .expect("failed to provision test schema");

        let generator = Arc::new(RecordingGenerator::new("Sales look healthy."));
        let state = AppState::new(cfg, Arc::new(pool), generator.clone());

        Self { state, generator }
    }

    pub async fn add_product(
        &self,
        name: &str,
        category: Option<&str>,
        price: Decimal,
    ) -> ProductModel {
        self.state
            .product_service()
            .create(NewProduct::new(name, category, price))
            .await
            .expect("failed to create product")
    }

    pub async fn add_customer(&self, name: &str) -> CustomerModel {
        let email = format!("{}@example.com", name.to_lowercase().replace(' ', "."));
        self.state
            .customer_service()
            .create(NewCustomer::new(name, Some(&email), None))
            .await
            .expect("failed to create customer")
    }

    pub async fn add_sale(
        &self,
        product: &ProductModel,
        customer: &CustomerModel,
        date: &str,
        amount: Decimal,
    ) -> SaleModel {
        let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").expect("bad test date");
        self.state
            .sale_service()
            .record(NewSale::new(product.id, customer.id, Some(date), amount))
            .await
            .expect("failed to record sale")
    }
}
