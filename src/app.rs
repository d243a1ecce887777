use std::sync::Arc;
use tracing::info;

use crate::{
    config::AppConfig,
    db::{self, DbPool},
    errors::ServiceError,
    repositories::{DataStore, SqlDataStore},
    services::{
        analytics::AnalyticsService, customers::CustomerService, insights::InsightService,
        products::ProductService, reports::ReportService, sales::SaleService,
    },
    text_generation::{OllamaGenerator, TextGenerator},
};

/// Everything an action handler needs, built once at startup and passed by reference.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: Arc<DbPool>,
    pub store: Arc<dyn DataStore>,
    pub generator: Arc<dyn TextGenerator>,
}

impl AppState {
    /// Connects to the configured database, provisions the schema when
    /// `auto_migrate` is set and builds the text generation client. Fails
    /// early when the database does not answer a ping.
    pub async fn initialize(config: AppConfig) -> Result<Self, ServiceError> {
        let db = db::establish_connection_from_app_config(&config).await?;
        db::check_connection(&db).await?;
        if config.auto_migrate {
            db::run_migrations(&db).await?;
        }

        let generator = OllamaGenerator::new(&config.llm)?;
        info!(
            environment = %config.environment,
            model = %config.llm.model,
            "Application state initialized"
        );

        Ok(Self::new(config, Arc::new(db), Arc::new(generator)))
    }

    pub fn new(config: AppConfig, db: Arc<DbPool>, generator: Arc<dyn TextGenerator>) -> Self {
        let store: Arc<dyn DataStore> = Arc::new(SqlDataStore::new(db.clone()));
        Self {
            config,
            db,
            store,
            generator,
        }
    }

    pub fn product_service(&self) -> ProductService {
        ProductService::new(self.store.clone())
    }

    pub fn customer_service(&self) -> CustomerService {
        CustomerService::new(self.store.clone())
    }

    pub fn sale_service(&self) -> SaleService {
        SaleService::new(self.store.clone())
    }

    pub fn analytics_service(&self) -> AnalyticsService {
        AnalyticsService::new(self.store.clone())
    }

    pub fn report_service(&self) -> ReportService {
        ReportService::new(self.store.clone())
    }

    pub fn insight_service(&self) -> InsightService {
        InsightService::new(self.store.clone(), self.generator.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn initialize_provisions_a_usable_store() {
        let config = AppConfig::new("sqlite::memory:".into(), "test".into());
        let state = AppState::initialize(config).await.unwrap();

        db::check_connection(&state.db).await.unwrap();
        assert_eq!(state.store.count_sales().await.unwrap(), 0);
        assert!(state.product_service().list().await.unwrap().is_empty());
    }
}
