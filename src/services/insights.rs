use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::{
    repositories::DataStore,
    services::analytics::summarize,
    services::reports::insight_prompt,
    text_generation::TextGenerator,
};

pub const NO_SALES_MESSAGE: &str = "No sales data found to analyze.";
pub const EMPTY_CHAT_MESSAGE: &str = "Please type a message first.";

/// Prompt for a free-form question from the user.
pub fn chat_prompt(message: &str) -> String {
    format!(
        "You are a helpful AI business assistant for a Product Sales Management System.\n\
         Answer in a friendly, clear, and professional tone.\n\
         If the question is about sales, products, or customers, reason it generally.\n\
         User: {}\n\
         AI:",
        message
    )
}

/// Narrative reports and chat answers from the text generator.
///
/// Every method returns displayable text; nothing here fails.
#[derive(Clone)]
pub struct InsightService {
    store: Arc<dyn DataStore>,
    generator: Arc<dyn TextGenerator>,
}

impl InsightService {
    pub fn new(store: Arc<dyn DataStore>, generator: Arc<dyn TextGenerator>) -> Self {
        Self { store, generator }
    }

    #[instrument(skip(self))]
    pub async fn analyze_sales(&self) -> String {
        let records = async {
            let sales = self.store.list_sales().await?;
            let products = self.store.list_products().await?;
            Ok::<_, crate::errors::ServiceError>((sales, products))
        }
        .await;

        let (sales, products) = match records {
            Ok(records) => records,
            Err(e) => {
                warn!("Could not load sales for analysis: {}", e);
                return format!("[AI ERROR]: {}", e.user_message());
            }
        };

        if sales.is_empty() {
            return NO_SALES_MESSAGE.to_string();
        }

        let summary = summarize(&sales, &products);
        info!(sales = summary.sale_count, "Requesting sales insight");
        self.generator.generate(&insight_prompt(&summary)).await
    }

    #[instrument(skip(self, message))]
    pub async fn chat(&self, message: &str) -> String {
        let message = message.trim();
        if message.is_empty() {
            return EMPTY_CHAT_MESSAGE.to_string();
        }

        self.generator.generate(&chat_prompt(message)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_prompt_frames_the_question() {
        let prompt = chat_prompt("Which product sells best?");
        assert!(prompt.starts_with("You are a helpful AI business assistant"));
        assert!(prompt.ends_with("User: Which product sells best?\nAI:"));
    }
}
