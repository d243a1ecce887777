// Record management
pub mod customers;
pub mod products;
pub mod sales;

// Aggregation and reporting
pub mod analytics;
pub mod reports;

// Generated insights
pub mod insights;

// Bulk data
pub mod export;
pub mod seed;
