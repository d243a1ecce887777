use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::Serialize;
use std::collections::HashSet;
use tracing::{info, instrument};

use crate::{
    entities::{NewCustomer, NewProduct, NewSale, MAX_MONEY},
    errors::ServiceError,
    repositories::DataStore,
};

const SAMPLE_SALES: usize = 20;

/// How many rows a seeding run added.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub products: usize,
    pub customers: usize,
    pub sales: usize,
}

fn sample_products() -> Vec<NewProduct> {
    vec![
        NewProduct::new("Laptop", Some("Electronics"), dec!(899.99)),
        NewProduct::new("Mouse", Some("Electronics"), dec!(24.99)),
        NewProduct::new("Keyboard", Some("Electronics"), dec!(49.99)),
        NewProduct::new("Chair", Some("Furniture"), dec!(119.99)),
        NewProduct::new("Desk", Some("Furniture"), dec!(249.99)),
        NewProduct::new("Notebook", Some("Stationery"), dec!(4.99)),
        NewProduct::new("Pen", Some("Stationery"), dec!(1.99)),
    ]
}

fn sample_customers() -> Vec<NewCustomer> {
    vec![
        NewCustomer::new("Alice Johnson", Some("alice@example.com"), Some("1234567890")),
        NewCustomer::new("Bob Smith", Some("bob@example.com"), Some("2345678901")),
        NewCustomer::new("Charlie Davis", Some("charlie@example.com"), Some("3456789012")),
        NewCustomer::new("Diana Prince", Some("diana@example.com"), Some("4567890123")),
    ]
}

/// Loads demo products, customers and twenty sales dated today.
pub async fn insert_sample_data(store: &dyn DataStore) -> Result<SeedReport, ServiceError> {
    insert_sample_data_with_rng(store, &mut StdRng::from_entropy()).await
}

/// Products and customers whose names already exist are skipped. Each sale
/// picks a random product and customer and is priced within 10% of list.
#[instrument(skip_all)]
pub async fn insert_sample_data_with_rng<R: Rng + Send>(
    store: &dyn DataStore,
    rng: &mut R,
) -> Result<SeedReport, ServiceError> {
    let mut report = SeedReport::default();

    let existing: HashSet<String> = store
        .list_products()
        .await?
        .into_iter()
        .map(|p| p.name)
        .collect();
    for product in sample_products() {
        if !existing.contains(&product.name) {
            store.insert_product(product).await?;
            report.products += 1;
        }
    }

    let existing: HashSet<String> = store
        .list_customers()
        .await?
        .into_iter()
        .map(|c| c.name)
        .collect();
    for customer in sample_customers() {
        if !existing.contains(&customer.name) {
            store.insert_customer(customer).await?;
            report.customers += 1;
        }
    }

    let products = store.list_products().await?;
    let customers = store.list_customers().await?;
    if products.is_empty() || customers.is_empty() {
        return Ok(report);
    }

    let mut sales = Vec::with_capacity(SAMPLE_SALES);
    for _ in 0..SAMPLE_SALES {
        let (Some(product), Some(customer)) = (products.choose(rng), customers.choose(rng))
        else {
            break;
        };
        // Factor in basis points keeps the arithmetic in decimal.
        let factor = Decimal::new(rng.gen_range(9_000..=11_000), 4);
        let amount = (product.price * factor).round_dp(2).min(MAX_MONEY);
        sales.push(NewSale::new(product.id, customer.id, None, amount));
    }

    for sale in sales {
        store.insert_sale(sale).await?;
        report.sales += 1;
    }

    info!(
        products = report.products,
        customers = report.customers,
        sales = report.sales,
        "Sample data inserted"
    );
    Ok(report)
}
