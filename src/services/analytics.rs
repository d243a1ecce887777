use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{info, instrument};

use crate::{
    entities::{ProductModel, SaleModel},
    errors::ServiceError,
    repositories::DataStore,
};

/// Headline numbers over a set of sales.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesSummary {
    pub sale_count: u64,
    pub total_revenue: Decimal,
    /// `None` when there are no sales.
    pub average_sale: Option<Decimal>,
    /// Name seen on the most sales; ties go to the alphabetically first name.
    pub top_product: Option<String>,
}

impl SalesSummary {
    pub fn is_empty(&self) -> bool {
        self.sale_count == 0
    }
}

/// Revenue summed under one grouping key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupedTotal<K> {
    pub key: K,
    pub total: Decimal,
}

impl<K> GroupedTotal<K> {
    pub fn new(key: K, total: Decimal) -> Self {
        Self { key, total }
    }
}

/// Summary plus the three grouped views of the same sales.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SalesAnalysis {
    pub summary: SalesSummary,
    pub by_product: Vec<GroupedTotal<String>>,
    pub by_category: Vec<GroupedTotal<String>>,
    pub by_date: Vec<GroupedTotal<NaiveDate>>,
}

impl SalesAnalysis {
    pub fn from_records(sales: &[SaleModel], products: &[ProductModel]) -> Self {
        Self {
            summary: summarize(sales, products),
            by_product: revenue_by_product(sales, products),
            by_category: revenue_by_category(sales, products),
            by_date: revenue_by_date(sales),
        }
    }
}

fn product_index(products: &[ProductModel]) -> HashMap<i32, &ProductModel> {
    products.iter().map(|p| (p.id, p)).collect()
}

/// Highest total first, then key ascending.
fn sort_by_total_desc(groups: HashMap<String, Decimal>) -> Vec<GroupedTotal<String>> {
    let mut result: Vec<GroupedTotal<String>> = groups
        .into_iter()
        .map(|(key, total)| GroupedTotal::new(key, total))
        .collect();
    result.sort_by(|a, b| match b.total.cmp(&a.total) {
        Ordering::Equal => a.key.cmp(&b.key),
        other => other,
    });
    result
}

/// Total, average and most frequent product.
///
/// Sales whose product no longer exists still count toward the total and
/// average but cannot be the top product.
pub fn summarize(sales: &[SaleModel], products: &[ProductModel]) -> SalesSummary {
    let sale_count = sales.len() as u64;
    let total_revenue: Decimal = sales.iter().map(|s| s.amount).sum();
    let average_sale = if sale_count == 0 {
        None
    } else {
        Some(total_revenue / Decimal::from(sale_count))
    };

    let index = product_index(products);
    let mut frequency: BTreeMap<&str, u64> = BTreeMap::new();
    for sale in sales {
        if let Some(product) = index.get(&sale.product_id) {
            *frequency.entry(product.name.as_str()).or_insert(0) += 1;
        }
    }

    // BTreeMap iterates names in order, so a strict comparison keeps the first tie.
    let mut top: Option<(&str, u64)> = None;
    for (name, count) in frequency {
        if top.map_or(true, |(_, best)| count > best) {
            top = Some((name, count));
        }
    }

    SalesSummary {
        sale_count,
        total_revenue,
        average_sale,
        top_product: top.map(|(name, _)| name.to_string()),
    }
}

/// Revenue per product name, highest first.
pub fn revenue_by_product(
    sales: &[SaleModel],
    products: &[ProductModel],
) -> Vec<GroupedTotal<String>> {
    let index = product_index(products);
    let mut groups: HashMap<String, Decimal> = HashMap::new();

    for sale in sales {
        if let Some(product) = index.get(&sale.product_id) {
            *groups.entry(product.name.clone()).or_insert(Decimal::ZERO) += sale.amount;
        }
    }

    sort_by_total_desc(groups)
}

/// Revenue per product category, highest first. Uncategorized products are left out.
pub fn revenue_by_category(
    sales: &[SaleModel],
    products: &[ProductModel],
) -> Vec<GroupedTotal<String>> {
    let index = product_index(products);
    let mut groups: HashMap<String, Decimal> = HashMap::new();

    for sale in sales {
        let category = index
            .get(&sale.product_id)
            .and_then(|p| p.category.as_deref())
            .filter(|c| !c.trim().is_empty());
        if let Some(category) = category {
            *groups.entry(category.to_string()).or_insert(Decimal::ZERO) += sale.amount;
        }
    }

    sort_by_total_desc(groups)
}

/// Revenue per sale date, oldest first.
pub fn revenue_by_date(sales: &[SaleModel]) -> Vec<GroupedTotal<NaiveDate>> {
    let mut daily: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    for sale in sales {
        *daily.entry(sale.sale_date).or_insert(Decimal::ZERO) += sale.amount;
    }

    daily
        .into_iter()
        .map(|(date, total)| GroupedTotal::new(date, total))
        .collect()
}

/// Aggregation over whatever the store holds right now.
#[derive(Clone)]
pub struct AnalyticsService {
    store: Arc<dyn DataStore>,
}

impl AnalyticsService {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self))]
    pub async fn analyze(&self) -> Result<SalesAnalysis, ServiceError> {
        let sales = self.store.list_sales().await?;
        let products = self.store.list_products().await?;

        let analysis = SalesAnalysis::from_records(&sales, &products);
        info!(
            sales = analysis.summary.sale_count,
            total = %analysis.summary.total_revenue,
            "Sales analysis generated"
        );
        Ok(analysis)
    }
}
