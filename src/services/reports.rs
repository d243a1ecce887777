use chrono::{NaiveDate, NaiveDateTime};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Write as _;
use std::io::Read;
use std::str::FromStr;
use std::sync::Arc;
use tracing::{debug, info, instrument};

use crate::{
    errors::ServiceError,
    repositories::DataStore,
    services::analytics::{GroupedTotal, SalesAnalysis, SalesSummary},
};

/// Products shown when charting an imported CSV.
pub const CSV_TOP_PRODUCTS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Bar,
    Line,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartView {
    RevenueByProduct,
    RevenueByCategory,
    RevenueByDate,
    DailySales,
    TopProducts,
}

impl ChartView {
    pub fn title(&self) -> &'static str {
        match self {
            ChartView::RevenueByProduct => "Sales by Product",
            ChartView::RevenueByCategory => "Sales by Category",
            ChartView::RevenueByDate => "Sales Trend Over Time",
            ChartView::DailySales => "Daily Sales",
            ChartView::TopProducts => "Top 5 Products by Revenue",
        }
    }

    pub fn kind(&self) -> ChartKind {
        match self {
            ChartView::RevenueByDate => ChartKind::Line,
            _ => ChartKind::Bar,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartPoint {
    pub label: String,
    pub value: Decimal,
}

/// An ordered (label, value) sequence ready for a bar or line renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChartSeries {
    pub view: ChartView,
    pub kind: ChartKind,
    pub title: String,
    pub points: Vec<ChartPoint>,
}

impl ChartSeries {
    fn from_groups<K: ToString>(view: ChartView, groups: &[GroupedTotal<K>]) -> Self {
        Self {
            view,
            kind: view.kind(),
            title: view.title().to_string(),
            points: groups
                .iter()
                .map(|g| ChartPoint {
                    label: g.key.to_string(),
                    value: g.total,
                })
                .collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Home page counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub products: u64,
    pub customers: u64,
    pub sales: u64,
    pub total_revenue: Decimal,
}

fn or_not_available(value: Option<String>) -> String {
    value.unwrap_or_else(|| "N/A".to_string())
}

/// Prompt asking the model for a short narrative report on `summary`.
pub fn insight_prompt(summary: &SalesSummary) -> String {
    format!(
        "You are a business analytics assistant.\n\
         Here is the sales summary data:\n\
         - Total Sales: {}\n\
         - Average Sale: {}\n\
         - Top Product: {}\n\n\
         Write a short report summarizing sales performance and key opportunities.",
        summary.total_revenue,
        or_not_available(summary.average_sale.map(|a| a.round_dp(2).to_string())),
        or_not_available(summary.top_product.clone()),
    )
}

/// Revenue by product, category and date. Views without data are omitted.
pub fn chart_series(analysis: &SalesAnalysis) -> Vec<ChartSeries> {
    [
        ChartSeries::from_groups(ChartView::RevenueByProduct, &analysis.by_product),
        ChartSeries::from_groups(ChartView::RevenueByCategory, &analysis.by_category),
        ChartSeries::from_groups(ChartView::RevenueByDate, &analysis.by_date),
    ]
    .into_iter()
    .filter(|series| !series.is_empty())
    .collect()
}

/// Keeps the first `n` points.
pub fn top_n(mut series: ChartSeries, n: usize) -> ChartSeries {
    series.points.truncate(n);
    series
}

fn parse_amount(raw: Option<&str>) -> Decimal {
    raw.map(str::trim)
        .and_then(|s| Decimal::from_str(s).or_else(|_| Decimal::from_scientific(s)).ok())
        .unwrap_or(Decimal::ZERO)
}

fn parse_sale_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|dt| dt.date()))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S").map(|dt| dt.date()))
        .or_else(|_| NaiveDate::parse_from_str(raw, "%m/%d/%Y"))
        .ok()
}

fn add_amount(total: &mut Decimal, amount: Decimal) -> Result<(), ServiceError> {
    *total = total.checked_add(amount).ok_or_else(|| {
        ServiceError::ValidationError("CSV amounts are too large to total.".to_string())
    })?;
    Ok(())
}

/// Charts a sales CSV that has `sale_date` and `amount` columns.
///
/// Header names are matched case-insensitively. Unreadable amounts count as
/// zero and rows with unreadable dates drop out of the daily view. When a
/// `product` (or else `name`) column is present the top products by revenue
/// are charted too.
pub fn series_from_csv<R: Read>(reader: R) -> Result<Vec<ChartSeries>, ServiceError> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let headers: Vec<String> = csv_reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_lowercase())
        .collect();
    let column = |name: &str| headers.iter().position(|h| h == name);

    let (date_col, amount_col) = match (column("sale_date"), column("amount")) {
        (Some(d), Some(a)) => (d, a),
        _ => {
            return Err(ServiceError::ValidationError(
                "CSV must include 'sale_date' and 'amount' columns.".to_string(),
            ))
        }
    };
    let product_col = column("product").or_else(|| column("name"));

    let mut daily: BTreeMap<NaiveDate, Decimal> = BTreeMap::new();
    let mut by_product: HashMap<String, Decimal> = HashMap::new();
    let mut rows = 0usize;

    for record in csv_reader.records() {
        let record = record?;
        rows += 1;
        let amount = parse_amount(record.get(amount_col));

        if let Some(date) = record.get(date_col).and_then(parse_sale_date) {
            add_amount(daily.entry(date).or_insert(Decimal::ZERO), amount)?;
        }

        if let Some(name) = product_col
            .and_then(|c| record.get(c))
            .filter(|n| !n.is_empty())
        {
            add_amount(
                by_product.entry(name.to_string()).or_insert(Decimal::ZERO),
                amount,
            )?;
        }
    }
    debug!(rows, days = daily.len(), "CSV sales parsed");

    let daily: Vec<GroupedTotal<NaiveDate>> = daily
        .into_iter()
        .map(|(date, total)| GroupedTotal::new(date, total))
        .collect();
    let mut series = vec![ChartSeries::from_groups(ChartView::DailySales, &daily)];

    if product_col.is_some() {
        let mut products: Vec<GroupedTotal<String>> = by_product
            .into_iter()
            .map(|(name, total)| GroupedTotal::new(name, total))
            .collect();
        products.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.key.cmp(&b.key)));
        series.push(top_n(
            ChartSeries::from_groups(ChartView::TopProducts, &products),
            CSV_TOP_PRODUCTS,
        ));
    }

    Ok(series)
}

/// Renders a series as labelled horizontal bars scaled to `width` columns.
pub fn render_bars(series: &ChartSeries, width: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{}", series.title);

    let label_width = series
        .points
        .iter()
        .map(|p| p.label.chars().count())
        .max()
        .unwrap_or(0);
    let max = series
        .points
        .iter()
        .map(|p| p.value)
        .max()
        .unwrap_or(Decimal::ZERO);

    for point in &series.points {
        let len = if max > Decimal::ZERO && point.value > Decimal::ZERO {
            (point.value / max * Decimal::from(width))
                .round()
                .to_usize()
                .unwrap_or(0)
        } else {
            0
        };
        let _ = writeln!(
            out,
            "  {:<label_width$} | {} {}",
            point.label,
            "#".repeat(len),
            point.value.round_dp(2),
        );
    }

    out
}

/// Dashboard counters and charts read from the store.
#[derive(Clone)]
pub struct ReportService {
    store: Arc<dyn DataStore>,
}

impl ReportService {
    pub fn new(store: Arc<dyn DataStore>) -> Self {
        Self { store }
    }

    #[instrument(skip(self))]
    pub async fn dashboard(&self) -> Result<DashboardStats, ServiceError> {
        let stats = DashboardStats {
            products: self.store.count_products().await?,
            customers: self.store.count_customers().await?,
            sales: self.store.count_sales().await?,
            total_revenue: self.store.sum_sale_amounts().await?,
        };
        info!(
            products = stats.products,
            customers = stats.customers,
            sales = stats.sales,
            "Dashboard stats loaded"
        );
        Ok(stats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn summary(average: Option<Decimal>, top: Option<&str>) -> SalesSummary {
        SalesSummary {
            sale_count: if average.is_some() { 2 } else { 0 },
            total_revenue: dec!(2000),
            average_sale: average,
            top_product: top.map(str::to_string),
        }
    }

    #[test]
    fn prompt_embeds_summary_values() {
        let prompt = insight_prompt(&summary(Some(dec!(1000)), Some("Laptop")));
        assert!(prompt.starts_with("You are a business analytics assistant."));
        assert!(prompt.contains("- Total Sales: 2000\n"));
        assert!(prompt.contains("- Average Sale: 1000\n"));
        assert!(prompt.contains("- Top Product: Laptop\n"));
        assert!(prompt.ends_with("key opportunities."));
    }

    #[test]
    fn prompt_marks_missing_values() {
        let prompt = insight_prompt(&summary(None, None));
        assert!(prompt.contains("- Average Sale: N/A\n"));
        assert!(prompt.contains("- Top Product: N/A\n"));
    }

    #[test]
    fn empty_views_are_omitted() {
        let analysis = SalesAnalysis {
            summary: summary(Some(dec!(1000)), Some("Gift card")),
            by_product: vec![GroupedTotal::new("Gift card".into(), dec!(2000))],
            by_category: vec![],
            by_date: vec![GroupedTotal::new(
                NaiveDate::from_ymd_opt(2024, 5, 1).unwrap(),
                dec!(2000),
            )],
        };

        let series = chart_series(&analysis);
        let views: Vec<_> = series.iter().map(|s| s.view).collect();
        assert_eq!(views, vec![ChartView::RevenueByProduct, ChartView::RevenueByDate]);
        assert_eq!(series[1].kind, ChartKind::Line);
        assert_eq!(series[1].points[0].label, "2024-05-01");
    }

    #[test]
    fn csv_requires_date_and_amount() {
        let data = "Product,Total\nPen,2\n";
        let result = series_from_csv(data.as_bytes());
        assert!(matches!(result, Err(ServiceError::ValidationError(_))));
    }

    #[test]
    fn csv_series_tolerate_bad_values() {
        let data = "\
 Sale_Date , AMOUNT ,Product
2024-03-02,10.50,Pen
2024-03-01,abc,Desk
not a date,4,Pen
2024-03-02,1.50,Chair
";
        let series = series_from_csv(data.as_bytes()).unwrap();
        assert_eq!(series.len(), 2);

        let daily = &series[0];
        assert_eq!(daily.view, ChartView::DailySales);
        let labels: Vec<_> = daily.points.iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, vec!["2024-03-01", "2024-03-02"]);
        assert_eq!(daily.points[0].value, Decimal::ZERO);
        assert_eq!(daily.points[1].value, dec!(12.00));

        let top = &series[1];
        assert_eq!(top.points[0].label, "Pen");
        assert_eq!(top.points[0].value, dec!(14.50));
    }

    #[test]
    fn csv_totals_that_overflow_are_rejected() {
        let data = "\
sale_date,amount
2024-03-01,50000000000000000000000000000
2024-03-01,50000000000000000000000000000
";
        let result = series_from_csv(data.as_bytes());
        assert!(matches!(result, Err(ServiceError::ValidationError(_))));
    }

    #[test]
    fn csv_top_products_are_capped() {
        let mut data = String::from("sale_date,amount,name\n");
        for i in 0..8 {
            data.push_str(&format!("2024-01-01,{},item{}\n", i + 1, i));
        }
        let series = series_from_csv(data.as_bytes()).unwrap();
        assert_eq!(series[1].points.len(), CSV_TOP_PRODUCTS);
        assert_eq!(series[1].points[0].label, "item7");
    }

    #[test]
    fn bars_scale_to_largest_value() {
        let series = ChartSeries {
            view: ChartView::RevenueByProduct,
            kind: ChartKind::Bar,
            title: "Sales by Product".into(),
            points: vec![
                ChartPoint { label: "Laptop".into(), value: dec!(100) },
                ChartPoint { label: "Pen".into(), value: dec!(50) },
            ],
        };
        let text = render_bars(&series, 10);
        let lines: Vec<_> = text.lines().collect();
        assert_eq!(lines[0], "Sales by Product");
        assert_eq!(lines[1], "  Laptop | ########## 100");
        assert_eq!(lines[2], "  Pen    | ##### 50");
    }
}
