mod common;

use common::TestApp;
use rust_decimal_macros::dec;
use salesdesk::services::export::{export_csv, export_to_path, export_txt, ExportFormat};
use salesdesk::services::reports::{series_from_csv, ChartView};
use tempfile::TempDir;

async fn seeded_app() -> TestApp {
    let app = TestApp::new().await;
    let laptop = app.add_product("Laptop", Some("Electronics"), dec!(899.99)).await;
    let gift = app.add_product("Gift card, plastic", None, dec!(25)).await;
    let alice = app.add_customer("Alice Johnson").await;
    app.add_sale(&laptop, &alice, "2024-03-01", dec!(880.50)).await;
    app.add_sale(&gift, &alice, "2024-03-02", dec!(25)).await;
    app
}

#[tokio::test]
async fn csv_export_has_one_section_per_table() {
    let app = seeded_app().await;

    let mut out = Vec::new();
    let rows = export_csv(app.state.store.as_ref(), &mut out).await.unwrap();
    assert_eq!(rows, 5);

    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines[0], "=== PRODUCTS ===");
    assert_eq!(lines[1], "id,name,category,price,created_at");
    assert!(lines[2].starts_with("1,Laptop,Electronics,899.99,"));
    assert!(lines[3].starts_with("2,\"Gift card, plastic\",,25,"));
    assert_eq!(lines[4], "");
    assert_eq!(lines[5], "=== CUSTOMERS ===");
    assert_eq!(lines[6], "id,name,email,phone,created_at");
    assert!(lines[7].starts_with("1,Alice Johnson,alice.johnson@example.com,,"));
    assert_eq!(lines[8], "");
    assert_eq!(lines[9], "=== SALES ===");
    assert_eq!(lines[10], "id,product_id,customer_id,sale_date,amount,created_at");
    assert!(lines[11].starts_with("1,1,1,2024-03-01,880.5,"));
    assert_eq!(lines.len(), 13);
}

#[tokio::test]
async fn txt_export_lists_each_record() {
    let app = seeded_app().await;

    let mut out = Vec::new();
    export_txt(app.state.store.as_ref(), &mut out).await.unwrap();
    let text = String::from_utf8(out).unwrap();

    let sections: Vec<&str> = text.split("\n\n").collect();
    assert_eq!(sections.len(), 3);
    assert!(sections[0].starts_with("PRODUCTS:\n"));
    assert_eq!(sections[0].lines().count(), 3);
    assert!(sections[1].starts_with("CUSTOMERS:\n"));
    assert!(sections[1].contains("\"name\":\"Alice Johnson\""));
    assert!(sections[2].starts_with("SALES:\n"));
    assert!(sections[2].contains("\"sale_date\":\"2024-03-02\""));
}

#[tokio::test]
async fn export_reflects_store_at_call_time() {
    let app = seeded_app().await;
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("dump.csv");

    app.state.product_service().delete(1).await.unwrap();
    let rows = export_to_path(app.state.store.as_ref(), ExportFormat::Csv, &path)
        .await
        .unwrap();
    assert_eq!(rows, 3);

    let text = std::fs::read_to_string(&path).unwrap();
    assert!(!text.contains("Laptop"));
    assert!(!text.contains("880.5"));
}

#[tokio::test]
async fn sales_section_can_be_charted() {
    let app = seeded_app().await;
    let mut out = Vec::new();
    export_csv(app.state.store.as_ref(), &mut out).await.unwrap();
    let text = String::from_utf8(out).unwrap();

    let sales_section = text.split("=== SALES ===\n").nth(1).unwrap();
    let series = series_from_csv(sales_section.as_bytes()).unwrap();

    assert_eq!(series.len(), 1);
    assert_eq!(series[0].view, ChartView::DailySales);
    assert_eq!(series[0].points.len(), 2);
    assert_eq!(series[0].points[0].value, dec!(880.5));
}
