mod common;

use assert_matches::assert_matches;
use chrono::Local;
use common::TestApp;
use rust_decimal_macros::dec;
use salesdesk::entities::{NewCustomer, NewProduct, NewSale};
use salesdesk::ServiceError;

#[tokio::test]
async fn products_round_trip_through_the_store() {
    let app = TestApp::new().await;
    let service = app.state.product_service();

    let created = app.add_product("  Laptop ", Some("Electronics"), dec!(899.99)).await;
    assert_eq!(created.name, "Laptop");
    assert_eq!(created.category.as_deref(), Some("Electronics"));
    assert_eq!(created.price, dec!(899.99));

    let updated = service
        .update(created.id, NewProduct::new("Laptop Pro", Some(""), dec!(1299.00)))
        .await
        .unwrap();
    assert_eq!(updated.id, created.id);
    assert_eq!(updated.name, "Laptop Pro");
    assert_eq!(updated.category, None);
    assert_eq!(updated.created_at, created.created_at);

    let listed = service.list().await.unwrap();
    assert_eq!(listed, vec![updated]);
}

#[tokio::test]
async fn invalid_input_is_rejected_before_any_write() {
    let app = TestApp::new().await;

    let result = app
        .state
        .product_service()
        .create(NewProduct::new("   ", None, dec!(5)))
        .await;
    assert_matches!(result, Err(ServiceError::ValidationError(_)));

    let result = app
        .state
        .customer_service()
        .create(NewCustomer::new("Eve", Some("not-an-email"), None))
        .await;
    assert!(result.unwrap_err().is_validation());

    // The store validates on its own too.
    let result = app
        .state
        .store
        .insert_product(NewProduct::new("Pen", None, dec!(-1)))
        .await;
    assert_matches!(result, Err(ServiceError::ValidationError(_)));

    assert_eq!(app.state.store.count_products().await.unwrap(), 0);
    assert_eq!(app.state.store.count_customers().await.unwrap(), 0);
}

#[tokio::test]
async fn sale_references_must_exist() {
    let app = TestApp::new().await;
    let customer = app.add_customer("Alice Johnson").await;

    let result = app
        .state
        .sale_service()
        .record(NewSale::new(404, customer.id, None, dec!(10)))
        .await;
    assert_matches!(result, Err(ServiceError::ValidationError(msg)) if msg.contains("404"));
    assert_eq!(app.state.store.count_sales().await.unwrap(), 0);
}

#[tokio::test]
async fn sale_date_defaults_to_today() {
    let app = TestApp::new().await;
    let product = app.add_product("Mouse", Some("Electronics"), dec!(24.99)).await;
    let customer = app.add_customer("Bob Smith").await;

    let sale = app
        .state
        .sale_service()
        .record(NewSale::new(product.id, customer.id, None, dec!(24.99)))
        .await
        .unwrap();
    assert_eq!(sale.sale_date, Local::now().date_naive());
}

#[tokio::test]
async fn deleting_a_product_cascades_to_its_sales() {
    let app = TestApp::new().await;
    let laptop = app.add_product("Laptop", Some("Electronics"), dec!(900)).await;
    let pen = app.add_product("Pen", Some("Stationery"), dec!(2)).await;
    let alice = app.add_customer("Alice Johnson").await;

    app.add_sale(&laptop, &alice, "2024-03-01", dec!(900)).await;
    app.add_sale(&laptop, &alice, "2024-03-02", dec!(1100)).await;
    let kept = app.add_sale(&pen, &alice, "2024-03-02", dec!(2)).await;

    app.state.product_service().delete(laptop.id).await.unwrap();

    let sales = app.state.sale_service().list().await.unwrap();
    assert!(sales.iter().all(|s| s.product_id != laptop.id));
    assert_eq!(sales, vec![kept]);
}

#[tokio::test]
async fn deleting_a_customer_cascades_to_their_sales() {
    let app = TestApp::new().await;
    let desk = app.add_product("Desk", Some("Furniture"), dec!(249.99)).await;
    let alice = app.add_customer("Alice Johnson").await;
    let bob = app.add_customer("Bob Smith").await;

    app.add_sale(&desk, &alice, "2024-03-01", dec!(249.99)).await;
    app.add_sale(&desk, &bob, "2024-03-01", dec!(240.00)).await;

    app.state.customer_service().delete(alice.id).await.unwrap();

    let sales = app.state.sale_service().list().await.unwrap();
    assert_eq!(sales.len(), 1);
    assert_eq!(sales[0].customer_id, bob.id);
    assert_eq!(app.state.store.sum_sale_amounts().await.unwrap(), dec!(240.00));
}

#[tokio::test]
async fn missing_ids_report_not_found() {
    let app = TestApp::new().await;

    assert_matches!(
        app.state.product_service().delete(9).await,
        Err(ServiceError::NotFound(_))
    );
    assert_matches!(
        app.state.customer_service().delete(9).await,
        Err(ServiceError::NotFound(_))
    );
    assert_matches!(
        app.state
            .customer_service()
            .update(9, NewCustomer::new("Nobody", None, None))
            .await,
        Err(ServiceError::NotFound(_))
    );
    assert_matches!(
        app.state.sale_service().delete(9).await,
        Err(ServiceError::NotFound(_))
    );
}

#[tokio::test]
async fn sale_details_join_names_newest_first() {
    let app = TestApp::new().await;
    let chair = app.add_product("Chair", Some("Furniture"), dec!(119.99)).await;
    let pen = app.add_product("Pen", Some("Stationery"), dec!(1.99)).await;
    let diana = app.add_customer("Diana Prince").await;

    let first = app.add_sale(&chair, &diana, "2024-03-01", dec!(119.99)).await;
    let second = app.add_sale(&pen, &diana, "2024-03-05", dec!(1.99)).await;
    let third = app.add_sale(&chair, &diana, "2024-03-05", dec!(110.00)).await;

    let details = app.state.sale_service().list_details().await.unwrap();
    let ids: Vec<i32> = details.iter().map(|d| d.id).collect();
    assert_eq!(ids, vec![third.id, second.id, first.id]);
    assert_eq!(details[0].product, "Chair");
    assert_eq!(details[0].customer, "Diana Prince");
    assert_eq!(details[1].amount, dec!(1.99));
}

#[tokio::test]
async fn dashboard_counts_reflect_writes() {
    let app = TestApp::new().await;
    let notebook = app.add_product("Notebook", Some("Stationery"), dec!(4.99)).await;
    let charlie = app.add_customer("Charlie Davis").await;
    app.add_sale(&notebook, &charlie, "2024-02-10", dec!(4.99)).await;
    app.add_sale(&notebook, &charlie, "2024-02-11", dec!(5.25)).await;

    let stats = app.state.report_service().dashboard().await.unwrap();
    assert_eq!(stats.products, 1);
    assert_eq!(stats.customers, 1);
    assert_eq!(stats.sales, 2);
    assert_eq!(stats.total_revenue, dec!(10.24));
}

#[tokio::test]
async fn amounts_beyond_the_money_column_are_rejected() {
    let app = TestApp::new().await;
    let laptop = app.add_product("Laptop", Some("Electronics"), dec!(900)).await;
    let alice = app.add_customer("Alice Johnson").await;

    let huge = NewSale::new(laptop.id, alice.id, None, dec!(50000000000000000000000000000));
    let result = app.state.sale_service().record(huge.clone()).await;
    assert_matches!(result, Err(ServiceError::ValidationError(_)));
    let result = app.state.store.insert_sale(huge).await;
    assert_matches!(result, Err(ServiceError::ValidationError(_)));

    let result = app
        .state
        .store
        .insert_product(NewProduct::new("Yacht", None, dec!(100000000)))
        .await;
    assert_matches!(result, Err(ServiceError::ValidationError(_)));

    assert_eq!(app.state.store.count_sales().await.unwrap(), 0);
    assert_eq!(app.state.store.count_products().await.unwrap(), 1);
}
