#![cfg(feature = "test-utils")]

use harness::assert::{ExpectedRow, SqlValue, assert_table};
use harness::database::TestDatabase;
use harness::error::ErrorKind;
use harness::test_utils::database::spawn_database;
use harness::test_utils::products::{
    PRODUCTS_TABLE, ProductRow, products_schema_path, sample_product,
};
use telemetry::init_test_tracing;

/// Provisions a database with the products schema applied.
async fn products_database() -> TestDatabase {
    let database = spawn_database().await;
    database
        .execute_script(products_schema_path())
        .await
        .expect("Failed to apply the products schema");

    database
}

#[tokio::test(flavor = "multi_thread")]
async fn seeded_row_matches_exactly_once() {
    init_test_tracing();

    let mut database = products_database().await;
    let product = sample_product();
    product.insert(&database).await.unwrap();

    assert_table(database.pool(), PRODUCTS_TABLE)
        .contains_exactly_one_row_matching(&product.expected_row())
        .await
        .unwrap();

    database.dispose().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn altering_any_single_field_fails_the_match() {
    init_test_tracing();

    let mut database = products_database().await;
    let product = sample_product();
    product.insert(&database).await.unwrap();

    let altered: Vec<ProductRow> = vec![
        ProductRow {
            product_code: product.product_code + 1,
            ..product.clone()
        },
        ProductRow {
            shipping_weight: product.shipping_weight + 0.5,
            ..product.clone()
        },
        ProductRow {
            shipping_length: product.shipping_length + 0.5,
            ..product.clone()
        },
        ProductRow {
            shipping_width: product.shipping_width + 0.5,
            ..product.clone()
        },
        ProductRow {
            shipping_height: product.shipping_height + 0.5,
            ..product.clone()
        },
        ProductRow {
            unit_cost: product.unit_cost + 0.5,
            ..product.clone()
        },
        ProductRow {
            per_order: product.per_order + 1,
            ..product.clone()
        },
    ];

    for row in altered {
        let error = assert_table(database.pool(), PRODUCTS_TABLE)
            .contains_exactly_one_row_matching(&row.expected_row())
            .await
            .unwrap_err();

        assert_eq!(error.kind(), ErrorKind::AssertionFailed);
        assert!(
            error.detail().unwrap().contains("0 rows"),
            "an altered field should match nothing, got: {error}"
        );
    }

    database.dispose().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn duplicate_rows_fail_the_match() {
    init_test_tracing();

    let mut database = products_database().await;
    let product = sample_product();
    product.insert(&database).await.unwrap();
    product.insert(&database).await.unwrap();

    let error = assert_table(database.pool(), PRODUCTS_TABLE)
        .contains_exactly_one_row_matching(&product.expected_row())
        .await
        .unwrap_err();

    assert_eq!(error.kind(), ErrorKind::AssertionFailed);
    assert!(
        error.detail().unwrap().contains("2 rows"),
        "the failure should report the actual match count, got: {error}"
    );

    database.dispose().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_table_fails_the_match() {
    init_test_tracing();

    let mut database = products_database().await;

    let error = assert_table(database.pool(), PRODUCTS_TABLE)
        .contains_exactly_one_row_matching(&sample_product().expected_row())
        .await
        .unwrap_err();
    assert_eq!(error.kind(), ErrorKind::AssertionFailed);

    database.dispose().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn empty_descriptor_matches_any_single_row() {
    init_test_tracing();

    let mut database = products_database().await;
    sample_product().insert(&database).await.unwrap();

    // With no declared columns the assertion degenerates to "the table has
    // exactly one row".
    assert_table(database.pool(), PRODUCTS_TABLE)
        .contains_exactly_one_row_matching(&ExpectedRow::new())
        .await
        .unwrap();

    database.dispose().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn null_expectations_match_null_columns() {
    init_test_tracing();

    let mut database = products_database().await;
    database
        .run_sql(r#"insert into products ("ProductCode", "UnitCost") values (7, null)"#)
        .await
        .unwrap();

    let expected = ExpectedRow::new()
        .with("ProductCode", 7)
        .with("UnitCost", SqlValue::Null);

    assert_table(database.pool(), PRODUCTS_TABLE)
        .contains_exactly_one_row_matching(&expected)
        .await
        .unwrap();

    database.dispose().await.unwrap();
}

#[tokio::test(flavor = "multi_thread")]
async fn count_rows_matching_reports_partial_matches() {
    init_test_tracing();

    let mut database = products_database().await;
    let product = sample_product();
    product.insert(&database).await.unwrap();
    ProductRow {
        per_order: product.per_order + 1,
        ..product.clone()
    }
    .insert(&database)
    .await
    .unwrap();

    let table = assert_table(database.pool(), PRODUCTS_TABLE);

    // Both rows share the product code, only one has the original count.
    let by_code = ExpectedRow::new().with("ProductCode", product.product_code);
    assert_eq!(table.count_rows_matching(&by_code).await.unwrap(), 2);

    let by_code_and_count = by_code.with("PerOrder", product.per_order);
    assert_eq!(
        table.count_rows_matching(&by_code_and_count).await.unwrap(),
        1
    );

    database.dispose().await.unwrap();
}
