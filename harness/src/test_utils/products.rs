use std::path::PathBuf;

use crate::assert::ExpectedRow;
use crate::database::TestDatabase;
use crate::error::{ErrorKind, HarnessResult};
use crate::harness_error;

/// Name of the fixture table created by the products schema script.
pub const PRODUCTS_TABLE: &str = "products";

/// Path to the checked-in products schema script.
pub fn products_schema_path() -> PathBuf {
    fixture_path("products.sql")
}

/// Path to the copy package descriptor that moves the products table.
pub fn products_package_path() -> PathBuf {
    fixture_path("products_package.json")
}

pub fn fixture_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(name)
}

/// A row of the products fixture table.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductRow {
    pub product_code: i32,
    pub shipping_weight: f64,
    pub shipping_length: f64,
    pub shipping_width: f64,
    pub shipping_height: f64,
    pub unit_cost: f64,
    pub per_order: i32,
}

impl ProductRow {
    /// Inserts this row into the products table of the given database.
    pub async fn insert(&self, database: &TestDatabase) -> HarnessResult<()> {
        sqlx::query(
            r#"insert into products
               ("ProductCode", "ShippingWeight", "ShippingLength", "ShippingWidth",
                "ShippingHeight", "UnitCost", "PerOrder")
               values ($1, $2, $3, $4, $5, $6, $7)"#,
        )
        .bind(self.product_code)
        .bind(self.shipping_weight)
        .bind(self.shipping_length)
        .bind(self.shipping_width)
        .bind(self.shipping_height)
        .bind(self.unit_cost)
        .bind(self.per_order)
        .execute(database.pool())
        .await
        .map_err(|err| {
            harness_error!(
                ErrorKind::QueryFailed,
                "failed to insert the product row",
                source: err
            )
        })?;

        Ok(())
    }

    /// Returns the expected-match descriptor for this row.
    pub fn expected_row(&self) -> ExpectedRow {
        ExpectedRow::new()
            .with("ProductCode", self.product_code)
            .with("ShippingWeight", self.shipping_weight)
            .with("ShippingLength", self.shipping_length)
            .with("ShippingWidth", self.shipping_width)
            .with("ShippingHeight", self.shipping_height)
            .with("UnitCost", self.unit_cost)
            .with("PerOrder", self.per_order)
    }
}

/// The canonical sample row used by the end-to-end scenario.
pub fn sample_product() -> ProductRow {
    ProductRow {
        product_code: 1,
        shipping_weight: 2.0,
        shipping_length: 3.0,
        shipping_width: 4.0,
        shipping_height: 5.0,
        unit_cost: 6.0,
        per_order: 2,
    }
}
