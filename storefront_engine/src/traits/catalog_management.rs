use thiserror::Error;

use crate::{
    db_types::{NewProduct, Product, ProductId, ProductUpdate},
    traits::data_objects::{Page, ProductQueryFilter},
};

#[derive(Debug, Clone, Error)]
pub enum CatalogApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The product {0} does not exist")]
    ProductNotFound(ProductId),
    #[error("A product with SKU {0} already exists")]
    DuplicateSku(String),
    #[error("The product {0} is referenced by existing orders and cannot be deleted")]
    ProductInUse(ProductId),
    #[error("Invalid product data: {0}")]
    InvalidProduct(String),
    #[error("The product update request does not change anything")]
    UpdateNoOp,
}

impl From<sqlx::Error> for CatalogApiError {
    fn from(e: sqlx::Error) -> Self {
        CatalogApiError::DatabaseError(e.to_string())
    }
}

/// The `CatalogManagement` trait defines the behaviour a backend needs to maintain the product catalog.
///
/// Backends do not validate product data beyond what their storage constraints enforce. Validation is done by
/// [`crate::CatalogApi`].
#[allow(async_fn_in_trait)]
pub trait CatalogManagement {
    /// Stores a new product. A duplicate SKU results in [`CatalogApiError::DuplicateSku`].
    async fn insert_product(&self, product: NewProduct) -> Result<Product, CatalogApiError>;

    /// Stores all the products in a single atomic transaction. Either every product is inserted, or none are.
    async fn insert_products(&self, products: Vec<NewProduct>) -> Result<Vec<Product>, CatalogApiError>;

    async fn fetch_product(&self, id: ProductId) -> Result<Option<Product>, CatalogApiError>;

    /// Returns the page of products matching the filter, along with the total number of matches.
    async fn search_products(&self, filter: ProductQueryFilter) -> Result<Page<Product>, CatalogApiError>;

    /// Applies a partial update to the product. Returns `None` if the product does not exist.
    async fn update_product(&self, id: ProductId, update: ProductUpdate) -> Result<Option<Product>, CatalogApiError>;

    /// Deletes the product, returning `false` if it did not exist. Products referenced by order line items cannot be
    /// deleted.
    async fn delete_product(&self, id: ProductId) -> Result<bool, CatalogApiError>;
}
