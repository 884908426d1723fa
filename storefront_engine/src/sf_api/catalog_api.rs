use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{NewProduct, Product, ProductId, ProductUpdate},
    traits::{CatalogApiError, CatalogManagement, Page, ProductQueryFilter},
};

/// `CatalogApi` maintains the product catalog: browsing for everyone, and creation, editing, deletion and bulk
/// import for administrators.
pub struct CatalogApi<B> {
    db: B,
}

impl<B> Debug for CatalogApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CatalogApi")
    }
}

impl<B> CatalogApi<B> {
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B> CatalogApi<B>
where B: CatalogManagement
{
    pub async fn create_product(&self, product: NewProduct) -> Result<Product, CatalogApiError> {
        let product = normalize_new_product(product)?;
        let product = self.db.insert_product(product).await?;
        info!("🏷️ New product {} ({}) added to the catalog", product.sku, product.id);
        Ok(product)
    }

    /// Adds all the products to the catalog, or none of them if any product is invalid or has a SKU that is already
    /// taken.
    pub async fn import_products(&self, products: Vec<NewProduct>) -> Result<Vec<Product>, CatalogApiError> {
        if products.is_empty() {
            return Err(CatalogApiError::InvalidProduct("The import contains no products".into()));
        }
        let products = products
            .into_iter()
            .enumerate()
            .map(|(i, p)| {
                normalize_new_product(p).map_err(|e| CatalogApiError::InvalidProduct(format!("Product #{}: {e}", i + 1)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let products = self.db.insert_products(products).await?;
        info!("🏷️ {} products imported into the catalog", products.len());
        Ok(products)
    }

    pub async fn product(&self, id: ProductId) -> Result<Product, CatalogApiError> {
        self.db.fetch_product(id).await?.ok_or(CatalogApiError::ProductNotFound(id))
    }

    pub async fn search(&self, filter: ProductQueryFilter) -> Result<Page<Product>, CatalogApiError> {
        if let (Some(min), Some(max)) = (filter.min_price, filter.max_price) {
            if min > max {
                debug!("🏷️ Product search with min price {min} above max price {max} matches nothing");
            }
        }
        self.db.search_products(filter).await
    }

    /// Updates the given fields of a product. This is also how administrators correct stock levels.
    pub async fn update_product(&self, id: ProductId, update: ProductUpdate) -> Result<Product, CatalogApiError> {
        if update.is_empty() {
            return Err(CatalogApiError::UpdateNoOp);
        }
        let update = normalize_update(update)?;
        let product = self.db.update_product(id, update).await?.ok_or(CatalogApiError::ProductNotFound(id))?;
        info!("🏷️ Product {} ({id}) updated", product.sku);
        Ok(product)
    }

    pub async fn delete_product(&self, id: ProductId) -> Result<(), CatalogApiError> {
        if !self.db.delete_product(id).await? {
            return Err(CatalogApiError::ProductNotFound(id));
        }
        info!("🏷️ {id} removed from the catalog");
        Ok(())
    }
}

fn normalize_currency(currency: &str) -> Result<String, CatalogApiError> {
    let currency = currency.trim().to_ascii_uppercase();
    if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(CatalogApiError::InvalidProduct(format!("'{currency}' is not a three-letter currency code")));
    }
    Ok(currency)
}

fn check_amounts(price: Option<sf_common::Cents>, stock: Option<i64>) -> Result<(), CatalogApiError> {
    if price.map(|p| p.is_negative()).unwrap_or(false) {
        return Err(CatalogApiError::InvalidProduct("Price cannot be negative".into()));
    }
    if stock.map(|s| s < 0).unwrap_or(false) {
        return Err(CatalogApiError::InvalidProduct("Stock cannot be negative".into()));
    }
    Ok(())
}

fn normalize_new_product(mut product: NewProduct) -> Result<NewProduct, CatalogApiError> {
    product.sku = product.sku.trim().to_string();
    product.name = product.name.trim().to_string();
    if product.sku.is_empty() {
        return Err(CatalogApiError::InvalidProduct("SKU is required".into()));
    }
    if product.name.is_empty() {
        return Err(CatalogApiError::InvalidProduct("Name is required".into()));
    }
    check_amounts(Some(product.price), Some(product.stock))?;
    product.currency = normalize_currency(&product.currency)?;
    Ok(product)
}

fn normalize_update(mut update: ProductUpdate) -> Result<ProductUpdate, CatalogApiError> {
    if let Some(name) = update.name.as_mut() {
        *name = name.trim().to_string();
        if name.is_empty() {
            return Err(CatalogApiError::InvalidProduct("Name cannot be blank".into()));
        }
    }
    check_amounts(update.price, update.stock)?;
    if let Some(currency) = update.currency.take() {
        update.currency = Some(normalize_currency(&currency)?);
    }
    Ok(update)
}
