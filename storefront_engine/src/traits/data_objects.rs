use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Serialize};
use sf_common::Cents;

use crate::db_types::{ConversionError, OrderWithItems};

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

//--------------------------------------     Pagination      ---------------------------------------------------------
/// A validated page request. Construct it with [`Pagination::new`], which clamps out-of-range values:
/// * `page < 1` becomes page 1,
/// * a missing or non-positive `size` becomes [`DEFAULT_PAGE_SIZE`],
/// * `size > MAX_PAGE_SIZE` becomes [`MAX_PAGE_SIZE`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    page: i64,
    size: i64,
}

impl Default for Pagination {
    fn default() -> Self {
        Self { page: 1, size: DEFAULT_PAGE_SIZE }
    }
}

impl Pagination {
    pub fn new(page: Option<i64>, size: Option<i64>) -> Self {
        let page = page.filter(|p| *p >= 1).unwrap_or(1);
        let size = match size {
            Some(s) if s > MAX_PAGE_SIZE => MAX_PAGE_SIZE,
            Some(s) if s >= 1 => s,
            _ => DEFAULT_PAGE_SIZE,
        };
        Self { page, size }
    }

    pub fn page(&self) -> i64 {
        self.page
    }

    pub fn size(&self) -> i64 {
        self.size
    }

    pub fn offset(&self) -> i64 {
        (self.page - 1).saturating_mul(self.size)
    }
}

/// Raw `page` and `size` query parameters, as supplied by a client.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PageParams {
    pub page: Option<i64>,
    pub size: Option<i64>,
}

impl From<PageParams> for Pagination {
    fn from(params: PageParams) -> Self {
        Pagination::new(params.page, params.size)
    }
}

//--------------------------------------        Page         ---------------------------------------------------------
/// One page of results, together with the total number of records that match the query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: i64,
    pub size: i64,
    pub total: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, pagination: Pagination, total: i64) -> Self {
        Self { items, page: pagination.page(), size: pagination.size(), total }
    }

    pub fn empty(pagination: Pagination) -> Self {
        Self::new(Vec::new(), pagination, 0)
    }
}

pub type OrderPage = Page<OrderWithItems>;

//--------------------------------------    ProductSort      ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductSort {
    PriceAsc,
    PriceDesc,
    NameAsc,
    NameDesc,
    #[default]
    CreatedDesc,
}

impl ProductSort {
    /// The `ORDER BY` clause for this sort order. The trailing id keeps the ordering total.
    pub fn order_by_clause(&self) -> &'static str {
        match self {
            ProductSort::PriceAsc => "price ASC, id ASC",
            ProductSort::PriceDesc => "price DESC, id DESC",
            ProductSort::NameAsc => "name ASC, id ASC",
            ProductSort::NameDesc => "name DESC, id DESC",
            ProductSort::CreatedDesc => "created_at DESC, id DESC",
        }
    }
}

impl Display for ProductSort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ProductSort::PriceAsc => "price_asc",
            ProductSort::PriceDesc => "price_desc",
            ProductSort::NameAsc => "name_asc",
            ProductSort::NameDesc => "name_desc",
            ProductSort::CreatedDesc => "created_desc",
        };
        f.write_str(s)
    }
}

impl FromStr for ProductSort {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "price_asc" => Ok(Self::PriceAsc),
            "price_desc" => Ok(Self::PriceDesc),
            "name_asc" => Ok(Self::NameAsc),
            "name_desc" => Ok(Self::NameDesc),
            "created_desc" => Ok(Self::CreatedDesc),
            s => Err(ConversionError::from(format!("Invalid sort order: {s}"))),
        }
    }
}

//--------------------------------------  ProductQueryFilter ---------------------------------------------------------
#[derive(Debug, Clone, Default)]
pub struct ProductQueryFilter {
    /// Case-insensitive search text, matched against product names and descriptions.
    pub search: Option<String>,
    pub min_price: Option<Cents>,
    pub max_price: Option<Cents>,
    pub sort: ProductSort,
    pub pagination: Pagination,
}

impl ProductQueryFilter {
    pub fn with_search<S: Into<String>>(mut self, search: S) -> Self {
        let search = search.into();
        let trimmed = search.trim();
        self.search = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    pub fn with_min_price(mut self, price: Cents) -> Self {
        self.min_price = Some(price);
        self
    }

    pub fn with_max_price(mut self, price: Cents) -> Self {
        self.max_price = Some(price);
        self
    }

    pub fn with_sort(mut self, sort: ProductSort) -> Self {
        self.sort = sort;
        self
    }

    pub fn with_pagination(mut self, pagination: Pagination) -> Self {
        self.pagination = pagination;
        self
    }
}
