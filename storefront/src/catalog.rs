use shared::Product;
use uuid::Uuid;

use crate::api::{ClientError, ShopApi};

/// Two rows of four on the listing page.
pub const PAGE_SIZE: usize = 8;

/// Case-insensitive substring match on the product name over the full list.
/// The query is used as typed; only an empty query keeps everything.
pub fn filter_by_name<'a>(products: &'a [Product], query: &str) -> Vec<&'a Product> {
    let query = query.to_lowercase();
    products
        .iter()
        .filter(|p| query.is_empty() || p.name.to_lowercase().contains(&query))
        .collect()
}

/// Number of [`PAGE_SIZE`] pages needed for `len` items. Zero for an empty list.
pub fn page_count(len: usize) -> usize {
    len.div_ceil(PAGE_SIZE)
}

/// The 1-based `page` of `items`. Page numbers are clamped to the valid range,
/// so page 0 is the first page and anything past the end is the last one.
pub fn page<T>(items: &[T], page: usize) -> &[T] {
    let last = page_count(items.len()).max(1);
    let start = (page.clamp(1, last) - 1) * PAGE_SIZE;
    &items[start..items.len().min(start + PAGE_SIZE)]
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProductPage {
    Found(Product),
    NotFound,
}

impl ProductPage {
    /// Ids that do not parse are treated like unknown ones.
    pub async fn load(api: &dyn ShopApi, raw_id: &str) -> Result<Self, ClientError> {
        let Ok(id) = Uuid::parse_str(raw_id.trim()) else {
            return Ok(Self::NotFound);
        };
        Ok(match api.get_product(id).await? {
            Some(product) => Self::Found(product),
            None => Self::NotFound,
        })
    }
}
