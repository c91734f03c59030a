mod device;
mod device_model;
mod edge;
mod import;
mod lorawan;
mod settings;

pub use device::*;
pub use device_model::*;
pub use edge::*;
pub use import::*;
pub use lorawan::*;
pub use settings::*;

use serde::{Deserialize, Serialize};

/// One page of a listing.
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaginatedResult<T> {
    /// Items of the current page
    pub items: Vec<T>,
    /// Number of items matching the query over all pages
    pub total_items: u64,
    /// Requested page size
    pub page_size: u32,
    /// Zero based page index
    pub current_page: u32,
    /// Query string of the next page, absent on the last page
    pub next_page: Option<String>,
}

impl<T> PaginatedResult<T> {
    pub fn map<U>(self, f: impl FnMut(T) -> U) -> PaginatedResult<U> {
        PaginatedResult {
            items: self.items.into_iter().map(f).collect(),
            total_items: self.total_items,
            page_size: self.page_size,
            current_page: self.current_page,
            next_page: self.next_page,
        }
    }
}

/// RFC 7807 error body.
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProblemDetails {
    #[serde(rename = "type")]
    pub problem_type: String,
    pub title: String,
    pub status: u16,
    pub detail: Option<String>,
    /// Correlation id of a logged internal error
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_id: Option<String>,
}
