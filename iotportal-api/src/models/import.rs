use serde::{Deserialize, Serialize};

/// Outcome message of one imported CSV row.
#[cfg_attr(feature = "docs", derive(utoipa::ToSchema))]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportResultLine {
    /// One based line number in the file, the header being line 1
    pub line_number: u64,
    pub device_id: String,
    pub message: String,
    pub is_error_message: bool,
}
