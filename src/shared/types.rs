use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::shared::constants::{DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub message: Option<String>,
    pub meta: Option<Meta>,
    pub errors: Option<Vec<String>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct Meta {
    pub total: i64,
}

/// Reference to another record, either as a bare id or as `{"id": ..}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum IdRef {
    Id(i64),
    Object { id: i64 },
}

impl IdRef {
    pub fn id(self) -> i64 {
        match self {
            IdRef::Id(id) | IdRef::Object { id } => id,
        }
    }
}

// =============================================================================
// PAGINATION
// =============================================================================

/// Pagination query parameters shared by every list endpoint
#[derive(Debug, Clone, Deserialize, IntoParams)]
pub struct PaginationQuery {
    /// Page number (1-indexed, default: 1)
    #[serde(default = "default_page")]
    #[param(minimum = 1)]
    pub page: i64,

    /// Number of items per page (default: 10, max: 100)
    #[serde(default = "default_page_size")]
    #[param(minimum = 1, maximum = 100)]
    pub page_size: i64,
}

fn default_page() -> i64 {
    1
}

fn default_page_size() -> i64 {
    DEFAULT_PAGE_SIZE
}

impl Default for PaginationQuery {
    fn default() -> Self {
        Self {
            page: 1,
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PaginationQuery {
    /// Build from raw query pairs, ignoring anything that is not `page`/`page_size`.
    /// Used by endpoints whose other parameters are free-form filters.
    pub fn from_pairs(pairs: &[(String, String)]) -> Self {
        let mut query = Self::default();
        for (key, value) in pairs {
            match key.as_str() {
                "page" => query.page = value.trim().parse().unwrap_or(1),
                "page_size" => {
                    query.page_size = value.trim().parse().unwrap_or(DEFAULT_PAGE_SIZE)
                }
                _ => {}
            }
        }
        query
    }

    /// Calculate SQL OFFSET from page number
    pub fn offset(&self) -> i64 {
        (self.page.max(1) - 1) * self.limit()
    }

    /// Get clamped page_size (respects MAX_PAGE_SIZE)
    pub fn limit(&self) -> i64 {
        self.page_size.clamp(1, MAX_PAGE_SIZE)
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: Option<T>, message: Option<String>, meta: Option<Meta>) -> Self {
        Self {
            success: true,
            data,
            message,
            meta,
            errors: None,
        }
    }

    pub fn error(message: Option<String>, errors: Option<Vec<String>>) -> ApiResponse<()> {
        ApiResponse {
            success: false,
            data: None,
            message,
            meta: None,
            errors,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pagination_clamps() {
        let query = PaginationQuery {
            page: 0,
            page_size: 1000,
        };
        assert_eq!(query.limit(), MAX_PAGE_SIZE);
        assert_eq!(query.offset(), 0);

        let query = PaginationQuery {
            page: 3,
            page_size: 20,
        };
        assert_eq!(query.offset(), 40);
    }

    #[test]
    fn test_id_ref_accepts_both_shapes() {
        let bare: IdRef = serde_json::from_str("7").unwrap();
        let object: IdRef = serde_json::from_str(r#"{"id": 7, "officer_number": 12}"#).unwrap();
        assert_eq!(bare.id(), 7);
        assert_eq!(object.id(), 7);
    }

    #[test]
    fn test_pagination_from_pairs_skips_filters() {
        let pairs = vec![
            ("last_name".to_string(), "smith".to_string()),
            ("page".to_string(), "2".to_string()),
            ("page_size".to_string(), "junk".to_string()),
        ];
        let query = PaginationQuery::from_pairs(&pairs);
        assert_eq!(query.page, 2);
        assert_eq!(query.page_size, DEFAULT_PAGE_SIZE);
    }
}
