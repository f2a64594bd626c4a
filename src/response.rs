use serde::Serialize;
use utoipa::ToSchema;

/// Paging info attached to list responses; all `None` for single objects.
#[derive(Debug, Serialize, ToSchema, Clone, Default, PartialEq)]
pub struct Meta {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub total: Option<i64>,
}

impl Meta {
    pub fn new(page: i64, per_page: i64, total: i64) -> Self {
        Self {
            page: Some(page),
            per_page: Some(per_page),
            total: Some(total),
        }
    }

    /// Unpaged list with a known size.
    pub fn total(total: i64) -> Self {
        Self {
            total: Some(total),
            ..Self::default()
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ApiResponse<T> {
    pub message: String,
    pub data: Option<T>,
    pub meta: Option<Meta>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn success(message: impl Into<String>, data: T, meta: Option<Meta>) -> Self {
        Self {
            message: message.into(),
            data: Some(data),
            meta,
        }
    }
}
