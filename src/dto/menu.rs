use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::MenuItem;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMenuItemRequest {
    pub nombre: String,
    pub categoria: String,
    pub precio: i64,
    #[serde(default)]
    pub es_bowl: bool,
    pub disponible: Option<bool>,
}

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct UpdateMenuItemRequest {
    pub nombre: Option<String>,
    pub categoria: Option<String>,
    pub precio: Option<i64>,
    pub disponible: Option<bool>,
    pub es_bowl: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct MenuList {
    #[schema(value_type = Vec<MenuItem>)]
    pub items: Vec<MenuItem>,
}
