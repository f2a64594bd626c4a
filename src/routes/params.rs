use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};

use crate::{
    domain::order::OrderStatus,
    error::{AppError, AppResult},
};

#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct Pagination {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

impl Pagination {
    pub fn normalize(&self) -> (i64, i64, i64) {
        let page = self.page.unwrap_or(1).max(1);
        let per_page = self.per_page.unwrap_or(20).clamp(1, 100);
        let offset = (page - 1).saturating_mul(per_page);
        (page, per_page, offset)
    }
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Inclusive calendar-day range, evaluated in UTC.
#[derive(Debug, Default, Clone, Copy, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DateRange {
    pub desde: Option<NaiveDate>,
    pub hasta: Option<NaiveDate>,
}

impl DateRange {
    /// `[start, end)` timestamps; `end` is midnight after `hasta`.
    pub fn bounds(&self) -> AppResult<(Option<DateTime<Utc>>, Option<DateTime<Utc>>)> {
        if let (Some(desde), Some(hasta)) = (self.desde, self.hasta) {
            if desde > hasta {
                return Err(AppError::BadRequest("desde must not be after hasta".into()));
            }
        }
        let start = self.desde.map(start_of_day);
        let end = match self.hasta {
            Some(hasta) => Some(start_of_day(
                hasta
                    .checked_add_days(Days::new(1))
                    .ok_or_else(|| AppError::BadRequest("hasta is out of range".into()))?,
            )),
            None => None,
        };
        Ok((start, end))
    }
}

fn start_of_day(day: NaiveDate) -> DateTime<Utc> {
    day.and_hms_opt(0, 0, 0).unwrap_or_default().and_utc()
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct OrderListQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub estado: Option<OrderStatus>,
    pub desde: Option<NaiveDate>,
    pub hasta: Option<NaiveDate>,
    pub sort_order: Option<SortOrder>,
}

impl OrderListQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }

    pub fn range(&self) -> DateRange {
        DateRange {
            desde: self.desde,
            hasta: self.hasta,
        }
    }
}

#[derive(Debug, Default, Deserialize, ToSchema, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MenuQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
    pub q: Option<String>,
    pub categoria: Option<String>,
    pub disponible: Option<bool>,
}

impl MenuQuery {
    pub fn pagination(&self) -> Pagination {
        Pagination {
            page: self.page,
            per_page: self.per_page,
        }
    }
}
