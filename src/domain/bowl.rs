//! Build-your-own bowl pricing.
//!
//! A bowl costs its menu price plus surcharges for toppings beyond the
//! included ones, premium proteins and paid extras.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::MenuItem;

pub const INCLUDED_TOPPINGS: usize = 4;
pub const EXTRA_TOPPING_PRICE: i64 = 2000;
pub const PREMIUM_PROTEIN_PRICE: i64 = 4000;

const PREMIUM_PROTEINS: [&str; 2] = ["salmon", "camaron"];

const EXTRAS: [(&str, i64); 3] = [
    ("aguacate", 2500),
    ("queso_crema", 2000),
    ("doble_proteina", 6000),
];

#[derive(Debug, Error, PartialEq, Eq)]
pub enum BowlError {
    #[error("bowl needs a base")]
    MissingBase,
    #[error("bowl needs a protein")]
    MissingProtein,
    #[error("unknown bowl extra '{0}'")]
    UnknownExtra(String),
    #[error("menu item '{0}' is not a bowl")]
    NotABowl(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct BowlCustomization {
    pub base: String,
    #[serde(default)]
    pub toppings: Vec<String>,
    pub proteina: String,
    #[serde(default)]
    pub extras: Vec<String>,
}

impl BowlCustomization {
    pub fn validate(&self) -> Result<(), BowlError> {
        if self.base.trim().is_empty() {
            return Err(BowlError::MissingBase);
        }
        if self.proteina.trim().is_empty() {
            return Err(BowlError::MissingProtein);
        }
        for extra in &self.extras {
            extra_price(extra).ok_or_else(|| BowlError::UnknownExtra(extra.clone()))?;
        }
        Ok(())
    }

    /// Amount added on top of the bowl's menu price.
    pub fn surcharge(&self) -> Result<i64, BowlError> {
        self.validate()?;

        let extra_toppings = self.toppings.len().saturating_sub(INCLUDED_TOPPINGS) as i64;
        let protein = if PREMIUM_PROTEINS.contains(&normalize(&self.proteina).as_str()) {
            PREMIUM_PROTEIN_PRICE
        } else {
            0
        };
        let extras: i64 = self.extras.iter().filter_map(|extra| extra_price(extra)).sum();

        Ok(extra_toppings
            .saturating_mul(EXTRA_TOPPING_PRICE)
            .saturating_add(protein)
            .saturating_add(extras))
    }

    /// Stable key for a cart line, so two different bowls of the same menu
    /// item stay separate while identical ones stack. Selection order does
    /// not matter.
    pub fn custom_key(&self, item_id: Uuid) -> String {
        let mut toppings: Vec<String> = self.toppings.iter().map(|t| normalize(t)).collect();
        toppings.sort();
        let mut extras: Vec<String> = self.extras.iter().map(|e| normalize(e)).collect();
        extras.sort();

        format!(
            "bowl:{}:{}:{}:{}:{}",
            item_id,
            normalize(&self.base),
            normalize(&self.proteina),
            toppings.join(","),
            extras.join(",")
        )
    }
}

pub fn bowl_unit_price(item: &MenuItem, custom: &BowlCustomization) -> Result<i64, BowlError> {
    if !item.es_bowl {
        return Err(BowlError::NotABowl(item.nombre.clone()));
    }
    Ok(item.precio.saturating_add(custom.surcharge()?))
}

fn extra_price(extra: &str) -> Option<i64> {
    let extra = normalize(extra);
    EXTRAS
        .iter()
        .find(|(name, _)| *name == extra)
        .map(|(_, price)| *price)
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}
