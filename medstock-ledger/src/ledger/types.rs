//! Ledger and catalog types

use crate::{LedgerError, LedgerResult};
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
#[cfg(feature = "openapi")]
use utoipa::{IntoParams, ToSchema};

/// Largest magnitude accepted for a single movement or intake quantity
pub const MAX_MOVEMENT_QUANTITY: i64 = 1_000_000_000;
pub const DEFAULT_TRANSACTION_LIMIT: u32 = 100;
pub const MAX_TRANSACTION_LIMIT: u32 = 1000;
const MAX_NOTES_LEN: usize = 1000;
const MAX_NAME_LEN: usize = 200;

/// Catalog item as stored
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub category: Option<String>,
    pub unit: Option<String>,
    pub price: Option<f64>,
    pub supplier: Option<String>,
    pub location: Option<String>,
    pub batch_number: Option<String>,
    pub expiry_date: Option<NaiveDate>,
    pub quantity: i64,
    pub min_stock: i64,
    pub last_updated: DateTime<Utc>,
}

impl Item {
    /// At or below the reorder threshold
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.min_stock
    }
}

/// Item with derived fields, as returned to callers
#[derive(Debug, Clone, PartialEq, Serialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct ItemView {
    #[serde(flatten)]
    pub item: Item,
    pub is_low_stock: bool,
}

impl From<Item> for ItemView {
    fn from(item: Item) -> Self {
        let is_low_stock = item.is_low_stock();
        Self { item, is_low_stock }
    }
}

/// Catalog intake request
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct NewItem {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub unit: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub supplier: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub batch_number: Option<String>,
    #[serde(default)]
    pub expiry_date: Option<NaiveDate>,
    /// Baseline quantity
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub min_stock: i64,
}

impl NewItem {
    /// Trim text fields and check bounds
    pub fn normalized(mut self) -> LedgerResult<Self> {
        self.name = self.name.trim().to_string();
        if self.name.is_empty() {
            return Err(LedgerError::validation("name", "Name is required"));
        }
        if self.name.chars().count() > MAX_NAME_LEN {
            return Err(LedgerError::validation(
                "name",
                format!("Name must be at most {} characters", MAX_NAME_LEN),
            ));
        }
        if !(0..=MAX_MOVEMENT_QUANTITY).contains(&self.quantity) {
            return Err(LedgerError::validation(
                "quantity",
                "Quantity must be zero or positive",
            ));
        }
        if !(0..=MAX_MOVEMENT_QUANTITY).contains(&self.min_stock) {
            return Err(LedgerError::validation(
                "min_stock",
                "Minimum stock must be zero or positive",
            ));
        }
        if let Some(price) = self.price {
            if !price.is_finite() || price < 0.0 {
                return Err(LedgerError::validation(
                    "price",
                    "Price must be zero or positive",
                ));
            }
        }

        for field in [
            &mut self.description,
            &mut self.category,
            &mut self.unit,
            &mut self.supplier,
            &mut self.location,
            &mut self.batch_number,
        ] {
            *field = blank_to_none(field.take());
        }

        Ok(self)
    }
}

/// Direction of a stock movement
#[derive(Debug, Clone, Copy, Hash, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Stock received
    In,
    /// Stock issued or used
    Out,
}

impl Direction {
    /// Signed delta for a magnitude
    pub fn signed(&self, magnitude: i64) -> i64 {
        match self {
            Direction::In => magnitude,
            Direction::Out => -magnitude,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::In => "in",
            Direction::Out => "out",
        }
    }
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Direction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "in" => Ok(Direction::In),
            "out" => Ok(Direction::Out),
            _ => Err(format!("Unknown movement direction: {}", s)),
        }
    }
}

/// Append-only ledger entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct LedgerEntry {
    pub id: i64,
    pub item_id: i64,
    /// Item name at the time of the movement
    pub item_name: String,
    /// Magnitude, always >= 1
    pub quantity: i64,
    #[serde(rename = "type")]
    pub direction: Direction,
    pub notes: Option<String>,
    /// Name of the acting user
    pub user: String,
    pub created_at: DateTime<Utc>,
}

impl LedgerEntry {
    pub fn delta(&self) -> i64 {
        self.direction.signed(self.quantity)
    }
}

/// Stock movement request
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct MovementRequest {
    pub item_id: i64,
    #[serde(rename = "type", alias = "direction")]
    pub direction: Direction,
    /// Magnitude; must be at least 1
    pub quantity: i64,
    #[serde(default)]
    pub notes: Option<String>,
}

impl MovementRequest {
    pub fn new(item_id: i64, direction: Direction, quantity: i64) -> Self {
        Self {
            item_id,
            direction,
            quantity,
            notes: None,
        }
    }

    pub fn with_notes<S: Into<String>>(mut self, notes: S) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Check magnitude and notes; returns the cleaned notes
    pub(crate) fn validated_notes(&self) -> LedgerResult<Option<String>> {
        if self.quantity < 1 {
            return Err(LedgerError::invalid_quantity("Quantity must be at least 1"));
        }
        if self.quantity > MAX_MOVEMENT_QUANTITY {
            return Err(LedgerError::invalid_quantity(format!(
                "Quantity must be at most {}",
                MAX_MOVEMENT_QUANTITY
            )));
        }

        let notes = blank_to_none(self.notes.clone());
        if let Some(notes) = &notes {
            if notes.chars().count() > MAX_NOTES_LEN {
                return Err(LedgerError::validation(
                    "notes",
                    format!("Notes must be at most {} characters", MAX_NOTES_LEN),
                ));
            }
        }
        Ok(notes)
    }
}

/// Applied movement: the updated item and the entry recording it
#[derive(Debug, Clone, Serialize)]
#[cfg_attr(feature = "openapi", derive(ToSchema))]
pub struct MovementOutcome {
    pub item: ItemView,
    pub transaction: LedgerEntry,
}

/// Ledger query
#[derive(Debug, Clone, Default, Deserialize)]
#[cfg_attr(
    feature = "openapi",
    derive(IntoParams),
    into_params(parameter_in = Query)
)]
pub struct TransactionFilter {
    /// Only entries for this item
    pub item_id: Option<i64>,
    /// Maximum number of entries (default 100, capped at 1000)
    pub limit: Option<u32>,
}

impl TransactionFilter {
    pub fn for_item(item_id: i64) -> Self {
        Self {
            item_id: Some(item_id),
            limit: None,
        }
    }

    pub fn effective_limit(&self) -> u32 {
        self.limit
            .unwrap_or(DEFAULT_TRANSACTION_LIMIT)
            .clamp(1, MAX_TRANSACTION_LIMIT)
    }
}

fn blank_to_none(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: i64, min_stock: i64) -> Item {
        Item {
            id: 1,
            name: "Gauze".to_string(),
            description: None,
            category: None,
            unit: None,
            price: None,
            supplier: None,
            location: None,
            batch_number: None,
            expiry_date: None,
            quantity,
            min_stock,
            last_updated: Utc::now(),
        }
    }

    #[test]
    fn low_stock_is_inclusive() {
        assert!(item(5, 5).is_low_stock());
        assert!(item(0, 0).is_low_stock());
        assert!(!item(6, 5).is_low_stock());
    }

    #[test]
    fn item_view_flattens_with_flag() {
        let json = serde_json::to_value(ItemView::from(item(3, 5))).unwrap();
        assert_eq!(json["name"], "Gauze");
        assert_eq!(json["quantity"], 3);
        assert_eq!(json["is_low_stock"], true);
    }

    #[test]
    fn movement_request_uses_type_tag() {
        let request: MovementRequest =
            serde_json::from_str(r#"{"item_id":7,"type":"out","quantity":2}"#).unwrap();
        assert_eq!(request.direction, Direction::Out);
        assert_eq!(request.direction.signed(request.quantity), -2);
        assert!(request.notes.is_none());
    }

    #[test]
    fn zero_and_negative_magnitudes_are_invalid() {
        for quantity in [0, -4] {
            let request = MovementRequest::new(1, Direction::In, quantity);
            assert!(matches!(
                request.validated_notes(),
                Err(LedgerError::InvalidQuantity { .. })
            ));
        }
    }

    #[test]
    fn blank_notes_are_dropped() {
        let request = MovementRequest::new(1, Direction::In, 1).with_notes("   ");
        assert_eq!(request.validated_notes().unwrap(), None);
    }

    #[test]
    fn filter_limit_is_clamped() {
        assert_eq!(TransactionFilter::default().effective_limit(), 100);
        let filter = TransactionFilter {
            item_id: None,
            limit: Some(50_000),
        };
        assert_eq!(filter.effective_limit(), 1000);
        let filter = TransactionFilter {
            item_id: None,
            limit: Some(0),
        };
        assert_eq!(filter.effective_limit(), 1);
    }

    #[test]
    fn intake_validation() {
        let ok = NewItem {
            name: "  Saline 0.9% ".to_string(),
            quantity: 10,
            min_stock: 2,
            supplier: Some(" ".to_string()),
            ..Default::default()
        }
        .normalized()
        .unwrap();
        assert_eq!(ok.name, "Saline 0.9%");
        assert_eq!(ok.supplier, None);

        let negative = NewItem {
            name: "Syringe".to_string(),
            quantity: -1,
            ..Default::default()
        };
        assert!(matches!(
            negative.normalized(),
            Err(LedgerError::Validation { field, .. }) if field == "quantity"
        ));

        let priced = NewItem {
            name: "Syringe".to_string(),
            price: Some(-0.5),
            ..Default::default()
        };
        assert!(priced.normalized().is_err());
    }
}
