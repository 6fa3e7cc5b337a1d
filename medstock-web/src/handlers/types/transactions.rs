//! Stock movement request body

use medstock_ledger::{Direction, LedgerError, MovementRequest};
use serde::Deserialize;
use serde_json::Value;

/// Wire form of [`MovementRequest`].
///
/// `quantity` is taken as raw JSON so that a missing, null, fractional or
/// non-numeric magnitude surfaces as `invalid_quantity` instead of a body
/// rejection.
#[derive(Debug, Deserialize)]
pub struct MovementBody {
    pub item_id: i64,
    #[serde(rename = "type", alias = "direction")]
    pub direction: Direction,
    #[serde(default)]
    pub quantity: Option<Value>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl TryFrom<MovementBody> for MovementRequest {
    type Error = LedgerError;

    fn try_from(body: MovementBody) -> Result<Self, Self::Error> {
        let quantity = match body.quantity {
            None | Some(Value::Null) => {
                return Err(LedgerError::invalid_quantity("Quantity is required"))
            }
            Some(Value::Number(number)) => number
                .as_i64()
                .ok_or_else(|| LedgerError::invalid_quantity("Quantity must be a whole number"))?,
            Some(_) => return Err(LedgerError::invalid_quantity("Quantity must be a number")),
        };

        let mut request = MovementRequest::new(body.item_id, body.direction, quantity);
        request.notes = body.notes;
        Ok(request)
    }
}
