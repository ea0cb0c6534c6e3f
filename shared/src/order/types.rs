//! Typed order request built by the POS screen

use super::payload::{ACTION_REGISTER_ORDER, OrderPayload};
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use thiserror::Error;

// ============================================================================
// Service Type
// ============================================================================

/// How the order is served
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServiceType {
    /// Eaten at a table in the restaurant
    #[default]
    DineIn,
    /// Picked up at the counter
    Takeout,
    /// Sent out to another venue
    Delivery {
        /// Destination venue ("para dónde")
        destination: String,
        /// Person receiving the order ("para quién")
        recipient: String,
    },
}

impl ServiceType {
    /// Value of the `tipo` field the backend expects
    pub fn wire_name(&self) -> &'static str {
        match self {
            ServiceType::DineIn => "Salón",
            ServiceType::Takeout => "Llevar",
            ServiceType::Delivery { .. } => "Domicilio",
        }
    }
}

// ============================================================================
// Order Lines
// ============================================================================

/// One dish and how many of it were ordered
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OrderLine {
    /// Dish name as listed in the catalog
    pub item: String,
    /// Quantity (zero-quantity lines are dropped)
    pub qty: u32,
    /// Unit price at the time of ordering
    pub price: Decimal,
}

impl OrderLine {
    pub fn new(item: impl Into<String>, qty: u32, price: Decimal) -> Self {
        Self {
            item: item.into(),
            qty,
            price,
        }
    }

    fn to_wire(&self) -> Value {
        json!({
            "item": self.item,
            "qty": self.qty,
            "precio": decimal_to_json(self.price),
        })
    }
}

/// Whole prices travel as integers, fractional ones as floats
fn decimal_to_json(value: Decimal) -> Value {
    if value.fract().is_zero()
        && let Some(int) = value.to_i64()
    {
        return Value::from(int);
    }
    value.to_f64().map(Value::from).unwrap_or(Value::Null)
}

// ============================================================================
// Order Request
// ============================================================================

/// Validation errors raised before an order reaches the queue
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum OrderValidationError {
    #[error("Order has no dishes with a quantity above zero")]
    EmptyOrder,

    #[error("Delivery orders need a destination")]
    MissingDestination,

    #[error("Delivery orders need a recipient")]
    MissingRecipient,
}

/// Order as composed on the POS screen
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct OrderRequest {
    pub service: ServiceType,
    pub lines: Vec<OrderLine>,
}

impl OrderRequest {
    pub fn new(service: ServiceType) -> Self {
        Self {
            service,
            lines: Vec::new(),
        }
    }

    /// Add a line (builder style)
    pub fn with_line(mut self, item: impl Into<String>, qty: u32, price: Decimal) -> Self {
        self.lines.push(OrderLine::new(item, qty, price));
        self
    }

    /// Sum of `qty * price` over all lines
    pub fn total(&self) -> Decimal {
        self.lines
            .iter()
            .map(|line| line.price * Decimal::from(line.qty))
            .sum()
    }

    /// Validate and convert into the backend submission body.
    ///
    /// Zero-quantity lines are dropped. Delivery destination and recipient
    /// are trimmed and must not be blank.
    pub fn into_payload(self) -> Result<OrderPayload, OrderValidationError> {
        let cart: Vec<Value> = self
            .lines
            .iter()
            .filter(|line| line.qty > 0)
            .map(OrderLine::to_wire)
            .collect();

        if cart.is_empty() {
            return Err(OrderValidationError::EmptyOrder);
        }

        let mut body = Map::new();
        body.insert("action".into(), Value::from(ACTION_REGISTER_ORDER));
        body.insert("tipo".into(), Value::from(self.service.wire_name()));
        body.insert("carrito".into(), Value::Array(cart));

        if let ServiceType::Delivery {
            destination,
            recipient,
        } = &self.service
        {
            let destination = destination.trim();
            let recipient = recipient.trim();
            if destination.is_empty() {
                return Err(OrderValidationError::MissingDestination);
            }
            if recipient.is_empty() {
                return Err(OrderValidationError::MissingRecipient);
            }
            body.insert("domicilio_para".into(), Value::from(destination));
            body.insert("domicilio_quien".into(), Value::from(recipient));
        }

        Ok(OrderPayload::from_map(body))
    }
}
