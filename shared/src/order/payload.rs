//! Opaque submission payload
//!
//! The offline queue stores and forwards this value without looking inside
//! it; only the typed [`OrderRequest`](super::OrderRequest) boundary and the
//! transport know its fields.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Register a new order
pub const ACTION_REGISTER_ORDER: &str = "registrar_pedido";
/// Fetch catalog, today's menu and known delivery destinations
pub const ACTION_FETCH_DAILY_DATA: &str = "obtener_datos";
/// Replace today's menu selection
pub const ACTION_SAVE_DAILY_MENU: &str = "guardar_menu_dia";

/// Backend-bound request body (a JSON object with an `action` discriminator)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(transparent)]
pub struct OrderPayload(Map<String, Value>);

impl OrderPayload {
    /// Empty body carrying only the action discriminator
    pub fn action(action: &str) -> Self {
        let mut body = Map::new();
        body.insert("action".into(), Value::from(action));
        Self(body)
    }

    pub fn from_map(body: Map<String, Value>) -> Self {
        Self(body)
    }

    /// Add a field (builder style)
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    /// Action discriminator, if present
    pub fn action_name(&self) -> Option<&str> {
        self.0.get("action").and_then(Value::as_str)
    }

    pub fn as_map(&self) -> &Map<String, Value> {
        &self.0
    }

    /// Request body with the device credential merged in.
    ///
    /// The stored payload itself is never modified, so the token does not end
    /// up in durable storage.
    pub fn with_token(&self, token: &str) -> Value {
        let mut body = self.0.clone();
        body.insert("token".into(), Value::from(token));
        Value::Object(body)
    }
}
