use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Catalog entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Dish {
    #[serde(rename = "nombre")]
    pub name: String,
    /// Missing, null or blank prices read as zero
    #[serde(rename = "precio", default, deserialize_with = "price_or_zero")]
    pub price: Decimal,
}

fn price_or_zero<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Decimal, D::Error> {
    match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => Ok(Decimal::ZERO),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(Decimal::ZERO),
        Some(other) => serde_json::from_value(other).map_err(serde::de::Error::custom),
    }
}

/// Data the POS needs to open for the day (`obtener_datos`)
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct DailyData {
    /// Full dish catalog
    #[serde(rename = "catalogo", default)]
    pub catalog: Vec<Dish>,
    /// Names of the dishes offered today
    #[serde(rename = "menuDia", default)]
    pub daily_menu: Vec<String>,
    /// Known delivery destinations
    #[serde(rename = "clientes", default)]
    pub destinations: Vec<String>,
}

impl DailyData {
    /// Catalog entries that are on today's menu, in catalog order
    pub fn todays_dishes(&self) -> impl Iterator<Item = &Dish> {
        self.catalog
            .iter()
            .filter(|dish| self.daily_menu.iter().any(|name| name == &dish.name))
    }

    /// Price of a catalog dish by name
    pub fn price_of(&self, name: &str) -> Option<Decimal> {
        self.catalog
            .iter()
            .find(|dish| dish.name == name)
            .map(|dish| dish.price)
    }
}
