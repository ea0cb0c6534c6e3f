//! Reference data served by the backend

pub mod catalog;

pub use catalog::{DailyData, Dish};
