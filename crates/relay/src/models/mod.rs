//! Domain models for the relay.

pub mod order;

pub use order::{NewOrder, Order, ShippingMethod};
