//! Parcel Relay library.
//!
//! This crate provides the relay functionality as a library, allowing
//! it to be tested and reused.
//!
//! # Architecture
//!
//! - Axum webhook endpoint ingesting platform `orders/create` payloads
//! - `PostgreSQL` store holding one row per in-flight order
//! - Scheduled reconciliation loop polling the platform and the
//!   carrier's tracking pages, driving per-order status transitions
//! - Slack operations alerts and templated customer messages

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod classifier;
pub mod config;
pub mod db;
pub mod error;
pub mod messaging;
pub mod models;
pub mod notify;
pub mod reconcile;
pub mod routes;
pub mod shopify;
pub mod slack;
pub mod state;
