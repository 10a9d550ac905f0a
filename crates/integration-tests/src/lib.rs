//! Integration tests for Parcel Relay.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p parcel-relay-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `order_classification` - Webhook payload classification
//! - `reconcile_lifecycle` - Multi-cycle reconciliation sequences over
//!   in-memory seam implementations
//!
//! The tests exercise behavior at module boundaries without live
//! services: the store, platform, and dispatcher seams are replaced
//! with scripted in-memory implementations that record every effect.
