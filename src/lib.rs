//! Ctrl Bordados - order tracking core
//!
//! Backend library for the embroidery shop's order dashboard: the order
//! record model over the hosted `Ventas` collection, the unified status
//! engine that replaces the old per-stage booleans, list-view querying
//! (search, filter, sort), row selection with bulk clipboard export, and
//! the sales aggregations behind the dashboard charts. [`OrderBoard`] ties
//! it together over a pluggable [`DocumentStore`] and email/password auth.

pub mod analytics;
pub mod auth;
pub mod board;
pub mod clipboard;
pub mod config;
pub mod error;
pub mod logging;
pub mod orders;
pub mod query;
pub mod selection;
pub mod status;
pub mod store;

pub use auth::{AuthClient, AuthState, Session};
pub use board::{OrderBoard, ORDERS_COLLECTION};
pub use config::Config;
pub use error::{Error, Result};
pub use orders::{Order, OrderDraft};
pub use status::{Status, StatusStyle};
pub use store::{DocumentStore, MemoryStore, RawDocument, RemoteStore};
