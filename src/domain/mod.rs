//! Domain layer - Core business logic and models.
//!
//! Pure logic for the supplier bridge: line items, orders, the
//! pricing-reconciliation engine, search cursors, and the typed error
//! taxonomy. No I/O here (hexagonal architecture inner ring); all
//! types are serializable and testable in isolation.

pub mod cursor;
pub mod error;
pub mod line_item;
pub mod order;
pub mod pricing;
pub mod supplier;

// Re-export core types for convenience
pub use cursor::{SearchCursor, SearchStep};
pub use error::SupplierError;
pub use line_item::{normalize_sku, sanitize_lines, LineItem, PricingState, RequestLine, Uom};
pub use order::{Address, Delivery, Order, OrderStatus};
pub use pricing::{fail_all, reconcile, PricedRecord};
pub use supplier::{Action, Environment, SupplierKey};
