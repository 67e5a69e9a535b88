//! Ports Layer - Hexagonal Architecture Boundaries
//!
//! Defines the interfaces (traits) that the usecases layer requires
//! from the outside world. Adapters implement these traits.
//!
//! Port categories:
//! - `SupplierAdapter`: authenticate / price / order / live-search per supplier
//! - `ProductStore`: cached product index queries for the search ladder
//! - `CrmStore` + `DocumentRenderer`: draft persistence and confirmation documents

pub mod crm;
pub mod product_store;
pub mod supplier;

pub use crm::{CrmStore, DocumentRenderer, OrderProperties};
pub use product_store::{ProductStore, StoreError};
pub use supplier::{AuthSession, OrderOutcome, PricingOutcome, SupplierAdapter};
