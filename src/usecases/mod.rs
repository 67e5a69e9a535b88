//! Usecases Layer - Orchestration Logic
//!
//! Coordinates domain logic with ports: the supplier gateway front
//! door, the pricing round trip, the product search ladder, and the
//! order submission pipeline. Everything here is wired against
//! traits so tests can substitute mocks.

pub mod gateway;
pub mod pricing;
pub mod search;
pub mod submission;

use std::collections::HashMap;
use std::sync::Arc;

use crate::domain::SupplierKey;
use crate::ports::supplier::SupplierAdapter;

/// The wired adapter per supplier.
pub type AdapterMap = HashMap<SupplierKey, Arc<dyn SupplierAdapter>>;

pub use gateway::{DispatchRequest, GatewayResponse, SupplierGateway};
pub use pricing::{PricedOrder, PricingService};
pub use search::{FieldCache, RetryPolicy, SearchLadder, SearchRequest, SearchResponse};
pub use submission::{StageError, SubmissionPipeline, SubmissionReceipt};
