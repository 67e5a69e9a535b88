//! Adapters Layer - External System Integration
//!
//! Implementations of the ports: supplier HTTP APIs, the PostgREST
//! product index, the CRM client and document renderer, metrics, and
//! the inbound REST surface.

pub mod api;
pub mod crm;
pub mod metrics;
pub mod rest;
pub mod store;
