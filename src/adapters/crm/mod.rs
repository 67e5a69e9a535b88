//! CRM Adapters - Order Records and Confirmation Documents

pub mod client;
pub mod docs;

pub use client::CrmClient;
pub use docs::TextConfirmationRenderer;
