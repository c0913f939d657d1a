//! Delivery of finalized recordings to the exam object store.
//!
//! The boundary trait models exactly one upload attempt per artifact;
//! retries, resumption, and chunked transfer are deliberately absent.
//! The HTTP client speaks the store's multipart contract, and the
//! naming module pins down how recordings are filed.

pub mod boundary;
pub mod client;
pub mod naming;
pub mod sim;

pub use boundary::{DeliveryBoundary, DeliveryReceipt, DeliveryRequest, EndReason};
pub use client::HttpDeliveryClient;
pub use sim::SimDeliveryStore;
