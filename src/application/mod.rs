//! Application layer: the payment submission pipeline.
//!
//! `SubmissionRouter` is the entry point. It either relays the request to a
//! compliance service or runs address resolution, asset selection, memo policy
//! and transaction assembly in order, then signs and submits the result.

pub mod assembler;
pub mod asset_selector;
pub mod cancel;
pub mod classifier;
pub mod resolver;
pub mod router;
