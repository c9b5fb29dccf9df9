//! Domain layer: ledger value objects, payment intents and the ports through
//! which the application reaches external collaborators.

pub mod account;
pub mod asset;
pub mod memo;
pub mod payment;
pub mod ports;
pub mod transaction;
