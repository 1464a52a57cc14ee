//! Inventory ledger daemon: serves grants over the Grant Channel.

pub mod server;

pub use server::{open_ledger, respond, serve};
