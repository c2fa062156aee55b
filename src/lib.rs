//! Dispatch - order distribution and disposition engine
//!
//! This library ingests storefront orders, spreads them across a pool of
//! verification callers, and drives each order through a fixed set of call
//! dispositions until it is confirmed, cancelled or otherwise closed.

pub mod allocation;
pub mod call_log;
pub mod cli;
pub mod config;
pub mod disposition;
pub mod engine;
pub mod logging;
pub mod order;
pub mod reader;
pub mod roster;
pub mod source;
pub mod store;
pub mod sweep;
pub mod telemetry;
