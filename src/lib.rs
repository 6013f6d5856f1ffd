pub mod alerts;
pub mod apis;
pub mod backtest;
pub mod config;
pub mod defi;
pub mod diff;
pub mod discovery;
pub mod enrichment;
pub mod errors; // Structured error types per subsystem
pub mod facts;
pub mod gates;
pub mod logger;
pub mod paths;
pub mod pipeline;
pub mod ranking;
pub mod snapshot;
pub mod store;

#[cfg(test)]
pub(crate) mod test_support;
