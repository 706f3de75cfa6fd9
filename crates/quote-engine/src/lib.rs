/*
[INPUT]:  Public API exports for quote-engine crate
[OUTPUT]: Module declarations and public re-exports
[POS]:    Crate root - library entry point
[UPDATE]: When adding new modules or public exports
*/

pub mod config;
pub mod engine;
pub mod interfaces;
pub mod live;
pub mod price_book;
pub mod quote_math;
pub mod risk;
pub mod snapshot_ring;
pub mod state;

pub use config::Config;
pub use engine::QuotingEngine;
pub use live::{LiveEventStream, LiveOracleFeed};
