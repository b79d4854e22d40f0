//! Vitals Resolver - health-metric summaries from unreliable local sources
//!
//! Resolves a steps / heart-rate / sleep / calories / workouts summary for a
//! timeframe by walking a strict fallback chain: live-sync snapshot → bulk
//! health export → synthetic data. The chain always yields a summary.
//!
//! ## Modules
//!
//! - **Adapters**: Live-sync snapshot and bulk export readers
//! - **Extractor**: Aggregation of export records into metrics
//! - **Pipeline**: The fallback-chain resolver

pub mod adapters;
pub mod config;
pub mod encoder;
pub mod error;
pub mod extractor;
pub mod mock;
pub mod pipeline;
pub mod synthetic;
pub mod types;
pub mod window;

pub use config::ResolverConfig;
pub use encoder::SummaryEncoder;
pub use error::{ResolveError, SourceError};
pub use pipeline::{resolve_summary, SourceResolver};
pub use types::{DataSource, HealthSummary, HeartRate, ResolvedSummary, Timeframe};
pub use window::{Clock, FixedClock, SystemClock, TimeWindow};

/// Crate version
pub const RESOLVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for diagnostics
pub const PRODUCER_NAME: &str = "vitals-resolver";
