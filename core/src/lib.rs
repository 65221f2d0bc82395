//! bankrisk-core: banking risk-assessment ETL pipeline.
//!
//! Data flows strictly forward:
//!   raw CSV → extract → transform (field deriver) → scoring → kpi → store
//!
//! One invocation processes one batch as one numbered, immutable run. The
//! store's read side (records, KPI snapshots, latest-successful views) is
//! queryable independently of any run in progress.

pub mod error;
pub mod export;
pub mod extract;
pub mod kpi;
pub mod pipeline;
pub mod record;
pub mod scoring;
pub mod store;
pub mod transform;
pub mod types;
