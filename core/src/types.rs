//! Shared primitive types used across the pipeline.

/// A pipeline run identifier. Allocated by the store, strictly increasing.
pub type RunId = i64;

/// A stable customer identifier from the source system.
pub type ClientId = String;
