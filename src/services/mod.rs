//! Service layer for upload enrichment.
//!
//! This module contains domain logic separated from UI concerns.
//! Services are used by both the CLI and the web server.

pub mod enrichment;

pub use enrichment::{
    EnrichError, Enrichment, EnrichmentService, SegmentFailure, SegmentFailures, SegmentStage,
};
