//! Core library for fireplan
//!
//! This crate implements the **Functional Core** of the fireplan client,
//! following the Functional Core - Imperative Shell architectural pattern.
//!
//! # Architecture Overview
//!
//! fireplan talks to a PDF fire-alarm analysis service (a local object
//! detector plus a Gemini-backed document analyzer). The work is split in two:
//!
//! - **`fireplan_core`** (this crate): wire types, result aggregation, display
//!   structures and the UI state machine. Zero I/O.
//! - **`fireplan`**: HTTP calls, the command line, terminal rendering and
//!   writing artifacts to disk (the Imperative Shell).
//!
//! ## Functional Core Principles
//!
//! - **Pure functions**: Same input always produces the same output
//! - **No side effects**: No I/O operations, no external state mutations
//! - **Total over server data**: Malformed responses degrade to empty results
//!   instead of failing
//! - **Testable**: Everything is exercised with fixture JSON, no mocking
//!
//! # Module Organization
//!
//! - [`api`]: Response shapes of the analysis service
//! - [`devices`]: Device Aggregator, grouping detections by device type
//! - [`table`]: Table display structure built from aggregated groups
//! - [`upload`]: PDF selection validation
//! - [`selection`]: Page selection set for the preview grid
//! - [`analysis`]: Analysis options, request fields and the per-analysis state
//! - [`detection`]: View model for local detection results
//! - [`gemini`]: View model for Gemini analysis results
//! - [`status`]: Service availability indicators
//! - [`artifacts`]: Binary response classification and thumbnail data URIs
//! - [`endpoints`]: API paths
//! - [`state`]: The UI state struct tying the pieces together
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use fireplan_core::devices::aggregate_page_analyses;
//! use serde_json::json;
//!
//! let groups = aggregate_page_analyses(&json!([
//!     {"page_number": 1, "devices": [{"device_type": "Smoke Detector", "confidence": 0.9}]}
//! ]));
//!
//! assert_eq!(groups[0].device_type, "Smoke Detector");
//! assert_eq!(groups[0].count, 1);
//! ```

pub mod analysis;
pub mod api;
pub mod artifacts;
pub mod detection;
pub mod devices;
pub mod endpoints;
pub mod gemini;
pub mod selection;
pub mod state;
pub mod status;
pub mod table;
pub mod upload;
