//! `bhulekh-recon` — Cadastral discrepancy detection and resolution
//! workflow engine.
//!
//! Pure engine crate: receives pre-loaded parcels and land records,
//! detects inconsistencies between the spatial and textual datasets, and
//! drives the role-gated review workflow over them. No CLI dependencies.

pub mod area;
pub mod audit;
pub mod config;
pub mod engine;
pub mod error;
pub mod ingest;
pub mod model;
pub mod name;
pub mod severity;
pub mod store;
pub mod workflow;

pub use config::{DetectionConfig, ScoreWeights};
pub use engine::{run_detection, DetectionStats};
pub use error::ReconError;
pub use model::{Actor, Discrepancy, DiscrepancyStatus, DiscrepancyType, Role, Severity};
pub use store::MemoryStore;
pub use workflow::WorkflowEngine;
