//! Config Module
//!
//! Centralized configuration for placement, stacking, strokes and loading.

pub mod placement_config;

pub use placement_config::PlacementConfig;
