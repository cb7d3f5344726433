//! Strokes
//!
//! Connector pieces (paths, fences) that pick their geometry from their
//! neighbours. [`direction`] and [`archetype`] hold the pure classification
//! math, [`graph`] keeps the symmetric connection relation between placed
//! connectors, and [`path`] plans a dragged stroke point by point.

pub mod archetype;
pub mod direction;
pub mod graph;
pub mod path;

pub use archetype::{StrokeCategory, StrokeType, archetype_key, classify, match_angle};
pub use direction::{ConnectionDirection, to_world};
pub use graph::{ConnectionDiff, check_for_connection, connected_neighbours};
pub use path::{PathSample, PointMarker, StrokeContext, StrokePlan, StrokePoint, plan_stroke, sample_path, stroke_direction};
