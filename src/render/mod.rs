mod arcs;
mod color;
mod encoder;
mod projection;
mod scene;

pub use arcs::{ARC_CURVATURE, ARC_LIMIT_PER_SIDE, ArcDescriptor, select_arcs};
pub use color::{RelationshipColorScale, SCORE_MAX, SCORE_MIN, clamp_score};
pub use encoder::{FeatureStyle, draw_order, encode};
pub use projection::{
    PathGenerator, ProjectedPath, ProjectionEngine, ProjectionFamily, ProjectionParams, Rotation,
};
pub use scene::{Scene, SceneArc, SceneFeature, compose};
