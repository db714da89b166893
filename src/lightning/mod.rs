//! Procedural fractal lightning
//!
//! `generator` builds the branch structure once per strike, `animator`
//! reveals and burns it away tick by tick, and `field` manages the bolts
//! that are alive at the same time.

pub mod animator;
pub mod easing;
pub mod field;
pub mod generator;

pub use animator::{AnimationPhase, AnimationState, AnimatorParams, BoltAnimator, BranchFrame};
pub use field::{BoltField, BoltId, FieldConfig, LiveBolt};
pub use generator::{
    BoltMode, BoltStructure, Branch, BranchSegment, FractalBoltGenerator, GeneratorParams,
    DEFAULT_MAX_DEPTH,
};
