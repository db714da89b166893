//! Terminal-based generative art: fractal Lichtenberg lightning.
//!
//! The [`lightning`] module is the renderer-agnostic core. Everything else
//! drives it in a terminal.

pub mod colors;
pub mod config;
pub mod error;
pub mod help;
pub mod lightning;
pub mod projection;
pub mod raster;
pub mod settings;
pub mod snapshot;
pub mod storm;
pub mod terminal;
pub mod vec3;

pub use vec3::Vec3;
