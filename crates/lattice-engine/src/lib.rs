//! Lattice engine crate.
//!
//! Draws a grid of independently rotating, textured, lit cubes with a single
//! instanced draw per frame. Owns the GPU context, the window runtime and the
//! renderer; the binary crate only wires configuration and an [`core::App`].

pub mod config;
pub mod core;
pub mod device;
pub mod error;
pub mod logging;
pub mod render;
pub mod time;
pub mod window;

pub use config::{ConfigError, RendererConfig};
pub use error::{RenderError, Result};
