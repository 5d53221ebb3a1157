//! Point cloud rendering through Mitsuba
//!
//! Ties the workspace together: command line configuration, the geometric
//! pipeline from `pcrender-core`, scene generation from `pcrender-scene` and
//! the external renderer invocation.

pub mod config;
pub mod pipeline;
pub mod renderer;

pub use config::*;
pub use pipeline::*;
pub use renderer::*;
