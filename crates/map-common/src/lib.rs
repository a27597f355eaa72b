//! Common types shared by the mortality map crates and service.

pub mod bbox;
pub mod error;

pub use bbox::{BoundingBox, Viewport};
pub use error::{MapError, MapResult};
