//! Choropleth rendering for the mortality map.
//!
//! - Continuous color scales (built-in and from style files)
//! - State fills and boundary strokes on a tiny-skia pixmap
//! - Title and colorbar text
//! - PNG encoding (indexed when the palette fits, RGBA otherwise)

pub mod choropleth;
pub mod layout;
pub mod legend;
pub mod png;
pub mod style;
pub mod text;

pub use choropleth::{ChoroplethRenderer, RenderOptions, RenderedMap, DEFAULT_TITLE};
pub use layout::{Layout, PixelRect};
pub use style::{Color, ColorScale, Normalize, StyleConfig, BUILTIN_SCALES};
pub use text::{TextRenderer, TextStyle};
