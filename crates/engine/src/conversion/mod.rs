//! Building blocks shared by the entity converters.
//!
//! - `text` - prose rewriting pipeline
//! - `document` - JSON field helpers (paths, flags, distances)

pub(crate) mod document;
mod error;
pub mod text;

pub use document::ModuleIds;
pub use error::ConversionError;
pub use text::{TextPipeline, TextRule};
