//! rulecast Engine library.
//!
//! Migrates dnd5e adventure modules to swade in place.
//!
//! ## Structure
//!
//! - `conversion/` - Text pipeline and document helpers shared by converters
//! - `entities/` - One converter per document kind
//! - `use_cases/` - Module migration across packs
//! - `infrastructure/` - Pack stores, file loaders, config and id generation
//! - `app` - Application composition

pub mod app;
pub mod conversion;
pub mod entities;
pub mod infrastructure;
pub mod use_cases;

pub use app::App;
