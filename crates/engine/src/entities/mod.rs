//! Entity converters - one per document kind.
//!
//! All converters are methods on [`Converter`], which owns everything a
//! conversion reads: the rule tables, the compiled text pipeline, the module
//! ids, macro overrides and the id generator. Each conversion takes a
//! document by value and returns the converted document.

mod actor;
mod adventure;
mod common;
mod item;
mod journal;
mod macros;
mod playlist;
mod scene;
mod table;
mod token;

use std::sync::Arc;

use regex_lite::Regex;
use rulecast_domain::RuleTables;

use crate::conversion::{ConversionError, ModuleIds, TextPipeline};
use crate::infrastructure::ports::IdGenerator;

pub use macros::MacroOverrides;

/// Converts dnd5e documents into swade documents.
pub struct Converter {
    rules: Arc<RuleTables>,
    text: TextPipeline,
    modules: ModuleIds,
    macros: MacroOverrides,
    module_calls: Regex,
    ids: Arc<dyn IdGenerator>,
}

impl Converter {
    /// Validate the rule tables and compile the text rules.
    pub fn new(
        rules: Arc<RuleTables>,
        modules: ModuleIds,
        macros: MacroOverrides,
        ids: Arc<dyn IdGenerator>,
    ) -> Result<Self, ConversionError> {
        rules.validate()?;
        let text = TextPipeline::new(&rules)?;
        let module_calls = macros::module_call_pattern(&modules.source)?;
        Ok(Self {
            rules,
            text,
            modules,
            macros,
            module_calls,
            ids,
        })
    }

    pub fn rules(&self) -> &RuleTables {
        &self.rules
    }
}
