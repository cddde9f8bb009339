//! Journal entry conversion.

use serde_json::Value;

use super::Converter;
use crate::conversion::document::for_each_object;

impl Converter {
    /// Rewrite page text and media paths.
    pub fn convert_journal(&self, journal: Value) -> Value {
        let Value::Object(mut doc) = journal else {
            return journal;
        };

        self.modules.migrate_flags(&mut doc);

        for_each_object(&mut doc, "pages", |page| {
            if let Some(Value::Object(text)) = page.get_mut("text") {
                if let Some(Value::String(content)) = text.get_mut("content") {
                    if !content.is_empty() {
                        *content = self.text.apply(&self.modules.rewrite_path(content));
                    }
                }
            }
            // image and video pages
            self.modules.rewrite_path_field(page, "src");
            self.modules.migrate_flags(page);
        });

        Value::Object(doc)
    }
}
