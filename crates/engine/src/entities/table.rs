//! Roll table conversion.

use serde_json::Value;

use super::Converter;
use crate::conversion::document::for_each_object;

impl Converter {
    pub fn convert_table(&self, table: Value) -> Value {
        let Value::Object(mut doc) = table else {
            return table;
        };

        self.modules.rewrite_path_field(&mut doc, "img");
        self.modules.migrate_flags(&mut doc);

        for_each_object(&mut doc, "results", |result| {
            self.modules.rewrite_path_field(result, "img");
            if let Some(Value::String(text)) = result.get_mut("text") {
                *text = self.text.apply(&self.modules.rewrite_path(text));
            }
            self.modules.migrate_flags(result);
        });

        Value::Object(doc)
    }
}
