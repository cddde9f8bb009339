//! Playlist conversion.

use serde_json::Value;

use super::Converter;
use crate::conversion::document::for_each_object;

impl Converter {
    pub fn convert_playlist(&self, playlist: Value) -> Value {
        let Value::Object(mut doc) = playlist else {
            return playlist;
        };

        self.modules.migrate_flags(&mut doc);
        for_each_object(&mut doc, "sounds", |sound| {
            self.modules.rewrite_path_field(sound, "path");
            self.modules.migrate_flags(sound);
        });

        Value::Object(doc)
    }
}
