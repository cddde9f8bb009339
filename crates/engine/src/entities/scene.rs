//! Scene conversion.

use serde_json::{json, Value};

use super::Converter;
use crate::conversion::document::{
    for_each_object, map_values, scale_distance, scale_nested_distance,
};

/// Target grid convention: gridless, one inch per unit.
const GRIDLESS: i64 = 0;
const GRID_DISTANCE: i64 = 1;
const GRID_UNITS: &str = "\"";

impl Converter {
    /// Convert a scene and everything placed on it.
    pub fn convert_scene(&self, scene: Value) -> Value {
        let Value::Object(mut doc) = scene else {
            return scene;
        };

        self.modules.rewrite_nested_path(&mut doc, "background", "src");
        self.modules.rewrite_path_field(&mut doc, "foreground");
        self.modules.rewrite_path_field(&mut doc, "thumb");
        self.modules.migrate_flags(&mut doc);

        let grid = doc.entry("grid").or_insert_with(|| json!({}));
        if let Value::Object(grid) = grid {
            grid.insert("type".to_string(), json!(GRIDLESS));
            grid.insert("distance".to_string(), json!(GRID_DISTANCE));
            grid.insert("units".to_string(), json!(GRID_UNITS));
        }

        for_each_object(&mut doc, "lights", |light| {
            scale_nested_distance(light, "config", "bright");
            scale_nested_distance(light, "config", "dim");
            self.modules.migrate_flags(light);
        });

        for_each_object(&mut doc, "sounds", |sound| {
            scale_distance(sound, "radius");
            self.modules.rewrite_path_field(sound, "path");
            self.modules.migrate_flags(sound);
        });

        for placeable in ["tiles", "notes", "drawings", "templates"] {
            for_each_object(&mut doc, placeable, |placed| {
                self.modules.rewrite_nested_path(placed, "texture", "src");
                self.modules.migrate_flags(placed);
            });
        }

        for_each_object(&mut doc, "walls", |wall| self.modules.migrate_flags(wall));

        map_values(&mut doc, "tokens", |token| self.convert_token(token));

        Value::Object(doc)
    }
}
