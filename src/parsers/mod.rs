use crate::error::Result;
use crate::model::{ImageRef, Ingredient, Metadata, Recipe, Step, UNNAMED_RECIPE};
use serde_json::Value;
use std::fmt;
use std::path::Path;

mod crumb;
mod paprika;
mod registry;

pub use crumb::CrumbParser;
pub use paprika::PaprikaParser;
pub use registry::{file_extension, ParserRegistry};

/// Capabilities every source format provides. Raw data stays a loosely
/// typed JSON value until one of the accessors normalizes a piece of it.
pub trait RecipeParser: Send + Sync {
    /// Extensions (without the dot) handled by this parser
    fn extensions(&self) -> &'static [&'static str];

    /// Decode the file into its format-native JSON value
    fn parse_file(&self, path: &Path) -> Result<Value>;

    fn recipe_name(&self, data: &Value) -> String {
        match data.get("name").and_then(Value::as_str) {
            Some(name) if !name.trim().is_empty() => name.to_string(),
            _ => UNNAMED_RECIPE.to_string(),
        }
    }

    fn ingredients(&self, data: &Value) -> Vec<Ingredient>;

    fn instructions(&self, data: &Value) -> Vec<Step>;

    fn images(&self, data: &Value) -> Vec<ImageRef>;

    fn metadata(&self, data: &Value) -> Metadata;

    /// Build the canonical recipe from already decoded data
    fn normalize(&self, data: &Value) -> Recipe {
        Recipe {
            name: self.recipe_name(data),
            ingredients: self.ingredients(data),
            instructions: self.instructions(data),
            images: self.images(data),
            metadata: self.metadata(data),
        }
    }

    fn parse_recipe(&self, path: &Path) -> Result<Recipe> {
        let data = self.parse_file(path)?;
        Ok(self.normalize(&data))
    }
}

/// The closed set of supported source formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecipeFormat {
    Crumb,
    Paprika,
}

impl RecipeFormat {
    pub const ALL: [RecipeFormat; 2] = [RecipeFormat::Crumb, RecipeFormat::Paprika];

    pub fn parser(&self) -> &'static dyn RecipeParser {
        match self {
            RecipeFormat::Crumb => &CrumbParser,
            RecipeFormat::Paprika => &PaprikaParser,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RecipeFormat::Crumb => "crumb",
            RecipeFormat::Paprika => "paprika",
        }
    }
}

impl fmt::Display for RecipeFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Field accessors over loosely typed source data. None of them fail: absent
// or mistyped keys fall back to the documented default.

/// String value, or `""`.
pub(crate) fn str_field(data: &Value, key: &str) -> String {
    data.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Strings as-is, numbers and booleans as their JSON text, anything else `""`.
pub(crate) fn display_field(data: &Value, key: &str) -> String {
    match data.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(Value::Bool(b)) => b.to_string(),
        _ => String::new(),
    }
}

/// Numeric value (numbers or numeric strings), or `0.0`.
pub(crate) fn number_field(data: &Value, key: &str) -> f64 {
    match data.get(key) {
        Some(Value::Number(n)) => n.as_f64().unwrap_or_default(),
        Some(Value::String(s)) => s.trim().parse().unwrap_or_default(),
        _ => 0.0,
    }
}

/// Integer value, or `0`. Fractions are truncated.
pub(crate) fn int_field(data: &Value, key: &str) -> i64 {
    match data.get(key) {
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|v| v as i64))
            .unwrap_or_default(),
        Some(Value::String(s)) => s.trim().parse().unwrap_or_default(),
        _ => 0,
    }
}

/// Array elements, or an empty slice.
pub(crate) fn array_field<'a>(data: &'a Value, key: &str) -> &'a [Value] {
    data.get(key)
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default()
}

/// `45.0` renders as `45`, `7.5` stays `7.5`.
pub(crate) fn format_minutes(minutes: f64) -> String {
    if minutes.fract() == 0.0 {
        format!("{}", minutes as i64)
    } else {
        format!("{minutes}")
    }
}
