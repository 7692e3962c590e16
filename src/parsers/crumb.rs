use super::{
    array_field, display_field, format_minutes, int_field, number_field, str_field,
    RecipeParser,
};
use crate::error::Result;
use crate::model::{
    sanitize_name, Amount, ImageRef, Ingredient, Metadata, Step, TRUNCATION_SENTINEL,
};
use crate::readers;
use log::debug;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::path::Path;

/// Leading `**Section**` marker at the very start of a step.
static SECTION_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\*\*(.*?)\*\*\s*").expect("valid section pattern"));

/// Parser for Crouton `.crumb` files (plain JSON).
pub struct CrumbParser;

fn order_of(item: &Value) -> f64 {
    number_field(item, "order")
}

/// Entries of `key` stably sorted by their `order` field.
fn sorted_by_order<'a>(data: &'a Value, key: &str) -> Vec<&'a Value> {
    let mut items: Vec<&Value> = array_field(data, key).iter().collect();
    items.sort_by(|a, b| order_of(a).total_cmp(&order_of(b)));
    items
}

/// Split a leading bold span off a step, returning the section name and the
/// remaining text.
fn split_section(text: &str) -> (Option<String>, String) {
    match SECTION_PATTERN.captures(text) {
        Some(caps) => {
            let name = caps[1].to_string();
            let rest = text[caps[0].len()..].to_string();
            (Some(name), rest)
        }
        None => (None, text.to_string()),
    }
}

impl RecipeParser for CrumbParser {
    fn extensions(&self) -> &'static [&'static str] {
        &["crumb"]
    }

    fn parse_file(&self, path: &Path) -> Result<Value> {
        debug!("Reading crumb file: {}", path.display());
        readers::read_json(path)
    }

    fn ingredients(&self, data: &Value) -> Vec<Ingredient> {
        sorted_by_order(data, "ingredients")
            .into_iter()
            .map(|item| {
                let quantity = &item["quantity"];
                Ingredient::new(
                    str_field(&item["ingredient"], "name"),
                    Amount::from_json(quantity.get("amount")),
                    str_field(quantity, "quantityType"),
                )
            })
            .collect()
    }

    fn instructions(&self, data: &Value) -> Vec<Step> {
        sorted_by_order(data, "steps")
            .into_iter()
            .map(|step| {
                let (section_name, text) = split_section(&str_field(step, "step"));
                let flagged = step
                    .get("isSection")
                    .and_then(Value::as_bool)
                    .unwrap_or(false);
                Step {
                    text,
                    is_section: flagged || section_name.is_some(),
                    section_name,
                }
            })
            .collect()
    }

    fn images(&self, data: &Value) -> Vec<ImageRef> {
        let safe_name = sanitize_name(&self.recipe_name(data));

        array_field(data, "images")
            .iter()
            .enumerate()
            .filter_map(|(i, image)| {
                let payload = image.as_str().filter(|s| !s.is_empty())?;
                if payload.contains(TRUNCATION_SENTINEL) {
                    debug!("Dropping truncated image {} of {}", i, safe_name);
                    return None;
                }
                Some(ImageRef::Base64 {
                    data: payload.to_string(),
                    filename: format!("{safe_name}_{i}.jpg"),
                })
            })
            .collect()
    }

    fn metadata(&self, data: &Value) -> Metadata {
        let cook = number_field(data, "cookingDuration");
        let prep = number_field(data, "prepDuration");

        Metadata {
            source_url: str_field(data, "webLink"),
            cook_time: format!("{} minutes", format_minutes(cook)),
            prep_time: format!("{} minutes", format_minutes(prep)),
            total_time: format!("{} minutes", format_minutes(prep + cook)),
            servings: display_field(data, "serves"),
            notes: str_field(data, "notes"),
            // Crouton's own spelling
            nutrition_info: str_field(data, "neutritionalInfo"),
            rating: int_field(data, "rating"),
            ..Metadata::default()
        }
    }
}
