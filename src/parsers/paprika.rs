use super::{array_field, display_field, int_field, str_field, RecipeParser};
use crate::error::Result;
use crate::model::{
    sanitize_name, Amount, ImageRef, Ingredient, Metadata, Step, TRUNCATION_SENTINEL,
};
use crate::readers;
use log::debug;
use serde_json::Value;
use std::path::Path;

/// Parser for Paprika `.paprikarecipe` files (gzip-compressed JSON) and
/// `.paprikarecipes` archives (zip of `.paprikarecipe` members).
pub struct PaprikaParser;

/// Non-blank lines of a text block, trimmed, in their original order.
fn lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines().map(str::trim).filter(|line| !line.is_empty())
}

/// Digits with at most one decimal point, e.g. `2`, `1.5`, `.5`.
fn is_decimal(token: &str) -> bool {
    let mut digits = 0;
    let mut dots = 0;
    for c in token.chars() {
        match c {
            '0'..='9' => digits += 1,
            '.' => dots += 1,
            _ => return false,
        }
    }
    digits > 0 && dots <= 1
}

/// Split off the next whitespace-delimited token, returning it and the
/// remainder with leading whitespace removed.
fn next_token(text: &str) -> (&str, &str) {
    match text.find(char::is_whitespace) {
        Some(idx) => (&text[..idx], text[idx..].trim_start()),
        None => (text, ""),
    }
}

fn parse_ingredient_line(line: &str) -> Ingredient {
    let (first, rest) = next_token(line);
    if !is_decimal(first) || rest.is_empty() {
        return Ingredient::new(line, Amount::Empty, "");
    }

    let amount = Amount::Text(first.to_string());
    let (second, remainder) = next_token(rest);
    if remainder.is_empty() {
        Ingredient::new(second, amount, "")
    } else {
        Ingredient::new(remainder, amount, second)
    }
}

/// Upper-case in the sense of "has cased letters, none of them lower-case".
fn is_all_caps(line: &str) -> bool {
    line.chars().any(char::is_uppercase) && !line.chars().any(char::is_lowercase)
}

fn parse_direction_line(line: &str) -> Step {
    if is_all_caps(line) || line.ends_with(':') {
        Step::section(line.trim_end_matches(':'), "")
    } else {
        Step::plain(line)
    }
}

/// Paprika stores durations as free text. Whole minute counts become
/// `Ok(n)`, anything else is kept verbatim.
fn minutes(data: &Value, key: &str) -> std::result::Result<i64, String> {
    let raw = display_field(data, key);
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(0);
    }
    raw.parse::<i64>().map_err(|_| raw.to_string())
}

fn describe_minutes(value: &std::result::Result<i64, String>) -> String {
    match value {
        Ok(0) => String::new(),
        Ok(n) => format!("{n} minutes"),
        Err(text) => text.clone(),
    }
}

/// Categories arrive either as a JSON list or a comma-separated string.
fn categories(data: &Value) -> Vec<String> {
    let raw: Vec<String> = match data.get("categories") {
        Some(Value::String(s)) => s.split(',').map(str::to_string).collect(),
        Some(Value::Array(_)) => array_field(data, "categories")
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_string)
            .collect(),
        _ => Vec::new(),
    };

    raw.into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty())
        .collect()
}

impl RecipeParser for PaprikaParser {
    fn extensions(&self) -> &'static [&'static str] {
        &["paprikarecipe", "paprikarecipes"]
    }

    fn parse_file(&self, path: &Path) -> Result<Value> {
        if super::file_extension(path) == "paprikarecipes" {
            debug!("Reading first recipe of archive: {}", path.display());
            readers::read_archive_first(path)
        } else {
            debug!("Reading paprika recipe: {}", path.display());
            readers::read_gzip_json(path)
        }
    }

    fn ingredients(&self, data: &Value) -> Vec<Ingredient> {
        lines(&str_field(data, "ingredients"))
            .map(parse_ingredient_line)
            .collect()
    }

    fn instructions(&self, data: &Value) -> Vec<Step> {
        lines(&str_field(data, "directions"))
            .map(parse_direction_line)
            .collect()
    }

    fn images(&self, data: &Value) -> Vec<ImageRef> {
        let filename = format!("{}.jpg", sanitize_name(&self.recipe_name(data)));

        let photo_data = str_field(data, "photo_data");
        if photo_data.contains(TRUNCATION_SENTINEL) {
            debug!("Dropping truncated photo of {}", filename);
            return Vec::new();
        }
        if !photo_data.is_empty() {
            return vec![ImageRef::Base64 {
                data: photo_data,
                filename,
            }];
        }

        let photo_url = str_field(data, "photo");
        if !photo_url.is_empty() {
            return vec![ImageRef::Url {
                url: photo_url,
                filename,
            }];
        }

        Vec::new()
    }

    fn metadata(&self, data: &Value) -> Metadata {
        let prep = minutes(data, "prep_time");
        let cook = minutes(data, "cook_time");
        let total_time = match (&prep, &cook) {
            (Ok(p), Ok(c)) => describe_minutes(&Ok(p + c)),
            _ => str_field(data, "total_time"),
        };

        Metadata {
            source_url: str_field(data, "source_url"),
            source: str_field(data, "source"),
            cook_time: describe_minutes(&cook),
            prep_time: describe_minutes(&prep),
            total_time,
            servings: display_field(data, "servings"),
            notes: str_field(data, "notes"),
            nutrition_info: str_field(data, "nutritional_info"),
            rating: int_field(data, "rating"),
            difficulty: str_field(data, "difficulty"),
            tags: categories(data),
            created: str_field(data, "created"),
            uid: str_field(data, "uid"),
        }
    }
}
