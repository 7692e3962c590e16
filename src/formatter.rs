//! Rendering of canonical recipes into Obsidian markdown.

use crate::error::Result;
use crate::model::{sanitize_name, ImageRef, Ingredient, Recipe, Step};
use base64::Engine;
use log::{debug, info, warn};
use std::fs;
use std::path::{Path, PathBuf};

/// Subdirectory of the output directory that receives decoded images.
pub const IMAGES_DIR: &str = "images";

/// Tag attached to every converted recipe.
pub const RECIPE_TAG: &str = "food/recipe";

/// Units that never take a plural suffix.
const INVARIANT_UNITS: &[&str] = &["pound"];

enum FrontmatterValue {
    Scalar(String),
    List(Vec<String>),
}

/// Lower-case `unit` and pluralize it for amounts above one.
fn render_unit(unit: &str, plural: bool) -> String {
    let unit = unit.to_lowercase();
    if plural && !INVARIANT_UNITS.contains(&unit.as_str()) && !unit.ends_with('s') {
        format!("{unit}s")
    } else {
        unit
    }
}

/// Render each ingredient as `<amount> <unit> <name>`, or just the name when
/// amount or unit is missing.
pub fn format_ingredients(ingredients: &[Ingredient]) -> Vec<String> {
    ingredients
        .iter()
        .map(|item| {
            if item.amount.is_present() && !item.unit.is_empty() {
                let unit = render_unit(&item.unit, item.amount.is_plural());
                format!("{} {} {}", item.amount, unit, item.name)
            } else {
                item.name.clone()
            }
        })
        .collect()
}

/// Render steps as markdown. Every step uses the literal `1.` marker; markdown
/// renderers number the list themselves.
pub fn format_instructions(steps: &[Step]) -> String {
    let mut lines = Vec::new();

    for step in steps {
        if let Some(name) = step.section_name.as_deref().filter(|n| !n.is_empty()) {
            lines.push(format!("### {name}"));
        }
        if !step.text.trim().is_empty() {
            lines.push(format!("1. {}", step.text));
        }
    }

    lines.join("\n")
}

/// Decode a base64 image into `<output_dir>/images/` and return its path
/// relative to `output_dir`.
///
/// Returns `None` for URL images, truncated payloads and anything that fails
/// to decode or write. Failures never abort the conversion.
pub fn save_image(image: &ImageRef, output_dir: &Path) -> Option<String> {
    let (data, filename) = match image {
        ImageRef::Base64 { data, filename } => (data, filename),
        ImageRef::Url { url, .. } => {
            debug!("Not downloading image from {}", url);
            return None;
        }
    };

    if image.is_truncated() {
        debug!("Skipping truncated image {}", filename);
        return None;
    }

    let compact: String = data.split_whitespace().collect();
    let bytes = match base64::engine::general_purpose::STANDARD.decode(compact) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Could not decode image {}: {}", filename, e);
            return None;
        }
    };

    let images_dir = output_dir.join(IMAGES_DIR);
    let written = fs::create_dir_all(&images_dir)
        .and_then(|_| fs::write(images_dir.join(filename), &bytes));
    if let Err(e) = written {
        warn!("Could not save image {}: {}", filename, e);
        return None;
    }

    Some(format!("{IMAGES_DIR}/{filename}"))
}

/// Path of the markdown file a recipe is written to.
pub fn output_path(recipe: &Recipe, output_dir: &Path) -> PathBuf {
    output_dir.join(format!("{}.md", sanitize_name(&recipe.name)))
}

/// Assemble the full markdown document: frontmatter, then body.
pub fn render_markdown(recipe: &Recipe, photos: &[String], date: &str) -> String {
    let metadata = &recipe.metadata;
    let frontmatter = [
        ("food-labels", FrontmatterValue::Scalar(String::new())),
        ("created", FrontmatterValue::Scalar(date.to_string())),
        ("updated", FrontmatterValue::Scalar(date.to_string())),
        ("tags", FrontmatterValue::List(vec![RECIPE_TAG.to_string()])),
        ("photos", FrontmatterValue::List(photos.to_vec())),
        ("source", FrontmatterValue::Scalar(metadata.source.clone())),
        (
            "source-url",
            FrontmatterValue::Scalar(metadata.source_url.clone()),
        ),
        (
            "cook-time",
            FrontmatterValue::Scalar(metadata.cook_time.clone()),
        ),
        (
            "difficulty",
            FrontmatterValue::Scalar(metadata.difficulty.clone()),
        ),
        ("servings", FrontmatterValue::Scalar(metadata.servings.clone())),
        (
            "ingredients",
            FrontmatterValue::List(format_ingredients(&recipe.ingredients)),
        ),
    ];

    let mut lines = vec!["---".to_string()];
    for (key, value) in frontmatter {
        match value {
            FrontmatterValue::Scalar(value) if value.is_empty() => lines.push(format!("{key}:")),
            FrontmatterValue::Scalar(value) => lines.push(format!("{key}: {value}")),
            FrontmatterValue::List(items) => {
                lines.push(format!("{key}:"));
                lines.extend(items.iter().map(|item| format!("  - {item}")));
            }
        }
    }
    lines.push("---".to_string());

    lines.push(format!("\n# {}", recipe.name));
    lines.push("\n## Directions".to_string());
    lines.push(format_instructions(&recipe.instructions));
    lines.push("\n## Notes".to_string());
    lines.push(metadata.notes.clone());
    lines.push("\n## Nutrition Info".to_string());
    lines.push(metadata.nutrition_info.clone());

    lines.join("\n")
}

/// Save the recipe's images and write its markdown file, overwriting any
/// existing file of the same name.
pub fn write_markdown(recipe: &Recipe, output_dir: &Path) -> Result<PathBuf> {
    fs::create_dir_all(output_dir)?;

    let photos: Vec<String> = recipe
        .images
        .iter()
        .filter_map(|image| save_image(image, output_dir))
        .collect();

    let date = chrono::Local::now().format("%Y-%m-%d").to_string();
    let content = render_markdown(recipe, &photos, &date);

    let path = output_path(recipe, output_dir);
    fs::write(&path, content)?;
    info!("Wrote {}", path.display());

    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Amount, Metadata};
    use serde_json::json;
    use tempfile::tempdir;

    const PIXEL: &str = "iVBORw0KGgoAAAANSUhEUgAAAAEAAAABCAQAAAC1HAwCAAAAC0lEQVR42mNkYAAAAAYAAjCB0C8AAAAASUVORK5CYII=";

    fn number(value: serde_json::Value) -> Amount {
        Amount::from_json(Some(&value))
    }

    fn sample_recipe() -> Recipe {
        Recipe {
            name: "Sample Test Recipe".to_string(),
            ingredients: vec![
                Ingredient::new("Sample Ingredient 1", number(json!(2)), "cup"),
                Ingredient::new("Sample Ingredient 2", number(json!(1)), "teaspoon"),
            ],
            instructions: vec![
                Step::section("Preparation", "First sample step"),
                Step::plain("Second sample step"),
                Step::section("Cooking", "Third sample step"),
            ],
            images: Vec::new(),
            metadata: Metadata {
                source_url: "https://example.com/sample".to_string(),
                cook_time: "45 minutes".to_string(),
                servings: "4".to_string(),
                notes: "Sample notes for testing".to_string(),
                nutrition_info: "Sample nutritional info".to_string(),
                ..Metadata::default()
            },
        }
    }

    #[test]
    fn test_pluralization() {
        let formatted = format_ingredients(&[
            Ingredient::new("milk", number(json!(1)), "cup"),
            Ingredient::new("flour", number(json!(2)), "cup"),
            Ingredient::new("beef", number(json!(2)), "pound"),
            Ingredient::new("peas", number(json!(3)), "grams"),
            Ingredient::new("butter", number(json!(1.5)), "Stick"),
        ]);
        assert_eq!(
            formatted,
            vec![
                "1 cup milk",
                "2 cups flour",
                "2 pound beef",
                "3 grams peas",
                "1.5 sticks butter"
            ]
        );
    }

    #[test]
    fn test_ingredient_without_amount_or_unit() {
        let formatted = format_ingredients(&[
            Ingredient::new("Salt", Amount::Empty, "pinch"),
            Ingredient::new("eggs", Amount::Text("3".to_string()), ""),
            Ingredient::new("water", number(json!(0)), "cup"),
        ]);
        assert_eq!(formatted, vec!["Salt", "eggs", "water"]);
    }

    #[test]
    fn test_text_amounts_pluralize() {
        let formatted = format_ingredients(&[
            Ingredient::new("flour", Amount::Text("2".to_string()), "cup"),
            Ingredient::new("salt", Amount::Text("1".to_string()), "teaspoon"),
        ]);
        assert_eq!(formatted, vec!["2 cups flour", "1 teaspoon salt"]);
    }

    #[test]
    fn test_format_instructions() {
        let rendered = format_instructions(&sample_recipe().instructions);
        assert_eq!(
            rendered.split('\n').collect::<Vec<_>>(),
            vec![
                "### Preparation",
                "1. First sample step",
                "1. Second sample step",
                "### Cooking",
                "1. Third sample step"
            ]
        );
    }

    #[test]
    fn test_section_without_body_has_no_numbered_line() {
        let rendered = format_instructions(&[
            Step::section("PREPARATION", ""),
            Step::plain("Mix."),
            Step::section("", ""),
        ]);
        assert_eq!(rendered, "### PREPARATION\n1. Mix.");
    }

    #[test]
    fn test_render_markdown_layout() {
        let content = render_markdown(&sample_recipe(), &[], "2024-01-02");
        let expected = "\
---
food-labels:
created: 2024-01-02
updated: 2024-01-02
tags:
  - food/recipe
photos:
source:
source-url: https://example.com/sample
cook-time: 45 minutes
difficulty:
servings: 4
ingredients:
  - 2 cups Sample Ingredient 1
  - 1 teaspoon Sample Ingredient 2
---

# Sample Test Recipe

## Directions
### Preparation
1. First sample step
1. Second sample step
### Cooking
1. Third sample step

## Notes
Sample notes for testing

## Nutrition Info
Sample nutritional info";
        assert_eq!(content, expected);
    }

    #[test]
    fn test_render_source_from_metadata() {
        let mut recipe = sample_recipe();
        recipe.metadata.source = "Grandma".to_string();
        let content = render_markdown(&recipe, &[], "2024-01-02");
        assert!(content.contains("photos:\nsource: Grandma\nsource-url: "));
        assert!(content.contains("\ndifficulty:\nservings: 4\n"));
        assert!(!content.contains(": \n"));
    }

    #[test]
    fn test_render_lists_photos_in_order() {
        let photos = vec!["images/a_0.jpg".to_string(), "images/a_1.jpg".to_string()];
        let content = render_markdown(&sample_recipe(), &photos, "2024-01-02");
        assert!(content.contains("photos:\n  - images/a_0.jpg\n  - images/a_1.jpg\nsource:"));
    }

    #[test]
    fn test_save_image() {
        let dir = tempdir().unwrap();
        let image = ImageRef::Base64 {
            data: PIXEL.to_string(),
            filename: "Test_Recipe_0.jpg".to_string(),
        };

        let path = save_image(&image, dir.path()).unwrap();
        assert_eq!(path, "images/Test_Recipe_0.jpg");

        let written = dir.path().join("images").join("Test_Recipe_0.jpg");
        assert!(fs::metadata(&written).unwrap().len() > 0);
    }

    #[test]
    fn test_save_image_invalid_base64() {
        let dir = tempdir().unwrap();
        let image = ImageRef::Base64 {
            data: "not-valid-base64!".to_string(),
            filename: "invalid.jpg".to_string(),
        };

        assert_eq!(save_image(&image, dir.path()), None);
        assert!(!dir.path().join("images").join("invalid.jpg").exists());
    }

    #[test]
    fn test_save_image_skips_truncated_and_url() {
        let dir = tempdir().unwrap();
        let truncated = ImageRef::Base64 {
            data: format!("{PIXEL} truncated for LLM context"),
            filename: "t.jpg".to_string(),
        };
        let url = ImageRef::Url {
            url: "https://example.com/photo.jpg".to_string(),
            filename: "u.jpg".to_string(),
        };

        assert_eq!(save_image(&truncated, dir.path()), None);
        assert_eq!(save_image(&url, dir.path()), None);
        assert!(!dir.path().join("images").exists());
    }

    #[test]
    fn test_write_markdown_overwrites() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("nested").join("output");
        let mut recipe = sample_recipe();

        let path = write_markdown(&recipe, &out).unwrap();
        assert_eq!(path, out.join("Sample_Test_Recipe.md"));

        recipe.metadata.notes = "Second run".to_string();
        write_markdown(&recipe, &out).unwrap();
        let content = fs::read_to_string(&path).unwrap();
        assert!(content.contains("Second run"));
        assert!(!content.contains("Sample notes for testing"));
    }

    #[test]
    fn test_write_markdown_saves_images() {
        let dir = tempdir().unwrap();
        let mut recipe = sample_recipe();
        recipe.images = vec![
            ImageRef::Base64 {
                data: PIXEL.to_string(),
                filename: "Sample_Test_Recipe_0.jpg".to_string(),
            },
            ImageRef::Base64 {
                data: "%%%".to_string(),
                filename: "Sample_Test_Recipe_1.jpg".to_string(),
            },
        ];

        let path = write_markdown(&recipe, dir.path()).unwrap();
        let content = fs::read_to_string(path).unwrap();
        assert!(content.contains("photos:\n  - images/Sample_Test_Recipe_0.jpg\nsource:"));
        assert!(!content.contains("Sample_Test_Recipe_1.jpg"));
    }
}
