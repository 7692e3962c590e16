use crate::error::{ConvertError, Result};
use crate::formatter;
use crate::model::Recipe;
use crate::parsers::{file_extension, ParserRegistry};
use log::{error, info};
use std::path::{Path, PathBuf};

/// Convert one recipe file into a markdown file under `output_dir`.
///
/// The parser is chosen by the file's extension. Errors are logged with the
/// source path and returned; whether to abort or carry on is up to the caller.
pub fn convert_recipe_file(
    path: &Path,
    output_dir: &Path,
    registry: &ParserRegistry,
) -> Result<PathBuf> {
    let result = registry
        .resolve_path(path)
        .ok_or_else(|| ConvertError::UnsupportedFormat {
            extension: file_extension(path),
            supported: registry.supported_extensions(),
        })
        .and_then(|format| format.parser().parse_recipe(path))
        .and_then(|recipe| convert_recipe(&recipe, output_dir));

    match &result {
        Ok(output) => info!("Converted {} to {}", path.display(), output.display()),
        Err(e) => error!("Error converting {}: {}", path.display(), e),
    }
    result
}

/// Write an already normalized recipe to `output_dir`.
pub fn convert_recipe(recipe: &Recipe, output_dir: &Path) -> Result<PathBuf> {
    formatter::write_markdown(recipe, output_dir)
}
