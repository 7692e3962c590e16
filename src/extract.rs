//! Unpacks Paprika exports into plain JSON files.

use crate::batch::find_files;
use crate::error::{ConvertError, Result};
use crate::readers::{self, MEMBER_SUFFIX};
use log::{debug, error, info};
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

/// Directory (under the output directory) that holds members unpacked from
/// archives until they are converted to JSON.
pub const INTERMEDIATE_DIR: &str = "paprikarecipe_files";

#[derive(Debug, Default)]
pub struct ExtractStats {
    pub archives_processed: Vec<PathBuf>,
    pub recipes_processed: Vec<PathBuf>,
    pub json_files_created: Vec<PathBuf>,
}

/// Write every `.paprikarecipe` member of `archive` into `dest` and return
/// the written paths. Members are flattened to their base name.
pub fn extract_archive(archive: &Path, dest: &Path) -> Result<Vec<PathBuf>> {
    info!("Extracting archive: {}", archive.display());

    let mut zip = readers::open_archive(archive)?;

    fs::create_dir_all(dest)?;
    let mut extracted = Vec::new();

    for i in 0..zip.len() {
        let mut entry = zip.by_index(i)?;
        if !entry.name().ends_with(MEMBER_SUFFIX) {
            continue;
        }
        let Some(file_name) = Path::new(entry.name()).file_name().map(|n| n.to_owned()) else {
            continue;
        };

        let target = dest.join(file_name);
        let mut out = File::create(&target)?;
        io::copy(&mut entry, &mut out)?;
        debug!("Extracted: {}", target.display());
        extracted.push(target);
    }

    info!("Archive contains {} recipe files", extracted.len());
    Ok(extracted)
}

/// Decompress a `.paprikarecipe` file and write it as pretty-printed
/// `<stem>.json` in `dest`.
pub fn extract_recipe_to_json(recipe: &Path, dest: &Path) -> Result<PathBuf> {
    let value = readers::read_gzip_json(recipe)?;

    let stem = recipe
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "recipe".to_string());
    let json_path = dest.join(format!("{stem}.json"));

    fs::create_dir_all(dest)?;
    fs::write(&json_path, serde_json::to_string_pretty(&value)?)?;
    info!(
        "Extracting: {} -> {}",
        recipe.display(),
        json_path.display()
    );

    Ok(json_path)
}

fn convert_members(members: &[PathBuf], output: &Path, stats: &mut ExtractStats) {
    for recipe in members {
        match extract_recipe_to_json(recipe, output) {
            Ok(json_path) => {
                stats.recipes_processed.push(recipe.clone());
                stats.json_files_created.push(json_path);
            }
            Err(e) => error!("Failed to extract {}: {}", recipe.display(), e),
        }
    }
}

/// Remove an intermediate directory, logging instead of failing.
pub fn cleanup(dir: &Path) {
    if !dir.exists() {
        return;
    }
    info!("Cleaning up intermediate files");
    if let Err(e) = fs::remove_dir_all(dir) {
        error!("Failed to clean up intermediate files: {}", e);
    }
}

/// Convert a single archive into JSON files under `output`.
pub fn process_archive(
    archive: &Path,
    output: &Path,
    keep_intermediate: bool,
) -> Result<ExtractStats> {
    let intermediate = output.join(INTERMEDIATE_DIR);
    let mut stats = ExtractStats::default();

    let result = extract_archive(archive, &intermediate);
    if let Ok(members) = &result {
        stats.archives_processed.push(archive.to_path_buf());
        convert_members(members, output, &mut stats);
    }

    if !keep_intermediate {
        cleanup(&intermediate);
    }
    result.map(|_| stats)
}

/// Convert every archive and standalone recipe file directly inside `input`.
/// Files that fail are logged and skipped.
pub fn process_directory(
    input: &Path,
    output: &Path,
    keep_intermediate: bool,
) -> Result<ExtractStats> {
    info!("Processing Paprika recipes from {}", input.display());
    fs::create_dir_all(output)?;

    let intermediate = output.join(INTERMEDIATE_DIR);
    let mut stats = ExtractStats::default();

    for archive in find_files(input, "paprikarecipes", false) {
        match extract_archive(&archive, &intermediate) {
            Ok(members) => {
                stats.archives_processed.push(archive);
                convert_members(&members, output, &mut stats);
            }
            Err(e) => error!("Failed to extract archive {}: {}", archive.display(), e),
        }
    }

    let standalone = find_files(input, "paprikarecipe", false);
    convert_members(&standalone, output, &mut stats);

    if !keep_intermediate {
        cleanup(&intermediate);
    }
    Ok(stats)
}

/// Dispatch on what `input` is: an archive, a single recipe or a directory.
pub fn process_path(input: &Path, output: &Path, keep_intermediate: bool) -> Result<ExtractStats> {
    if input.is_dir() {
        return process_directory(input, output, keep_intermediate);
    }
    if !input.is_file() {
        return Err(ConvertError::Io(io::Error::new(
            io::ErrorKind::NotFound,
            format!("Input path not found: {}", input.display()),
        )));
    }

    match crate::parsers::file_extension(input).as_str() {
        "paprikarecipes" => process_archive(input, output, keep_intermediate),
        "paprikarecipe" => {
            let json_path = extract_recipe_to_json(input, output)?;
            Ok(ExtractStats {
                recipes_processed: vec![input.to_path_buf()],
                json_files_created: vec![json_path],
                ..ExtractStats::default()
            })
        }
        other => Err(ConvertError::UnsupportedFormat {
            extension: other.to_string(),
            supported: vec!["paprikarecipe".to_string(), "paprikarecipes".to_string()],
        }),
    }
}
