//! Byte-level decoding of recipe export files into raw JSON values.

use crate::error::{ConvertError, Result};
use flate2::read::GzDecoder;
use log::debug;
use serde_json::Value;
use std::fs::{self, File};
use std::io::Read;
use std::path::Path;
use zip::ZipArchive;

/// Suffix of the gzip-wrapped members stored inside an archive.
pub const MEMBER_SUFFIX: &str = ".paprikarecipe";

/// Read a UTF-8 JSON file.
pub fn read_json(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::InvalidData => {
            ConvertError::Decode(format!("{} is not valid UTF-8", path.display()))
        }
        _ => ConvertError::Io(e),
    })?;
    serde_json::from_str(&text)
        .map_err(|e| ConvertError::Decode(format!("{}: {}", path.display(), e)))
}

/// Read a gzip-compressed JSON file.
pub fn read_gzip_json(path: &Path) -> Result<Value> {
    let bytes = fs::read(path)?;
    decode_gzip_json(&bytes, &path.display().to_string())
}

/// Decompress gzip bytes and parse the payload as JSON. `label` names the
/// source in error messages.
pub fn decode_gzip_json(bytes: &[u8], label: &str) -> Result<Value> {
    let mut decoder = GzDecoder::new(bytes);
    let mut raw = Vec::new();
    decoder
        .read_to_end(&mut raw)
        .map_err(|e| ConvertError::Decode(format!("Failed to decompress {label}: {e}")))?;

    let text = String::from_utf8(raw)
        .map_err(|e| ConvertError::Decode(format!("{label} is not valid UTF-8: {e}")))?;

    serde_json::from_str(&text)
        .map_err(|e| ConvertError::Decode(format!("Failed to parse {label}: {e}")))
}

pub(crate) fn open_archive(path: &Path) -> Result<ZipArchive<File>> {
    let file = File::open(path).map_err(|e| {
        ConvertError::Archive(format!("Failed to open archive {}: {}", path.display(), e))
    })?;
    ZipArchive::new(file).map_err(|e| {
        ConvertError::Archive(format!("Failed to read archive {}: {}", path.display(), e))
    })
}

/// Names of the recipe members of an archive, in the archive's own order.
pub fn archive_recipe_names(path: &Path) -> Result<Vec<String>> {
    let mut archive = open_archive(path)?;
    let mut names = Vec::new();
    for i in 0..archive.len() {
        let entry = archive.by_index(i)?;
        if entry.name().ends_with(MEMBER_SUFFIX) {
            names.push(entry.name().to_string());
        }
    }
    Ok(names)
}

fn read_member(archive: &mut ZipArchive<File>, index: usize) -> Result<Option<(String, Vec<u8>)>> {
    let mut entry = archive.by_index(index)?;
    let name = entry.name().to_string();
    if !name.ends_with(MEMBER_SUFFIX) {
        debug!("Skipping non-recipe archive entry: {}", name);
        return Ok(None);
    }

    let mut compressed = Vec::new();
    entry.read_to_end(&mut compressed)?;
    Ok(Some((name, compressed)))
}

/// Decode the first recipe member of an archive.
///
/// Only one entry is parsed; converting every member is left to the batch
/// driver.
pub fn read_archive_first(path: &Path) -> Result<Value> {
    let mut archive = open_archive(path)?;

    for i in 0..archive.len() {
        if let Some((name, compressed)) = read_member(&mut archive, i)? {
            debug!("Reading {} from {}", name, path.display());
            return decode_gzip_json(&compressed, &name);
        }
    }

    Err(ConvertError::Archive(format!(
        "No recipe files found in archive: {}",
        path.display()
    )))
}

/// Decode every recipe member of an archive, in archive order.
///
/// Each member carries its own decode result so one corrupt member does not
/// hide its siblings. Only an unreadable archive or one without any recipe
/// members is an error for the whole call.
pub fn read_archive_all(path: &Path) -> Result<Vec<(String, Result<Value>)>> {
    let mut archive = open_archive(path)?;
    let mut recipes = Vec::new();

    for i in 0..archive.len() {
        if let Some((name, compressed)) = read_member(&mut archive, i)? {
            let value = decode_gzip_json(&compressed, &name);
            recipes.push((name, value));
        }
    }

    if recipes.is_empty() {
        return Err(ConvertError::Archive(format!(
            "No recipe files found in archive: {}",
            path.display()
        )));
    }

    debug!(
        "Archive {} contains {} recipe files",
        path.display(),
        recipes.len()
    );
    Ok(recipes)
}
