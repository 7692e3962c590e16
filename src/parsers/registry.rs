use super::RecipeFormat;
use std::collections::HashMap;
use std::path::Path;

/// Lower-cased extension of `path` without the dot, or `""`.
pub fn file_extension(path: &Path) -> String {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_lowercase)
        .unwrap_or_default()
}

/// Maps file extensions to the format that parses them.
///
/// Built once before any conversion starts and only read afterwards, so a
/// single instance can be shared across workers.
#[derive(Debug, Clone, Default)]
pub struct ParserRegistry {
    formats: HashMap<String, RecipeFormat>,
}

impl ParserRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            formats: HashMap::new(),
        }
    }

    /// Registry with every built-in format registered under its extensions.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for format in RecipeFormat::ALL {
            registry.register(format.parser().extensions(), format);
        }
        registry
    }

    /// Register `format` for each extension. A leading dot is ignored and
    /// later registrations win.
    pub fn register(&mut self, extensions: &[&str], format: RecipeFormat) {
        for ext in extensions {
            self.formats.insert(normalize(ext), format);
        }
    }

    /// Case-insensitive lookup by extension.
    pub fn resolve(&self, extension: &str) -> Option<RecipeFormat> {
        self.formats.get(&normalize(extension)).copied()
    }

    pub fn resolve_path(&self, path: &Path) -> Option<RecipeFormat> {
        self.resolve(&file_extension(path))
    }

    pub fn is_supported(&self, path: &Path) -> bool {
        self.resolve_path(path).is_some()
    }

    /// All registered extensions, sorted.
    pub fn supported_extensions(&self) -> Vec<String> {
        let mut extensions: Vec<String> = self.formats.keys().cloned().collect();
        extensions.sort();
        extensions
    }
}

fn normalize(extension: &str) -> String {
    extension.trim_start_matches('.').to_lowercase()
}
