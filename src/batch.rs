//! Fan-out of many independent conversions over a bounded worker pool.

use crate::convert::{convert_recipe, convert_recipe_file};
use crate::error::{ConvertError, Result};
use crate::parsers::{file_extension, ParserRegistry, RecipeFormat};
use crate::readers;
use log::{debug, error, info};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

const ARCHIVE_EXTENSION: &str = "paprikarecipes";

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub output_dir: PathBuf,
    /// Upper bound on conversions running at the same time
    pub workers: usize,
}

impl BatchOptions {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            workers: 4,
        }
    }

    pub fn workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }
}

/// Outcome of a batch run
#[derive(Debug, Default)]
pub struct BatchReport {
    /// `(source, written markdown)` pairs. Archive members are reported
    /// as `<archive>/<member>`.
    pub converted: Vec<(PathBuf, PathBuf)>,
    /// `(source, error message)` pairs
    pub failed: Vec<(PathBuf, String)>,
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.converted.len() + self.failed.len()
    }

    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    fn failure(source: PathBuf, error: ConvertError) -> Self {
        Self {
            failed: vec![(source, error.to_string())],
            ..Self::default()
        }
    }

    fn merge(&mut self, other: BatchReport) {
        self.converted.extend(other.converted);
        self.failed.extend(other.failed);
    }
}

/// Files under `dir` with the given extension (matched case-insensitively),
/// sorted.
pub fn find_files(dir: &Path, extension: &str, recursive: bool) -> Vec<PathBuf> {
    let base = glob::Pattern::escape(&dir.to_string_lossy());
    let pattern = if recursive {
        format!("{base}/**/*.{extension}")
    } else {
        format!("{base}/*.{extension}")
    };
    let options = glob::MatchOptions {
        case_sensitive: false,
        ..glob::MatchOptions::default()
    };

    let mut files: Vec<PathBuf> = match glob::glob_with(&pattern, options) {
        Ok(paths) => paths
            .filter_map(|entry| match entry {
                Ok(path) => Some(path),
                Err(e) => {
                    debug!("Skipping unreadable path: {}", e);
                    None
                }
            })
            .filter(|path| path.is_file())
            .collect(),
        Err(e) => {
            error!("Invalid search pattern {}: {}", pattern, e);
            Vec::new()
        }
    };
    files.sort();
    files
}

/// Every file under `input_dir` whose extension has a registered parser.
pub fn find_recipe_files(
    input_dir: &Path,
    recursive: bool,
    registry: &ParserRegistry,
) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = registry
        .supported_extensions()
        .iter()
        .flat_map(|ext| find_files(input_dir, ext, recursive))
        .collect();
    files.sort();
    files.dedup();
    files
}

/// Convert one file. Archives are expanded so every member becomes its own
/// markdown file; a member that fails does not stop the others.
fn convert_one(path: &Path, output_dir: &Path, registry: &ParserRegistry) -> BatchReport {
    let mut report = BatchReport::default();

    let is_archive = file_extension(path) == ARCHIVE_EXTENSION
        && registry.resolve_path(path) == Some(RecipeFormat::Paprika);
    if !is_archive {
        match convert_recipe_file(path, output_dir, registry) {
            Ok(output) => report.converted.push((path.to_path_buf(), output)),
            Err(e) => report.failed.push((path.to_path_buf(), e.to_string())),
        }
        return report;
    }

    let members = match readers::read_archive_all(path) {
        Ok(members) => members,
        Err(e) => {
            error!("Error reading archive {}: {}", path.display(), e);
            report.failed.push((path.to_path_buf(), e.to_string()));
            return report;
        }
    };

    let parser = RecipeFormat::Paprika.parser();
    for (name, data) in members {
        let source = path.join(&name);
        let converted = data.and_then(|data| convert_recipe(&parser.normalize(&data), output_dir));
        match converted {
            Ok(output) => {
                info!("Converted {} to {}", source.display(), output.display());
                report.converted.push((source, output));
            }
            Err(e) => {
                error!("Error converting {}: {}", source.display(), e);
                report.failed.push((source, e.to_string()));
            }
        }
    }
    report
}

/// Convert every file with at most `options.workers` conversions in flight.
///
/// Workers share only the read-only registry and the output directory path.
/// Two recipes that sanitize to the same name overwrite each other; the last
/// one written wins.
pub async fn run_batch_async(
    files: Vec<PathBuf>,
    options: &BatchOptions,
    registry: Arc<ParserRegistry>,
) -> Result<BatchReport> {
    let output_dir = options.output_dir.clone();
    let convert = move |path: &Path| convert_one(path, &output_dir, &registry);
    Ok(run_workers(files, options.workers, Arc::new(convert)).await)
}

/// Run `convert` over `files` on blocking threads, gated by a semaphore.
/// A worker that panics is reported as a failure of its file; the remaining
/// workers keep running.
async fn run_workers<F>(files: Vec<PathBuf>, workers: usize, convert: Arc<F>) -> BatchReport
where
    F: Fn(&Path) -> BatchReport + Send + Sync + 'static,
{
    let started = Instant::now();
    let permits = Arc::new(Semaphore::new(workers.max(1)));
    let mut tasks = JoinSet::new();

    info!("Processing {} file(s)...", files.len());

    let mut pending: HashSet<PathBuf> = files.iter().cloned().collect();

    for path in files {
        let permits = Arc::clone(&permits);
        let convert = Arc::clone(&convert);

        tasks.spawn(async move {
            let source = path.clone();
            let converted = match permits.acquire_owned().await {
                Ok(_permit) => tokio::task::spawn_blocking(move || (*convert)(&path)).await,
                Err(e) => Ok(BatchReport::failure(path, ConvertError::Task(e.to_string()))),
            };
            let report = converted.unwrap_or_else(|e| {
                error!("Worker for {} failed: {}", source.display(), e);
                BatchReport::failure(source.clone(), ConvertError::Task(e.to_string()))
            });
            (source, report)
        });
    }

    let mut report = BatchReport::default();
    let mut lost = None;
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((source, task_report)) => {
                pending.remove(&source);
                report.merge(task_report);
            }
            Err(e) => {
                error!("Batch worker failed: {}", e);
                lost = Some(ConvertError::Task(e.to_string()).to_string());
            }
        }
    }

    // Tasks that died before reporting leave their file unaccounted for.
    if let Some(reason) = lost {
        report
            .failed
            .extend(pending.into_iter().map(|path| (path, reason.clone())));
    }

    report.converted.sort();
    report.failed.sort();
    report.elapsed = started.elapsed();
    report
}

/// Blocking wrapper around [`run_batch_async`] that owns its runtime.
pub fn run_batch(
    files: Vec<PathBuf>,
    options: &BatchOptions,
    registry: Arc<ParserRegistry>,
) -> Result<BatchReport> {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(options.workers.max(1))
        .build()?;
    runtime.block_on(run_batch_async(files, options, registry))
}
