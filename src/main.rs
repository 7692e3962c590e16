use clap::{Parser, Subcommand};
use cookdown::batch::{self, BatchOptions};
use cookdown::config::CookdownConfig;
use cookdown::{convert_recipe_file, extract, ParserRegistry};
use log::{debug, info, warn};
use std::env;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "cookdown")]
#[command(about = "Convert Crumb and Paprika recipe exports to markdown")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Convert recipe files to markdown
    Convert {
        /// Directory containing recipe files
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Directory for markdown files and images
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Convert a single file instead of a directory
        #[arg(short, long)]
        file: Option<PathBuf>,

        /// Search the input directory recursively
        #[arg(short, long)]
        recursive: bool,

        /// Number of conversions to run in parallel
        #[arg(short = 'p', long)]
        workers: Option<usize>,
    },

    /// List supported file extensions
    Formats,

    /// Unpack Paprika exports into JSON files
    Extract {
        /// Archive, recipe file or directory
        input: PathBuf,

        /// Directory for the JSON files
        #[arg(short, long, default_value = "paprika_json")]
        output: PathBuf,

        /// Keep the unpacked `.paprikarecipe` files
        #[arg(short, long)]
        keep_intermediate: bool,
    },
}

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    match cli.command {
        Commands::Convert {
            input,
            output,
            file,
            recursive,
            workers,
        } => {
            let settings = CookdownConfig::load()?;
            debug!("{:#?}", settings);
            let cwd = env::current_dir()?;
            let registry = ParserRegistry::with_defaults();

            let output_dir = match output {
                Some(dir) => dir,
                None => settings.resolve_output_dir(&cwd)?,
            };

            if let Some(file) = file {
                let written = convert_recipe_file(&file, &output_dir, &registry)?;
                println!("{}", written.display());
                return Ok(ExitCode::SUCCESS);
            }

            let input_dir = match input {
                Some(dir) => dir,
                None => settings.resolve_input_dir(&cwd)?,
            };
            let recursive = recursive || settings.recursive;
            let workers = workers.unwrap_or(settings.workers);

            let files = batch::find_recipe_files(&input_dir, recursive, &registry);
            if files.is_empty() {
                warn!("No recipe files found in {}", input_dir.display());
                return Ok(ExitCode::SUCCESS);
            }

            let options = BatchOptions::new(output_dir).workers(workers);
            let report = batch::run_batch(files, &options, Arc::new(registry))?;

            println!(
                "Converted {} of {} recipe(s) in {:.2}s",
                report.converted.len(),
                report.total(),
                report.elapsed.as_secs_f64()
            );
            for (path, reason) in &report.failed {
                println!("  failed: {} ({})", path.display(), reason);
            }

            if report.is_success() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
        Commands::Formats => {
            for extension in ParserRegistry::with_defaults().supported_extensions() {
                println!(".{extension}");
            }
            Ok(ExitCode::SUCCESS)
        }
        Commands::Extract {
            input,
            output,
            keep_intermediate,
        } => {
            let stats = extract::process_path(&input, &output, keep_intermediate)?;
            info!(
                "Processed {} archive(s) and {} recipe(s)",
                stats.archives_processed.len(),
                stats.recipes_processed.len()
            );
            println!(
                "Created {} JSON file(s) in {}",
                stats.json_files_created.len(),
                output.display()
            );
            Ok(ExitCode::SUCCESS)
        }
    }
}
