//! Convert recipe exports from Crumb (`.crumb`) and Paprika
//! (`.paprikarecipe`, `.paprikarecipes`) into markdown notes with YAML
//! frontmatter.
//!
//! ```no_run
//! use cookdown::{convert_recipe_file, ParserRegistry};
//! use std::path::Path;
//!
//! let registry = ParserRegistry::with_defaults();
//! let written = convert_recipe_file(
//!     Path::new("input/Pancakes.crumb"),
//!     Path::new("output"),
//!     &registry,
//! )?;
//! println!("{}", written.display());
//! # Ok::<(), cookdown::ConvertError>(())
//! ```

pub mod batch;
pub mod config;
pub mod convert;
pub mod error;
pub mod extract;
pub mod formatter;
pub mod model;
pub mod parsers;
pub mod readers;

pub use batch::{find_recipe_files, run_batch, BatchOptions, BatchReport};
pub use config::CookdownConfig;
pub use convert::{convert_recipe, convert_recipe_file};
pub use error::{ConvertError, Result};
pub use model::{Amount, ImageRef, Ingredient, Metadata, Recipe, Step};
pub use parsers::{ParserRegistry, RecipeFormat, RecipeParser};
