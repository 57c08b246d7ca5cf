//! screenspec — turn raw screen definition documents (an overview, an item
//! definition table and an action table) into a fixed-template screen
//! specification.
//!
//! ```text
//! raw text → sections → rows → (items, action index) → enriched items
//!          → assembled document → validated output
//! ```

pub mod assemble;
pub mod codes;
pub mod config;
pub mod enrich;
pub mod error;
pub mod index;
pub mod model;
pub mod parser;
pub mod pipeline;
pub mod render;
pub mod toc;
pub mod validate;

pub use config::Config;
pub use error::{ConfigError, PipelineError};
pub use model::{OutputDocument, RawDocument, Violation};
pub use pipeline::Pipeline;
