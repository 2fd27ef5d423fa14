//! External collaborators reached during a turn.
//!
//! The orchestrator never implements media generation, file conversion,
//! OCR or search itself. It talks to these capabilities through small
//! object-safe traits, and this crate ships thin HTTP adapters for each:
//!
//! - [`ImageGenerator`] / [`HttpImageGenerator`] - prompt to image URL
//! - [`VideoGenerator`] / [`HttpVideoGenerator`] - prompt to video URL
//! - [`FileConverter`] / [`HttpFileConverter`] - bytes between [`FileFormat`]s
//! - [`TextExtractor`] / [`HttpTextExtractor`] - document bytes to text
//! - [`WebSearch`] / [`HttpWebSearch`] - query to [`SearchHit`]s
//!
//! A [`Toolbox`] bundles whichever adapters are configured.
//!
//! # Example
//!
//! ```rust,no_run
//! use agent_tools::Toolbox;
//!
//! # fn main() -> Result<(), agent_tools::ToolError> {
//! // Reads IMAGE_API_URL, CONVERTER_API_URL, SEARCH_API_URL, ...
//! let toolbox = Toolbox::from_env()?;
//! println!("{}", toolbox.free_image_url("a lighthouse at dusk"));
//! # Ok(())
//! # }
//! ```

mod error;
mod format;
mod tool;
mod toolbox;
pub mod tools;

pub use error::ToolError;
pub use format::{converted_file_name, FileFormat};
pub use tool::{FileConverter, ImageGenerator, SearchHit, TextExtractor, VideoGenerator, WebSearch};
pub use toolbox::Toolbox;
pub use tools::{
    free_image_url, truncate_utf8, HttpFileConverter, HttpImageGenerator, HttpTextExtractor,
    HttpVideoGenerator, HttpWebSearch, DEFAULT_FREE_IMAGE_URL,
};

// Re-export async_trait for convenience
pub use async_trait::async_trait;
