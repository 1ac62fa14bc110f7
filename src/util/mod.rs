//! Utility functions shared by the store, the API client and the CLI.
//!
//! - **URL validation**: article links before opening them, and the API base URL
//! - **Text processing**: control-character stripping and width-aware truncation
//!   for terminal output

mod text;
mod url_validator;

pub use text::{display_width, single_line, strip_control_chars, truncate_to_width};
pub use url_validator::{validate_api_base, validate_url_for_open, UrlValidationError};

/// Maximum allowed search keyword length, shared by the store and the API client
pub const MAX_SEARCH_QUERY_LENGTH: usize = 256;
