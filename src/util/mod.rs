//! Utility functions for common operations.
//!
//! - **URL validation**: refuses feed links that would make the server fetch
//!   from its own network
//! - **Text processing**: markup stripping for feed descriptions and
//!   width-aware excerpts for listing pages

mod text;
mod url_validator;

pub use text::{strip_markup, truncate_to_width};
pub use url_validator::{validate_feed_url, UrlValidationError};
