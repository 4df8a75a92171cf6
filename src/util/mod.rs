//! Utility functions for common operations.
//!
//! - **HTML**: escaping of server-supplied text and newline conversion
//! - **Text processing**: preview truncation and terminal-safe output
//! - **URL validation**: checks on the configured board base URL

mod html;
mod text;
mod url_validator;

pub use html::{escape_html, multiline_html, nl2br, LINE_BREAK};
pub use text::{char_prefix, strip_control_chars, truncate_chars};
pub use url_validator::{validate_base_url, BaseUrlError};
