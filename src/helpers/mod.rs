//! Helper functions for templates
//!
//! Date formatting, HTML escaping and URL building shared by the
//! generator and the server.

mod date;
mod html;
mod url;

pub use date::*;
pub use html::*;
pub use url::*;
