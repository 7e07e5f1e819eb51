//! Content module - rich text, post view models and shaping

mod post;
pub mod reading;
mod richtext;

pub use post::{shape_summaries, ContentSection, PostDetail, PostSummary};
pub use richtext::{Block, Embed, RichField, RichText, Span};
