// Preview Composer: deterministic document -> layout mapping, plus a markdown rendering.

pub mod composer;
pub mod markdown;

pub use composer::{compose, format_date_range, PreviewBlock, PreviewLayout, PreviewPhoto};
pub use markdown::render_markdown;
