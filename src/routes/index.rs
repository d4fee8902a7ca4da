use askama::Template;

use crate::error::InternalError;

#[derive(Template)]
#[template(path = "index.html", escape = "none")]
struct IndexTemplate {
    content: String,
}

/// Wraps a rendered fragment in the full page layout.
pub fn render_main(content: String) -> Result<String, InternalError> {
    Ok(IndexTemplate { content }.render()?)
}
