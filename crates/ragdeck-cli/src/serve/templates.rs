//! HTML template rendering for the graph page.
//!
//! Templates are stored as separate files:
//! - `templates/index.html` - HTML structure
//! - `templates/styles.css` - CSS styles
//! - `templates/app.js` - JavaScript application code
//!
//! Files are embedded at compile time using `include_str!`.

const HTML_TEMPLATE: &str = include_str!("templates/index.html");
const STYLES: &str = include_str!("templates/styles.css");
const SCRIPT: &str = include_str!("templates/app.js");

/// Render the graph page.
///
/// Placeholders:
/// - `{{BACKEND_URL}}` - RAG backend shown in the header
/// - `{{PANEL_HEIGHT}}` - graph panel height in pixels
/// - `{{STYLES}}` - CSS styles
/// - `{{SCRIPT}}` - JavaScript code
pub fn render_graph_page(backend_url: &str, panel_height: u32) -> String {
    HTML_TEMPLATE
        .replace("{{BACKEND_URL}}", &html_escape(backend_url))
        .replace("{{PANEL_HEIGHT}}", &panel_height.to_string())
        .replace("{{STYLES}}", STYLES)
        .replace("{{SCRIPT}}", SCRIPT)
}

/// Escape HTML special characters.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
