//! Markdown string helpers.

/// First-level heading.
#[must_use]
pub fn h1(text: &str) -> String {
    format!("# {text}")
}

/// Second-level heading.
#[must_use]
pub fn h2(text: &str) -> String {
    format!("## {text}")
}

/// Third-level heading.
#[must_use]
pub fn h3(text: &str) -> String {
    format!("### {text}")
}

/// Inline link.
#[must_use]
pub fn link(text: &str, url: &str) -> String {
    format!("[{text}]({url})")
}

/// Escapes angle brackets so text cannot open HTML tags.
#[must_use]
pub fn encode_html(text: &str) -> String {
    text.replace('<', "&lt;").replace('>', "&gt;")
}
