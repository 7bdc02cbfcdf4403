//! Stylesheet inlining.

use std::sync::LazyLock;

use regex::{NoExpand, Regex};

static LINK_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<link.*.css.*>").expect("BUG: invalid LINK_RE regex literal"));

/// Replace every stylesheet `<link>` line in `html` with a `<style>` block
/// holding `css`.
///
/// The match is textual and greedy up to the end of the line, so `html`
/// should come out of [`crate::clean::HtmlCleaner`], which puts each link on
/// a line of its own. `css` is inserted as is.
pub fn inject_css(css: &str, html: &str) -> String {
    let block = format!("<style>{css}</style>");
    LINK_RE.replace_all(html, NoExpand(&block)).into_owned()
}
