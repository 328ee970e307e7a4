//! Views of the call tree. Percentages are computed from the totals at
//! render time, callers hold the tree's read guard for the whole render.

pub mod html;
pub mod json;

/// two decimal fixed point, `.` separator, no grouping
pub fn format_percent(percent: f64) -> String {
    format!("{percent:.2}")
}

pub(crate) fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
