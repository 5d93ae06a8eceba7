//! Askama templates for the web frontend.

use askama::Template;

use crate::config::UiConfig;

/// The dashboard shell. All data is fetched client-side from `/v1/summary`.
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    /// `combined`, or a single section name.
    pub layout: String,
    /// Section rotation interval in milliseconds; 0 disables rotation.
    pub rotate_ms: u64,
}

impl From<&UiConfig> for IndexTemplate {
    fn from(ui: &UiConfig) -> Self {
        Self {
            layout: ui.layout.clone(),
            rotate_ms: ui.rotate_ms,
        }
    }
}
