//! Weather icon code → image URL lookup.

use std::collections::HashMap;

/// Highest icon code The Weather Company publishes (`0..=47`).
const MAX_ICON_CODE: u32 = 47;

/// Static mapping built once at startup.
///
/// Without a base URL the table is empty and cards carry no icon.
#[derive(Debug, Clone, Default)]
pub struct IconTable {
    urls: HashMap<u32, String>,
}

impl IconTable {
    #[must_use]
    pub fn new(base_url: Option<&str>) -> Self {
        let Some(base) = base_url else {
            return Self::default();
        };
        let base = base.trim_end_matches('/');
        let urls = (0..=MAX_ICON_CODE)
            .map(|code| (code, format!("{base}/{code}.png")))
            .collect();
        Self { urls }
    }

    #[must_use]
    pub fn url_for(&self, code: u32) -> Option<&str> {
        self.urls.get(&code).map(String::as_str)
    }
}
