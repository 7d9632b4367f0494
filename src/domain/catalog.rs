//! Display metadata for crops (icons and human-readable names).

use std::collections::BTreeMap;

/// Icon used for crops without a catalog entry.
pub const FALLBACK_ICON: &str = "🌱";

/// Crop display catalog.
///
/// Built once at startup and handed to whatever renders predictions.
#[derive(Debug, Clone, Default)]
pub struct CropCatalog {
    icons: BTreeMap<String, String>,
}

impl CropCatalog {
    /// Empty catalog: every crop gets the fallback icon.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with icons for the 22 standard crops.
    #[must_use]
    pub fn standard() -> Self {
        [
            ("rice", "🍚"),
            ("maize", "🌽"),
            ("chickpea", "𓇛"),
            ("kidneybeans", "🫘"),
            ("pigeonpeas", "🫘"),
            ("mothbeans", "🫛"),
            ("mungbean", "🫘"),
            ("blackgram", "🫘"),
            ("lentil", "𓇢"),
            ("pomegranate", "🥭"),
            ("banana", "🍌"),
            ("mango", "🥭"),
            ("grapes", "🍇"),
            ("watermelon", "🍉"),
            ("muskmelon", "🍈"),
            ("apple", "🍎"),
            ("orange", "🍊"),
            ("papaya", "🏉"),
            ("coconut", "🥥"),
            ("cotton", "☁️"),
            ("jute", "🌿"),
            ("coffee", "☕"),
        ]
        .into_iter()
        .fold(Self::new(), |catalog, (crop, icon)| catalog.with_icon(crop, icon))
    }

    /// Add or replace the icon of a crop.
    #[must_use]
    pub fn with_icon(mut self, crop: impl Into<String>, icon: impl Into<String>) -> Self {
        self.icons.insert(crop.into(), icon.into());
        self
    }

    #[must_use]
    pub fn icon(&self, crop: &str) -> &str {
        self.icons.get(crop).map_or(FALLBACK_ICON, String::as_str)
    }

    /// Icon followed by the capitalised crop name, e.g. `🍚 Rice`.
    #[must_use]
    pub fn display_name(&self, crop: &str) -> String {
        format!("{} {}", self.icon(crop), capitalize(crop))
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
