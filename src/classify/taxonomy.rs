//! Built-in category taxonomy applied when no user rule matches.
//!
//! The cascade is ordered: the first category whose test accepts the
//! lowercased file name wins, and [`FallbackCategory::Uncategorized`]
//! accepts everything.

use serde::Serialize;

/// Built-in categories, in cascade order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum FallbackCategory {
    /// Well-known build and project configuration files.
    BuildConfig,
    /// Browser-side source files.
    WebFrontend,
    /// Server-side source files.
    WebBackend,
    /// Structured data formats.
    DataFiles,
    /// SQL scripts.
    Database,
    /// Text and office documents.
    Documents,
    /// Image formats.
    Images,
    /// Video formats.
    Videos,
    /// Audio formats.
    Audio,
    /// Compressed archives.
    Archives,
    /// Executables, installers and shell scripts.
    Executables,
    /// Anything not matched above.
    Uncategorized,
}

/// The cascade, in evaluation order.
pub const CASCADE: [FallbackCategory; 12] = [
    FallbackCategory::BuildConfig,
    FallbackCategory::WebFrontend,
    FallbackCategory::WebBackend,
    FallbackCategory::DataFiles,
    FallbackCategory::Database,
    FallbackCategory::Documents,
    FallbackCategory::Images,
    FallbackCategory::Videos,
    FallbackCategory::Audio,
    FallbackCategory::Archives,
    FallbackCategory::Executables,
    FallbackCategory::Uncategorized,
];

const BUILD_CONFIG_NAMES: &[&str] = &[
    "package.json",
    "dockerfile",
    "webpack.config.js",
    ".env",
    "pom.xml",
];

impl FallbackCategory {
    /// Display label, as stored in the category index.
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::BuildConfig => "Build Config",
            Self::WebFrontend => "Web Frontend",
            Self::WebBackend => "Web Backend",
            Self::DataFiles => "Data Files",
            Self::Database => "Database",
            Self::Documents => "Documents",
            Self::Images => "Images",
            Self::Videos => "Videos",
            Self::Audio => "Audio",
            Self::Archives => "Archives",
            Self::Executables => "Executables",
            Self::Uncategorized => "Uncategorized",
        }
    }

    /// Extensions (without dot, lowercase) that select this category.
    #[must_use]
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::BuildConfig | Self::Uncategorized => &[],
            Self::WebFrontend => &["html", "css", "js", "jsx", "ts", "tsx", "vue"],
            Self::WebBackend => &["py", "java", "php", "rb", "go", "cs"],
            Self::DataFiles => &["json", "xml", "csv", "yaml", "yml"],
            Self::Database => &["sql"],
            Self::Documents => &["pdf", "doc", "docx", "txt", "rtf", "odt", "md"],
            Self::Images => &["jpg", "jpeg", "png", "gif", "svg", "webp"],
            Self::Videos => &["mp4", "mov", "avi", "mkv", "wmv", "flv"],
            Self::Audio => &["mp3", "wav", "aac", "flac", "ogg"],
            Self::Archives => &["zip", "rar", "7z", "tar", "gz"],
            Self::Executables => &["exe", "msi", "bat", "sh", "dll"],
        }
    }

    /// Whether this category accepts an already-lowercased file name.
    fn accepts(self, name: &str, extension: Option<&str>) -> bool {
        match self {
            Self::BuildConfig => BUILD_CONFIG_NAMES.contains(&name),
            Self::Uncategorized => true,
            _ => extension.is_some_and(|ext| self.extensions().contains(&ext)),
        }
    }
}

impl std::fmt::Display for FallbackCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify a file name by the built-in cascade.
///
/// Matching is case-insensitive. The extension is the text after the last
/// dot, so `archive.tar.gz` is an archive and `.env` is build config.
#[must_use]
pub fn categorize(file_name: &str) -> FallbackCategory {
    if file_name.is_empty() {
        return FallbackCategory::Uncategorized;
    }

    let name = file_name.to_lowercase();
    let extension = name.rsplit_once('.').map(|(_, ext)| ext);

    CASCADE
        .into_iter()
        .find(|category| category.accepts(&name, extension))
        .unwrap_or(FallbackCategory::Uncategorized)
}
