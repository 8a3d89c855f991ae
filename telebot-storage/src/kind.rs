use std::path::Path;

/// Extensions the store knows how to classify.
pub const SUPPORTED_EXTENSIONS: &str = "txt, json, csv, log, ini, html, xml, bin, dat, cfg";

/// File classification by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Txt,
    Json,
    Csv,
    Log,
    Ini,
    Html,
    Xml,
    Bin,
}

impl FileKind {
    /// `None` for unknown extensions.
    pub fn from_path(path: impl AsRef<Path>) -> Option<Self> {
        let ext = path.as_ref().extension()?.to_str()?.to_ascii_lowercase();
        let kind = match ext.as_str() {
            "txt" => FileKind::Txt,
            "json" => FileKind::Json,
            "csv" => FileKind::Csv,
            "log" => FileKind::Log,
            "ini" | "cfg" => FileKind::Ini,
            "html" | "htm" => FileKind::Html,
            "xml" => FileKind::Xml,
            "bin" | "dat" => FileKind::Bin,
            _ => return None,
        };
        Some(kind)
    }

    pub fn is_binary(self) -> bool {
        self == FileKind::Bin
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_path() {
        assert_eq!(FileKind::from_path("/logs/boot.LOG"), Some(FileKind::Log));
        assert_eq!(FileKind::from_path("settings.cfg"), Some(FileKind::Ini));
        assert_eq!(FileKind::from_path("dump.dat"), Some(FileKind::Bin));
        assert!(FileKind::Bin.is_binary());
        assert_eq!(FileKind::from_path("README"), None);
        assert_eq!(FileKind::from_path("a.exe"), None);
    }
}
