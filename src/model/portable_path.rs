//! Path Convention Conversion
//!
//! Model manifests record filesystem paths in the convention of the machine
//! that exported them. A manifest exported on Windows carries
//! `C:\data\tomato`-style paths, which are meaningless when the model is
//! loaded on a POSIX host, and vice versa.
//!
//! Paths are stored as `{ "style": "windows" | "posix", "path": "..." }` and
//! rebuilt as a native [`PathBuf`] while the manifest is deserialized. Nothing
//! here touches global state; the conversion only runs through the serde
//! helpers below.

use std::path::{Path, PathBuf, MAIN_SEPARATOR_STR};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Path convention of the platform that wrote a path
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PathStyle {
    Posix,
    Windows,
}

impl PathStyle {
    /// Convention of the current platform
    pub fn native() -> Self {
        if cfg!(windows) {
            PathStyle::Windows
        } else {
            PathStyle::Posix
        }
    }

    /// Guess the convention of a bare path string
    ///
    /// Backslashes or a leading drive letter mean Windows.
    pub fn infer(raw: &str) -> Self {
        let bytes = raw.as_bytes();
        let has_drive = bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':';
        if has_drive || raw.contains('\\') {
            PathStyle::Windows
        } else {
            PathStyle::Posix
        }
    }

    fn separators(&self) -> &'static [char] {
        match self {
            PathStyle::Posix => &['/'],
            PathStyle::Windows => &['\\', '/'],
        }
    }
}

/// Rebuild a path written in `style` as a native path
///
/// Components are kept verbatim, including a Windows drive prefix such as
/// `C:`, which becomes an ordinary leading component on POSIX hosts.
pub fn to_native(raw: &str, style: PathStyle) -> PathBuf {
    if style == PathStyle::native() {
        return PathBuf::from(raw);
    }

    let separators = style.separators();
    let mut native = PathBuf::new();
    if raw.starts_with(separators) {
        native.push(MAIN_SEPARATOR_STR);
    }
    for component in raw.split(separators).filter(|c| !c.is_empty()) {
        native.push(component);
    }
    native
}

#[derive(Serialize, Deserialize)]
#[serde(untagged)]
enum RecordedPath {
    Tagged { style: PathStyle, path: String },
    Bare(String),
}

impl RecordedPath {
    fn from_native(path: &Path) -> Self {
        RecordedPath::Tagged {
            style: PathStyle::native(),
            path: path.to_string_lossy().into_owned(),
        }
    }

    fn into_native(self) -> PathBuf {
        match self {
            RecordedPath::Tagged { style, path } => to_native(&path, style),
            RecordedPath::Bare(path) => {
                let style = PathStyle::infer(&path);
                to_native(&path, style)
            }
        }
    }
}

/// Serde helpers for a `PathBuf` field
pub mod native_path {
    use super::*;

    pub fn serialize<S: Serializer>(path: &Path, serializer: S) -> Result<S::Ok, S::Error> {
        RecordedPath::from_native(path).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<PathBuf, D::Error> {
        RecordedPath::deserialize(deserializer).map(RecordedPath::into_native)
    }
}

/// Serde helpers for an `Option<PathBuf>` field
pub mod optional_native_path {
    use super::*;

    pub fn serialize<S: Serializer>(
        path: &Option<PathBuf>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        path.as_deref()
            .map(RecordedPath::from_native)
            .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<PathBuf>, D::Error> {
        Option::<RecordedPath>::deserialize(deserializer)
            .map(|recorded| recorded.map(RecordedPath::into_native))
    }
}
