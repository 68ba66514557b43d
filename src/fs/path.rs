//! Remote path parsing.

const SEPARATORS: [char; 2] = ['/', '\\'];

/// Ordered, non-empty components of a remote folder path.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PathSegments(Vec<String>);

impl PathSegments {
    /// Split `path` on `/` and `\`, dropping empty and whitespace-only parts.
    pub fn parse(path: &str) -> Self {
        Self(
            path.split(SEPARATORS)
                .filter(|s| !s.trim().is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Segments joined with `/`, for logging.
    pub fn display(&self) -> String {
        self.0.join("/")
    }
}

impl<'a> IntoIterator for &'a PathSegments {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Split an upload target into its folder portion and file name.
///
/// The file name is whatever follows the last separator. Returns `None`
/// when that name is blank (e.g. `"a/b/"`).
pub fn split_upload_path(path: &str) -> Option<(&str, &str)> {
    let (folder, name) = match path.rfind(SEPARATORS) {
        Some(idx) => (&path[..idx], &path[idx + 1..]),
        None => ("", path),
    };
    if name.trim().is_empty() {
        None
    } else {
        Some((folder, name))
    }
}
