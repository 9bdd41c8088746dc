use super::error::{Result, StoreError};
use std::fmt;

/// Characters the hosted store refuses inside a key.
const FORBIDDEN_KEY_CHARS: [char; 6] = ['.', '$', '#', '[', ']', '/'];

/// A `/`-delimited location in the hierarchical store.
///
/// Leading and trailing slashes are ignored and the empty path is the root.
/// Every segment is checked against the key rules of the hosted store, so a
/// `StorePath` can always be turned into a request URL without escaping
/// surprises.
///
/// # Examples
///
/// ```
/// use fantasy_admin::StorePath;
///
/// let managers = StorePath::parse("managers").unwrap();
/// let alice = managers.child("alice").unwrap();
/// assert_eq!(alice.to_string(), "managers/alice");
/// assert_eq!(alice.key(), Some("alice"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct StorePath {
    segments: Vec<String>,
}

impl StorePath {
    pub fn root() -> Self {
        Self::default()
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let mut path = Self::root();
        for segment in raw.split('/').filter(|s| !s.is_empty()) {
            path = path.child(segment)?;
        }
        Ok(path)
    }

    /// Top-level path for one of the crate's own collection names.
    pub(crate) fn top_level(name: &'static str) -> Self {
        Self {
            segments: vec![name.to_string()],
        }
    }

    /// Path of a direct child of this node.
    pub fn child(&self, key: &str) -> Result<Self> {
        validate_key(key)?;
        let mut segments = self.segments.clone();
        segments.push(key.to_string());
        Ok(Self { segments })
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Last segment, `None` for the root.
    pub fn key(&self) -> Option<&str> {
        self.segments.last().map(String::as_str)
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }
}

impl fmt::Display for StorePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("/"))
    }
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() {
        return Err(StoreError::InvalidArgument("empty path segment".into()));
    }
    if let Some(bad) = key
        .chars()
        .find(|c| FORBIDDEN_KEY_CHARS.contains(c) || c.is_ascii_control())
    {
        return Err(StoreError::InvalidArgument(format!(
            "key '{}' contains forbidden character {:?}",
            key.escape_debug(),
            bad
        )));
    }
    Ok(())
}
