use std::fmt;

/// Dot-separated address into a [`Value`](crate::Value) tree.
///
/// Each segment is interpreted by the container it meets: a list index
/// (negative counts from the end), a map key, or a record field name. The
/// empty string addresses the root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct KeyPath {
    raw: String,
    segments: Vec<String>,
}

impl KeyPath {
    pub fn parse(raw: &str) -> Self {
        let segments = if raw.is_empty() {
            Vec::new()
        } else {
            raw.split('.').map(str::to_string).collect()
        };
        Self {
            raw: raw.to_string(),
            segments,
        }
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Parent segments and the final segment, or `None` for the root.
    pub fn split_last(&self) -> Option<(&[String], &str)> {
        self.segments
            .split_last()
            .map(|(last, parents)| (parents, last.as_str()))
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Path extended by one segment.
    pub fn join(&self, segment: impl fmt::Display) -> Self {
        if self.is_root() {
            Self::parse(&segment.to_string())
        } else {
            Self::parse(&format!("{}.{}", self.raw, segment))
        }
    }
}

impl From<&str> for KeyPath {
    fn from(raw: &str) -> Self {
        Self::parse(raw)
    }
}

impl From<String> for KeyPath {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<&String> for KeyPath {
    fn from(raw: &String) -> Self {
        Self::parse(raw)
    }
}

impl From<&KeyPath> for KeyPath {
    fn from(path: &KeyPath) -> Self {
        path.clone()
    }
}

impl fmt::Display for KeyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
