use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// The 11-character token YouTube uses to name a video.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VideoId(String);

impl VideoId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for VideoId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Access level reported by the platform (`status.privacyStatus`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Visibility {
    Public,
    Unlisted,
    Private,
    Other(String),
}

impl Visibility {
    pub fn as_str(&self) -> &str {
        match self {
            Visibility::Public => "public",
            Visibility::Unlisted => "unlisted",
            Visibility::Private => "private",
            Visibility::Other(status) => status,
        }
    }

    /// Judges can only open public and unlisted videos.
    pub fn is_playable(&self) -> bool {
        matches!(self, Visibility::Public | Visibility::Unlisted)
    }
}

impl From<String> for Visibility {
    fn from(status: String) -> Self {
        match status.as_str() {
            "public" => Visibility::Public,
            "unlisted" => Visibility::Unlisted,
            "private" => Visibility::Private,
            _ => Visibility::Other(status),
        }
    }
}

impl From<&str> for Visibility {
    fn from(status: &str) -> Self {
        Visibility::from(status.to_string())
    }
}

impl From<Visibility> for String {
    fn from(visibility: Visibility) -> Self {
        visibility.as_str().to_string()
    }
}

impl fmt::Display for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// ISO-8601 duration, e.g. `PT3M33S`.
    pub duration: String,
    pub visibility: Visibility,
}

impl MetadataRecord {
    pub fn new(duration: impl Into<String>, visibility: impl Into<Visibility>) -> Self {
        Self {
            duration: duration.into(),
            visibility: visibility.into(),
        }
    }
}

/// Per-sheet lookup built from one batched fetch. Ids the API did not
/// return are simply absent.
pub type MetadataTable = HashMap<VideoId, MetadataRecord>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visibility_from_status() {
        assert_eq!(Visibility::from("public"), Visibility::Public);
        assert_eq!(Visibility::from("unlisted"), Visibility::Unlisted);
        assert_eq!(Visibility::from("private"), Visibility::Private);
        assert_eq!(
            Visibility::from("privacyStatusUnspecified"),
            Visibility::Other("privacyStatusUnspecified".to_string())
        );
    }

    #[test]
    fn test_visibility_playable() {
        assert!(Visibility::Public.is_playable());
        assert!(Visibility::Unlisted.is_playable());
        assert!(!Visibility::Private.is_playable());
        assert!(!Visibility::Other("blocked".into()).is_playable());
    }

    #[test]
    fn test_visibility_serde_round_trip_uses_plain_status() {
        let json = serde_json::to_string(&Visibility::Unlisted).unwrap();
        assert_eq!(json, "\"unlisted\"");
        let parsed: Visibility = serde_json::from_str("\"weird\"").unwrap();
        assert_eq!(parsed.as_str(), "weird");
    }
}
