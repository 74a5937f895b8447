use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::FormatError;

/// One selectable map in `maps/manifest.json`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MapEntry {
    /// Display name.
    pub name: String,
    /// File name relative to the manifest's directory.
    pub file: String,
}

/// The map list; serialized as a bare JSON array.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct MapManifest {
    pub maps: Vec<MapEntry>,
}

impl MapManifest {
    pub fn from_json_str(payload: &str) -> Result<Self, FormatError> {
        Ok(serde_json::from_str(payload)?)
    }

    pub fn find(&self, name: &str) -> Option<&MapEntry> {
        self.maps.iter().find(|m| m.name == name)
    }

    /// Resolves an entry's file against the directory holding the manifest.
    pub fn resolve(&self, entry: &MapEntry, manifest_dir: impl AsRef<Path>) -> PathBuf {
        manifest_dir.as_ref().join(&entry.file)
    }
}

#[cfg(test)]
mod tests {
    use super::MapManifest;
    use std::path::Path;

    #[test]
    fn manifest_is_a_plain_array() {
        let m = MapManifest::from_json_str(
            r#"[{"name": "Canyon", "file": "canyon.json"}, {"name": "Edge", "file": "edge.json"}]"#,
        )
        .expect("parse");
        assert_eq!(m.maps.len(), 2);
        let edge = m.find("Edge").expect("entry");
        assert_eq!(m.resolve(edge, "maps"), Path::new("maps/edge.json"));
        assert!(m.find("Nope").is_none());
        assert_eq!(
            serde_json::to_string(&m).expect("serialize"),
            r#"[{"name":"Canyon","file":"canyon.json"},{"name":"Edge","file":"edge.json"}]"#
        );
    }
}
