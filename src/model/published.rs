use std::path::Path;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Offer ids that already have a page. Stored on disk as a json array.
#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq, Eq)]
#[serde(transparent)]
pub struct PublishedSet(IndexSet<String>);

impl PublishedSet {
    /// Read the set from `path`. A missing or corrupt file reads as empty.
    pub fn load(path: &Path) -> Self {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Self::default(),
            Err(err) => {
                tracing::warn!("couldn't read {}, starting empty: {}", path.display(), err);
                return Self::default();
            }
        };

        match serde_json::from_str(&data) {
            Ok(set) => set,
            Err(err) => {
                tracing::warn!("{} is corrupt, starting empty: {}", path.display(), err);
                Self::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> crate::model::Result<()> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let data = serde_json::to_string_pretty(self)?;
        let mut tmp = path.as_os_str().to_owned();
        tmp.push(".tmp");
        std::fs::write(&tmp, data)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains(id)
    }

    pub fn insert(&mut self, id: impl Into<String>) -> bool {
        self.0.insert(id.into())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let set = PublishedSet::load(&dir.path().join("nope.json"));
        assert!(set.is_empty());
    }

    #[test]
    fn corrupt_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("published.json");

        std::fs::write(&path, "[\"a\", ").unwrap();
        assert!(PublishedSet::load(&path).is_empty());

        std::fs::write(&path, "{\"a\": 1}").unwrap();
        assert!(PublishedSet::load(&path).is_empty());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state").join("published.json");

        let mut set = PublishedSet::default();
        set.insert("b");
        set.insert("a");
        assert!(!set.insert("b"));
        set.save(&path).unwrap();

        let loaded = PublishedSet::load(&path);
        assert_eq!(loaded, set);
        assert_eq!(loaded.iter().collect::<Vec<_>>(), vec!["b", "a"]);
        assert!(!dir.path().join("state").join("published.json.tmp").exists());
    }

    #[test]
    fn reads_plain_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("published.json");
        std::fs::write(&path, r#"["x", "y", "x"]"#).unwrap();

        let set = PublishedSet::load(&path);
        assert_eq!(set.len(), 2);
        assert!(set.contains("x"));
        assert!(set.contains("y"));
        assert!(!set.contains("z"));
    }
}
