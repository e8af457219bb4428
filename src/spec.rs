//! Playlist spec document model
//!
//! The spec is a YAML document with two optional top-level keys, `tags` and
//! `combiner`, each a recursive folder tree. Folder nodes declare a `name`
//! and a list of `playlists`; leaves are either bare strings or records
//! carrying a `tag_content` (tags) / `expression` (combiner) plus an
//! optional display `name`.

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::Path;

/// Top-level playlist spec with its two optional sections.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PlaylistSpec {
    /// Folder tree whose leaves name tags
    pub tags: Option<SpecFolder>,

    /// Folder tree whose leaves are combiner expressions
    pub combiner: Option<SpecFolder>,
}

/// A folder node in the spec tree.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpecFolder {
    pub name: String,
    pub playlists: Vec<SpecNode>,
}

/// A node in the spec tree: a nested folder or a leaf.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SpecNode {
    Folder(SpecFolder),
    Renamed(RenamedLeaf),
    Plain(String),
}

/// A leaf with separate content and display name. `tag_content` is the
/// canonical field; `expression` is accepted as an alias in combiner trees.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RenamedLeaf {
    #[serde(alias = "expression")]
    pub tag_content: String,
    pub name: Option<String>,
}

impl SpecNode {
    /// Content of a leaf node (tag name or expression); `None` for folders.
    pub fn content(&self) -> Option<&str> {
        match self {
            SpecNode::Folder(_) => None,
            SpecNode::Renamed(leaf) => Some(&leaf.tag_content),
            SpecNode::Plain(content) => Some(content),
        }
    }

    /// Display name of a leaf node: the rename when present, otherwise the
    /// content itself. `None` for folders.
    pub fn display_name(&self) -> Option<&str> {
        match self {
            SpecNode::Folder(_) => None,
            SpecNode::Renamed(leaf) => Some(leaf.name.as_deref().unwrap_or(&leaf.tag_content)),
            SpecNode::Plain(content) => Some(content),
        }
    }
}

impl PlaylistSpec {
    /// Parse a spec from YAML text.
    pub fn from_yaml(text: &str) -> Result<Self> {
        let spec: PlaylistSpec =
            serde_yaml::from_str(text).map_err(|err| Error::Spec(err.to_string()))?;
        spec.validate()?;
        Ok(spec)
    }

    /// Load a spec from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|err| Error::Spec(format!("cannot read {}: {err}", path.display())))?;
        Self::from_yaml(&text)
    }

    /// Whether the spec declares anything to build.
    pub fn is_empty(&self) -> bool {
        self.tags.is_none() && self.combiner.is_none()
    }

    fn validate(&self) -> Result<()> {
        for folder in [&self.tags, &self.combiner].into_iter().flatten() {
            validate_folder(folder)?;
        }
        Ok(())
    }
}

fn validate_folder(folder: &SpecFolder) -> Result<()> {
    if folder.name.trim().is_empty() {
        return Err(Error::Spec("folder with an empty name".to_string()));
    }
    for node in &folder.playlists {
        match node {
            SpecNode::Folder(inner) => validate_folder(inner)?,
            SpecNode::Renamed(leaf) if leaf.tag_content.trim().is_empty() => {
                return Err(Error::Spec(format!(
                    "leaf with empty content in folder \"{}\"",
                    folder.name
                )));
            }
            SpecNode::Plain(content) if content.trim().is_empty() => {
                return Err(Error::Spec(format!(
                    "empty leaf in folder \"{}\"",
                    folder.name
                )));
            }
            _ => {}
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_bare_string_leaves() {
        let spec = PlaylistSpec::from_yaml(
            "tags:\n  name: Root\n  playlists:\n    - House\n    - Techno\n",
        )
        .unwrap();
        let tags = spec.tags.unwrap();
        assert_eq!(tags.name, "Root");
        assert_eq!(tags.playlists.len(), 2);
        assert_eq!(tags.playlists[0].content(), Some("House"));
    }

    #[test]
    fn test_parse_renamed_leaf() {
        let spec = PlaylistSpec::from_yaml(
            "tags:\n  name: Root\n  playlists:\n    - tag_content: Hip Hop\n      name: Rap\n",
        )
        .unwrap();
        let tags = spec.tags.unwrap();
        assert_eq!(tags.playlists[0].content(), Some("Hip Hop"));
        assert_eq!(tags.playlists[0].display_name(), Some("Rap"));
    }

    #[test]
    fn test_parse_expression_alias() {
        let spec = PlaylistSpec::from_yaml(
            "combiner:\n  name: Combos\n  playlists:\n    - expression: House & Techno\n      name: Crossover\n",
        )
        .unwrap();
        let combiner = spec.combiner.unwrap();
        assert_eq!(combiner.playlists[0].content(), Some("House & Techno"));
        assert_eq!(combiner.playlists[0].display_name(), Some("Crossover"));
    }

    #[test]
    fn test_parse_nested_folders() {
        let spec = PlaylistSpec::from_yaml(
            "tags:\n  name: Root\n  playlists:\n    - name: Styles\n      playlists:\n        - House\n",
        )
        .unwrap();
        let tags = spec.tags.unwrap();
        match &tags.playlists[0] {
            SpecNode::Folder(folder) => assert_eq!(folder.name, "Styles"),
            other => panic!("expected folder, got {other:?}"),
        }
    }

    #[test]
    fn test_malformed_leaf_is_spec_error() {
        let err = PlaylistSpec::from_yaml(
            "tags:\n  name: Root\n  playlists:\n    - nonsense_key: 3\n",
        )
        .unwrap_err();
        assert!(matches!(err, Error::Spec(_)));
    }

    #[test]
    fn test_empty_leaf_rejected() {
        let err =
            PlaylistSpec::from_yaml("tags:\n  name: Root\n  playlists:\n    - \"\"\n").unwrap_err();
        assert!(matches!(err, Error::Spec(_)));
    }
}
