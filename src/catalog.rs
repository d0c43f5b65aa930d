//! Face geometry catalog keyed by face number.
//!
//! Themes ship their own copies of a face under a shifted key, so lookups
//! use `face + theme_offset`.

use crate::config::FaceGeometry;
use crate::error::{GaugeError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

#[derive(Debug, Clone, Default)]
pub struct FaceCatalog {
    faces: HashMap<u32, FaceGeometry>,
}

#[derive(Deserialize)]
struct CatalogFile {
    faces: Vec<CatalogEntry>,
}

#[derive(Deserialize)]
struct CatalogEntry {
    id: u32,
    #[serde(flatten)]
    geometry: FaceGeometry,
}

impl FaceCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses `{ "faces": [ { "id": 1, ...geometry fields } ] }`.
    ///
    /// Missing geometry fields take their defaults; a repeated id is an error.
    pub fn from_json(text: &str) -> Result<Self> {
        let file: CatalogFile = serde_json::from_str(text)?;
        let mut catalog = Self::new();
        for entry in file.faces {
            if catalog.faces.contains_key(&entry.id) {
                return Err(GaugeError::Catalog(format!("duplicate face id {}", entry.id)));
            }
            catalog.insert(entry.id, entry.geometry);
        }
        info!(faces = catalog.faces.len(), "face catalog loaded");
        Ok(catalog)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_json(&text)
    }

    pub fn insert(&mut self, id: u32, geometry: FaceGeometry) -> Option<FaceGeometry> {
        self.faces.insert(id, geometry)
    }

    pub fn len(&self) -> usize {
        self.faces.len()
    }

    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    pub fn resolve(&self, face: u8, theme_offset: u32) -> Result<&FaceGeometry> {
        let key = face as u32 + theme_offset;
        debug!(face, theme_offset, key, "resolving face");
        self.faces
            .get(&key)
            .ok_or_else(|| GaugeError::Catalog(format!("no face {key} (face {face} + theme offset {theme_offset})")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const CATALOG: &str = r#"{
        "faces": [
            { "id": 3, "angle_span": 3.14159, "range_width": 8.0 },
            { "id": 103, "angle_span": 4.71239,
              "value_slot": { "x": 70.0, "y": 120.0, "width": 60.0, "height": 24.0 } }
        ]
    }"#;

    #[test]
    fn test_resolve_applies_theme_offset() {
        let catalog = FaceCatalog::from_json(CATALOG).unwrap();
        assert_eq!(catalog.len(), 2);
        assert_eq!(catalog.resolve(3, 0).unwrap().range_width, 8.0);
        let themed = catalog.resolve(3, 100).unwrap();
        assert!(themed.value_slot.is_some());
        assert_eq!(themed.range_width, FaceGeometry::default().range_width);
    }

    #[test]
    fn test_unknown_face_is_catalog_error() {
        let catalog = FaceCatalog::from_json(CATALOG).unwrap();
        assert!(matches!(catalog.resolve(9, 0), Err(GaugeError::Catalog(_))));
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let text = r#"{ "faces": [ { "id": 1 }, { "id": 1 } ] }"#;
        assert!(matches!(FaceCatalog::from_json(text), Err(GaugeError::Catalog(_))));
        assert!(matches!(FaceCatalog::from_json("{"), Err(GaugeError::Json(_))));
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("faces.json");
        std::fs::write(&path, CATALOG).unwrap();
        assert_eq!(FaceCatalog::from_file(&path).unwrap().len(), 2);
    }
}
