//! Shared cache for panel, needle and hub artwork.
//!
//! Every key is loaded at most once: concurrent renders asking for the same
//! path block on the same cell while the first one loads it. Cached assets
//! are immutable; a render scales or transforms its own copy of the
//! placement, never the cached object.

use crate::error::AssetError;
use image::RgbaImage;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, OnceLock};
use tracing::{debug, error};

/// An SVG document reduced to what is needed to merge it into another one.
#[derive(Debug, Clone, PartialEq)]
pub struct SvgFragment {
    pub view_box: Option<(f64, f64, f64, f64)>,
    /// Everything between the root `<svg>` tags.
    pub body: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum AssetData {
    Raster(RgbaImage),
    Vector(SvgFragment),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Asset {
    pub path: PathBuf,
    pub width: f64,
    pub height: f64,
    pub data: AssetData,
}

type Slot = Arc<OnceLock<Result<Arc<Asset>, AssetError>>>;

#[derive(Debug, Default)]
pub struct AssetCache {
    root: Option<PathBuf>,
    entries: Mutex<HashMap<PathBuf, Slot>>,
    loads: AtomicUsize,
}

impl AssetCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Relative asset paths are resolved against `root`.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
            ..Self::default()
        }
    }

    pub fn get(&self, path: &Path) -> Result<Arc<Asset>, AssetError> {
        let slot = {
            let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
            entries.entry(path.to_path_buf()).or_default().clone()
        };
        slot.get_or_init(|| {
            self.loads.fetch_add(1, Ordering::Relaxed);
            let resolved = match &self.root {
                Some(root) if path.is_relative() => root.join(path),
                _ => path.to_path_buf(),
            };
            let loaded = load_asset(&resolved).map(Arc::new);
            match &loaded {
                Ok(asset) => debug!(path = ?resolved, width = asset.width, height = asset.height, "asset loaded"),
                Err(e) => error!(path = ?resolved, error = %e, "asset load failed"),
            }
            loaded
        })
        .clone()
    }

    /// Drops a cached entry so the next `get` reloads it.
    pub fn invalidate(&self, path: &Path) {
        let mut entries = self.entries.lock().unwrap_or_else(|p| p.into_inner());
        entries.remove(path);
    }

    /// Number of loads actually performed.
    pub fn load_count(&self) -> usize {
        self.loads.load(Ordering::Relaxed)
    }
}

fn load_asset(path: &Path) -> Result<Asset, AssetError> {
    let extension = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase());
    let bytes = match extension.as_deref() {
        Some("svg") | Some("png") => std::fs::read(path).map_err(|e| AssetError::Io {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?,
        _ => {
            return Err(AssetError::Unsupported {
                path: path.to_path_buf(),
            })
        }
    };

    let decode_error = |message: String| AssetError::Decode {
        path: path.to_path_buf(),
        message,
    };

    if extension.as_deref() == Some("svg") {
        let text = String::from_utf8(bytes).map_err(|e| decode_error(e.to_string()))?;
        let (width, height, fragment) = parse_svg(&text).map_err(decode_error)?;
        return Ok(Asset {
            path: path.to_path_buf(),
            width,
            height,
            data: AssetData::Vector(fragment),
        });
    }

    let image = image::load_from_memory(&bytes)
        .map_err(|e| decode_error(e.to_string()))?
        .to_rgba8();
    Ok(Asset {
        path: path.to_path_buf(),
        width: image.width() as f64,
        height: image.height() as f64,
        data: AssetData::Raster(image),
    })
}

/// Converts an SVG length to pixels; percentages have no absolute size.
fn svg_length(value: &str) -> Option<f64> {
    const UNITS: [(&str, f64); 6] = [
        ("px", 1.0),
        ("pt", 96.0 / 72.0),
        ("pc", 16.0),
        ("mm", 96.0 / 25.4),
        ("cm", 96.0 / 2.54),
        ("in", 96.0),
    ];
    let value = value.trim();
    let (number, scale) = UNITS
        .iter()
        .find_map(|(unit, scale)| value.strip_suffix(unit).map(|n| (n, *scale)))
        .unwrap_or((value, 1.0));
    number
        .trim_end()
        .parse::<f64>()
        .ok()
        .filter(|n| n.is_finite() && *n > 0.0)
        .map(|n| n * scale)
}

fn parse_view_box(value: &str) -> Option<(f64, f64, f64, f64)> {
    let parts: Vec<f64> = value
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|p| !p.is_empty())
        .map(str::parse)
        .collect::<Result<_, _>>()
        .ok()?;
    match parts.as_slice() {
        [x, y, w, h] => Some((*x, *y, *w, *h)),
        _ => None,
    }
}

/// Extracts the size and inner markup of an SVG document.
pub fn parse_svg(text: &str) -> Result<(f64, f64, SvgFragment), String> {
    let mut reader = Reader::from_str(text);

    let (root, self_closing) = loop {
        match reader.read_event() {
            Ok(Event::Start(e)) if e.local_name().as_ref() == b"svg" => break (e, false),
            Ok(Event::Empty(e)) if e.local_name().as_ref() == b"svg" => break (e, true),
            Ok(Event::Start(_) | Event::Empty(_)) => return Err("root element is not <svg>".into()),
            Ok(Event::Eof) => return Err("no <svg> element".into()),
            Ok(_) => {}
            Err(e) => return Err(format!("malformed svg: {e}")),
        }
    };

    let mut width = None;
    let mut height = None;
    let mut view_box = None;
    for attr in root.attributes().flatten() {
        let value = String::from_utf8_lossy(&attr.value);
        match attr.key.local_name().as_ref() {
            b"width" => width = svg_length(&value),
            b"height" => height = svg_length(&value),
            b"viewBox" => view_box = parse_view_box(&value),
            _ => {}
        }
    }

    let body = if self_closing {
        String::new()
    } else {
        let span = reader
            .read_to_end(root.name())
            .map_err(|e| format!("malformed svg: {e}"))?;
        let range = usize::try_from(span.start).map_err(|e| e.to_string())?
            ..usize::try_from(span.end).map_err(|e| e.to_string())?;
        text.get(range)
            .ok_or("svg body out of bounds")?
            .trim()
            .to_string()
    };

    let width = width
        .or(view_box.map(|v| v.2))
        .ok_or("svg has neither width nor viewBox")?;
    let height = height
        .or(view_box.map(|v| v.3))
        .ok_or("svg has neither height nor viewBox")?;

    Ok((width, height, SvgFragment { view_box, body }))
}
