use std::path::{Path, PathBuf};

use scanlink_frame::Identifier;
use tracing::{debug, info};

use crate::error::{NodeError, Result};

/// A rectangle of the captured image, in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Region {
    pub fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// The band of `height` rows directly under a barcode whose bottom edge is at `bottom`.
    pub fn below(bottom: u32, width: u32, height: u32) -> Self {
        Self::new(0, bottom, width, height)
    }
}

/// A detected barcode and where its label text is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trigger {
    /// The decoded barcode value, not yet checked for length.
    pub code: String,
    /// Region to crop and compress into the payload.
    pub region: Region,
}

/// The camera pipeline the sender drives.
///
/// Barcode detection, cropping and compression live behind this seam.
pub trait Imaging {
    type Capture;

    /// Look for a qualifying barcode in a capture.
    fn detect_trigger(&self, capture: &Self::Capture) -> Option<Trigger>;

    /// Crop `region` out of the capture and compress it.
    fn extract_payload(&self, capture: &Self::Capture, region: Region) -> Result<Vec<u8>>;
}

/// Operator feedback after a frame went out (an LED on the camera board).
pub trait Indicator: Send {
    fn acknowledge(&mut self, identifier: &Identifier);
}

/// Indicator that only logs.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogIndicator;

impl Indicator for LogIndicator {
    fn acknowledge(&mut self, identifier: &Identifier) {
        info!(%identifier, "frame sent");
    }
}

/// A pre-cropped, pre-compressed image on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileCapture {
    pub path: PathBuf,
    /// File stem, taken as the barcode value.
    pub code: Option<String>,
}

/// Imaging source backed by a directory of `<barcode>.<ext>` image files.
///
/// Lets a host stand in for the camera: every file is one capture whose
/// barcode is the file stem and whose payload is the file contents.
#[derive(Debug, Clone)]
pub struct DirectoryImaging {
    dir: PathBuf,
}

impl DirectoryImaging {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// List the current captures, sorted by path.
    pub fn scan(&self) -> Result<Vec<FileCapture>> {
        let entries = std::fs::read_dir(&self.dir).map_err(|err| {
            NodeError::Imaging(format!("cannot read {}: {err}", self.dir.display()))
        })?;

        let mut captures = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|err| NodeError::Imaging(err.to_string()))?;
            let path = entry.path();
            if !path.is_file() {
                continue;
            }
            let code = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .map(str::to_string);
            captures.push(FileCapture { path, code });
        }
        captures.sort_by(|a, b| a.path.cmp(&b.path));
        debug!(dir = %self.dir.display(), count = captures.len(), "scanned capture directory");
        Ok(captures)
    }
}

impl Imaging for DirectoryImaging {
    type Capture = FileCapture;

    fn detect_trigger(&self, capture: &FileCapture) -> Option<Trigger> {
        capture.code.as_ref().map(|code| Trigger {
            code: code.clone(),
            // Files are already cropped; the region is informational.
            region: Region::new(0, 0, 0, 0),
        })
    }

    fn extract_payload(&self, capture: &FileCapture, _region: Region) -> Result<Vec<u8>> {
        std::fs::read(&capture.path).map_err(|err| {
            NodeError::Imaging(format!("cannot read {}: {err}", capture.path.display()))
        })
    }
}
