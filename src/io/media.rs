// Copyright (c) 2025, Jason Jenkins
// SPDX-License-Identifier: BSD-3-Clause

//! Media loading (images) and metadata probing.
//!
//! Decoding and probing run on background threads; results come back over
//! a channel and are applied by item id on the UI thread.

use crate::error::{OverlayError, Result as OverlayResult};
use crate::models::item::{ItemId, ItemKind};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver, Sender};
use std::sync::Arc;

/// Decoded RGBA image.
pub struct LoadedImage {
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u8>,
}

/// Load an image file and convert it to RGBA8.
pub fn load_image(path: &Path) -> Result<LoadedImage> {
    let img = image::open(path).with_context(|| format!("Failed to open image {}", path.display()))?;
    let rgba = img.to_rgba8();
    let (width, height) = rgba.dimensions();
    Ok(LoadedImage {
        width,
        height,
        pixels: rgba.into_raw(),
    })
}

/// Intrinsic properties of a media source.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct MediaMetadata {
    /// Playable length in seconds
    pub duration: Option<f64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

impl MediaMetadata {
    pub fn aspect(&self) -> Option<f64> {
        match (self.width, self.height) {
            (Some(w), Some(h)) if w > 0 && h > 0 => Some(w as f64 / h as f64),
            _ => None,
        }
    }
}

/// Reads intrinsic metadata of an item's media source.
pub trait MediaProbe: Send + Sync {
    fn probe(&self, kind: ItemKind, url: &str) -> OverlayResult<MediaMetadata>;
}

/// Resolve an item url to a local file, if it names one.
pub fn resolve_local(url: &str, base_dir: Option<&Path>) -> Option<PathBuf> {
    let url = url.trim();
    if url.is_empty() || url.starts_with("http://") || url.starts_with("https://") {
        return None;
    }
    let path = PathBuf::from(url.strip_prefix("file://").unwrap_or(url));
    match base_dir {
        Some(base) if path.is_relative() => Some(base.join(path)),
        _ => Some(path),
    }
}

/// Probes local files: image dimensions through the `image` crate.
///
/// Video and audio containers are not decoded, so their duration stays
/// unknown and the authored interval is kept.
#[derive(Debug, Clone, Default)]
pub struct FileProbe {
    pub base_dir: Option<PathBuf>,
}

impl FileProbe {
    pub fn new(base_dir: Option<PathBuf>) -> Self {
        Self { base_dir }
    }
}

impl MediaProbe for FileProbe {
    fn probe(&self, kind: ItemKind, url: &str) -> OverlayResult<MediaMetadata> {
        let unavailable = |reason: String| OverlayError::MediaUnavailable {
            url: url.to_string(),
            reason,
        };
        if kind.is_media() {
            return Err(unavailable("duration probing is not supported for clips".into()));
        }
        let path = resolve_local(url, self.base_dir.as_deref())
            .ok_or_else(|| unavailable("not a local file".into()))?;
        let (width, height) = image::image_dimensions(&path).map_err(|e| unavailable(e.to_string()))?;
        Ok(MediaMetadata {
            duration: None,
            width: Some(width),
            height: Some(height),
        })
    }
}

/// Outcome of a background media job.
pub enum MediaEvent {
    Image { id: ItemId, image: LoadedImage },
    Metadata { id: ItemId, metadata: MediaMetadata, added: bool },
    Failed { id: ItemId, reason: String },
}

/// Runs decoding and probing off the UI thread.
pub struct MediaLoader {
    probe: Arc<dyn MediaProbe>,
    base_dir: Option<PathBuf>,
    sender: Sender<MediaEvent>,
    receiver: Receiver<MediaEvent>,
}

impl MediaLoader {
    pub fn new(probe: Arc<dyn MediaProbe>, base_dir: Option<PathBuf>) -> Self {
        let (sender, receiver) = channel();
        Self {
            probe,
            base_dir,
            sender,
            receiver,
        }
    }

    /// Decode the image of an item in the background.
    pub fn request_image(&self, id: ItemId, url: &str) {
        let Some(path) = resolve_local(url, self.base_dir.as_deref()) else {
            log::debug!("Image {} is not a local file, not loading", url);
            return;
        };
        let sender = self.sender.clone();
        std::thread::spawn(move || {
            let event = match load_image(&path) {
                Ok(image) => {
                    log::info!("Loaded image: {} ({}x{})", path.display(), image.width, image.height);
                    MediaEvent::Image { id, image }
                }
                Err(e) => MediaEvent::Failed {
                    id,
                    reason: format!("{:#}", e),
                },
            };
            let _ = sender.send(event);
        });
    }

    /// Probe intrinsic metadata in the background. `added` tells whether the
    /// item was just created.
    pub fn request_metadata(&self, id: ItemId, kind: ItemKind, url: &str, added: bool) {
        let probe = Arc::clone(&self.probe);
        let sender = self.sender.clone();
        let url = url.to_string();
        std::thread::spawn(move || {
            let event = match probe.probe(kind, &url) {
                Ok(metadata) => MediaEvent::Metadata { id, metadata, added },
                Err(e) => MediaEvent::Failed {
                    id,
                    reason: e.to_string(),
                },
            };
            let _ = sender.send(event);
        });
    }

    /// Finished jobs since the last poll.
    pub fn poll(&self) -> Vec<MediaEvent> {
        self.receiver.try_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};
    use tempfile::tempdir;

    #[test]
    fn test_resolve_local() {
        assert_eq!(resolve_local("https://x/y.png", None), None);
        assert_eq!(resolve_local("", None), None);
        assert_eq!(
            resolve_local("media/a.png", Some(Path::new("/data"))),
            Some(PathBuf::from("/data/media/a.png"))
        );
        assert_eq!(resolve_local("file:///tmp/a.png", None), Some(PathBuf::from("/tmp/a.png")));
    }

    #[test]
    fn test_file_probe_reads_image_size() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("pixel.png");
        image::RgbaImage::new(4, 2).save(&path).unwrap();

        let probe = FileProbe::new(Some(dir.path().to_path_buf()));
        let metadata = probe.probe(ItemKind::Image, "pixel.png").unwrap();
        assert_eq!((metadata.width, metadata.height), (Some(4), Some(2)));
        assert_eq!(metadata.aspect(), Some(2.0));
        assert!(probe.probe(ItemKind::Video, "clip.mp4").is_err());
    }

    #[test]
    fn test_loader_reports_failures() {
        let loader = MediaLoader::new(Arc::new(FileProbe::default()), None);
        loader.request_metadata(ItemId(9), ItemKind::Audio, "clip.mp3", true);

        let deadline = Instant::now() + Duration::from_secs(5);
        let mut events = Vec::new();
        while events.is_empty() && Instant::now() < deadline {
            events = loader.poll();
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(matches!(events.as_slice(), [MediaEvent::Failed { id: ItemId(9), .. }]));
    }
}
