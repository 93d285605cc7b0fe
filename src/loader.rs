use futures::future::BoxFuture;
use image::{ImageFormat, ImageReader, RgbaImage};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::io::Cursor;
use std::path::PathBuf;

use crate::error::{InputError, LoadError};

/// Opaque reference to a displayable image: a path, a key, a URL.
/// What it means is up to the `ImageLoader` that resolves it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRef(String);

impl ImageRef {
    pub fn new(reference: impl Into<String>) -> Self {
        Self(reference.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Asynchronously resolves image references into RGBA rasters.
///
/// Every load is independent; callers await them together and decide per
/// image what a failure means.
pub trait ImageLoader: Send + Sync {
    fn load<'a>(&'a self, image: &'a ImageRef) -> BoxFuture<'a, Result<RgbaImage, LoadError>>;
}

/// Decode encoded image bytes to RGBA
pub fn decode_rgba(reference: &ImageRef, bytes: &[u8]) -> Result<RgbaImage, LoadError> {
    image::load_from_memory(bytes)
        .map(|image| image.to_rgba8())
        .map_err(|source| LoadError::Decode {
            reference: reference.to_string(),
            source,
        })
}

/// Metadata of an accepted upload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UploadInfo {
    pub format: ImageFormat,
    pub width: u32,
    pub height: u32,
}

/// Check that uploaded bytes are a raster format we can decode and read
/// its natural size without decoding the pixels.
///
/// Conversion of camera-specific formats happens before this point.
pub fn inspect_upload(file_name: &str, bytes: &[u8]) -> Result<UploadInfo, InputError> {
    let unsupported = || InputError::UnsupportedFile(file_name.to_owned());

    let format = image::guess_format(bytes).map_err(|_| unsupported())?;
    let (width, height) = ImageReader::with_format(Cursor::new(bytes), format)
        .into_dimensions()
        .map_err(|_| unsupported())?;
    if width == 0 || height == 0 {
        return Err(unsupported());
    }

    Ok(UploadInfo { format, width, height })
}

/// Loads images from the local file system, relative to a root directory
#[derive(Debug, Clone)]
pub struct FsImageLoader {
    root: PathBuf,
}

impl FsImageLoader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn resolve(&self, image: &ImageRef) -> PathBuf {
        // Absolute references ignore the root
        self.root.join(image.as_str())
    }
}

impl ImageLoader for FsImageLoader {
    fn load<'a>(&'a self, image: &'a ImageRef) -> BoxFuture<'a, Result<RgbaImage, LoadError>> {
        Box::pin(async move {
            let path = self.resolve(image);
            let bytes = std::fs::read(&path).map_err(|source| match source.kind() {
                std::io::ErrorKind::NotFound => LoadError::NotFound(path.display().to_string()),
                _ => LoadError::Io { path: path.clone(), source },
            })?;
            log::debug!("Read {} ({} bytes)", path.display(), bytes.len());
            decode_rgba(image, &bytes)
        })
    }
}

enum Entry {
    Decoded(RgbaImage),
    Encoded(Vec<u8>),
}

/// In-memory image registry: uploads held as bytes, generated images as
/// rasters. Safe to share; entries can be added while loads are pending.
#[derive(Default)]
pub struct MemoryImageLoader {
    entries: RwLock<HashMap<ImageRef, Entry>>,
}

impl fmt::Debug for MemoryImageLoader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryImageLoader")
            .field("entries", &format!("<{} images>", self.entries.read().len()))
            .finish()
    }
}

impl MemoryImageLoader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_image(&self, image: ImageRef, pixels: RgbaImage) {
        self.entries.write().insert(image, Entry::Decoded(pixels));
    }

    pub fn insert_bytes(&self, image: ImageRef, bytes: Vec<u8>) {
        self.entries.write().insert(image, Entry::Encoded(bytes));
    }

    pub fn remove(&self, image: &ImageRef) -> bool {
        self.entries.write().remove(image).is_some()
    }

    pub fn contains(&self, image: &ImageRef) -> bool {
        self.entries.read().contains_key(image)
    }
}

impl ImageLoader for MemoryImageLoader {
    fn load<'a>(&'a self, image: &'a ImageRef) -> BoxFuture<'a, Result<RgbaImage, LoadError>> {
        Box::pin(async move {
            let entries = self.entries.read();
            match entries.get(image) {
                Some(Entry::Decoded(pixels)) => Ok(pixels.clone()),
                Some(Entry::Encoded(bytes)) => decode_rgba(image, bytes),
                None => Err(LoadError::NotFound(image.to_string())),
            }
        })
    }
}
