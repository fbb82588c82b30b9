use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::core::ports::storer::FileStorer;
use crate::error::Error;

pub const IMAGE_DIR: &str = "images";
pub const ALLOWED_TYPES: [&str; 4] = ["jpg", "jpeg", "gif", "png"];

static DATA_URI: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(?:data:)?image/(\w+);(\w+),").expect("data URI pattern"));

// Browsers and form encoders drop trailing padding often enough that it is
// not worth rejecting.
const BASE64: GeneralPurpose = GeneralPurpose::new(&alphabet::STANDARD, GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent));

/// Location of a stored image, relative to the storage root.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoredPath(String);

impl StoredPath {
    pub fn new(path: impl Into<String>) -> Self {
        Self(path.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct DecodedImage {
    pub extension: String,
    pub content: Vec<u8>,
}

pub fn decode(payload: &str) -> Result<DecodedImage, Error> {
    let caps = DATA_URI.captures(payload).ok_or(Error::InvalidImageFormat)?;
    if &caps[2] != "base64" {
        return Err(Error::InvalidImageFormat);
    }
    let extension = caps[1].to_lowercase();
    if !ALLOWED_TYPES.contains(&extension.as_str()) {
        return Err(Error::UnsupportedImageType(extension));
    }
    let body = payload[caps[0].len()..].replace(' ', "+");
    let content = BASE64.decode(body)?;
    Ok(DecodedImage { extension, content })
}

pub struct ImageIngestor<F: FileStorer> {
    storer: F,
    dir: String,
}

impl<F: FileStorer> ImageIngestor<F> {
    pub fn new(storer: F) -> Self {
        Self::with_dir(storer, IMAGE_DIR)
    }

    pub fn with_dir(storer: F, dir: &str) -> Self {
        Self { storer, dir: dir.to_owned() }
    }

    pub fn dir(&self) -> &str {
        &self.dir
    }

    /// Creates the image directory so it can be served before the first upload.
    pub fn prepare(&self) -> Result<(), Error> {
        self.storer.ensure_dir(&self.dir)
    }

    pub fn ingest(&self, payload: &str) -> Result<StoredPath, Error> {
        let image = decode(payload)?;
        let filename = format!("{}.{}", Uuid::new_v4(), image.extension);
        let path = format!("{}/{}", self.dir, filename);
        self.storer.ensure_dir(&self.dir)?;
        self.storer.write(&path, &image.content)?;
        log::debug!("stored {} bytes of image data at {}", image.content.len(), path);
        Ok(StoredPath(path))
    }

    pub fn read(&self, path: &StoredPath) -> Result<Vec<u8>, Error> {
        self.storer.read(&path.0)
    }

    pub fn remove(&self, path: &StoredPath) -> Result<(), Error> {
        self.storer.delete(&path.0)
    }

    /// Removes a file nobody references any more. Failures are logged and
    /// leave the file behind.
    pub fn discard(&self, path: &StoredPath) {
        if let Err(e) = self.remove(path) {
            log::warn!("failed to remove image {}, file leaked: {}", path.as_str(), e);
        }
    }
}
