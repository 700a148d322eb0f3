//! Embedded cover art to base64 JPEG thumbnails.
use base64::{engine::general_purpose::STANDARD, Engine as _};
use id3::frame::PictureType;
use image::codecs::jpeg::JpegEncoder;
use image::{GenericImageView, ImageResult};
use lofty::file::TaggedFileExt;
use log::debug;
use std::path::Path;

const JPEG_QUALITY: u8 = 75;

/// Largest size a thumbnail may occupy.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Bounds {
    pub width: u32,
    pub height: u32,
}

/// Base64 text of a JPEG thumbnail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage(String);

impl EncodedImage {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Length in bytes of the base64 text.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Cover art of the file at `path` as a base64 JPEG that fits in `bounds`.
///
/// Cover art is best effort: unreadable files, files without art and art that
/// can't be decoded all give `None`.
pub fn extract(path: &Path, bounds: Bounds) -> Option<EncodedImage> {
    let cover = read_cover(path)?;
    match thumbnail_jpeg(&cover, bounds) {
        Ok(jpeg) => Some(EncodedImage(STANDARD.encode(&jpeg))),
        Err(e) => {
            debug!("couldn't thumbnail art in {:?}: {}", path, e);
            None
        }
    }
}

/// Raw embedded picture bytes. An ID3 `APIC` frame wins over the picture list
/// of whatever other tag the file carries.
pub fn read_cover(path: &Path) -> Option<Vec<u8>> {
    read_apic(path).or_else(|| read_first_picture(path))
}

fn read_apic(path: &Path) -> Option<Vec<u8>> {
    let tag = id3::Tag::read_from_path(path).ok()?;
    let picture = tag
        .pictures()
        .find(|p| p.picture_type == PictureType::CoverFront)
        .or_else(|| tag.pictures().next())?;

    Some(picture.data.clone())
}

fn read_first_picture(path: &Path) -> Option<Vec<u8>> {
    let tagged_file = match lofty::read_from_path(path) {
        Ok(f) => f,
        Err(e) => {
            debug!("no readable tags in {:?}: {}", path, e);
            return None;
        }
    };

    tagged_file
        .primary_tag()
        .into_iter()
        .chain(tagged_file.tags())
        .find_map(|tag| tag.pictures().first())
        .map(|picture| picture.data().to_vec())
}

/// Decodes `bytes`, shrinks the image to fit `bounds` keeping its aspect
/// ratio, and re-encodes it as JPEG. Images already inside `bounds` keep
/// their size.
pub fn thumbnail_jpeg(bytes: &[u8], bounds: Bounds) -> ImageResult<Vec<u8>> {
    let decoded = image::load_from_memory(bytes)?;
    let (width, height) = decoded.dimensions();

    let resized = if width <= bounds.width && height <= bounds.height {
        decoded
    } else {
        decoded.thumbnail(bounds.width, bounds.height)
    };

    // JPEG has no alpha channel
    let rgb = resized.to_rgb8();
    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY).encode_image(&rgb)?;

    Ok(jpeg)
}
