//! Chunked storage of cover art in MPD song stickers.
//!
//! MPD refuses sticker values that overflow its input buffer, so an image is
//! stored as `image-0`, `image-1`, ... plus `image-nchunks` holding the count.
use crate::{chunk, mpd};
use anyhow::{bail, Context, Result};

pub const NCHUNKS_KEY: &str = "image-nchunks";

pub fn chunk_key(index: usize) -> String {
    format!("image-{}", index)
}

/// Per-song key/value storage. Implemented by the MPD client; the chunking
/// logic only ever talks to this.
pub trait StickerStore {
    fn set_sticker(&mut self, song: &str, key: &str, value: &str) -> mpd::Result<()>;
    fn get_sticker(&mut self, song: &str, key: &str) -> mpd::Result<Option<String>>;
}

impl StickerStore for mpd::Client {
    fn set_sticker(&mut self, song: &str, key: &str, value: &str) -> mpd::Result<()> {
        self.sticker_set(song, key, value)
    }

    fn get_sticker(&mut self, song: &str, key: &str) -> mpd::Result<Option<String>> {
        self.sticker_get(song, key)
    }
}

/// Stores `image` for `song`, writing the chunk count before the chunks.
/// Returns the number of chunks written. Errors from the store are not
/// retried.
pub fn write_image(
    store: &mut impl StickerStore,
    song: &str,
    image: &str,
    chunk_size: usize,
) -> Result<usize> {
    let chunks = chunk::split(image, chunk_size)?;

    store
        .set_sticker(song, NCHUNKS_KEY, &chunks.len().to_string())
        .with_context(|| format!("failed to set {} for {:?}", NCHUNKS_KEY, song))?;

    for (i, chunk) in chunks.iter().enumerate() {
        let key = chunk_key(i);
        store
            .set_sticker(song, &key, chunk)
            .with_context(|| format!("failed to set {} for {:?}", key, song))?;
    }

    Ok(chunks.len())
}

/// Reassembles the image stored by [`write_image`]. A song without a chunk
/// count has no image; a count that disagrees with the chunks present is an
/// error, since it means an update was interrupted.
pub fn read_image(store: &mut impl StickerStore, song: &str) -> Result<Option<String>> {
    let count = match store.get_sticker(song, NCHUNKS_KEY)? {
        Some(count) => count,
        None => return Ok(None),
    };
    let count: usize = count
        .trim()
        .parse()
        .with_context(|| format!("invalid {} {:?} for {:?}", NCHUNKS_KEY, count, song))?;
    if count == 0 {
        bail!("{} is zero for {:?}", NCHUNKS_KEY, song);
    }

    let mut image = String::new();
    for i in 0..count {
        let key = chunk_key(i);
        match store.get_sticker(song, &key)? {
            Some(chunk) => image.push_str(&chunk),
            None => bail!(
                "incomplete image for {:?}: {} missing of {} chunks",
                song,
                key,
                count
            ),
        }
    }

    Ok(Some(image))
}
