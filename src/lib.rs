use anyhow::Result;
use log::{debug, info};
use rayon::prelude::*;
use std::fmt;
use std::path::Path;

pub mod art;
pub mod chunk;
pub mod cli;
pub mod config;
pub mod mpd;
pub mod sticker;

pub use config::Config;
use sticker::StickerStore;

/// Songs extracted per worker before their stickers are written.
const BATCH_PER_JOB: usize = 4;

#[derive(Debug, Default, Copy, Clone, PartialEq, Eq)]
pub struct Summary {
    pub updated: usize,
    /// Sum of the base64 lengths of every stored image.
    pub total_bytes: usize,
}

impl Summary {
    pub fn total_kib(&self) -> f64 {
        self.total_bytes as f64 / 1024.0
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Updated {} files, {:.2} KiB total",
            self.updated,
            self.total_kib()
        )
    }
}

/// Stores a thumbnail of the embedded cover art of every song MPD knows about
/// as chunked stickers on that song.
pub fn update_stickers(config: &Config, progress: impl FnMut(usize, usize)) -> Result<Summary> {
    let root = config.library_root()?;
    debug!("music directory is {:?}", root);

    let mut client = config.connect()?;
    let songs: Vec<String> = client
        .listallinfo("")?
        .into_iter()
        .filter_map(mpd::Record::into_file)
        .collect();
    info!("{} songs in the database", songs.len());

    let summary = update_songs(&mut client, &root, &songs, config, progress)?;
    client.close()?;

    Ok(summary)
}

/// Extracts art for each of `songs` (relative to `root`) and writes it to
/// `store`. Songs without usable art are skipped.
///
/// `progress(i, n)` is called as song `i` is about to be written. With more
/// than one job, art for a whole batch is extracted before the first call for
/// that batch.
pub fn update_songs(
    store: &mut impl StickerStore,
    root: &Path,
    songs: &[String],
    config: &Config,
    mut progress: impl FnMut(usize, usize),
) -> Result<Summary> {
    config.validate()?;
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.jobs)
        .build()?;
    let batch_size = config.jobs * BATCH_PER_JOB;

    let mut summary = Summary::default();
    for (batch_index, batch) in songs.chunks(batch_size).enumerate() {
        let images: Vec<_> = pool.install(|| {
            batch
                .par_iter()
                .map(|song| art::extract(&root.join(song), config.thumbnail))
                .collect()
        });

        for (offset, (song, image)) in batch.iter().zip(images).enumerate() {
            progress(batch_index * batch_size + offset, songs.len());

            let image = match image {
                Some(image) => image,
                None => {
                    debug!("Skipping {}", song);
                    continue;
                }
            };

            println!("Updating {}, size={}", song, image.len());
            sticker::write_image(store, song, image.as_str(), config.chunk_size)?;

            summary.updated += 1;
            summary.total_bytes += image.len();
        }
    }

    Ok(summary)
}
