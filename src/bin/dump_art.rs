use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use clap::Parser;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use stickerart::cli::{init_logging, ConnectionArgs};
use stickerart::sticker::read_image;

#[derive(Parser)]
#[command(
    name = "dump-art",
    about = "Reassembles the cover art stored in a song's stickers."
)]
struct Opt {
    #[command(flatten)]
    connection: ConnectionArgs,

    /// Song path as known to MPD
    song: String,

    /// Output JPEG
    out: PathBuf,
}

fn main() -> Result<()> {
    let Opt {
        connection,
        song,
        out,
    } = Opt::parse();

    init_logging(connection.verbose);
    let config = connection.into_config(None);

    let mut client = config.connect()?;
    let image = read_image(&mut client, &song)?.with_context(|| format!("no image for {:?}", song))?;
    client.close()?;

    let jpeg = STANDARD.decode(image.as_bytes())?;
    let mut w = BufWriter::new(File::create(&out)?);
    w.write_all(&jpeg)?;
    w.flush()?;

    println!("{:?}: {} bytes", out, jpeg.len());

    Ok(())
}
