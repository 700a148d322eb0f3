use anyhow::Result;
use clap::Parser;
use stickerart::cli::{init_logging, ConnectionArgs, LibraryArgs};
use stickerart::update_stickers;

#[derive(Parser)]
#[command(
    name = "stickerart",
    about = "Stores thumbnails of embedded cover art as MPD song stickers."
)]
struct Opt {
    #[command(flatten)]
    connection: ConnectionArgs,

    #[command(flatten)]
    library: LibraryArgs,
}

fn main() -> Result<()> {
    let Opt {
        connection,
        library,
    } = Opt::parse();

    init_logging(connection.verbose);
    let config = connection.into_config(Some(library));

    let summary = update_stickers(&config, |_, _| ())?;

    println!("{}", summary);

    Ok(())
}
