use clap::Parser;
use playlist_builder::model::CollectionView;
use playlist_builder::rekordbox::RekordboxCollection;
use playlist_builder::{BuildConfig, Error, PlaylistBuilder, PlaylistSpec, Remainder};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "playlist-builder")]
#[command(about = "Build DJ playlist hierarchies from a tagged collection", long_about = None)]
struct Args {
    /// Path to the collection XML exported by Rekordbox
    #[arg(short = 'c', long)]
    collection: String,

    /// Path to the playlist spec (YAML)
    #[arg(short = 's', long)]
    spec: String,

    /// Where to write the updated collection (defaults to the input path)
    #[arg(short = 'o', long)]
    output: Option<PathBuf>,

    /// Playlist filters to enable, in order (can be given multiple times)
    #[arg(long = "filter")]
    filters: Vec<String>,

    /// What to do with tags absent from the spec
    #[arg(long, default_value = "folder")]
    remainder: String,

    /// Minimum track count for tag playlists
    #[arg(long, default_value = "0")]
    min_tag_tracks: usize,

    /// Minimum track count for combiner playlists
    #[arg(long, default_value = "0")]
    min_combiner_tracks: usize,

    /// Verbose logging plus combiner tag statistics
    #[arg(short = 'v', long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    if let Err(err) = run(&args) {
        log::error!("{err}");
        std::process::exit(err.exit_code());
    }
}

fn run(args: &Args) -> Result<(), Error> {
    let remainder: Remainder = args.remainder.parse()?;
    let mut config = BuildConfig::default()
        .with_remainder(remainder)
        .with_filters(args.filters.clone())
        .with_minimum_tracks(args.min_tag_tracks, args.min_combiner_tracks);
    config.verbose_statistics = args.verbose;

    // Expand ~ in paths
    let collection_path = PathBuf::from(shellexpand::tilde(&args.collection).as_ref());
    let spec_path = PathBuf::from(shellexpand::tilde(&args.spec).as_ref());
    let output_path = args.output.clone().unwrap_or_else(|| collection_path.clone());

    log::info!("Loading playlist spec from {}", spec_path.display());
    let spec = PlaylistSpec::load(&spec_path)?;

    log::info!("Loading collection from {}", collection_path.display());
    let mut collection = RekordboxCollection::load(&collection_path, &config)?;
    log::info!("Collection loaded: {} tracks", collection.track_count());

    let builder = PlaylistBuilder::new(config)?;
    builder.build(&mut collection, &spec)?;

    collection.serialize(&output_path)?;
    log::info!("Collection written to {}", output_path.display());
    Ok(())
}
