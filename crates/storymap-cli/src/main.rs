mod display;
mod pipeline;

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use storymap_core::Sentiment;
use storymap_geo::TravelMode;

use pipeline::{Backend, Session, TextSource};

#[derive(Parser)]
#[command(name = "storymap", version, about = "Extract places from text and build reusable maps")]
struct Cli {
    /// Directory holding map documents and rendered artifacts.
    #[arg(long, env = "STORYMAP_DATA_DIR", default_value = "data", global = true)]
    data_dir: PathBuf,

    /// API key for the LLM extraction backend.
    #[arg(long, env = "STORYMAP_LLM_API_KEY", global = true, hide_env_values = true)]
    llm_api_key: Option<String>,

    /// API key for the geocoding and directions services.
    #[arg(long, env = "STORYMAP_GEO_API_KEY", global = true, hide_env_values = true)]
    geo_api_key: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Extract places from text and merge them into a named map.
    Extract {
        /// Map to merge into (created on first save).
        #[arg(long)]
        map: String,
        /// Read the source text from a file.
        #[arg(long, conflicts_with = "url")]
        file: Option<PathBuf>,
        /// Fetch the source text from a web page.
        #[arg(long)]
        url: Option<String>,
        /// Which extraction backend(s) to run.
        #[arg(long, value_enum, default_value = "both")]
        backend: BackendArg,
        /// Locality hint passed to the geocoder ("Paris, France").
        #[arg(long)]
        near: Option<String>,
    },
    /// List stored maps.
    List,
    /// Show a stored map.
    Show { name: String },
    /// Edit a place's note or sentiment.
    Edit {
        name: String,
        /// Place id, as shown by `show`.
        #[arg(long)]
        id: String,
        #[arg(long)]
        note: Option<String>,
        #[arg(long, value_enum)]
        sentiment: Option<SentimentArg>,
    },
    /// Delete a stored map and its artifacts.
    Delete { name: String },
    /// Look up a route between two places on a map.
    Route {
        name: String,
        /// Origin place id.
        #[arg(long)]
        from: String,
        /// Destination place id.
        #[arg(long)]
        to: String,
        /// Waypoint place ids.
        #[arg(long)]
        via: Vec<String>,
        #[arg(long, value_enum, default_value = "driving")]
        mode: ModeArg,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum BackendArg {
    Ner,
    Llm,
    Both,
}

impl From<BackendArg> for Backend {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Ner => Backend::Ner,
            BackendArg::Llm => Backend::Llm,
            BackendArg::Both => Backend::Both,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum SentimentArg {
    Positive,
    Negative,
    Neutral,
}

impl From<SentimentArg> for Sentiment {
    fn from(arg: SentimentArg) -> Self {
        match arg {
            SentimentArg::Positive => Sentiment::Positive,
            SentimentArg::Negative => Sentiment::Negative,
            SentimentArg::Neutral => Sentiment::Neutral,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum ModeArg {
    Driving,
    Walking,
    Transit,
    Bicycling,
}

impl From<ModeArg> for TravelMode {
    fn from(arg: ModeArg) -> Self {
        match arg {
            ModeArg::Driving => TravelMode::Driving,
            ModeArg::Walking => TravelMode::Walking,
            ModeArg::Transit => TravelMode::Transit,
            ModeArg::Bicycling => TravelMode::Bicycling,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let session = Session::open(&cli.data_dir, cli.llm_api_key, cli.geo_api_key)
        .context("opening map store")?;

    match cli.command {
        Command::Extract {
            map,
            file,
            url,
            backend,
            near,
        } => {
            let source = match (file, url) {
                (Some(path), _) => TextSource::File(path),
                (None, Some(url)) => TextSource::Url(url),
                (None, None) => TextSource::Stdin,
            };
            let summary = session
                .run_extract(&map, source, backend.into(), near)
                .await?;
            display::print_summary(&map, &summary);
        }
        Command::List => {
            for name in session.store.list()? {
                println!("{name}");
            }
        }
        Command::Show { name } => {
            let map = session.store.load(&name)?;
            display::print_map_card(&map);
        }
        Command::Edit {
            name,
            id,
            note,
            sentiment,
        } => {
            let mut map = session.store.load(&name)?;
            session
                .store
                .apply_edit(&mut map, &id, note, sentiment.map(Into::into))?;
            session.store.save_artifacts(&map)?;
            println!("updated place {id} on '{name}'");
        }
        Command::Delete { name } => {
            session.store.delete(&name)?;
            println!("deleted '{name}'");
        }
        Command::Route {
            name,
            from,
            to,
            via,
            mode,
        } => {
            let map = session.store.load(&name)?;
            match session.run_route(&map, &from, &to, &via, mode.into()).await? {
                Some(route) => display::print_route(&route),
                None => println!("no route found"),
            }
        }
    }

    Ok(())
}
