use std::fs;
use std::path::{Path, PathBuf};

use cardmap::config::EditorConfig;
use cardmap::connector::NullConnector;
use cardmap::engine::{EditorSession, SessionError};
use cardmap::selection::{Align, Axis};
use cardmap::store::FileStore;
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::{Value, json};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("could not read settings file: {0}")]
    Settings(#[from] std::io::Error),
    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("cannot {0}: needs at least two existing cards and enable_align on")]
    NotEnoughCards(&'static str),
}

#[derive(Parser, Debug)]
#[command(name = "cardmap", about = "Inspect and lay out stored Card Map documents")]
struct Cli {
    /// Directory holding `<map-id>.json` files.
    #[arg(long, env = "CARDMAP_MAP_DIR", default_value = ".")]
    map_dir: PathBuf,

    /// Editor settings JSON (line style, snap threshold, card size, ...).
    #[arg(long, env = "CARDMAP_SETTINGS")]
    settings: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print counts and dangling connection references.
    Inspect { map_id: String },
    /// Align cards and write the map back.
    Align {
        map_id: String,
        #[arg(long, value_enum)]
        mode: AlignMode,
        #[arg(long, value_delimiter = ',', required = true)]
        ids: Vec<String>,
    },
    /// Space cards evenly and write the map back.
    Distribute {
        map_id: String,
        #[arg(long, value_enum)]
        axis: AxisArg,
        #[arg(long, value_delimiter = ',', required = true)]
        ids: Vec<String>,
    },
    /// Move every rail-attached card back flush against its rail.
    Resnap { map_id: String },
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum AlignMode {
    Left,
    Center,
    Right,
    Top,
    Middle,
    Bottom,
}

impl From<AlignMode> for Align {
    fn from(mode: AlignMode) -> Self {
        match mode {
            AlignMode::Left => Align::Left,
            AlignMode::Center => Align::Center,
            AlignMode::Right => Align::Right,
            AlignMode::Top => Align::Top,
            AlignMode::Middle => Align::Middle,
            AlignMode::Bottom => Align::Bottom,
        }
    }
}

#[derive(ValueEnum, Debug, Clone, Copy)]
enum AxisArg {
    Horizontal,
    Vertical,
}

impl From<AxisArg> for Axis {
    fn from(axis: AxisArg) -> Self {
        match axis {
            AxisArg::Horizontal => Axis::Horizontal,
            AxisArg::Vertical => Axis::Vertical,
        }
    }
}

type Session = EditorSession<NullConnector>;

fn main() -> Result<(), CliError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = load_config(cli.settings.as_deref())?;
    let mut store = FileStore::new(cli.map_dir);
    let mut session = Session::new(NullConnector::default(), config);

    match cli.command {
        Command::Inspect { map_id } => {
            session.load_from(&store, &map_id)?;
            print_json(&summary(&session, &map_id))
        }
        Command::Align { map_id, mode, ids } => {
            session.load_from(&store, &map_id)?;
            session.set_selection(&ids);
            if !session.align_selected(mode.into()) {
                return Err(CliError::NotEnoughCards("align"));
            }
            session.save_to(&mut store, &map_id)?;
            info!(%map_id, cards = session.selection().len(), "cards aligned");
            Ok(())
        }
        Command::Distribute { map_id, axis, ids } => {
            session.load_from(&store, &map_id)?;
            session.set_selection(&ids);
            if !session.distribute_selected(axis.into()) {
                return Err(CliError::NotEnoughCards("distribute"));
            }
            session.save_to(&mut store, &map_id)?;
            info!(%map_id, cards = session.selection().len(), "cards distributed");
            Ok(())
        }
        Command::Resnap { map_id } => {
            session.load_from(&store, &map_id)?;
            let adjusted = session.resnap_all();
            session.save_to(&mut store, &map_id)?;
            info!(%map_id, cards = adjusted, "cards re-snapped");
            Ok(())
        }
    }
}

fn load_config(path: Option<&Path>) -> Result<EditorConfig, CliError> {
    let settings = match path {
        Some(path) => serde_json::from_str::<Value>(&fs::read_to_string(path)?)?,
        None => Value::Null,
    };
    Ok(EditorConfig::from_settings(&settings).with_env_overrides())
}

fn summary(session: &Session, map_id: &str) -> Value {
    let doc = session.doc();
    let attached = doc.nodes.iter().filter(|c| c.attached_rail.is_some()).count();
    let orphans: Vec<&str> = doc.orphaned_connections().into_iter().map(|c| c.id.as_str()).collect();
    json!({
        "map_id": map_id,
        "cards": doc.nodes.len(),
        "rails": doc.rails.len(),
        "connections": doc.connections.active_len(),
        "attached_cards": attached,
        "orphaned_connections": orphans,
    })
}

fn print_json(value: &Value) -> Result<(), CliError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
