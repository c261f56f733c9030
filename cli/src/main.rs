//! recon CLI - binary entry point.
//!
//! Loads configuration, opens the file-backed collection store under the
//! data directory, and runs one engine operation per invocation.
//!
//! ```text
//! main() -> ReconConfig -> FileStore + catalog -> RecordStore -> command
//! ```

mod render;

use std::fs::{self, File, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::subscriber::with_default;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use recon_config::ReconConfig;
use recon_core::{ChangeEvent, FileStore, NoteDraft, RecordStore, load_catalog};
use recon_types::{LifecycleState, NoteCategory, SectionKey, SectionStatus, VehicleId};

#[derive(Parser)]
#[command(name = "recon")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Track vehicle reconditioning, inspections and sales", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    /// Config file (default: $RECON_CONFIG, then ~/.recon/config.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List vehicles
    List {
        /// Only vehicles in this lifecycle state
        #[arg(short, long, value_enum)]
        state: Option<StateFilter>,
    },

    /// Show one vehicle, initializing any missing inspection sections
    Show {
        /// Vehicle ID
        id: String,
    },

    /// Give every active vehicle an entry for each configured section
    InitSections,

    /// Set the status of one inspection section
    SetStatus {
        /// Vehicle ID
        id: String,
        /// Section key (e.g. emissions, cleaned)
        section: String,
        /// not-started, pending, needs-attention or completed
        status: String,
    },

    /// Complete and verify an inspection section
    Complete {
        /// Vehicle ID
        id: String,
        /// Section key
        section: String,
        /// Initials of the person verifying
        #[arg(long)]
        by: String,
    },

    /// Add a team note
    Note {
        /// Vehicle ID
        id: String,
        /// Note text
        text: String,
        /// Initials of the author
        #[arg(long)]
        by: String,
        /// general, summary, or a section key
        #[arg(short, long, default_value = "general")]
        category: String,
    },

    /// Move a vehicle to a new location on the lot
    Relocate {
        /// Vehicle ID
        id: String,
        /// New location
        location: String,
        /// Initials of the person moving it
        #[arg(long)]
        by: String,
    },

    /// Mark a vehicle sold
    Sell {
        /// Vehicle ID
        id: String,
        /// Initials of the seller
        #[arg(long)]
        by: String,
        /// Sale price (default: listed price)
        #[arg(long)]
        price: Option<f64>,
        /// Sale notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// Mark a vehicle pending sale
    Pend {
        /// Vehicle ID
        id: String,
        /// Initials of the person marking it
        #[arg(long)]
        by: String,
        /// Pending notes
        #[arg(long)]
        notes: Option<String>,
    },

    /// Return a sold or pending vehicle to active inventory
    Reactivate {
        /// Vehicle ID
        id: String,
        /// Initials of the person reactivating
        #[arg(long)]
        by: String,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum StateFilter {
    Active,
    Pending,
    Sold,
}

impl From<StateFilter> for LifecycleState {
    fn from(value: StateFilter) -> Self {
        match value {
            StateFilter::Active => LifecycleState::Active,
            StateFilter::Pending => LifecycleState::Pending,
            StateFilter::Sold => LifecycleState::Sold,
        }
    }
}

fn init_tracing(data_dir: &Path) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let (log_file, init_warnings) = open_log_file(data_dir);

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::debug!(path = %log_path.display(), "Logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(env_filter)
        .init();
    for warning in init_warnings {
        tracing::warn!("{warning}");
    }
}

fn open_log_file(data_dir: &Path) -> (Option<(PathBuf, File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in log_file_candidates(data_dir) {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!(
                "Failed to create log dir {}: {e}",
                parent.display()
            ));
            continue;
        }

        match OpenOptions::new()
            .create(true)
            .append(true)
            .open(&candidate)
        {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => {
                warnings.push(format!(
                    "Failed to open log file {}: {e}",
                    candidate.display()
                ));
            }
        }
    }

    (None, warnings)
}

fn log_file_candidates(data_dir: &Path) -> Vec<PathBuf> {
    vec![
        data_dir.join("logs").join("recon.log"),
        // Fallback for read-only data directories.
        PathBuf::from(".recon").join("logs").join("recon.log"),
    ]
}

/// Read the config and resolve its inspection sections.
///
/// The log file lives under the configured data directory, so it does not
/// exist yet; anything logged here goes to `make_writer` instead.
fn load_config<W>(
    explicit: Option<&Path>,
    make_writer: W,
) -> Result<(ReconConfig, Vec<SectionKey>)>
where
    W: for<'w> MakeWriter<'w> + Send + Sync + 'static,
{
    let subscriber = tracing_subscriber::registry()
        .with(fmt::layer().with_ansi(false).with_writer(make_writer))
        .with(EnvFilter::new("warn"));
    with_default(subscriber, || {
        let config = read_config(explicit)?;
        let sections = config.active_section_keys();
        Ok((config, sections))
    })
}

fn read_config(explicit: Option<&Path>) -> Result<ReconConfig> {
    let loaded = match explicit {
        Some(path) => {
            if !path.exists() {
                bail!("config file {} does not exist", path.display());
            }
            ReconConfig::load_from(path)?
        }
        None => ReconConfig::load()?,
    };
    Ok(loaded.unwrap_or_default())
}

fn parse_section(raw: &str, active: &[SectionKey]) -> Result<SectionKey> {
    let key = SectionKey::new(raw).with_context(|| format!("invalid section `{raw}`"))?;
    if !active.contains(&key) {
        let known: Vec<&str> = active.iter().map(SectionKey::as_str).collect();
        bail!("unknown section `{key}` (configured: {})", known.join(", "));
    }
    Ok(key)
}

fn parse_status(raw: &str) -> Result<SectionStatus> {
    SectionStatus::parse(raw).with_context(|| {
        let known: Vec<&str> = SectionStatus::ALL.iter().map(|s| s.as_str()).collect();
        format!("unknown status `{raw}` (expected one of: {})", known.join(", "))
    })
}

fn run(
    command: Commands,
    records: &mut RecordStore<FileStore>,
    sections: &[SectionKey],
    json: bool,
) -> Result<()> {

    let record = match command {
        Commands::List { state } => {
            let listed = match state.map(LifecycleState::from) {
                None => records.load_all(),
                Some(LifecycleState::Active) => records.load_active(),
                Some(LifecycleState::Pending) => records.load_pending(),
                Some(LifecycleState::Sold) => records.load_sold(),
            };
            if json {
                println!("{}", render::records_json(&listed)?);
            } else if listed.is_empty() {
                println!("No vehicles.");
            } else {
                for record in &listed {
                    println!("{}", render::record_line(record));
                }
            }
            return Ok(());
        }
        Commands::InitSections => {
            let changed = records.ensure_all_section_statuses(sections)?;
            if json {
                println!("{}", serde_json::json!({ "initialized": changed }));
            } else {
                println!("Initialized sections on {changed} vehicle(s).");
            }
            return Ok(());
        }
        Commands::Note {
            id,
            text,
            by,
            category,
        } => {
            let category = NoteCategory::parse(&category)
                .with_context(|| format!("invalid note category `{category}`"))?;
            let draft = NoteDraft::general(text, by).with_category(category);
            let note = records.audit_log().append(&VehicleId::from(id), draft)?;
            if json {
                println!("{}", render::note_json(&note)?);
            } else {
                println!("{}", render::note_line(&note));
            }
            return Ok(());
        }
        Commands::Show { id } => {
            let record = records.get_by_id(&VehicleId::from(id))?;
            records.ensure_section_statuses(record, sections)?
        }
        Commands::SetStatus {
            id,
            section,
            status,
        } => {
            let key = parse_section(&section, sections)?;
            let status = parse_status(&status)?;
            records
                .status_tracker()
                .set_status(&VehicleId::from(id), &key, status)?
        }
        Commands::Complete { id, section, by } => {
            let key = parse_section(&section, sections)?;
            records
                .status_tracker()
                .complete_section(&VehicleId::from(id), &key, &by)?
        }
        Commands::Relocate { id, location, by } => {
            records.relocate(&VehicleId::from(id), &location, &by)?
        }
        Commands::Sell {
            id,
            by,
            price,
            notes,
        } => records
            .lifecycle()
            .mark_sold(&VehicleId::from(id), &by, price, notes.as_deref())?,
        Commands::Pend { id, by, notes } => records
            .lifecycle()
            .mark_pending(&VehicleId::from(id), &by, notes.as_deref())?,
        Commands::Reactivate { id, by } => {
            records.lifecycle().reactivate(&VehicleId::from(id), &by)?
        }
    };

    if json {
        println!("{}", render::record_json(&record)?);
    } else {
        print!("{}", render::record_detail(&record));
    }
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let (config, sections) = load_config(cli.config.as_deref(), io::stderr)?;
    let data_dir = config.data_dir();
    init_tracing(&data_dir);

    let store = FileStore::open(&data_dir)
        .with_context(|| format!("failed to open data directory {}", data_dir.display()))?;
    let catalog = load_catalog(&config.catalog_path());
    let mut records = RecordStore::new(store, catalog);
    records.broadcaster_mut().subscribe(|event: &ChangeEvent| {
        tracing::debug!(
            collection = %event.key,
            bytes = event.value.len(),
            "Collection changed"
        );
    });

    run(cli.command, &mut records, &sections, cli.json)
}
