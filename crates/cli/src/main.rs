// Bhulekh CLI - cadastral discrepancy detection and review workflow

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand, ValueEnum};
use uuid::Uuid;

use bhulekh_recon::engine::run_detection;
use bhulekh_recon::model::{Actor, DiscrepancyStatus, EntityType, Role, Severity};
use bhulekh_recon::{DetectionConfig, MemoryStore, ReconError, WorkflowEngine};

pub const EXIT_SUCCESS: u8 = 0;
pub const EXIT_ERROR: u8 = 1;
pub const EXIT_IO: u8 = 3;
pub const EXIT_INVALID_CONFIG: u8 = 10;
pub const EXIT_WORKFLOW_DENIED: u8 = 11;
pub const EXIT_NOT_FOUND: u8 = 12;

#[derive(Parser)]
#[command(name = "bhulekh")]
#[command(about = "Land-record reconciliation: detect, rank, and review discrepancies")]
#[command(version)]
struct Cli {
    /// Path to the store snapshot (created if absent)
    #[arg(long, global = true, default_value = "bhulekh-store.json", env = "BHULEKH_STORE")]
    store: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Import source CSVs and run discrepancy detection
    #[command(after_help = "\
Examples:
  bhulekh detect --parcels parcels.csv --records records.csv
  bhulekh detect --config detect.toml --json
  bhulekh detect --village V001
  bhulekh detect --records records-2026-08.csv")]
    Detect {
        /// Parcel export CSV (plot_id, village_code, computed_area_sqm)
        #[arg(long)]
        parcels: Option<PathBuf>,

        /// Registry record export CSV (plot_id, owner_name_hindi, ...)
        #[arg(long)]
        records: Option<PathBuf>,

        /// Detection thresholds and score weights (TOML)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Restrict the run to one village
        #[arg(long)]
        village: Option<String>,

        /// Output JSON stats instead of human summary
        #[arg(long)]
        json: bool,
    },

    /// Show the priority review queue (open items, highest score first)
    #[command(after_help = "\
Examples:
  bhulekh queue
  bhulekh queue --village V001 --severity critical
  bhulekh queue --limit 5 --json")]
    Queue {
        /// Only this village
        #[arg(long)]
        village: Option<String>,

        /// Only this severity tier
        #[arg(long)]
        severity: Option<SeverityArg>,

        #[arg(long, default_value_t = 20)]
        limit: usize,

        #[arg(long)]
        json: bool,
    },

    /// Move one discrepancy through the workflow
    #[command(after_help = "\
Examples:
  bhulekh transition 5f3a... under-review --actor ops1 --role operator
  bhulekh transition 5f3a... resolved --actor sup1 --role supervisor --remarks 'verified on site'")]
    Transition {
        id: Uuid,
        to: StatusArg,

        #[arg(long)]
        actor: String,

        #[arg(long)]
        role: RoleArg,

        #[arg(long)]
        remarks: Option<String>,
    },

    /// Apply one transition to many discrepancies
    #[command(after_help = "\
Examples:
  bhulekh bulk-transition ignored --ids 5f3a...,9c21... --actor sup1 --role supervisor")]
    BulkTransition {
        to: StatusArg,

        /// Comma-separated discrepancy IDs
        #[arg(long, value_delimiter = ',', required = true)]
        ids: Vec<Uuid>,

        #[arg(long)]
        actor: String,

        #[arg(long)]
        role: RoleArg,

        #[arg(long)]
        remarks: Option<String>,
    },

    /// List the transitions available to a role from an item's current status
    Transitions {
        id: Uuid,

        #[arg(long)]
        role: RoleArg,

        #[arg(long)]
        json: bool,
    },

    /// Show the audit trail
    #[command(after_help = "\
Examples:
  bhulekh history --id 5f3a...
  bhulekh history --user sup1 --limit 10
  bhulekh history")]
    History {
        /// Trail for one discrepancy
        #[arg(long)]
        id: Option<Uuid>,

        /// Everything one user did
        #[arg(long, conflicts_with = "id")]
        user: Option<String>,

        #[arg(long, default_value_t = 20)]
        limit: usize,

        #[arg(long)]
        json: bool,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum RoleArg {
    Operator,
    Supervisor,
    Admin,
}

impl From<RoleArg> for Role {
    fn from(arg: RoleArg) -> Self {
        match arg {
            RoleArg::Operator => Role::Operator,
            RoleArg::Supervisor => Role::Supervisor,
            RoleArg::Admin => Role::Admin,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SeverityArg {
    Minor,
    Major,
    Critical,
}

impl From<SeverityArg> for Severity {
    fn from(arg: SeverityArg) -> Self {
        match arg {
            SeverityArg::Minor => Severity::Minor,
            SeverityArg::Major => Severity::Major,
            SeverityArg::Critical => Severity::Critical,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum StatusArg {
    Open,
    UnderReview,
    Resolved,
    Disputed,
    Ignored,
}

impl From<StatusArg> for DiscrepancyStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Open => DiscrepancyStatus::Open,
            StatusArg::UnderReview => DiscrepancyStatus::UnderReview,
            StatusArg::Resolved => DiscrepancyStatus::Resolved,
            StatusArg::Disputed => DiscrepancyStatus::Disputed,
            StatusArg::Ignored => DiscrepancyStatus::Ignored,
        }
    }
}

pub struct CliError {
    pub code: u8,
    pub message: String,
}

impl CliError {
    fn new(code: u8, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

impl From<ReconError> for CliError {
    fn from(e: ReconError) -> Self {
        let code = match &e {
            ReconError::ConfigParse(_) | ReconError::ConfigValidation(_) => EXIT_INVALID_CONFIG,
            ReconError::InvalidTransition { .. } | ReconError::RoleNotPermitted { .. } => {
                EXIT_WORKFLOW_DENIED
            }
            ReconError::NotFound { .. } => EXIT_NOT_FOUND,
            ReconError::Io(_) => EXIT_IO,
            _ => EXIT_ERROR,
        };
        Self::new(code, e.to_string())
    }
}

fn load_store(path: &Path) -> Result<MemoryStore, CliError> {
    if path.exists() {
        Ok(MemoryStore::load(path)?)
    } else {
        Ok(MemoryStore::new())
    }
}

fn save_store(store: &MemoryStore, path: &Path) -> Result<(), CliError> {
    store.save(path)?;
    Ok(())
}

fn cmd_detect(
    store_path: &Path,
    parcels: Option<PathBuf>,
    records: Option<PathBuf>,
    config_path: Option<PathBuf>,
    village: Option<String>,
    json: bool,
) -> Result<(), CliError> {
    let config = match config_path {
        Some(path) => {
            let text = std::fs::read_to_string(&path)
                .map_err(|e| CliError::new(EXIT_IO, format!("cannot read {}: {e}", path.display())))?;
            DetectionConfig::from_toml(&text)?
        }
        None => DetectionConfig::default(),
    };

    let mut store = load_store(store_path)?;
    let importer = Actor::system();

    if let Some(path) = parcels {
        let data = std::fs::read_to_string(&path)
            .map_err(|e| CliError::new(EXIT_IO, format!("cannot read {}: {e}", path.display())))?;
        let name = path.display().to_string();
        for parcel in bhulekh_recon::ingest::load_parcels_csv(&name, &data)? {
            store.import_parcel(parcel, &importer);
        }
    }
    if let Some(path) = records {
        let data = std::fs::read_to_string(&path)
            .map_err(|e| CliError::new(EXIT_IO, format!("cannot read {}: {e}", path.display())))?;
        let name = path.display().to_string();
        for record in bhulekh_recon::ingest::load_records_csv(&name, &data)? {
            store.import_record(record, &importer);
        }
    }

    let stats = run_detection(&mut store, &config, village.as_deref());
    save_store(&store, store_path)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&stats).map_err(io_err)?);
    } else {
        println!(
            "Checked {} parcels against {} records",
            stats.parcels_checked, stats.records_checked
        );
        println!(
            "Discrepancies: {} created, {} rescored, {} unchanged",
            stats.created, stats.updated, stats.unchanged
        );
        for (kind, count) in &stats.by_type {
            println!("  {kind}: {count}");
        }
    }
    Ok(())
}

fn cmd_queue(
    store_path: &Path,
    village: Option<String>,
    severity: Option<SeverityArg>,
    limit: usize,
    json: bool,
) -> Result<(), CliError> {
    let store = load_store(store_path)?;
    let queue = store.priority_queue(village.as_deref(), severity.map(Into::into), limit);

    if json {
        println!("{}", serde_json::to_string_pretty(&queue).map_err(io_err)?);
        return Ok(());
    }
    if queue.is_empty() {
        println!("No open discrepancies.");
        return Ok(());
    }
    for d in queue {
        println!(
            "{}  score {:>3}  {:<8}  {:<17}  plot {}  {}",
            d.id, d.score, d.severity, d.kind, d.plot_id, d.explanation
        );
    }
    Ok(())
}

fn cmd_transition(
    store_path: &Path,
    id: Uuid,
    to: StatusArg,
    actor: String,
    role: RoleArg,
    remarks: Option<String>,
) -> Result<(), CliError> {
    let mut store = load_store(store_path)?;
    let workflow = WorkflowEngine::standard();
    let actor = Actor::new(actor, role.into());
    let updated = workflow.transition(&mut store, id, to.into(), &actor, remarks.as_deref())?;
    save_store(&store, store_path)?;
    println!("{} -> {}", updated.id, updated.status);
    Ok(())
}

fn cmd_bulk_transition(
    store_path: &Path,
    to: StatusArg,
    ids: Vec<Uuid>,
    actor: String,
    role: RoleArg,
    remarks: Option<String>,
) -> Result<(), CliError> {
    let mut store = load_store(store_path)?;
    let workflow = WorkflowEngine::standard();
    let actor = Actor::new(actor, role.into());
    let outcome = workflow.bulk_transition(&mut store, &ids, to.into(), &actor, remarks.as_deref());
    save_store(&store, store_path)?;

    println!(
        "{} succeeded, {} skipped, {} failed",
        outcome.succeeded.len(),
        outcome.skipped.len(),
        outcome.failed.len()
    );
    for (id, reason) in outcome.skipped.iter().chain(outcome.failed.iter()) {
        println!("  {id}: {reason}");
    }
    Ok(())
}

fn cmd_transitions(store_path: &Path, id: Uuid, role: RoleArg, json: bool) -> Result<(), CliError> {
    let store = load_store(store_path)?;
    let discrepancy = store
        .discrepancy(id)
        .ok_or(ReconError::NotFound { entity: "discrepancy", id })?;
    let workflow = WorkflowEngine::standard();
    let options = workflow.available_transitions(discrepancy.status, role.into());

    if json {
        println!("{}", serde_json::to_string_pretty(&options).map_err(io_err)?);
        return Ok(());
    }
    println!("From '{}':", discrepancy.status);
    for option in options {
        println!("  {} ({} / {})", option.to, option.label, option.label_hindi);
    }
    Ok(())
}

fn cmd_history(
    store_path: &Path,
    id: Option<Uuid>,
    user: Option<String>,
    limit: usize,
    json: bool,
) -> Result<(), CliError> {
    let store = load_store(store_path)?;
    let entries = match (id, &user) {
        (Some(id), _) => store.ledger().entity_history(EntityType::Discrepancy, id, limit),
        (None, Some(name)) => store.ledger().user_activity(name, limit),
        (None, None) => store.ledger().recent_changes(None, None, limit),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&entries).map_err(io_err)?);
        return Ok(());
    }
    for entry in entries {
        println!(
            "{}  {:<13}  {:<11}  {} ({})",
            entry.timestamp.format("%Y-%m-%d %H:%M:%S"),
            entry.action,
            entry.entity_type,
            entry.actor,
            entry.role
        );
        if let Some(remarks) = &entry.remarks {
            println!("    {remarks}");
        }
    }
    Ok(())
}

fn io_err(e: serde_json::Error) -> CliError {
    CliError::new(EXIT_IO, e.to_string())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let store = cli.store.clone();

    let result = match cli.command {
        Commands::Detect { parcels, records, config, village, json } => {
            cmd_detect(&store, parcels, records, config, village, json)
        }
        Commands::Queue { village, severity, limit, json } => {
            cmd_queue(&store, village, severity, limit, json)
        }
        Commands::Transition { id, to, actor, role, remarks } => {
            cmd_transition(&store, id, to, actor, role, remarks)
        }
        Commands::BulkTransition { to, ids, actor, role, remarks } => {
            cmd_bulk_transition(&store, to, ids, actor, role, remarks)
        }
        Commands::Transitions { id, role, json } => cmd_transitions(&store, id, role, json),
        Commands::History { id, user, limit, json } => cmd_history(&store, id, user, limit, json),
    };

    match result {
        Ok(()) => ExitCode::from(EXIT_SUCCESS),
        Err(e) => {
            eprintln!("error: {}", e.message);
            ExitCode::from(e.code)
        }
    }
}
