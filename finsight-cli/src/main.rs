use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use finsight_client::{
    spawn_analysis_load, spawn_processing, ApiClient, RemoteStatus, SimulatedStatus,
};
use finsight_core::{
    AmountRange, AnalysisRecord, DashboardSession, ExportKind, Status, TransactionTypeFilter,
    UploadSession,
};
use finsight_export::{render_csv, render_pdf};
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

mod config;
mod logging;
mod render;
mod state;

use config::{Config, StatusSourceKind};

#[derive(Parser, Debug)]
#[command(
    name = "finsight",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("FINSIGHT_BUILD_SHA"), ")"),
    about = "Upload bank statements and explore their analysis"
)]
struct Cli {
    /// Debug logging on stderr (FINSIGHT_LOG overrides)
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Check a statement file against the upload rules
    Validate { file: PathBuf },

    /// Upload a statement and follow its processing until it completes
    Analyze {
        file: PathBuf,

        /// Poll the backend for status instead of simulating progress
        #[arg(long)]
        remote_status: bool,
    },

    /// Print the analysis for a processed statement
    Show {
        id: String,

        /// Read a saved analysis JSON instead of calling the API
        #[arg(long)]
        from_file: Option<PathBuf>,
    },

    /// List and filter a statement's transactions
    Transactions {
        id: String,

        /// Read a saved analysis JSON (with transactions) instead of calling the API
        #[arg(long)]
        from_file: Option<PathBuf>,

        /// Case-insensitive description search
        #[arg(long, default_value = "")]
        search: String,

        /// Category name, or "all"
        #[arg(long, default_value = "all")]
        category: String,

        /// all | debit | credit
        #[arg(long = "type", default_value = "all")]
        kind: TransactionTypeFilter,

        /// Lower bound on the signed amount
        #[arg(long, allow_hyphen_values = true)]
        min: Option<f64>,

        /// Upper bound on the signed amount
        #[arg(long, allow_hyphen_values = true)]
        max: Option<f64>,

        /// Only recurring transactions
        #[arg(long)]
        recurring: bool,

        /// Only unusual transactions
        #[arg(long)]
        unusual: bool,
    },

    /// Write the PDF report and/or CSV data export
    Export {
        id: String,

        #[arg(long, value_enum, default_value_t = ExportFormat::All)]
        format: ExportFormat,

        /// Output directory (defaults to [export].out_dir)
        #[arg(long)]
        out_dir: Option<PathBuf>,

        /// Read a saved analysis JSON instead of calling the API
        #[arg(long)]
        from_file: Option<PathBuf>,
    },

    /// Delete a statement and its analysis
    Delete {
        id: String,

        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },

    /// Manage ~/.finsight/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write the default config if none exists
    Init,
    /// Print the effective config
    Show,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum ExportFormat {
    Pdf,
    Csv,
    All,
}

impl ExportFormat {
    fn kinds(self) -> &'static [ExportKind] {
        match self {
            ExportFormat::Pdf => &[ExportKind::Pdf],
            ExportFormat::Csv => &[ExportKind::Csv],
            ExportFormat::All => &[ExportKind::Pdf, ExportKind::Csv],
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init_logger(cli.verbose);

    match cli.command {
        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config()?,
            ConfigCommand::Show => {
                let cfg = config::load_config()?;
                println!("# {}\n", config::config_path()?.display());
                print!("{}", toml::to_string_pretty(&cfg).context("serialize config")?);
            }
        },

        Command::Validate { file } => {
            validate_file(&file)?;
        }

        Command::Analyze {
            file,
            remote_status,
        } => {
            let cfg = config::load_config()?;
            analyze(&cfg, &file, remote_status).await?;
        }

        Command::Show { id, from_file } => {
            let cfg = config::load_config()?;
            let analysis = load_analysis(&cfg, &id, from_file.as_deref(), false).await?;
            render::print_analysis(&analysis);
        }

        Command::Transactions {
            id,
            from_file,
            search,
            category,
            kind,
            min,
            max,
            recurring,
            unusual,
        } => {
            let cfg = config::load_config()?;
            let analysis = load_analysis(&cfg, &id, from_file.as_deref(), true).await?;
            let mut session = DashboardSession::new(analysis);

            if !session.category_options().contains(&category.as_str()) {
                bail!(
                    "unknown category '{}' (choose from: {})",
                    category,
                    session.category_options().join(", ")
                );
            }
            session.set_search(search);
            session.set_category(category);

            let filters = session.advanced_mut();
            filters.transaction_type = kind;
            filters.amount_range = AmountRange::new(
                min.unwrap_or(AmountRange::FULL.min),
                max.unwrap_or(AmountRange::FULL.max),
            );
            filters.show_recurring = recurring;
            filters.show_unusual = unusual;

            render::print_transactions(&session);
        }

        Command::Export {
            id,
            format,
            out_dir,
            from_file,
        } => {
            let cfg = config::load_config()?;
            let out_dir = out_dir.unwrap_or_else(|| cfg.export.out_dir.clone());
            let analysis = load_analysis(&cfg, &id, from_file.as_deref(), false).await?;
            export(DashboardSession::new(analysis), format, &out_dir)?;
        }

        Command::Delete { id, yes } => {
            let cfg = config::load_config()?;
            delete(&cfg, &id, yes).await?;
        }
    }

    Ok(())
}

fn api_client(cfg: &Config) -> Result<ApiClient> {
    ApiClient::new(&cfg.api.base_url, cfg.api.timeout()).context("building HTTP client")
}

fn file_name_of(path: &Path) -> Result<&str> {
    path.file_name()
        .and_then(|n| n.to_str())
        .with_context(|| format!("not a file name: {}", path.display()))
}

/// Select the file into a fresh upload session, using its on-disk size.
fn select(path: &Path) -> Result<UploadSession> {
    let meta = std::fs::metadata(path).with_context(|| format!("stat {}", path.display()))?;
    let mut session = UploadSession::new();
    match session.select_file(file_name_of(path)?, meta.len()) {
        Ok(c) => println!("✓ {}", render::candidate_line(c)),
        Err(e) => bail!("{e}"),
    }
    Ok(session)
}

fn validate_file(path: &Path) -> Result<()> {
    select(path).map(|_| ())
}

async fn analyze(cfg: &Config, path: &Path, remote_status: bool) -> Result<()> {
    let mut session = select(path)?;
    let candidate = session.begin_cycle()?;

    let pconf = cfg.processing.to_processing_config();
    let remote = remote_status || cfg.processing.status_source == StatusSourceKind::Remote;
    let handle = if remote {
        spawn_processing(candidate, pconf, RemoteStatus::new(api_client(cfg)?))
    } else {
        let source = SimulatedStatus::new(pconf.max_duration);
        spawn_processing(candidate, pconf, source)
    };
    debug!(remote, "processing driver started");

    let mut updates = handle.subscribe();
    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let state = updates.borrow_and_update().clone();
                println!("{}", render::progress_line(&state));
                session.observe(state);
            }
            _ = tokio::signal::ctrl_c() => {
                handle.cancel();
                session.navigate_away();
                println!("\nCancelled; nothing was analyzed.");
                return Ok(());
            }
        }
    }

    let Some(end) = handle.wait().await else {
        bail!("processing was cancelled");
    };
    session.observe(end.clone());

    match end.status {
        Status::Completed => {
            let id = session.view_results()?;
            println!("\n{}: {}", Status::Completed.headline(), end.message);
            println!("Statement id: {id}");
            println!("Next: finsight show {id}");
            Ok(())
        }
        status => bail!("{}: {}", status.headline(), end.message),
    }
}

/// The analysis for one results view. With `with_transactions`, the itemized
/// listing is fetched separately and attached.
async fn load_analysis(
    cfg: &Config,
    id: &str,
    from_file: Option<&Path>,
    with_transactions: bool,
) -> Result<AnalysisRecord> {
    if let Some(p) = from_file {
        return state::read_analysis_file(p);
    }

    let client = api_client(cfg)?;
    let load = spawn_analysis_load(client.clone(), id);
    let view = load.cancel_flag();
    let analysis = tokio::select! {
        out = load.finish() => match out {
            Some(res) => res.with_context(|| format!("loading analysis for {id}"))?,
            None => bail!("analysis load cancelled"),
        },
        _ = tokio::signal::ctrl_c() => {
            view.cancel();
            bail!("analysis load cancelled");
        }
    };

    if !with_transactions {
        return Ok(analysis);
    }
    let transactions = client
        .fetch_transactions(id)
        .await
        .with_context(|| format!("loading transactions for {id}"))?;
    Ok(analysis.with_transactions(transactions))
}

fn export(mut session: DashboardSession, format: ExportFormat, out_dir: &Path) -> Result<()> {
    let mut failed = 0;
    for &kind in format.kinds() {
        let (written, note) = session.run_export(kind, |a| {
            let artifact = match kind {
                ExportKind::Pdf => render_pdf(a)?,
                ExportKind::Csv => render_csv(a)?,
            };
            artifact.write_to(out_dir)
        });
        println!("{}", render::notification_line(&note));
        if let Some(path) = written {
            println!("  {}", path.display());
        }
        if note.is_error() {
            failed += 1;
        }
    }
    if failed > 0 {
        bail!("{failed} export(s) failed");
    }
    Ok(())
}

fn confirm(prompt: &str) -> Result<bool> {
    print!("{prompt} [y/N] ");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(matches!(line.trim(), "y" | "Y" | "yes"))
}

async fn delete(cfg: &Config, id: &str, yes: bool) -> Result<()> {
    let analysis = load_analysis(cfg, id, None, false).await?;
    let client = api_client(cfg)?;
    let mut session = DashboardSession::new(analysis);

    session.open_delete_dialog();
    if !yes
        && !confirm(&format!(
            "Delete the analysis of {}? This cannot be undone.",
            session.analysis().file_name
        ))?
    {
        session.cancel_delete();
        println!("Kept.");
        return Ok(());
    }

    while session.is_delete_dialog_open() {
        match client.delete_statement(id).await {
            Ok(()) => {
                let note = session.delete_succeeded();
                println!("{}", render::notification_line(&note));
            }
            Err(e) => {
                let note = session.delete_failed(&e);
                println!("{}", render::notification_line(&note));
                if yes || !confirm("Retry?")? {
                    bail!("delete failed: {e}");
                }
            }
        }
    }

    tokio::time::sleep(cfg.delete.redirect_delay()).await;
    println!("Back to upload. Run: finsight analyze <FILE>");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> AnalysisRecord {
        let p = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .parent()
            .unwrap()
            .join("sample_analysis.json");
        state::read_analysis_file(&p).unwrap()
    }

    #[test]
    fn test_parse_transaction_filters() {
        let cli = Cli::try_parse_from([
            "finsight",
            "transactions",
            "stmt_1",
            "--type",
            "debit",
            "--min",
            "-500",
            "--recurring",
        ])
        .unwrap();
        match cli.command {
            Command::Transactions {
                kind, min, max, recurring, unusual, ..
            } => {
                assert_eq!(kind, TransactionTypeFilter::Debit);
                assert_eq!(min, Some(-500.0));
                assert_eq!(max, None);
                assert!(recurring);
                assert!(!unusual);
            }
            other => panic!("parsed {other:?}"),
        }
    }

    #[test]
    fn test_bad_type_is_rejected() {
        assert!(Cli::try_parse_from(["finsight", "transactions", "x", "--type", "refund"]).is_err());
    }

    #[test]
    fn test_export_writes_both_artifacts() {
        let dir = tempfile::tempdir().unwrap();
        export(DashboardSession::new(sample()), ExportFormat::All, dir.path()).unwrap();
        assert!(dir.path().join("finsight-report-bank_statement_march_2024.pdf.pdf").exists());
        assert!(dir.path().join("finsight-data-bank_statement_march_2024.pdf.csv").exists());
    }

    #[test]
    fn test_export_csv_only() {
        let dir = tempfile::tempdir().unwrap();
        export(DashboardSession::new(sample()), ExportFormat::Csv, dir.path()).unwrap();
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["finsight-data-bank_statement_march_2024.pdf.csv"]);
    }

    #[test]
    fn test_validate_rejects_unsupported_file() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("notes.txt");
        std::fs::write(&p, "hello").unwrap();
        let err = validate_file(&p).unwrap_err();
        assert_eq!(err.to_string(), "Please upload a PDF, CSV, or Excel file.");

        let ok = dir.path().join("march.csv");
        std::fs::write(&ok, "date,amount\n").unwrap();
        validate_file(&ok).unwrap();
    }
}
