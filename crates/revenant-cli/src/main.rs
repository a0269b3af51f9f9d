use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use revenant_core::model::{DriveLetter, FileRef, RecoveryHandle};
use revenant_core::session::{ScanSession, SessionManager};
use revenant_core::EngineConfig;

#[derive(Parser)]
#[command(name = "revenant", version, about = "NTFS deleted-file discovery and recovery")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scan a drive for deleted files via the USN journal and recycle bin.
    Scan {
        drive: String,
        #[arg(long)]
        save: bool,
        #[command(flatten)]
        forensics: ForensicsArgs,
    },
    /// Fetch and print the raw MFT record for a file reference.
    Record { drive: String, file_ref: u64 },
    /// Recover a deleted file.
    Recover {
        #[command(subcommand)]
        action: RecoverAction,
    },
    /// Inspect saved scan sessions.
    Session {
        #[command(subcommand)]
        action: SessionAction,
    },
}

#[derive(Subcommand)]
enum RecoverAction {
    /// Recover one file by its USN file reference.
    Usn {
        drive: String,
        file_ref: u64,
        output: PathBuf,
        #[command(flatten)]
        forensics: ForensicsArgs,
        #[arg(long)]
        no_overwrite: bool,
    },
    /// Recover a recycle-bin file directly from its `$I` metadata path.
    RecycleBin { i_file: PathBuf, output: PathBuf },
    /// Recover every candidate from a fresh scan into a directory.
    All {
        drive: String,
        out_dir: PathBuf,
        #[command(flatten)]
        forensics: ForensicsArgs,
        #[arg(long)]
        no_overwrite: bool,
    },
}

#[derive(Args)]
struct ForensicsArgs {
    /// Append an audit trail of scan/recovery events to this JSONL file.
    #[arg(long)]
    audit_log: Option<PathBuf>,
    /// Compute MD5/SHA-1/SHA-256 of each recovered file afterward.
    #[arg(long)]
    verify_hashes: bool,
}

impl ForensicsArgs {
    fn into_config(self, no_overwrite: bool) -> EngineConfig {
        EngineConfig {
            overwrite_existing_output: !no_overwrite,
            verify_hashes: self.verify_hashes,
            audit_log_path: self.audit_log,
            ..EngineConfig::default()
        }
    }
}

#[derive(Subcommand)]
enum SessionAction {
    List,
    Info { id: String },
    Delete { id: String },
    Cleanup { days: u32 },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Scan { drive, save, forensics } => run_scan(&drive, save, forensics).await?,
        Commands::Record { drive, file_ref } => run_record(&drive, file_ref).await?,
        Commands::Recover { action } => run_recover(action).await?,
        Commands::Session { action } => run_session(action)?,
    }

    Ok(())
}

async fn run_scan(drive: &str, save: bool, forensics: ForensicsArgs) -> Result<()> {
    let drive_letter = DriveLetter::parse(drive).context("invalid drive letter")?;
    let config = forensics.into_config(false);
    let candidates = revenant_core::scan(drive_letter, &config).await?;

    println!("found {} deleted file candidates on {drive_letter}", candidates.len());
    for c in &candidates {
        println!(
            "  [{:>3}] {:<10?} {}",
            c.confidence,
            c.source,
            c.full_path
        );
    }

    if save {
        let manager = SessionManager::new()?;
        let session = ScanSession {
            id: uuid::Uuid::new_v4(),
            drive: drive_letter.as_char(),
            created_at: chrono::Utc::now(),
            candidates,
        };
        manager.save(&session)?;
        println!("saved session {}", session.id);
    }

    Ok(())
}

async fn run_record(drive: &str, file_ref: u64) -> Result<()> {
    let drive_letter = DriveLetter::parse(drive).context("invalid drive letter")?;
    let record = revenant_core::get_file_record(drive_letter, FileRef(file_ref)).await?;
    println!("{record:#?}");
    Ok(())
}

async fn run_recover(action: RecoverAction) -> Result<()> {
    match action {
        RecoverAction::Usn { drive, file_ref, output, forensics, no_overwrite } => {
            run_recover_usn(&drive, file_ref, output, forensics, no_overwrite).await
        }
        RecoverAction::RecycleBin { i_file, output } => run_recover_recycle_bin(i_file, output),
        RecoverAction::All { drive, out_dir, forensics, no_overwrite } => {
            run_recover_all(&drive, out_dir, forensics, no_overwrite).await
        }
    }
}

async fn run_recover_usn(
    drive: &str,
    file_ref: u64,
    output: PathBuf,
    forensics: ForensicsArgs,
    no_overwrite: bool,
) -> Result<()> {
    let drive_letter = DriveLetter::parse(drive).context("invalid drive letter")?;
    let config = forensics.into_config(no_overwrite);
    let candidate = revenant_core::DeletedCandidate {
        source: revenant_core::CandidateSource::Usn,
        name: output.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default(),
        parent_path: String::new(),
        full_path: String::new(),
        size: None,
        deleted_time: None,
        confidence: 25,
        recovery_handle: RecoveryHandle::Usn { drive: drive_letter, file_ref: FileRef(file_ref) },
    };
    revenant_core::recover_candidate(candidate, output.clone(), &config).await?;
    println!("recovered to {}", output.display());
    Ok(())
}

fn run_recover_recycle_bin(i_file: PathBuf, output: PathBuf) -> Result<()> {
    revenant_core::recyclebin::recover_from_i_file(&i_file, &output)?;
    println!("recovered to {}", output.display());
    Ok(())
}

async fn run_recover_all(
    drive: &str,
    out_dir: PathBuf,
    forensics: ForensicsArgs,
    no_overwrite: bool,
) -> Result<()> {
    let drive_letter = DriveLetter::parse(drive).context("invalid drive letter")?;
    let config = forensics.into_config(no_overwrite);
    std::fs::create_dir_all(&out_dir)?;
    let candidates = revenant_core::scan(drive_letter, &config).await?;

    let jobs: Vec<_> = candidates
        .into_iter()
        .enumerate()
        .map(|(i, c)| {
            let out = out_dir.join(format!("{i:04}_{}", c.name));
            (c, out)
        })
        .collect();

    let results = revenant_core::recover_many_blocking(jobs, &config);
    let (ok, failed): (Vec<_>, Vec<_>) = results.into_iter().partition(|(_, r)| r.is_ok());
    println!("recovered {} files, {} failed", ok.len(), failed.len());
    for (path, result) in failed {
        if let Err(e) = result {
            eprintln!("  failed: {path}: {e}");
        }
    }
    Ok(())
}

fn run_session(action: SessionAction) -> Result<()> {
    let manager = SessionManager::new()?;
    match action {
        SessionAction::List => {
            for summary in manager.list()? {
                println!(
                    "{} [{}] {} candidates ({})",
                    summary.id, summary.drive, summary.candidate_count, summary.created_at
                );
            }
        }
        SessionAction::Info { id } => {
            let session = manager.load(&id)?;
            println!("{session:#?}");
        }
        SessionAction::Delete { id } => {
            manager.delete(&id)?;
            println!("deleted session {id}");
        }
        SessionAction::Cleanup { days } => {
            let removed = manager.cleanup(days)?;
            println!("removed {removed} sessions older than {days} days");
        }
    }
    Ok(())
}
