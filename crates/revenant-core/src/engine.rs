//! Async entry points: `scan`, `get_file_record`, and `recover_data_runs`
//! each run as a single sequential background task with exactly one
//! completion, dispatched via `tokio::task::spawn_blocking` since the
//! underlying work is synchronous device I/O.

use std::path::PathBuf;

use tracing::{info, instrument, warn};

use crate::confidence::{confidence_for_usn, ConfidenceOverrides};
use crate::error::Result;
use crate::forensics::audit::{AuditEvent, AuditEventType, AuditLogger};
use crate::forensics::verification::hash_file_all;
use crate::merge::merge_candidates;
use crate::model::{
    CandidateSource, DeletedCandidate, DriveLetter, FileRecordDetails, FileRef, RecoveryHandle,
    RunSegment,
};
use crate::recovery;
use crate::recyclebin::{self, recover_recycle_bin_file};
use crate::usn;
use crate::volume::{Volume, USN_ENUM_BUFFER_SIZE};

/// Layered configuration for the engine: buffer sizing, confidence
/// overrides, output overwrite policy, and opt-in forensic features.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    pub overwrite_existing_output: bool,
    pub verify_hashes: bool,
    pub audit_log_path: Option<PathBuf>,
    pub usn_buffer_size: usize,
    pub confidence_overrides: ConfidenceOverrides,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            overwrite_existing_output: true,
            verify_hashes: false,
            audit_log_path: None,
            usn_buffer_size: USN_ENUM_BUFFER_SIZE,
            confidence_overrides: ConfidenceOverrides::default(),
        }
    }
}

fn open_audit_logger(session_id: &str, config: &EngineConfig) -> Option<AuditLogger> {
    let path = config.audit_log_path.as_ref()?;
    match AuditLogger::open(session_id, path) {
        Ok(logger) => Some(logger),
        Err(e) => {
            warn!(error = %e, "failed to open audit log, continuing without it");
            None
        }
    }
}

fn log_event(logger: &Option<AuditLogger>, event_type: AuditEventType, message: impl Into<String>) {
    if let Some(logger) = logger {
        if let Err(e) = logger.log(AuditEvent::new(event_type, message)) {
            warn!(error = %e, "failed to write audit entry");
        }
    }
}

/// `scan(drive) -> [Candidate]`: enumerate the USN journal and the recycle
/// bin, then merge.
#[instrument(skip(config))]
pub async fn scan(drive: DriveLetter, config: &EngineConfig) -> Result<Vec<DeletedCandidate>> {
    let config = config.clone();
    tokio::task::spawn_blocking(move || scan_blocking(drive, &config)).await?
}

fn scan_blocking(drive: DriveLetter, config: &EngineConfig) -> Result<Vec<DeletedCandidate>> {
    let audit = open_audit_logger("scan", config);
    log_event(&audit, AuditEventType::ScanStart, format!("scan started on {drive}"));

    let volume = Volume::open(drive)?;
    let usn_result = usn::scan_journal(&volume, config.usn_buffer_size)?;

    let overrides = Some(&config.confidence_overrides);
    let usn_candidates: Vec<DeletedCandidate> = usn_result
        .deletions
        .iter()
        .map(|deletion| {
            let parent_path = usn::resolve_path(drive, deletion.parent_ref, &usn_result.identifiers);
            let full_path = if parent_path.ends_with('\\') {
                format!("{parent_path}{}", deletion.name)
            } else {
                format!("{parent_path}\\{}", deletion.name)
            };
            DeletedCandidate {
                source: CandidateSource::Usn,
                name: deletion.name.clone(),
                parent_path,
                full_path,
                size: None,
                deleted_time: chrono::DateTime::from_timestamp_millis(deletion.timestamp_ms),
                confidence: confidence_for_usn(overrides),
                recovery_handle: RecoveryHandle::Usn { drive, file_ref: deletion.file_ref },
            }
        })
        .collect();

    let drive_root = PathBuf::from(drive.root_prefix());
    let recycle_bin_candidates = recyclebin::scan_recycle_bin(&drive_root, drive.as_char(), overrides);

    for candidate in usn_candidates.iter().chain(recycle_bin_candidates.iter()) {
        log_event(&audit, AuditEventType::CandidateFound, candidate.full_path.clone());
    }

    info!(
        usn_count = usn_candidates.len(),
        recycle_bin_count = recycle_bin_candidates.len(),
        "scan complete"
    );

    let merged = merge_candidates(usn_candidates, recycle_bin_candidates);
    log_event(&audit, AuditEventType::ScanComplete, format!("{} candidates merged", merged.len()));

    Ok(merged)
}

/// `getFileRecord(drive, fileRef) -> FileRecordDetails`.
#[instrument]
pub async fn get_file_record(drive: DriveLetter, file_ref: FileRef) -> Result<FileRecordDetails> {
    tokio::task::spawn_blocking(move || {
        let volume = Volume::open(drive)?;
        let geometry = volume.query_geometry()?;
        recovery::fetch_file_record(&volume, file_ref, geometry.cluster_size())
    })
    .await?
}

/// `recoverDataRuns(drive, runs, clusterSize, fileSize, outputPath) -> ()`:
/// the direct run-list recovery entry point, for callers who already hold a
/// parsed run list (e.g. from a previously fetched file record) and do not
/// want the engine to re-fetch it.
#[instrument(skip(runs))]
pub async fn recover_data_runs(
    drive: DriveLetter,
    runs: Vec<RunSegment>,
    cluster_size: u64,
    file_size: u64,
    output_path: PathBuf,
) -> Result<()> {
    tokio::task::spawn_blocking(move || {
        let volume = Volume::open(drive)?;
        recovery::recover_data_runs(&volume, &runs, cluster_size, file_size, &output_path, None)
    })
    .await?
}

/// Recover one merged candidate end-to-end, dispatching on its recovery
/// handle. When `config.audit_log_path` is set, appends
/// `RecoveryStart`/`RecoveryComplete`/`RecoveryFailed` entries around the
/// attempt; when `config.verify_hashes` is set, hashes the output file
/// afterward and logs the digests.
#[instrument(skip(candidate, config))]
pub async fn recover_candidate(
    candidate: DeletedCandidate,
    output_path: PathBuf,
    config: &EngineConfig,
) -> Result<()> {
    let config = config.clone();

    if !config.overwrite_existing_output && output_path.exists() {
        return Err(crate::error::EngineError::InvalidArgument(format!(
            "{} already exists and overwrite_existing_output is false",
            output_path.display()
        )));
    }

    let audit = open_audit_logger("recovery", &config);
    let full_path = candidate.full_path.clone();
    log_event(&audit, AuditEventType::RecoveryStart, full_path.clone());

    let output_for_task = output_path.clone();
    let result = match candidate.recovery_handle {
        RecoveryHandle::Usn { drive, file_ref } => {
            tokio::task::spawn_blocking(move || {
                recovery::recover_file_by_ref(drive, file_ref, &output_for_task, None)
            })
            .await?
        }
        RecoveryHandle::RecycleBin { data_path } => {
            let recorded_size = candidate.size;
            tokio::task::spawn_blocking(move || {
                recover_recycle_bin_file(data_path.as_ref(), recorded_size, &output_for_task)
            })
            .await?
        }
    };

    match &result {
        Ok(()) => log_event(&audit, AuditEventType::RecoveryComplete, full_path.clone()),
        Err(e) => log_event(&audit, AuditEventType::RecoveryFailed, format!("{full_path}: {e}")),
    }
    result?;

    if config.verify_hashes {
        match hash_file_all(&output_path) {
            Ok(hashes) => {
                for hash in &hashes {
                    log_event(
                        &audit,
                        AuditEventType::RecoveryComplete,
                        format!("{} {} = {}", full_path, hash.algorithm.name(), hash.hash),
                    );
                }
                info!(count = hashes.len(), "computed post-recovery hashes");
            }
            Err(e) => warn!(error = %e, "failed computing post-recovery hashes"),
        }
    }

    Ok(())
}

/// Batch recovery of several independent candidates: concurrent independent
/// calls are permitted, each owning its own volume handle. Runs each
/// recovery on a Rayon worker so a failure in one candidate doesn't block
/// the others.
pub fn recover_many_blocking(
    jobs: Vec<(DeletedCandidate, PathBuf)>,
    config: &EngineConfig,
) -> Vec<(String, Result<()>)> {
    use rayon::prelude::*;

    jobs.into_par_iter()
        .map(|(candidate, output_path)| {
            let full_path = candidate.full_path.clone();
            if !config.overwrite_existing_output && output_path.exists() {
                return (
                    full_path,
                    Err(crate::error::EngineError::InvalidArgument(format!(
                        "{} already exists and overwrite_existing_output is false",
                        output_path.display()
                    ))),
                );
            }
            let result = match candidate.recovery_handle {
                RecoveryHandle::Usn { drive, file_ref } => {
                    recovery::recover_file_by_ref(drive, file_ref, &output_path, None)
                }
                RecoveryHandle::RecycleBin { ref data_path } => {
                    recover_recycle_bin_file(data_path.as_ref(), candidate.size, &output_path)
                }
            };
            (full_path, result)
        })
        .collect()
}
