//! Merger: deduplicates USN and recycle-bin candidates by full-path
//! key, preferring the recycle-bin source on collision, then sorts by
//! deletion time descending.

use std::collections::HashMap;

use crate::model::{CandidateSource, DeletedCandidate};

/// Merge two candidate lists into one, deduplicated and time-sorted.
pub fn merge_candidates(
    usn_candidates: Vec<DeletedCandidate>,
    recycle_bin_candidates: Vec<DeletedCandidate>,
) -> Vec<DeletedCandidate> {
    let mut by_path: HashMap<String, DeletedCandidate> = HashMap::new();

    for candidate in usn_candidates {
        by_path.insert(candidate.full_path.to_ascii_lowercase(), candidate);
    }
    for candidate in recycle_bin_candidates {
        let key = candidate.full_path.to_ascii_lowercase();
        match by_path.get(&key) {
            Some(existing) if existing.source == CandidateSource::RecycleBin => {}
            _ => {
                by_path.insert(key, candidate);
            }
        }
    }

    let mut merged: Vec<DeletedCandidate> = by_path.into_values().collect();
    merged.sort_by(|a, b| b.deleted_time.cmp(&a.deleted_time));
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::RecoveryHandle;
    use chrono::{TimeZone, Utc};

    fn candidate(source: CandidateSource, path: &str, ms: i64) -> DeletedCandidate {
        DeletedCandidate {
            source,
            name: path.rsplit('\\').next().unwrap().to_string(),
            parent_path: String::new(),
            full_path: path.to_string(),
            size: None,
            deleted_time: Some(Utc.timestamp_millis_opt(ms).unwrap()),
            confidence: if source == CandidateSource::RecycleBin { 94 } else { 25 },
            recovery_handle: RecoveryHandle::RecycleBin { data_path: None },
        }
    }

    #[test]
    fn recycle_bin_wins_on_collision() {
        let usn = vec![candidate(CandidateSource::Usn, r"D:\a.txt", 100)];
        let rb = vec![candidate(CandidateSource::RecycleBin, r"D:\a.txt", 200)];
        let merged = merge_candidates(usn, rb);
        assert_eq!(merged.len(), 1);
        assert_eq!(merged[0].source, CandidateSource::RecycleBin);
    }

    #[test]
    fn sorts_by_deleted_time_descending() {
        let usn = vec![
            candidate(CandidateSource::Usn, r"D:\old.txt", 100),
            candidate(CandidateSource::Usn, r"D:\new.txt", 300),
        ];
        let merged = merge_candidates(usn, Vec::new());
        assert_eq!(merged[0].full_path, r"D:\new.txt");
        assert_eq!(merged[1].full_path, r"D:\old.txt");
    }

    #[test]
    fn path_match_is_case_insensitive() {
        let usn = vec![candidate(CandidateSource::Usn, r"D:\A.TXT", 100)];
        let rb = vec![candidate(CandidateSource::RecycleBin, r"D:\a.txt", 200)];
        let merged = merge_candidates(usn, rb);
        assert_eq!(merged.len(), 1);
    }
}
