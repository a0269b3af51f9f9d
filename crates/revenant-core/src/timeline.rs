//! Timeline view (expansion): groups a merged, time-sorted candidate
//! list by UTC calendar day for chronological inspection.
//!
//! Scoped down from a multi-filesystem deletion-pattern analyzer to a pure
//! grouping function over this crate's `DeletedCandidate` shape — pattern
//! detection (burst deletion, suspicious activity scoring) has no
//! counterpart in this spec and was dropped.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::model::DeletedCandidate;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimelineDay {
    pub date: NaiveDate,
    pub candidates: Vec<DeletedCandidate>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Timeline {
    pub days: Vec<TimelineDay>,
    pub undated: Vec<DeletedCandidate>,
}

/// Group `candidates` (already merged and time-sorted,) into calendar
/// days, newest day first, keeping the merger's within-day ordering.
/// Candidates with no `deleted_time` collect into a trailing undated bucket.
pub fn build_timeline(candidates: Vec<DeletedCandidate>) -> Timeline {
    let mut days: Vec<TimelineDay> = Vec::new();
    let mut undated: Vec<DeletedCandidate> = Vec::new();

    for candidate in candidates {
        match candidate.deleted_time {
            Some(ts) => {
                let date = ts.date_naive();
                match days.last_mut() {
                    Some(day) if day.date == date => day.candidates.push(candidate),
                    _ => days.push(TimelineDay { date, candidates: vec![candidate] }),
                }
            }
            None => undated.push(candidate),
        }
    }

    Timeline { days, undated }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CandidateSource, RecoveryHandle};
    use chrono::{TimeZone, Utc};

    fn candidate(path: &str, ms: Option<i64>) -> DeletedCandidate {
        DeletedCandidate {
            source: CandidateSource::Usn,
            name: path.to_string(),
            parent_path: String::new(),
            full_path: path.to_string(),
            size: None,
            deleted_time: ms.map(|m| Utc.timestamp_millis_opt(m).unwrap()),
            confidence: 25,
            recovery_handle: RecoveryHandle::RecycleBin { data_path: None },
        }
    }

    #[test]
    fn groups_same_day_candidates_together() {
        let day_ms = 1_700_000_000_000i64;
        let candidates = vec![
            candidate("a", Some(day_ms)),
            candidate("b", Some(day_ms + 1_000)),
        ];
        let timeline = build_timeline(candidates);
        assert_eq!(timeline.days.len(), 1);
        assert_eq!(timeline.days[0].candidates.len(), 2);
        assert!(timeline.undated.is_empty());
    }

    #[test]
    fn separates_undated_candidates() {
        let candidates = vec![candidate("a", None), candidate("b", Some(1_700_000_000_000))];
        let timeline = build_timeline(candidates);
        assert_eq!(timeline.days.len(), 1);
        assert_eq!(timeline.undated.len(), 1);
    }
}
