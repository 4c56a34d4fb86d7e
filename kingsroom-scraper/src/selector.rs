//! Identifier selector
//!
//! Expands a run mode into an ordered candidate sequence. Finite modes are
//! materialized lazily as well, so `auto` without a `max_id` can be driven
//! until the controller's stop conditions end it.

use crate::error::{ScrapeError, ScrapeResult};
use crate::models::RunMode;

/// Ordered, lazily produced candidate identifiers
#[derive(Debug, Clone)]
pub enum CandidateSequence {
    /// Caller-supplied identifiers, verbatim
    Explicit(std::vec::IntoIter<u64>),
    /// Ascending inclusive range
    Range { next: u64, end: u64, exhausted: bool },
    /// Ascending without upper bound (or bounded by `max_id`)
    Open { next: Option<u64>, max_id: Option<u64> },
}

impl CandidateSequence {
    fn explicit(ids: Vec<u64>) -> Self {
        CandidateSequence::Explicit(ids.into_iter())
    }

    fn range(start: u64, end: u64) -> Self {
        CandidateSequence::Range {
            next: start,
            end,
            exhausted: start > end,
        }
    }

    fn empty() -> Self {
        CandidateSequence::explicit(Vec::new())
    }
}

impl Iterator for CandidateSequence {
    type Item = u64;

    fn next(&mut self) -> Option<u64> {
        match self {
            CandidateSequence::Explicit(ids) => ids.next(),
            CandidateSequence::Range {
                next,
                end,
                exhausted,
            } => {
                if *exhausted {
                    return None;
                }
                let current = *next;
                if current >= *end {
                    *exhausted = true;
                } else {
                    *next = current + 1;
                }
                Some(current)
            }
            CandidateSequence::Open { next, max_id } => {
                let current = (*next)?;
                if max_id.is_some_and(|max| current > max) {
                    *next = None;
                    return None;
                }
                *next = current.checked_add(1);
                Some(current)
            }
        }
    }
}

/// Expand a run mode; `last_known` is the last processed identifier for
/// bulk/auto and is ignored by every other mode
pub fn select(mode: &RunMode, last_known: Option<u64>) -> ScrapeResult<CandidateSequence> {
    match mode {
        RunMode::Single { id } => Ok(CandidateSequence::explicit(vec![*id])),
        RunMode::Range { start_id, end_id } => Ok(CandidateSequence::range(*start_id, *end_id)),
        RunMode::Gaps { ids } | RunMode::Refresh { ids } => {
            Ok(CandidateSequence::explicit(ids.clone()))
        }
        RunMode::Bulk { count } => {
            let last = require_last_known(mode, last_known)?;
            if *count == 0 {
                return Ok(CandidateSequence::empty());
            }
            match last.checked_add(1) {
                Some(start) => Ok(CandidateSequence::range(start, start.saturating_add(count - 1))),
                None => Ok(CandidateSequence::empty()),
            }
        }
        RunMode::Auto { max_id } => {
            let last = require_last_known(mode, last_known)?;
            Ok(CandidateSequence::Open {
                next: last.checked_add(1),
                max_id: *max_id,
            })
        }
    }
}

fn require_last_known(mode: &RunMode, last_known: Option<u64>) -> ScrapeResult<u64> {
    last_known.ok_or_else(|| {
        ScrapeError::Configuration(format!(
            "{} mode requires a last known processed identifier",
            mode.name()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(mode: RunMode, last: Option<u64>) -> Vec<u64> {
        select(&mode, last).unwrap().collect()
    }

    #[test]
    fn test_single() {
        assert_eq!(collect(RunMode::Single { id: 9 }, None), vec![9]);
    }

    #[test]
    fn test_range_inclusive_ascending() {
        assert_eq!(
            collect(RunMode::Range { start_id: 1000, end_id: 1002 }, None),
            vec![1000, 1001, 1002]
        );
        assert_eq!(collect(RunMode::Range { start_id: 5, end_id: 5 }, None), vec![5]);
    }

    #[test]
    fn test_inverted_range_is_empty_not_swapped() {
        for (start, end) in [(10, 9), (1002, 1000), (u64::MAX, 0)] {
            assert!(collect(RunMode::Range { start_id: start, end_id: end }, None).is_empty());
        }
    }

    #[test]
    fn test_range_reaching_u64_max_terminates() {
        let ids = collect(
            RunMode::Range {
                start_id: u64::MAX - 1,
                end_id: u64::MAX,
            },
            None,
        );
        assert_eq!(ids, vec![u64::MAX - 1, u64::MAX]);
    }

    #[test]
    fn test_gaps_used_verbatim() {
        assert_eq!(collect(RunMode::Gaps { ids: vec![7, 3, 7, 1] }, None), vec![7, 3, 7, 1]);
    }

    #[test]
    fn test_bulk_follows_last_known() {
        assert_eq!(collect(RunMode::Bulk { count: 3 }, Some(100)), vec![101, 102, 103]);
        assert!(collect(RunMode::Bulk { count: 0 }, Some(100)).is_empty());
    }

    #[test]
    fn test_bulk_and_auto_fail_fast_without_context() {
        assert!(matches!(
            select(&RunMode::Bulk { count: 3 }, None),
            Err(ScrapeError::Configuration(_))
        ));
        assert!(matches!(
            select(&RunMode::Auto { max_id: Some(10) }, None),
            Err(ScrapeError::Configuration(_))
        ));
    }

    #[test]
    fn test_auto_bounded_by_max_id() {
        assert_eq!(collect(RunMode::Auto { max_id: Some(53) }, Some(50)), vec![51, 52, 53]);
        assert!(collect(RunMode::Auto { max_id: Some(50) }, Some(50)).is_empty());
    }

    #[test]
    fn test_auto_open_ended() {
        let seq = select(&RunMode::Auto { max_id: None }, Some(0)).unwrap();
        assert_eq!(seq.take(4).collect::<Vec<_>>(), vec![1, 2, 3, 4]);
    }

    #[test]
    fn test_refresh_uses_explicit_ids() {
        assert_eq!(collect(RunMode::Refresh { ids: vec![4, 2] }, None), vec![4, 2]);
    }
}
