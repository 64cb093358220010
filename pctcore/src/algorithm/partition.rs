use std::iter::{FusedIterator, Peekable};
use std::ops::Range;

use serde::{Deserialize, Serialize};

use crate::algorithm::join::PairedRecord;

/// Half-open range of run ids `[min_run, max_run)`; `max_run = None` is
/// unbounded.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunRange {
    pub min_run: i32,
    pub max_run: Option<i32>,
}

impl Default for RunRange {
    fn default() -> Self {
        RunRange { min_run: 0, max_run: None }
    }
}

impl RunRange {
    pub fn new(min_run: i32, max_run: Option<i32>) -> Self {
        RunRange { min_run, max_run }
    }

    pub fn contains(&self, run_id: i32) -> bool {
        run_id >= self.min_run && self.max_run.map_or(true, |max| run_id < max)
    }

    /// True once `run_id` lies at or past the upper bound.
    pub fn is_past(&self, run_id: i32) -> bool {
        self.max_run.is_some_and(|max| run_id >= max)
    }

    /// Runs worth visiting given that no data exists at or past
    /// `observed_end` (largest observed run id + 1). Widened to `i64` so a
    /// run at `i32::MAX` still has an end.
    pub fn runs_up_to(&self, observed_end: i64) -> Range<i64> {
        let min_run = i64::from(self.min_run);
        let end = self
            .max_run
            .map_or(observed_end, |max| i64::from(max).min(observed_end));
        min_run..end.max(min_run)
    }
}

/// All pairs of one run, in join order.
#[derive(Debug, Clone, PartialEq)]
pub struct RunBatch {
    pub run_id: i32,
    pub pairs: Vec<PairedRecord>,
}

impl RunBatch {
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// Groups a run-sorted pair stream into per-run batches while it is being
/// produced. Pairs below `min_run` are skipped, the first pair at or past
/// `max_run` ends the iteration, and runs without pairs never show up.
pub struct RunBatches<I>
where
    I: Iterator<Item = PairedRecord>,
{
    pairs: Peekable<I>,
    range: RunRange,
    done: bool,
}

impl<I> RunBatches<I>
where
    I: Iterator<Item = PairedRecord>,
{
    pub fn new<P>(pairs: P, range: RunRange) -> Self
    where
        P: IntoIterator<Item = PairedRecord, IntoIter = I>,
    {
        RunBatches {
            pairs: pairs.into_iter().peekable(),
            range,
            done: false,
        }
    }
}

impl<I> Iterator for RunBatches<I>
where
    I: Iterator<Item = PairedRecord>,
{
    type Item = RunBatch;

    fn next(&mut self) -> Option<RunBatch> {
        if self.done {
            return None;
        }

        let first = loop {
            match self.pairs.next() {
                Some(pair) if self.range.is_past(pair.run_id()) => {
                    self.done = true;
                    return None;
                }
                Some(pair) if pair.run_id() < self.range.min_run => continue,
                Some(pair) => break pair,
                None => {
                    self.done = true;
                    return None;
                }
            }
        };

        let run_id = first.run_id();
        let mut pairs = vec![first];
        while let Some(pair) = self.pairs.next_if(|p| p.run_id() == run_id) {
            pairs.push(pair);
        }

        Some(RunBatch { run_id, pairs })
    }
}

impl<I> FusedIterator for RunBatches<I> where I: Iterator<Item = PairedRecord> {}

/// Eager variant of [`RunBatches`] over an already materialized pair list.
pub fn partition_runs(pairs: Vec<PairedRecord>, range: RunRange) -> Vec<RunBatch> {
    RunBatches::new(pairs, range).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::key::KeySpec;
    use crate::data::record::ParticleRecord;

    fn pair(run_id: i32, event_id: i32) -> PairedRecord {
        let record = ParticleRecord::with_ids(run_id, event_id, 1);
        PairedRecord::new(record, record, KeySpec::RunEvent)
    }

    fn pairs(ids: &[(i32, i32)]) -> Vec<PairedRecord> {
        ids.iter().map(|&(r, e)| pair(r, e)).collect()
    }

    #[test]
    fn test_partition_is_complete_and_disjoint() {
        let all = pairs(&[(0, 0), (0, 1), (2, 0), (2, 3), (2, 4), (5, 1)]);

        let batches = partition_runs(all.clone(), RunRange::default());

        let run_ids: Vec<i32> = batches.iter().map(|b| b.run_id).collect();
        assert_eq!(run_ids, vec![0, 2, 5]);
        assert_eq!(batches.iter().map(RunBatch::len).collect::<Vec<_>>(), vec![2, 3, 1]);
        let rejoined: Vec<PairedRecord> = batches.into_iter().flat_map(|b| b.pairs).collect();
        assert_eq!(rejoined, all);
    }

    #[test]
    fn test_range_bounds_are_half_open() {
        let all = pairs(&[(0, 0), (1, 0), (2, 0), (2, 1), (3, 0)]);

        let batches = partition_runs(all, RunRange::new(1, Some(3)));

        let run_ids: Vec<i32> = batches.iter().map(|b| b.run_id).collect();
        assert_eq!(run_ids, vec![1, 2]);
        assert_eq!(batches[1].len(), 2);
    }

    #[test]
    fn test_range_without_data_yields_nothing() {
        let all = pairs(&[(0, 0), (1, 0)]);
        assert!(partition_runs(all.clone(), RunRange::new(5, Some(9))).is_empty());
        assert!(partition_runs(all, RunRange::new(1, Some(1))).is_empty());
        assert!(partition_runs(Vec::new(), RunRange::default()).is_empty());
    }

    #[test]
    fn test_stops_at_upper_bound_without_draining() {
        let mut consumed = 0;
        let source = pairs(&[(0, 0), (1, 0), (7, 0), (8, 0)])
            .into_iter()
            .inspect(|_| consumed += 1);

        let batches: Vec<RunBatch> = RunBatches::new(source, RunRange::new(0, Some(2))).collect();

        assert_eq!(batches.len(), 2);
        assert_eq!(consumed, 3);
    }

    #[test]
    fn test_runs_up_to() {
        assert_eq!(RunRange::default().runs_up_to(4), 0..4);
        assert_eq!(RunRange::new(2, Some(3)).runs_up_to(10), 2..3);
        assert_eq!(RunRange::new(6, None).runs_up_to(4), 6..6);

        let last = i64::from(i32::MAX) + 1;
        assert_eq!(RunRange::new(i32::MAX, None).runs_up_to(last), i64::from(i32::MAX)..last);
        assert_eq!(RunRange::new(0, Some(i32::MAX)).runs_up_to(last), 0..i64::from(i32::MAX));
        assert!(RunRange::new(1, Some(3)).contains(2));
        assert!(!RunRange::new(1, Some(3)).contains(3));
        assert!(RunRange::new(1, None).contains(i32::MAX));
    }
}
