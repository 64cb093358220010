use std::cmp::Ordering;
use std::iter::{FusedIterator, Peekable};

use serde::{Deserialize, Serialize};

use crate::data::key::{JoinKey, KeySpec};
use crate::data::record::ParticleRecord;

/// A before-plane crossing joined with an after-plane crossing of the same
/// traversal.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct PairedRecord {
    pub before: ParticleRecord,
    pub after: ParticleRecord,
    pub key_spec: KeySpec,
}

impl PairedRecord {
    pub fn new(before: ParticleRecord, after: ParticleRecord, key_spec: KeySpec) -> Self {
        PairedRecord { before, after, key_spec }
    }

    pub fn key(&self) -> JoinKey {
        self.key_spec.key(&self.after)
    }

    pub fn run_id(&self) -> i32 {
        self.after.run_id
    }

    pub fn event_id(&self) -> i32 {
        self.after.event_id
    }

    pub fn track_id_in(&self) -> i32 {
        self.before.track_id
    }

    pub fn track_id_out(&self) -> i32 {
        self.after.track_id
    }

    /// Track id reported as the exit track. Under nuclear exclusion this is
    /// the shared key track; otherwise the after record's own track, which
    /// differs from the incoming one when a nuclear interaction happened.
    pub fn exit_track_id(&self) -> i32 {
        self.after.track_id
    }

    pub fn kinetic_energy_in(&self) -> f64 {
        self.before.kinetic_energy
    }

    pub fn kinetic_energy_out(&self) -> f64 {
        self.after.kinetic_energy
    }
}

/// Sorted merge-join of a deduplicated before stream with an after stream.
///
/// Both inputs must be sorted ascending by `key_spec`. The before cursor is
/// only moved forward while its key is below the current after key, so one
/// before record is paired with every after record sharing its key. Output
/// follows the order of the after stream. The join stops for good once
/// either side is exhausted.
pub struct PairingJoin<B, A>
where
    B: Iterator<Item = ParticleRecord>,
    A: Iterator<Item = ParticleRecord>,
{
    before: Peekable<B>,
    after: A,
    key_spec: KeySpec,
    exhausted: bool,
}

impl<B, A> PairingJoin<B, A>
where
    B: Iterator<Item = ParticleRecord>,
    A: Iterator<Item = ParticleRecord>,
{
    pub fn new<BI, AI>(before: BI, after: AI, key_spec: KeySpec) -> Self
    where
        BI: IntoIterator<Item = ParticleRecord, IntoIter = B>,
        AI: IntoIterator<Item = ParticleRecord, IntoIter = A>,
    {
        PairingJoin {
            before: before.into_iter().peekable(),
            after: after.into_iter(),
            key_spec,
            exhausted: false,
        }
    }

    pub fn key_spec(&self) -> KeySpec {
        self.key_spec
    }
}

impl<B, A> Iterator for PairingJoin<B, A>
where
    B: Iterator<Item = ParticleRecord>,
    A: Iterator<Item = ParticleRecord>,
{
    type Item = PairedRecord;

    fn next(&mut self) -> Option<PairedRecord> {
        while !self.exhausted {
            let after = match self.after.next() {
                Some(record) => record,
                None => {
                    self.exhausted = true;
                    break;
                }
            };
            let after_key = self.key_spec.key(&after);

            loop {
                let before = match self.before.peek() {
                    Some(record) => record,
                    None => {
                        self.exhausted = true;
                        break;
                    }
                };
                match self.key_spec.key(before).cmp(&after_key) {
                    Ordering::Less => {
                        self.before.next();
                    }
                    Ordering::Equal => {
                        return Some(PairedRecord::new(*before, after, self.key_spec));
                    }
                    // no before record carries this key, move on with the after stream
                    Ordering::Greater => break,
                }
            }
        }
        None
    }
}

impl<B, A> FusedIterator for PairingJoin<B, A>
where
    B: Iterator<Item = ParticleRecord>,
    A: Iterator<Item = ParticleRecord>,
{
}

/// Eagerly join two sorted streams, see [`PairingJoin`].
pub fn pair_records(
    before: Vec<ParticleRecord>,
    after: Vec<ParticleRecord>,
    key_spec: KeySpec,
) -> Vec<PairedRecord> {
    PairingJoin::new(before, after, key_spec).collect()
}
