use itertools::Itertools;

use crate::data::key::KeySpec;
use crate::data::record::ParticleRecord;

/// Lazily collapse consecutive records sharing a join key, keeping the first
/// one of every run. On key-sorted input all duplicates are adjacent, so the
/// result holds one record per distinct key in original order.
pub fn dedup_first_iter<I>(records: I, spec: KeySpec) -> impl Iterator<Item = ParticleRecord>
where
    I: IntoIterator<Item = ParticleRecord>,
{
    records
        .into_iter()
        .dedup_by(move |a, b| spec.key(a) == spec.key(b))
}

/// Collapse a key-sorted stream to the first record of every join key.
///
/// # Arguments
///
/// * `records` - records sorted ascending by `spec`
/// * `spec` - the join key used for pairing
///
/// # Returns
///
/// * one record per distinct key, in original relative order
///
pub fn dedup_first(records: Vec<ParticleRecord>, spec: KeySpec) -> Vec<ParticleRecord> {
    dedup_first_iter(records, spec).collect()
}
