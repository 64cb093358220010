use std::fmt::Display;

use serde::{Deserialize, Serialize};

use crate::data::record::ParticleRecord;

/// Which record fields take part in matching before and after crossings.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeySpec {
    /// Match on (run, event); secondary tracks pair with the primary.
    #[default]
    RunEvent,
    /// Match on (run, event, track); drops pairs where a nuclear
    /// interaction changed the outgoing track.
    RunEventTrack,
}

impl KeySpec {
    pub fn from_exclude_nuclear(exclude_nuclear: bool) -> Self {
        match exclude_nuclear {
            true => KeySpec::RunEventTrack,
            false => KeySpec::RunEvent,
        }
    }

    pub fn excludes_nuclear(&self) -> bool {
        matches!(self, KeySpec::RunEventTrack)
    }

    pub fn key(&self, record: &ParticleRecord) -> JoinKey {
        let track_id = match self {
            KeySpec::RunEvent => None,
            KeySpec::RunEventTrack => Some(record.track_id),
        };
        JoinKey {
            run_id: record.run_id,
            event_id: record.event_id,
            track_id,
        }
    }

    pub fn to_str(&self) -> &str {
        match self {
            KeySpec::RunEvent => "RunID,EventID",
            KeySpec::RunEventTrack => "RunID,EventID,TrackID",
        }
    }
}

impl Display for KeySpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

/// Join key of a record. Field order defines the lexicographic ordering
/// both streams have to be sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct JoinKey {
    pub run_id: i32,
    pub event_id: i32,
    pub track_id: Option<i32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_event_key_ignores_track() {
        let spec = KeySpec::RunEvent;
        let primary = ParticleRecord::with_ids(0, 4, 1);
        let fragment = ParticleRecord::with_ids(0, 4, 7);
        assert_eq!(spec.key(&primary), spec.key(&fragment));
    }

    #[test]
    fn test_track_breaks_ties_after_event() {
        let spec = KeySpec::RunEventTrack;
        let a = spec.key(&ParticleRecord::with_ids(0, 4, 9));
        let b = spec.key(&ParticleRecord::with_ids(0, 5, 1));
        let c = spec.key(&ParticleRecord::with_ids(0, 5, 2));
        let d = spec.key(&ParticleRecord::with_ids(1, 0, 0));
        assert!(a < b && b < c && c < d);
    }

    #[test]
    fn test_from_exclude_nuclear() {
        assert_eq!(KeySpec::from_exclude_nuclear(true), KeySpec::RunEventTrack);
        assert_eq!(KeySpec::from_exclude_nuclear(false), KeySpec::RunEvent);
        assert!(KeySpec::RunEventTrack.excludes_nuclear());
        assert_eq!(KeySpec::RunEvent.to_string(), "RunID,EventID");
    }
}
