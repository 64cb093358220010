use pctcore::{KeySpec, ParticleRecord, RunRange};

use crate::config::AxisMapping;
use crate::error::{PairError, Result};

/// Branch / column names every phase space has to provide.
pub const REQUIRED_FIELDS: [&str; 11] = [
    "RunID",
    "EventID",
    "TrackID",
    "KineticEnergy",
    "GlobalTime",
    "Position_X",
    "Position_Y",
    "Position_Z",
    "Direction_X",
    "Direction_Y",
    "Direction_Z",
];

/// Column store of a phase space in the simulation frame, one vector per
/// field, positions and directions indexed by x, y, z.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhaseSpaceColumns {
    pub run_id: Vec<i32>,
    pub event_id: Vec<i32>,
    pub track_id: Vec<i32>,
    pub kinetic_energy: Vec<f64>,
    pub global_time: Vec<f64>,
    pub position: [Vec<f64>; 3],
    pub direction: [Vec<f64>; 3],
}

impl PhaseSpaceColumns {
    pub fn with_capacity(capacity: usize) -> Self {
        PhaseSpaceColumns {
            run_id: Vec::with_capacity(capacity),
            event_id: Vec::with_capacity(capacity),
            track_id: Vec::with_capacity(capacity),
            kinetic_energy: Vec::with_capacity(capacity),
            global_time: Vec::with_capacity(capacity),
            position: std::array::from_fn(|_| Vec::with_capacity(capacity)),
            direction: std::array::from_fn(|_| Vec::with_capacity(capacity)),
        }
    }

    pub fn len(&self) -> usize {
        self.run_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.run_id.is_empty()
    }

    /// Every column has to be as long as `RunID`.
    pub fn check_lengths(&self, source_name: &str) -> Result<()> {
        let n = self.len();
        let lengths = [
            ("EventID", self.event_id.len()),
            ("TrackID", self.track_id.len()),
            ("KineticEnergy", self.kinetic_energy.len()),
            ("GlobalTime", self.global_time.len()),
            ("Position_X", self.position[0].len()),
            ("Position_Y", self.position[1].len()),
            ("Position_Z", self.position[2].len()),
            ("Direction_X", self.direction[0].len()),
            ("Direction_Y", self.direction[1].len()),
            ("Direction_Z", self.direction[2].len()),
        ];
        for (field, len) in lengths {
            if len != n {
                return Err(PairError::missing_field(
                    source_name,
                    format!("{} ({} entries, RunID has {})", field, len, n),
                ));
            }
        }
        Ok(())
    }

    /// Canonical records: axes remapped, `w` set to the plane, run range
    /// applied, stably sorted by `key_spec` so duplicates keep stream order.
    pub fn into_records(
        self,
        axes: &AxisMapping,
        plane: f64,
        run_range: RunRange,
        key_spec: KeySpec,
    ) -> Vec<ParticleRecord> {
        let mut records: Vec<ParticleRecord> = (0..self.len())
            .filter(|&i| run_range.contains(self.run_id[i]))
            .map(|i| {
                let position = axes.project([self.position[0][i], self.position[1][i], self.position[2][i]]);
                let direction = axes.project([self.direction[0][i], self.direction[1][i], self.direction[2][i]]);
                ParticleRecord::new(
                    self.run_id[i],
                    self.event_id[i],
                    self.track_id[i],
                    self.kinetic_energy[i],
                    self.global_time[i],
                    position,
                    direction,
                )
                .on_plane(plane)
            })
            .collect();

        records.sort_by_key(|record| key_spec.key(record));
        records
    }
}
