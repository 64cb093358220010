use nalgebra::SMatrix;
use serde::{Deserialize, Serialize};

use crate::algorithm::join::PairedRecord;
use crate::algorithm::partition::RunBatch;

/// Rows per pair: positions in/out, directions in/out, energies and exit track.
pub const FEATURE_ROWS: usize = 5;
/// Components per row.
pub const FEATURE_COLUMNS: usize = 3;

/// Feature block of one pair.
///
/// | row | 0                 | 1                  | 2             |
/// |-----|-------------------|--------------------|---------------|
/// | 0   | u_in              | v_in               | w_in          |
/// | 1   | u_out             | v_out              | w_out         |
/// | 2   | du_in             | dv_in              | dw_in * wt    |
/// | 3   | du_out            | dv_out             | dw_out * wt   |
/// | 4   | kinetic_energy_in | kinetic_energy_out | exit track id |
pub type PairFeatures = SMatrix<f32, FEATURE_ROWS, FEATURE_COLUMNS>;

/// Largest track id that survives the conversion to `f32` unchanged.
/// Ids above this value are rounded to the nearest representable float.
pub const MAX_EXACT_TRACK_ID: i32 = 1 << f32::MANTISSA_DIGITS;

/// Feature tensor of one run, shape `(pairs, 5, 3)`.
#[derive(Debug, Clone, PartialEq)]
pub struct RunFeatures {
    pub run_id: i32,
    pub pairs: Vec<PairFeatures>,
}

impl RunFeatures {
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn shape(&self) -> (usize, usize, usize) {
        (self.pairs.len(), FEATURE_ROWS, FEATURE_COLUMNS)
    }

    /// Values in `(pair, row, column)` order, row-major.
    pub fn flatten(&self) -> Vec<f32> {
        let mut values = Vec::with_capacity(self.pairs.len() * FEATURE_ROWS * FEATURE_COLUMNS);
        for features in &self.pairs {
            for row in 0..FEATURE_ROWS {
                for column in 0..FEATURE_COLUMNS {
                    values.push(features[(row, column)]);
                }
            }
        }
        values
    }
}

/// Turns paired records into feature blocks.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct FeatureAssembler {
    /// Factor applied to `dw_in` and `dw_out`; the projection axis usually
    /// points against the simulation's own convention.
    pub direction_weight: f64,
}

impl Default for FeatureAssembler {
    fn default() -> Self {
        FeatureAssembler { direction_weight: -1.0 }
    }
}

impl FeatureAssembler {
    pub fn new(direction_weight: f64) -> Self {
        FeatureAssembler { direction_weight }
    }

    pub fn assemble_pair(&self, pair: &PairedRecord) -> PairFeatures {
        let (b, a) = (&pair.before, &pair.after);
        PairFeatures::from_row_slice(&[
            b.u as f32,
            b.v as f32,
            b.w as f32,
            a.u as f32,
            a.v as f32,
            a.w as f32,
            b.du as f32,
            b.dv as f32,
            (b.dw * self.direction_weight) as f32,
            a.du as f32,
            a.dv as f32,
            (a.dw * self.direction_weight) as f32,
            b.kinetic_energy as f32,
            a.kinetic_energy as f32,
            pair.exit_track_id() as f32,
        ])
    }

    pub fn assemble(&self, batch: &RunBatch) -> RunFeatures {
        RunFeatures {
            run_id: batch.run_id,
            pairs: batch.pairs.iter().map(|pair| self.assemble_pair(pair)).collect(),
        }
    }
}
