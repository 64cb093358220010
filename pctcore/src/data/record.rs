use serde::{Deserialize, Serialize};

/// One particle crossing of a measurement plane.
///
/// Positions and directions are already expressed in the canonical
/// projection frame: `u` and `v` span the detector plane, `w` is the fixed
/// projection axis and always holds the plane position the record was
/// captured at.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq)]
pub struct ParticleRecord {
    pub run_id: i32,
    pub event_id: i32,
    pub track_id: i32,
    pub kinetic_energy: f64,
    pub global_time: f64,
    pub u: f64,
    pub v: f64,
    pub w: f64,
    pub du: f64,
    pub dv: f64,
    pub dw: f64,
}

impl ParticleRecord {
    pub fn new(
        run_id: i32,
        event_id: i32,
        track_id: i32,
        kinetic_energy: f64,
        global_time: f64,
        position: [f64; 3],
        direction: [f64; 3],
    ) -> Self {
        let [u, v, w] = position;
        let [du, dv, dw] = direction;
        ParticleRecord {
            run_id,
            event_id,
            track_id,
            kinetic_energy,
            global_time,
            u,
            v,
            w,
            du,
            dv,
            dw,
        }
    }

    /// Record carrying only identifiers, everything else zeroed.
    pub fn with_ids(run_id: i32, event_id: i32, track_id: i32) -> Self {
        ParticleRecord::new(run_id, event_id, track_id, 0.0, 0.0, [0.0; 3], [0.0; 3])
    }

    pub fn position(&self) -> [f64; 3] {
        [self.u, self.v, self.w]
    }

    pub fn direction(&self) -> [f64; 3] {
        [self.du, self.dv, self.dw]
    }

    /// Copy of the record placed on the given plane.
    pub fn on_plane(mut self, plane: f64) -> Self {
        self.w = plane;
        self
    }
}
