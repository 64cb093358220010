// particle records and join keys
pub mod data {
    pub mod record;
    pub mod key;
}

// pairing algorithms
pub mod algorithm {
    pub mod dedup;
    pub mod join;
    pub mod partition;
    pub mod features;
}

// optional diagnostics sink
pub mod diagnostics;

pub use algorithm::dedup::{dedup_first, dedup_first_iter};
pub use algorithm::features::{FeatureAssembler, PairFeatures, RunFeatures};
pub use algorithm::join::{pair_records, PairedRecord, PairingJoin};
pub use algorithm::partition::{partition_runs, RunBatch, RunBatches, RunRange};
pub use data::key::{JoinKey, KeySpec};
pub use data::record::ParticleRecord;
pub use diagnostics::{Emit, LogEmitter, Silent};
