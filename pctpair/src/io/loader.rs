use std::path::{Path, PathBuf};

use pctcore::{KeySpec, ParticleRecord, RunRange};

use crate::config::AxisMapping;
use crate::error::{PairError, Result};
use crate::io::columns::PhaseSpaceColumns;
use crate::io::root::read_root_columns;
use crate::io::sqlite::read_sqlite_columns;

/// Storage format of a phase space file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Root,
    Sqlite,
}

impl SourceFormat {
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase());
        match extension.as_deref() {
            Some("root") => Ok(SourceFormat::Root),
            Some("db") | Some("sqlite") | Some("sqlite3") => Ok(SourceFormat::Sqlite),
            _ => Err(PairError::UnsupportedSource(path.to_path_buf())),
        }
    }
}

/// One plane's phase space and how to turn it into canonical records.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadRequest {
    pub path: PathBuf,
    pub tree: String,
    pub axes: AxisMapping,
    pub plane: f64,
    pub run_range: RunRange,
    pub key_spec: KeySpec,
}

impl LoadRequest {
    pub fn read_columns(&self) -> Result<PhaseSpaceColumns> {
        match SourceFormat::from_path(&self.path)? {
            SourceFormat::Root => read_root_columns(&self.path, &self.tree),
            SourceFormat::Sqlite => read_sqlite_columns(&self.path, &self.tree, self.run_range),
        }
    }
}

/// Load a phase space as records sorted ascending by the request's key.
///
/// Only runs inside the requested range are kept, `w` holds the plane
/// position and records with equal keys stay in file order, which is what
/// deduplication and the merge-join rely on.
pub fn load_phase_space(request: &LoadRequest) -> Result<Vec<ParticleRecord>> {
    request.axes.validate()?;
    let columns = request.read_columns()?;
    Ok(columns.into_records(&request.axes, request.plane, request.run_range, request.key_spec))
}
