use std::fmt::Display;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use pctcore::{FeatureAssembler, KeySpec, RunRange};
use serde::{Deserialize, Serialize};

use crate::error::{PairError, Result};

/// Coordinate axis of the simulation frame.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub fn index(&self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }

    pub fn to_str(&self) -> &str {
        match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
        }
    }
}

impl Display for Axis {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_str())
    }
}

impl FromStr for Axis {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim() {
            "X" | "x" => Ok(Axis::X),
            "Y" | "y" => Ok(Axis::Y),
            "Z" | "z" => Ok(Axis::Z),
            other => Err(format!("unknown axis '{}', expected X, Y or Z", other)),
        }
    }
}

/// Which simulation axes become the canonical u, v and w axes.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
pub struct AxisMapping {
    pub primary: Axis,
    pub secondary: Axis,
    pub tertiary: Axis,
}

impl Default for AxisMapping {
    fn default() -> Self {
        AxisMapping {
            primary: Axis::Y,
            secondary: Axis::Z,
            tertiary: Axis::X,
        }
    }
}

impl AxisMapping {
    pub fn new(primary: Axis, secondary: Axis, tertiary: Axis) -> Self {
        AxisMapping { primary, secondary, tertiary }
    }

    /// Like [`AxisMapping::new`], but rejects mappings that are not a
    /// permutation of X, Y and Z.
    pub fn try_new(primary: Axis, secondary: Axis, tertiary: Axis) -> Result<Self> {
        let mapping = AxisMapping::new(primary, secondary, tertiary);
        mapping.validate()?;
        Ok(mapping)
    }

    /// Every simulation axis has to feed exactly one of u, v and w,
    /// otherwise one canonical field would have no source column.
    pub fn validate(&self) -> Result<()> {
        let mut used = [false; 3];
        for axis in [self.primary, self.secondary, self.tertiary] {
            if std::mem::replace(&mut used[axis.index()], true) {
                return Err(PairError::InvalidAxisMapping(format!(
                    "u = {}, v = {}, w = {} uses axis {} twice",
                    self.primary, self.secondary, self.tertiary, axis
                )));
            }
        }
        Ok(())
    }

    /// Reorder an `(x, y, z)` triple into `(u, v, w)`.
    pub fn project(&self, xyz: [f64; 3]) -> [f64; 3] {
        [
            xyz[self.primary.index()],
            xyz[self.secondary.index()],
            xyz[self.tertiary.index()],
        ]
    }
}

pub const DEFAULT_TREE_BEFORE: &str = "PhaseSpaceIn";
pub const DEFAULT_TREE_AFTER: &str = "PhaseSpaceOut";

/// Everything a pairing run needs to know.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct PairingConfig {
    pub input_before: PathBuf,
    pub input_after: PathBuf,
    pub tree_before: String,
    pub tree_after: String,
    pub output_path_template: PathBuf,
    pub plane_before: f64,
    pub plane_after: f64,
    pub min_run: i32,
    pub max_run: Option<i32>,
    pub exclude_nuclear: bool,
    pub axes: AxisMapping,
    pub tertiary_weight: f64,
    pub verbose: bool,
    pub num_threads: Option<usize>,
    pub summary: Option<PathBuf>,
}

impl PairingConfig {
    pub fn new(
        input_before: impl Into<PathBuf>,
        input_after: impl Into<PathBuf>,
        output_path_template: impl Into<PathBuf>,
        plane_before: f64,
        plane_after: f64,
    ) -> Self {
        PairingConfig {
            input_before: input_before.into(),
            input_after: input_after.into(),
            tree_before: DEFAULT_TREE_BEFORE.to_string(),
            tree_after: DEFAULT_TREE_AFTER.to_string(),
            output_path_template: output_path_template.into(),
            plane_before,
            plane_after,
            min_run: 0,
            max_run: None,
            exclude_nuclear: false,
            axes: AxisMapping::default(),
            tertiary_weight: -1.0,
            verbose: false,
            num_threads: None,
            summary: None,
        }
    }

    pub fn run_range(&self) -> RunRange {
        RunRange::new(self.min_run, self.max_run)
    }

    pub fn key_spec(&self) -> KeySpec {
        KeySpec::from_exclude_nuclear(self.exclude_nuclear)
    }

    pub fn assembler(&self) -> FeatureAssembler {
        FeatureAssembler::new(self.tertiary_weight)
    }

    pub fn output_path(&self, run_id: i32) -> PathBuf {
        run_output_path(&self.output_path_template, run_id)
    }
}

/// Insert the zero padded run index before the last `.` of the file name,
/// `result.mha` becomes `result0007.mha` for run 7. File names without an
/// extension get the index appended.
pub fn run_output_path(template: &Path, run_id: i32) -> PathBuf {
    let file_name = template
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let indexed = match file_name.rfind('.') {
        Some(dot) => format!("{}{:04}{}", &file_name[..dot], run_id, &file_name[dot..]),
        None => format!("{}{:04}", file_name, run_id),
    };

    match template.parent() {
        Some(parent) => parent.join(indexed),
        None => PathBuf::from(indexed),
    }
}
