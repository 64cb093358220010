use std::path::Path;

use oxyroot::{Branch, ReaderTree, RootFile};

use crate::error::{PairError, Result};
use crate::io::columns::PhaseSpaceColumns;

#[derive(Clone, Copy, Debug, PartialEq)]
enum RootScalarKind {
    I32,
    I64,
    F32,
    F64,
}

fn scalar_kind_from_type_name(type_name: &str) -> Option<RootScalarKind> {
    let lower = type_name.to_ascii_lowercase();
    if lower.contains("vector") {
        return None;
    }
    match lower.as_str() {
        "int" | "int_t" | "int32_t" | "i32" => Some(RootScalarKind::I32),
        "long" | "long64_t" | "int64_t" | "long_t" | "i64" => Some(RootScalarKind::I64),
        "float" | "float_t" | "float32_t" | "f32" => Some(RootScalarKind::F32),
        "double" | "double_t" | "double32_t" | "f64" => Some(RootScalarKind::F64),
        _ => None,
    }
}

fn branch_scalar_kind(branch: &Branch) -> Option<RootScalarKind> {
    scalar_kind_from_type_name(&branch.item_type_name())
}

// the oxyroot error type is not public, keep its message only
fn map_root_error<E: std::fmt::Display>(context: &str, err: E) -> PairError {
    PairError::Root(format!("{}: {}", context, err))
}

fn find_branch<'a>(tree: &'a ReaderTree, source_name: &str, field: &str) -> Result<(&'a Branch, RootScalarKind)> {
    let branch = tree
        .branch(field)
        .ok_or_else(|| PairError::missing_field(source_name, field))?;
    let kind = branch_scalar_kind(branch).ok_or_else(|| {
        PairError::missing_field(
            source_name,
            format!("{} (unsupported type '{}')", field, branch.item_type_name()),
        )
    })?;
    Ok((branch, kind))
}

fn read_float_branch(tree: &ReaderTree, source_name: &str, field: &str) -> Result<Vec<f64>> {
    let (branch, kind) = find_branch(tree, source_name, field)?;
    let context = format!("{}: failed to read branch '{}'", source_name, field);
    let values = match kind {
        RootScalarKind::I32 => branch
            .as_iter::<i32>()
            .map_err(|e| map_root_error(&context, e))?
            .map(|value| value as f64)
            .collect(),
        RootScalarKind::I64 => branch
            .as_iter::<i64>()
            .map_err(|e| map_root_error(&context, e))?
            .map(|value| value as f64)
            .collect(),
        RootScalarKind::F32 => branch
            .as_iter::<f32>()
            .map_err(|e| map_root_error(&context, e))?
            .map(|value| value as f64)
            .collect(),
        RootScalarKind::F64 => branch
            .as_iter::<f64>()
            .map_err(|e| map_root_error(&context, e))?
            .collect(),
    };
    Ok(values)
}

/// Run, event and track ids are 32 bit; wider values are rejected instead
/// of being truncated into a different key.
fn narrow_ids<I>(values: I, source_name: &str, field: &str) -> Result<Vec<i32>>
where
    I: IntoIterator<Item = i64>,
{
    values
        .into_iter()
        .map(|value| {
            i32::try_from(value).map_err(|_| PairError::IdOutOfRange {
                source_name: source_name.to_string(),
                field: field.to_string(),
                value,
            })
        })
        .collect()
}

fn read_id_branch(tree: &ReaderTree, source_name: &str, field: &str) -> Result<Vec<i32>> {
    let (branch, kind) = find_branch(tree, source_name, field)?;
    let context = format!("{}: failed to read branch '{}'", source_name, field);
    let values = match kind {
        RootScalarKind::I32 => branch
            .as_iter::<i32>()
            .map_err(|e| map_root_error(&context, e))?
            .collect(),
        RootScalarKind::I64 => {
            let wide = branch
                .as_iter::<i64>()
                .map_err(|e| map_root_error(&context, e))?;
            narrow_ids(wide, source_name, field)?
        }
        _ => {
            return Err(PairError::missing_field(
                source_name,
                format!("{} (expected an integer branch, found '{}')", field, branch.item_type_name()),
            ))
        }
    };
    Ok(values)
}

/// Read the phase space tree `tree_name` of a ROOT file into columns.
///
/// Missing branches are reported before any data is read.
pub fn read_root_columns(path: &Path, tree_name: &str) -> Result<PhaseSpaceColumns> {
    let source_name = format!("{}:{}", path.display(), tree_name);

    let mut file = RootFile::open(path)
        .map_err(|e| map_root_error(&format!("failed to open ROOT file '{}'", path.display()), e))?;
    let tree = file
        .get_tree(tree_name)
        .map_err(|e| map_root_error(&format!("failed to open ROOT tree '{}'", source_name), e))?;

    for field in crate::io::columns::REQUIRED_FIELDS {
        find_branch(&tree, &source_name, field)?;
    }

    let columns = PhaseSpaceColumns {
        run_id: read_id_branch(&tree, &source_name, "RunID")?,
        event_id: read_id_branch(&tree, &source_name, "EventID")?,
        track_id: read_id_branch(&tree, &source_name, "TrackID")?,
        kinetic_energy: read_float_branch(&tree, &source_name, "KineticEnergy")?,
        global_time: read_float_branch(&tree, &source_name, "GlobalTime")?,
        position: [
            read_float_branch(&tree, &source_name, "Position_X")?,
            read_float_branch(&tree, &source_name, "Position_Y")?,
            read_float_branch(&tree, &source_name, "Position_Z")?,
        ],
        direction: [
            read_float_branch(&tree, &source_name, "Direction_X")?,
            read_float_branch(&tree, &source_name, "Direction_Y")?,
            read_float_branch(&tree, &source_name, "Direction_Z")?,
        ],
    };
    columns.check_lengths(&source_name)?;

    Ok(columns)
}
