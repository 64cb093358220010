use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, WriteBytesExt};
use pctcore::algorithm::features::{FEATURE_COLUMNS, FEATURE_ROWS};
use pctcore::RunFeatures;

use crate::error::{PairError, Result};

/// MetaImage header of a 2D vector image, `FEATURE_ROWS` wide and one line
/// per pair, three float channels per pixel.
pub fn metaimage_header(pair_count: usize) -> String {
    format!(
        "ObjectType = Image\n\
         NDims = 2\n\
         BinaryData = True\n\
         BinaryDataByteOrderMSB = False\n\
         CompressedData = False\n\
         TransformMatrix = 1 0 0 1\n\
         Offset = 0 0\n\
         CenterOfRotation = 0 0\n\
         AnatomicalOrientation = RA\n\
         ElementSpacing = 1 1\n\
         DimSize = {} {}\n\
         ElementNumberOfChannels = {}\n\
         ElementType = MET_FLOAT\n\
         ElementDataFile = LOCAL\n",
        FEATURE_ROWS, pair_count, FEATURE_COLUMNS
    )
}

/// Write header and little-endian payload of `features` to `writer`.
pub fn write_metaimage<W: Write>(writer: &mut W, features: &RunFeatures) -> std::io::Result<()> {
    writer.write_all(metaimage_header(features.len()).as_bytes())?;
    for value in features.flatten() {
        writer.write_f32::<LittleEndian>(value)?;
    }
    writer.flush()
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".part");
    path.with_file_name(name)
}

/// Write through `fill` into `<path>.part` and rename it onto `path` once
/// everything is flushed. On failure the partial file is removed, so `path`
/// is either complete or absent.
fn write_atomically<F>(path: &Path, fill: F) -> Result<()>
where
    F: FnOnce(&mut BufWriter<File>) -> std::io::Result<()>,
{
    let partial = partial_path(path);
    let file = File::create(&partial).map_err(|e| PairError::io(&partial, e))?;

    let written = {
        let mut writer = BufWriter::new(file);
        fill(&mut writer)
            .and_then(|()| writer.flush())
            .and_then(|()| writer.get_ref().sync_all())
    };

    match written.and_then(|()| fs::rename(&partial, path)) {
        Ok(()) => Ok(()),
        Err(e) => {
            if let Err(remove_err) = fs::remove_file(&partial) {
                log::warn!("could not remove partial file {}: {}", partial.display(), remove_err);
            }
            Err(PairError::io(path, e))
        }
    }
}

/// Write one run's feature tensor as a standalone `.mha` file.
pub fn write_run_image(features: &RunFeatures, path: &Path) -> Result<()> {
    write_atomically(path, |writer| write_metaimage(writer, features))
}
