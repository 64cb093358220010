// End-to-end: SQLite phase spaces in, one MetaImage per run out.

use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt};
use pctcore::Silent;
use pctpair::config::{Axis, AxisMapping, PairingConfig};
use pctpair::error::PairError;
use pctpair::io::columns::PhaseSpaceColumns;
use pctpair::io::sqlite::SqlitePhaseSpace;
use pctpair::pipeline::run_pairing;
use tempfile::TempDir;

/// (run, event, track, energy, x, y, z, dir_x)
type Row = (i32, i32, i32, f64, f64, f64, f64, f64);

fn write_phase_space(path: &Path, table: &str, rows: &[Row]) {
    let mut columns = PhaseSpaceColumns::default();
    for (i, &(run, event, track, energy, x, y, z, dx)) in rows.iter().enumerate() {
        columns.run_id.push(run);
        columns.event_id.push(event);
        columns.track_id.push(track);
        columns.kinetic_energy.push(energy);
        columns.global_time.push(i as f64);
        columns.position[0].push(x);
        columns.position[1].push(y);
        columns.position[2].push(z);
        columns.direction[0].push(dx);
        columns.direction[1].push(0.25);
        columns.direction[2].push(0.5);
    }
    let mut store = SqlitePhaseSpace::open(path).unwrap();
    store.write_columns(table, &columns).unwrap();
}

struct Fixture {
    dir: TempDir,
    before: PathBuf,
    after: PathBuf,
}

impl Fixture {
    /// The before stream carries a duplicate of (0, 0, 1); the after stream
    /// has a fragment track for (0, 0) and an event without a before record.
    fn scenario() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let before = dir.path().join("before.db");
        let after = dir.path().join("after.db");

        write_phase_space(
            &before,
            "PhaseSpaceIn",
            &[
                (0, 0, 1, 200.0, -110.0, 1.0, 2.0, 0.9),
                (0, 0, 1, 199.0, -110.0, 9.0, 9.0, 0.9),
                (0, 1, 1, 200.0, -110.0, 3.0, 4.0, 0.9),
                (2, 0, 1, 210.0, -110.0, 5.0, 6.0, 0.8),
            ],
        );
        write_phase_space(
            &after,
            "PhaseSpaceOut",
            &[
                (0, 0, 1, 150.0, 110.0, 1.5, 2.5, 0.7),
                (0, 0, 2, 20.0, 110.0, 1.6, 2.6, 0.6),
                (0, 2, 1, 140.0, 110.0, 3.5, 4.5, 0.7),
                (2, 0, 1, 160.0, 110.0, 5.5, 6.5, 0.75),
            ],
        );

        Fixture { dir, before, after }
    }

    fn config(&self) -> PairingConfig {
        PairingConfig::new(
            &self.before,
            &self.after,
            self.dir.path().join("pairs.mha"),
            -100.0,
            100.0,
        )
    }

    fn output(&self, run: i32) -> PathBuf {
        self.dir.path().join(format!("pairs{:04}.mha", run))
    }
}

/// Returns `DimSize` and the payload of a MetaImage file.
fn read_metaimage(path: &Path) -> ((usize, usize), Vec<f32>) {
    let bytes = std::fs::read(path).unwrap();
    let marker = b"ElementDataFile = LOCAL\n";
    let header_end = bytes
        .windows(marker.len())
        .position(|w| w == marker)
        .map(|p| p + marker.len())
        .unwrap();
    let header = String::from_utf8(bytes[..header_end].to_vec()).unwrap();
    let dims: Vec<usize> = header
        .lines()
        .find_map(|line| line.strip_prefix("DimSize = "))
        .unwrap()
        .split_whitespace()
        .map(|v| v.parse().unwrap())
        .collect();

    let mut payload = &bytes[header_end..];
    let mut values = Vec::new();
    while !payload.is_empty() {
        values.push(payload.read_f32::<LittleEndian>().unwrap());
    }
    ((dims[0], dims[1]), values)
}

#[test]
fn test_scenario_without_nuclear_exclusion() {
    let fixture = Fixture::scenario();
    let config = fixture.config();

    let summary = run_pairing(&config, &Silent).unwrap();

    assert!(summary.is_success());
    assert_eq!(summary.before_records, 4);
    assert_eq!(summary.before_unique, 3);
    assert_eq!(summary.pair_count, 3);
    assert_eq!(summary.runs.len(), 2);

    let ((width, height), values) = read_metaimage(&fixture.output(0));
    assert_eq!((width, height), (5, 2));
    assert_eq!(values.len(), 2 * 15);

    // first pair, default mapping u = Y, v = Z, w = plane
    assert_eq!(&values[0..3], &[1.0, 2.0, -100.0]);
    assert_eq!(&values[3..6], &[1.5, 2.5, 100.0]);
    // direction rows, w component flipped by the default weight
    assert_eq!(&values[6..9], &[0.25, 0.5, -0.9]);
    assert_eq!(&values[9..12], &[0.25, 0.5, -0.7]);
    assert_eq!(&values[12..15], &[200.0, 150.0, 1.0]);
    // fragment pair keeps the first incoming record and reports track 2
    assert_eq!(&values[15..18], &[1.0, 2.0, -100.0]);
    assert_eq!(&values[27..30], &[200.0, 20.0, 2.0]);

    assert!(!fixture.output(1).exists());
    let ((_, height), _) = read_metaimage(&fixture.output(2));
    assert_eq!(height, 1);
}

#[test]
fn test_scenario_with_nuclear_exclusion() {
    let fixture = Fixture::scenario();
    let mut config = fixture.config();
    config.exclude_nuclear = true;

    let summary = run_pairing(&config, &Silent).unwrap();

    assert_eq!(summary.pair_count, 2);
    let ((_, height), values) = read_metaimage(&fixture.output(0));
    assert_eq!(height, 1);
    assert_eq!(&values[12..15], &[200.0, 150.0, 1.0]);
}

#[test]
fn test_run_range_limits_exports() {
    let fixture = Fixture::scenario();
    let mut config = fixture.config();
    config.min_run = 1;
    config.max_run = Some(3);

    let summary = run_pairing(&config, &Silent).unwrap();

    assert_eq!(summary.runs.iter().map(|r| r.run_id).collect::<Vec<_>>(), vec![2]);
    assert_eq!(summary.before_records, 1);
    assert!(!fixture.output(0).exists());
    assert!(fixture.output(2).exists());
}

#[test]
fn test_empty_run_range_succeeds_without_files() {
    let fixture = Fixture::scenario();
    let mut config = fixture.config();
    config.min_run = 5;
    config.max_run = Some(10);

    let summary = run_pairing(&config, &Silent).unwrap();

    assert!(summary.is_success());
    assert!(summary.runs.is_empty());
    let files: Vec<_> = std::fs::read_dir(fixture.dir.path())
        .unwrap()
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.path().extension().is_some_and(|ext| ext == "mha"))
        .collect();
    assert!(files.is_empty());
}

#[test]
fn test_summary_is_written_as_json() {
    let fixture = Fixture::scenario();
    let mut config = fixture.config();
    let summary_path = fixture.dir.path().join("summary.json");
    config.summary = Some(summary_path.clone());

    run_pairing(&config, &Silent).unwrap();

    let json: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(summary_path).unwrap()).unwrap();
    assert_eq!(json["pair_count"], 3);
    assert_eq!(json["runs"][0]["run_id"], 0);
    assert_eq!(json["runs"][0]["pairs"], 2);
}

#[test]
fn test_schema_mismatch_fails_before_pairing() {
    let fixture = Fixture::scenario();
    let mut config = fixture.config();
    config.tree_after = "Missing".to_string();

    let err = run_pairing(&config, &Silent).unwrap_err();

    assert!(matches!(err, PairError::MissingField { .. }));
    assert!(!fixture.output(0).exists());
}

#[test]
fn test_unsupported_source_is_rejected() {
    let fixture = Fixture::scenario();
    let mut config = fixture.config();
    config.input_before = fixture.dir.path().join("before.csv");

    let err = run_pairing(&config, &Silent).unwrap_err();

    assert!(matches!(err, PairError::UnsupportedSource(_)));
}

#[test]
fn test_repeated_axis_is_rejected_without_output() {
    let fixture = Fixture::scenario();
    let mut config = fixture.config();
    config.axes = AxisMapping::new(Axis::Y, Axis::Y, Axis::X);

    let err = run_pairing(&config, &Silent).unwrap_err();

    assert!(matches!(err, PairError::InvalidAxisMapping(_)));
    assert!(!fixture.output(0).exists());
    assert!(!fixture.output(2).exists());
}
