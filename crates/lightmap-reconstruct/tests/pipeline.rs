use approx::assert_abs_diff_eq;
use lightmap_core::{CoordinateMap, CoordinateSpace, PlanarRotation};
use lightmap_reconstruct::{
    normalize, read_csv_file, write_csv_file, ParamsError, PipelineWarning, ReconstructConfig,
    ReconstructError, ReconstructionParams, ReconstructionReport, ReconstructionResult, Reconstructor,
    ShotParseError, UnresolvedLight,
};

const CENTER: f64 = 540.0;

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn record(id: u32, angle: u16, x: u32, y: u32) -> String {
    format!(r#"{{"id": {id}, "angle": {angle}, "x": {x}, "y": {y}, "v": 200}}"#)
}

/// Lights on a straight, descending line seen from 0° and 270°.
fn line_records(ids: impl IntoIterator<Item = u32>) -> Vec<String> {
    ids.into_iter()
        .flat_map(|id| {
            let z = 1500 - 20 * id;
            [record(id, 0, 400 + 10 * id, z), record(id, 270, 600, z)]
        })
        .collect()
}

fn run(lines: &[String], params: ReconstructionParams) -> ReconstructionResult {
    init_logger();
    Reconstructor::new(params)
        .expect("valid params")
        .reconstruct_lines(lines)
        .expect("well-formed input")
}

fn extent_and_floor(coords: &CoordinateMap) -> (f64, f64) {
    let extent = coords
        .values()
        .flat_map(|c| [c.x.abs(), c.y.abs()])
        .fold(0.0, f64::max);
    let floor = coords.values().map(|c| c.z).fold(f64::INFINITY, f64::min);
    (extent, floor)
}

#[test]
fn displaced_light_is_replaced_by_its_neighbors() {
    let mut lines = line_records((0..12).filter(|&id| id != 6));
    lines.push(record(6, 0, 1000, 1380));
    lines.push(record(6, 270, 600, 1380));

    let result = run(&lines, ReconstructionParams::default());

    assert_eq!(result.outliers.deleted_inconsistent, vec![6]);
    assert_eq!(result.counts.outliers_deleted, 1);
    assert!(result.neighbor_fixed.contains(6));
    assert_eq!(result.counts.resolved, 12);

    let c = result.coordinates.get(6).expect("light 6 refilled");
    assert_abs_diff_eq!(c.x, -80.0 / 140.0, epsilon = 1e-12);
    assert_abs_diff_eq!(c.y, 60.0 / 140.0, epsilon = 1e-12);
    assert_abs_diff_eq!(c.z, 120.0 / 140.0, epsilon = 1e-12);
}

#[test]
fn output_satisfies_normalization_invariant() {
    let result = run(&line_records(0..30), ReconstructionParams::default());
    let (extent, floor) = extent_and_floor(&result.coordinates);

    assert_eq!(result.coordinates.space(), CoordinateSpace::Canonical);
    assert_abs_diff_eq!(extent, 1.0, epsilon = 1e-12);
    assert_abs_diff_eq!(floor, 0.0, epsilon = 1e-12);
    // z grows with height, and lights climb as ids increase
    let z0 = result.coordinates.get(0).map(|c| c.z).expect("light 0");
    let z29 = result.coordinates.get(29).map(|c| c.z).expect("light 29");
    assert_abs_diff_eq!(z0, 0.0, epsilon = 1e-12);
    assert!(z0 < z29);
}

#[test]
fn renormalizing_the_output_changes_nothing() {
    let result = run(&line_records(0..20), ReconstructionParams::default());
    let mut coords = result.coordinates.clone();

    assert!(normalize(&mut coords, &ReconstructionParams::default()).is_none());
    assert_eq!(coords, result.coordinates);
}

#[test]
fn diagonal_only_light_is_placed() {
    let rig = PlanarRotation::new(45.0, [CENTER, CENTER]);
    let [dx, dy] = rig.apply(440.0, 600.0);

    let mut lines = line_records((0..8).filter(|&id| id != 4));
    lines.push(record(4, 45, dx.round() as u32, 1420));
    lines.push(record(4, 315, dy.round() as u32, 1420));

    let params = ReconstructionParams {
        diagonal_rotation_deg: -45.0,
        ..Default::default()
    };
    let result = run(&lines, params);

    assert_eq!(result.counts.orthogonal_missing, 1);
    assert_eq!(result.counts.diagonal_fixed, 1);
    assert!(result.diagonal_fixed.contains(4));
    assert!(result.neighbor_fixed.is_empty());

    let c = result.coordinates.get(4).expect("light 4 placed");
    assert_abs_diff_eq!(c.x, -100.0 / 140.0, epsilon = 0.01);
    assert_abs_diff_eq!(c.y, 60.0 / 140.0, epsilon = 0.01);
}

#[test]
fn string_ends_are_reported_unresolved() {
    let params = ReconstructionParams {
        light_count: Some(12),
        ..Default::default()
    };
    let result = run(&line_records(1..10), params);

    assert_eq!(result.unresolved_ids(), vec![0, 10, 11]);
    assert_eq!(
        result.unresolved[0],
        UnresolvedLight {
            light_id: 0,
            missing_prev: true,
            missing_next: false,
        }
    );
    assert!(result.unresolved[1].missing_next);
    assert_eq!(result.counts.resolved, 9);
    assert!(!result.coordinates.contains(10));
}

#[test]
fn lone_light_warns_about_empty_distribution() {
    let result = run(&line_records([3]), ReconstructionParams::default());

    assert!(result.outliers.threshold.is_none());
    assert!(result.warnings.contains(&PipelineWarning::EmptyDistribution));
    assert!(result.coordinates.contains(3));
}

#[test]
fn malformed_line_aborts_the_run() {
    let mut lines = line_records(0..3);
    lines.insert(2, "id007,angle090-x".to_string());

    let reconstructor = Reconstructor::new(ReconstructionParams::default()).unwrap();
    let err = reconstructor.reconstruct_lines(&lines).unwrap_err();
    match err {
        ReconstructError::MalformedInput(ShotParseError::Syntax { line, .. }) => {
            assert_eq!(line, 3)
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn zero_light_count_is_rejected_before_parsing() {
    let params = ReconstructionParams {
        light_count: Some(0),
        ..Default::default()
    };
    assert!(matches!(
        Reconstructor::new(params),
        Err(ReconstructError::Params(ParamsError::EmptyLightCount))
    ));
}

#[test]
fn reader_input_matches_line_input() {
    let lines = line_records(0..10);
    let text = lines.join("\n");
    let reconstructor = Reconstructor::new(ReconstructionParams::default()).unwrap();

    let from_reader = reconstructor.reconstruct_reader(text.as_bytes()).unwrap();
    let from_lines = reconstructor.reconstruct_lines(&lines).unwrap();
    assert_eq!(from_reader.coordinates, from_lines.coordinates);
    assert_eq!(from_reader.input.map(|s| s.kept), Some(20));
}

#[test]
fn csv_and_report_files_are_written() {
    let dir = tempfile::tempdir().unwrap();
    let result = run(&line_records(0..10), ReconstructionParams::default());

    let csv_path = dir.path().join("coords.csv");
    write_csv_file(&result.coordinates, &csv_path).unwrap();
    let reloaded = read_csv_file(&csv_path).unwrap();
    assert_eq!(reloaded, result.coordinates);

    let cfg = ReconstructConfig::new("shots.jsonl");
    let mut report = ReconstructionReport::new(&cfg, None);
    report.set_result(&result);
    let report_path = dir.path().join("report.json");
    report.write_json(&report_path).unwrap();

    let loaded = ReconstructionReport::load_json(&report_path).unwrap();
    assert_eq!(loaded.overlay.len(), 10);
    assert_eq!(loaded.counts, Some(result.counts));
    assert!(loaded.error.is_none());
}

#[test]
fn config_round_trips_through_json() {
    let dir = tempfile::tempdir().unwrap();
    let mut cfg = ReconstructConfig::new("shots.jsonl");
    cfg.output_path = Some("out.csv".to_string());
    cfg.params.confidence_floor = 50;
    cfg.params.pivot_offset_px = [-5.0, 5.0];

    let path = dir.path().join("config.json");
    cfg.write_json(&path).unwrap();
    let loaded = ReconstructConfig::load_json(&path).unwrap();

    assert_eq!(loaded.input_path, "shots.jsonl");
    assert_eq!(loaded.params, cfg.params);
    assert!(loaded.build_reconstructor().is_ok());
}
