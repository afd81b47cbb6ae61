use std::collections::BTreeSet;
use std::fs::File;
use std::io::BufWriter;

use lightmap::reconstruct::{read_csv_file, ReconstructConfig, ReconstructionReport};
use lightmap::synthetic::{canonical_truth, write_shot_records, HelixRig, SyntheticCapture};
use lightmap::{reconstruct_file, run_config, CoordinateMap, ReconstructionResult};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn write_capture(capture: &SyntheticCapture, dir: &tempfile::TempDir) -> std::path::PathBuf {
    let path = dir.path().join("shots.jsonl");
    let file = File::create(&path).expect("create shot log");
    write_shot_records(&capture.shots, BufWriter::new(file)).expect("write shot log");
    path
}

/// Fraction of all lights placed within `tol` of their true canonical position.
fn fraction_within(result: &CoordinateMap, truth: &CoordinateMap, tol: f64) -> f64 {
    let close = result
        .values()
        .filter(|c| truth.get(c.light_id).is_some_and(|t| c.distance(t) <= tol))
        .count();
    close as f64 / truth.len() as f64
}

fn assert_every_id_accounted_for(result: &ReconstructionResult, light_count: u32) {
    let placed: BTreeSet<u32> = result.coordinates.ids().collect();
    let unresolved: BTreeSet<u32> = result.unresolved_ids().into_iter().collect();
    assert!(placed.is_disjoint(&unresolved));
    for id in 0..light_count {
        assert!(
            placed.contains(&id) || unresolved.contains(&id),
            "light {id} neither placed nor reported unresolved"
        );
    }
}

#[test]
fn helix_is_reconstructed_within_tolerance() {
    init_logger();
    let rig = HelixRig::default();
    let capture = rig.capture();
    assert!(capture.failed_shots > 0);

    let dir = tempfile::tempdir().unwrap();
    let input = write_capture(&capture, &dir);
    let params = rig.params();
    let result = reconstruct_file(&input, params.clone()).expect("reconstruct");

    let truth = canonical_truth(&capture.truth, &params);
    let frac = fraction_within(&result.coordinates, &truth, 0.02);
    assert!(frac >= 0.98, "only {:.1}% within tolerance", frac * 100.0);
    assert_every_id_accounted_for(&result, rig.light_count);
    for c in result.coordinates.values() {
        let t = truth.get(c.light_id).expect("truth");
        assert!(
            c.distance(t) <= 0.02,
            "light {} placed {} away from truth",
            c.light_id,
            c.distance(t)
        );
    }

    let input_stats = result.input.expect("parser stats");
    assert_eq!(input_stats.failed_detections, capture.failed_shots);
}

#[test]
fn lights_missing_from_every_view_are_interpolated() {
    init_logger();
    let rig = HelixRig {
        dropout: 0.0,
        ..Default::default()
    };
    let mut capture = rig.capture();
    let dark = [100u32, 101, 102, 250];
    capture.shots.retain(|s| !dark.contains(&s.light_id));

    let dir = tempfile::tempdir().unwrap();
    let input = write_capture(&capture, &dir);
    let params = rig.params();
    let result = reconstruct_file(&input, params.clone()).expect("reconstruct");

    let truth = canonical_truth(&capture.truth, &params);
    for id in dark {
        assert!(result.neighbor_fixed.contains(id));
        let c = result.coordinates.get(id).expect("interpolated");
        let t = truth.get(id).expect("truth");
        assert!(c.distance(t) < 0.02, "light {id} off by {}", c.distance(t));
    }
    assert!(result.unresolved.is_empty());
}

#[test]
fn dark_string_end_is_reported() {
    init_logger();
    let rig = HelixRig {
        light_count: 120,
        dropout: 0.0,
        ..Default::default()
    };
    let mut capture = rig.capture();
    capture.shots.retain(|s| s.light_id < 115);

    let dir = tempfile::tempdir().unwrap();
    let input = write_capture(&capture, &dir);
    let result = reconstruct_file(&input, rig.params()).expect("reconstruct");

    assert_eq!(result.unresolved_ids(), vec![115, 116, 117, 118, 119]);
    assert!(result.unresolved.iter().all(|u| u.missing_next));
    assert_every_id_accounted_for(&result, rig.light_count);
}

#[test]
fn config_run_writes_csv_and_report() {
    init_logger();
    let rig = HelixRig {
        light_count: 200,
        ..Default::default()
    };
    let capture = rig.capture();
    let dir = tempfile::tempdir().unwrap();
    let input = write_capture(&capture, &dir);

    let mut cfg = ReconstructConfig::new(input.to_string_lossy());
    cfg.output_path = Some(dir.path().join("coords.csv").to_string_lossy().into_owned());
    cfg.report_path = Some(dir.path().join("report.json").to_string_lossy().into_owned());
    cfg.params = rig.params();
    let config_path = dir.path().join("config.json");
    cfg.write_json(&config_path).unwrap();

    let result = run_config(&cfg, Some(config_path.as_path())).expect("run");

    let csv = read_csv_file(cfg.output_path()).unwrap();
    assert_eq!(csv, result.coordinates);

    let report = ReconstructionReport::load_json(cfg.report_path().unwrap()).unwrap();
    assert_eq!(report.counts, Some(result.counts));
    assert!(report.histogram.is_some());
    assert!(report.outlier_threshold.is_some());
    assert_eq!(
        report.config_path.as_deref(),
        Some(&*config_path.to_string_lossy())
    );
}

#[test]
fn malformed_log_writes_error_report() {
    init_logger();
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("shots.jsonl");
    std::fs::write(
        &input,
        "{\"id\": 0, \"angle\": 0, \"x\": 10, \"y\": 10, \"v\": 200}\nnot a record\n",
    )
    .unwrap();

    let mut cfg = ReconstructConfig::new(input.to_string_lossy());
    cfg.output_path = Some(dir.path().join("coords.csv").to_string_lossy().into_owned());
    cfg.report_path = Some(dir.path().join("report.json").to_string_lossy().into_owned());

    assert!(run_config(&cfg, None).is_err());
    assert!(!cfg.output_path().exists());
    let report = ReconstructionReport::load_json(cfg.report_path().unwrap()).unwrap();
    let error = report.error.expect("error recorded");
    assert!(error.contains("line 2"), "{error}");
}
