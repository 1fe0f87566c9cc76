//! End-to-end pipeline scenarios against real files.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::cast_precision_loss)]

use std::fs;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use approx::assert_relative_eq;
use nalgebra::{Point3, Vector3};
use polysurf::config::{
    DetailLevel, DetectionConfig, PipelineOptions, ReconstructionConfig,
};
use polysurf::reconstruct::{resolve_detail, LEAST, MOST, POISSON_SPACING_NEIGHBORS};
use polysurf::{
    detect, validate, ConfigError, Job, Pipeline, PipelineError, PipelineStage,
    ReconstructionError,
};
use polysurf_engine::{
    DetailWeights, EngineError, EngineResult, GeometryEngine, Partition, RegionGrowingParams,
    ScanEngine,
};
use polysurf_io::{load_points, FileFormat, LoadError, SaveError};
use polysurf_types::{PointRecord, PointSet, SurfaceMesh, UNASSIGNED};

/// Engine that records every call and answers with a fixed tetrahedron.
#[derive(Debug, Default)]
struct RecordingEngine {
    ransac_calls: AtomicUsize,
    region_calls: AtomicUsize,
    polygonal_calls: AtomicUsize,
    poisson_calls: AtomicUsize,
    weights: Mutex<Vec<Option<DetailWeights>>>,
    spacing_k: Mutex<Vec<usize>>,
    fail_polygonal: bool,
}

impl RecordingEngine {
    fn failing_polygonal() -> Self {
        Self {
            fail_polygonal: true,
            ..Self::default()
        }
    }

    fn engine_calls(&self) -> usize {
        self.ransac_calls.load(Ordering::SeqCst)
            + self.region_calls.load(Ordering::SeqCst)
            + self.polygonal_calls.load(Ordering::SeqCst)
            + self.poisson_calls.load(Ordering::SeqCst)
    }

    fn tetrahedron() -> SurfaceMesh {
        SurfaceMesh::from_parts(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
                Point3::new(0.0, 0.0, 1.0),
            ],
            vec![vec![0, 2, 1], vec![0, 1, 3], vec![0, 3, 2], vec![1, 2, 3]],
        )
    }
}

impl GeometryEngine for RecordingEngine {
    fn detect_planes_ransac(&self, points: &PointSet) -> Option<Partition> {
        self.ransac_calls.fetch_add(1, Ordering::SeqCst);
        Some(vec![(0..points.len()).collect()])
    }

    fn grow_regions(&self, _points: &PointSet, _params: &RegionGrowingParams) -> Partition {
        self.region_calls.fetch_add(1, Ordering::SeqCst);
        Vec::new()
    }

    fn reconstruct_polygonal(
        &self,
        _points: &PointSet,
        weights: Option<DetailWeights>,
    ) -> EngineResult<SurfaceMesh> {
        self.polygonal_calls.fetch_add(1, Ordering::SeqCst);
        self.weights.lock().unwrap().push(weights);
        if self.fail_polygonal {
            return Err(EngineError::NoSupportingSegments { segments: 0 });
        }
        Ok(Self::tetrahedron())
    }

    fn reconstruct_poisson(&self, _points: &PointSet, _spacing: f64) -> EngineResult<SurfaceMesh> {
        self.poisson_calls.fetch_add(1, Ordering::SeqCst);
        Ok(Self::tetrahedron())
    }

    fn average_spacing(&self, _points: &PointSet, k: usize) -> f64 {
        self.spacing_k.lock().unwrap().push(k);
        0.5
    }
}

fn write_four_point_xyz(path: &Path) {
    fs::write(
        path,
        "0 0 0 0 0 1\n1 0 0 0 0 1\n0 1 0 0 0 1\n1 1 0 0 0 1\n",
    )
    .unwrap();
}

/// Two perpendicular 6x6 patches with normals, as XYZ text.
fn write_two_planes_xyz(path: &Path) {
    let mut text = String::new();
    for i in 0..6 {
        for j in 0..6 {
            text.push_str(&format!("{i} {j} 0 0 0 1\n"));
        }
    }
    for i in 0..6 {
        for j in 0..6 {
            text.push_str(&format!("10 {i} {} 1 0 0\n", j + 1));
        }
    }
    fs::write(path, text).unwrap();
}

#[test]
fn given_shapes_poisson_to_off() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("quad.xyz");
    let output = dir.path().join("quad.off");
    write_four_point_xyz(&input);

    let options = PipelineOptions::new(FileFormat::Xyz, FileFormat::Off)
        .with_shapes_assigned(true)
        .with_reconstruction(ReconstructionConfig::Poisson);
    let engine = RecordingEngine::default();
    let pipeline = Pipeline::new(&engine, &options).unwrap();
    let report = pipeline.run(&input, &output).unwrap();

    assert_eq!(report.points, 4);
    assert_eq!(report.detection_method, "none");
    assert_eq!(report.faces, 4);
    assert!(fs::metadata(&output).unwrap().len() > 0);
    assert!(fs::read_to_string(&output).unwrap().starts_with("OFF"));

    assert_eq!(engine.ransac_calls.load(Ordering::SeqCst), 0);
    assert_eq!(engine.region_calls.load(Ordering::SeqCst), 0);
    assert_eq!(engine.poisson_calls.load(Ordering::SeqCst), 1);
    assert_eq!(*engine.spacing_k.lock().unwrap(), vec![POISSON_SPACING_NEIGHBORS]);
}

#[test]
fn region_growing_above_point_count_leaves_all_unassigned() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("planes.xyz");
    write_two_planes_xyz(&input);
    let mut points = load_points(&input, FileFormat::Xyz).unwrap();

    let params = RegionGrowingParams::default().with_min_region_size(points.len() + 1);
    let summary = detect(
        &ScanEngine::new(),
        &mut points,
        &DetectionConfig::RegionGrowing(params),
    )
    .unwrap();

    assert_eq!(summary.shapes, 0);
    assert!(points.iter().all(|p| p.segment_index() == UNASSIGNED));
}

#[test]
fn user_weights_reach_engine_unmodified() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("quad.xyz");
    write_four_point_xyz(&input);

    let options = PipelineOptions::new(FileFormat::Xyz, FileFormat::Ply)
        .with_detection(DetectionConfig::Ransac)
        .with_reconstruction(ReconstructionConfig::Polygonal {
            detail: DetailLevel::user(0.5, 0.5, 0.5),
        });
    let engine = RecordingEngine::default();
    Pipeline::new(&engine, &options)
        .unwrap()
        .run(&input, dir.path().join("quad.ply"))
        .unwrap();

    let weights = engine.weights.lock().unwrap();
    assert_eq!(*weights, vec![Some(DetailWeights::new(0.5, 0.5, 0.5))]);
    let sum = weights[0].map(|w| w.sum()).unwrap();
    assert_relative_eq!(sum, 1.5);
}

#[test]
fn normal_detail_leaves_weights_to_engine() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("quad.xyz");
    write_four_point_xyz(&input);

    let options = PipelineOptions::new(FileFormat::Xyz, FileFormat::Off)
        .with_detection(DetectionConfig::Ransac);
    let engine = RecordingEngine::default();
    Pipeline::new(&engine, &options)
        .unwrap()
        .run(&input, dir.path().join("quad.off"))
        .unwrap();

    assert_eq!(*engine.weights.lock().unwrap(), vec![None]);
}

#[test]
fn missing_input_fails_before_engine() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("absent.xyz");
    let output = dir.path().join("absent.off");

    let options = PipelineOptions::new(FileFormat::Xyz, FileFormat::Off)
        .with_detection(DetectionConfig::Ransac);
    let engine = RecordingEngine::default();
    let err = Pipeline::new(&engine, &options)
        .unwrap()
        .run(&input, &output)
        .unwrap_err();

    assert!(matches!(err, PipelineError::Load(LoadError::NotFound { .. })));
    assert_eq!(err.last_completed_stage(), PipelineStage::Validated);
    assert_eq!(engine.engine_calls(), 0);
    assert!(!output.exists());
}

#[test]
fn off_input_is_unsupported() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("mesh.off");
    fs::write(&input, "OFF\n0 0 0\n").unwrap();

    let options = PipelineOptions::new(FileFormat::Off, FileFormat::Ply)
        .with_detection(DetectionConfig::Ransac);
    let engine = RecordingEngine::default();
    let err = Pipeline::new(&engine, &options)
        .unwrap()
        .run(&input, dir.path().join("out.ply"))
        .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Load(LoadError::UnsupportedFormat { format: FileFormat::Off })
    ));
    assert_eq!(engine.engine_calls(), 0);
}

#[test]
fn solver_failure_carries_engine_message() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("quad.xyz");
    let output = dir.path().join("quad.off");
    write_four_point_xyz(&input);

    let options = PipelineOptions::new(FileFormat::Xyz, FileFormat::Off)
        .with_detection(DetectionConfig::Ransac);
    let engine = RecordingEngine::failing_polygonal();
    let err = Pipeline::new(&engine, &options)
        .unwrap()
        .run(&input, &output)
        .unwrap_err();

    let PipelineError::Reconstruction(ReconstructionError::SolverFailed { message }) = &err else {
        panic!("unexpected error: {err:?}");
    };
    assert_eq!(
        message,
        &EngineError::NoSupportingSegments { segments: 0 }.to_string()
    );
    assert_eq!(err.last_completed_stage(), PipelineStage::ShapesResolved);
    assert!(!output.exists());
}

#[test]
fn xyz_mesh_output_is_unsupported() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("quad.xyz");
    let output = dir.path().join("quad.out.xyz");
    write_four_point_xyz(&input);

    let options = PipelineOptions::new(FileFormat::Xyz, FileFormat::Xyz)
        .with_shapes_assigned(true)
        .with_reconstruction(ReconstructionConfig::Poisson);
    let err = Pipeline::new(RecordingEngine::default(), &options)
        .unwrap()
        .run(&input, &output)
        .unwrap_err();

    assert_eq!(err.kind(), "save");
    assert!(!output.exists());
}

#[test]
fn validation_gates_the_run() {
    let unassigned = PipelineOptions::new(FileFormat::Xyz, FileFormat::Off);
    let err = Pipeline::new(RecordingEngine::default(), &unassigned).unwrap_err();
    assert!(matches!(
        err,
        PipelineError::Config(ConfigError::MissingDetectionConfig)
    ));
    assert_eq!(err.last_completed_stage(), PipelineStage::Start);

    for detection in [
        DetectionConfig::Ransac,
        DetectionConfig::RegionGrowing(RegionGrowingParams::default()),
    ] {
        assert!(validate(&unassigned.clone().with_detection(detection)).is_ok());
    }

    let partial = unassigned
        .clone()
        .with_detection(DetectionConfig::Ransac)
        .with_reconstruction(ReconstructionConfig::Polygonal {
            detail: DetailLevel::User {
                fitting: Some(0.1),
                coverage: Some(0.2),
                complexity: None,
            },
        });
    assert!(matches!(
        validate(&partial),
        Err(ConfigError::MissingDetailParameters { .. })
    ));

    let zeros = partial.with_reconstruction(ReconstructionConfig::Polygonal {
        detail: DetailLevel::user(0.0, 0.0, 0.0),
    });
    assert!(validate(&zeros).is_ok());
}

#[test]
fn presets_are_deterministic() {
    for _ in 0..3 {
        let most = resolve_detail(&DetailLevel::Most).unwrap().unwrap();
        let least = resolve_detail(&DetailLevel::Least).unwrap().unwrap();
        assert_eq!(most.to_array(), [0.8, 0.15, 0.05]);
        assert_eq!(least.to_array(), [0.2, 0.1, 0.7]);
        assert_eq!(most, MOST);
        assert_eq!(least, LEAST);
    }
}

#[test]
fn scan_engine_ransac_polygonal_end_to_end() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("planes.xyz");
    let output = dir.path().join("planes.ply");
    let segments = dir.path().join("planes.seg.ply");
    write_two_planes_xyz(&input);

    let options = PipelineOptions::new(FileFormat::Xyz, FileFormat::Ply)
        .with_detection(DetectionConfig::Ransac)
        .with_reconstruction(ReconstructionConfig::Polygonal {
            detail: DetailLevel::Most,
        });
    let pipeline = Pipeline::new(ScanEngine::new(), &options).unwrap();
    let report = pipeline
        .run_job(&Job::new(&input, &output).with_segments(&segments))
        .unwrap();

    assert_eq!(report.points, 72);
    assert_eq!(report.detection.shapes, 2);
    assert_eq!(report.detection.assigned_points, 72);
    assert_eq!(report.faces, 2);
    assert!(output.exists());

    // The annotated points feed a later run with shapes given
    let annotated = load_points(&segments, FileFormat::Ply).unwrap();
    assert_eq!(annotated.len(), 72);
    assert_eq!(annotated.segment_count(), 2);

    let given = PipelineOptions::new(FileFormat::Ply, FileFormat::Off).with_shapes_assigned(true);
    let rerun = Pipeline::new(ScanEngine::new(), &given)
        .unwrap()
        .run(&segments, dir.path().join("planes.off"))
        .unwrap();
    assert_eq!(rerun.faces, 2);
    assert_eq!(rerun.detection.shapes, 2);
}

#[test]
fn batch_runs_jobs_independently() {
    let dir = tempfile::tempdir().unwrap();
    let good = dir.path().join("good.xyz");
    write_four_point_xyz(&good);

    let jobs = vec![
        Job::beside_input(&good, FileFormat::Off),
        Job::beside_input(dir.path().join("missing.xyz"), FileFormat::Off),
        Job::beside_input(&good, FileFormat::Ply),
    ];
    let options = PipelineOptions::new(FileFormat::Xyz, FileFormat::Off)
        .with_shapes_assigned(true)
        .with_reconstruction(ReconstructionConfig::Poisson);
    let engine = RecordingEngine::default();
    let results = Pipeline::new(&engine, &options).unwrap().run_batch(&jobs);

    assert_eq!(results.len(), 3);
    assert!(results[0].is_ok());
    assert!(matches!(
        results[1],
        Err(PipelineError::Load(LoadError::NotFound { .. }))
    ));
    assert!(results[2].is_ok());
    assert!(dir.path().join("good.xyz.out.off").exists());
    assert_eq!(engine.poisson_calls.load(Ordering::SeqCst), 2);
}

#[test]
fn reconstruct_in_memory_points() {
    let mut points: PointSet = (0..4)
        .map(|i| {
            PointRecord::with_segment(
                Point3::new(f64::from(i), 0.0, 0.0),
                Vector3::z(),
                0,
            )
        })
        .collect();
    let options = PipelineOptions::new(FileFormat::Ply, FileFormat::Ply)
        .with_shapes_assigned(true)
        .with_reconstruction(ReconstructionConfig::Polygonal {
            detail: DetailLevel::Least,
        });
    let engine = RecordingEngine::default();
    let pipeline = Pipeline::new(&engine, &options).unwrap();

    let (summary, mesh) = pipeline.reconstruct_points(&mut points).unwrap();
    assert_eq!(summary.shapes, 1);
    assert_eq!(mesh.face_count(), 4);
    assert_eq!(*engine.weights.lock().unwrap(), vec![Some(LEAST)]);
}

#[test]
fn unsupported_segments_format_writes_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("quad.xyz");
    let output = dir.path().join("quad.off");
    write_four_point_xyz(&input);

    let options = PipelineOptions::new(FileFormat::Xyz, FileFormat::Off)
        .with_detection(DetectionConfig::Ransac);
    let err = Pipeline::new(RecordingEngine::default(), &options)
        .unwrap()
        .run_job(&Job::new(&input, &output).with_segments(dir.path().join("quad.seg.off")))
        .unwrap_err();

    assert!(matches!(
        err,
        PipelineError::Save(SaveError::UnsupportedFormat { format: FileFormat::Off, .. })
    ));
    assert!(!output.exists());
}

#[test]
fn failed_segments_write_removes_mesh() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("quad.xyz");
    let output = dir.path().join("quad.off");
    write_four_point_xyz(&input);

    let options = PipelineOptions::new(FileFormat::Xyz, FileFormat::Off)
        .with_detection(DetectionConfig::Ransac);
    let segments = dir.path().join("missing").join("quad.seg.ply");
    let err = Pipeline::new(RecordingEngine::default(), &options)
        .unwrap()
        .run_job(&Job::new(&input, &output).with_segments(&segments))
        .unwrap_err();

    assert!(matches!(err, PipelineError::Save(SaveError::Unopenable { .. })));
    assert!(!output.exists());
}

/// `n` by `n` unit grid on z = 0 with upward normals.
fn flat_grid(n: u32) -> PointSet {
    (0..n)
        .flat_map(|i| (0..n).map(move |j| (i, j)))
        .map(|(i, j)| {
            PointRecord::new(Point3::new(f64::from(i), f64::from(j), 0.0), Vector3::z())
        })
        .collect()
}

#[test]
fn scan_engine_handles_large_flat_grid() {
    let engine = ScanEngine::new();
    let mut points = flat_grid(30);

    assert_relative_eq!(engine.average_spacing(&points, 1), 1.0, epsilon = 1e-12);

    let params = RegionGrowingParams::new(1.5, 0.1, 20.0, 10);
    let summary = detect(&engine, &mut points, &DetectionConfig::RegionGrowing(params)).unwrap();
    assert_eq!(summary.shapes, 1);
    assert_eq!(summary.assigned_points, 900);
}

#[test]
fn scan_engine_handles_duplicate_points() {
    let points: PointSet = (0..100)
        .map(|_| PointRecord::new(Point3::new(0.5, 0.5, 0.5), Vector3::z()))
        .collect();
    assert_relative_eq!(ScanEngine::new().average_spacing(&points, 6), 0.0);
}
