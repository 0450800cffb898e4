//! Prepare idempotence, bucket isolation, resume, and scheduling tests

use lfads_sweep::dataset::{Dataset, DatasetCollection, DatasetInfo, JsonInfoLoader};
use lfads_sweep::matrix::{
    DataExporter, ExportContext, JsonDataExporter, RunMatrix, INPUT_FILE,
};
use lfads_sweep::params::{ParameterRecord, Sweep};
use lfads_sweep::plan::{build_plan, PlannerConfig};
use lfads_sweep::results::POSTERIOR_MEANS_FILE;
use lfads_sweep::runspec::RunSpec;
use lfads_sweep::Error;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Route tracing output through the test harness; `RUST_LOG` controls
/// verbosity.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn collection(dir: &Path) -> DatasetCollection {
    let mut coll = DatasetCollection::new("reaching", dir);
    for name in ["ds1", "ds2"] {
        let path = dir.join(format!("{name}.json"));
        let info = DatasetInfo {
            n_trials: 60,
            timebase_ms: 1.0,
            subject: "j".to_string(),
            session: "s1".to_string(),
        };
        std::fs::write(&path, serde_json::to_vec(&info).unwrap()).unwrap();
        coll.add_dataset(Dataset::new(name, path)).unwrap();
    }
    let report = coll.load_info(&JsonInfoLoader);
    assert!(report.is_complete());
    coll
}

fn matrix(dir: &Path) -> RunMatrix {
    let coll = collection(dir);
    let base = ParameterRecord::builder()
        .field("learning_rate", 0.01)
        .field("spike_bin_ms", 2i64)
        .build()
        .unwrap();
    let mut matrix = RunMatrix::new("sweep", dir.join("runs"), coll.clone())
        .with_data_fields(["spike_bin_ms"]);
    matrix
        .add_params(Sweep::over(&base, "learning_rate", [0.01, 0.005, 0.001]).unwrap())
        .unwrap();
    matrix.add_run_spec(RunSpec::single(&coll, 0).unwrap()).unwrap();
    matrix.add_run_spec(RunSpec::all("both", &coll).unwrap()).unwrap();
    matrix
}

/// Snapshot every file under `root` as path -> bytes.
fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
    fn walk(dir: &Path, out: &mut BTreeMap<PathBuf, Vec<u8>>) {
        for entry in std::fs::read_dir(dir).unwrap() {
            let path = entry.unwrap().path();
            if path.is_dir() {
                walk(&path, out);
            } else {
                out.insert(path.clone(), std::fs::read(&path).unwrap());
            }
        }
    }
    let mut out = BTreeMap::new();
    walk(root, &mut out);
    out
}

// =============================================================================
// Idempotence
// =============================================================================

#[test]
fn test_prepare_twice_changes_nothing() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let matrix = matrix(dir.path());

    let first = matrix.prepare(&JsonDataExporter).unwrap();
    // 3 params x 2 specs, one bucket per spec (bin width constant)
    assert_eq!(first.exported_buckets.len(), 2);
    assert_eq!(first.configs_written, 6);

    let before = snapshot(&matrix.base_dir());

    let second = matrix.prepare(&JsonDataExporter).unwrap();
    assert!(second.exported_buckets.is_empty());
    assert_eq!(second.reused_buckets.len(), 2);
    assert_eq!(second.configs_written, 0);
    assert_eq!(second.configs_reused, 6);

    let after = snapshot(&matrix.base_dir());
    assert_eq!(before, after);
}

// =============================================================================
// Bucket failure isolation
// =============================================================================

/// Fails exporting any stitched (multi-dataset) bucket.
struct FailStitched;

impl DataExporter for FailStitched {
    fn export(&self, ctx: &ExportContext<'_>, dest: &Path) -> lfads_sweep::Result<()> {
        if ctx.spec.is_stitched() {
            return Err(Error::DataPreparation {
                bucket: dest.display().to_string(),
                reason: "source dataset corrupt".to_string(),
            });
        }
        JsonDataExporter.export(ctx, dest)
    }
}

#[test]
fn test_failed_bucket_does_not_block_others() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let matrix = matrix(dir.path());

    let report = matrix.prepare(&FailStitched).unwrap();
    assert!(!report.is_complete());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.exported_buckets.len(), 1);
    // Only runs over the healthy bucket got configs (3 params x 1 spec)
    assert_eq!(report.configs_written, 3);

    // The healthy bucket's artifact exists on disk
    let healthy = matrix.get(0, 0).unwrap();
    assert!(healthy.common_data_dir().join(INPUT_FILE).is_file());
    let failed = matrix.get(0, 1).unwrap();
    assert!(!failed.common_data_dir().join(INPUT_FILE).is_file());

    // A later prepare with a healthy exporter fills the gap
    let retry = matrix.prepare(&JsonDataExporter).unwrap();
    assert!(retry.is_complete());
    assert_eq!(retry.exported_buckets.len(), 1);
    assert_eq!(retry.configs_written, 3);
}

// =============================================================================
// Planning over unprepared buckets
// =============================================================================

#[test]
fn test_plan_refuses_unprepared_buckets() {
    let dir = tempfile::tempdir().unwrap();
    let matrix = matrix(dir.path());
    // No prepare() call: shared artifacts are missing
    let result = build_plan(&matrix, &PlannerConfig::default());
    assert!(matches!(result, Err(Error::Scheduling(_))));
}

// =============================================================================
// Resume correctness
// =============================================================================

#[test]
fn test_resume_skips_completed_runs_preserving_order() {
    let dir = tempfile::tempdir().unwrap();
    let matrix = matrix(dir.path());
    matrix.prepare(&JsonDataExporter).unwrap();

    let config = PlannerConfig::default();
    let full = build_plan(&matrix, &config).unwrap();
    assert_eq!(full.len(), 6);

    // Mark runs 1 and 4 complete
    for &i in &[1usize, 4] {
        let run = &matrix.runs()[i];
        std::fs::write(run.run_dir().join(POSTERIOR_MEANS_FILE), b"{}").unwrap();
    }

    let resumed = build_plan(&matrix, &config).unwrap();
    assert_eq!(resumed.len(), 4);
    let indices: Vec<_> = resumed.jobs().iter().map(|j| j.run_index()).collect();
    assert_eq!(indices, vec![0, 2, 3, 5]);

    // With skip_completed off, everything is replanned
    let config = PlannerConfig {
        skip_completed: false,
        ..PlannerConfig::default()
    };
    assert_eq!(build_plan(&matrix, &config).unwrap().len(), 6);
}

// =============================================================================
// Device round-robin
// =============================================================================

#[test]
fn test_round_robin_two_devices_five_jobs() {
    let dir = tempfile::tempdir().unwrap();
    let coll = collection(dir.path());
    let base = ParameterRecord::builder()
        .field("learning_rate", 0.01)
        .build()
        .unwrap();
    let mut matrix = RunMatrix::new("rr", dir.path().join("runs"), coll.clone());
    matrix
        .add_params(Sweep::over(&base, "learning_rate", [0.05, 0.02, 0.01, 0.005, 0.002]).unwrap())
        .unwrap();
    matrix.add_run_spec(RunSpec::single(&coll, 0).unwrap()).unwrap();
    matrix.prepare(&JsonDataExporter).unwrap();

    let plan = build_plan(
        &matrix,
        &PlannerConfig {
            max_concurrent: 2,
            devices: vec![0, 1],
            require_device: true,
            ..PlannerConfig::default()
        },
    )
    .unwrap();

    let devices: Vec<_> = plan.jobs().iter().map(|j| j.device()).collect();
    assert_eq!(
        devices,
        vec![Some(0), Some(1), Some(0), Some(1), Some(0)]
    );
}

// =============================================================================
// Round-robin restarts over the admitted (filtered) order
// =============================================================================

#[test]
fn test_round_robin_applies_after_completion_filter() {
    let dir = tempfile::tempdir().unwrap();
    let matrix = matrix(dir.path());
    matrix.prepare(&JsonDataExporter).unwrap();

    // Complete the first run; the next admitted job becomes k = 0
    let run = &matrix.runs()[0];
    std::fs::write(run.run_dir().join(POSTERIOR_MEANS_FILE), b"{}").unwrap();

    let plan = build_plan(
        &matrix,
        &PlannerConfig {
            devices: vec![0, 1],
            ..PlannerConfig::default()
        },
    )
    .unwrap();
    assert_eq!(plan.jobs()[0].run_index(), 1);
    assert_eq!(plan.jobs()[0].device(), Some(0));
    assert_eq!(plan.jobs()[1].device(), Some(1));
}
