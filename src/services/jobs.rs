//! Async job runner
//!
//! The pipeline writes fixed file names, so two runs sharing an output
//! directory would overwrite each other. Runs are serialized per canonical
//! output directory, and `unique_job_dir` gives callers a fresh directory
//! when they want full isolation.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, Weak};

use crate::config::PipelineOptions;
use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::MediaAudioPipeline;

type LockTable = HashMap<PathBuf, Weak<tokio::sync::Mutex<()>>>;

static DIRECTORY_LOCKS: OnceLock<Mutex<LockTable>> = OnceLock::new();

fn lock_table() -> MutexGuard<'static, LockTable> {
    let locks = DIRECTORY_LOCKS.get_or_init(|| Mutex::new(HashMap::new()));
    match locks.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

/// Shared lock for one output directory.
///
/// Callers holding or waiting on the lock share one instance. The table only
/// keeps weak references, and entries whose lock nobody holds are pruned on
/// the next call.
pub fn directory_lock(dir: &Path) -> Arc<tokio::sync::Mutex<()>> {
    let mut locks = lock_table();
    locks.retain(|_, lock| lock.strong_count() > 0);

    if let Some(lock) = locks.get(dir).and_then(Weak::upgrade) {
        return lock;
    }
    let lock = Arc::new(tokio::sync::Mutex::new(()));
    locks.insert(dir.to_path_buf(), Arc::downgrade(&lock));
    lock
}

#[cfg(test)]
fn tracked_directories() -> usize {
    lock_table().len()
}

/// Create `base/job_<uuid>` and return it.
pub fn unique_job_dir(base: &Path) -> PipelineResult<PathBuf> {
    let dir = base.join(format!("job_{}", uuid::Uuid::new_v4()));
    std::fs::create_dir_all(&dir).map_err(|e| PipelineError::io(&dir, e))?;
    log::debug!("Created job directory {}", dir.display());
    Ok(dir)
}

/// Run the full pipeline on the blocking pool and return the final video path.
pub async fn run_pipeline(
    video: PathBuf,
    audio: Option<PathBuf>,
    output_dir: PathBuf,
    options: PipelineOptions,
) -> PipelineResult<PathBuf> {
    std::fs::create_dir_all(&output_dir).map_err(|e| PipelineError::io(&output_dir, e))?;
    let output_dir = output_dir
        .canonicalize()
        .map_err(|e| PipelineError::io(&output_dir, e))?;

    let lock = directory_lock(&output_dir);
    let _guard = lock.lock().await;
    log::info!("Starting job in {}", output_dir.display());

    let pipeline = MediaAudioPipeline::new(video, audio, output_dir).with_options(options);
    tokio::task::spawn_blocking(move || pipeline.run())
        .await
        .map_err(|e| PipelineError::TaskFailed(e.to_string()))?
}
