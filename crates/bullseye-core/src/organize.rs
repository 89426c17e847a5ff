//! Moving classified images into per-label folders.
//!
//! Each image goes to `root/<label>/<file name>`. Existing files are never
//! overwritten: a name collision is reported as a skipped duplicate. Work
//! inside one destination folder is serialized by a per-folder lock so the
//! exists-check and the move cannot interleave; different folders proceed
//! in parallel.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use crate::error::PipelineError;
use crate::types::{FailureKind, MoveOutcome};

/// Suffix of the hidden staging file used for cross-device moves.
const STAGING_SUFFIX: &str = ".bullseye-partial";

/// Places images into label folders under an input root.
#[derive(Debug, Default)]
pub struct Organizer {
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
}

impl Organizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Destination of `image_path` when filed under `label` in `root`.
    pub fn destination_for(image_path: &Path, label: &str, root: &Path) -> Option<PathBuf> {
        image_path
            .file_name()
            .map(|name| root.join(label).join(name))
    }

    /// Move one image into `root/label`.
    ///
    /// Never returns an error: filesystem failures become a failed outcome
    /// with [`FailureKind::Move`].
    pub fn place(&self, image_path: &Path, label: &str, root: &Path) -> MoveOutcome {
        let Some(destination) = Self::destination_for(image_path, label, root) else {
            return MoveOutcome::failed(
                image_path,
                None,
                FailureKind::Move,
                "path has no file name",
            );
        };
        let folder = root.join(label);

        let lock = self.folder_lock(&folder);
        let _guard = lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner());

        match place_locked(image_path, &folder, &destination) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!("{e}");
                MoveOutcome::failed(image_path, Some(destination), e.kind(), e.to_string())
            }
        }
    }

    /// The lock guarding one destination folder, created on first use.
    fn folder_lock(&self, folder: &Path) -> Arc<Mutex<()>> {
        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        locks.entry(folder.to_path_buf()).or_default().clone()
    }
}

/// Create-check-move for one image. Caller holds the folder lock.
fn place_locked(
    source: &Path,
    folder: &Path,
    destination: &Path,
) -> Result<MoveOutcome, PipelineError> {
    let move_error = |message: String| PipelineError::Move {
        path: source.to_path_buf(),
        message,
    };

    fs::create_dir_all(folder)
        .map_err(|e| move_error(format!("cannot create {}: {e}", folder.display())))?;

    if destination.exists() {
        tracing::debug!(
            "{} already exists, leaving {} in place",
            destination.display(),
            source.display()
        );
        return Ok(MoveOutcome::skipped_duplicate(source, destination));
    }

    match fs::rename(source, destination) {
        Ok(()) => {}
        Err(e) if is_cross_device(&e) => {
            tracing::debug!(
                "{} is on another device, copying instead",
                destination.display()
            );
            move_across_devices(source, destination)
                .map_err(|e| move_error(format!("copy to {} failed: {e}", destination.display())))?;
        }
        Err(e) => {
            return Err(move_error(format!(
                "rename to {} failed: {e}",
                destination.display()
            )))
        }
    }

    Ok(MoveOutcome::moved(source, destination))
}

/// Copy into a hidden staging file beside `destination`, rename it into
/// place, then delete the source. A crash leaves at most a staging file,
/// never a truncated file under the final name.
fn move_across_devices(source: &Path, destination: &Path) -> io::Result<()> {
    let staging = staging_path(destination)?;
    let result = fs::copy(source, &staging).and_then(|_| fs::rename(&staging, destination));
    if let Err(e) = result {
        let _ = fs::remove_file(&staging);
        return Err(e);
    }
    fs::remove_file(source)
}

fn staging_path(destination: &Path) -> io::Result<PathBuf> {
    let name = destination.file_name().ok_or_else(|| {
        io::Error::new(io::ErrorKind::InvalidInput, "destination has no file name")
    })?;
    let mut staged = std::ffi::OsString::from(".");
    staged.push(name);
    staged.push(STAGING_SUFFIX);
    Ok(destination.with_file_name(staged))
}

fn is_cross_device(err: &io::Error) -> bool {
    // EXDEV on Unix, ERROR_NOT_SAME_DEVICE on Windows.
    #[cfg(unix)]
    const CROSS_DEVICE: i32 = 18;
    #[cfg(windows)]
    const CROSS_DEVICE: i32 = 17;
    #[cfg(not(any(unix, windows)))]
    const CROSS_DEVICE: i32 = -1;

    err.raw_os_error() == Some(CROSS_DEVICE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MoveStatus;

    fn touch(path: &Path, contents: &str) {
        fs::write(path, contents).unwrap();
    }

    #[test]
    fn test_place_moves_into_new_label_folder() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("cat.jpg");
        touch(&source, "cat");

        let outcome = Organizer::new().place(&source, "animals", dir.path());

        let expected = dir.path().join("animals").join("cat.jpg");
        assert_eq!(outcome.status, MoveStatus::Moved);
        assert_eq!(outcome.destination.as_deref(), Some(expected.as_path()));
        assert!(!source.exists());
        assert_eq!(fs::read_to_string(expected).unwrap(), "cat");
    }

    #[test]
    fn test_collision_is_skipped_and_nothing_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("anime")).unwrap();
        touch(&dir.path().join("anime").join("a.png"), "original");
        let source = dir.path().join("a.png");
        touch(&source, "newcomer");

        let outcome = Organizer::new().place(&source, "anime", dir.path());

        assert_eq!(outcome.status, MoveStatus::SkippedDuplicate);
        assert!(outcome.failure.is_none());
        assert_eq!(
            fs::read_to_string(dir.path().join("anime").join("a.png")).unwrap(),
            "original"
        );
        assert_eq!(fs::read_to_string(&source).unwrap(), "newcomer");
    }

    #[test]
    fn test_source_already_at_destination_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("other")).unwrap();
        let placed = dir.path().join("other").join("b.png");
        touch(&placed, "b");

        let outcome = Organizer::new().place(&placed, "other", dir.path());

        assert_eq!(outcome.status, MoveStatus::SkippedDuplicate);
        assert!(placed.exists());
    }

    #[test]
    fn test_missing_source_fails_with_move_kind() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = Organizer::new().place(&dir.path().join("ghost.png"), "anime", dir.path());

        assert_eq!(outcome.status, MoveStatus::Failed);
        let failure = outcome.failure.unwrap();
        assert_eq!(failure.kind, FailureKind::Move);
        assert!(failure.reason.contains("ghost.png"));
    }

    #[test]
    fn test_concurrent_same_name_moves_exactly_once() {
        let dir = tempfile::tempdir().unwrap();
        let organizer = Arc::new(Organizer::new());
        let mut sources = Vec::new();
        for i in 0..8 {
            let sub = dir.path().join(format!("in{i}"));
            fs::create_dir(&sub).unwrap();
            let source = sub.join("same.png");
            touch(&source, &format!("{i}"));
            sources.push(source);
        }

        let handles: Vec<_> = sources
            .into_iter()
            .map(|source| {
                let organizer = Arc::clone(&organizer);
                let root = dir.path().to_path_buf();
                std::thread::spawn(move || organizer.place(&source, "anime", &root))
            })
            .collect();
        let outcomes: Vec<MoveOutcome> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        let moved = outcomes
            .iter()
            .filter(|o| o.status == MoveStatus::Moved)
            .count();
        let skipped = outcomes
            .iter()
            .filter(|o| o.status == MoveStatus::SkippedDuplicate)
            .count();
        assert_eq!(moved, 1);
        assert_eq!(skipped, 7);
    }

    #[test]
    fn test_move_across_devices_leaves_no_staging_file() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("anime")).unwrap();
        let source = dir.path().join("c.png");
        touch(&source, "copied");
        let destination = dir.path().join("anime").join("c.png");

        move_across_devices(&source, &destination).unwrap();

        assert!(!source.exists());
        assert_eq!(fs::read_to_string(&destination).unwrap(), "copied");
        assert!(!staging_path(&destination).unwrap().exists());
    }

    #[test]
    fn test_staging_path_is_hidden_sibling() {
        let staging = staging_path(Path::new("/root/anime/c.png")).unwrap();
        assert_eq!(
            staging,
            PathBuf::from("/root/anime/.c.png.bullseye-partial")
        );
    }

    #[test]
    fn test_cross_device_detection() {
        assert!(!is_cross_device(&io::Error::from(io::ErrorKind::NotFound)));
        #[cfg(unix)]
        assert!(is_cross_device(&io::Error::from_raw_os_error(18)));
    }
}
