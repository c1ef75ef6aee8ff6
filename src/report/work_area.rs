//! Temporary storage for the rendered pieces of a report.

use std::{
    fs,
    io::ErrorKind,
    path::{Path, PathBuf},
};

use tempfile::TempDir;

use crate::{Error, record::RecordKind};

/// Identifies a piece of a report.
///
/// The derived ordering is the order the pieces appear in the final
/// document: the header, income batches by offset, expense batches by offset,
/// and then the footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FragmentId {
    /// The title and summary.
    Header,
    /// The records of the batch of `kind` starting at `offset`.
    Chunk {
        /// The kind of records in the batch.
        kind: RecordKind,
        /// The offset of the batch.
        offset: u64,
    },
    /// The closing disclaimer.
    Footer,
}

impl FragmentId {
    /// The name of the file the fragment is written to within a work area.
    pub fn file_name(&self) -> String {
        match self {
            FragmentId::Header => "header.pdf".to_owned(),
            FragmentId::Chunk { kind, offset } => format!("{kind}-{offset:012}.pdf"),
            FragmentId::Footer => "footer.pdf".to_owned(),
        }
    }
}

/// A rendered PDF fragment stored on disk.
///
/// The file is deleted when the fragment is dropped.
#[derive(Debug)]
pub struct Fragment {
    id: FragmentId,
    path: PathBuf,
}

impl Fragment {
    /// The piece of the report this fragment holds.
    pub fn id(&self) -> FragmentId {
        self.id
    }

    /// Read the fragment's PDF bytes.
    ///
    /// # Errors
    /// Returns [Error::WorkAreaError] if the file cannot be read.
    pub fn read(&self) -> Result<Vec<u8>, Error> {
        fs::read(&self.path).map_err(|error| {
            Error::WorkAreaError(format!("could not read {}: {error}", self.path.display()))
        })
    }
}

impl Drop for Fragment {
    fn drop(&mut self) {
        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(error) if error.kind() == ErrorKind::NotFound => {}
            Err(error) => {
                tracing::warn!("could not remove fragment {}: {error}", self.path.display())
            }
        }
    }
}

/// Write the bytes of fragment `id` into the work area directory `dir`.
///
/// # Errors
/// Returns [Error::WorkAreaError] if the file cannot be written.
pub fn write_fragment(dir: &Path, id: FragmentId, bytes: &[u8]) -> Result<Fragment, Error> {
    let path = dir.join(id.file_name());

    fs::write(&path, bytes).map_err(|error| {
        Error::WorkAreaError(format!("could not write {}: {error}", path.display()))
    })?;

    Ok(Fragment { id, path })
}

/// A directory private to one export.
///
/// Each export gets its own directory so that concurrent exports never see
/// each other's fragments. The directory and anything left in it is removed
/// by [WorkArea::close], or when the work area is dropped.
#[derive(Debug)]
pub struct WorkArea {
    dir: TempDir,
}

impl WorkArea {
    /// Create a new, uniquely named work area under `root`, creating `root`
    /// if needed.
    ///
    /// # Errors
    /// Returns [Error::WorkAreaError] if a directory cannot be created.
    pub fn create(root: &Path) -> Result<Self, Error> {
        fs::create_dir_all(root)?;

        let dir = tempfile::Builder::new()
            .prefix("report-")
            .tempdir_in(root)?;

        tracing::debug!("created work area {}", dir.path().display());

        Ok(Self { dir })
    }

    /// The path of the work area directory.
    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Delete the work area.
    ///
    /// Failing to delete the directory is logged and otherwise ignored, it
    /// should not turn a finished export into a failed one.
    pub fn close(self) {
        let path = self.dir.path().to_owned();

        if let Err(error) = self.dir.close() {
            tracing::warn!("could not remove work area {}: {error}", path.display());
        }
    }
}
