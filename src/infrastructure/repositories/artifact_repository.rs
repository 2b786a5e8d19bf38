use crate::domain::synthesis::{Artifact, ArtifactHandle, AudioFormat, JobId};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;

const MARKER_EXTENSION: &str = "processing";

/// Audio files on local disk, one per job, named `<job_id>.<ext>`.
///
/// While a job runs a `<job_id>.processing` marker sits next to them so that
/// an in-flight job can be told apart from an unknown one without the status
/// store. Files are never deleted here; cleanup belongs to whoever owns the
/// directory.
pub struct ArtifactRepository {
    root: PathBuf,
}

impl ArtifactRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub async fn ensure_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.root).await
    }

    /// Write and remove a scratch file
    pub async fn check_writable(&self) -> io::Result<()> {
        let scratch = self.root.join(".write-test");
        fs::write(&scratch, b"test").await?;
        fs::remove_file(&scratch).await
    }

    fn artifact_path(&self, id: &JobId, format: AudioFormat) -> PathBuf {
        self.root.join(format!("{}.{}", id, format.extension()))
    }

    fn marker_path(&self, id: &JobId) -> PathBuf {
        self.root.join(format!("{}.{}", id, MARKER_EXTENSION))
    }

    /// Blocking write of an empty marker, so it exists before the job task is
    /// spawned
    pub fn mark_in_flight(&self, id: &JobId) -> io::Result<()> {
        std::fs::write(self.marker_path(id), b"")
    }

    pub async fn clear_in_flight(&self, id: &JobId) -> io::Result<()> {
        match fs::remove_file(self.marker_path(id)).await {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }

    pub async fn is_in_flight(&self, id: &JobId) -> bool {
        fs::try_exists(self.marker_path(id)).await.unwrap_or(false)
    }

    /// Persist the artifact for a job. The file appears under its final name
    /// only once fully written.
    pub async fn write(&self, id: &JobId, artifact: &Artifact) -> io::Result<ArtifactHandle> {
        if artifact.data.is_empty() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "refusing to store empty audio",
            ));
        }

        let path = self.artifact_path(id, artifact.format);
        let partial = path.with_extension(format!("{}.part", artifact.format.extension()));

        fs::write(&partial, &artifact.data).await?;
        fs::rename(&partial, &path).await?;

        tracing::debug!(
            job_id = %id,
            path = %path.display(),
            audio_size_bytes = artifact.data.len(),
            "Audio file written"
        );

        Ok(ArtifactHandle {
            path,
            format: artifact.format,
        })
    }

    /// Look up a stored artifact by job id in any supported format
    pub async fn find(&self, id: &JobId) -> Option<ArtifactHandle> {
        for format in AudioFormat::ALL {
            let path = self.artifact_path(id, format);
            if fs::try_exists(&path).await.unwrap_or(false) {
                return Some(ArtifactHandle { path, format });
            }
        }
        None
    }

    pub async fn read(&self, handle: &ArtifactHandle) -> io::Result<Vec<u8>> {
        fs::read(&handle.path).await
    }
}
