//! Copies the input file into the staging directory

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tracing::info;

use billing_common::checksum::verify_file_copy;
use billing_common::types::ChecksumAlgorithm;

use crate::error::{JobError, Result};
use crate::framework::{JobParameters, StepContext, Tasklet};
use crate::params;

/// Where the staged copy of the run's input file lives
pub fn staged_input_path(staging_dir: &Path, parameters: &JobParameters) -> Result<PathBuf> {
    let input = parameters
        .get_string(params::INPUT_FILE)
        .ok_or_else(|| JobError::parameter(format!("{} is required", params::INPUT_FILE)))?;
    let file_name = Path::new(input).file_name().ok_or_else(|| {
        JobError::parameter(format!("{} has no file name: {}", params::INPUT_FILE, input))
    })?;
    Ok(staging_dir.join(file_name))
}

/// Stages `input.file` and checks the copy against the source checksum
pub struct FilePreparationTasklet {
    staging_dir: PathBuf,
    algorithm: ChecksumAlgorithm,
}

impl FilePreparationTasklet {
    pub fn new(staging_dir: impl Into<PathBuf>, algorithm: ChecksumAlgorithm) -> Self {
        Self {
            staging_dir: staging_dir.into(),
            algorithm,
        }
    }
}

/// Both paths exist and resolve to the same file
async fn same_file(a: &Path, b: &Path) -> bool {
    match (tokio::fs::canonicalize(a).await, tokio::fs::canonicalize(b).await) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

#[async_trait]
impl Tasklet for FilePreparationTasklet {
    async fn execute(&mut self, ctx: &StepContext<'_>) -> Result<()> {
        let source = ctx
            .parameters
            .get_string(params::INPUT_FILE)
            .map(PathBuf::from)
            .ok_or_else(|| JobError::parameter(format!("{} is required", params::INPUT_FILE)))?;
        let target = staged_input_path(&self.staging_dir, ctx.parameters)?;

        if !tokio::fs::try_exists(&source).await? {
            return Err(JobError::step(format!(
                "Input file not found: {}",
                source.display()
            )));
        }

        tokio::fs::create_dir_all(&self.staging_dir).await?;

        if same_file(&source, &target).await {
            info!(path = %target.display(), "Input file already staged");
        } else {
            let bytes = tokio::fs::copy(&source, &target).await?;
            info!(
                source = %source.display(),
                target = %target.display(),
                bytes,
                "Input file copied to staging"
            );
        }

        let algorithm = self.algorithm;
        let (src, dst) = (source.clone(), target.clone());
        let checksum = tokio::task::spawn_blocking(move || verify_file_copy(&src, &dst, algorithm))
            .await
            .map_err(|e| JobError::step(format!("Checksum task failed: {}", e)))??;

        info!(
            path = %target.display(),
            algorithm = %algorithm,
            checksum = %checksum,
            "Staged copy verified"
        );
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[tokio::test]
    async fn test_copies_and_verifies_input() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("billing-2023-01.csv");
        std::fs::write(&input, "2023,1,1,555-0100,10.0,5,2\n").unwrap();
        let staging = dir.path().join("staging");

        let params = JobParameters::builder()
            .string(params::INPUT_FILE, input.to_string_lossy())
            .build();
        let ctx = StepContext::new("test", Uuid::new_v4(), &params);

        let mut tasklet = FilePreparationTasklet::new(&staging, ChecksumAlgorithm::Sha256);
        tasklet.execute(&ctx).await.unwrap();

        let staged = staged_input_path(&staging, &params).unwrap();
        assert_eq!(staged, staging.join("billing-2023-01.csv"));
        assert_eq!(
            std::fs::read_to_string(staged).unwrap(),
            "2023,1,1,555-0100,10.0,5,2\n"
        );

        // Rerun overwrites the staged copy
        tasklet.execute(&ctx).await.unwrap();
    }

    #[tokio::test]
    async fn test_input_already_in_staging_is_left_alone() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("billing.csv");
        std::fs::write(&input, "2023,1,1,555-0100,10.0,5,2\n").unwrap();

        let params = JobParameters::builder()
            .string(params::INPUT_FILE, input.to_string_lossy())
            .build();
        let ctx = StepContext::new("test", Uuid::new_v4(), &params);

        let mut tasklet = FilePreparationTasklet::new(dir.path(), ChecksumAlgorithm::Sha256);
        tasklet.execute(&ctx).await.unwrap();
        assert_eq!(
            std::fs::read_to_string(&input).unwrap(),
            "2023,1,1,555-0100,10.0,5,2\n"
        );
    }

    #[tokio::test]
    async fn test_missing_input_fails() {
        let dir = tempfile::tempdir().unwrap();
        let params = JobParameters::builder()
            .string(params::INPUT_FILE, dir.path().join("nope.csv").to_string_lossy())
            .build();
        let ctx = StepContext::new("test", Uuid::new_v4(), &params);

        let mut tasklet = FilePreparationTasklet::new(dir.path(), ChecksumAlgorithm::Sha256);
        let err = tasklet.execute(&ctx).await.unwrap_err();
        assert!(err.to_string().contains("not found"));
    }
}
