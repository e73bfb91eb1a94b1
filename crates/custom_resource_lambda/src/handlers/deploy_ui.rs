use std::fs;
use std::path::{Path, PathBuf};

use custom_resource_core::assets::{
    apply_find_replace, content_type_for, destination_key, BUCKET_OWNER_FULL_CONTROL,
    TEMPLATE_FILE_NAME,
};
use custom_resource_core::contract::{LifecycleEvent, PropertyError};
use custom_resource_core::properties::{parse_deploy_config, DeployConfig, SourceLocation};
use serde_json::json;

use crate::adapters::blob_store::{BlobStore, PutObjectOptions};
use crate::handlers::dispatcher::{ProvisionError, ProvisionOutcome, ResourceProvisioner};
use crate::logging::Logger;

pub const DEPLOY_UI_FAILURE_REASON: &str = "Failed to deploy Image Handler UI";

#[derive(Debug)]
pub enum DeployError {
    Config(PropertyError),
    Fetch(String),
    Archive(zip::result::ZipError),
    Io {
        context: String,
        source: std::io::Error,
    },
    Publish(String),
    Teardown(String),
}

impl DeployError {
    fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}

impl std::fmt::Display for DeployError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(error) => write!(f, "invalid deploy configuration: {error}"),
            Self::Fetch(message) => write!(f, "failed to fetch UI archive: {message}"),
            Self::Archive(error) => write!(f, "failed to extract UI archive: {error}"),
            Self::Io { context, source } => write!(f, "{context}: {source}"),
            Self::Publish(message) => write!(f, "failed to publish UI asset: {message}"),
            Self::Teardown(message) => write!(f, "failed to remove UI assets: {message}"),
        }
    }
}

impl std::error::Error for DeployError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Config(error) => Some(error),
            Self::Archive(error) => Some(error),
            Self::Io { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<PropertyError> for DeployError {
    fn from(error: PropertyError) -> Self {
        Self::Config(error)
    }
}

impl From<zip::result::ZipError> for DeployError {
    fn from(error: zip::result::ZipError) -> Self {
        Self::Archive(error)
    }
}

/// Publishes a zipped static UI bundle into a destination bucket prefix.
///
/// Deploy runs FETCH, EXTRACT, TRANSFORM, PUBLISH inside a scratch directory
/// that is purged at the start of every run. Teardown lists the prefix and
/// deletes each object, then the prefix marker itself.
pub struct AssetDeployer<'a> {
    store: &'a dyn BlobStore,
    scratch_dir: PathBuf,
    logger: Logger,
}

impl<'a> AssetDeployer<'a> {
    pub fn new(store: &'a dyn BlobStore, scratch_dir: impl Into<PathBuf>, logger: Logger) -> Self {
        Self {
            store,
            scratch_dir: scratch_dir.into(),
            logger,
        }
    }

    /// Returns the destination keys written, in upload order.
    pub fn deploy(&self, config: &DeployConfig) -> Result<Vec<String>, DeployError> {
        let source = config.source_location()?;
        let archive_path = self.fetch(&source)?;
        self.extract(&archive_path)?;
        if !config.find_replace.is_empty() {
            self.transform(config)?;
        }
        self.publish(config)
    }

    /// Returns the number of listed objects deleted (the prefix marker excluded).
    pub fn teardown(&self, config: &DeployConfig) -> Result<usize, DeployError> {
        let bucket = &config.destination_bucket;
        let prefix = &config.destination_prefix;
        self.logger.info(
            "listing_ui_objects",
            json!({ "bucket": bucket, "prefix": prefix }),
        );

        let keys = self
            .store
            .list_keys(bucket, prefix)
            .map_err(DeployError::Teardown)?;
        for key in &keys {
            self.logger
                .info("deleting_object", json!({ "bucket": bucket, "key": key }));
            self.store
                .delete_object(bucket, key)
                .map_err(DeployError::Teardown)?;
        }

        self.logger.info(
            "deleting_prefix_marker",
            json!({ "bucket": bucket, "key": prefix }),
        );
        self.store
            .delete_object(bucket, prefix)
            .map_err(DeployError::Teardown)?;
        Ok(keys.len())
    }

    fn fetch(&self, source: &SourceLocation) -> Result<PathBuf, DeployError> {
        self.reset_scratch_dir()?;
        let archive_path = self.scratch_dir.join(source.file_name());
        self.logger.info(
            "downloading_archive",
            json!({
                "bucket": source.bucket.clone(),
                "key": source.key.clone(),
                "destination": archive_path.display().to_string(),
            }),
        );

        let bytes = self
            .store
            .get_object(&source.bucket, &source.key)
            .map_err(DeployError::Fetch)?;
        fs::write(&archive_path, bytes).map_err(|error| {
            DeployError::io(
                format!("failed to write archive {}", archive_path.display()),
                error,
            )
        })?;
        Ok(archive_path)
    }

    fn reset_scratch_dir(&self) -> Result<(), DeployError> {
        if self.scratch_dir.exists() {
            fs::remove_dir_all(&self.scratch_dir).map_err(|error| {
                DeployError::io(
                    format!("failed to purge {}", self.scratch_dir.display()),
                    error,
                )
            })?;
        }
        fs::create_dir_all(&self.scratch_dir).map_err(|error| {
            DeployError::io(
                format!("failed to create {}", self.scratch_dir.display()),
                error,
            )
        })
    }

    fn extract(&self, archive_path: &Path) -> Result<(), DeployError> {
        self.logger.info(
            "extracting_archive",
            json!({
                "archive": archive_path.display().to_string(),
                "destination": self.scratch_dir.display().to_string(),
            }),
        );
        let file = fs::File::open(archive_path).map_err(|error| {
            DeployError::io(
                format!("failed to open archive {}", archive_path.display()),
                error,
            )
        })?;
        let mut archive = zip::ZipArchive::new(file)?;
        archive.extract(&self.scratch_dir)?;

        fs::remove_file(archive_path).map_err(|error| {
            DeployError::io(
                format!("failed to remove archive {}", archive_path.display()),
                error,
            )
        })
    }

    fn transform(&self, config: &DeployConfig) -> Result<(), DeployError> {
        let template_path = self.scratch_dir.join(TEMPLATE_FILE_NAME);
        self.logger.info(
            "rewriting_template",
            json!({
                "file": template_path.display().to_string(),
                "pairs": config.find_replace.len(),
            }),
        );
        let template = fs::read_to_string(&template_path).map_err(|error| {
            DeployError::io(
                format!("failed to read {}", template_path.display()),
                error,
            )
        })?;
        let rewritten = apply_find_replace(&template, &config.find_replace);
        fs::write(&template_path, rewritten).map_err(|error| {
            DeployError::io(
                format!("failed to write {}", template_path.display()),
                error,
            )
        })
    }

    fn publish(&self, config: &DeployConfig) -> Result<Vec<String>, DeployError> {
        if config.public_read {
            // Objects keep bucket-owner-full-control; public access is governed
            // by the destination bucket policy.
            self.logger.warning(
                "public_read_not_applied",
                json!({ "bucket": config.destination_bucket.clone() }),
            );
        }

        let mut files = Vec::new();
        collect_files(&self.scratch_dir, &mut files)?;
        files.sort();

        let mut published = Vec::with_capacity(files.len());
        for local_path in files {
            let relative_path = relative_key_path(&self.scratch_dir, &local_path)?;
            let key = destination_key(&config.destination_prefix, &relative_path);
            let options = PutObjectOptions {
                content_type: content_type_for(&relative_path).map(str::to_string),
                acl: Some(BUCKET_OWNER_FULL_CONTROL.to_string()),
            };
            self.logger.info(
                "uploading_asset",
                json!({
                    "bucket": config.destination_bucket.clone(),
                    "key": key.clone(),
                    "content_type": options.content_type.clone(),
                }),
            );

            let body = fs::read(&local_path).map_err(|error| {
                DeployError::io(format!("failed to read {}", local_path.display()), error)
            })?;
            self.store
                .put_object(&config.destination_bucket, &key, body, &options)
                .map_err(DeployError::Publish)?;
            published.push(key);
        }
        Ok(published)
    }
}

fn collect_files(dir: &Path, files: &mut Vec<PathBuf>) -> Result<(), DeployError> {
    let entries = fs::read_dir(dir)
        .map_err(|error| DeployError::io(format!("failed to list {}", dir.display()), error))?;
    for entry in entries {
        let path = entry
            .map_err(|error| DeployError::io(format!("failed to list {}", dir.display()), error))?
            .path();
        if path.is_dir() {
            collect_files(&path, files)?;
        } else {
            files.push(path);
        }
    }
    Ok(())
}

fn relative_key_path(root: &Path, path: &Path) -> Result<String, DeployError> {
    let relative = path.strip_prefix(root).map_err(|_| {
        DeployError::Publish(format!(
            "{} is outside {}",
            path.display(),
            root.display()
        ))
    })?;
    Ok(relative
        .components()
        .map(|component| component.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/"))
}

/// `DeployUI` custom resource: physical id `<UIBucket>/<UIPrefix>`.
///
/// Update removes the current prefix and redeploys. Both steps always run;
/// either failing makes the whole update fail.
pub struct DeployUiProvisioner<'a> {
    deployer: AssetDeployer<'a>,
    logger: Logger,
}

impl<'a> DeployUiProvisioner<'a> {
    pub fn new(deployer: AssetDeployer<'a>, logger: Logger) -> Self {
        Self { deployer, logger }
    }

    fn config_for(
        &self,
        event: &LifecycleEvent,
        physical_resource_id: &str,
    ) -> Result<DeployConfig, ProvisionError> {
        parse_deploy_config(&event.resource_properties)
            .map_err(|error| ProvisionError::new(physical_resource_id, error.to_string()))
    }

    fn log_failure(&self, step: &str, error: &DeployError) {
        self.logger
            .error("ui_step_failed", json!({ "step": step, "error": error.to_string() }));
    }
}

impl ResourceProvisioner for DeployUiProvisioner<'_> {
    fn create_failure_reason(&self) -> &'static str {
        DEPLOY_UI_FAILURE_REASON
    }

    fn create(&self, event: &LifecycleEvent) -> Result<ProvisionOutcome, ProvisionError> {
        let config = self.config_for(event, "")?;
        let resource_id = config.resource_id();
        let published = self.deployer.deploy(&config).map_err(|error| {
            self.log_failure("deploy", &error);
            ProvisionError::new(resource_id.clone(), error.to_string())
        })?;
        self.logger.info(
            "ui_deployed",
            json!({ "resource_id": resource_id.clone(), "objects": published.len() }),
        );
        Ok(ProvisionOutcome::new(resource_id))
    }

    fn update(&self, event: &LifecycleEvent) -> Result<ProvisionOutcome, ProvisionError> {
        let resource_id = event.physical_id_or_empty().to_string();
        let config = self.config_for(event, &resource_id)?;

        let teardown = self.deployer.teardown(&config);
        if let Err(error) = &teardown {
            self.log_failure("teardown", error);
        }
        let deploy = self.deployer.deploy(&config);
        if let Err(error) = &deploy {
            self.log_failure("deploy", error);
        }

        match (teardown, deploy) {
            (Ok(_), Ok(_)) => Ok(ProvisionOutcome::new(resource_id)),
            (Err(error), Ok(_)) | (Ok(_), Err(error)) => {
                Err(ProvisionError::new(resource_id, error.to_string()))
            }
            (Err(teardown_error), Err(deploy_error)) => Err(ProvisionError::new(
                resource_id,
                format!("{teardown_error}; {deploy_error}"),
            )),
        }
    }

    fn delete(&self, event: &LifecycleEvent) -> Result<ProvisionOutcome, ProvisionError> {
        let resource_id = event.physical_id_or_empty().to_string();
        let config = self.config_for(event, &resource_id)?;
        self.deployer.teardown(&config).map_err(|error| {
            self.log_failure("teardown", &error);
            ProvisionError::new(resource_id.clone(), error.to_string())
        })?;
        Ok(ProvisionOutcome::new(resource_id))
    }
}
