#![deny(missing_docs)]
#![deny(unsafe_code)]
//! Serialization and packaging of compiled workflow manifests.
//!
//! The output path's suffix selects the package format:
//!
//! - `.tar.gz` / `.tgz` — gzip-compressed tarball with the single entry
//!   `pipeline.yaml`;
//! - `.zip` — archive with the single deflated entry `pipeline.yaml`;
//! - `.yaml` / `.yml` — the raw manifest text.
//!
//! Any other suffix fails with [`PackageError::UnsupportedSuffix`].

use flate2::write::GzEncoder;
use flate2::Compression;
use hoist_types::{Pipeline, Workflow};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Name of the single manifest entry inside archive packages.
pub const MANIFEST_ENTRY: &str = "pipeline.yaml";

/// Any error raised while packaging a workflow.
#[derive(Debug, Error)]
pub enum PackageError {
    /// The output path's suffix selects no known package format.
    #[error("output path `{}` must end with one of: .tar.gz, .tgz, .zip, .yaml, .yml", .0.display())]
    UnsupportedSuffix(PathBuf),
    /// Compiling the pipeline failed.
    #[error(transparent)]
    Compile(#[from] hoist_compile::CompileError),
    /// Serializing the manifest failed.
    #[error("failed to serialize the workflow manifest: {0}")]
    Yaml(#[from] serde_yaml::Error),
    /// Writing the package failed.
    #[error("failed to write the package: {0}")]
    Io(#[from] std::io::Error),
    /// Writing the zip archive failed.
    #[error("failed to write the zip package: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// Compile a pipeline and package the resulting manifest at `path`.
pub fn compile_and_package(pipeline: &Pipeline, path: &Path) -> Result<(), PackageError> {
    let workflow = hoist_compile::compile(pipeline)?;
    package_workflow(&workflow, path)
}

/// Serialize a workflow manifest to YAML text.
pub fn workflow_yaml(workflow: &Workflow) -> Result<String, PackageError> {
    Ok(serde_yaml::to_string(workflow)?)
}

/// Serialize a workflow and write it as the package selected by `path`.
pub fn package_workflow(workflow: &Workflow, path: &Path) -> Result<(), PackageError> {
    let yaml = workflow_yaml(workflow)?;
    package_yaml(&yaml, path)
}

/// Write already-serialized manifest text as the package selected by `path`.
pub fn package_yaml(yaml: &str, path: &Path) -> Result<(), PackageError> {
    let name = path.to_string_lossy();
    if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        write_tarball(yaml, path)
    } else if name.ends_with(".zip") {
        write_zip(yaml, path)
    } else if name.ends_with(".yaml") || name.ends_with(".yml") {
        std::fs::write(path, yaml)?;
        Ok(())
    } else {
        Err(PackageError::UnsupportedSuffix(path.to_path_buf()))
    }
}

fn write_tarball(yaml: &str, path: &Path) -> Result<(), PackageError> {
    let file = File::create(path)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = tar::Builder::new(encoder);
    let mut header = tar::Header::new_gnu();
    header.set_size(yaml.len() as u64);
    header.set_mode(0o644);
    builder.append_data(&mut header, MANIFEST_ENTRY, yaml.as_bytes())?;
    builder.into_inner()?.finish()?;
    Ok(())
}

fn write_zip(yaml: &str, path: &Path) -> Result<(), PackageError> {
    let file = File::create(path)?;
    let mut writer = ZipWriter::new(file);
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
    writer.start_file(MANIFEST_ENTRY, options)?;
    writer.write_all(yaml.as_bytes())?;
    writer.finish()?;
    Ok(())
}
