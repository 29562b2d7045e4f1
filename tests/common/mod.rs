// ABOUTME: Common utilities and helpers for integration tests
// ABOUTME: Builds release archive fixtures and provides a recording process runner

#![allow(dead_code)]

use async_trait::async_trait;
use flate2::write::GzEncoder;
use flate2::Compression;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

use warden_cpi_install::installer::{
    InstallLayout, InstallOptions, Installer, Invocation, ProcessOutput, ProcessRunner,
    RunnerError,
};

pub const WARDEN_CPI_JOB_MF: &str = r#"---
name: warden_cpi
templates:
  cpi.erb: bin/cpi
  cpi.json.erb: config/cpi.json
packages:
  - warden_cpi
properties:
  cpi.warden.connect_network:
    default: tcp
  cpi.warden.connect_address:
    default: 127.0.0.1:7777
  cpi.agent.mbus:
    description: Mbus URL used by deployed agents
"#;

pub const CPI_TEMPLATE: &str = r#"#!/bin/bash
exec /var/vcap/packages/warden_cpi/bin/cpi -configPath /var/vcap/jobs/warden_cpi/config/cpi.json
"#;

pub const CPI_JSON_TEMPLATE: &str = r#"{
  "Warden": {
    "ConnectNetwork": "{{p "cpi.warden.connect_network"}}",
    "ConnectAddress": "{{p "cpi.warden.connect_address"}}"
  },
  "Agent": {
    "Mbus": "{{p "cpi.agent.mbus"}}"
  }
}
"#;

pub struct FileEntry {
    pub path: String,
    pub content: Vec<u8>,
    pub mode: u32,
}

impl FileEntry {
    pub fn new(path: &str, content: &str) -> Self {
        Self {
            path: path.to_string(),
            content: content.as_bytes().to_vec(),
            mode: 0o644,
        }
    }

    pub fn executable(path: &str, content: &str) -> Self {
        Self {
            mode: 0o755,
            ..Self::new(path, content)
        }
    }
}

struct TestPackage {
    name: String,
    dependencies: Vec<String>,
    files: Vec<FileEntry>,
}

/// Builds a gzip tar release archive in the BOSH release layout
pub struct TestReleaseBuilder {
    job_name: String,
    job_manifest: String,
    templates: Vec<FileEntry>,
    packages: Vec<TestPackage>,
    compiled: bool,
}

impl TestReleaseBuilder {
    pub fn new(job_name: &str) -> Self {
        Self {
            job_name: job_name.to_string(),
            job_manifest: format!("name: {}\n", job_name),
            templates: Vec::new(),
            packages: Vec::new(),
            compiled: false,
        }
    }

    /// The warden_cpi job with its cpi and cpi.json templates
    pub fn warden_cpi() -> Self {
        Self::new("warden_cpi")
            .with_job_manifest(WARDEN_CPI_JOB_MF)
            .with_template("cpi.erb", CPI_TEMPLATE)
            .with_template("cpi.json.erb", CPI_JSON_TEMPLATE)
    }

    pub fn with_job_manifest(mut self, manifest: &str) -> Self {
        self.job_manifest = manifest.to_string();
        self
    }

    pub fn with_template(mut self, source: &str, content: &str) -> Self {
        self.templates
            .push(FileEntry::new(&format!("templates/{}", source), content));
        self
    }

    /// Package with a `packaging` script that runs under the real shell
    pub fn with_source_package(self, name: &str, packaging: &str) -> Self {
        self.with_package(name, &[], vec![FileEntry::new("packaging", packaging)])
    }

    /// Package shipped without a packaging script
    pub fn with_precompiled_package(self, name: &str) -> Self {
        self.with_package(
            name,
            &[],
            vec![FileEntry::new("README", "already built\n")],
        )
    }

    pub fn with_package(mut self, name: &str, dependencies: &[&str], files: Vec<FileEntry>) -> Self {
        self.packages.push(TestPackage {
            name: name.to_string(),
            dependencies: dependencies.iter().map(|d| d.to_string()).collect(),
            files,
        });
        self
    }

    /// Ship packages under `compiled_packages/` and list them as compiled
    pub fn compiled(mut self) -> Self {
        self.compiled = true;
        self
    }

    pub fn release_manifest(&self) -> String {
        let key = if self.compiled {
            "compiled_packages"
        } else {
            "packages"
        };

        let mut manifest = format!("name: test-release\nversion: 1\n{}:\n", key);
        for package in &self.packages {
            manifest.push_str(&format!(
                "  - name: {}\n    version: \"1\"\n    dependencies: [{}]\n",
                package.name,
                package.dependencies.join(", ")
            ));
        }
        manifest.push_str(&format!(
            "jobs:\n  - name: {}\n    version: \"1\"\n",
            self.job_name
        ));
        manifest
    }

    /// Write the release archive into `dir`, returning its path
    pub fn build(&self, dir: &Path) -> PathBuf {
        let mut job_files = vec![FileEntry::new("job.MF", &self.job_manifest)];
        job_files.extend(self.templates.iter().map(|t| FileEntry {
            path: t.path.clone(),
            content: t.content.clone(),
            mode: t.mode,
        }));

        let mut release_files = vec![
            FileEntry::new("release.MF", &self.release_manifest()),
            FileEntry {
                path: format!("jobs/{}.tgz", self.job_name),
                content: tgz_bytes(&job_files),
                mode: 0o644,
            },
        ];

        let package_dir = if self.compiled {
            "compiled_packages"
        } else {
            "packages"
        };
        for package in &self.packages {
            release_files.push(FileEntry {
                path: format!("{}/{}.tgz", package_dir, package.name),
                content: tgz_bytes(&package.files),
                mode: 0o644,
            });
        }

        let archive = dir.join("release.tgz");
        std::fs::write(&archive, tgz_bytes(&release_files)).unwrap();
        archive
    }
}

pub fn tgz_bytes(files: &[FileEntry]) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    for file in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(file.content.len() as u64);
        header.set_mode(file.mode);
        header.set_cksum();
        builder
            .append_data(&mut header, &file.path, file.content.as_slice())
            .unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

/// Process runner that records every invocation instead of spawning it.
/// The package named in `failing` exits non-zero with `stderr`.
#[derive(Default)]
pub struct RecordingRunner {
    invocations: Mutex<Vec<Invocation>>,
    failing: Option<(String, i32, String)>,
}

impl RecordingRunner {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn failing_on(package: &str, exit_code: i32, stderr: &str) -> Arc<Self> {
        Arc::new(Self {
            invocations: Mutex::new(Vec::new()),
            failing: Some((package.to_string(), exit_code, stderr.to_string())),
        })
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().unwrap().clone()
    }

    /// Packages compiled so far, in invocation order
    pub fn compiled_packages(&self) -> Vec<String> {
        self.invocations()
            .iter()
            .filter_map(|i| i.working_dir.as_ref())
            .filter_map(|dir| dir.file_name())
            .filter_map(|name| name.to_str())
            .filter_map(|name| name.strip_prefix("compile_"))
            .map(str::to_string)
            .collect()
    }
}

#[async_trait]
impl ProcessRunner for RecordingRunner {
    async fn run(&self, invocation: &Invocation) -> Result<ProcessOutput, RunnerError> {
        self.invocations.lock().unwrap().push(invocation.clone());

        let compiling = invocation
            .working_dir
            .as_ref()
            .and_then(|dir| dir.file_name())
            .and_then(|name| name.to_str())
            .and_then(|name| name.strip_prefix("compile_"))
            .map(str::to_string);

        match (&self.failing, compiling) {
            (Some((package, exit_code, stderr)), Some(current)) if *package == current => {
                Ok(ProcessOutput {
                    exit_code: *exit_code,
                    stdout: String::new(),
                    stderr: stderr.clone(),
                })
            }
            _ => Ok(ProcessOutput {
                exit_code: 0,
                stdout: String::new(),
                stderr: String::new(),
            }),
        }
    }
}

/// Isolated install root with its own /var/vcap tree
pub struct TestEnvironment {
    pub root: TempDir,
    pub fixtures: TempDir,
}

impl TestEnvironment {
    pub fn new() -> Self {
        Self {
            root: TempDir::new().unwrap(),
            fixtures: TempDir::new().unwrap(),
        }
    }

    pub fn layout(&self) -> InstallLayout {
        InstallLayout::new(self.root.path(), "warden_cpi")
    }

    pub fn installer(&self, options: InstallOptions, runner: Arc<dyn ProcessRunner>) -> Installer {
        Installer::with_runner(self.layout(), options, runner)
    }

    pub fn vcap(&self, relative: &str) -> PathBuf {
        self.root.path().join("var/vcap").join(relative)
    }

    pub fn read(&self, relative: &str) -> String {
        std::fs::read_to_string(self.vcap(relative)).unwrap()
    }
}
