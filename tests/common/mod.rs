//! In-memory stand-ins for object storage and external commands.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chart_release::error::{Error, ProcessFailedDetails, Result};
use chart_release::storage::ObjectStore;
use chart_release::utils::command::{ProcessOutput, ProcessRunner};

pub const CHART: &str = "tf-job-operator-chart";
pub const VALUES: &str = "# Default values for the operator.\nimage: gcr.io/tf-on-k8s-dogfood/tf_operator:latest\n# Enable RBAC\nrbac:\n  install: false\n";
pub const CHART_YAML: &str =
    "name: tf-job-operator-chart\nhome: https://github.com/tensorflow/k8s\nversion: 0.1.0\nappVersion: 0.1.0\n";

#[derive(Default)]
pub struct MemoryStore {
    pub objects: RefCell<BTreeMap<(String, String), Vec<u8>>>,
    pub uploads: RefCell<Vec<(String, String)>>,
}

impl MemoryStore {
    pub fn with_object(self, bucket: &str, key: &str, body: &str) -> Self {
        self.objects
            .borrow_mut()
            .insert((bucket.to_string(), key.to_string()), body.as_bytes().to_vec());
        self
    }

    pub fn object(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.objects
            .borrow()
            .get(&(bucket.to_string(), key.to_string()))
            .cloned()
    }
}

impl ObjectStore for MemoryStore {
    fn read(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        self.object(bucket, key)
            .ok_or_else(|| Error::storage_object_not_found(bucket, key))
    }

    fn exists(&self, bucket: &str, key: &str) -> Result<bool> {
        Ok(self.object(bucket, key).is_some())
    }

    fn upload(&self, bucket: &str, key: &str, local_path: &Path) -> Result<()> {
        let body = fs::read(local_path).map_err(|e| Error::internal_io(e.to_string(), None))?;
        self.objects
            .borrow_mut()
            .insert((bucket.to_string(), key.to_string()), body);
        self.uploads
            .borrow_mut()
            .push((bucket.to_string(), key.to_string()));
        Ok(())
    }
}

/// One recorded command invocation.
#[derive(Debug, Clone)]
pub struct Call {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

/// Emulates git, the build script and helm against the scratch directory.
pub struct FakeTools {
    pub image: String,
    pub values: String,
    pub fail_program: Option<String>,
    pub calls: RefCell<Vec<Call>>,
    /// values.yaml and Chart.yaml as helm saw them.
    pub snapshot: RefCell<Option<(String, String)>>,
}

impl FakeTools {
    pub fn new(image: &str) -> Self {
        Self {
            image: image.to_string(),
            values: VALUES.to_string(),
            fail_program: None,
            calls: RefCell::new(Vec::new()),
            snapshot: RefCell::new(None),
        }
    }

    pub fn programs(&self) -> Vec<String> {
        self.calls
            .borrow()
            .iter()
            .map(|c| {
                let first = c.args.first().cloned().unwrap_or_default();
                format!("{} {}", c.program, first)
            })
            .collect()
    }
}

impl ProcessRunner for FakeTools {
    fn run(&self, program: &str, args: &[String], cwd: &Path) -> Result<ProcessOutput> {
        self.calls.borrow_mut().push(Call {
            program: program.to_string(),
            args: args.to_vec(),
            cwd: cwd.to_path_buf(),
        });

        if self.fail_program.as_deref() == Some(program) {
            return Err(Error::process_failed(ProcessFailedDetails {
                program: program.to_string(),
                args: args.to_vec(),
                exit_code: 1,
                stdout: String::new(),
                stderr: "simulated failure".to_string(),
            }));
        }

        if program == "git" {
            return match args[0].as_str() {
                "clone" => {
                    let dest = PathBuf::from(&args[2]);
                    let chart_dir = dest.join(CHART);
                    fs::create_dir_all(&chart_dir).unwrap();
                    fs::write(chart_dir.join("values.yaml"), &self.values).unwrap();
                    fs::write(chart_dir.join("Chart.yaml"), CHART_YAML).unwrap();
                    Ok(ProcessOutput::default())
                }
                "checkout" => Ok(ProcessOutput::default()),
                "rev-parse" => Ok(ProcessOutput::new("deadbeef\n", "")),
                other => panic!("unexpected git {}", other),
            };
        }

        if program == "helm" {
            assert_eq!(args[0], "package");
            let chart_dir = cwd.join(CHART);
            let values = fs::read_to_string(chart_dir.join("values.yaml")).unwrap();
            let chart = fs::read_to_string(chart_dir.join("Chart.yaml")).unwrap();
            *self.snapshot.borrow_mut() = Some((values, chart));

            let archive = cwd.join(format!("{}-0.1.0.tgz", CHART));
            fs::write(archive, b"chart archive bytes").unwrap();
            return Ok(ProcessOutput::default());
        }

        if program.ends_with("build_and_push.py") {
            let output = args[0].strip_prefix("--output=").unwrap();
            fs::write(output, format!("image: {}\n", self.image)).unwrap();
            return Ok(ProcessOutput::default());
        }

        panic!("unexpected program {}", program);
    }
}
