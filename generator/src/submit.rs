use crate::{
    config::JobConfig,
    storage::{Storage, StorageError},
    workspace::Workspace,
};
use std::path::{Path, PathBuf};
use tracing::info;

/// submit file variable bound to the job's output file
pub const OUTFILE_MACRO: &str = "macrooutfile";
/// submit file variable bound to the job's number of live points
pub const NLIVE_MACRO: &str = "macronlive";

#[derive(Debug, Clone, PartialEq)]
/// The shared job description every dag node points at
///
/// Only `$(macrooutfile)` and `$(macronlive)` vary between jobs; everything
/// else, including the log paths keyed by `$(cluster)`, is fixed. None of the
/// referenced files are checked for existence.
pub struct SubmissionTemplate {
    pub executable: PathBuf,
    pub prior: PathBuf,
    pub par: PathBuf,
    pub data: PathBuf,
    pub log_dir: PathBuf,
    pub detector: String,
    pub mcmc_initial: u32,
    pub accounting_group: String,
}

impl SubmissionTemplate {
    pub fn new(toolkit: &Path, workspace: &Workspace, job: &JobConfig) -> Self {
        Self {
            executable: toolkit.join(&job.executable),
            prior: workspace.prior(),
            par: workspace.par(),
            data: workspace.data(),
            log_dir: workspace.log_dir(),
            detector: job.detector.clone(),
            mcmc_initial: job.mcmc_initial,
            accounting_group: job.accounting_group.clone(),
        }
    }

    pub fn arguments(&self) -> String {
        format!(
            " --prior-file {} --detectors {} --par-file {} --Nmcmcinitial {} --outfile $({OUTFILE_MACRO}) \
--Nlive $({NLIVE_MACRO}) --gzip --non-fixed-only --input-files {} ",
            self.prior.display(),
            self.detector,
            self.par.display(),
            self.mcmc_initial,
            self.data.display(),
        )
    }

    fn log_path(&self, extension: &str) -> String {
        self.log_dir
            .join(format!("$(cluster).{extension}"))
            .display()
            .to_string()
    }

    pub fn render(&self) -> String {
        format!(
            "\nuniverse = vanilla\n\
executable = {}\n\
arguments = \"{}\"\n\
getenv = True\n\
log = {}\n\
error = {}\n\
output = {}\n\
notification = never\n\
accounting_group = {}\n\
queue 1\n",
            self.executable.display(),
            self.arguments(),
            self.log_path("log"),
            self.log_path("err"),
            self.log_path("out"),
            self.accounting_group,
        )
    }

    pub fn write(&self, storage: &mut Storage, path: &Path) -> Result<(), StorageError> {
        storage.write(path, self.render().as_bytes())?;
        info!(
            "Wrote submit file {} for {}",
            path.display(),
            self.executable.display()
        );

        Ok(())
    }
}
