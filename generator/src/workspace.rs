use std::path::{Path, PathBuf};

pub const DATA_FILE: &str = "data.txt.gz";
pub const PRIOR_FILE: &str = "prior.txt";
pub const PAR_FILE: &str = "pulsar.par";
pub const SUBMIT_FILE: &str = "run.sub";
pub const DAG_FILE: &str = "run.dag";
pub const LOG_DIR: &str = "log";

#[derive(Debug, Clone, PartialEq, Eq)]
/// Layout of a sweep below a single base directory
///
/// All paths handed to the queue engine are derived from here, nothing else
/// joins paths on its own.
pub struct Workspace {
    base: PathBuf,
}

impl Workspace {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    pub fn data(&self) -> PathBuf {
        self.base.join(DATA_FILE)
    }

    pub fn prior(&self) -> PathBuf {
        self.base.join(PRIOR_FILE)
    }

    pub fn par(&self) -> PathBuf {
        self.base.join(PAR_FILE)
    }

    pub fn submit(&self) -> PathBuf {
        self.base.join(SUBMIT_FILE)
    }

    pub fn dag(&self) -> PathBuf {
        self.base.join(DAG_FILE)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.base.join(LOG_DIR)
    }

    /// output directory shared by all jobs with `live` live points
    pub fn live_dir(&self, live: usize) -> PathBuf {
        self.base.join(live.to_string())
    }

    /// output file of the `index`-th job with `live` live points
    pub fn output(&self, live: usize, index: usize) -> PathBuf {
        self.live_dir(live).join(output_file_name(index))
    }
}

/// `nest_0042.txt`, indices past 9999 simply grow wider
pub fn output_file_name(index: usize) -> String {
    format!("nest_{index:04}.txt")
}
