
use crate::{
    storage::{Storage, StorageError},
    submit::{NLIVE_MACRO, OUTFILE_MACRO},
    workspace::Workspace,
};
use itertools::Itertools;
use std::{
    collections::BTreeMap,
    fmt::{self, Display},
    path::{Path, PathBuf},
};
use tracing::{debug, info, instrument};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
/// Random 128 bit job name, unique across separate generator runs
pub struct JobId(Uuid);

impl JobId {
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Display for JobId {
    /// 32 lowercase hex digits without dashes
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.simple())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobEntry {
    pub id: JobId,
    pub output: PathBuf,
    pub live: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
/// How many jobs are generated for a single live point value
pub enum RepetitionRule {
    /// `n` jobs for `n` live points
    LiveCount,
    /// the same number of jobs for every live point value
    Fixed(usize),
}

impl RepetitionRule {
    pub fn from_runs(runs: Option<usize>) -> Self {
        runs.map_or(Self::LiveCount, Self::Fixed)
    }

    pub fn repetitions(&self, live: usize) -> usize {
        match self {
            Self::LiveCount => live,
            Self::Fixed(runs) => *runs,
        }
    }
}

#[derive(Debug, Clone, Default)]
/// All jobs of one sweep in submission order
pub struct JobMatrix {
    pub entries: Vec<JobEntry>,
}

impl JobMatrix {
    /// Expand the sweep axis into jobs, creating each output directory on the way
    ///
    /// Existing output directories are kept as they are. Any directory that
    /// can't be created aborts the whole expansion.
    #[instrument(skip(workspace, storage), level = "debug")]
    pub fn generate(
        workspace: &Workspace,
        storage: &mut Storage,
        axis: &[usize],
        rule: RepetitionRule,
    ) -> Result<Self, StorageError> {
        let mut entries = Vec::new();

        for &live in axis {
            let directory = workspace.live_dir(live);

            if storage.create_dir_if_missing(&directory)? {
                debug!(path = ?directory, "Created output directory for {live} live points");
            } else {
                debug!(path = ?directory, "Reusing output directory for {live} live points");
            }

            entries.extend((0..rule.repetitions(live)).map(|index| JobEntry {
                id: JobId::random(),
                output: workspace.output(live, index),
                live,
            }));
        }

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// number of jobs per live point value
    pub fn counts(&self) -> BTreeMap<usize, usize> {
        self.entries.iter().map(|entry| entry.live).counts().into_iter().collect()
    }

    /// dag text, one JOB/RETRY/VARS block per entry
    pub fn render(&self, submit: &Path, retries: u32) -> String {
        self.entries
            .iter()
            .map(|entry| {
                format!(
                    "JOB {id} {submit}\nRETRY {id} {retries}\nVARS {id} {OUTFILE_MACRO}=\"{output}\" {NLIVE_MACRO}=\"{live}\"\n",
                    id = entry.id,
                    submit = submit.display(),
                    output = entry.output.display(),
                    live = entry.live,
                )
            })
            .collect()
    }

    pub fn write(
        &self,
        storage: &mut Storage,
        path: &Path,
        submit: &Path,
        retries: u32,
    ) -> Result<(), StorageError> {
        storage.write(path, self.render(submit, retries).as_bytes())?;
        info!("Wrote {} jobs to {}", self.len(), path.display());

        Ok(())
    }
}
