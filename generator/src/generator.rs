use crate::{
    config::{ConfigErrors, SweepConfig},
    dag::{JobMatrix, RepetitionRule},
    files,
    noise::{NoiseError, NoiseSeries},
    storage::{Storage, StorageError},
    submit::SubmissionTemplate,
    workspace::Workspace,
};
use std::{
    collections::BTreeMap,
    path::{self, Path, PathBuf},
};
use thiserror::Error;
use tracing::{debug, info, instrument};

#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("Failed to write noise data: {0}")]
    Noise(#[from] NoiseError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone)]
/// What a single generation pass produced
pub struct Summary {
    pub jobs: BTreeMap<usize, usize>,
    pub submit: PathBuf,
    pub dag: PathBuf,
}

impl Summary {
    pub fn total(&self) -> usize {
        self.jobs.values().sum()
    }
}

#[derive(Debug)]
/// A fully configured generation pass
///
/// The toolkit root is required up front, so a missing installation is
/// reported before anything is written.
pub struct Generator {
    config: SweepConfig,
    toolkit: PathBuf,
    workspace: Workspace,
}

impl Generator {
    /// base and toolkit are made absolute against the current directory,
    /// the queue engine may run the jobs from anywhere
    pub fn new(config: SweepConfig, toolkit: PathBuf) -> Result<Self, ConfigErrors> {
        let workspace = Workspace::new(absolute(&config.base)?);
        let toolkit = absolute(&toolkit)?;

        Ok(Self {
            config,
            toolkit,
            workspace,
        })
    }

    /// resolve the toolkit root, failing before any file is touched if it is missing
    pub fn from_config(config: SweepConfig, toolkit: Option<PathBuf>) -> Result<Self, ConfigErrors> {
        let toolkit = config.resolve_toolkit(toolkit)?;

        Self::new(config, toolkit)
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    /// write every artifact, the first failure aborts the pass
    #[instrument(skip_all, level = "info", fields(base = %self.workspace.base().display()))]
    pub fn run(&self, storage: &mut Storage) -> Result<Summary, GeneratorError> {
        let workspace = &self.workspace;

        storage.create_dir_all(workspace.base())?;

        NoiseSeries::synthesize(&self.config.noise)?.write(storage, &workspace.data())?;
        files::write_prior(storage, &workspace.prior(), &self.config.prior)?;
        files::write_par(storage, &workspace.par(), &self.config.source)?;

        if storage.create_dir_if_missing(&workspace.log_dir())? {
            debug!(path = ?workspace.log_dir(), "Created log directory");
        }

        SubmissionTemplate::new(&self.toolkit, workspace, &self.config.job)
            .write(storage, &workspace.submit())?;

        let matrix = JobMatrix::generate(
            workspace,
            storage,
            &self.config.sweep.live,
            RepetitionRule::from_runs(self.config.sweep.runs),
        )?;
        matrix.write(
            storage,
            &workspace.dag(),
            &workspace.submit(),
            self.config.job.retries,
        )?;

        let summary = Summary {
            jobs: matrix.counts(),
            submit: workspace.submit(),
            dag: workspace.dag(),
        };

        for (live, count) in summary.jobs.iter() {
            info!("{count} jobs with {live} live points");
        }
        info!(
            "Generated {} jobs, submit with the dag at {}",
            summary.total(),
            summary.dag.display()
        );

        Ok(summary)
    }
}

fn absolute(path: &Path) -> Result<PathBuf, ConfigErrors> {
    path::absolute(path).map_err(|source| ConfigErrors::UnresolvablePath {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use tempfile::tempdir;

    fn small_config(base: &Path) -> SweepConfig {
        let mut config = SweepConfig::default();
        config.base = base.to_path_buf();
        config.noise.samples = 16;
        config.noise.seed = Some(11);
        config.sweep.live = vec![2, 3];

        config
    }

    #[test]
    fn writes_full_layout_in_memory() {
        let mut storage = Storage::memory();
        let generator =
            Generator::new(small_config(Path::new("/sweep")), "/opt/lscsoft".into()).unwrap();

        let summary = generator.run(&mut storage).unwrap();

        assert_eq!(summary.total(), 5);
        assert_eq!(
            summary.jobs.into_iter().collect::<Vec<_>>(),
            vec![(2, 2), (3, 3)]
        );

        for file in ["data.txt.gz", "prior.txt", "pulsar.par", "run.sub", "run.dag"] {
            assert!(storage.read(&Path::new("/sweep").join(file)).is_ok(), "{file}");
        }
        for dir in ["log", "2", "3"] {
            assert!(storage.is_dir(&Path::new("/sweep").join(dir)), "{dir}");
        }

        let dag = String::from_utf8(storage.read(Path::new("/sweep/run.dag")).unwrap()).unwrap();
        assert_eq!(dag.matches("JOB ").count(), 5);
        assert!(dag.contains("macrooutfile=\"/sweep/3/nest_0002.txt\" macronlive=\"3\""));
    }

    #[test]
    fn seeded_runs_write_identical_data() {
        let generator =
            Generator::new(small_config(Path::new("/sweep")), "/opt/lscsoft".into()).unwrap();
        let mut first = Storage::memory();
        let mut second = Storage::memory();

        generator.run(&mut first).unwrap();
        generator.run(&mut second).unwrap();

        let data = Path::new("/sweep/data.txt.gz");
        assert_eq!(first.read(data).unwrap(), second.read(data).unwrap());

        let dag = Path::new("/sweep/run.dag");
        assert_ne!(first.read(dag).unwrap(), second.read(dag).unwrap());
    }

    #[test]
    fn rerun_on_disk_keeps_previous_results() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("sweep");
        let generator = Generator::new(small_config(&base), "/opt/lscsoft".into()).unwrap();
        let mut storage = Storage::local();

        let first = generator.run(&mut storage).unwrap();
        let finished = generator.workspace().output(3, 1);
        std::fs::write(&finished, "previous evidence").unwrap();

        let second = generator.run(&mut storage).unwrap();

        assert_eq!(first.jobs, second.jobs);
        assert_eq!(
            std::fs::read_to_string(&finished).unwrap(),
            "previous evidence"
        );

        let submit = std::fs::read_to_string(base.join("run.sub")).unwrap();
        assert!(submit.contains(&format!(
            "--input-files {} ",
            base.join("data.txt.gz").display()
        )));
    }

    #[test]
    fn relative_base_is_written_as_absolute_paths() {
        let mut config = SweepConfig::default();
        config.noise.samples = 4;
        config.sweep.live = vec![1];

        let generator = Generator::new(config, "lscsoft".into()).unwrap();
        let base = std::env::current_dir()
            .unwrap()
            .join("evidence_ul_distribution");
        assert_eq!(generator.workspace().base(), base.as_path());

        let mut storage = Storage::memory();
        generator.run(&mut storage).unwrap();

        let dag = String::from_utf8(storage.read(&base.join("run.dag")).unwrap()).unwrap();
        let job = dag.lines().next().unwrap();
        assert!(base.is_absolute());
        assert!(job.starts_with("JOB "));
        assert!(
            job.ends_with(&format!(" {}", base.join("run.sub").display())),
            "{job}"
        );

        let vars = dag.lines().nth(2).unwrap();
        assert!(vars.contains(&format!(
            "macrooutfile=\"{}\"",
            base.join("1/nest_0000.txt").display()
        )));

        let submit = String::from_utf8(storage.read(&base.join("run.sub")).unwrap()).unwrap();
        let input = submit
            .split("--input-files ")
            .nth(1)
            .and_then(|rest| rest.split(' ').next())
            .unwrap();
        assert!(Path::new(input).is_absolute(), "{input}");
        assert!(submit.contains(&format!(
            "executable = {}",
            std::env::current_dir()
                .unwrap()
                .join("lscsoft/bin/lalapps_pulsar_parameter_estimation_nested")
                .display()
        )));
        assert!(submit.contains(&format!(
            "log = {}",
            base.join("log/$(cluster).log").display()
        )));
    }

    #[test]
    fn missing_toolkit_writes_nothing() {
        let dir = tempdir().unwrap();
        let base = dir.path().join("sweep");

        assert!(matches!(
            Generator::from_config(small_config(&base), None),
            Err(ConfigErrors::MissingToolkit)
        ));
        assert!(!base.exists());

        let generator = Generator::from_config(small_config(&base), Some("/opt".into())).unwrap();
        assert_eq!(generator.toolkit, PathBuf::from("/opt"));
    }

    #[test]
    fn blocked_output_directory_aborts() {
        let mut storage = Storage::memory();
        storage.create_dir_all(Path::new("/sweep")).unwrap();
        // a plain file where the output directory for 3 live points belongs
        storage.write(Path::new("/sweep/3"), b"").unwrap();

        let generator =
            Generator::new(small_config(Path::new("/sweep")), "/opt/lscsoft".into()).unwrap();

        assert!(matches!(
            generator.run(&mut storage),
            Err(GeneratorError::Storage(StorageError::CreateDir { .. }))
        ));
        assert!(storage.read(Path::new("/sweep/run.dag")).is_err());
    }
}
