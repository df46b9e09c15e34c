use serde::{Deserialize, Serialize};
use std::{f64::consts::PI, fs, io::Error, path::Path, path::PathBuf};
use thiserror::Error;
use tracing::{error, warn};

/// environment variable pointing at the analysis toolkit installation
pub const TOOLKIT_ENV: &str = "LSCSOFT_LOCATION";

#[derive(Error, Debug)]
pub enum ConfigErrors {
    #[error("Failed to read config file: {0}")]
    ReadFailed(#[from] Error),
    #[error("Config file is not valid YAML: {0}")]
    InvalidYaml(#[from] serde_yaml::Error),
    #[error("Toolkit root is not configured, set --toolkit or {TOOLKIT_ENV}")]
    MissingToolkit,
    #[error("Failed to make {} absolute: {source}", path.display())]
    UnresolvablePath { path: PathBuf, source: Error },
}

/// upper bound on the number of jobs a single dag may hold
pub const MAX_JOBS: usize = 1 << 24;

#[derive(Debug, Clone, Default)]
/// values given on the command line, each one replaces its config counterpart
pub struct Overrides {
    pub base: Option<PathBuf>,
    pub toolkit: Option<PathBuf>,
    pub seed: Option<u64>,
    pub live: Option<Vec<usize>>,
}

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(deny_unknown_fields)]
pub struct SweepConfig {
    // base directory all generated artifacts are placed in
    #[serde(default = "default_base")]
    pub base: PathBuf,
    // root of the analysis toolkit, the executable is resolved relative to it
    #[serde(default)]
    pub toolkit: Option<PathBuf>,
    #[serde(default)]
    pub noise: NoiseConfig,
    #[serde(default)]
    pub prior: PriorConfig,
    #[serde(default, alias = "pulsar")]
    pub source: SourceConfig,
    #[serde(default)]
    pub job: JobConfig,
    #[serde(default)]
    pub sweep: SweepAxisConfig,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct NoiseConfig {
    #[serde(default = "default_samples")]
    pub samples: usize,
    #[serde(default = "default_start")]
    pub start: f64,
    #[serde(default = "default_step")]
    pub step: f64,
    #[serde(default)]
    pub mean: f64,
    #[serde(default = "default_sigma")]
    pub sigma: f64,
    // without a seed every run draws fresh noise
    #[serde(default)]
    pub seed: Option<u64>,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PriorConfig {
    #[serde(default = "default_h0max")]
    pub h0max: f64,
    #[serde(default = "default_phi0max")]
    pub phi0max: f64,
    #[serde(default = "default_psimax")]
    pub psimax: f64,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SourceConfig {
    #[serde(default = "default_psrj")]
    pub psrj: String,
    #[serde(default = "default_coordinate")]
    pub raj: String,
    #[serde(default = "default_coordinate")]
    pub decj: String,
    #[serde(default = "default_pepoch")]
    pub pepoch: f64,
    #[serde(default = "default_f0")]
    pub f0: f64,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct JobConfig {
    // executable path relative to the toolkit root
    #[serde(default = "default_executable")]
    pub executable: PathBuf,
    #[serde(default = "default_detector")]
    pub detector: String,
    #[serde(default = "default_mcmc_initial")]
    pub mcmc_initial: u32,
    #[serde(default = "default_accounting_group")]
    pub accounting_group: String,
    // written verbatim into every RETRY line of the dag
    #[serde(default)]
    pub retries: u32,
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SweepAxisConfig {
    #[serde(default = "default_live")]
    pub live: Vec<usize>,
    // when unset every live point value n gets n jobs
    #[serde(default)]
    pub runs: Option<usize>,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            base: default_base(),
            toolkit: None,
            noise: NoiseConfig::default(),
            prior: PriorConfig::default(),
            source: SourceConfig::default(),
            job: JobConfig::default(),
            sweep: SweepAxisConfig::default(),
        }
    }
}

impl Default for NoiseConfig {
    fn default() -> Self {
        Self {
            samples: default_samples(),
            start: default_start(),
            step: default_step(),
            mean: 0.0,
            sigma: default_sigma(),
            seed: None,
        }
    }
}

impl Default for PriorConfig {
    fn default() -> Self {
        Self {
            h0max: default_h0max(),
            phi0max: default_phi0max(),
            psimax: default_psimax(),
        }
    }
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            psrj: default_psrj(),
            raj: default_coordinate(),
            decj: default_coordinate(),
            pepoch: default_pepoch(),
            f0: default_f0(),
        }
    }
}

impl Default for JobConfig {
    fn default() -> Self {
        Self {
            executable: default_executable(),
            detector: default_detector(),
            mcmc_initial: default_mcmc_initial(),
            accounting_group: default_accounting_group(),
            retries: 0,
        }
    }
}

impl Default for SweepAxisConfig {
    fn default() -> Self {
        Self {
            live: default_live(),
            runs: None,
        }
    }
}

impl SweepConfig {
    /// load a config from a YAML file, missing sections fall back to their defaults
    pub fn load(path: &Path) -> Result<Self, ConfigErrors> {
        let content = fs::read_to_string(path)?;

        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self, ConfigErrors> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn to_yaml(&self) -> Result<String, ConfigErrors> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(base) = overrides.base {
            self.base = base;
        }
        if let Some(toolkit) = overrides.toolkit {
            self.toolkit = Some(toolkit);
        }
        if let Some(seed) = overrides.seed {
            self.noise.seed = Some(seed);
        }
        if let Some(live) = overrides.live {
            self.sweep.live = live;
        }
    }

    /// total number of jobs the sweep expands to, `None` on overflow
    pub fn job_count(&self) -> Option<usize> {
        self.sweep.live.iter().try_fold(0usize, |total, &live| {
            total.checked_add(self.sweep.runs.unwrap_or(live))
        })
    }

    /// pick the toolkit root, an explicit override wins over the config file
    pub fn resolve_toolkit(&self, cli: Option<PathBuf>) -> Result<PathBuf, ConfigErrors> {
        cli.or_else(|| self.toolkit.clone())
            .ok_or(ConfigErrors::MissingToolkit)
    }

    pub fn preflight_checks(&self) -> bool {
        // attempt to catch all errors instead of piece-by-piece to make debugging easier for users
        let mut contains_error = false;

        if self.sweep.live.is_empty() {
            error!("sweep.live is empty, unable to build a job matrix");
            contains_error = true;
        }

        if self.sweep.live.contains(&0) {
            error!("sweep.live contains 0, every live point value must be positive");
            contains_error = true;
        }

        if !self.sweep.live.windows(2).all(|pair| pair[0] < pair[1]) {
            warn!(
                "sweep.live {:?} is not strictly increasing, jobs are generated in the given order",
                self.sweep.live
            );
        }

        match self.sweep.runs {
            Some(0) => {
                error!("sweep.runs cannot be 0, leave it unset to run n jobs per live point value");
                contains_error = true;
            }
            Some(runs) => {
                warn!("sweep.runs is set, generating {runs} jobs per live point value instead of one per live point");
            }
            None => {}
        }

        match self.job_count() {
            Some(total) if total > MAX_JOBS => {
                error!("The sweep expands to {total} jobs, at most {MAX_JOBS} fit into one dag");
                contains_error = true;
            }
            Some(_) => {}
            None => {
                error!("The sweep expands to more jobs than can be counted, at most {MAX_JOBS} fit into one dag");
                contains_error = true;
            }
        }

        if self.noise.samples == 0 {
            error!("noise.samples cannot be 0");
            contains_error = true;
        }

        if !(self.noise.sigma.is_finite() && self.noise.sigma >= 0.0) {
            error!(
                "noise.sigma ({}) must be a finite, non-negative number",
                self.noise.sigma
            );
            contains_error = true;
        }

        if self.job.executable.is_absolute() {
            warn!(
                "job.executable {} is absolute, the toolkit root will be ignored",
                self.job.executable.to_string_lossy()
            );
        }

        contains_error
    }
}

fn default_base() -> PathBuf {
    PathBuf::from("evidence_ul_distribution")
}

fn default_samples() -> usize {
    1440
}

fn default_start() -> f64 {
    900000000.0
}

fn default_step() -> f64 {
    60.0
}

fn default_sigma() -> f64 {
    1e-23
}

fn default_h0max() -> f64 {
    1e-21
}

fn default_phi0max() -> f64 {
    PI
}

fn default_psimax() -> f64 {
    PI / 2.0
}

fn default_psrj() -> String {
    "J0000-0000".to_string()
}

fn default_coordinate() -> String {
    "00:00:00.0".to_string()
}

fn default_pepoch() -> f64 {
    55000.0
}

fn default_f0() -> f64 {
    100.0
}

fn default_executable() -> PathBuf {
    PathBuf::from("bin/lalapps_pulsar_parameter_estimation_nested")
}

fn default_detector() -> String {
    "H1".to_string()
}

fn default_mcmc_initial() -> u32 {
    200
}

fn default_accounting_group() -> String {
    "ligo.dev.s6.cw.targeted.bayesian".to_string()
}

fn default_live() -> Vec<usize> {
    vec![128, 256, 512, 1024, 2048, 4096]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_is_the_canonical_run() {
        let config = SweepConfig::from_yaml("{}").unwrap();

        assert_eq!(config.sweep.live, vec![128, 256, 512, 1024, 2048, 4096]);
        assert_eq!(config.sweep.runs, None);
        assert_eq!(config.noise.samples, 1440);
        assert_eq!(config.noise.sigma, 1e-23);
        assert_eq!(config.prior.h0max, 1e-21);
        assert_eq!(config.job.retries, 0);
        assert_eq!(config.job.detector, "H1");
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let config = SweepConfig::from_yaml(
            "base: /data/sweep\nsweep:\n  live: [2, 3]\nnoise:\n  seed: 7\n",
        )
        .unwrap();

        assert_eq!(config.base, PathBuf::from("/data/sweep"));
        assert_eq!(config.sweep.live, vec![2, 3]);
        assert_eq!(config.noise.seed, Some(7));
        assert_eq!(config.noise.step, 60.0);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        assert!(matches!(
            SweepConfig::from_yaml("sweep:\n  nlive: [1]\n"),
            Err(ConfigErrors::InvalidYaml(_))
        ));
    }

    #[test]
    fn toolkit_override_wins() {
        let mut config = SweepConfig::default();

        assert!(matches!(
            config.resolve_toolkit(None),
            Err(ConfigErrors::MissingToolkit)
        ));

        config.toolkit = Some(PathBuf::from("/opt/config"));
        assert_eq!(
            config.resolve_toolkit(None).unwrap(),
            PathBuf::from("/opt/config")
        );
        assert_eq!(
            config
                .resolve_toolkit(Some(PathBuf::from("/opt/cli")))
                .unwrap(),
            PathBuf::from("/opt/cli")
        );
    }

    #[test]
    fn preflight_rejects_oversized_sweeps() {
        let mut config = SweepConfig::default();
        assert_eq!(config.job_count(), Some(8064));

        config.sweep.live = vec![usize::MAX];
        assert!(config.preflight_checks());

        config.sweep.live = vec![usize::MAX / 2 + 1, usize::MAX / 2 + 1];
        assert_eq!(config.job_count(), None);
        assert!(config.preflight_checks());

        config.sweep.live = vec![MAX_JOBS + 1];
        assert!(config.preflight_checks());

        config.sweep.live = vec![usize::MAX];
        config.sweep.runs = Some(2);
        assert_eq!(config.job_count(), Some(2));
        assert!(!config.preflight_checks());
    }

    #[test]
    fn overrides_replace_config_values() {
        let mut config = SweepConfig::from_yaml("toolkit: /opt/config\nsweep:\n  live: [4]\n").unwrap();

        config.apply(Overrides {
            toolkit: Some(PathBuf::from("/opt/cli")),
            seed: Some(3),
            ..Overrides::default()
        });

        assert_eq!(config.toolkit, Some(PathBuf::from("/opt/cli")));
        assert_eq!(config.noise.seed, Some(3));
        assert_eq!(config.sweep.live, vec![4]);
        assert!(config.to_yaml().unwrap().contains("toolkit: /opt/cli"));
    }

    #[test]
    fn preflight_rejects_malformed_axis() {
        let mut config = SweepConfig::default();
        assert!(!config.preflight_checks());

        config.sweep.live = Vec::new();
        assert!(config.preflight_checks());

        config.sweep.live = vec![16, 0];
        assert!(config.preflight_checks());

        config.sweep.live = vec![32, 16];
        assert!(!config.preflight_checks());

        config.sweep.runs = Some(0);
        assert!(config.preflight_checks());
    }

    #[test]
    fn yaml_round_trip_keeps_values() {
        let mut config = SweepConfig::default();
        config.sweep.runs = Some(250);
        config.toolkit = Some(PathBuf::from("/opt/lscsoft"));

        let parsed = SweepConfig::from_yaml(&config.to_yaml().unwrap()).unwrap();

        assert_eq!(parsed.sweep, config.sweep);
        assert_eq!(parsed.toolkit, config.toolkit);
        assert_eq!(parsed.prior, config.prior);
    }
}
