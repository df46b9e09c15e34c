use crate::{
    config::NoiseConfig,
    format::{exponential, fixed},
    storage::{Storage, StorageError},
};
use flate2::{write::GzEncoder, Compression};
use rand::{rngs::StdRng, Rng, SeedableRng};
use rand_distr::{Normal, NormalError};
use std::{io::Write, path::Path};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Error, Debug)]
pub enum NoiseError {
    #[error("Invalid noise distribution: {0}")]
    Distribution(#[from] NormalError),
    #[error("Failed to compress noise data: {0}")]
    Compress(#[from] std::io::Error),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub time: f64,
    pub real: f64,
    pub imaginary: f64,
}

#[derive(Debug, Clone, PartialEq)]
/// Uniformly sampled complex white noise
pub struct NoiseSeries {
    pub samples: Vec<Sample>,
}

impl NoiseSeries {
    /// draw a series, deterministic only if `config.seed` is set
    pub fn synthesize(config: &NoiseConfig) -> Result<Self, NoiseError> {
        match config.seed {
            Some(seed) => Self::synthesize_with(config, &mut StdRng::seed_from_u64(seed)),
            None => Self::synthesize_with(config, &mut StdRng::from_entropy()),
        }
    }

    pub fn synthesize_with<R: Rng>(config: &NoiseConfig, rng: &mut R) -> Result<Self, NoiseError> {
        let normal = Normal::new(config.mean, config.sigma)?;

        let samples = (0..config.samples)
            .map(|index| Sample {
                time: config.start + index as f64 * config.step,
                real: rng.sample(normal),
                imaginary: rng.sample(normal),
            })
            .collect();

        Ok(Self { samples })
    }

    /// one tab separated row per sample: `%.1f\t%.7e\t%.7e`
    pub fn to_text(&self) -> String {
        self.samples
            .iter()
            .map(|sample| {
                format!(
                    "{}\t{}\t{}\n",
                    fixed(sample.time, 1),
                    exponential(sample.real, 7),
                    exponential(sample.imaginary, 7)
                )
            })
            .collect()
    }

    /// write the series to `path`, gzip compressed if it ends in `.gz`
    pub fn write(&self, storage: &mut Storage, path: &Path) -> Result<(), NoiseError> {
        let text = self.to_text();
        let compress = path.extension().map_or(false, |extension| extension == "gz");

        let content = if compress {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(text.as_bytes())?;
            encoder.finish()?
        } else {
            text.into_bytes()
        };

        debug!(
            path = ?path,
            compressed = compress,
            bytes = content.len(),
            "Writing noise data"
        );
        storage.write(path, &content)?;
        info!(
            "Wrote {} noise samples to {}",
            self.samples.len(),
            path.display()
        );

        Ok(())
    }
}
