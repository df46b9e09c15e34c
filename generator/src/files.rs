//! Fixed-schema input files for the analysis executable

use crate::{
    config::{PriorConfig, SourceConfig},
    format::{exponential, fixed},
    storage::{Storage, StorageError},
};
use std::path::Path;
use tracing::info;

/// uniform priors on the four signal parameters
pub fn prior_text(prior: &PriorConfig) -> String {
    format!(
        "\nH0 uniform 0 {}\nCOSIOTA uniform -1 1\nPHI0 uniform 0 {}\nPSI uniform 0 {}\n",
        exponential(prior.h0max, 2),
        fixed(prior.phi0max, 8),
        fixed(prior.psimax, 8),
    )
}

/// source identification, one `NAME value` pair per line
pub fn par_text(source: &SourceConfig) -> String {
    format!(
        "\nPSRJ {}\nRAJ {}\nDECJ {}\nPEPOCH {}\nF0 {}\n",
        source.psrj,
        source.raj,
        source.decj,
        fixed(source.pepoch, 1),
        fixed(source.f0, 1),
    )
}

pub fn write_prior(
    storage: &mut Storage,
    path: &Path,
    prior: &PriorConfig,
) -> Result<(), StorageError> {
    storage.write(path, prior_text(prior).as_bytes())?;
    info!("Wrote prior file {}", path.display());

    Ok(())
}

pub fn write_par(
    storage: &mut Storage,
    path: &Path,
    source: &SourceConfig,
) -> Result<(), StorageError> {
    storage.write(path, par_text(source).as_bytes())?;
    info!("Wrote source parameter file {}", path.display());

    Ok(())
}
