//! JSON persistence for the estimated calibration matrix.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::homography::{estimate_pixel_to_robot, CalibrationError, Homography, PointCorrespondence};

#[derive(thiserror::Error, Debug)]
pub enum CalibrationIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Errors produced by the startup load-or-estimate policy.
#[derive(thiserror::Error, Debug)]
pub enum CalibrationSetupError {
    #[error(transparent)]
    Estimate(#[from] CalibrationError),
    #[error(transparent)]
    Store(#[from] CalibrationIoError),
}

/// On-disk layout of the calibration file.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CalibrationFile {
    matrix: [[f64; 3]; 3],
}

/// Loads and saves the pixel-to-robot calibration matrix at a fixed path.
///
/// The matrix is written at most once per process lifetime: `load_or_estimate`
/// reuses a previously saved matrix when one exists and otherwise computes one
/// from the seed correspondences and persists it.
#[derive(Debug, Clone)]
pub struct CalibrationStore {
    path: PathBuf,
}

impl CalibrationStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read a previously saved matrix. A missing file is not an error.
    pub fn load(&self) -> Result<Option<Homography>, CalibrationIoError> {
        if !self.path.exists() {
            return Ok(None);
        }
        let raw = fs::read_to_string(&self.path)?;
        let file: CalibrationFile = serde_json::from_str(&raw)?;
        Ok(Some(Homography::from_array(file.matrix)))
    }

    /// Persist the matrix for reuse across process runs.
    pub fn save(&self, h: &Homography) -> Result<(), CalibrationIoError> {
        let file = CalibrationFile {
            matrix: h.to_array(),
        };
        let json = serde_json::to_string_pretty(&file)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    /// Startup policy: load the saved matrix, or estimate one from the seed
    /// correspondences and save it. A one-time fallback, not a recurring
    /// recalibration.
    pub fn load_or_estimate(
        &self,
        seeds: &[PointCorrespondence],
    ) -> Result<Homography, CalibrationSetupError> {
        if let Some(h) = self.load()? {
            log::info!("calibration loaded from {}", self.path.display());
            return Ok(h);
        }
        log::info!(
            "no saved calibration, estimating from {} seed pairs",
            seeds.len()
        );
        let h = estimate_pixel_to_robot(seeds)?;
        self.save(&h)?;
        log::info!("calibration saved to {}", self.path.display());
        Ok(h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeds() -> Vec<PointCorrespondence> {
        vec![
            PointCorrespondence::new((269.0, 268.0), (340.0, 83.0)),
            PointCorrespondence::new((376.0, 491.0), (302.0, 62.0)),
            PointCorrespondence::new((835.0, 283.0), (338.0, -17.0)),
            PointCorrespondence::new((723.0, 502.0), (300.0, 0.0)),
        ]
    }

    #[test]
    fn missing_file_loads_as_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = CalibrationStore::new(dir.path().join("calibration.json"));
        assert!(store.load().unwrap().is_none());
    }

    #[test]
    fn save_then_load_round_trips() {
        let dir = tempfile::tempdir().unwrap();
        let store = CalibrationStore::new(dir.path().join("calibration.json"));
        let h = estimate_pixel_to_robot(&seeds()).unwrap();
        store.save(&h).unwrap();
        let loaded = store.load().unwrap().expect("saved matrix present");
        assert_eq!(loaded, h);
    }

    #[test]
    fn load_or_estimate_persists_the_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let store = CalibrationStore::new(dir.path().join("calibration.json"));

        let first = store.load_or_estimate(&seeds()).unwrap();
        assert!(store.path().exists());

        // Second run reuses the file even with unusable seeds.
        let second = store.load_or_estimate(&[]).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn load_or_estimate_fails_on_bad_seeds_without_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = CalibrationStore::new(dir.path().join("calibration.json"));
        assert!(matches!(
            store.load_or_estimate(&seeds()[..2]),
            Err(CalibrationSetupError::Estimate(
                CalibrationError::NotEnoughCorrespondences { got: 2 }
            ))
        ));
    }
}
