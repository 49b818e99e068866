use std::env;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};

/// Environment variable that overrides the model directory lookup.
pub const MODEL_DIR_ENV: &str = "ASTROASSIST_MODEL_DIR";
/// File name of the exported sequence-classification graph.
pub const MODEL_FILE_NAME: &str = "intent_classifier.onnx";
/// File name of the persisted label table.
pub const LABELS_FILE_NAME: &str = "label_maps.json";

#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("Artifact not found: {0}")]
    ArtifactMissing(PathBuf),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Invalid configuration: {0}")]
    ConfigError(String),
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("Hash mismatch: expected {expected}, got {actual} for {}", .path.display())]
    HashMismatch {
        path: PathBuf,
        expected: String,
        actual: String,
    },
}

/// Locates the model artifacts on disk and verifies their digests.
#[derive(Debug, Clone)]
pub struct ModelManager {
    models_dir: PathBuf,
}

impl ModelManager {
    /// Returns the default models directory path
    pub fn get_default_models_dir() -> PathBuf {
        // 1. Check environment variable
        if let Ok(path) = env::var(MODEL_DIR_ENV) {
            return PathBuf::from(path);
        }

        // 2. Project-local layouts, with and without the src/ prefix
        for candidate in ["models", "src/models"] {
            let path = PathBuf::from(candidate);
            if path.join(MODEL_FILE_NAME).exists() {
                return path;
            }
        }

        // 3. Platform-specific data directory
        if let Some(data_dir) = dirs::data_dir() {
            return data_dir.join("astroassist").join("models");
        }

        // 4. Fall back to the working directory layout
        PathBuf::from("models")
    }

    pub fn new<P: AsRef<Path>>(models_dir: P) -> Self {
        Self {
            models_dir: models_dir.as_ref().to_path_buf(),
        }
    }

    pub fn get_model_path(&self) -> PathBuf {
        self.models_dir.join(MODEL_FILE_NAME)
    }

    pub fn get_labels_path(&self) -> PathBuf {
        self.models_dir.join(LABELS_FILE_NAME)
    }

    /// Returns true when both required artifacts are present.
    pub fn is_model_available(&self) -> bool {
        let model_path = self.get_model_path();
        let labels_path = self.get_labels_path();
        log::info!("Checking model artifacts in {:?}:", self.models_dir);
        log::info!("  Model path: {:?} (exists: {})", model_path, model_path.exists());
        log::info!("  Labels path: {:?} (exists: {})", labels_path, labels_path.exists());
        model_path.exists() && labels_path.exists()
    }

    /// Checks `path` against an expected SHA-256 digest (hex, any case).
    pub fn verify_file(&self, path: &Path, expected_hash: &str) -> Result<(), ModelError> {
        if !path.exists() {
            return Err(ModelError::ArtifactMissing(path.to_path_buf()));
        }
        let actual = compute_sha256(path)?;
        let expected = expected_hash.trim().to_ascii_lowercase();
        if actual == expected {
            log::debug!("Digest verified for {:?}", path);
            Ok(())
        } else {
            log::warn!("Digest mismatch for {:?}", path);
            Err(ModelError::HashMismatch {
                path: path.to_path_buf(),
                expected,
                actual,
            })
        }
    }
}

/// Computes the lowercase hex SHA-256 digest of the file at `path`.
pub fn compute_sha256(path: &Path) -> Result<String, ModelError> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = Sha256::new();
    let mut buffer = [0_u8; 8192];
    loop {
        let read = reader.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = env::temp_dir().join("astroassist-test").join(name);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_artifact_paths() {
        let manager = ModelManager::new("/srv/habitat/models");
        assert!(manager.get_model_path().ends_with("models/intent_classifier.onnx"));
        assert!(manager.get_labels_path().ends_with("models/label_maps.json"));
    }

    #[test]
    fn test_missing_artifacts() {
        let dir = scratch_dir("missing-artifacts");
        let manager = ModelManager::new(&dir);
        assert!(!manager.is_model_available());
        assert!(matches!(
            manager.verify_file(&manager.get_model_path(), "00"),
            Err(ModelError::ArtifactMissing(_))
        ));
    }

    #[test]
    fn test_file_verification() {
        let dir = scratch_dir("verify");
        let path = dir.join("blob.bin");
        fs::write(&path, b"abc").unwrap();
        let manager = ModelManager::new(&dir);

        // SHA-256("abc")
        let digest = "BA7816BF8F01CFEA414140DE5DAE2223B00361A396177A9CB410FF61F20015AD";
        assert!(manager.verify_file(&path, digest).is_ok());

        fs::write(&path, b"corrupted data").unwrap();
        assert!(matches!(
            manager.verify_file(&path, digest),
            Err(ModelError::HashMismatch { .. })
        ));
    }
}
