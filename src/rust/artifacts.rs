use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use dirs;
use log;
use sha2::{Digest, Sha256};

/// File name of the exported classifier inside the artifact directory.
pub const MODEL_FILE_NAME: &str = "emotion_classification_model.onnx";
/// File name of the exported tokenizer inside the artifact directory.
pub const TOKENIZER_FILE_NAME: &str = "emotion_model_tokenizer.json";
/// Environment variable that overrides the artifact directory.
pub const ARTIFACTS_ENV_VAR: &str = "EMOTION_PREDICTOR_ARTIFACTS";

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("Artifact not found: {0}")]
    NotFound(String),
    #[error("IO error: {0}")]
    IoError(#[from] io::Error),
    #[error("Hash mismatch: expected {expected}, got {actual} for {file_type} file")]
    HashMismatch {
        file_type: String,
        expected: String,
        actual: String,
    },
}

/// Optional SHA-256 pins for the two artifacts. Unset pins are not checked.
#[derive(Debug, Clone, Default)]
pub struct ArtifactChecksums {
    pub model_sha256: Option<String>,
    pub tokenizer_sha256: Option<String>,
}

/// Locates the pre-trained artifacts on disk and verifies them before they are loaded.
///
/// The store never writes anything: artifacts are produced by the training
/// pipeline and dropped into the directory by whoever deploys the service.
#[derive(Debug, Clone)]
pub struct ArtifactStore {
    artifacts_dir: PathBuf,
    model_path: PathBuf,
    tokenizer_path: PathBuf,
}

impl ArtifactStore {
    /// Creates a store rooted at the default artifact directory
    pub fn new_default() -> Self {
        Self::new(Self::get_default_artifacts_dir())
    }

    /// Returns the default artifact directory
    pub fn get_default_artifacts_dir() -> PathBuf {
        // 1. Check environment variable
        if let Ok(path) = env::var(ARTIFACTS_ENV_VAR) {
            return PathBuf::from(path);
        }

        // 2. Working directory, if the artifacts sit next to the binary's launch point
        let cwd = PathBuf::from(".");
        if cwd.join(MODEL_FILE_NAME).exists() && cwd.join(TOKENIZER_FILE_NAME).exists() {
            return cwd;
        }

        // 3. Platform-specific data directory
        if let Some(data_dir) = dirs::data_local_dir() {
            return data_dir.join("emotion-predictor");
        }

        // 4. Fallback to user's home directory
        if let Some(home_dir) = dirs::home_dir() {
            return home_dir.join(".local").join("share").join("emotion-predictor");
        }

        cwd
    }

    pub fn new<P: AsRef<Path>>(artifacts_dir: P) -> Self {
        let artifacts_dir = artifacts_dir.as_ref().to_path_buf();
        Self {
            model_path: artifacts_dir.join(MODEL_FILE_NAME),
            tokenizer_path: artifacts_dir.join(TOKENIZER_FILE_NAME),
            artifacts_dir,
        }
    }

    /// Overrides the model file location
    pub fn with_model_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.model_path = path.as_ref().to_path_buf();
        self
    }

    /// Overrides the tokenizer file location
    pub fn with_tokenizer_path<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.tokenizer_path = path.as_ref().to_path_buf();
        self
    }

    pub fn artifacts_dir(&self) -> &Path {
        &self.artifacts_dir
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }

    pub fn tokenizer_path(&self) -> &Path {
        &self.tokenizer_path
    }

    pub fn is_present(&self) -> bool {
        log::debug!("Checking artifacts:");
        log::debug!("  Model path: {:?} (exists: {})", self.model_path, self.model_path.exists());
        log::debug!("  Tokenizer path: {:?} (exists: {})", self.tokenizer_path, self.tokenizer_path.exists());
        self.model_path.is_file() && self.tokenizer_path.is_file()
    }

    /// Fails if either artifact is missing.
    pub fn ensure_present(&self) -> Result<(), ArtifactError> {
        for path in [&self.model_path, &self.tokenizer_path] {
            if !path.is_file() {
                log::error!("Artifact missing: {:?}", path);
                return Err(ArtifactError::NotFound(path.display().to_string()));
            }
        }
        Ok(())
    }

    /// Verifies the artifacts against the configured pins.
    ///
    /// Presence is always checked; hashes only when a pin is set.
    pub fn verify(&self, checksums: &ArtifactChecksums) -> Result<(), ArtifactError> {
        self.ensure_present()?;

        if let Some(expected) = &checksums.model_sha256 {
            Self::verify_file(&self.model_path, expected, "model")?;
        }
        if let Some(expected) = &checksums.tokenizer_sha256 {
            Self::verify_file(&self.tokenizer_path, expected, "tokenizer")?;
        }
        Ok(())
    }

    /// Lower-case hex SHA-256 of a file's contents.
    pub fn sha256_hex(path: &Path) -> Result<String, ArtifactError> {
        let bytes = fs::read(path)?;
        let mut hasher = Sha256::new();
        hasher.update(&bytes);
        Ok(format!("{:x}", hasher.finalize()))
    }

    fn verify_file(path: &Path, expected_hash: &str, file_type: &str) -> Result<(), ArtifactError> {
        log::info!("Verifying {} file: {:?}", file_type, path);
        let actual = Self::sha256_hex(path)?;
        let expected = expected_hash.trim().to_ascii_lowercase();

        if actual != expected {
            log::error!("{} hash mismatch: expected {}, got {}", file_type, expected, actual);
            return Err(ArtifactError::HashMismatch {
                file_type: file_type.to_string(),
                expected,
                actual,
            });
        }

        log::info!("{} file verified", file_type);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // sha256("hello")
    const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    fn scratch_dir(name: &str) -> PathBuf {
        let dir = env::temp_dir().join("emotion-predictor-tests").join(name);
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_missing_artifacts() {
        let dir = scratch_dir("missing");
        let store = ArtifactStore::new(&dir);

        assert!(!store.is_present());
        let err = store.ensure_present().unwrap_err();
        assert!(matches!(err, ArtifactError::NotFound(ref p) if p.contains(MODEL_FILE_NAME)));
    }

    #[test]
    fn test_verify_with_and_without_pins() -> Result<(), ArtifactError> {
        let dir = scratch_dir("pins");
        fs::write(dir.join(MODEL_FILE_NAME), "hello")?;
        fs::write(dir.join(TOKENIZER_FILE_NAME), "{}")?;
        let store = ArtifactStore::new(&dir);

        assert!(store.is_present());
        store.verify(&ArtifactChecksums::default())?;

        let pinned = ArtifactChecksums {
            model_sha256: Some(HELLO_SHA256.to_uppercase()),
            tokenizer_sha256: None,
        };
        store.verify(&pinned)?;

        fs::write(dir.join(MODEL_FILE_NAME), "corrupted data")?;
        let err = store.verify(&pinned).unwrap_err();
        assert!(matches!(err, ArtifactError::HashMismatch { ref file_type, .. } if file_type == "model"));
        Ok(())
    }

    #[test]
    fn test_path_overrides() {
        let store = ArtifactStore::new("/srv/artifacts")
            .with_model_path("/opt/models/custom.onnx");

        assert_eq!(store.model_path(), Path::new("/opt/models/custom.onnx"));
        assert_eq!(store.tokenizer_path(), Path::new("/srv/artifacts").join(TOKENIZER_FILE_NAME));
        assert_eq!(store.artifacts_dir(), Path::new("/srv/artifacts"));
    }

    #[test]
    fn test_default_artifacts_dir() {
        env::set_var(ARTIFACTS_ENV_VAR, "/tmp/emotion-artifacts");
        let path = ArtifactStore::get_default_artifacts_dir();
        assert_eq!(path, PathBuf::from("/tmp/emotion-artifacts"));
        env::remove_var(ARTIFACTS_ENV_VAR);

        let path = ArtifactStore::get_default_artifacts_dir();
        assert!(!path.as_os_str().is_empty());
    }
}
