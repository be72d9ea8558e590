use anyhow::{bail, Result};
use parking_lot::Mutex;
use std::{
    collections::HashMap,
    panic::{self, AssertUnwindSafe},
    path::{Path, PathBuf},
    sync::{Arc, OnceLock},
};

use crate::encode::{CategoryCodes, FeatureVector};
use crate::error::ModelLoadError;
use crate::pipeline::PipelineModel;
use crate::transform::InverseTransform;

/// A loaded regression model. Read-only after load, shared across requests.
pub trait Model: Send + Sync {
    fn predict(&self, x: &FeatureVector) -> Result<f64>;

    fn name(&self) -> &str {
        "model"
    }

    /// Input column names in fit order, when the artifact records them.
    fn columns(&self) -> Option<&[String]> {
        None
    }

    /// Integer codes the model was trained with, when the artifact records them.
    fn category_codes(&self) -> Option<&CategoryCodes> {
        None
    }

    /// Inverse transform the artifact already applies to its own output.
    fn target(&self) -> Option<InverseTransform> {
        None
    }
}

/// Deserializes a model artifact.
pub trait ArtifactReader: Send + Sync {
    fn read(&self, path: &Path) -> Result<Arc<dyn Model>>;
}

/// Picks the artifact format from the file extension.
#[derive(Debug, Default, Clone, Copy)]
pub struct FileArtifactReader;

impl ArtifactReader for FileArtifactReader {
    fn read(&self, path: &Path) -> Result<Arc<dyn Model>> {
        if !path.exists() {
            bail!("model artifact not found");
        }
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Ok(Arc::new(PipelineModel::from_file(path)?)),
            #[cfg(feature = "torch")]
            Some("pt") => Ok(Arc::new(crate::torch::TorchModel::load(path)?)),
            Some(ext) => bail!("unsupported model artifact format '.{ext}'"),
            None => bail!("model artifact has no file extension"),
        }
    }
}

type LoadOutcome = Result<Arc<dyn Model>, ModelLoadError>;

/// The file-backed cache shared by every gateway in the process.
pub fn shared_cache() -> Arc<ModelCache> {
    static SHARED: OnceLock<Arc<ModelCache>> = OnceLock::new();
    SHARED
        .get_or_init(|| Arc::new(ModelCache::with_file_reader()))
        .clone()
}

/// Reads `path` at most once for the life of the process.
pub fn load_model(path: &Path) -> LoadOutcome {
    shared_cache().load(path)
}

/// Loads each artifact path at most once for the life of the cache.
///
/// Concurrent first callers for the same path block on one once-cell, so a
/// single read runs and everyone sees its model or its error. Failures are
/// cached too; there is no retry short of building a new cache.
pub struct ModelCache {
    reader: Arc<dyn ArtifactReader>,
    slots: Mutex<HashMap<PathBuf, Arc<OnceLock<LoadOutcome>>>>,
}

impl ModelCache {
    pub fn new(reader: Arc<dyn ArtifactReader>) -> Self {
        Self {
            reader,
            slots: Mutex::new(HashMap::new()),
        }
    }

    pub fn with_file_reader() -> Self {
        Self::new(Arc::new(FileArtifactReader))
    }

    pub fn load(&self, path: &Path) -> LoadOutcome {
        // The read runs outside the map lock.
        let slot = {
            let mut slots = self.slots.lock();
            slots.entry(path.to_path_buf()).or_default().clone()
        };
        slot.get_or_init(|| self.read(path)).clone()
    }

    fn read(&self, path: &Path) -> LoadOutcome {
        tracing::info!("loading model artifact {}", path.display());
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| self.reader.read(path)));
        match outcome {
            Ok(Ok(model)) => {
                tracing::info!("loaded model '{}' from {}", model.name(), path.display());
                Ok(model)
            }
            Ok(Err(e)) => {
                let err = ModelLoadError::new(path, format!("{e:#}"));
                tracing::error!("model load failed: {}", err);
                Err(err)
            }
            Err(_) => {
                let err = ModelLoadError::new(path, "artifact reader panicked");
                tracing::error!("model load failed: {}", err);
                Err(err)
            }
        }
    }
}
