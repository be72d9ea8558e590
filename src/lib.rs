//! Car price inference gateway: validates the six form fields, encodes them
//! into the feature layout a trained regressor expects, runs the model and
//! formats the price.

pub mod config;
pub mod encode;
pub mod error;
pub mod format;
pub mod gateway;
pub mod model;
pub mod pipeline;
pub mod server;
#[cfg(feature = "torch")]
pub mod torch;
pub mod transform;
pub mod types;
pub mod validate;

pub use config::GatewayConfig;
pub use encode::{encode, encode_with, CategoryCodes, EncodingStrategy, Feature, FeatureVector};
pub use error::{EncodingError, ErrorKind, GatewayError, ModelLoadError, PredictionError, ValidationError};
pub use format::PredictionResult;
pub use gateway::{predict, Gateway, LoadPolicy, LoadState};
pub use model::{load_model, shared_cache, ArtifactReader, FileArtifactReader, Model, ModelCache};
pub use transform::InverseTransform;
pub use types::{Field, RawFields, RawInput, RawValue};
pub use validate::validate;
