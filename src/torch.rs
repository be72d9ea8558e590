use anyhow::{bail, Context, Result};
use std::path::Path;
use tch::{kind::Kind, CModule, Device, Tensor};

use crate::encode::{FeatureVector, FEATURE_COUNT};
use crate::model::Model;

/// TorchScript regressor taking a `[1, 6]` float tensor of integer-mapped
/// features and returning a single value.
pub struct TorchModel {
    module: CModule,
    device: Device,
    name: String,
}

impl TorchModel {
    pub fn load(path: &Path) -> Result<Self> {
        let device = Device::Cpu;

        let module = CModule::load_on_device(path, device)
            .with_context(|| format!("failed to load TorchScript {}", path.display()))?;

        // Probe output shape with a dummy forward; expect one value per row
        let dummy = Tensor::zeros([1, FEATURE_COUNT as i64], (Kind::Float, device));
        let t = module.forward_ts(&[dummy])?;
        if t.numel() != 1 {
            bail!("unexpected model output size: {:?}", t.size());
        }

        let name = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "torchscript".to_string());

        Ok(Self {
            module,
            device,
            name,
        })
    }
}

impl Model for TorchModel {
    fn predict(&self, x: &FeatureVector) -> Result<f64> {
        let values = x.to_f32()?;
        if values.len() != FEATURE_COUNT {
            bail!(
                "feature length mismatch: got {}, expected {}",
                values.len(),
                FEATURE_COUNT
            );
        }

        let input = Tensor::from_slice(&values)
            .reshape([1, FEATURE_COUNT as i64])
            .to_device(self.device);

        let t = self.module.forward_ts(&[input])?;
        if t.numel() != 1 {
            bail!("unexpected model output size: {:?}", t.size());
        }

        Ok(t.reshape([-1]).to_kind(Kind::Double).double_value(&[0]))
    }

    fn name(&self) -> &str {
        &self.name
    }
}
