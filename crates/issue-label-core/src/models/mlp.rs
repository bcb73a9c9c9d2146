//! Multi-layer perceptron inference engine.
//!
//! The artifact is a JSON document:
//!
//! ```json
//! {"layers": [{"weights": [[...], ...], "bias": [...]}, ...]}
//! ```
//!
//! `weights` is row-major `[out][in]`, the layout `candle_nn::Linear` takes.
//! Hidden layers use ReLU, the output layer uses the logistic function so
//! every label column is an independent probability. Inference runs on
//! `Device::Cpu` and holds no mutable state.

use std::path::Path;

use candle_core::{Device, Tensor};
use candle_nn::{Linear, Module};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::traits::ProbabilityClassifier;

/// One fully connected layer as stored in the artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenseLayer {
    pub weights: Vec<Vec<f32>>,
    pub bias: Vec<f32>,
}

impl DenseLayer {
    fn inputs(&self) -> usize {
        self.weights.first().map_or(0, Vec::len)
    }

    fn outputs(&self) -> usize {
        self.bias.len()
    }

    fn to_linear(&self, device: &Device) -> CoreResult<Linear> {
        let flat: Vec<f32> = self.weights.iter().flatten().copied().collect();
        let weight = Tensor::from_vec(flat, (self.outputs(), self.inputs()), device).map_err(map_candle)?;
        let bias = Tensor::from_slice(&self.bias, (self.outputs(),), device).map_err(map_candle)?;
        Ok(Linear::new(weight, Some(bias)))
    }
}

#[derive(Deserialize)]
struct RawMlp {
    layers: Vec<DenseLayer>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "RawMlp")]
pub struct MlpClassifier {
    layers: Vec<DenseLayer>,
    #[serde(skip)]
    linears: Vec<Linear>,
}

impl PartialEq for MlpClassifier {
    fn eq(&self, other: &Self) -> bool {
        self.layers == other.layers
    }
}

impl TryFrom<RawMlp> for MlpClassifier {
    type Error = CoreError;

    fn try_from(raw: RawMlp) -> Result<Self, Self::Error> {
        MlpClassifier::new(raw.layers)
    }
}

impl MlpClassifier {
    /// # Errors
    /// - `Classifier` if there are no layers or layer shapes do not chain
    pub fn new(layers: Vec<DenseLayer>) -> CoreResult<Self> {
        if layers.is_empty() {
            return Err(CoreError::Classifier("MLP has no layers".to_string()));
        }

        let mut expected_inputs = layers[0].inputs();
        for (i, layer) in layers.iter().enumerate() {
            if layer.weights.len() != layer.outputs() {
                return Err(CoreError::Classifier(format!(
                    "layer {} has {} weight rows but {} biases",
                    i,
                    layer.weights.len(),
                    layer.outputs()
                )));
            }
            if layer.weights.iter().any(|row| row.len() != expected_inputs) {
                return Err(CoreError::Classifier(format!(
                    "layer {} expects {} inputs",
                    i, expected_inputs
                )));
            }
            expected_inputs = layer.outputs();
        }

        let linears = layers
            .iter()
            .map(|layer| layer.to_linear(&Device::Cpu))
            .collect::<CoreResult<Vec<_>>>()?;

        Ok(Self { layers, linears })
    }

    pub fn from_json_slice(bytes: &[u8]) -> CoreResult<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub async fn from_json_file(path: &Path) -> CoreResult<Self> {
        let bytes = tokio::fs::read(path).await?;
        Self::from_json_slice(&bytes)
    }

    pub fn to_json(&self) -> CoreResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn input_dim(&self) -> usize {
        self.layers[0].inputs()
    }

    /// Forward pass: (linear -> ReLU)* -> linear -> sigmoid.
    fn forward(&self, x: &Tensor) -> CoreResult<Tensor> {
        let last = self.linears.len() - 1;
        let mut h = x.clone();
        for (i, linear) in self.linears.iter().enumerate() {
            let z = linear.forward(&h).map_err(map_candle)?;
            h = if i == last {
                candle_nn::ops::sigmoid(&z)
            } else {
                z.relu()
            }
            .map_err(map_candle)?;
        }
        Ok(h)
    }
}

impl ProbabilityClassifier for MlpClassifier {
    fn predict_proba(&self, features: &[Vec<f32>]) -> CoreResult<Vec<Vec<f32>>> {
        if features.is_empty() {
            return Ok(Vec::new());
        }

        let dim = self.input_dim();
        if let Some(row) = features.iter().find(|row| row.len() != dim) {
            return Err(CoreError::Classifier(format!(
                "feature row has {} values, model expects {}",
                row.len(),
                dim
            )));
        }

        let flat: Vec<f32> = features.iter().flatten().copied().collect();
        let x = Tensor::from_vec(flat, (features.len(), dim), &Device::Cpu).map_err(map_candle)?;
        self.forward(&x)?.to_vec2::<f32>().map_err(map_candle)
    }

    fn label_count(&self) -> usize {
        self.layers.last().map_or(0, DenseLayer::outputs)
    }
}

fn map_candle(e: candle_core::Error) -> CoreError {
    CoreError::Classifier(format!("MLP tensor error: {}", e))
}
