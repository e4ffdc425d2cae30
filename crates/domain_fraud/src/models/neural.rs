//! Multi-layer perceptron classifier
//!
//! Fully connected ReLU hidden layers with a single sigmoid output, trained
//! on log loss with an L2 penalty using mini-batch Adam. Training stops when
//! the epoch loss fails to improve by `tolerance` for `patience` epochs.

use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{check_row, check_training_set, sigmoid, FraudClassifier, ModelVariant};
use crate::error::FraudError;

const ADAM_BETA1: f64 = 0.9;
const ADAM_BETA2: f64 = 0.999;
const ADAM_EPSILON: f64 = 1e-8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeuralParams {
    pub hidden_layers: Vec<usize>,
    pub learning_rate: f64,
    pub l2_penalty: f64,
    pub batch_size: usize,
    pub max_epochs: usize,
    pub tolerance: f64,
    /// Epochs without `tolerance` improvement before stopping
    pub patience: usize,
    pub seed: u64,
}

impl Default for NeuralParams {
    fn default() -> Self {
        Self {
            hidden_layers: vec![50, 25],
            learning_rate: 0.001,
            l2_penalty: 1e-4,
            batch_size: 200,
            max_epochs: 300,
            tolerance: 1e-4,
            patience: 10,
            seed: 42,
        }
    }
}

impl NeuralParams {
    pub fn validate(&self) -> Result<(), FraudError> {
        if self.hidden_layers.is_empty() || self.hidden_layers.contains(&0) {
            return Err(FraudError::configuration("hidden layers must be non-empty and non-zero"));
        }
        if !(self.learning_rate > 0.0) || !(self.l2_penalty >= 0.0) || !(self.tolerance >= 0.0) {
            return Err(FraudError::configuration(
                "learning_rate must be positive, l2_penalty and tolerance non-negative",
            ));
        }
        if self.batch_size == 0 || self.max_epochs == 0 || self.patience == 0 {
            return Err(FraudError::configuration(
                "batch_size, max_epochs and patience must be positive",
            ));
        }
        Ok(())
    }
}

/// One fully connected layer. `weights[j]` holds the inputs of unit `j`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dense {
    weights: Vec<Vec<f64>>,
    biases: Vec<f64>,
}

impl Dense {
    /// Glorot uniform initialization
    fn glorot(fan_in: usize, fan_out: usize, factor: f64, rng: &mut impl Rng) -> Self {
        let bound = (factor / (fan_in + fan_out) as f64).sqrt();
        let weights = (0..fan_out)
            .map(|_| (0..fan_in).map(|_| rng.gen_range(-bound..bound)).collect())
            .collect();
        let biases = (0..fan_out).map(|_| rng.gen_range(-bound..bound)).collect();
        Self { weights, biases }
    }

    fn zeros_like(&self) -> Self {
        Self {
            weights: self.weights.iter().map(|w| vec![0.0; w.len()]).collect(),
            biases: vec![0.0; self.biases.len()],
        }
    }

    fn forward(&self, input: &[f64]) -> Vec<f64> {
        self.weights
            .iter()
            .zip(&self.biases)
            .map(|(w, b)| b + w.iter().zip(input).map(|(w, x)| w * x).sum::<f64>())
            .collect()
    }

    fn squared_norm(&self) -> f64 {
        self.weights.iter().flatten().map(|w| w * w).sum()
    }
}

/// First and second moment estimates for every parameter
#[derive(Debug)]
struct Adam {
    first: Vec<Dense>,
    second: Vec<Dense>,
    step: i32,
}

impl Adam {
    fn new(layers: &[Dense]) -> Self {
        Self {
            first: layers.iter().map(Dense::zeros_like).collect(),
            second: layers.iter().map(Dense::zeros_like).collect(),
            step: 0,
        }
    }

    fn apply(&mut self, layers: &mut [Dense], grads: &[Dense], learning_rate: f64) {
        self.step += 1;
        let rate = learning_rate * (1.0 - ADAM_BETA2.powi(self.step)).sqrt()
            / (1.0 - ADAM_BETA1.powi(self.step));

        let update = |param: &mut f64, grad: f64, m: &mut f64, v: &mut f64| {
            *m = ADAM_BETA1 * *m + (1.0 - ADAM_BETA1) * grad;
            *v = ADAM_BETA2 * *v + (1.0 - ADAM_BETA2) * grad * grad;
            *param -= rate * *m / (v.sqrt() + ADAM_EPSILON);
        };

        for (l, layer) in layers.iter_mut().enumerate() {
            for (j, row) in layer.weights.iter_mut().enumerate() {
                for (k, w) in row.iter_mut().enumerate() {
                    update(
                        w,
                        grads[l].weights[j][k],
                        &mut self.first[l].weights[j][k],
                        &mut self.second[l].weights[j][k],
                    );
                }
            }
            for (j, b) in layer.biases.iter_mut().enumerate() {
                update(
                    b,
                    grads[l].biases[j],
                    &mut self.first[l].biases[j],
                    &mut self.second[l].biases[j],
                );
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeuralNet {
    params: NeuralParams,
    n_features: usize,
    layers: Vec<Dense>,
    /// Epochs run by the last `fit`
    #[serde(default)]
    epochs: usize,
}

impl NeuralNet {
    pub fn new(params: NeuralParams) -> Self {
        Self {
            params,
            n_features: 0,
            layers: Vec::new(),
            epochs: 0,
        }
    }

    pub fn epochs(&self) -> usize {
        self.epochs
    }

    /// Activations of every layer, input first and output probability last
    fn activations(&self, row: &[f64]) -> Vec<Vec<f64>> {
        let mut acts = Vec::with_capacity(self.layers.len() + 1);
        acts.push(row.to_vec());
        let last = self.layers.len().saturating_sub(1);
        for (l, layer) in self.layers.iter().enumerate() {
            let z = layer.forward(&acts[l]);
            let a = if l == last {
                z.into_iter().map(sigmoid).collect()
            } else {
                z.into_iter().map(|v| v.max(0.0)).collect()
            };
            acts.push(a);
        }
        acts
    }

    /// Adds one sample's gradient into `grads` and returns its log loss
    fn backpropagate(&self, row: &[f64], target: f64, grads: &mut [Dense]) -> Result<f64, FraudError> {
        let acts = self.activations(row);
        let out = output(&acts).ok_or_else(|| FraudError::training("neural_net has no output unit"))?;
        let p = out.clamp(1e-15, 1.0 - 1e-15);
        let loss = -(target * p.ln() + (1.0 - target) * (1.0 - p).ln());

        // sigmoid output with log loss: dL/dz = p - y
        let mut delta = vec![out - target];
        for l in (0..self.layers.len()).rev() {
            let input = &acts[l];
            for (j, d) in delta.iter().enumerate() {
                grads[l].biases[j] += d;
                for (g, x) in grads[l].weights[j].iter_mut().zip(input) {
                    *g += d * x;
                }
            }
            if l > 0 {
                delta = (0..input.len())
                    .map(|k| {
                        if input[k] <= 0.0 {
                            return 0.0;
                        }
                        self.layers[l]
                            .weights
                            .iter()
                            .zip(&delta)
                            .map(|(w, d)| w[k] * d)
                            .sum::<f64>()
                    })
                    .collect();
            }
        }
        Ok(loss)
    }
}

/// The single output probability, last activation of the last layer
fn output(acts: &[Vec<f64>]) -> Option<f64> {
    acts.last().and_then(|layer| layer.first()).copied()
}

fn corrupt(reason: impl std::fmt::Display) -> FraudError {
    FraudError::model_load(format!("neural_net {reason}"))
}

impl FraudClassifier for NeuralNet {
    fn variant(&self) -> ModelVariant {
        ModelVariant::NeuralNet
    }

    fn fit(&mut self, rows: &[Vec<f64>], labels: &[bool]) -> Result<(), FraudError> {
        self.params.validate()?;
        let width = check_training_set(rows, labels)?;
        let params = self.params.clone();
        let mut rng = StdRng::seed_from_u64(params.seed);

        let mut sizes = vec![width];
        sizes.extend(&params.hidden_layers);
        sizes.push(1);
        let output = sizes.len() - 2;
        self.layers = sizes
            .windows(2)
            .enumerate()
            .map(|(l, pair)| {
                let factor = if l == output { 2.0 } else { 6.0 };
                Dense::glorot(pair[0], pair[1], factor, &mut rng)
            })
            .collect();
        self.n_features = width;

        let n = rows.len();
        let mut order: Vec<usize> = (0..n).collect();
        let mut adam = Adam::new(&self.layers);
        let mut best_loss = f64::INFINITY;
        let mut stale_epochs = 0;
        self.epochs = 0;

        for _ in 0..params.max_epochs {
            order.shuffle(&mut rng);
            let mut epoch_loss = 0.0;

            for batch in order.chunks(params.batch_size) {
                let mut grads: Vec<Dense> = self.layers.iter().map(Dense::zeros_like).collect();
                for &i in batch {
                    let target = if labels[i] { 1.0 } else { 0.0 };
                    epoch_loss += self.backpropagate(&rows[i], target, &mut grads)?;
                }

                let m = batch.len() as f64;
                for (grad, layer) in grads.iter_mut().zip(&self.layers) {
                    for (g_row, w_row) in grad.weights.iter_mut().zip(&layer.weights) {
                        for (g, w) in g_row.iter_mut().zip(w_row) {
                            *g = (*g + params.l2_penalty * w) / m;
                        }
                    }
                    grad.biases.iter_mut().for_each(|g| *g /= m);
                }
                adam.apply(&mut self.layers, &grads, params.learning_rate);
            }

            let penalty: f64 = self.layers.iter().map(Dense::squared_norm).sum();
            let loss = (epoch_loss + 0.5 * params.l2_penalty * penalty) / n as f64;
            self.epochs += 1;

            if loss > best_loss - params.tolerance {
                stale_epochs += 1;
            } else {
                stale_epochs = 0;
            }
            best_loss = best_loss.min(loss);
            if stale_epochs >= params.patience {
                break;
            }
        }

        debug!(epochs = self.epochs, best_loss, "Neural network fitted");
        Ok(())
    }

    fn predict_proba(&self, row: &[f64]) -> Result<f64, FraudError> {
        check_row("neural_net", self.n_features, row)?;
        if self.layers.is_empty() {
            return Err(FraudError::NotFitted("neural_net".to_string()));
        }
        output(&self.activations(row))
            .map(|p| p.clamp(0.0, 1.0))
            .ok_or_else(|| corrupt("has an empty output layer"))
    }

    fn is_fitted(&self) -> bool {
        self.n_features > 0 && !self.layers.is_empty()
    }

    /// Layer `l` takes the width of layer `l - 1`, the first takes
    /// `n_features` and the last has exactly one unit
    fn verify(&self) -> Result<(), FraudError> {
        let mut width = self.n_features;
        for (l, layer) in self.layers.iter().enumerate() {
            let units = layer.weights.len();
            if units == 0 || layer.biases.len() != units {
                return Err(corrupt(format!(
                    "layer {l} has {units} weight rows and {} biases",
                    layer.biases.len()
                )));
            }
            if let Some(row) = layer.weights.iter().find(|row| row.len() != width) {
                return Err(corrupt(format!("layer {l} expects {width} inputs, found {}", row.len())));
            }
            if layer.weights.iter().flatten().chain(&layer.biases).any(|v| !v.is_finite()) {
                return Err(corrupt(format!("layer {l} holds a non-finite parameter")));
            }
            width = units;
        }
        if self.layers.is_empty() || width != 1 {
            return Err(corrupt(format!("output layer has {width} units, expected 1")));
        }
        Ok(())
    }

    fn to_payload(&self) -> Result<serde_json::Value, FraudError> {
        Ok(serde_json::to_value(self)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn linear() -> (Vec<Vec<f64>>, Vec<bool>) {
        let rows: Vec<Vec<f64>> = (0..200)
            .map(|i| {
                vec![
                    ((i * 37) % 100) as f64 / 25.0 - 2.0,
                    ((i * 61) % 100) as f64 / 25.0 - 2.0,
                ]
            })
            .collect();
        let labels = rows.iter().map(|r| r[0] + r[1] > 0.0).collect();
        (rows, labels)
    }

    fn quick() -> NeuralParams {
        NeuralParams {
            hidden_layers: vec![8],
            learning_rate: 0.01,
            batch_size: 20,
            max_epochs: 100,
            ..NeuralParams::default()
        }
    }

    #[test]
    fn test_learns_linear_boundary() {
        let (rows, labels) = linear();
        let mut net = NeuralNet::new(quick());
        net.fit(&rows, &labels).unwrap();

        assert!(net.epochs() > 0 && net.epochs() <= 100);
        assert!(net.predict_proba(&[1.5, 1.5]).unwrap() > 0.8);
        assert!(net.predict_proba(&[-1.5, -1.5]).unwrap() < 0.2);
    }

    #[test]
    fn test_fit_is_deterministic() {
        let (rows, labels) = linear();
        let mut a = NeuralNet::new(quick());
        let mut b = NeuralNet::new(quick());
        a.fit(&rows, &labels).unwrap();
        b.fit(&rows, &labels).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_default_architecture() {
        let (rows, labels) = linear();
        let mut net = NeuralNet::new(NeuralParams {
            max_epochs: 1,
            ..NeuralParams::default()
        });
        net.fit(&rows, &labels).unwrap();

        let shapes: Vec<(usize, usize)> = net
            .layers
            .iter()
            .map(|l| (l.weights.len(), l.weights[0].len()))
            .collect();
        assert_eq!(shapes, vec![(50, 2), (25, 50), (1, 25)]);
    }

    fn fitted() -> NeuralNet {
        let (rows, labels) = linear();
        let mut net = NeuralNet::new(NeuralParams {
            max_epochs: 2,
            ..quick()
        });
        net.fit(&rows, &labels).unwrap();
        net
    }

    #[test]
    fn test_fitted_net_verifies() {
        assert!(fitted().verify().is_ok());
    }

    #[test]
    fn test_empty_output_layer_rejected() {
        let mut net = fitted();
        let last = net.layers.len() - 1;
        net.layers[last] = Dense {
            weights: Vec::new(),
            biases: Vec::new(),
        };
        assert!(matches!(net.verify(), Err(FraudError::ModelLoad(_))));

        let payload = serde_json::to_value(&net).unwrap();
        let err = ModelVariant::NeuralNet.load_payload(payload).unwrap_err();
        assert!(matches!(err, FraudError::ModelLoad(_)));
    }

    #[test]
    fn test_mismatched_layer_width_rejected() {
        let mut net = fitted();
        net.layers[1].weights[0].push(0.0);
        let err = net.verify().unwrap_err();
        assert!(err.to_string().contains("layer 1 expects 8 inputs"));
    }

    #[test]
    fn test_wide_output_layer_rejected() {
        let mut net = fitted();
        let last = net.layers.len() - 1;
        let extra = net.layers[last].weights[0].clone();
        net.layers[last].weights.push(extra);
        net.layers[last].biases.push(0.0);
        assert!(net.verify().unwrap_err().to_string().contains("output layer has 2 units"));
    }

    #[test]
    fn test_predict_without_output_unit_is_error() {
        let mut net = fitted();
        let last = net.layers.len() - 1;
        net.layers[last] = Dense {
            weights: Vec::new(),
            biases: Vec::new(),
        };
        assert!(net.predict_proba(&[0.5, 0.5]).is_err());
    }

    #[test]
    fn test_zero_patience_rejected() {
        let params = NeuralParams {
            patience: 0,
            ..NeuralParams::default()
        };
        assert!(params.validate().is_err());
    }
}
