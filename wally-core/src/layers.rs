//! Reference network topology as plain data for an external trainer.

use serde::{Deserialize, Serialize};

/// Neuron activation attached to a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Activation {
    Relu,
    Softmax,
}

/// One record of the layer stack.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LayerSpec {
    Input {
        height: u32,
        width: u32,
        channels: u32,
    },
    Conv2d {
        filters: u32,
        kernel: u32,
        activation: Activation,
    },
    MaxPool2d {
        kernel: u32,
    },
    Dense {
        units: u32,
        activation: Activation,
    },
    /// `keep` is the probability of retaining a unit.
    Dropout {
        keep: f32,
    },
}

/// Optimizer and loss the stack is trained with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingSpec {
    pub optimizer: String,
    pub learning_rate: f32,
    pub loss: String,
}

/// Full model description: layers in order plus training parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkSpec {
    pub layers: Vec<LayerSpec>,
    pub training: TrainingSpec,
}

const CONV_FILTERS: [u32; 7] = [32, 64, 128, 256, 128, 64, 32];

/// Seven conv/pool blocks, a wide dense layer with dropout and a two-way softmax.
pub fn reference_network(input_size: u32) -> NetworkSpec {
    let mut layers = vec![LayerSpec::Input {
        height: input_size,
        width: input_size,
        channels: 3,
    }];
    for filters in CONV_FILTERS {
        layers.push(LayerSpec::Conv2d {
            filters,
            kernel: 5,
            activation: Activation::Relu,
        });
        layers.push(LayerSpec::MaxPool2d { kernel: 5 });
    }
    layers.extend([
        LayerSpec::Dense {
            units: 1024,
            activation: Activation::Relu,
        },
        LayerSpec::Dropout { keep: 0.8 },
        LayerSpec::Dense {
            units: 2,
            activation: Activation::Softmax,
        },
    ]);

    NetworkSpec {
        layers,
        training: TrainingSpec {
            optimizer: "adam".to_string(),
            learning_rate: 1e-3,
            loss: "categorical_crossentropy".to_string(),
        },
    }
}
