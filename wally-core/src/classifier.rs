//! Scoring contract for tiles, plus an ONNX-backed implementation.

use std::path::Path;

use anyhow::{Context, Result};
use image::{RgbImage, imageops::FilterType};
use log::debug;
use tract_onnx::prelude::{
    Datum, Framework, Graph, InferenceFact, InferenceModelExt, SimplePlan, Tensor, TypedFact,
    TypedOp, tvec,
};
use wally_utils::{resize_rgb, rgb_to_bgr_hwc};

type RunnableModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

/// Anything that can say how likely a square tile is to contain the target.
///
/// Implementations must be usable from several threads at once; the scanner may score windows in
/// parallel.
pub trait Classifier: Send + Sync {
    /// Edge length of the square input the classifier expects.
    fn input_size(&self) -> u32;

    /// Confidence in `[0, 1]` that `tile` contains the target.
    ///
    /// `tile` is already `input_size` square when it comes from the scanner.
    fn predict(&self, tile: &RgbImage) -> Result<f32>;
}

impl<C: Classifier + ?Sized> Classifier for &C {
    fn input_size(&self) -> u32 {
        (**self).input_size()
    }

    fn predict(&self, tile: &RgbImage) -> Result<f32> {
        (**self).predict(tile)
    }
}

/// A trained two-class network exported to ONNX.
///
/// The graph takes a `[1, S, S, 3]` NHWC float tensor in BGR order with raw `0..=255`
/// intensities and returns either `[1, 2]` class probabilities `(absent, present)` or a single
/// "present" probability.
#[derive(Debug)]
pub struct OnnxClassifier {
    runnable: RunnableModel,
    input_size: u32,
}

impl OnnxClassifier {
    /// Load and optimize the graph for a fixed square input size.
    pub fn load<P: AsRef<Path>>(model_path: P, input_size: u32) -> Result<Self> {
        let path = model_path.as_ref();
        anyhow::ensure!(path.exists(), "model file not found: {}", path.display());
        anyhow::ensure!(input_size > 0, "classifier input size must be positive");

        let side = input_size as usize;
        let runnable = tract_onnx::onnx()
            .model_for_path(path)
            .with_context(|| format!("failed to parse ONNX graph from {}", path.display()))?
            .with_input_fact(
                0,
                InferenceFact::dt_shape(f32::datum_type(), tvec!(1, side, side, 3)),
            )
            .map_err(|e| anyhow::anyhow!("unable to pin classifier input shape: {e}"))?
            .into_optimized()
            .map_err(|e| anyhow::anyhow!("unable to optimize classifier graph: {e}"))?
            .into_runnable()
            .map_err(|e| anyhow::anyhow!("unable to make classifier graph runnable: {e}"))?;

        debug!(
            "Classifier {} loaded for {input_size}x{input_size} inputs",
            path.display()
        );
        Ok(Self {
            runnable,
            input_size,
        })
    }

    fn tensor_for(&self, tile: &RgbImage) -> Result<Tensor> {
        let side = self.input_size;
        let resized = resize_rgb(tile, side, side, FilterType::CatmullRom);
        let data: Vec<f32> = rgb_to_bgr_hwc(&resized).iter().copied().collect();
        let shape = [1, side as usize, side as usize, 3];
        Tensor::from_shape(&shape, &data).context("failed to build classifier input tensor")
    }
}

impl Classifier for OnnxClassifier {
    fn input_size(&self) -> u32 {
        self.input_size
    }

    fn predict(&self, tile: &RgbImage) -> Result<f32> {
        let input = self.tensor_for(tile)?;
        let outputs = self
            .runnable
            .run(tvec![input.into()])
            .map_err(|e| anyhow::anyhow!("classifier execution failed: {e}"))?;
        let output = outputs
            .first()
            .ok_or_else(|| anyhow::anyhow!("classifier produced no outputs"))?;
        let values: Vec<f32> = output
            .to_array_view::<f32>()
            .context("classifier output is not f32")?
            .iter()
            .copied()
            .collect();
        score_from_output(&values)
    }
}

/// Pick the "present" probability out of a raw network output row.
pub(crate) fn score_from_output(values: &[f32]) -> Result<f32> {
    let score = match values {
        [present] => *present,
        [_absent, present] => *present,
        other => anyhow::bail!(
            "unexpected classifier output width {} (expected 1 or 2)",
            other.len()
        ),
    };
    anyhow::ensure!(score.is_finite(), "classifier returned non-finite score {score}");
    Ok(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    struct Constant(f32);

    impl Classifier for Constant {
        fn input_size(&self) -> u32 {
            8
        }

        fn predict(&self, _tile: &RgbImage) -> Result<f32> {
            Ok(self.0)
        }
    }

    #[test]
    fn two_class_output_uses_present_column() {
        assert_eq!(score_from_output(&[0.2, 0.8]).unwrap(), 0.8);
        assert_eq!(score_from_output(&[0.3]).unwrap(), 0.3);
    }

    #[test]
    fn malformed_outputs_are_errors() {
        assert!(score_from_output(&[]).is_err());
        assert!(score_from_output(&[0.1, 0.2, 0.7]).is_err());
        assert!(score_from_output(&[0.0, f32::NAN]).is_err());
    }

    #[test]
    fn references_forward_to_the_classifier() {
        let stub = Constant(0.25);
        let by_ref: &dyn Classifier = &stub;
        let tile = RgbImage::from_pixel(8, 8, Rgb([1, 2, 3]));
        assert_eq!((&by_ref).predict(&tile).unwrap(), 0.25);
        assert_eq!((&stub).input_size(), 8);
    }

    #[test]
    fn missing_model_is_reported() {
        let err = OnnxClassifier::load("does/not/exist.onnx", 50).unwrap_err();
        assert!(err.to_string().contains("model file not found"));
    }
}
