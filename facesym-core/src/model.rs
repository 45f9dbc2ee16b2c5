use std::{fmt::Write, path::Path};

use anyhow::{Context, Result};
use log::{debug, warn};
use tract_onnx::prelude::{
    Framework, Graph, InferenceModelExt, IntoTensor, SimplePlan, Tensor, TypedFact, TypedOp, tvec,
};

use crate::preprocess::InputSize;

type RunnableModel = SimplePlan<TypedFact, Box<dyn TypedOp>, Graph<TypedFact, Box<dyn TypedOp>>>;

const STRIDES: [usize; 3] = [8, 16, 32];
const OUTPUTS_PER_STRIDE: usize = 4; // cls, obj, bbox, kps
pub(crate) const DETECTION_COLS: usize = 15; // bbox (4) + keypoints (10) + score (1)

#[derive(Clone, Copy)]
struct StrideMeta {
    stride_index: usize,
    stride: usize,
    cols: usize,
    rows: usize,
    cell_count: usize,
    offset: usize,
}

/// A loaded ONNX graph ready for execution.
///
/// Loading tries tract's fully optimized plan first and falls back to a decluttered plan when
/// optimization fails, which keeps unusual exports usable at the cost of speed.
#[derive(Debug)]
pub struct OnnxModel {
    label: &'static str,
    runnable: RunnableModel,
}

impl OnnxModel {
    /// Load the graph at `model_path`. `label` names the artifact in logs and errors.
    pub fn load<P: AsRef<Path>>(model_path: P, label: &'static str) -> Result<Self> {
        let path = model_path.as_ref();
        anyhow::ensure!(
            path.exists(),
            "{label} model file not found: {}",
            path.display()
        );

        let runnable = match load_runnable_model(path, label, true) {
            Ok(model) => {
                debug!("{label} model {} optimized successfully", path.display());
                model
            }
            Err(opt_err) => {
                let optimize_msg = format!("{opt_err}");
                let mut chain_msg = String::new();
                for cause in opt_err.chain() {
                    let _ = writeln!(&mut chain_msg, "  - {cause}");
                }
                warn!(
                    "{label} model {} failed optimized load ({}); falling back to decluttered graph.\nError chain:\n{}",
                    path.display(),
                    optimize_msg,
                    chain_msg.trim_end()
                );
                let decluttered = load_runnable_model(path, label, false).with_context(|| {
                    format!(
                        "fallback to decluttered {label} graph failed after optimize error: {optimize_msg}"
                    )
                })?;
                debug!("{label} model {} running in decluttered mode", path.display());
                decluttered
            }
        };

        Ok(Self { label, runnable })
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    /// Concrete shape of the first input, if the graph declares one.
    pub fn input_shape(&self) -> Option<Vec<usize>> {
        let fact = self.runnable.model().input_fact(0).ok()?;
        fact.shape.as_concrete().map(|dims| dims.to_vec())
    }

    /// Execute the graph on a single input tensor.
    pub fn run(&self, input: Tensor) -> Result<Vec<Tensor>> {
        let outputs = self
            .runnable
            .run(tvec![input.into()])
            .map_err(|e| anyhow::anyhow!("{} execution failed: {e}", self.label))?;
        let tensors: Vec<Tensor> = outputs
            .into_iter()
            .map(|value| value.into_tensor())
            .collect();
        anyhow::ensure!(!tensors.is_empty(), "{} model produced no outputs", self.label);
        Ok(tensors)
    }
}

/// YuNet face detector graph.
#[derive(Debug)]
pub struct YuNetModel {
    model: OnnxModel,
}

impl YuNetModel {
    pub fn load<P: AsRef<Path>>(model_path: P) -> Result<Self> {
        Ok(Self {
            model: OnnxModel::load(model_path, "detector")?,
        })
    }

    /// Input size fixed by the graph, when it is not dynamic.
    pub fn declared_input_size(&self) -> Option<InputSize> {
        match self.model.input_shape()?.as_slice() {
            [1, 3, h, w] => Some(InputSize::new(*w as u32, *h as u32)),
            _ => None,
        }
    }

    /// Execute YuNet and return decoded rows.
    ///
    /// The resulting tensor has shape `[N, 15]` where each row is
    /// `[x, y, w, h, re_x, re_y, le_x, le_y, nt_x, nt_y, rcm_x, rcm_y, lcm_x, lcm_y, score]`
    /// in the resized input coordinate space.
    pub fn run(&self, input: Tensor, input_size: InputSize) -> Result<Tensor> {
        let mut tensors = self.model.run(input)?;
        match tensors.len() {
            1 => tensors
                .pop()
                .ok_or_else(|| anyhow::anyhow!("YuNet model produced no outputs")),
            len if len == STRIDES.len() * OUTPUTS_PER_STRIDE => {
                decode_yunet_outputs(&tensors, input_size)
            }
            other => anyhow::bail!(
                "unexpected number of YuNet outputs: expected 1 or {}, got {}",
                STRIDES.len() * OUTPUTS_PER_STRIDE,
                other
            ),
        }
    }
}

fn load_runnable_model(path: &Path, label: &str, optimized: bool) -> Result<RunnableModel> {
    // Input shapes come from the ONNX file; callers query them through `input_shape`.
    let model = tract_onnx::onnx()
        .model_for_path(path)
        .with_context(|| format!("failed to parse ONNX graph from {}", path.display()))?;

    if optimized {
        model
            .into_optimized()
            .map_err(|e| anyhow::anyhow!("unable to optimize {label} graph: {e}"))?
            .into_runnable()
            .map_err(|e| anyhow::anyhow!("unable to make {label} graph runnable: {e}"))
    } else {
        model
            .into_typed()
            .map_err(|e| anyhow::anyhow!("unable to type-check {label} graph: {e}"))?
            .into_decluttered()
            .map_err(|e| anyhow::anyhow!("unable to declutter {label} graph: {e}"))?
            .into_runnable()
            .map_err(|e| anyhow::anyhow!("unable to make {label} graph runnable: {e}"))
    }
}

pub(crate) fn decode_yunet_outputs(outputs: &[Tensor], input_size: InputSize) -> Result<Tensor> {
    anyhow::ensure!(
        outputs.len() == STRIDES.len() * OUTPUTS_PER_STRIDE,
        "YuNet decode expects {} tensors, got {}",
        STRIDES.len() * OUTPUTS_PER_STRIDE,
        outputs.len()
    );

    let pad_w = align_to(input_size.width as usize, 32);
    let pad_h = align_to(input_size.height as usize, 32);
    anyhow::ensure!(pad_w > 0 && pad_h > 0, "input size must be non-zero");

    let mut metas = Vec::with_capacity(STRIDES.len());
    let mut offset = 0usize;
    for (stride_index, &stride) in STRIDES.iter().enumerate() {
        let cols = pad_w / stride;
        let rows = pad_h / stride;
        let cell_count = rows * cols;
        metas.push(StrideMeta {
            stride_index,
            stride,
            cols,
            rows,
            cell_count,
            offset,
        });
        offset += cell_count * DETECTION_COLS;
    }

    let mut fused = vec![0f32; offset];

    for meta in metas {
        let StrideMeta {
            stride_index,
            stride,
            cols,
            rows,
            cell_count,
            offset,
        } = meta;
        let stride_f = stride as f32;

        let cls = stride_output(outputs, stride_index, "cls", cell_count)?;
        let obj = stride_output(outputs, stride_index + STRIDES.len(), "obj", cell_count)?;
        let bbox = stride_output(
            outputs,
            stride_index + STRIDES.len() * 2,
            "bbox",
            cell_count * 4,
        )?;
        let kps = stride_output(
            outputs,
            stride_index + STRIDES.len() * 3,
            "kps",
            cell_count * 10,
        )?;

        let dst = &mut fused[offset..offset + cell_count * DETECTION_COLS];
        for row in 0..rows {
            for col in 0..cols {
                let idx = row * cols + col;
                let write = idx * DETECTION_COLS;

                let mut score = (cls[idx].clamp(0.0, 1.0) * obj[idx].clamp(0.0, 1.0)).sqrt();
                if !score.is_finite() {
                    score = 0.0;
                }

                let b = &bbox[idx * 4..idx * 4 + 4];
                let cx = (col as f32 + b[0]) * stride_f;
                let cy = (row as f32 + b[1]) * stride_f;
                let w = b[2].exp() * stride_f;
                let h = b[3].exp() * stride_f;
                dst[write] = (-0.5f32).mul_add(w, cx);
                dst[write + 1] = (-0.5f32).mul_add(h, cy);
                dst[write + 2] = w;
                dst[write + 3] = h;

                let k = &kps[idx * 10..idx * 10 + 10];
                for lm in 0..5 {
                    dst[write + 4 + lm * 2] = (k[lm * 2] + col as f32) * stride_f;
                    dst[write + 5 + lm * 2] = (k[lm * 2 + 1] + row as f32) * stride_f;
                }

                dst[write + 14] = score;
            }
        }
    }

    let rows = fused.len() / DETECTION_COLS;
    Tensor::from_shape(&[rows, DETECTION_COLS], &fused)
        .map_err(|e| anyhow::anyhow!("failed to build fused YuNet tensor: {e}"))
}

fn stride_output<'a>(
    outputs: &'a [Tensor],
    index: usize,
    name: &str,
    expected: usize,
) -> Result<&'a [f32]> {
    let slice = outputs[index]
        .as_slice::<f32>()
        .map_err(|e| anyhow::anyhow!("{name} output not f32: {e}"))?;
    anyhow::ensure!(
        slice.len() == expected,
        "{name} length mismatch: expected {expected}, got {}",
        slice.len()
    );
    Ok(slice)
}

fn align_to(value: usize, divisor: usize) -> usize {
    value.div_ceil(divisor) * divisor
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn mock_outputs(input_size: InputSize, hot_cell: usize) -> Vec<Tensor> {
        let input_w = align_to(input_size.width as usize, 32);
        let input_h = align_to(input_size.height as usize, 32);
        let mut cls_tensors = Vec::new();
        let mut obj_tensors = Vec::new();
        let mut bbox_tensors = Vec::new();
        let mut kps_tensors = Vec::new();

        for (stride_index, &stride) in STRIDES.iter().enumerate() {
            let cell_count = (input_w / stride) * (input_h / stride);
            let mut cls = vec![0.0f32; cell_count];
            let mut obj = vec![0.0f32; cell_count];
            if stride_index == 0 {
                cls[hot_cell] = 0.81;
                obj[hot_cell] = 1.0;
            }
            cls_tensors.push(Tensor::from_shape(&[cell_count], &cls).unwrap());
            obj_tensors.push(Tensor::from_shape(&[cell_count], &obj).unwrap());
            bbox_tensors
                .push(Tensor::from_shape(&[cell_count, 4], &vec![0.0f32; cell_count * 4]).unwrap());
            kps_tensors.push(
                Tensor::from_shape(&[cell_count, 10], &vec![0.5f32; cell_count * 10]).unwrap(),
            );
        }

        cls_tensors
            .into_iter()
            .chain(obj_tensors)
            .chain(bbox_tensors)
            .chain(kps_tensors)
            .collect()
    }

    #[test]
    fn loading_missing_model_fails() {
        let err = OnnxModel::load("missing.onnx", "detector").expect_err("missing file");
        assert!(format!("{err}").contains("detector model file not found"));
    }

    #[test]
    fn invalid_model_produces_useful_error() {
        let mut temp = NamedTempFile::new().expect("temp file");
        temp.write_all(b"not a real onnx file")
            .expect("write mock model");

        let err = YuNetModel::load(temp.path()).expect_err("invalid ONNX should fail");
        let message = format!("{err:#}");
        assert!(
            message.contains("failed to parse ONNX") || message.contains("unable to optimize"),
            "Unexpected error message: {message}"
        );
    }

    #[test]
    fn decodes_multi_stride_outputs() {
        let input_size = InputSize::new(64, 64);
        // Row 1, column 2 of the stride-8 grid.
        let hot_cell = 8 + 2;
        let tensors = mock_outputs(input_size, hot_cell);

        let fused = decode_yunet_outputs(&tensors, input_size).expect("decode");
        let cells = 8 * 8 + 4 * 4 + 2 * 2;
        assert_eq!(fused.shape(), &[cells, DETECTION_COLS]);

        let data = fused.as_slice::<f32>().expect("f32");
        let row = &data[hot_cell * DETECTION_COLS..(hot_cell + 1) * DETECTION_COLS];
        assert!((row[14] - 0.9).abs() < 1e-6);
        // Zero offsets put the box center on the cell origin with one-stride extent.
        assert_eq!(&row[0..4], &[12.0, 4.0, 8.0, 8.0]);
        assert_eq!(&row[4..6], &[20.0, 12.0]);

        let cold = &data[0..DETECTION_COLS];
        assert_eq!(cold[14], 0.0);
    }

    #[test]
    fn decode_rejects_wrong_tensor_count() {
        let input_size = InputSize::new(32, 32);
        let mut tensors = mock_outputs(input_size, 0);
        tensors.pop();
        assert!(decode_yunet_outputs(&tensors, input_size).is_err());
    }
}
