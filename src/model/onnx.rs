// 该文件是 Haochi （皓齿明眸） 项目的一部分。
// src/model/onnx.rs - onnxruntime 推理适配
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::path::PathBuf;
use std::sync::Mutex;

use ort::session::{Session, builder::GraphOptimizationLevel};
use ort::value::Tensor;
use thiserror::Error;
use tracing::{debug, error, info};
use url::Url;

use crate::{
  FromUrl,
  frame::RgbChwTensor,
  model::{DETECTION_FIELDS, Model, RawOutput},
};

const ONNX_NUM_INPUTS: usize = 1;
const ONNX_NUM_OUTPUTS: usize = 1;

const ONNX_SCHEME: &str = "onnx";

#[derive(Error, Debug)]
pub enum InferenceError {
  #[error("模型文件错误: {0}")]
  ModelFileError(std::io::Error),
  #[error("模型无效: {0}")]
  ModelInvalid(String),
  #[error("onnxruntime 错误: {0}")]
  OrtError(ort::Error),
  #[error("模型路径错误: {0}")]
  ModelPathError(String),
  #[error("输出形状错误: {0}")]
  OutputShapeError(String),
}

impl From<std::io::Error> for InferenceError {
  fn from(err: std::io::Error) -> Self {
    InferenceError::ModelFileError(err)
  }
}

impl From<ort::Error> for InferenceError {
  fn from(err: ort::Error) -> Self {
    InferenceError::OrtError(err)
  }
}

/// 持有一个常驻进程的 onnxruntime 会话。
/// `Session::run` 需要独占访问，并发调用经由互斥锁串行执行；
/// 单次调用阻塞当前线程直至推理结束，不提供取消与超时。
pub struct OnnxDetector {
  session: Mutex<Session>,
  input_name: String,
  output_name: String,
}

pub struct OnnxDetectorBuilder {
  model_path: PathBuf,
  intra_threads: Option<usize>,
}

impl FromUrl for OnnxDetectorBuilder {
  type Error = InferenceError;

  fn from_url(url: &Url) -> Result<Self, Self::Error> {
    if url.scheme() != ONNX_SCHEME {
      return Err(InferenceError::ModelPathError(format!(
        "模型路径必须使用 {} 方案",
        ONNX_SCHEME
      )));
    }

    Ok(OnnxDetectorBuilder {
      model_path: PathBuf::from(url.path()),
      intra_threads: None,
    })
  }
}

impl OnnxDetectorBuilder {
  pub fn from_path(path: impl Into<PathBuf>) -> Self {
    OnnxDetectorBuilder {
      model_path: path.into(),
      intra_threads: None,
    }
  }

  pub fn intra_threads(mut self, threads: usize) -> Self {
    self.intra_threads = Some(threads);
    self
  }

  pub fn build(self) -> Result<OnnxDetector, InferenceError> {
    info!("加载模型文件: {}", self.model_path.display());
    let metadata = std::fs::metadata(&self.model_path)?;
    debug!("模型文件大小: {:.2} MB", metadata.len() as f64 / (1024.0 * 1024.0));

    let mut builder = Session::builder()?.with_optimization_level(GraphOptimizationLevel::Level3)?;
    if let Some(threads) = self.intra_threads {
      builder = builder.with_intra_threads(threads)?;
    }

    info!("创建 onnxruntime 推理会话");
    let session = builder.commit_from_file(&self.model_path)?;

    if session.inputs.len() != ONNX_NUM_INPUTS {
      error!(
        "预期模型输入数量为 {}, 实际为 {}",
        ONNX_NUM_INPUTS,
        session.inputs.len()
      );
      return Err(InferenceError::ModelInvalid(format!(
        "预期模型输入数量为 {}, 实际为 {}",
        ONNX_NUM_INPUTS,
        session.inputs.len()
      )));
    }

    if session.outputs.len() != ONNX_NUM_OUTPUTS {
      error!(
        "预期模型输出数量为 {}, 实际为 {}",
        ONNX_NUM_OUTPUTS,
        session.outputs.len()
      );
      return Err(InferenceError::ModelInvalid(format!(
        "预期模型输出数量为 {}, 实际为 {}",
        ONNX_NUM_OUTPUTS,
        session.outputs.len()
      )));
    }

    let input_name = session.inputs[0].name.clone();
    let output_name = session.outputs[0].name.clone();
    debug!("模型输入: {}", input_name);
    debug!("模型输出: {}", output_name);
    info!("模型加载完成");

    Ok(OnnxDetector {
      session: Mutex::new(session),
      input_name,
      output_name,
    })
  }
}

impl Model for OnnxDetector {
  type Input = RgbChwTensor;
  type Output = RawOutput;
  type Error = InferenceError;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    debug!("设置模型输入");
    let shape = input.shape().map(|d| d as i64);
    let tensor = Tensor::from_array((shape, input.as_slice().to_vec()))?;

    debug!("执行模型推理");
    let mut session = self.session.lock().expect("推理会话互斥锁中毒");
    let outputs = session.run(ort::inputs![self.input_name.as_str() => tensor])?;

    debug!("获取模型输出");
    let value = outputs.get(self.output_name.as_str()).ok_or_else(|| {
      InferenceError::OutputShapeError(format!("未找到输出张量 {}", self.output_name))
    })?;
    let (shape, data) = value.try_extract_tensor::<f32>()?;

    if shape.len() != 3 || shape[0] != 1 || shape[2] != DETECTION_FIELDS as i64 {
      return Err(InferenceError::OutputShapeError(format!(
        "期望形状 [1, N, {}], 实际 {:?}",
        DETECTION_FIELDS, shape
      )));
    }

    Ok(RawOutput::new(shape[1] as usize, data.to_vec()))
  }
}
