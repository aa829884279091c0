// 该文件是 Haochi （皓齿明眸） 项目的一部分。
// src/pipeline.rs - 检测标注流水线
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::time::Instant;

use base64::{Engine, engine::general_purpose::STANDARD};
use thiserror::Error;
use tracing::debug;

use crate::{
  codec::{self, CodecError},
  draw::Draw,
  frame::{BgrFrame, RgbChwTensor},
  letterbox::{CANVAS_SIZE, Letterbox},
  model::{DentalLabel, DetectResult, Model, RawOutput, decode_detections},
};

#[derive(Error, Debug)]
pub enum PipelineError {
  #[error("图像编解码错误: {0}")]
  Codec(#[from] CodecError),
  #[error("推理错误: {0}")]
  Inference(#[source] Box<dyn std::error::Error + Send + Sync>),
  #[error("Base64 解码错误: {0}")]
  Base64(#[from] base64::DecodeError),
}

/// 单次调用顺序执行：解码 → 信箱变换 → 张量打包 → 推理 → 解码检测 → 标注 → 编码。
/// 除模型外不保留任何跨调用状态；整个流水线同步阻塞运行，失败即整体失败，
/// 不产生部分结果，也不做重试。
pub struct DetectPipeline<M> {
  model: M,
  draw: Draw<'static>,
  canvas_size: u32,
}

impl<M> DetectPipeline<M>
where
  M: Model<Input = RgbChwTensor, Output = RawOutput>,
  M::Error: std::error::Error + Send + Sync + 'static,
{
  pub fn new(model: M) -> Self {
    Self {
      model,
      draw: Draw::default(),
      canvas_size: CANVAS_SIZE,
    }
  }

  /// 解码图像并运行一次完整检测，返回未改动的原始帧与源图坐标下的检测结果。
  pub fn detect(
    &self,
    bytes: &[u8],
  ) -> Result<(BgrFrame, DetectResult<DentalLabel>), PipelineError> {
    let frame = codec::decode(bytes)?;

    let plan = Letterbox::plan(frame.width(), frame.height(), self.canvas_size);
    let canvas = plan.apply(&frame);
    let tensor = RgbChwTensor::pack(&canvas);

    let now = Instant::now();
    let raw = self
      .model
      .infer(&tensor)
      .map_err(|e| PipelineError::Inference(Box::new(e)))?;
    debug!("推理完成，耗时: {:.2?}", now.elapsed());

    let result = decode_detections(&raw, &plan);
    Ok((frame, result))
  }

  /// 把检测结果画到帧上并编码为 JPEG 字节。
  pub fn annotate(
    &self,
    frame: &mut BgrFrame,
    result: &DetectResult<DentalLabel>,
  ) -> Result<Vec<u8>, PipelineError> {
    self.draw.draw_detections(frame, result);
    Ok(codec::encode_jpeg(frame)?)
  }

  pub fn detect_annotate(&self, bytes: &[u8]) -> Result<Vec<u8>, PipelineError> {
    let (mut frame, result) = self.detect(bytes)?;
    self.annotate(&mut frame, &result)
  }

  /// Base64 入、Base64 出的边界操作，输出为标注后的 JPEG。
  pub fn detect_annotate_base64(&self, payload: &str) -> Result<String, PipelineError> {
    let bytes = STANDARD.decode(payload)?;
    let annotated = self.detect_annotate(&bytes)?;
    Ok(STANDARD.encode(annotated))
  }
}
