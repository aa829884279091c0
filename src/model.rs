// 该文件是 Haochi （皓齿明眸） 项目的一部分。
// src/model.rs - 模型定义与检测解码
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use tracing::debug;

use crate::letterbox::Letterbox;

pub trait Model {
  type Input;
  type Output;
  type Error;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error>;
}

pub trait WithLabel: Sized + std::fmt::Debug {
  fn from_label_id(id: i32) -> Self;
  fn to_label_id(&self) -> i32;
  fn to_label_str(&self) -> String;
  fn color_bgr(&self) -> [u8; 3];
}

/// 口腔检测类别
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DentalLabel {
  Caries,
  Cavity,
  Crack,
  Tooth,
  /// 表外类别，保留原始编号
  Unknown(i32),
}

impl WithLabel for DentalLabel {
  fn from_label_id(id: i32) -> Self {
    match id {
      0 => DentalLabel::Caries,
      1 => DentalLabel::Cavity,
      2 => DentalLabel::Crack,
      3 => DentalLabel::Tooth,
      other => DentalLabel::Unknown(other),
    }
  }

  fn to_label_id(&self) -> i32 {
    match self {
      DentalLabel::Caries => 0,
      DentalLabel::Cavity => 1,
      DentalLabel::Crack => 2,
      DentalLabel::Tooth => 3,
      DentalLabel::Unknown(id) => *id,
    }
  }

  fn to_label_str(&self) -> String {
    match self {
      DentalLabel::Caries => "Caries".to_string(),
      DentalLabel::Cavity => "Cavity".to_string(),
      DentalLabel::Crack => "Crack".to_string(),
      DentalLabel::Tooth => "Tooth".to_string(),
      DentalLabel::Unknown(id) => id.to_string(),
    }
  }

  // 类别颜色（BGR）：龋齿红、龋洞黄、裂纹橙、牙齿绿，表外类别青色
  fn color_bgr(&self) -> [u8; 3] {
    match self {
      DentalLabel::Caries => [0, 0, 255],
      DentalLabel::Cavity => [0, 255, 255],
      DentalLabel::Crack => [0, 165, 255],
      DentalLabel::Tooth => [0, 255, 0],
      DentalLabel::Unknown(_) => [255, 255, 0],
    }
  }
}

#[derive(Debug, Clone)]
pub struct DetectItem<T> {
  pub kind: T,
  pub score: f32,
  pub bbox: [f32; 4], // [x, y, w, h] 源图像素坐标，宽高不做钳制
}

#[derive(Debug, Clone)]
pub struct DetectResult<T> {
  pub items: Box<[DetectItem<T>]>,
}

/// 每行检测的字段数: x1, y1, x2, y2, score, class
pub const DETECTION_FIELDS: usize = 6;

/// 模型原始输出，形状 `[1, N, 6]`，N 由模型固定而非随输入变化。
#[derive(Debug, Clone)]
pub struct RawOutput {
  data: Box<[f32]>,
  rows: usize,
}

impl RawOutput {
  pub fn new(rows: usize, data: Vec<f32>) -> Self {
    if data.len() != rows * DETECTION_FIELDS {
      panic!(
        "输出张量长度不匹配: 期望长度 {}, 实际长度 {}",
        rows * DETECTION_FIELDS,
        data.len()
      );
    }

    Self {
      data: data.into_boxed_slice(),
      rows,
    }
  }

  pub fn rows(&self) -> impl Iterator<Item = &[f32]> {
    self.data.chunks_exact(DETECTION_FIELDS)
  }

  pub fn len(&self) -> usize {
    self.rows
  }

  pub fn is_empty(&self) -> bool {
    self.rows == 0
  }
}

/// 逐行解码模型输出：角点先各自撤销信箱变换，再组装为宽高形式。
/// 分数门限为 `> 0`，仅过滤空行；类别编号截断取整后查表，
/// 表外编号退化为数字标签。不做跨框去重。
pub fn decode_detections(raw: &RawOutput, letterbox: &Letterbox) -> DetectResult<DentalLabel> {
  let mut items = Vec::new();

  for row in raw.rows() {
    let (x1, y1) = letterbox.unmap(row[0], row[1]);
    let (x2, y2) = letterbox.unmap(row[2], row[3]);
    let score = row[4];

    if score <= 0.0 {
      continue;
    }

    let kind = DentalLabel::from_label_id(row[5] as i32);
    items.push(DetectItem {
      kind,
      score,
      bbox: [x1, y1, x2 - x1, y2 - y1],
    });
  }

  debug!("解码出 {} 个检测结果", items.len());

  DetectResult {
    items: items.into_boxed_slice(),
  }
}

mod onnx;
pub use self::onnx::{InferenceError, OnnxDetector, OnnxDetectorBuilder};
