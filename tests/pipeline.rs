// 该文件是 Haochi （皓齿明眸） 项目的一部分。
// tests/pipeline.rs - 流水线集成测试
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::convert::Infallible;
use std::io::Cursor;

use base64::{Engine, engine::general_purpose::STANDARD};

use haochi::{
  frame::RgbChwTensor,
  model::{Model, RawOutput, WithLabel},
  pipeline::{DetectPipeline, PipelineError},
};

/// 返回固定检测行的桩模型
struct StubModel {
  rows: Vec<[f32; 6]>,
}

impl Model for StubModel {
  type Input = RgbChwTensor;
  type Output = RawOutput;
  type Error = Infallible;

  fn infer(&self, input: &Self::Input) -> Result<Self::Output, Self::Error> {
    assert_eq!(input.shape(), [1, 3, 640, 640]);
    Ok(RawOutput::new(self.rows.len(), self.rows.concat()))
  }
}

fn png_bytes(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
  let image = image::RgbImage::from_pixel(width, height, image::Rgb(rgb));
  let mut bytes = Vec::new();
  image
    .write_to(&mut Cursor::new(&mut bytes), image::ImageFormat::Png)
    .unwrap();
  bytes
}

#[test]
fn detection_maps_back_to_source_space() {
  // 100x50 源图: scale = 6.4, padW = 0, padH = 160
  let pipeline = DetectPipeline::new(StubModel {
    rows: vec![[310.0, 310.0, 330.0, 330.0, 0.9, 0.0]],
  });
  let bytes = png_bytes(100, 50, [40, 90, 200]);

  let (frame, result) = pipeline.detect(&bytes).unwrap();

  assert_eq!(frame.width(), 100);
  assert_eq!(frame.height(), 50);
  assert_eq!(result.items.len(), 1);

  let item = &result.items[0];
  assert_eq!(item.kind.to_label_str(), "Caries");
  assert!((item.score - 0.9).abs() < 1e-6);

  let bbox = item.bbox;
  assert!((bbox[0] - 48.4375).abs() < 1e-3, "x: {}", bbox[0]);
  assert!((bbox[1] - 23.4375).abs() < 1e-3, "y: {}", bbox[1]);
  assert!((bbox[2] - 3.125).abs() < 1e-3, "w: {}", bbox[2]);
  assert!((bbox[3] - 3.125).abs() < 1e-3, "h: {}", bbox[3]);
}

#[test]
fn annotation_only_touches_box_neighborhood() {
  let pipeline = DetectPipeline::new(StubModel {
    rows: vec![[310.0, 310.0, 330.0, 330.0, 0.9, 0.0]],
  });
  let bytes = png_bytes(100, 50, [40, 90, 200]);

  let (mut frame, result) = pipeline.detect(&bytes).unwrap();
  let before = frame.clone();
  let jpeg = pipeline.annotate(&mut frame, &result).unwrap();
  assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);

  // 改动只应落在边框与标签的邻域内（框在 (48, 23)-(51, 26) 附近，标签画在其上方）
  let mut changed = 0usize;
  for y in 0..50u32 {
    for x in 0..100u32 {
      if frame.pixel(x, y) != before.pixel(x, y) {
        changed += 1;
        assert!(
          x >= 40 && y >= 5 && y <= 35,
          "邻域外的像素被改动: ({}, {})",
          x,
          y
        );
      }
    }
  }
  assert!(changed > 0);
}

#[test]
fn zero_score_rows_leave_frame_untouched() {
  let pipeline = DetectPipeline::new(StubModel {
    rows: vec![[10.0, 10.0, 20.0, 20.0, 0.0, 0.0]],
  });
  let bytes = png_bytes(64, 64, [1, 2, 3]);

  let (mut frame, result) = pipeline.detect(&bytes).unwrap();
  assert!(result.items.is_empty());

  let before = frame.clone();
  pipeline.annotate(&mut frame, &result).unwrap();
  for y in 0..64u32 {
    for x in 0..64u32 {
      assert_eq!(frame.pixel(x, y), before.pixel(x, y));
    }
  }
}

#[test]
fn base64_boundary_round_trips_to_jpeg() {
  let pipeline = DetectPipeline::new(StubModel {
    rows: vec![[320.0, 320.0, 340.0, 335.0, 0.7, 2.0]],
  });
  let payload = STANDARD.encode(png_bytes(64, 64, [10, 20, 30]));

  let out = pipeline.detect_annotate_base64(&payload).unwrap();

  let jpeg = STANDARD.decode(out).unwrap();
  assert_eq!(&jpeg[..2], &[0xFF, 0xD8]);
}

#[test]
fn invalid_base64_is_rejected() {
  let pipeline = DetectPipeline::new(StubModel { rows: vec![] });
  let result = pipeline.detect_annotate_base64("这不是 base64!");
  assert!(matches!(result, Err(PipelineError::Base64(_))));
}

#[test]
fn undecodable_image_is_rejected() {
  let pipeline = DetectPipeline::new(StubModel { rows: vec![] });
  let payload = STANDARD.encode([0u8, 1, 2, 3, 4, 5, 6, 7]);
  let result = pipeline.detect_annotate_base64(&payload);
  assert!(matches!(result, Err(PipelineError::Codec(_))));
}
