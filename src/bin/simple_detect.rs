// 该文件是 Haochi （皓齿明眸） 项目的一部分。
// src/bin/simple_detect.rs - 简单的图像检测标注代码
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use url::Url;

use haochi::{
  FromUrl,
  draw::Record,
  model::{OnnxDetectorBuilder, WithLabel},
  pipeline::DetectPipeline,
};
use tracing::info;

/// Haochi 项目参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// ONNX 模型文件路径（onnx:///path/to/best.onnx）
  #[arg(long, value_name = "MODEL")]
  pub model: Url,
  /// 输入图像文件
  #[arg(long, value_name = "INPUT")]
  pub input: PathBuf,
  /// 输出图像文件（JPEG）
  #[arg(long, value_name = "OUTPUT")]
  pub output: PathBuf,
  /// 检测结果记录文件（可选，纯文本）
  #[arg(long, value_name = "RECORD")]
  pub record: Option<PathBuf>,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("模型文件路径: {}", args.model);
  info!("输入图像: {}", args.input.display());
  info!("输出图像: {}", args.output.display());

  let model = OnnxDetectorBuilder::from_url(&args.model)?.build()?;
  let pipeline = DetectPipeline::new(model);

  let bytes = std::fs::read(&args.input)?;

  info!("开始推理...");
  let now = std::time::Instant::now();
  let (mut frame, result) = pipeline.detect(&bytes)?;
  info!("推理完成，耗时: {:.2?}", now.elapsed());

  info!("检测到 {} 个目标", result.items.len());
  for item in result.items.iter() {
    info!(
      "  - {}: {:.2}% at ({:.0}, {:.0}, {:.0}x{:.0})",
      item.kind.to_label_str(),
      item.score * 100.0,
      item.bbox[0],
      item.bbox[1],
      item.bbox[2],
      item.bbox[3]
    );
  }

  if let Some(record) = &args.record {
    Record { label_with_name: true }.record(&result, record)?;
    info!("保存检测记录到: {}", record.display());
  }

  let annotated = pipeline.annotate(&mut frame, &result)?;
  std::fs::write(&args.output, annotated)?;
  info!("保存标注图像到: {}", args.output.display());

  Ok(())
}
