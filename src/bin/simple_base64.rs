// 该文件是 Haochi （皓齿明眸） 项目的一部分。
// src/bin/simple_base64.rs - Base64 输入输出的检测标注代码
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::io::Read;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use url::Url;

use haochi::{FromUrl, model::OnnxDetectorBuilder, pipeline::DetectPipeline};
use tracing::info;

/// Haochi 项目参数配置
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// ONNX 模型文件路径（onnx:///path/to/best.onnx）
  #[arg(long, value_name = "MODEL")]
  pub model: Url,
  /// Base64 输入文件，缺省从标准输入读取
  #[arg(long, value_name = "INPUT")]
  pub input: Option<PathBuf>,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("模型文件路径: {}", args.model);

  let payload = match &args.input {
    Some(path) => std::fs::read_to_string(path)?,
    None => {
      let mut buffer = String::new();
      std::io::stdin().read_to_string(&mut buffer)?;
      buffer
    }
  };

  let model = OnnxDetectorBuilder::from_url(&args.model)?.build()?;
  let pipeline = DetectPipeline::new(model);

  info!("开始推理...");
  let now = std::time::Instant::now();
  let annotated = pipeline.detect_annotate_base64(payload.trim())?;
  info!("推理完成，耗时: {:.2?}", now.elapsed());

  println!("{}", annotated);

  Ok(())
}
