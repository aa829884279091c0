// 该文件是 Haochi （皓齿明眸） 项目的一部分。
// src/codec.rs - 图像编解码适配
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

use std::io::Cursor;

use image::{ImageFormat, ImageReader};
use thiserror::Error;
use tracing::debug;

use crate::frame::BgrFrame;

#[derive(Error, Debug)]
pub enum CodecError {
  #[error("图像解码错误: {0}")]
  Decode(image::ImageError),
  #[error("图像编码错误: {0}")]
  Encode(image::ImageError),
}

/// 将编码后的图像字节解码为 BGR 栅格帧。
/// 格式由字节内容推断，损坏或不支持的输入返回 [`CodecError::Decode`]。
pub fn decode(bytes: &[u8]) -> Result<BgrFrame, CodecError> {
  let image = ImageReader::new(Cursor::new(bytes))
    .with_guessed_format()
    .map_err(|e| CodecError::Decode(image::ImageError::IoError(e)))?
    .decode()
    .map_err(CodecError::Decode)?
    .to_rgb8();

  debug!("解码图像: {}x{}", image.width(), image.height());

  Ok(BgrFrame::from(&image))
}

/// 将栅格帧编码为 JPEG 字节，输出体积有界，质量不可配置。
pub fn encode_jpeg(frame: &BgrFrame) -> Result<Vec<u8>, CodecError> {
  let image = frame.to_rgb_image();
  let mut bytes = Vec::new();
  image
    .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Jpeg)
    .map_err(CodecError::Encode)?;
  Ok(bytes)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn png_bytes(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    let image = image::RgbImage::from_pixel(width, height, image::Rgb(rgb));
    let mut bytes = Vec::new();
    image
      .write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)
      .unwrap();
    bytes
  }

  #[test]
  fn decode_yields_bgr_pixels() {
    let bytes = png_bytes(3, 2, [255, 0, 0]);
    let frame = decode(&bytes).unwrap();
    assert_eq!(frame.width(), 3);
    assert_eq!(frame.height(), 2);
    // 红色像素在帧内以 BGR 顺序存储
    assert_eq!(frame.pixel(0, 0), [0, 0, 255]);
  }

  #[test]
  fn decode_rejects_garbage() {
    let result = decode(&[0u8, 1, 2, 3, 4, 5, 6, 7]);
    assert!(matches!(result, Err(CodecError::Decode(_))));
  }

  #[test]
  fn decode_rejects_truncated_payload() {
    let mut bytes = png_bytes(16, 16, [10, 20, 30]);
    bytes.truncate(bytes.len() / 2);
    assert!(decode(&bytes).is_err());
  }

  #[test]
  fn encode_emits_jpeg_magic() {
    let frame = BgrFrame::filled(4, 4, [1, 2, 3]);
    let bytes = encode_jpeg(&frame).unwrap();
    assert_eq!(&bytes[..2], &[0xFF, 0xD8]);
  }
}
