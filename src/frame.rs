// 该文件是 Haochi （皓齿明眸） 项目的一部分。
// src/frame.rs - BGR 栅格帧与 CHW 张量定义
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

use image::RgbImage;

pub const BGR_CHANNELS: usize = 3;

/// 行主序、逐像素交错存储的 8 位 BGR 栅格帧。
/// 编解码边界固定使用 BGR 通道顺序。
#[derive(Debug, Clone)]
pub struct BgrFrame {
  data: Box<[u8]>,
  width: u32,
  height: u32,
}

impl BgrFrame {
  pub fn from_raw(width: u32, height: u32, data: Vec<u8>) -> Self {
    let expected = BGR_CHANNELS * width as usize * height as usize;
    if data.len() != expected {
      panic!("数据长度不匹配: 期望长度 {}, 实际长度 {}", expected, data.len());
    }

    Self {
      data: data.into_boxed_slice(),
      width,
      height,
    }
  }

  pub fn filled(width: u32, height: u32, bgr: [u8; 3]) -> Self {
    let pixels = width as usize * height as usize;
    let mut data = Vec::with_capacity(pixels * BGR_CHANNELS);
    for _ in 0..pixels {
      data.extend_from_slice(&bgr);
    }
    Self::from_raw(width, height, data)
  }

  pub fn width(&self) -> u32 {
    self.width
  }

  pub fn height(&self) -> u32 {
    self.height
  }

  pub fn channels(&self) -> usize {
    BGR_CHANNELS
  }

  pub fn as_bytes(&self) -> &[u8] {
    &self.data
  }

  pub fn pixel(&self, x: u32, y: u32) -> [u8; 3] {
    let idx = (y as usize * self.width as usize + x as usize) * BGR_CHANNELS;
    [self.data[idx], self.data[idx + 1], self.data[idx + 2]]
  }

  pub fn put_pixel(&mut self, x: u32, y: u32, bgr: [u8; 3]) {
    let idx = (y as usize * self.width as usize + x as usize) * BGR_CHANNELS;
    self.data[idx..idx + BGR_CHANNELS].copy_from_slice(&bgr);
  }

  // 转为 RGB 图像，供绘制与编码使用
  pub fn to_rgb_image(&self) -> RgbImage {
    let mut data = vec![0u8; self.data.len()];
    for (dst, src) in data.chunks_exact_mut(3).zip(self.data.chunks_exact(3)) {
      dst[0] = src[2];
      dst[1] = src[1];
      dst[2] = src[0];
    }
    RgbImage::from_raw(self.width, self.height, data).expect("像素缓冲区长度不一致")
  }

  // 将同尺寸 RGB 图像写回帧缓冲区
  pub fn copy_from_rgb_image(&mut self, image: &RgbImage) {
    if image.width() != self.width || image.height() != self.height {
      panic!(
        "图像尺寸不匹配: 期望 {}x{}, 实际 {}x{}",
        self.width,
        self.height,
        image.width(),
        image.height()
      );
    }

    for (dst, src) in self.data.chunks_exact_mut(3).zip(image.as_raw().chunks_exact(3)) {
      dst[0] = src[2];
      dst[1] = src[1];
      dst[2] = src[0];
    }
  }
}

impl From<&RgbImage> for BgrFrame {
  fn from(image: &RgbImage) -> Self {
    let (width, height) = image.dimensions();
    let mut data = vec![0u8; (width * height) as usize * BGR_CHANNELS];

    for (dst, src) in data.chunks_exact_mut(3).zip(image.as_raw().chunks_exact(3)) {
      dst[0] = src[2];
      dst[1] = src[1];
      dst[2] = src[0];
    }

    BgrFrame::from_raw(width, height, data)
  }
}

/// 平面存储的 `[1, 3, H, W]` 浮点张量，通道顺序 R、G、B，取值归一化到 `[0, 1]`。
/// 仅作为一次推理的临时数据，由填充后的画布帧打包而来。
#[derive(Debug, Clone)]
pub struct RgbChwTensor {
  data: Box<[f32]>,
  width: u32,
  height: u32,
}

impl RgbChwTensor {
  /// 将 BGR 交错帧打包为 RGB 平面张量，每通道除以 255。
  pub fn pack(frame: &BgrFrame) -> Self {
    let width = frame.width() as usize;
    let height = frame.height() as usize;
    let plane = width * height;
    let mut data = vec![0f32; BGR_CHANNELS * plane];

    let bytes = frame.as_bytes();
    for y in 0..height {
      for x in 0..width {
        let idx = y * width + x;
        let src = idx * BGR_CHANNELS;
        data[idx] = bytes[src + 2] as f32 / 255.0; // R
        data[plane + idx] = bytes[src + 1] as f32 / 255.0; // G
        data[2 * plane + idx] = bytes[src] as f32 / 255.0; // B
      }
    }

    Self {
      data: data.into_boxed_slice(),
      width: frame.width(),
      height: frame.height(),
    }
  }

  pub fn shape(&self) -> [usize; 4] {
    [1, BGR_CHANNELS, self.height as usize, self.width as usize]
  }

  pub fn as_slice(&self) -> &[f32] {
    &self.data
  }

  pub fn at(&self, channel: usize, y: u32, x: u32) -> f32 {
    let plane = self.width as usize * self.height as usize;
    self.data[channel * plane + y as usize * self.width as usize + x as usize]
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn bgr_frame_round_trips_through_rgb_image() {
    let mut image = RgbImage::new(2, 1);
    image.put_pixel(0, 0, image::Rgb([255, 0, 0]));
    image.put_pixel(1, 0, image::Rgb([0, 128, 7]));

    let frame = BgrFrame::from(&image);
    assert_eq!(frame.pixel(0, 0), [0, 0, 255]);
    assert_eq!(frame.pixel(1, 0), [7, 128, 0]);

    let back = frame.to_rgb_image();
    assert_eq!(back.get_pixel(0, 0).0, [255, 0, 0]);
    assert_eq!(back.get_pixel(1, 0).0, [0, 128, 7]);
  }

  #[test]
  fn pack_swaps_channels_and_normalizes() {
    // 纯红像素（BGR 存储为 [0, 0, 255]）
    let mut frame = BgrFrame::filled(2, 2, [114, 114, 114]);
    frame.put_pixel(1, 0, [0, 0, 255]);

    let tensor = RgbChwTensor::pack(&frame);
    assert_eq!(tensor.shape(), [1, 3, 2, 2]);

    assert!((tensor.at(0, 0, 1) - 1.0).abs() < 1e-6);
    assert!(tensor.at(1, 0, 1).abs() < 1e-6);
    assert!(tensor.at(2, 0, 1).abs() < 1e-6);

    // 其余像素三个通道均为 114/255
    let gray = 114.0 / 255.0;
    for c in 0..3 {
      assert!((tensor.at(c, 1, 1) - gray).abs() < 1e-6);
    }
  }

  #[test]
  #[should_panic]
  fn from_raw_rejects_wrong_length() {
    let _ = BgrFrame::from_raw(2, 2, vec![0u8; 5]);
  }
}
