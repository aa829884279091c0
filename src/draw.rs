// 该文件是 Haochi （皓齿明眸） 项目的一部分。
// src/draw.rs - 检测结果可视化
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, ETVP

use std::path::Path;

use ab_glyph::{FontRef, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_rect_mut, draw_text_mut};
use imageproc::rect::Rect;

use crate::{
  frame::BgrFrame,
  model::{DetectItem, DetectResult, WithLabel},
};

// 文本渲染常量
const LABEL_FONT_SIZE: f32 = 16.0;
const LABEL_TEXT_OFFSET: i32 = 12; // 文本绘制在框上方

pub struct Draw<'a> {
  font: FontRef<'a>,
  font_scale: PxScale,
}

impl Default for Draw<'_> {
  fn default() -> Self {
    let font_data = include_bytes!("../assets/DejaVuSans.ttf"); // default font
    let font = FontRef::try_from_slice(font_data).expect("无法加载嵌入的字体文件");

    Self {
      font,
      font_scale: PxScale::from(LABEL_FONT_SIZE),
    }
  }
}

impl Draw<'_> {
  /// 按解码顺序把每个检测的边框与标签画到原始帧上。
  pub fn draw_detections<T: WithLabel>(&self, frame: &mut BgrFrame, result: &DetectResult<T>) {
    let mut image = frame.to_rgb_image();
    for item in result.items.iter() {
      self.draw_item(&mut image, item);
    }
    frame.copy_from_rgb_image(&image);
  }

  fn draw_item<T: WithLabel>(&self, image: &mut RgbImage, item: &DetectItem<T>) {
    let [b, g, r] = item.kind.color_bgr();
    let color = Rgb([r, g, b]);

    let [x, y, w, h] = item.bbox;

    // 上游可能产生负宽高，按角点归一化后再绘制
    let (x0, x1) = if w < 0.0 { (x + w, x) } else { (x, x + w) };
    let (y0, y1) = if h < 0.0 { (y + h, y) } else { (y, y + h) };

    let width = image.width() as i32;
    let height = image.height() as i32;

    let x_min = (x0 as i32).clamp(0, width - 1);
    let y_min = (y0 as i32).clamp(0, height - 1);
    let x_max = (x1 as i32).clamp(0, width - 1);
    let y_max = (y1 as i32).clamp(0, height - 1);

    // 钳制后没有可画区域时跳过边框，标签照常绘制
    if x_min < x_max && y_min < y_max {
      let rect = Rect::at(x_min, y_min).of_size((x_max - x_min) as u32, (y_max - y_min) as u32);
      draw_hollow_rect_mut(image, rect, color);

      // 绘制第二个边框以加粗为 2 像素
      let inner_w = (x_max - x_min) as u32;
      let inner_h = (y_max - y_min) as u32;
      if inner_w > 2 && inner_h > 2 {
        let inner = Rect::at(x_min + 1, y_min + 1).of_size(inner_w - 2, inner_h - 2);
        draw_hollow_rect_mut(image, inner, color);
      }
    }

    let label = format!("{} {:.2}", item.kind.to_label_str(), item.score);
    let text_x = x_min.max(0);
    let text_y = (y_min - LABEL_TEXT_OFFSET).max(0);
    draw_text_mut(image, color, text_x, text_y, self.font_scale, &self.font, &label);
  }
}

/// 将检测结果逐行写入纯文本文件
pub struct Record {
  pub label_with_name: bool,
}

impl Record {
  pub fn record<T: WithLabel>(
    &self,
    result: &DetectResult<T>,
    path: &Path,
  ) -> Result<(), std::io::Error> {
    let mut records = Vec::new();
    for item in result.items.iter() {
      let name = if self.label_with_name {
        item.kind.to_label_str()
      } else {
        format!("{}", item.kind.to_label_id())
      };
      let record = format!(
        "{}, {:.4}, {:.1}, {:.1}, {:.1}, {:.1}",
        name, item.score, item.bbox[0], item.bbox[1], item.bbox[2], item.bbox[3]
      );
      records.push(record);
    }
    std::fs::write(path.with_extension("txt"), records.join("\n"))?;
    Ok(())
  }
}
