use std::{fs, num::NonZero, path::Path, time::Duration};

use anyhow::{anyhow, Result};
use log::debug;
use serde::{Deserialize, Serialize};

/// 配置文件名 (设备上放在图片目录中)
pub const CONFIG_FILE: &str = "gallery.json";

#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
pub enum DisplayColorOrder {
    /// RGB subpixel order.
    Rgb,
    /// BGR subpixel order.
    Bgr,
}

#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
#[serde(default)]
pub struct DisplayConfig {
    /// 竖屏时的宽度
    pub width: NonZero<u16>,
    /// 竖屏时的高度
    pub height: NonZero<u16>,
    pub x_offset: u16,
    pub y_offset: u16,
    pub color_inversion: bool,
    pub color_order: DisplayColorOrder,
}

const DEFAULT_WIDTH: NonZero<u16> = match NonZero::new(135) {
    Some(width) => width,
    None => panic!(),
};
const DEFAULT_HEIGHT: NonZero<u16> = match NonZero::new(240) {
    Some(height) => height,
    None => panic!(),
};

impl Default for DisplayConfig {
    /// M5StickC Plus: ST7789 135x240
    fn default() -> Self {
        Self {
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            x_offset: 52,
            y_offset: 40,
            color_inversion: true,
            color_order: DisplayColorOrder::Rgb,
        }
    }
}

#[derive(Serialize, Deserialize, PartialEq, Clone, Debug)]
#[serde(default)]
pub struct GalleryConfig {
    /// 图片目录 (设备上固定为 SPIFFS 挂载点)
    pub root: String,
    /// 文件名后缀，区分大小写
    pub extension: String,
    /// 每张图片显示后停留的时间
    pub pause_ms: u64,
    pub swap_bytes: bool,
    /// 目录扫描完毕后是否重新开始
    pub rescan: bool,
    /// 加载图片时的填充色
    pub placeholder_color: String,
    pub text_color: String,
    pub text_background: String,
    pub display: DisplayConfig,
}

impl Default for GalleryConfig {
    fn default() -> Self {
        Self {
            root: "/spiffs".to_string(),
            extension: ".jpg".to_string(),
            pause_ms: 2000,
            swap_bytes: false,
            rescan: true,
            placeholder_color: "red".to_string(),
            text_color: "white".to_string(),
            text_background: "black".to_string(),
            display: DisplayConfig::default(),
        }
    }
}

impl GalleryConfig {
    pub fn pause(&self) -> Duration {
        Duration::from_millis(self.pause_ms)
    }
}

pub fn parse_config(data: Vec<u8>) -> Result<GalleryConfig> {
    let data_str = String::from_utf8(data)?;
    let config = serde_json::from_str::<GalleryConfig>(&data_str)?;
    Ok(config)
}

pub fn read_config(path: &Path) -> Result<GalleryConfig> {
    if !path.exists() {
        return Err(anyhow!("no config! ({})", path.display()));
    }
    debug!("config {}", path.display());
    parse_config(fs::read(path)?)
}
