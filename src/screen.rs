use core::fmt::Debug;

use anyhow::{anyhow, Result};
use embedded_graphics::{
    geometry::{OriginDimensions, Point, Size},
    mono_font::{ascii::FONT_5X8, MonoTextStyle, MonoTextStyleBuilder},
    pixelcolor::{raw::RawU16, Rgb565},
    prelude::*,
    primitives::Rectangle,
    text::{Baseline, Text},
};

use crate::color::parse_color;
use crate::config::GalleryConfig;
use crate::scale::Orientation;

/// 字幕字体高度 (FONT_5X8)
pub const CAPTION_HEIGHT: i32 = 8;

/// 图片浏览用到的屏幕操作
pub trait Screen {
    /// 当前方向下的宽高 (旋转之后宽高对调)
    fn size(&self) -> Size;

    fn fill(&mut self, color: Rgb565) -> Result<()>;

    fn set_orientation(&mut self, orientation: Orientation) -> Result<()>;

    /// 绘制一块 RGB565 像素，超出屏幕的部分被裁剪
    fn push_image(&mut self, x: i32, y: i32, width: u32, height: u32, pixels: &[u16]) -> Result<()>;

    /// 在 (x, y) 处绘制一行文字，y 为文字顶部
    fn draw_text(&mut self, x: i32, y: i32, text: &str) -> Result<()>;

    fn width(&self) -> u32 {
        self.size().width
    }

    fn height(&self) -> u32 {
        self.size().height
    }
}

/// 可以旋转的 RGB565 屏幕
pub trait Panel: DrawTarget<Color = Rgb565> + OriginDimensions {
    fn rotate_to(&mut self, orientation: Orientation) -> Result<(), Self::Error>;
}

/// 把任意 embedded-graphics 屏幕包装成 Screen
pub struct PanelScreen<P> {
    panel: P,
    text_style: MonoTextStyle<'static, Rgb565>,
}

impl<P: Panel> PanelScreen<P> {
    pub fn new(panel: P, text_color: Rgb565, text_background: Rgb565) -> Self {
        let text_style = MonoTextStyleBuilder::new()
            .font(&FONT_5X8)
            .text_color(text_color)
            .background_color(text_background)
            .build();
        Self { panel, text_style }
    }

    /// 字幕颜色取自配置
    pub fn with_config(panel: P, config: &GalleryConfig) -> Result<Self> {
        Ok(Self::new(
            panel,
            parse_color(&config.text_color)?,
            parse_color(&config.text_background)?,
        ))
    }

    pub fn panel(&self) -> &P {
        &self.panel
    }
}

impl<P> Screen for PanelScreen<P>
where
    P: Panel,
    P::Error: Debug,
{
    fn size(&self) -> Size {
        self.panel.size()
    }

    fn fill(&mut self, color: Rgb565) -> Result<()> {
        self.panel.clear(color).map_err(|err| anyhow!("fill error:{err:?}"))
    }

    fn set_orientation(&mut self, orientation: Orientation) -> Result<()> {
        self.panel
            .rotate_to(orientation)
            .map_err(|err| anyhow!("rotate error:{err:?}"))
    }

    fn push_image(&mut self, x: i32, y: i32, width: u32, height: u32, pixels: &[u16]) -> Result<()> {
        if pixels.len() != width as usize * height as usize {
            return Err(anyhow!("error: pixels.len() != width*height"));
        }
        let area = Rectangle::new(Point::new(x, y), Size::new(width, height));
        let colors = pixels.iter().map(|&p| Rgb565::from(RawU16::new(p)));
        self.panel
            .fill_contiguous(&area, colors)
            .map_err(|err| anyhow!("draw error:{err:?}"))
    }

    fn draw_text(&mut self, x: i32, y: i32, text: &str) -> Result<()> {
        Text::with_baseline(text, Point::new(x, y), self.text_style, Baseline::Top)
            .draw(&mut self.panel)
            .map_err(|err| anyhow!("text error:{err:?}"))?;
        Ok(())
    }
}
