use core::convert::Infallible;

use embedded_graphics::{
    pixelcolor::Rgb565,
    prelude::*,
};

use crate::scale::Orientation;
use crate::screen::Panel;

/// 内存中的 RGB565 屏幕，主机运行和测试时代替 LCD
pub struct FrameBuffer {
    native: Size,
    orientation: Orientation,
    pixels: Vec<Rgb565>,
}

impl FrameBuffer {
    /// width/height 为竖屏 (Deg0) 时的尺寸
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            native: Size::new(width, height),
            orientation: Orientation::Portrait,
            pixels: vec![Rgb565::BLACK; width as usize * height as usize],
        }
    }

    /// 当前方向下 (x, y) 的颜色，超出屏幕返回 None
    pub fn pixel(&self, x: i32, y: i32) -> Option<Rgb565> {
        self.index(Point::new(x, y)).map(|i| self.pixels[i])
    }

    fn index(&self, point: Point) -> Option<usize> {
        let size = self.size();
        let (x, y) = (u32::try_from(point.x).ok()?, u32::try_from(point.y).ok()?);
        if x >= size.width || y >= size.height {
            return None;
        }
        Some(y as usize * size.width as usize + x as usize)
    }
}

impl OriginDimensions for FrameBuffer {
    fn size(&self) -> Size {
        match self.orientation {
            Orientation::Portrait => self.native,
            Orientation::Landscape => Size::new(self.native.height, self.native.width),
        }
    }
}

impl DrawTarget for FrameBuffer {
    type Color = Rgb565;
    type Error = Infallible;

    fn draw_iter<I>(&mut self, pixels: I) -> Result<(), Self::Error>
    where
        I: IntoIterator<Item = Pixel<Self::Color>>,
    {
        for Pixel(point, color) in pixels {
            if let Some(i) = self.index(point) {
                self.pixels[i] = color;
            }
        }
        Ok(())
    }
}

impl Panel for FrameBuffer {
    fn rotate_to(&mut self, orientation: Orientation) -> Result<(), Infallible> {
        self.orientation = orientation;
        Ok(())
    }
}
