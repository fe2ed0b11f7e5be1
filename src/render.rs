use log::error;

use crate::screen::Screen;

/// 解码器每次回调输出的一块像素 (MCU)
///
/// `pixels` 按行存放 `width * height` 个 RGB565 值，只在回调期间有效。
#[derive(Debug)]
pub struct DecodedBlock<'a> {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
    pub pixels: &'a [u16],
}

/// 接收解码输出，返回 false 时解码器停止输出后续像素块
pub trait BlockSink {
    fn accept(&mut self, block: &DecodedBlock<'_>) -> bool;
}

/// 把像素块直接画到屏幕上
pub struct BlockRenderer<'a, S: ?Sized> {
    screen: &'a mut S,
    blocks: usize,
}

impl<'a, S: Screen + ?Sized> BlockRenderer<'a, S> {
    pub fn new(screen: &'a mut S) -> Self {
        Self { screen, blocks: 0 }
    }

    /// 已经绘制的像素块数
    pub fn blocks(&self) -> usize {
        self.blocks
    }
}

impl<'a, S: Screen + ?Sized> BlockSink for BlockRenderer<'a, S> {
    fn accept(&mut self, block: &DecodedBlock<'_>) -> bool {
        // 图片已经超出屏幕底部，不再解码
        if block.y >= self.screen.height() as i32 {
            return false;
        }
        if let Err(err) = self.screen.push_image(
            block.x,
            block.y,
            block.width,
            block.height,
            block.pixels,
        ) {
            error!("block ({},{}) {}x{}: {err:?}", block.x, block.y, block.width, block.height);
        }
        self.blocks += 1;
        true
    }
}
