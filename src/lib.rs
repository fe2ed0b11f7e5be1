//! 扫描目录中的 JPEG 图片，按屏幕尺寸选择缩放比例，逐块解码到 LCD 并显示耗时。
//!
//! 所有硬件相关的部分都通过 trait 注入 (`Storage`, `ImageDecoder`, `Screen`)，
//! 设备上由 `board` 模块组装，主机上用目录和内存 [`framebuffer::FrameBuffer`] 运行。

pub mod color;
pub mod config;
pub mod decoder;
pub mod framebuffer;
pub mod gallery;
pub mod render;
pub mod scale;
pub mod screen;
pub mod storage;

#[cfg(target_os = "espidf")]
pub mod board;

pub use decoder::{DecodeOutcome, ImageDecoder, TjpgDecoder};
pub use gallery::{Gallery, ImageDescriptor, RenderReport};
pub use render::{BlockRenderer, BlockSink, DecodedBlock};
pub use scale::{select_scale, Orientation, ScaleFactor};
pub use screen::{Panel, PanelScreen, Screen};
pub use storage::{scan, DirStorage, Entry, JpegFiles, Storage};
