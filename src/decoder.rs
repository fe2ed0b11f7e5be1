use std::fs;
use std::path::Path;

use anyhow::{anyhow, Result};
use log::{debug, error, warn};
use tjpgd::{calculate_pool_size, JpegDecoder, MemoryPool};

use crate::color::rgb888_to_rgb565;
use crate::render::{BlockSink, DecodedBlock};
use crate::scale::ScaleFactor;

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum DecodeOutcome {
    /// 所有像素块都已输出
    Complete,
    /// BlockSink 要求停止
    Stopped,
    /// 文件无法读取或解码出错
    Failed,
}

/// JPEG 解码器
pub trait ImageDecoder {
    /// 只解析文件头得到原始宽高，失败时返回 (0, 0)
    fn probe(&mut self, path: &Path) -> (u16, u16);

    fn set_scale(&mut self, scale: ScaleFactor);

    /// 输出的 RGB565 是否交换高低字节
    fn set_swap_bytes(&mut self, swap: bool);

    /// 解码文件，每解出一块像素调用一次 sink
    fn decode(&mut self, path: &Path, sink: &mut dyn BlockSink) -> Result<DecodeOutcome>;
}

/// 基于 tjpgd (TJpgDec) 的解码器，内存池和工作缓冲区在多次解码之间复用
///
/// tjpgd 的 scale 参数只缩小输出矩形，像素仍是原始分辨率，
/// 所以始终按 1:1 解码，再在回调中把每个 MCU 块缩小。
pub struct TjpgDecoder {
    scale: ScaleFactor,
    swap_bytes: bool,
    pool: Vec<u8>,
    mcu_buffer: Vec<i16>,
    work_buffer: Vec<u8>,
    scaled: Vec<u8>,
    pixels: Vec<u16>,
}

impl TjpgDecoder {
    pub fn new() -> Self {
        Self {
            scale: ScaleFactor::X1,
            swap_bytes: false,
            // Huffman 快速查找表 (fast-decode-2) 所需的内存池
            pool: vec![0u8; calculate_pool_size(0, 0, true)],
            mcu_buffer: Vec::new(),
            work_buffer: Vec::new(),
            scaled: Vec::new(),
            pixels: Vec::new(),
        }
    }
}

impl Default for TjpgDecoder {
    fn default() -> Self {
        Self::new()
    }
}

fn prepare<'a>(data: &[u8], pool: &'a mut [u8]) -> Result<JpegDecoder<'a>> {
    let mut pool = MemoryPool::new(pool);
    let mut decoder = JpegDecoder::new();
    decoder.prepare(data, &mut pool).map_err(|err| anyhow!("{err:?}"))?;
    Ok(decoder)
}

/// width x height 的 RGB888 块缩小 2^shift 倍，每个输出像素取对应方格的平均值
fn downsample(rgb: &[u8], width: usize, height: usize, shift: u8, out: &mut Vec<u8>) {
    let cell = 1usize << shift;
    let area = (cell * cell) as u32;
    out.clear();
    for oy in 0..height >> shift {
        for ox in 0..width >> shift {
            let mut sum = [0u32; 3];
            for y in oy * cell..(oy + 1) * cell {
                let row = (y * width + ox * cell) * 3;
                for px in rgb[row..row + cell * 3].chunks_exact(3) {
                    sum[0] += px[0] as u32;
                    sum[1] += px[1] as u32;
                    sum[2] += px[2] as u32;
                }
            }
            out.extend(sum.map(|c| (c / area) as u8));
        }
    }
}

/// RGB888 像素块转换成 RGB565
fn convert_block(rgb: &[u8], swap_bytes: bool, out: &mut Vec<u16>) {
    out.clear();
    out.extend(rgb.chunks_exact(3).map(|px| {
        let pixel = rgb888_to_rgb565(px[0], px[1], px[2]);
        if swap_bytes {
            pixel.swap_bytes()
        } else {
            pixel
        }
    }));
}

impl ImageDecoder for TjpgDecoder {
    fn probe(&mut self, path: &Path) -> (u16, u16) {
        let data = match fs::read(path) {
            Ok(data) => data,
            Err(err) => {
                warn!("{}: {err:?}", path.display());
                return (0, 0);
            }
        };
        match prepare(&data, &mut self.pool) {
            Ok(decoder) => (decoder.width(), decoder.height()),
            Err(err) => {
                warn!("{}: jpg header error: {err:?}", path.display());
                (0, 0)
            }
        }
    }

    fn set_scale(&mut self, scale: ScaleFactor) {
        self.scale = scale;
    }

    fn set_swap_bytes(&mut self, swap: bool) {
        self.swap_bytes = swap;
    }

    fn decode(&mut self, path: &Path, sink: &mut dyn BlockSink) -> Result<DecodeOutcome> {
        let data = fs::read(path)?;

        let Self {
            scale,
            swap_bytes,
            pool,
            mcu_buffer,
            work_buffer,
            scaled,
            pixels,
        } = self;
        let mut decoder = prepare(&data, pool)?;
        mcu_buffer.resize(decoder.mcu_buffer_size(), 0);
        work_buffer.resize(decoder.work_buffer_size(), 0);

        let shift = scale.shift();
        let mut stopped = false;
        let result = decoder.decompress(
            &data,
            0,
            mcu_buffer,
            work_buffer,
            &mut |_decoder, rgb, rect| {
                let width = (rect.right - rect.left + 1) as usize;
                let height = (rect.bottom - rect.top + 1) as usize;
                let Some(rgb) = rgb.get(..width * height * 3) else {
                    error!("block {width}x{height} larger than work buffer ({})", rgb.len());
                    stopped = true;
                    return Ok(false);
                };
                // 缩小后不足一个像素的边缘块直接跳过
                let (out_width, out_height) = (width >> shift, height >> shift);
                if out_width == 0 || out_height == 0 {
                    return Ok(true);
                }
                let rgb: &[u8] = if shift == 0 {
                    rgb
                } else {
                    downsample(rgb, width, height, shift, scaled);
                    scaled.as_slice()
                };
                convert_block(rgb, *swap_bytes, pixels);
                let block = DecodedBlock {
                    x: (rect.left >> shift) as i32,
                    y: (rect.top >> shift) as i32,
                    width: out_width as u32,
                    height: out_height as u32,
                    pixels: pixels.as_slice(),
                };
                let next = sink.accept(&block);
                stopped = !next;
                Ok(next)
            },
        );

        match result {
            Ok(()) => Ok(DecodeOutcome::Complete),
            Err(tjpgd::Error::Interrupted) if stopped => {
                debug!("{}: decoding stopped by sink", path.display());
                Ok(DecodeOutcome::Stopped)
            }
            Err(err) => Err(anyhow!("{}: jpg decode error: {err:?}", path.display())),
        }
    }
}
