use std::{
    fmt,
    path::Path,
    thread,
    time::{Duration, Instant},
};

use anyhow::Result;
use embedded_graphics::pixelcolor::Rgb565;
use log::{debug, error, info, warn};

use crate::{
    color::parse_color,
    config::GalleryConfig,
    decoder::{DecodeOutcome, ImageDecoder},
    render::BlockRenderer,
    scale::{select_scale, Orientation, ScaleFactor},
    screen::{Screen, CAPTION_HEIGHT},
    storage::{scan, Storage},
};

/// 解析文件头得到的图片信息，只在一次渲染中使用
#[derive(PartialEq, Eq, Clone, Debug)]
pub struct ImageDescriptor {
    pub name: String,
    pub width: u16,
    pub height: u16,
}

/// 一张图片的渲染结果，Display 输出即屏幕底部的字幕
#[derive(Clone, Debug)]
pub struct RenderReport {
    pub image: ImageDescriptor,
    pub scale: ScaleFactor,
    pub orientation: Orientation,
    pub elapsed: Duration,
    pub outcome: DecodeOutcome,
}

impl fmt::Display for RenderReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}x{} 1:{} {} ms",
            self.image.name,
            self.image.width,
            self.image.height,
            self.scale,
            self.elapsed.as_millis()
        )
    }
}

/// 目录中没有图片时两次扫描之间的最短间隔
const EMPTY_PASS_DELAY: Duration = Duration::from_millis(100);

/// 逐个解码并显示目录中的 JPEG 图片
pub struct Gallery<S, D> {
    screen: S,
    decoder: D,
    placeholder: Rgb565,
    background: Rgb565,
    pause: Duration,
    swap_bytes: bool,
    extension: String,
}

impl<S: Screen, D: ImageDecoder> Gallery<S, D> {
    pub fn new(screen: S, decoder: D, config: &GalleryConfig) -> Result<Self> {
        Ok(Self {
            screen,
            decoder,
            placeholder: parse_color(&config.placeholder_color)?,
            background: parse_color(&config.text_background)?,
            pause: config.pause(),
            swap_bytes: config.swap_bytes,
            extension: config.extension.clone(),
        })
    }

    pub fn screen(&self) -> &S {
        &self.screen
    }

    pub fn decoder(&self) -> &D {
        &self.decoder
    }

    /// 清屏并设置解码器
    pub fn begin(&mut self) -> Result<()> {
        self.screen.fill(self.background)?;
        self.decoder.set_scale(ScaleFactor::X1);
        self.decoder.set_swap_bytes(self.swap_bytes);
        Ok(())
    }

    /// 显示一张图片: 清屏 -> 读取尺寸 -> 旋转屏幕 -> 选择缩放 -> 解码 -> 字幕 -> 停留
    pub fn render_file(&mut self, name: &str, path: &Path) -> Result<RenderReport> {
        self.screen.fill(self.placeholder)?;

        let (width, height) = self.decoder.probe(path);
        let orientation = Orientation::for_image(width.into(), height.into());
        self.screen.set_orientation(orientation)?;

        let scale = select_scale(
            width.into(),
            height.into(),
            self.screen.width(),
            self.screen.height(),
        );
        self.decoder.set_scale(scale);

        let start = Instant::now();
        let mut renderer = BlockRenderer::new(&mut self.screen);
        let outcome = match self.decoder.decode(path, &mut renderer) {
            Ok(outcome) => outcome,
            Err(err) => {
                warn!("{err:?}");
                DecodeOutcome::Failed
            }
        };
        let blocks = renderer.blocks();
        let elapsed = start.elapsed();
        debug!("{name}: {blocks} blocks, {outcome:?}");

        let report = RenderReport {
            image: ImageDescriptor {
                name: name.to_string(),
                width,
                height,
            },
            scale,
            orientation,
            elapsed,
            outcome,
        };
        let caption = report.to_string();
        let caption_y = self.screen.height() as i32 - CAPTION_HEIGHT;
        self.screen.draw_text(0, caption_y, &caption)?;
        info!("{caption}");

        thread::sleep(self.pause);
        Ok(report)
    }

    /// 扫描一遍目录，返回显示的图片数
    pub fn run_pass<St: Storage>(&mut self, storage: &St) -> Result<usize> {
        let mut count = 0;
        for name in scan(storage, &self.extension)? {
            let path = storage.root().join(&name);
            match self.render_file(&name, &path) {
                Ok(_) => count += 1,
                Err(err) => error!("{name}: {err:?}"),
            }
        }
        Ok(count)
    }

    /// rescan 为 true 时反复扫描目录，否则扫描一遍后返回
    pub fn run<St: Storage>(&mut self, storage: &St, rescan: bool) -> Result<()> {
        loop {
            let count = self.run_pass(storage)?;
            if !rescan {
                return Ok(());
            }
            if count == 0 {
                thread::sleep(self.empty_pass_delay());
            }
        }
    }

    /// 目录中没有图片时等待一次停留时间，pause_ms 为 0 时也不空转
    fn empty_pass_delay(&self) -> Duration {
        self.pause.max(EMPTY_PASS_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{BlockSink, DecodedBlock};
    use crate::storage::Entry;
    use embedded_graphics::{geometry::Size, pixelcolor::RgbColor};

    #[derive(PartialEq, Debug, Clone)]
    enum Call {
        Fill(Rgb565),
        Orient(Orientation),
        Push(i32, i32, u32, u32),
        Text(i32, i32, String),
    }

    struct FakeScreen {
        orientation: Orientation,
        calls: Vec<Call>,
    }

    impl FakeScreen {
        fn new() -> Self {
            Self { orientation: Orientation::Portrait, calls: Vec::new() }
        }

        fn texts(&self) -> Vec<String> {
            self.calls
                .iter()
                .filter_map(|c| match c {
                    Call::Text(_, _, t) => Some(t.clone()),
                    _ => None,
                })
                .collect()
        }
    }

    impl Screen for FakeScreen {
        fn size(&self) -> Size {
            match self.orientation {
                Orientation::Portrait => Size::new(135, 240),
                Orientation::Landscape => Size::new(240, 135),
            }
        }

        fn fill(&mut self, color: Rgb565) -> Result<()> {
            self.calls.push(Call::Fill(color));
            Ok(())
        }

        fn set_orientation(&mut self, orientation: Orientation) -> Result<()> {
            self.orientation = orientation;
            self.calls.push(Call::Orient(orientation));
            Ok(())
        }

        fn push_image(&mut self, x: i32, y: i32, width: u32, height: u32, _pixels: &[u16]) -> Result<()> {
            self.calls.push(Call::Push(x, y, width, height));
            Ok(())
        }

        fn draw_text(&mut self, x: i32, y: i32, text: &str) -> Result<()> {
            self.calls.push(Call::Text(x, y, text.to_string()));
            Ok(())
        }
    }

    /// 按 16x16 的块从上到下输出 (已缩放) 图片
    struct FakeDecoder {
        size: (u16, u16),
        scale: ScaleFactor,
        swap: bool,
        fail: bool,
    }

    impl FakeDecoder {
        fn new(width: u16, height: u16) -> Self {
            Self { size: (width, height), scale: ScaleFactor::X1, swap: false, fail: false }
        }
    }

    impl ImageDecoder for FakeDecoder {
        fn probe(&mut self, _path: &Path) -> (u16, u16) {
            self.size
        }

        fn set_scale(&mut self, scale: ScaleFactor) {
            self.scale = scale;
        }

        fn set_swap_bytes(&mut self, swap: bool) {
            self.swap = swap;
        }

        fn decode(&mut self, _path: &Path, sink: &mut dyn BlockSink) -> Result<DecodeOutcome> {
            if self.fail {
                return Err(anyhow::anyhow!("broken"));
            }
            let d = self.scale.divisor();
            let (w, h) = (self.size.0 as u32 / d, self.size.1 as u32 / d);
            let pixels = [0u16; 256];
            for y in (0..h).step_by(16) {
                for x in (0..w).step_by(16) {
                    let block = DecodedBlock { x: x as i32, y: y as i32, width: 16, height: 16, pixels: &pixels };
                    if !sink.accept(&block) {
                        return Ok(DecodeOutcome::Stopped);
                    }
                }
            }
            Ok(DecodeOutcome::Complete)
        }
    }

    struct FakeStorage {
        entries: Vec<Entry>,
    }

    impl Storage for FakeStorage {
        type Entries = std::vec::IntoIter<Entry>;

        fn mount(&mut self) -> Result<()> {
            Ok(())
        }

        fn root(&self) -> &Path {
            Path::new("/spiffs")
        }

        fn open_root(&self) -> Result<Self::Entries> {
            Ok(self.entries.clone().into_iter())
        }
    }

    fn gallery(decoder: FakeDecoder) -> Gallery<FakeScreen, FakeDecoder> {
        let config = GalleryConfig { pause_ms: 0, ..Default::default() };
        Gallery::new(FakeScreen::new(), decoder, &config).unwrap()
    }

    fn is_caption(text: &str, prefix: &str) -> bool {
        let Some(rest) = text.strip_prefix(prefix) else {
            return false;
        };
        let Some(ms) = rest.strip_suffix(" ms") else {
            return false;
        };
        !ms.is_empty() && ms.chars().all(|c| c.is_ascii_digit())
    }

    #[test]
    fn small_image_renders_unscaled_with_caption() {
        let mut gallery = gallery(FakeDecoder::new(64, 48));
        let report = gallery.render_file("a.jpg", Path::new("/spiffs/a.jpg")).unwrap();

        assert_eq!(report.scale, ScaleFactor::X1);
        assert_eq!(report.orientation, Orientation::Landscape);
        assert_eq!(report.outcome, DecodeOutcome::Complete);
        assert!(is_caption(&report.to_string(), "a.jpg 64x48 1:1 "), "{report}");

        let calls = &gallery.screen().calls;
        assert_eq!(calls[0], Call::Fill(Rgb565::RED));
        assert_eq!(calls[1], Call::Orient(Orientation::Landscape));
        let pushes = calls.iter().filter(|c| matches!(c, Call::Push(..))).count();
        assert_eq!(pushes, 4 * 3);
        assert_eq!(gallery.screen().texts(), vec![report.to_string()]);
        assert!(matches!(calls.last(), Some(Call::Text(0, 127, _))));
    }

    #[test]
    fn tall_image_is_portrait_and_scaled() {
        let mut gallery = gallery(FakeDecoder::new(480, 640));
        let report = gallery.render_file("tall.jpg", Path::new("tall.jpg")).unwrap();
        assert_eq!(report.orientation, Orientation::Portrait);
        assert_eq!(report.scale, ScaleFactor::X4);
        assert_eq!(gallery.decoder().scale, ScaleFactor::X4);
        assert!(matches!(gallery.screen().calls.last(), Some(Call::Text(0, 232, _))));
    }

    #[test]
    fn overflowing_image_stops_at_bottom_edge() {
        // 1/8 之后仍然是 125x500，超出 240 的部分不再解码
        let mut gallery = gallery(FakeDecoder::new(1000, 4000));
        let report = gallery.render_file("strip.jpg", Path::new("strip.jpg")).unwrap();
        assert_eq!(report.scale, ScaleFactor::X8);
        assert_eq!(report.outcome, DecodeOutcome::Stopped);
        let max_y = gallery
            .screen()
            .calls
            .iter()
            .filter_map(|c| match c {
                Call::Push(_, y, _, _) => Some(*y),
                _ => None,
            })
            .max();
        assert_eq!(max_y, Some(224));
    }

    #[test]
    fn unreadable_header_still_reports() {
        let mut decoder = FakeDecoder::new(0, 0);
        decoder.fail = true;
        let mut gallery = gallery(decoder);
        let report = gallery.render_file("bad.jpg", Path::new("bad.jpg")).unwrap();
        assert_eq!(report.scale, ScaleFactor::X1);
        assert_eq!(report.orientation, Orientation::Portrait);
        assert_eq!(report.outcome, DecodeOutcome::Failed);
        assert!(is_caption(&report.to_string(), "bad.jpg 0x0 1:1 "));
    }

    #[test]
    fn begin_clears_and_configures_decoder() {
        let config = GalleryConfig { pause_ms: 0, swap_bytes: true, ..Default::default() };
        let mut gallery = Gallery::new(FakeScreen::new(), FakeDecoder::new(1, 1), &config).unwrap();
        gallery.begin().unwrap();
        assert_eq!(gallery.screen().calls, vec![Call::Fill(Rgb565::BLACK)]);
        assert!(gallery.decoder().swap);
    }

    #[test]
    fn pass_renders_matching_files_in_order() {
        let storage = FakeStorage {
            entries: vec![
                Entry::file("a.jpg"),
                Entry::file("b.png"),
                Entry::dir("sub"),
                Entry::file("C.JPG"),
                Entry::file("d.jpg"),
            ],
        };
        let mut gallery = gallery(FakeDecoder::new(64, 48));
        assert_eq!(gallery.run_pass(&storage).unwrap(), 2);
        let texts = gallery.screen().texts();
        assert_eq!(texts.len(), 2);
        assert!(texts[0].starts_with("a.jpg "));
        assert!(texts[1].starts_with("d.jpg "));
    }

    #[test]
    fn run_without_rescan_returns_after_one_pass() {
        let storage = FakeStorage { entries: vec![Entry::file("a.jpg")] };
        let mut gallery = gallery(FakeDecoder::new(64, 48));
        gallery.run(&storage, false).unwrap();
        assert_eq!(gallery.screen().texts().len(), 1);
    }

    #[test]
    fn empty_pass_delay_has_a_floor() {
        assert_eq!(gallery(FakeDecoder::new(1, 1)).empty_pass_delay(), EMPTY_PASS_DELAY);

        let config = GalleryConfig { pause_ms: 2000, ..Default::default() };
        let gallery = Gallery::new(FakeScreen::new(), FakeDecoder::new(1, 1), &config).unwrap();
        assert_eq!(gallery.empty_pass_delay(), Duration::from_millis(2000));
    }

    #[test]
    fn invalid_color_is_rejected() {
        let config = GalleryConfig { placeholder_color: "nope".to_string(), ..Default::default() };
        assert!(Gallery::new(FakeScreen::new(), FakeDecoder::new(1, 1), &config).is_err());
    }
}
