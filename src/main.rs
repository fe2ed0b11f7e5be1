#[cfg(target_os = "espidf")]
fn main() -> anyhow::Result<()> {
    esp_idf_svc::sys::link_patches();

    esp_idf_svc::log::EspLogger::initialize_default();

    jpeg_gallery::board::run()
}

/// 主机上运行: 解码目录中的图片到内存屏幕，只输出日志
#[cfg(not(target_os = "espidf"))]
fn main() -> anyhow::Result<()> {
    use std::path::Path;

    use env_logger::Env;
    use jpeg_gallery::{
        config::{read_config, GalleryConfig, CONFIG_FILE},
        framebuffer::FrameBuffer,
        DirStorage, Gallery, PanelScreen, Storage, TjpgDecoder,
    };
    use log::error;

    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let config_path = std::env::var("GALLERY_CONFIG").unwrap_or_else(|_| CONFIG_FILE.to_string());
    let config = match read_config(Path::new(&config_path)) {
        Err(err) => {
            error!("config read fail:{err:?}");
            GalleryConfig::default()
        }
        Ok(c) => c,
    };

    let mut storage = DirStorage::new(&config.root);
    storage.mount()?;

    let panel = FrameBuffer::new(
        config.display.width.get().into(),
        config.display.height.get().into(),
    );
    let screen = PanelScreen::with_config(panel, &config)?;
    let mut gallery = Gallery::new(screen, TjpgDecoder::new(), &config)?;
    gallery.begin()?;
    gallery.run(&storage, config.rescan)
}
