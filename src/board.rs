//! M5StickC Plus 硬件初始化: AXP192 电源、ST7789 屏幕、SPIFFS 文件系统

use std::{
    ffi::CString,
    path::{Path, PathBuf},
    ptr,
};

use anyhow::{anyhow, Result};
use esp_idf_hal::{
    delay::{Ets, FreeRtos, BLOCK},
    gpio::{AnyIOPin, Gpio13, Gpio15, Gpio18, Gpio23, Gpio5, Output, PinDriver},
    i2c::{I2cConfig, I2cDriver},
    peripherals::Peripherals,
    spi::{config, Dma, SpiDeviceDriver, SpiDriver, SpiDriverConfig, SPI2},
    units::FromValueType,
};
use esp_idf_sys::{esp, esp_vfs_spiffs_conf_t, esp_vfs_spiffs_register};
use log::{error, info};
use mipidsi::{
    interface::SpiInterface,
    models::ST7789,
    options::{ColorInversion, ColorOrder, Orientation as PanelOrientation, Rotation},
    Builder, Display,
};
use static_cell::StaticCell;

use crate::{
    config::{read_config, DisplayColorOrder, DisplayConfig, GalleryConfig, CONFIG_FILE},
    decoder::TjpgDecoder,
    gallery::Gallery,
    scale::Orientation,
    screen::{Panel, PanelScreen},
    storage::{DirEntries, DirStorage, Storage},
};

/// SPIFFS 挂载点，设备上固定使用这个目录
pub const SPIFFS_ROOT: &str = "/spiffs";

const AXP192_ADDR: u8 = 0x34;

pub type LcdDisplay = Display<
    SpiInterface<'static, SpiDeviceDriver<'static, SpiDriver<'static>>, PinDriver<'static, Gpio23, Output>>,
    ST7789,
    PinDriver<'static, Gpio18, Output>,
>;

pub struct DisplayPins {
    pub spi2: SPI2,
    pub sclk: Gpio13,
    pub sdo: Gpio15,
    pub cs: Gpio5,
    pub dc: Gpio23,
    pub rst: Gpio18,
}

impl Panel for LcdDisplay {
    fn rotate_to(&mut self, orientation: Orientation) -> Result<(), Self::Error> {
        let mut panel_orientation = PanelOrientation::new();
        panel_orientation.rotation = match orientation {
            Orientation::Portrait => Rotation::Deg0,
            Orientation::Landscape => Rotation::Deg90,
        };
        self.set_orientation(panel_orientation)
    }
}

/// 注册到 VFS 的 SPIFFS 分区
pub struct SpiffsStorage {
    inner: DirStorage,
}

impl SpiffsStorage {
    pub fn new() -> Self {
        Self { inner: DirStorage::new(SPIFFS_ROOT) }
    }
}

impl Default for SpiffsStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl Storage for SpiffsStorage {
    type Entries = DirEntries;

    fn mount(&mut self) -> Result<()> {
        let base_path = CString::new(SPIFFS_ROOT)?;
        let conf = esp_vfs_spiffs_conf_t {
            base_path: base_path.as_ptr(),
            partition_label: ptr::null(),
            max_files: 5,
            format_if_mount_failed: false,
        };
        esp!(unsafe { esp_vfs_spiffs_register(&conf) })?;
        self.inner.mount()
    }

    fn root(&self) -> &Path {
        self.inner.root()
    }

    fn open_root(&self) -> Result<DirEntries> {
        self.inner.open_root()
    }
}

/// 打开 LCD 背光 (LDO2) 以及其它电源
pub fn power_on(i2c: &mut I2cDriver<'_>) -> Result<()> {
    // LDO2/LDO3 = 3.0V
    i2c.write(AXP192_ADDR, &[0x28, 0xCC], BLOCK)?;
    let mut power = [0u8];
    i2c.write_read(AXP192_ADDR, &[0x12], &mut power, BLOCK)?;
    // EXTEN | LDO3 | LDO2 | DCDC1
    i2c.write(AXP192_ADDR, &[0x12, power[0] | 0x4D], BLOCK)?;
    Ok(())
}

pub fn init_display(pins: DisplayPins, display_config: &DisplayConfig) -> Result<LcdDisplay> {
    let config = config::Config::new().baudrate(40.MHz().into());

    let sdi_none: Option<AnyIOPin> = None;
    let spi_device = SpiDeviceDriver::new_single(
        pins.spi2,
        pins.sclk,
        pins.sdo,
        sdi_none,
        Some(pins.cs),
        &SpiDriverConfig {
            dma: Dma::Auto(4096),
            ..Default::default()
        },
        &config,
    )?;
    let dc = PinDriver::output(pins.dc)?;
    let rst = PinDriver::output(pins.rst)?;

    static SPI_BUFFER: StaticCell<[u8; 512]> = StaticCell::new();
    let di = SpiInterface::new(spi_device, dc, SPI_BUFFER.init([0u8; 512]));

    let color_inversion = if display_config.color_inversion {
        ColorInversion::Inverted
    } else {
        ColorInversion::Normal
    };
    let color_order = match display_config.color_order {
        DisplayColorOrder::Rgb => ColorOrder::Rgb,
        DisplayColorOrder::Bgr => ColorOrder::Bgr,
    };

    info!(
        "init display: {}x{} offset:({},{})",
        display_config.width, display_config.height, display_config.x_offset, display_config.y_offset
    );
    let display = Builder::new(ST7789, di)
        .color_order(color_order)
        .reset_pin(rst)
        .display_size(display_config.width.get(), display_config.height.get())
        .display_offset(display_config.x_offset, display_config.y_offset)
        .invert_colors(color_inversion)
        .init(&mut Ets)
        .map_err(|err| anyhow!("{err:?}"))?;
    Ok(display)
}

/// 无法继续运行时停在这里
pub fn halt(reason: &str) -> ! {
    error!("{reason}");
    idle()
}

pub fn idle() -> ! {
    loop {
        FreeRtos::delay_ms(1000);
    }
}

pub fn run() -> Result<()> {
    let peripherals = Peripherals::take()?;
    let pins = peripherals.pins;

    let mut storage = SpiffsStorage::new();
    if let Err(err) = storage.mount() {
        halt(&format!("SPIFFS initialisation failed! {err:?}"));
    }

    let config_path: PathBuf = storage.root().join(CONFIG_FILE);
    let config = match read_config(&config_path) {
        Err(err) => {
            error!("config read fail:{err:?}");
            GalleryConfig::default()
        }
        Ok(c) => c,
    };

    let mut i2c = I2cDriver::new(
        peripherals.i2c0,
        pins.gpio21,
        pins.gpio22,
        &I2cConfig::new().baudrate(400.kHz().into()),
    )?;
    power_on(&mut i2c)?;

    let display = init_display(
        DisplayPins {
            spi2: peripherals.spi2,
            sclk: pins.gpio13,
            sdo: pins.gpio15,
            cs: pins.gpio5,
            dc: pins.gpio23,
            rst: pins.gpio18,
        },
        &config.display,
    )?;

    let screen = PanelScreen::with_config(display, &config)?;
    let mut gallery = Gallery::new(screen, TjpgDecoder::new(), &config)?;
    gallery.begin()?;
    info!("Initialisation done.");

    if let Err(err) = gallery.run(&storage, config.rescan) {
        halt(&format!("gallery: {err:?}"));
    }
    idle()
}
