use anyhow::{anyhow, Result};
use embedded_graphics::pixelcolor::{raw::RawU16, Rgb565};

macro_rules! generate_lut {
    ($name:ident, $factor:expr, $shift:expr) => {
        const $name: [u16; 256] = {
            let mut lut = [0u16; 256];
            let mut i = 0;
            while i < 256 {
                lut[i] = ((i as u16 * $factor) / 255) << $shift;
                i += 1;
            }
            lut
        };
    };
}

generate_lut!(RGB565_R_LUT, 31, 11); // 红色：5位，左移11位
generate_lut!(RGB565_G_LUT, 63, 5); // 绿色：6位，左移5位
generate_lut!(RGB565_B_LUT, 31, 0); // 蓝色：5位，不移位

#[inline(always)]
pub fn rgb888_to_rgb565(r: u8, g: u8, b: u8) -> u16 {
    RGB565_R_LUT[r as usize] | RGB565_G_LUT[g as usize] | RGB565_B_LUT[b as usize]
}

/// 解析 css 颜色 ("red", "#00ff00", "rgb(0,0,255)")
pub fn parse_color(value: &str) -> Result<Rgb565> {
    let [r, g, b, _] = csscolorparser::parse(value)
        .map_err(|err| anyhow!("invalid color {value:?}: {err:?}"))?
        .to_rgba8();
    Ok(Rgb565::from(RawU16::new(rgb888_to_rgb565(r, g, b))))
}
