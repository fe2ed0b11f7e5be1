use std::fmt;

/// JPEG 解码缩放比例 (1/1, 1/2, 1/4, 1/8)
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum ScaleFactor {
    X1,
    X2,
    X4,
    X8,
}

impl ScaleFactor {
    /// 从小到大排列的候选比例
    pub const ALL: [ScaleFactor; 4] = [
        ScaleFactor::X1,
        ScaleFactor::X2,
        ScaleFactor::X4,
        ScaleFactor::X8,
    ];

    pub fn divisor(self) -> u32 {
        1 << self.shift()
    }

    /// tjpgd 的 scale 参数 (0-3)
    pub fn shift(self) -> u8 {
        match self {
            ScaleFactor::X1 => 0,
            ScaleFactor::X2 => 1,
            ScaleFactor::X4 => 2,
            ScaleFactor::X8 => 3,
        }
    }
}

impl fmt::Display for ScaleFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.divisor())
    }
}

/// 选择能让图片完整显示的最小缩放比例，都放不下时返回 1/8 (超出部分由渲染时裁剪)
pub fn select_scale(
    image_width: u32,
    image_height: u32,
    display_width: u32,
    display_height: u32,
) -> ScaleFactor {
    ScaleFactor::ALL
        .into_iter()
        .find(|scale| {
            let s = scale.divisor();
            image_width <= display_width * s && image_height <= display_height * s
        })
        .unwrap_or(ScaleFactor::X8)
}

#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum Orientation {
    /// 竖屏 (Deg0)
    Portrait,
    /// 横屏 (Deg90)
    Landscape,
}

impl Orientation {
    /// 宽图横屏显示，其余竖屏
    pub fn for_image(width: u32, height: u32) -> Self {
        if width > height {
            Orientation::Landscape
        } else {
            Orientation::Portrait
        }
    }

    pub fn is_landscape(self) -> bool {
        self == Orientation::Landscape
    }
}
