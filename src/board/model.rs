/// Stroke width in surface pixels. Fixed for every stroke.
pub const STROKE_WIDTH: u32 = 3;

/// Where results land when nothing has been drawn.
pub const DEFAULT_ANCHOR: Point = Point { x: 10.0, y: 200.0 };

pub const DEFAULT_STROKE_COLOR: Color = Color::rgba(255, 255, 255, 255);

pub const SWATCHES: [&str; 12] = [
    "#000000", "#ffffff", "#ee3333", "#e64980", "#be4bdb", "#893200", "#228be6", "#3333ee",
    "#40c057", "#00aa00", "#fab005", "#fd7e14",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Color {
    pub const BLACK: Self = Self::rgba(0, 0, 0, 255);
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn to_rgba_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Parse the CSS notations the palette is written in: `#rgb`, `#rrggbb`,
    /// `rgb(r, g, b)` and `rgba(r, g, b, a)` with `a` in `0.0..=1.0`.
    pub fn parse_css(value: &str) -> Option<Self> {
        let value = value.trim();
        if let Some(hex) = value.strip_prefix('#') {
            return parse_hex(hex);
        }
        let lower = value.to_ascii_lowercase();
        if let Some(args) = lower
            .strip_prefix("rgba(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let parts: Vec<&str> = args.split(',').map(str::trim).collect();
            let [r, g, b, a] = parts.as_slice() else {
                return None;
            };
            let alpha: f32 = a.parse().ok()?;
            if !(0.0..=1.0).contains(&alpha) {
                return None;
            }
            return Some(Self::rgba(
                r.parse().ok()?,
                g.parse().ok()?,
                b.parse().ok()?,
                (alpha * 255.0).round() as u8,
            ));
        }
        if let Some(args) = lower
            .strip_prefix("rgb(")
            .and_then(|rest| rest.strip_suffix(')'))
        {
            let parts: Vec<&str> = args.split(',').map(str::trim).collect();
            let [r, g, b] = parts.as_slice() else {
                return None;
            };
            return Some(Self::rgba(
                r.parse().ok()?,
                g.parse().ok()?,
                b.parse().ok()?,
                255,
            ));
        }
        None
    }
}

fn parse_hex(hex: &str) -> Option<Color> {
    if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    match hex.len() {
        3 => {
            let mut channels = [0u8; 3];
            for (slot, digit) in channels.iter_mut().zip(hex.chars()) {
                let value = digit.to_digit(16)? as u8;
                *slot = value * 16 + value;
            }
            Some(Color::rgba(channels[0], channels[1], channels[2], 255))
        }
        6 => Some(Color::rgba(
            u8::from_str_radix(&hex[0..2], 16).ok()?,
            u8::from_str_radix(&hex[2..4], 16).ok()?,
            u8::from_str_radix(&hex[4..6], 16).ok()?,
            255,
        )),
        _ => None,
    }
}

/// Palette entry at `index`, if any.
pub fn swatch(index: usize) -> Option<Color> {
    SWATCHES.get(index).and_then(|value| Color::parse_css(value))
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

/// Pixel extent of everything drawn on a surface, inclusive on both ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl BoundingBox {
    /// The box reported for a surface with no drawn pixels.
    pub fn sentinel(width: u32, height: u32) -> Self {
        Self {
            min_x: width,
            min_y: height,
            max_x: 0,
            max_y: 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.min_x > self.max_x || self.min_y > self.max_y
    }

    pub fn center(&self) -> Point {
        Point {
            x: (self.min_x as f32 + self.max_x as f32) / 2.0,
            y: (self.min_y as f32 + self.max_y as f32) / 2.0,
        }
    }

    pub fn contains(&self, x: u32, y: u32) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}
