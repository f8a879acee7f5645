/// Deterministic color for a region name via CRC32 hash.
/// Returns (r, g, b) from the first 3 bytes of the hash.
pub fn region_color(name: &str) -> (u8, u8, u8) {
    let hash = crc32fast::hash(name.as_bytes());
    let bytes = hash.to_be_bytes();
    (bytes[0], bytes[1], bytes[2])
}

/// Region color pushed into a pale, low-saturation band so outlines and
/// hover highlights stay readable on top of it.
pub fn soft_region_color(name: &str) -> (u8, u8, u8) {
    let hsl = Hsl::from_rgb(region_color(name));
    Hsl {
        s: hsl.s.clamp(0.35, 0.6),
        l: 0.82,
        ..hsl
    }
    .to_rgb()
}

/// Format RGB as a `#rrggbb` string.
pub fn hex_css(r: u8, g: u8, b: u8) -> String {
    format!("#{r:02x}{g:02x}{b:02x}")
}

/// Parse `#rgb` or `#rrggbb`.
pub fn parse_hex(s: &str) -> Option<(u8, u8, u8)> {
    let digits = s.strip_prefix('#')?;
    let channel = |i: usize, len: usize| u8::from_str_radix(digits.get(i..i + len)?, 16).ok();
    match digits.len() {
        6 => Some((channel(0, 2)?, channel(2, 2)?, channel(4, 2)?)),
        3 => {
            let (r, g, b) = (channel(0, 1)?, channel(1, 1)?, channel(2, 1)?);
            Some((r * 17, g * 17, b * 17))
        }
        _ => None,
    }
}

/// Blend two RGB colors through HSL space, taking the short way round the hue circle.
pub fn blend_rgb(from: (u8, u8, u8), to: (u8, u8, u8), t: f64) -> (u8, u8, u8) {
    Hsl::from_rgb(from)
        .mix(Hsl::from_rgb(to), t.clamp(0.0, 1.0))
        .to_rgb()
}

/// Hue in degrees `0..360`, saturation and lightness in `0..=1`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Hsl {
    h: f64,
    s: f64,
    l: f64,
}

impl Hsl {
    fn from_rgb((r, g, b): (u8, u8, u8)) -> Self {
        let [r, g, b] = [r, g, b].map(|c| f64::from(c) / 255.0);
        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let chroma = max - min;
        let l = (max + min) / 2.0;
        if chroma <= f64::EPSILON {
            return Self { h: 0.0, s: 0.0, l };
        }
        let s = chroma / (1.0 - (2.0 * l - 1.0).abs());
        // `max` is one of the channels exactly, so these comparisons are safe.
        let sector = if max == r {
            ((g - b) / chroma).rem_euclid(6.0)
        } else if max == g {
            (b - r) / chroma + 2.0
        } else {
            (r - g) / chroma + 4.0
        };
        Self { h: sector * 60.0, s, l }
    }

    fn to_rgb(self) -> (u8, u8, u8) {
        let chroma = (1.0 - (2.0 * self.l - 1.0).abs()) * self.s;
        let sector = self.h.rem_euclid(360.0) / 60.0;
        let x = chroma * (1.0 - (sector.rem_euclid(2.0) - 1.0).abs());
        let (r, g, b) = match sector as u8 {
            0 => (chroma, x, 0.0),
            1 => (x, chroma, 0.0),
            2 => (0.0, chroma, x),
            3 => (0.0, x, chroma),
            4 => (x, 0.0, chroma),
            _ => (chroma, 0.0, x),
        };
        let m = self.l - chroma / 2.0;
        let channel = |c: f64| ((c + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        (channel(r), channel(g), channel(b))
    }

    fn mix(self, to: Self, t: f64) -> Self {
        let dh = (to.h - self.h + 540.0).rem_euclid(360.0) - 180.0;
        Self {
            h: (self.h + dh * t).rem_euclid(360.0),
            s: self.s + (to.s - self.s) * t,
            l: self.l + (to.l - self.l) * t,
        }
    }
}
