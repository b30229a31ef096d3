use serde::{Deserialize, Serialize};

/// 8-bit RGB color as resolved by the compositor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const OFF: Rgb = Rgb::new(0, 0, 0);
    pub const WHITE: Rgb = Rgb::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    pub fn is_off(&self) -> bool {
        *self == Self::OFF
    }

    /// Linear blend towards `other`; `t` is clamped to [0, 1].
    pub fn lerp(self, other: Rgb, t: f64) -> Rgb {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
        Rgb::new(mix(self.r, other.r), mix(self.g, other.g), mix(self.b, other.b))
    }

    pub fn scale(self, factor: f64) -> Rgb {
        Rgb::OFF.lerp(self, factor)
    }

    /// CSS-style string for on-screen mirrors of the grid.
    pub fn to_rgba_string(&self, alpha: f32) -> String {
        format!(
            "rgba({}, {}, {}, {})",
            self.r,
            self.g,
            self.b,
            alpha.clamp(0.0, 1.0)
        )
    }

    fn distance_sq(&self, other: &Rgb) -> u32 {
        let d = |a: u8, b: u8| (a as i32 - b as i32).pow(2) as u32;
        d(self.r, other.r) + d(self.g, other.g) + d(self.b, other.b)
    }
}

/// One named palette color with its device-native encoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaletteEntry {
    pub name: String,
    pub rgb: Rgb,
    /// Velocity byte selecting this color on the controller.
    pub velocity: u8,
}

/// Named colors shared by the registry, the device sink and the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "Vec<PaletteEntry>", into = "Vec<PaletteEntry>")]
pub struct Palette {
    entries: Vec<PaletteEntry>,
}

impl From<Vec<PaletteEntry>> for Palette {
    fn from(entries: Vec<PaletteEntry>) -> Self {
        Self::new(entries)
    }
}

impl From<Palette> for Vec<PaletteEntry> {
    fn from(palette: Palette) -> Self {
        palette.entries
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self::launchpad()
    }
}

impl Palette {
    pub fn new(entries: Vec<PaletteEntry>) -> Self {
        let mut palette = Self { entries };
        if palette.entry("off").is_none() {
            palette.entries.insert(
                0,
                PaletteEntry {
                    name: "off".to_string(),
                    rgb: Rgb::OFF,
                    velocity: 0,
                },
            );
        }
        palette
    }

    /// The stock controller palette.
    pub fn launchpad() -> Self {
        let entry = |name: &str, rgb: Rgb, velocity: u8| PaletteEntry {
            name: name.to_string(),
            rgb,
            velocity,
        };
        Self::new(vec![
            entry("off", Rgb::OFF, 0),
            entry("white", Rgb::WHITE, 3),
            entry("red", Rgb::new(255, 0, 0), 5),
            entry("orange", Rgb::new(255, 96, 0), 9),
            entry("yellow", Rgb::new(255, 255, 0), 13),
            entry("green", Rgb::new(0, 255, 0), 21),
            entry("cyan", Rgb::new(0, 255, 255), 37),
            entry("blue", Rgb::new(0, 0, 255), 45),
            entry("purple", Rgb::new(128, 0, 255), 49),
            entry("pink", Rgb::new(255, 0, 128), 57),
        ])
    }

    pub fn entry(&self, name: &str) -> Option<&PaletteEntry> {
        self.entries.iter().find(|entry| entry.name == name)
    }

    /// Device-native velocity for a named color.
    pub fn lp_color(&self, name: &str) -> Option<u8> {
        self.entry(name).map(|entry| entry.velocity)
    }

    pub fn rgb(&self, name: &str) -> Option<Rgb> {
        self.entry(name).map(|entry| entry.rgb)
    }

    /// Every color except `off`, in palette order.
    pub fn colors(&self) -> impl Iterator<Item = &PaletteEntry> {
        self.entries.iter().filter(|entry| entry.name != "off")
    }

    /// Closest palette entry to an arbitrary resolved color.
    pub fn nearest(&self, rgb: Rgb) -> &PaletteEntry {
        // `new` guarantees at least the `off` entry.
        self.entries
            .iter()
            .min_by_key(|entry| entry.rgb.distance_sq(&rgb))
            .unwrap_or(&self.entries[0])
    }

    pub fn nearest_velocity(&self, rgb: Rgb) -> u8 {
        if rgb.is_off() {
            return self.lp_color("off").unwrap_or(0);
        }
        self.nearest(rgb).velocity
    }
}
