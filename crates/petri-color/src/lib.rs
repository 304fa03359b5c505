//! Named palettes and colormap lookup tables.
//!
//! A [`Palette`] is an ordered list of color stops; a [`ColorLut`] is the
//! derived 256-entry RGBA table the renderers sample per cell.
//!
//! # Example
//!
//! ```
//! use petri_color::{ColorLut, Palette};
//!
//! let lut = ColorLut::build(Palette::Viridis);
//! let [r, g, b, a] = lut.sample(0.0);
//! assert_eq!((r, g, b, a), (68, 1, 84, 255));
//! ```

/// A color stop: position in [0, 1] plus an sRGB triple.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColorStop {
    /// Position along the gradient (0-1, ascending).
    pub position: f32,
    /// Color at this position.
    pub rgb: [u8; 3],
}

/// The named palettes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Palette {
    /// Perceptually uniform green-to-yellow.
    #[default]
    Viridis,
    /// Black through purple to pale yellow.
    Magma,
    /// Black through red to bright yellow.
    Inferno,
    /// Blue through magenta to yellow.
    Plasma,
    /// Cyclic pale-violet to deep indigo and back.
    Twilight,
    /// Black to white with a blue cast.
    Bone,
    /// Abyssal navy to glowing cyan.
    Bioluminescent,
    /// Plain black to white.
    Grayscale,
}

impl Palette {
    /// All palettes, in menu order.
    pub const ALL: [Palette; 8] = [
        Palette::Viridis,
        Palette::Magma,
        Palette::Inferno,
        Palette::Plasma,
        Palette::Twilight,
        Palette::Bone,
        Palette::Bioluminescent,
        Palette::Grayscale,
    ];

    /// The palette's wire/menu name.
    pub fn name(&self) -> &'static str {
        match self {
            Palette::Viridis => "viridis",
            Palette::Magma => "magma",
            Palette::Inferno => "inferno",
            Palette::Plasma => "plasma",
            Palette::Twilight => "twilight",
            Palette::Bone => "bone",
            Palette::Bioluminescent => "bioluminescent",
            Palette::Grayscale => "grayscale",
        }
    }

    /// Looks a palette up by name. Unknown names return `None`.
    pub fn from_name(name: &str) -> Option<Palette> {
        Palette::ALL.into_iter().find(|p| p.name() == name)
    }

    /// Raw stop colors, evenly spaced.
    fn colors(&self) -> &'static [[u8; 3]] {
        match self {
            Palette::Viridis => &[
                [68, 1, 84],
                [72, 35, 116],
                [64, 67, 135],
                [52, 94, 141],
                [41, 120, 142],
                [32, 144, 140],
                [34, 167, 132],
                [68, 190, 112],
                [121, 209, 81],
                [189, 222, 38],
                [253, 231, 37],
            ],
            Palette::Magma => &[
                [0, 0, 4],
                [18, 14, 54],
                [51, 16, 104],
                [90, 17, 126],
                [130, 26, 129],
                [168, 46, 118],
                [204, 72, 96],
                [232, 109, 72],
                [248, 155, 57],
                [252, 206, 49],
                [252, 253, 191],
            ],
            Palette::Inferno => &[
                [0, 0, 4],
                [22, 11, 57],
                [58, 12, 107],
                [96, 20, 124],
                [132, 37, 120],
                [167, 55, 105],
                [200, 77, 80],
                [227, 108, 51],
                [245, 150, 24],
                [249, 199, 20],
                [252, 255, 164],
            ],
            Palette::Plasma => &[
                [13, 8, 135],
                [65, 4, 157],
                [106, 0, 168],
                [143, 13, 164],
                [175, 40, 146],
                [201, 67, 120],
                [222, 97, 93],
                [237, 130, 64],
                [246, 167, 34],
                [248, 207, 12],
                [240, 249, 33],
            ],
            Palette::Twilight => &[
                [226, 217, 226],
                [181, 201, 222],
                [123, 160, 206],
                [85, 104, 184],
                [77, 50, 128],
                [54, 21, 60],
                [80, 29, 67],
                [135, 44, 74],
                [180, 102, 95],
                [216, 169, 158],
                [226, 217, 226],
            ],
            Palette::Bone => &[
                [0, 0, 1],
                [28, 28, 39],
                [57, 57, 78],
                [85, 85, 117],
                [113, 116, 145],
                [142, 148, 170],
                [170, 179, 195],
                [198, 211, 221],
                [227, 234, 238],
                [255, 255, 255],
            ],
            Palette::Bioluminescent => &[
                [5, 10, 30],
                [10, 30, 70],
                [15, 60, 110],
                [20, 95, 150],
                [0, 140, 180],
                [0, 190, 210],
                [0, 229, 255],
                [120, 245, 255],
                [220, 255, 255],
            ],
            Palette::Grayscale => &[
                [0, 0, 0],
                [28, 28, 28],
                [57, 57, 57],
                [85, 85, 85],
                [113, 113, 113],
                [142, 142, 142],
                [170, 170, 170],
                [198, 198, 198],
                [227, 227, 227],
                [255, 255, 255],
            ],
        }
    }

    /// Color stops, sorted ascending by position.
    pub fn stops(&self) -> Vec<ColorStop> {
        let colors = self.colors();
        let step = 1.0 / (colors.len() - 1) as f32;
        colors
            .iter()
            .enumerate()
            .map(|(i, &rgb)| ColorStop {
                position: i as f32 * step,
                rgb,
            })
            .collect()
    }

    /// Interpolates the palette at `t` (clamped to [0, 1]).
    pub fn interpolate(&self, t: f32) -> [u8; 3] {
        let stops = self.stops();
        let t = t.clamp(0.0, 1.0);

        // Find the bracketing stops
        let mut lo = stops[0];
        let mut hi = stops[stops.len() - 1];
        for pair in stops.windows(2) {
            if t >= pair[0].position && t <= pair[1].position {
                lo = pair[0];
                hi = pair[1];
                break;
            }
        }

        let span = hi.position - lo.position;
        let frac = if span > 0.0 { (t - lo.position) / span } else { 0.0 };
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * frac).round() as u8;
        [
            mix(lo.rgb[0], hi.rgb[0]),
            mix(lo.rgb[1], hi.rgb[1]),
            mix(lo.rgb[2], hi.rgb[2]),
        ]
    }
}

/// Number of entries in a [`ColorLut`].
pub const LUT_SIZE: usize = 256;

/// Precomputed 256-entry RGBA lookup table.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorLut {
    data: Vec<u8>,
}

impl ColorLut {
    /// Builds the table for a palette.
    pub fn build(palette: Palette) -> Self {
        let mut data = Vec::with_capacity(LUT_SIZE * 4);
        for i in 0..LUT_SIZE {
            let t = i as f32 / (LUT_SIZE - 1) as f32;
            let [r, g, b] = palette.interpolate(t);
            data.extend_from_slice(&[r, g, b, 255]);
        }
        Self { data }
    }

    /// The raw RGBA bytes (256 × 4).
    pub fn bytes(&self) -> &[u8] {
        &self.data
    }

    /// One table entry.
    pub fn entry(&self, index: usize) -> [u8; 4] {
        let i = index.min(LUT_SIZE - 1) * 4;
        [self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3]]
    }

    /// Samples the table at `t` (clamped to [0, 1]).
    pub fn sample(&self, t: f32) -> [u8; 4] {
        let index = (t.clamp(0.0, 1.0) * (LUT_SIZE - 1) as f32).round() as usize;
        self.entry(index)
    }

    /// Maps a channel slice through the table into an RGBA frame.
    ///
    /// `out` is resized to `values.len() * 4`.
    pub fn map_field(&self, values: &[f32], out: &mut Vec<u8>) {
        out.resize(values.len() * 4, 0);
        for (i, &value) in values.iter().enumerate() {
            let [r, g, b, a] = self.sample(value);
            out[i * 4] = r;
            out[i * 4 + 1] = g;
            out[i * 4 + 2] = b;
            out[i * 4 + 3] = a;
        }
    }
}
