//! Color palette remapping.
//!
//! A [`ColorLookup`] pairs a source palette (colors expected in index-coded
//! tile pixels) with a target palette of replacement colors. The compositor
//! expands both into 256-entry RGBA tables and binds them as auxiliary
//! samplers; the (external) fragment stage performs the per-pixel
//! substitution. Indices beyond the supplied palette length map to fully
//! transparent black.

mod error;

pub use error::LookupError;

/// One 8-bit-per-channel RGBA color.
pub type Rgba8 = [u8; 4];

/// A 256-entry RGBA lookup table, one row per palette index.
pub type LookupTable = [Rgba8; 256];

/// Source/target palette pair for index-coded color substitution.
///
/// Built once from hex strings and treated as immutable; the driving layer
/// signals changes through
/// [`TileLayerRenderer::mark_lookup_dirty`](crate::render::TileLayerRenderer::mark_lookup_dirty),
/// which forces the next composite to re-render.
#[derive(Debug, Clone, PartialEq)]
pub struct ColorLookup {
    source: Vec<[u8; 3]>,
    target: Vec<[u8; 3]>,
}

impl ColorLookup {
    /// Build a lookup from hex color strings (`"rrggbb"`, leading `#`
    /// allowed).
    ///
    /// Entries shorter than six digits parse with the absent trailing
    /// channels as zero; only the index position, not the parsed color,
    /// decides whether a pixel index is considered valid.
    ///
    /// # Errors
    ///
    /// Returns [`LookupError`] if an entry contains non-hex characters or
    /// is longer than six digits, or if either palette exceeds 256 entries.
    pub fn from_hex<S: AsRef<str>>(source: &[S], target: &[S]) -> Result<Self, LookupError> {
        if source.len() > 256 {
            return Err(LookupError::PaletteTooLong(source.len()));
        }
        if target.len() > 256 {
            return Err(LookupError::PaletteTooLong(target.len()));
        }
        Ok(Self {
            source: source
                .iter()
                .map(|s| parse_hex_color(s.as_ref()))
                .collect::<Result<_, _>>()?,
            target: target
                .iter()
                .map(|s| parse_hex_color(s.as_ref()))
                .collect::<Result<_, _>>()?,
        })
    }

    /// Number of valid palette indices (the source palette length).
    #[inline]
    pub fn len(&self) -> usize {
        self.source.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }

    /// Source table: palette colors with alpha 0xff for supplied indices,
    /// transparent black beyond the palette length.
    pub fn source_table(&self) -> LookupTable {
        let mut table = [[0u8; 4]; 256];
        for (row, rgb) in table.iter_mut().zip(self.source.iter()) {
            *row = [rgb[0], rgb[1], rgb[2], 0xff];
        }
        table
    }

    /// Target table: replacement colors with each row's alpha copied from
    /// the source table. Rows past the target palette's length are left
    /// fully transparent, even for indices the source palette covers.
    pub fn target_table(&self) -> LookupTable {
        let source = self.source_table();
        let mut table = [[0u8; 4]; 256];
        for ((row, rgb), src) in table.iter_mut().zip(self.target.iter()).zip(source.iter()) {
            *row = [rgb[0], rgb[1], rgb[2], src[3]];
        }
        table
    }

    /// Reference semantics of the fragment-stage substitution.
    ///
    /// Maps a pixel's palette index and alpha to the output color: the
    /// target color with the tile's alpha preserved for indices both
    /// palettes cover, transparent black for indices at or beyond either
    /// palette's length. Used by the tests; a software rasterizer would
    /// apply this per pixel.
    pub fn remap(&self, index: u8, alpha: u8) -> Rgba8 {
        let row = self.target_table()[index as usize];
        let a = ((row[3] as u16 * alpha as u16) / 255) as u8;
        if a == 0 && row[3] == 0 {
            return [0, 0, 0, 0];
        }
        [row[0], row[1], row[2], a]
    }
}

/// Parse up to six hex digits into RGB channels, absent channels as zero.
fn parse_hex_color(value: &str) -> Result<[u8; 3], LookupError> {
    let digits = value.trim().trim_start_matches('#');
    if !digits.is_ascii() {
        return Err(LookupError::InvalidColor {
            value: value.to_string(),
            reason: "non-ASCII character".to_string(),
        });
    }
    if digits.len() > 6 {
        return Err(LookupError::InvalidColor {
            value: value.to_string(),
            reason: "more than six hex digits".to_string(),
        });
    }
    let mut rgb = [0u8; 3];
    for (i, channel) in rgb.iter_mut().enumerate() {
        let start = i * 2;
        if start >= digits.len() {
            break;
        }
        let end = (start + 2).min(digits.len());
        let pair = &digits[start..end];
        let mut parsed = u8::from_str_radix(pair, 16).map_err(|e| LookupError::InvalidColor {
            value: value.to_string(),
            reason: e.to_string(),
        })?;
        if pair.len() == 1 {
            parsed <<= 4;
        }
        *channel = parsed;
    }
    Ok(rgb)
}
