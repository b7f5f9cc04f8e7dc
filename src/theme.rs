//! Built-in One Dark colour scheme and tile shading.

use match3tui::Tile;
use ratatui::style::Color;

/// Tile glyphs, one per palette slot, so kinds differ by shape as well as colour.
const GLYPHS: [&str; 9] = ["●", "◆", "▲", "■", "★", "✚", "♥", "♣", "⬟"];

#[derive(Debug, Clone)]
pub struct Theme {
    /// Tile colours by zero-based tile index: green, yellow, red, blue,
    /// magenta, cyan, orange, white, teal.
    pub tiles: [Color; 9],
    /// Playfield background.
    pub bg: Color,
    /// Grid / border.
    pub div_line: Color,
    /// Text (score, combo).
    pub main_fg: Color,
    /// Highlight / titles.
    pub title: Color,
    /// Secondary text (history tail, key help).
    pub inactive_fg: Color,
    /// Keyboard cursor brackets.
    pub cursor: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            tiles: [
                Color::from_u32(0x0098_C379),
                Color::from_u32(0x00E5_C07B),
                Color::from_u32(0x00E0_6C75),
                Color::from_u32(0x0061_AFEF),
                Color::from_u32(0x00C6_78DD),
                Color::from_u32(0x0056_B6C2),
                Color::from_u32(0x00D1_9A66),
                Color::from_u32(0x00DC_DFE4),
                Color::from_u32(0x0000_9988),
            ],
            bg: Color::from_u32(0x0031_353F),
            div_line: Color::from_u32(0x003F_444F),
            main_fg: Color::from_u32(0x00AB_B2BF),
            title: Color::from_u32(0x00E5_C07B),
            inactive_fg: Color::from_u32(0x005C_6370),
            cursor: Color::White,
        }
    }
}

impl Theme {
    #[inline]
    pub fn tile_color(&self, tile: Tile) -> Color {
        self.tiles[tile.index() % self.tiles.len()]
    }

    #[inline]
    pub fn glyph(tile: Tile) -> &'static str {
        GLYPHS[tile.index() % GLYPHS.len()]
    }
}

/// Scale an RGB colour; named colours map to their nominal RGB first.
pub fn shade(color: Color, factor: f32) -> Color {
    let (r, g, b) = match color {
        Color::Rgb(r, g, b) => (r, g, b),
        Color::Red => (255, 0, 0),
        Color::Green => (0, 255, 0),
        Color::Yellow => (255, 255, 0),
        Color::Blue => (0, 0, 255),
        Color::Magenta => (255, 0, 255),
        Color::Cyan => (0, 255, 255),
        Color::Gray => (128, 128, 128),
        Color::DarkGray => (64, 64, 64),
        Color::White => (255, 255, 255),
        _ => (128, 128, 128),
    };
    let scale = |c: u8| (c as f32 * factor).clamp(0.0, 255.0) as u8;
    Color::Rgb(scale(r), scale(g), scale(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tile_colors_are_distinct() {
        let theme = Theme::default();
        for a in 1..=9u8 {
            for b in (a + 1)..=9 {
                assert_ne!(theme.tile_color(Tile(a)), theme.tile_color(Tile(b)));
            }
        }
        assert_eq!(theme.tile_color(Tile(1)), Color::Rgb(0x98, 0xC3, 0x79));
    }

    #[test]
    fn test_shade() {
        assert_eq!(shade(Color::Rgb(100, 200, 50), 0.5), Color::Rgb(50, 100, 25));
        assert_eq!(shade(Color::Rgb(200, 200, 200), 2.0), Color::Rgb(255, 255, 255));
        assert_eq!(shade(Color::White, 0.5), Color::Rgb(127, 127, 127));
    }

    #[test]
    fn test_glyph_per_kind() {
        assert_eq!(Theme::glyph(Tile(1)), "●");
        assert_eq!(Theme::glyph(Tile(9)), "⬟");
    }
}
