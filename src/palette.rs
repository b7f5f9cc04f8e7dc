//! Tile values and the random draw rule shared by deal and refill.

use crate::error::EngineError;
use rand::Rng;
use std::fmt;

/// Largest palette the engine accepts (single-digit tile labels).
pub const MAX_PALETTE: u8 = 9;

/// Tile value, `1..=palette size`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tile(pub u8);

impl Tile {
    /// Zero-based index, for colour lookup.
    #[inline]
    pub fn index(self) -> usize {
        self.0.saturating_sub(1) as usize
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fixed finite palette of tile kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    size: u8,
}

impl Palette {
    pub fn new(size: u8) -> Result<Self, EngineError> {
        if size == 0 || size > MAX_PALETTE {
            return Err(EngineError::InvalidConfig(format!(
                "palette size must be 1..={MAX_PALETTE}, got {size}"
            )));
        }
        Ok(Self { size })
    }

    #[inline]
    pub fn size(self) -> u8 {
        self.size
    }

    /// Uniform draw over the palette.
    pub fn draw<R: Rng + ?Sized>(self, rng: &mut R) -> Tile {
        Tile(rng.random_range(1..=self.size))
    }

    pub fn tiles(self) -> impl Iterator<Item = Tile> {
        (1..=self.size).map(Tile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    #[test]
    fn test_palette_bounds() {
        assert!(Palette::new(0).is_err());
        assert!(Palette::new(MAX_PALETTE + 1).is_err());
        assert_eq!(Palette::new(6).unwrap().size(), 6);
    }

    #[test]
    fn test_draw_stays_in_palette() {
        let palette = Palette::new(5).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = [false; 5];
        for _ in 0..500 {
            let t = palette.draw(&mut rng);
            assert!((1..=5).contains(&t.0));
            seen[t.index()] = true;
        }
        assert!(seen.iter().all(|s| *s), "every tile kind should appear");
    }
}
