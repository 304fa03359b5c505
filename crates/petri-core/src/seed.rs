//! Initial-condition generators.

use rand::Rng;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::grid::FieldGrid;

/// Named initial-condition policies for [`seed`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum InitialCondition {
    /// Uniform background with one seeded disk at the grid center.
    #[default]
    Center,
    /// Independent per-cell uniform noise close to the background state.
    Noise,
    /// Eight seed disks arranged on a ring around the center.
    Symmetric,
    /// Caller-rasterized glyph mask (see [`seed_mask`]); behaves as
    /// `Clear` when no mask is supplied.
    Text,
    /// Uniform background, no seeds.
    Clear,
}

impl InitialCondition {
    /// Stable small-integer id, used by the descriptor codec.
    pub fn id(&self) -> u8 {
        match self {
            InitialCondition::Center => 0,
            InitialCondition::Noise => 1,
            InitialCondition::Symmetric => 2,
            InitialCondition::Text => 3,
            InitialCondition::Clear => 4,
        }
    }

    /// Looks a condition up by id. Unknown ids fall back to `Center`.
    pub fn from_id(id: u8) -> Self {
        match id {
            1 => InitialCondition::Noise,
            2 => InitialCondition::Symmetric,
            3 => InitialCondition::Text,
            4 => InitialCondition::Clear,
            _ => InitialCondition::Center,
        }
    }
}

/// Concentrations written into seeded cells: (u, v).
const SEED_PAIR: (f32, f32) = (0.5, 0.25);

/// Rewrites the current buffers according to the named policy.
///
/// Always starts from the uniform background (u=1, v=0). The rng is only
/// consulted by `Noise`.
pub fn seed<R: Rng>(grid: &mut FieldGrid, condition: InitialCondition, rng: &mut R) {
    let w = grid.width();
    let h = grid.height();
    grid.fill(1.0, 0.0);

    match condition {
        InitialCondition::Center => {
            let cx = w as f32 / 2.0;
            let cy = h as f32 / 2.0;
            let r = w as f32 * 0.04;
            stamp_disk(grid, cx, cy, r);
        }
        InitialCondition::Noise => {
            for i in 0..w * h {
                let u = 1.0 - rng.gen::<f32>() * 0.1;
                let v = rng.gen::<f32>() * 0.1;
                grid.u_mut()[i] = u;
                grid.v_mut()[i] = v;
            }
        }
        InitialCondition::Symmetric => {
            let cx = w as f32 / 2.0;
            let cy = h as f32 / 2.0;
            let seed_r = w as f32 * 0.02;
            let dist = w as f32 * 0.1;
            for s in 0..8 {
                let angle = (s as f32 / 8.0) * std::f32::consts::TAU;
                stamp_disk(grid, cx + angle.cos() * dist, cy + angle.sin() * dist, seed_r);
            }
        }
        InitialCondition::Text | InitialCondition::Clear => {}
    }
}

/// Seeds every foreground cell of a caller-rasterized mask.
///
/// The mask must be `width * height` cells; `true` marks foreground. Used
/// by hosts that rasterize text or imagery into seed shapes.
///
/// # Panics
///
/// Panics if the mask length does not match the grid.
pub fn seed_mask(grid: &mut FieldGrid, mask: &[bool]) {
    assert_eq!(mask.len(), grid.len(), "seed mask must match grid size");

    for (i, &on) in mask.iter().enumerate() {
        if on {
            grid.u_mut()[i] = SEED_PAIR.0;
            grid.v_mut()[i] = SEED_PAIR.1;
        }
    }
}

fn stamp_disk(grid: &mut FieldGrid, cx: f32, cy: f32, r: f32) {
    let w = grid.width();
    let h = grid.height();
    let r2 = r * r;

    for y in 0..h {
        for x in 0..w {
            let dx = x as f32 - cx;
            let dy = y as f32 - cy;
            if dx * dx + dy * dy < r2 {
                grid.set_u(x, y, SEED_PAIR.0);
                grid.set_v(x, y, SEED_PAIR.1);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    #[test]
    fn test_center_seeds_a_disk() {
        let mut grid = FieldGrid::new(128, 128);
        seed(&mut grid, InitialCondition::Center, &mut rng());

        assert_eq!(grid.get_u(64, 64), 0.5);
        assert_eq!(grid.get_v(64, 64), 0.25);
        assert_eq!(grid.get_u(0, 0), 1.0);
        assert_eq!(grid.get_v(0, 0), 0.0);
    }

    #[test]
    fn test_noise_range() {
        let mut grid = FieldGrid::new(64, 64);
        seed(&mut grid, InitialCondition::Noise, &mut rng());

        for (&u, &v) in grid.u().iter().zip(grid.v()) {
            assert!(u > 0.9 && u <= 1.0, "u = {u} out of (0.9, 1.0]");
            assert!((0.0..0.1).contains(&v), "v = {v} out of [0, 0.1)");
        }
    }

    #[test]
    fn test_symmetric_places_ring_of_disks() {
        let mut grid = FieldGrid::new(256, 256);
        seed(&mut grid, InitialCondition::Symmetric, &mut rng());

        // Disk centers sit 10% of the width from the grid center at 45°
        // increments; the four axis-aligned ones land on whole cells.
        for (x, y) in [(153, 128), (128, 153), (102, 128), (128, 102)] {
            assert_eq!(grid.get_v(x, y), 0.25, "no seed at ({x}, {y})");
        }
        // The center itself stays background.
        assert_eq!(grid.get_v(128, 128), 0.0);
    }

    #[test]
    fn test_clear_is_uniform() {
        let mut grid = FieldGrid::new(32, 32);
        seed(&mut grid, InitialCondition::Noise, &mut rng());
        seed(&mut grid, InitialCondition::Clear, &mut rng());

        assert!(grid.u().iter().all(|&u| u == 1.0));
        assert!(grid.v().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_text_without_mask_is_clear() {
        let mut grid = FieldGrid::new(32, 32);
        seed(&mut grid, InitialCondition::Text, &mut rng());
        assert!(grid.v().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_seed_mask_stamps_foreground() {
        let mut grid = FieldGrid::new(8, 8);
        seed(&mut grid, InitialCondition::Clear, &mut rng());

        let mut mask = vec![false; 64];
        mask[9] = true;
        mask[10] = true;
        seed_mask(&mut grid, &mask);

        assert_eq!(grid.get_u(1, 1), 0.5);
        assert_eq!(grid.get_v(2, 1), 0.25);
        assert_eq!(grid.get_v(3, 3), 0.0);
    }

    #[test]
    fn test_condition_ids_round_trip() {
        for condition in [
            InitialCondition::Center,
            InitialCondition::Noise,
            InitialCondition::Symmetric,
            InitialCondition::Text,
            InitialCondition::Clear,
        ] {
            assert_eq!(InitialCondition::from_id(condition.id()), condition);
        }
        assert_eq!(InitialCondition::from_id(99), InitialCondition::Center);
    }
}
