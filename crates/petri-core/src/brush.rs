//! Pointer tools that perturb the grid.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::grid::{FieldGrid, WallMask};

/// Brush radii are expressed against this reference grid width; on other
/// grid sizes the effective radius scales proportionally.
pub const REFERENCE_GRID: f32 = 512.0;

/// Interactive tools, applied per affected cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Tool {
    /// Adds chemical V: `v = min(1, v + strength)`.
    #[default]
    Inject,
    /// Pushes both channels toward the background state.
    Erase,
    /// Paints the wall mask.
    Wall,
    /// Erases the wall mask.
    WallEraser,
    /// Gentle V boost at half strength.
    Attractor,
    /// Gentle V drain at half strength.
    Repeller,
}

impl Tool {
    /// True for tools that paint the wall mask instead of channel data.
    pub fn is_wall_tool(&self) -> bool {
        matches!(self, Tool::Wall | Tool::WallEraser)
    }
}

/// Applies one brush stamp at normalized coordinates.
///
/// `uv` is in [0, 1] x [0, 1] over the grid; `radius` is in reference-grid units
/// and rescaled by `grid_width / 512`. Falloff is linear in distance
/// (Euclidean, or Chebyshev when `square` is set), zero outside the radius.
///
/// Wall tools go through [`WallMask::paint`] and never touch channel data;
/// the other tools mutate the current buffers in place.
pub fn apply_brush(
    grid: &mut FieldGrid,
    walls: &mut WallMask,
    uv: (f32, f32),
    tool: Tool,
    radius: f32,
    intensity: f32,
    square: bool,
) {
    let w = grid.width();
    let h = grid.height();
    let cx = uv.0 * w as f32;
    let cy = uv.1 * h as f32;
    let r = radius * (w as f32 / REFERENCE_GRID);

    if tool.is_wall_tool() {
        walls.paint(cx, cy, r, tool == Tool::Wall, square);
        return;
    }

    if r <= 0.0 {
        return;
    }

    let reach = r.ceil() as i64;
    let px = cx.round() as i64;
    let py = cy.round() as i64;

    for dy in -reach..=reach {
        let y = py + dy;
        if y < 0 || y >= h as i64 {
            continue;
        }
        for dx in -reach..=reach {
            let x = px + dx;
            if x < 0 || x >= w as i64 {
                continue;
            }

            let fx = x as f32 - cx;
            let fy = y as f32 - cy;
            let dist = if square {
                fx.abs().max(fy.abs())
            } else {
                (fx * fx + fy * fy).sqrt()
            };
            if dist > r {
                continue;
            }

            let strength = (1.0 - dist / r) * intensity;
            let i = y as usize * w + x as usize;

            match tool {
                Tool::Inject => {
                    let v = grid.v()[i];
                    grid.v_mut()[i] = (v + strength).min(1.0);
                }
                Tool::Erase => {
                    let u = grid.u()[i];
                    grid.u_mut()[i] = u + (1.0 - u) * strength;
                    grid.v_mut()[i] *= 1.0 - strength;
                }
                Tool::Attractor => {
                    let v = grid.v()[i];
                    grid.v_mut()[i] = (v + strength * 0.5).min(1.0);
                }
                Tool::Repeller => {
                    let v = grid.v()[i];
                    grid.v_mut()[i] = (v - strength * 0.5).max(0.0);
                }
                Tool::Wall | Tool::WallEraser => unreachable!(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(size: usize) -> (FieldGrid, WallMask) {
        (FieldGrid::new(size, size), WallMask::new(size, size))
    }

    #[test]
    fn test_inject_center_value_and_linear_falloff() {
        let (mut grid, mut walls) = setup(512);
        apply_brush(
            &mut grid,
            &mut walls,
            (0.5, 0.5),
            Tool::Inject,
            20.0,
            1.0,
            false,
        );

        // Full intensity at the brush center.
        assert_eq!(grid.get_v(256, 256), 1.0);
        // Halfway out, strength is about half.
        let half = grid.get_v(266, 256);
        assert!((half - 0.5).abs() < 0.01, "halfway strength {half}");
        // Outside the radius the field is untouched.
        assert_eq!(grid.get_v(277, 256), 0.0);
    }

    #[test]
    fn test_radius_rescales_with_grid_size() {
        // Radius 20 against the 512 reference covers radius 10 on a
        // 256-cell grid.
        let (mut grid, mut walls) = setup(256);
        apply_brush(
            &mut grid,
            &mut walls,
            (0.5, 0.5),
            Tool::Inject,
            20.0,
            1.0,
            false,
        );

        assert!(grid.get_v(128 + 9, 128) > 0.0);
        assert_eq!(grid.get_v(128 + 11, 128), 0.0);
    }

    #[test]
    fn test_inject_saturates_at_one() {
        let (mut grid, mut walls) = setup(64);
        for _ in 0..5 {
            apply_brush(
                &mut grid,
                &mut walls,
                (0.5, 0.5),
                Tool::Inject,
                40.0,
                1.0,
                false,
            );
        }
        assert_eq!(grid.get_v(32, 32), 1.0);
    }

    #[test]
    fn test_erase_restores_background() {
        let (mut grid, mut walls) = setup(64);
        grid.fill(0.3, 0.8);
        apply_brush(
            &mut grid,
            &mut walls,
            (0.5, 0.5),
            Tool::Erase,
            40.0,
            1.0,
            false,
        );

        // At the center strength is 1: u snaps to 1, v to 0.
        assert_eq!(grid.get_u(32, 32), 1.0);
        assert_eq!(grid.get_v(32, 32), 0.0);
    }

    #[test]
    fn test_attractor_and_repeller_are_half_strength() {
        let (mut grid, mut walls) = setup(64);
        apply_brush(
            &mut grid,
            &mut walls,
            (0.5, 0.5),
            Tool::Attractor,
            40.0,
            1.0,
            false,
        );
        let boosted = grid.get_v(32, 32);
        assert!((boosted - 0.5).abs() < 1e-6);

        apply_brush(
            &mut grid,
            &mut walls,
            (0.5, 0.5),
            Tool::Repeller,
            40.0,
            1.0,
            false,
        );
        assert!(grid.get_v(32, 32).abs() < 1e-6);
    }

    #[test]
    fn test_repeller_floors_at_zero() {
        let (mut grid, mut walls) = setup(64);
        apply_brush(
            &mut grid,
            &mut walls,
            (0.5, 0.5),
            Tool::Repeller,
            40.0,
            1.0,
            false,
        );
        assert!(grid.v().iter().all(|&v| v >= 0.0));
    }

    #[test]
    fn test_wall_tool_leaves_channels_alone() {
        let (mut grid, mut walls) = setup(64);
        apply_brush(
            &mut grid,
            &mut walls,
            (0.5, 0.5),
            Tool::Wall,
            40.0,
            1.0,
            false,
        );

        assert!(walls.has_walls());
        assert!(grid.u().iter().all(|&u| u == 1.0));
        assert!(grid.v().iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_square_brush_uses_chebyshev_metric() {
        let (mut grid, mut walls) = setup(512);
        apply_brush(
            &mut grid,
            &mut walls,
            (0.5, 0.5),
            Tool::Inject,
            20.0,
            1.0,
            true,
        );

        // A diagonal cell at Chebyshev distance 14 is inside the square
        // brush but outside the round one.
        assert!(grid.get_v(256 + 14, 256 + 14) > 0.0);
    }
}
