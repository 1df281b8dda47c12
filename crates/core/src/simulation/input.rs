//! Caller-owned input state and the paint commands derived from it

use serde::{Deserialize, Serialize};

use crate::core_types::CellType;

/// Default brush radius in cells
pub const DEFAULT_SPAWN_RADIUS: u32 = 50;

/// One disk paint operation in grid coordinates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaintCommand {
    pub center: (u32, u32),
    pub radius: u32,
    pub material: CellType,
}

/// Input context of a frontend
///
/// Owned by whoever polls the window or terminal and handed to
/// [`Simulation::apply_input`](super::Simulation::apply_input) each frame.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputState {
    /// Material painted by the brush
    pub selected: CellType,
    /// Paint AIR instead of `selected`
    pub erase_mode: bool,
    /// Brush radius in cells
    pub spawn_radius: u32,
    /// Last cursor position in window pixels
    pub cursor: (f64, f64),
    /// Paint button held
    pub pressed: bool,
    /// Window size in pixels
    pub window_size: (u32, u32),
    pub paused: bool,
}

impl Default for InputState {
    fn default() -> Self {
        Self {
            selected: CellType::Sand,
            erase_mode: false,
            spawn_radius: DEFAULT_SPAWN_RADIUS,
            cursor: (0.0, 0.0),
            pressed: false,
            window_size: (0, 0),
            paused: false,
        }
    }
}

impl InputState {
    /// Material the brush writes: AIR while erasing
    pub fn target_type(&self) -> CellType {
        if self.erase_mode {
            CellType::Air
        } else {
            self.selected
        }
    }

    /// Map the cursor onto a `grid_w × grid_h` grid stretched over the window
    ///
    /// # Returns
    ///
    /// `None` while the button is up, before the window has a size, or when
    /// the cursor lies outside the window
    pub fn paint_command(&self, grid_w: u32, grid_h: u32) -> Option<PaintCommand> {
        let (win_w, win_h) = self.window_size;
        if !self.pressed || win_w == 0 || win_h == 0 || grid_w == 0 || grid_h == 0 {
            return None;
        }

        let (cx, cy) = self.cursor;
        if cx < 0.0 || cy < 0.0 || cx >= f64::from(win_w) || cy >= f64::from(win_h) {
            return None;
        }

        let gx = (cx / f64::from(win_w) * f64::from(grid_w)) as u32;
        let gy = (cy / f64::from(win_h) * f64::from(grid_h)) as u32;

        Some(PaintCommand {
            center: (gx.min(grid_w - 1), gy.min(grid_h - 1)),
            radius: self.spawn_radius,
            material: self.target_type(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pressed_at(cursor: (f64, f64)) -> InputState {
        InputState {
            cursor,
            pressed: true,
            window_size: (800, 600),
            spawn_radius: 3,
            ..InputState::default()
        }
    }

    #[test]
    fn test_target_type_erase() {
        let mut input = InputState {
            selected: CellType::Water,
            ..InputState::default()
        };
        assert_eq!(input.target_type(), CellType::Water);
        input.erase_mode = true;
        assert_eq!(input.target_type(), CellType::Air);
    }

    #[test]
    fn test_cursor_maps_to_grid() {
        let command = pressed_at((400.0, 150.0)).paint_command(200, 100).unwrap();
        assert_eq!(command.center, (100, 25));
        assert_eq!(command.radius, 3);
        assert_eq!(command.material, CellType::Sand);
    }

    #[test]
    fn test_no_command_without_press_or_window() {
        let mut input = pressed_at((10.0, 10.0));
        input.pressed = false;
        assert!(input.paint_command(200, 100).is_none());

        let mut input = pressed_at((10.0, 10.0));
        input.window_size = (0, 0);
        assert!(input.paint_command(200, 100).is_none());

        assert!(pressed_at((-1.0, 10.0)).paint_command(200, 100).is_none());
        assert!(pressed_at((800.0, 10.0)).paint_command(200, 100).is_none());
    }
}
