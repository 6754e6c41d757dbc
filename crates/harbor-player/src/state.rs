//! Program state persisted between runs

use harbor_core::{Color, Result, Vec3};
use harbor_render::Camera;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Clear color, camera pose and debug flag, saved on exit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgramState {
    pub clear_color: Color,
    pub debug_ui: bool,
    pub camera_position: Vec3,
    pub camera_front: Vec3,
}

impl Default for ProgramState {
    fn default() -> Self {
        Self {
            clear_color: Color::BLACK,
            debug_ui: false,
            camera_position: Vec3::new(0.0, 0.0, 3.0),
            camera_front: Vec3::FORWARD,
        }
    }
}

impl ProgramState {
    /// Read the state file. A missing file is not an error.
    pub fn load(path: &Path) -> Result<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(path)?;
        Ok(Some(toml::from_str(&text)?))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    pub fn apply_to(&self, camera: &mut Camera) {
        camera.position = self.camera_position;
        camera.set_front(self.camera_front);
    }

    pub fn capture_from(&mut self, camera: &Camera) {
        self.camera_position = camera.position;
        self.camera_front = camera.front();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        assert!(ProgramState::load(&dir.path().join("state.toml"))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("program_state.toml");
        let state = ProgramState {
            clear_color: Color::new(0.1, 0.2, 0.3, 1.0),
            debug_ui: true,
            camera_position: Vec3::new(1.0, 2.0, -4.0),
            camera_front: Vec3::new(0.0, 0.0, 1.0),
        };
        state.save(&path).unwrap();
        assert_eq!(ProgramState::load(&path).unwrap(), Some(state));
    }

    #[test]
    fn test_camera_round_trip() {
        let mut camera = Camera::default();
        let state = ProgramState {
            camera_position: Vec3::new(3.0, 1.0, 0.0),
            camera_front: Vec3::new(1.0, 0.0, 0.0),
            ..Default::default()
        };
        state.apply_to(&mut camera);
        assert_eq!(camera.position, Vec3::new(3.0, 1.0, 0.0));
        assert!((camera.front() - Vec3::new(1.0, 0.0, 0.0)).length() < 1e-5);

        let mut saved = ProgramState::default();
        saved.capture_from(&camera);
        assert_eq!(saved.camera_position, camera.position);
    }

    #[test]
    fn test_corrupt_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("state.toml");
        std::fs::write(&path, "clear_color = 3").unwrap();
        assert!(ProgramState::load(&path).is_err());
    }
}
