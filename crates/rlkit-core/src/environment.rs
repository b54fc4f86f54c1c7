//! Environment traits and types

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{BoxSpace, ContinuousAction, Reward, VectorObservation};

/// Result of a single environment step
#[derive(Debug, Clone)]
pub struct Step {
    /// Observation from the environment
    pub observation: VectorObservation,
    /// Reward signal
    pub reward: Reward,
    /// Whether the episode is done
    pub done: bool,
    /// Whether the episode was truncated (e.g., time limit)
    pub truncated: bool,
    /// Additional info from the environment
    pub info: StepInfo,
}

/// Additional information from a step
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StepInfo {
    /// Custom fields
    #[serde(flatten)]
    pub fields: serde_json::Map<String, serde_json::Value>,
}

/// Configuration for environments
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EnvironmentConfig {
    /// Random seed
    pub seed: Option<u64>,
    /// Maximum episode steps
    pub max_steps: Option<usize>,
    /// Additional parameters
    #[serde(flatten)]
    pub params: serde_json::Map<String, serde_json::Value>,
}

/// How an environment should render itself
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderMode {
    /// Log a textual description of the state
    Human,
    /// Return an RGB frame
    RgbArray,
}

/// Packed RGB8 image, row-major
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Frame {
    /// Create a frame filled with one colour
    #[must_use]
    pub fn filled(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let pixels = rgb
            .iter()
            .copied()
            .cycle()
            .take(width as usize * height as usize * 3)
            .collect();
        Self { width, height, pixels }
    }

    /// Wrap an existing RGB buffer, `None` if its length does not match
    #[must_use]
    pub fn from_raw(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        (pixels.len() == width as usize * height as usize * 3).then_some(Self {
            width,
            height,
            pixels,
        })
    }

    /// Frame width in pixels
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Frame height in pixels
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw RGB bytes
    #[must_use]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Colour at `(x, y)`, `None` outside the frame
    #[must_use]
    pub fn get(&self, x: i64, y: i64) -> Option<[u8; 3]> {
        let idx = self.index(x, y)?;
        Some([self.pixels[idx], self.pixels[idx + 1], self.pixels[idx + 2]])
    }

    /// Set the colour at `(x, y)`; out-of-frame writes are ignored
    pub fn put(&mut self, x: i64, y: i64, rgb: [u8; 3]) {
        if let Some(idx) = self.index(x, y) {
            self.pixels[idx..idx + 3].copy_from_slice(&rgb);
        }
    }

    fn index(&self, x: i64, y: i64) -> Option<usize> {
        let (x, y) = (usize::try_from(x).ok()?, usize::try_from(y).ok()?);
        if x >= self.width as usize || y >= self.height as usize {
            return None;
        }
        Some((y * self.width as usize + x) * 3)
    }
}

/// Core environment trait
///
/// Observation and action dimensionality are fixed for the lifetime of an
/// environment; dynamics may be stochastic.
#[async_trait]
pub trait Environment: Send + Sync {
    /// Get the observation space
    fn observation_space(&self) -> BoxSpace;

    /// Get the action space
    fn action_space(&self) -> BoxSpace;

    /// Reset the environment
    async fn reset(&mut self) -> crate::Result<(VectorObservation, StepInfo)>;

    /// Take a step in the environment
    async fn step(&mut self, action: &ContinuousAction) -> crate::Result<Step>;

    /// Render the environment; `RgbArray` yields a frame
    async fn render(&self, _mode: RenderMode) -> crate::Result<Option<Frame>> {
        Ok(None)
    }

    /// Close the environment
    async fn close(&mut self) -> crate::Result<()> {
        Ok(())
    }
}

#[async_trait]
impl<E> Environment for Box<E>
where
    E: Environment + ?Sized,
{
    fn observation_space(&self) -> BoxSpace {
        (**self).observation_space()
    }

    fn action_space(&self) -> BoxSpace {
        (**self).action_space()
    }

    async fn reset(&mut self) -> crate::Result<(VectorObservation, StepInfo)> {
        (**self).reset().await
    }

    async fn step(&mut self, action: &ContinuousAction) -> crate::Result<Step> {
        (**self).step(action).await
    }

    async fn render(&self, mode: RenderMode) -> crate::Result<Option<Frame>> {
        (**self).render(mode).await
    }

    async fn close(&mut self) -> crate::Result<()> {
        (**self).close().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_put_and_get() {
        let mut frame = Frame::filled(4, 3, [255, 255, 255]);
        frame.put(1, 2, [10, 20, 30]);
        frame.put(-1, 0, [0, 0, 0]);
        frame.put(4, 0, [0, 0, 0]);

        assert_eq!(frame.get(1, 2), Some([10, 20, 30]));
        assert_eq!(frame.get(0, 0), Some([255, 255, 255]));
        assert_eq!(frame.get(4, 0), None);
        assert_eq!(frame.pixels().len(), 4 * 3 * 3);
    }

    #[test]
    fn test_frame_from_raw_checks_length() {
        assert!(Frame::from_raw(2, 2, vec![0; 12]).is_some());
        assert!(Frame::from_raw(2, 2, vec![0; 11]).is_none());
    }
}
