//! Assembling rendered frames into animations

use image::codecs::gif::{GifEncoder, Repeat};
use image::{Delay, DynamicImage, RgbImage};
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;
use tracing::{debug, warn};

use rlkit_core::{Frame, RLError, Result};

/// Turns an episode's frames into a file
pub trait AnimationAssembler: Send {
    /// Write `frames` to `path`
    fn assemble(&mut self, frames: &[Frame], path: &Path) -> Result<()>;
}

/// Looping GIF encoder
#[derive(Debug, Clone, Copy)]
pub struct GifAssembler {
    frame_delay_ms: u32,
}

impl GifAssembler {
    /// Encoder with a fixed per-frame delay
    #[must_use]
    pub fn new(frame_delay_ms: u32) -> Self {
        Self { frame_delay_ms }
    }
}

impl Default for GifAssembler {
    fn default() -> Self {
        Self::new(50)
    }
}

fn image_error(e: image::ImageError) -> RLError {
    RLError::Other(anyhow::Error::new(e))
}

impl AnimationAssembler for GifAssembler {
    fn assemble(&mut self, frames: &[Frame], path: &Path) -> Result<()> {
        if frames.is_empty() {
            warn!("No frames to write to {}", path.display());
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let delay = Delay::from_numer_denom_ms(self.frame_delay_ms, 1);
        let mut encoded = Vec::with_capacity(frames.len());
        for frame in frames {
            let rgb = RgbImage::from_raw(frame.width(), frame.height(), frame.pixels().to_vec())
                .ok_or_else(|| RLError::Computation("frame buffer does not match its size".into()))?;
            let rgba = DynamicImage::ImageRgb8(rgb).into_rgba8();
            encoded.push(image::Frame::from_parts(rgba, 0, 0, delay));
        }

        let file = BufWriter::new(File::create(path)?);
        let mut encoder = GifEncoder::new(file);
        encoder.set_repeat(Repeat::Infinite).map_err(image_error)?;
        encoder.encode_frames(encoded).map_err(image_error)?;

        debug!("Wrote {} frames to {}", frames.len(), path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::codecs::gif::GifDecoder;
    use image::AnimationDecoder;

    #[test]
    fn test_gif_has_every_frame() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("images").join("1_50.gif");
        let frames = vec![
            Frame::filled(8, 6, [255, 0, 0]),
            Frame::filled(8, 6, [0, 255, 0]),
            Frame::filled(8, 6, [0, 0, 255]),
        ];

        GifAssembler::default().assemble(&frames, &path).unwrap();

        let decoder = GifDecoder::new(File::open(&path).unwrap()).unwrap();
        let decoded = decoder.into_frames().collect_frames().unwrap();
        assert_eq!(decoded.len(), 3);
        assert_eq!(decoded[0].buffer().dimensions(), (8, 6));
    }

    #[test]
    fn test_no_frames_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.gif");
        GifAssembler::default().assemble(&[], &path).unwrap();
        assert!(!path.exists());
    }
}
