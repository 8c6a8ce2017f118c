//! Frames and in-memory videos.

use std::fs;
use std::path::{Path, PathBuf};

use image::RgbImage;
use tracing::debug;

use crate::error::Result;

/// Frame rate assumed when none is known.
pub const DEFAULT_FPS: f64 = 30.0;

/// One RGB video frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    image: RgbImage,
}

impl Frame {
    pub fn new(image: RgbImage) -> Self {
        Self { image }
    }

    /// Black frame of the given size.
    pub fn blank(width: u32, height: u32) -> Self {
        Self::new(RgbImage::new(width, height))
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbImage {
        &self.image
    }

    pub fn image_mut(&mut self) -> &mut RgbImage {
        &mut self.image
    }

    pub fn into_image(self) -> RgbImage {
        self.image
    }
}

impl From<RgbImage> for Frame {
    fn from(image: RgbImage) -> Self {
        Self::new(image)
    }
}

/// Ordered frames plus the rate they play at.
#[derive(Debug, Clone, PartialEq)]
pub struct Video {
    frames: Vec<Frame>,
    fps: f64,
}

impl Video {
    pub fn new(frames: Vec<Frame>, fps: f64) -> Self {
        Self { frames, fps }
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn into_frames(self) -> Vec<Frame> {
        self.frames
    }

    pub fn fps(&self) -> f64 {
        self.fps
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// `(width, height)` of the first frame.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        self.frames.first().map(|f| (f.width(), f.height()))
    }

    /// Load every `*.png` in `dir`, in file name order.
    pub fn load_png_sequence(dir: impl AsRef<Path>, fps: f64) -> Result<Self> {
        let dir = dir.as_ref();
        let mut paths: Vec<PathBuf> = fs::read_dir(dir)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|p| {
                p.extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("png"))
            })
            .collect();
        paths.sort();

        let frames = paths
            .iter()
            .map(|p| Ok(Frame::new(image::open(p)?.to_rgb8())))
            .collect::<Result<Vec<_>>>()?;
        debug!(dir = %dir.display(), frames = frames.len(), "loaded png sequence");
        Ok(Self::new(frames, fps))
    }

    /// Write frames as `frame_000000.png`, `frame_000001.png`, ... into `dir`.
    pub fn save_png_sequence(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        fs::create_dir_all(dir)?;
        for (index, frame) in self.frames.iter().enumerate() {
            frame
                .image()
                .save(dir.join(format!("frame_{index:06}.png")))?;
        }
        debug!(dir = %dir.display(), frames = self.frames.len(), "saved png sequence");
        Ok(())
    }
}

impl<'a> IntoIterator for &'a Video {
    type Item = &'a Frame;
    type IntoIter = std::slice::Iter<'a, Frame>;

    fn into_iter(self) -> Self::IntoIter {
        self.frames.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgb;

    #[test]
    fn test_png_sequence_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let mut a = Frame::blank(8, 6);
        a.image_mut().put_pixel(1, 2, Rgb([255, 0, 0]));
        let b = Frame::blank(8, 6);
        let video = Video::new(vec![a.clone(), b.clone()], 25.0);

        video.save_png_sequence(dir.path()).unwrap();
        fs::write(dir.path().join("notes.txt"), "ignored").unwrap();

        let loaded = Video::load_png_sequence(dir.path(), 25.0).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.dimensions(), Some((8, 6)));
        assert_eq!(loaded.frames()[0], a);
        assert_eq!(loaded.frames()[1], b);
    }

    #[test]
    fn test_empty_video() {
        let video = Video::new(vec![], DEFAULT_FPS);
        assert!(video.is_empty());
        assert_eq!(video.dimensions(), None);
    }
}
