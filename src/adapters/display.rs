/*! Render decoded frames somewhere. [`FrameSink`] is the seam between
the frame buffer and whatever the client actually does with a
generation — write it to disk, hand it to a GUI, or (in tests) count
it. The original Qt client wired the decoder straight to its widget's
signal/slot mechanism; this trait stands in for that coupling.
*/

use async_trait::async_trait;

use crate::grid::Grid;

/// Something that can display (or otherwise consume) a decoded frame.
#[async_trait]
pub trait FrameSink: Send {
    /// Consume one frame.
    ///
    /// # Errors
    ///
    /// Implementations may fail, e.g. on a file I/O error.
    async fn display(&mut self, frame: &Grid) -> Result<(), crate::Error>;
}

/// Writes each frame as a PNG to a fixed path, overwriting the previous
/// one. Intended for headless use (e.g. a preview refreshed by polling).
pub struct PngFrameSink {
    path: std::path::PathBuf,
}

impl PngFrameSink {
    /// Write frames to `path`, one PNG per call to `display`.
    #[must_use]
    pub fn new(path: impl Into<std::path::PathBuf>) -> Self {
        Self { path: path.into() }
    }

    fn encode(frame: &Grid) -> Vec<u8> {
        let mut img = ::image::RgbImage::new(frame.width(), frame.height());
        for y in 0..frame.height() {
            for x in 0..frame.width() {
                let color = super::color_for(frame.get(x, y));
                img.put_pixel(x, y, ::image::Rgb(color));
            }
        }
        let mut buf = Vec::new();
        let mut cursor = std::io::Cursor::new(&mut buf);
        img.write_to(&mut cursor, ::image::ImageFormat::Png)
            .expect("encoding to an in-memory buffer cannot fail");
        buf
    }
}

#[async_trait]
impl FrameSink for PngFrameSink {
    async fn display(&mut self, frame: &Grid) -> Result<(), crate::Error> {
        let bytes = Self::encode(frame);
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }
}

/// Discards every frame; counts how many it was handed. Useful for
/// load-testing a session without actually rendering anything.
#[derive(Debug, Default)]
pub struct NullFrameSink {
    count: usize,
}

impl NullFrameSink {
    /// A sink that discards all frames.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// How many frames have been handed to this sink so far.
    #[must_use]
    pub fn count(&self) -> usize {
        self.count
    }
}

#[async_trait]
impl FrameSink for NullFrameSink {
    async fn display(&mut self, _frame: &Grid) -> Result<(), crate::Error> {
        self.count += 1;
        Ok(())
    }
}
