use crate::common::VideoFrame;
use image::{DynamicImage, ImageBuffer, Rgb};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

/// A live video source the scheduler can poll once per tick.
pub trait VideoSource: Send + Sync {
    /// True once the source has decoded at least one frame.
    fn is_ready(&self) -> bool;

    /// Latest decoded frame, if any.
    fn current_frame(&self) -> Option<VideoFrame>;
}

/// In-process video source producing a flat gray image. Used by the demo
/// binary and by tests that need a source without camera hardware.
pub struct SyntheticVideoSource {
    image: Arc<DynamicImage>,
    ready: AtomicBool,
}

impl SyntheticVideoSource {
    pub fn new(width: u32, height: u32) -> Self {
        let image = DynamicImage::ImageRgb8(ImageBuffer::<Rgb<u8>, Vec<u8>>::from_pixel(
            width,
            height,
            Rgb([128, 128, 128]),
        ));
        Self {
            image: Arc::new(image),
            ready: AtomicBool::new(true),
        }
    }

    /// Simulates a source that has not decoded a frame yet (or stalled).
    pub fn set_ready(&self, ready: bool) {
        self.ready.store(ready, Ordering::SeqCst);
    }
}

impl VideoSource for SyntheticVideoSource {
    fn is_ready(&self) -> bool {
        self.ready.load(Ordering::SeqCst)
    }

    fn current_frame(&self) -> Option<VideoFrame> {
        if !self.is_ready() {
            return None;
        }
        Some(VideoFrame::from_shared(self.image.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn synthetic_source_serves_frames_when_ready() {
        let source = SyntheticVideoSource::new(64, 48);
        assert!(source.is_ready());
        let frame = source.current_frame().expect("frame");
        assert_eq!(frame.image().width(), 64);
        assert_eq!(frame.image().height(), 48);
    }

    #[test]
    fn unready_source_yields_no_frame() {
        let source = SyntheticVideoSource::new(64, 48);
        source.set_ready(false);
        assert!(!source.is_ready());
        assert!(source.current_frame().is_none());
    }
}
