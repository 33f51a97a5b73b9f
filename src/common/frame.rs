use chrono::{DateTime, Utc};
use image::DynamicImage;
use std::sync::Arc;
use uuid::Uuid;

/// A single captured video frame. Cloning shares the pixel buffer so a
/// frame can be handed to an async estimator without copying the image.
#[derive(Debug, Clone)]
pub struct VideoFrame {
    image: Arc<DynamicImage>,
    captured_at: DateTime<Utc>,
    frame_id: Uuid,
}

impl VideoFrame {
    pub fn new(image: DynamicImage) -> Self {
        Self::from_shared(Arc::new(image))
    }

    pub fn from_shared(image: Arc<DynamicImage>) -> Self {
        Self {
            image,
            captured_at: Utc::now(),
            frame_id: Uuid::new_v4(),
        }
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    pub fn captured_at(&self) -> DateTime<Utc> {
        self.captured_at
    }

    pub fn id(&self) -> Uuid {
        self.frame_id
    }
}
