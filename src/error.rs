use thiserror::Error;

use crate::kv::KvError;

#[derive(Debug, Error)]
pub enum StoryError {
    #[error("please select an image file")]
    NotAnImage,
    #[error("failed to process image: {0}")]
    Image(#[from] image::ImageError),
    #[error("failed to read image file: {0}")]
    Read(#[from] std::io::Error),
    #[error("image task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
    #[error("no stories to view")]
    EmptyCollection,
    #[error("story index {index} out of range for {len} stories")]
    IndexOutOfRange { index: usize, len: usize },
    #[error("failed to persist stories: {0}")]
    Persist(#[from] KvError),
}
