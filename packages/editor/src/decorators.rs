//! What a host renders for each decorator node.
//!
//! The editor never diffs decorator output (`update_dom` is always false
//! for them); the host asks for a fresh [`DecoratorView`] whenever the node
//! or its image load changes.

use crate::image_cache::{ImageCache, ImageSize, ImageStatus};
use quire_html::YOUTUBE_EMBED_BASE;
use quire_model::{DecoratorNode, Dimension, ImageNode, Node};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageState {
    /// Await `ImageCache::get(src)`, then decorate again
    Loading,
    Ready(ImageSize),
    /// Shown as a broken-image placeholder
    Broken,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImageView {
    pub src: String,
    pub alt_text: String,
    pub caption: String,
    pub width: Dimension,
    pub height: Dimension,
    pub max_width: u32,
    pub state: ImageState,
}

impl ImageView {
    /// Inline CSS for the `<img>` element
    pub fn style(&self) -> String {
        let size = |dimension: Dimension| match dimension.pixels() {
            Some(px) => format!("{}px", px),
            None => "inherit".to_string(),
        };
        format!(
            "max-width: {}px; width: {}; height: {};",
            self.max_width,
            size(self.width),
            size(self.height)
        )
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum DecoratorView {
    Image(ImageView),
    Divider,
    YouTube { video_id: String, embed_url: String },
}

/// View for a decorator node; `None` for text and elements.
///
/// Decorating an image requests its load from `images`, so the first call
/// usually reports [`ImageState::Loading`].
pub fn decorate(node: &Node, images: Option<&ImageCache>) -> Option<DecoratorView> {
    let view = match node.as_decorator()? {
        DecoratorNode::Image(image) => DecoratorView::Image(image_view(image, images)),
        DecoratorNode::Divider => DecoratorView::Divider,
        DecoratorNode::YouTube { video_id } => DecoratorView::YouTube {
            video_id: video_id.clone(),
            embed_url: format!("{}{}", YOUTUBE_EMBED_BASE, video_id),
        },
    };
    Some(view)
}

fn image_view(image: &ImageNode, images: Option<&ImageCache>) -> ImageView {
    let state = match images {
        Some(cache) => {
            let status = cache.status(&image.src).unwrap_or_else(|| {
                drop(cache.load(&image.src));
                ImageStatus::Pending
            });
            match status {
                ImageStatus::Pending => ImageState::Loading,
                ImageStatus::Ready(size) => ImageState::Ready(size),
                ImageStatus::Failed(_) => ImageState::Broken,
            }
        }
        None => ImageState::Loading,
    };
    ImageView {
        src: image.src.clone(),
        alt_text: image.alt_text.clone(),
        caption: image.caption.clone(),
        width: image.width,
        height: image.height,
        max_width: image.max_width,
        state,
    }
}
