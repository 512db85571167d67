pub mod post;
pub mod pre;

pub use post::{HIGHLIGHT_BGR, MASK_THRESHOLD, composite, threshold};
pub use pre::{IMAGENET_MEAN, IMAGENET_STD, prepare, restore};
