mod builder;
mod json;
mod model;

pub use builder::{build, Settings};
pub use json::{apply_overrides, load};
