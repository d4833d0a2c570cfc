pub mod envelope;
pub mod generation;
pub mod image;
pub mod reconstruction;
pub mod view;

pub use envelope::*;
pub use generation::*;
pub use image::*;
pub use reconstruction::*;
pub use view::*;
