mod draw;
mod layout;
pub mod palette;
pub mod theme;
pub mod widgets;

pub use draw::draw;
