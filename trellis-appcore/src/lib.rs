pub mod widget;
pub mod window;

pub use widget::{user_facing_capture_error, ChatWidget};
pub use window::WindowState;
