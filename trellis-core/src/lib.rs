pub mod config;
pub mod content;
pub mod conversation;
pub mod markup;
pub mod render;
pub mod types;

// Keep the public surface small and intentional.
pub use config::*;
pub use content::*;
pub use conversation::*;
pub use markup::*;
pub use render::*;
pub use types::*;
