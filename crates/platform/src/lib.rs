//! Platform layer: windowing via winit, Vulkan surface creation, and
//! keyboard/mouse input state.

mod input;
mod window;

pub use input::{InputState, KeyCode, MouseButton};
pub use window::{Surface, Window};

// Re-export the winit types applications handle directly.
pub use winit::event::WindowEvent;
pub use winit::event_loop::EventLoop;
