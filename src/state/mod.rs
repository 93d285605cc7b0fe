pub mod context;
mod interaction;

pub use context::{EditorContext, resized_rect};
pub use interaction::{GestureKind, InteractionState, angle_of, wrap_delta};
