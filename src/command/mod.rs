mod commands;
mod history;

pub use commands::{Applied, CanvasAction};
pub use history::{UndoAction, UndoHistory};
