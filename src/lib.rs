#![warn(clippy::all, rust_2018_idioms)]

pub mod canvas;
pub mod catalog;
pub mod command;
pub mod compositor;
pub mod config;
pub mod error;
pub mod event;
pub mod export;
pub mod geometry;
pub mod input;
pub mod loader;
pub mod overlay;
pub mod scene;
pub mod state;
pub mod util;

pub use canvas::{BaseImage, CanvasState, LayerDirection, Placement, Viewport};
pub use catalog::CatalogItem;
pub use command::{CanvasAction, UndoAction, UndoHistory};
pub use compositor::{Composition, Compositor};
pub use config::EditorConfig;
pub use error::{ConfigError, ExportError, InputError, LoadError, SceneError, StateTransitionError};
pub use event::{EditorEvent, EventBus, EventHandler};
pub use export::{DirectorySink, ExportArtifact, ExportSink, Exporter, MemorySink};
pub use input::{FocusTarget, InputEvent, InputHandler, route_event};
pub use loader::{FsImageLoader, ImageLoader, ImageRef, MemoryImageLoader};
pub use overlay::{Overlay, OverlayId, OverlayPatch, OverlaySource};
pub use state::{EditorContext, GestureKind, InteractionState};
