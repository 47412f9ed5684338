//! Label placement for 3D vector tile maps.
//!
//! Decides every frame which text and icon labels of the visible tiles are
//! drawn, without overlap and with smooth fades.
//!
//! Provides:
//! - `TextElementsRenderer` for per-frame placement and fading
//! - `ScreenProjector` for world-to-screen projection
//! - Grid-based and R-tree screen collision detection
//! - `TextElementStateCache` for fade state and cross-tile deduplication
//! - Pre-placement filtering (visibility, zoom range, distance, POI rules)
//! - Path labels laid out along projected polylines
//! - Readiness signals for asynchronously loaded fonts and POI tables

pub mod canvas;
pub mod collision;
pub mod config;
pub mod diagnostics;
pub mod element;
pub mod error;
pub mod loading;
pub mod path_layout;
pub mod poi;
pub mod prefilter;
pub mod projection;
pub mod renderer;
pub mod rtree;
pub mod state;
pub mod state_cache;
pub mod tile;
pub mod view;

pub use canvas::{FrameRecorder, LabelPlacement, RecordedLabel, TextBufferParams, TextCanvas, TextRenderParams};
pub use collision::{CollisionIndex, ScreenCollisionGrid, ScreenRect};
pub use config::{CollisionBackend, PlacementConfig};
pub use diagnostics::{Diagnostics, LogDiagnostics, NoopDiagnostics};
pub use element::{Anchor, ElementKey, GlyphRun, LabelContent, PoiRef, TextBufferObject, TextElement};
pub use error::{LabelError, LabelResult};
pub use loading::{AssetRegistry, LoadSignal};
pub use path_layout::{layout_path_label, GlyphPlacement, PathLayout};
pub use poi::{PoiDisplayRule, PoiTable, PoiTableResolver, PoiTables};
pub use prefilter::{check_ready_for_placement, deduplicate_candidate, evaluate_element, PlacementContext, PlacementResult};
pub use projection::{Camera, MapProjection, ScreenProjector};
pub use renderer::{FrameStats, TextElementsRenderer};
pub use rtree::LabelRTree;
pub use state::{FadePhase, LabelState};
pub use state_cache::TextElementStateCache;
pub use tile::{Tile, TileKey, TileResultGroup};
pub use view::ViewState;
