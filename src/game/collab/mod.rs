//! External Collaborators
//!
//! The narrow interfaces the placement engine consumes (spatial queries,
//! terrain, economy, undo history, toolbar UI) plus in-memory
//! implementations used by the demo and the tests. The session receives a
//! [`Collaborators`] bundle at construction; nothing is reached through
//! global state.

pub mod economy;
pub mod spatial;
pub mod terrain;
pub mod toolbar;
pub mod undo;

pub use economy::{Economy, Wallet};
pub use spatial::{LayerMask, RayHit, SceneQuery, SpatialQuery};
pub use terrain::{FlatTerrain, HeightFieldTerrain, TerrainProvider, TerrainSample};
pub use toolbar::{PanelKind, RecordingToolbar, ToolbarAction, ToolbarHandle, ToolbarRequest, UiToolbar};
pub use undo::{UndoHistory, UndoLog};

/// Every collaborator a placement session talks to.
pub struct Collaborators {
    pub spatial: Box<dyn SpatialQuery>,
    pub terrain: Box<dyn TerrainProvider>,
    pub economy: Box<dyn Economy>,
    pub undo: Box<dyn UndoHistory>,
    pub ui: Box<dyn UiToolbar>,
}

impl Collaborators {
    pub fn new(
        spatial: Box<dyn SpatialQuery>,
        terrain: Box<dyn TerrainProvider>,
        economy: Box<dyn Economy>,
        undo: Box<dyn UndoHistory>,
        ui: Box<dyn UiToolbar>,
    ) -> Self {
        Self {
            spatial,
            terrain,
            economy,
            undo,
            ui,
        }
    }

    /// In-memory collaborators on flat ground with a wallet of `balance`.
    pub fn in_memory(balance: i64) -> Self {
        Self::new(
            Box::new(SceneQuery),
            Box::new(FlatTerrain::new(0.0)),
            Box::new(Wallet::new(balance)),
            Box::new(UndoLog::new()),
            Box::new(RecordingToolbar::new()),
        )
    }

    pub fn with_ui(mut self, ui: Box<dyn UiToolbar>) -> Self {
        self.ui = ui;
        self
    }

    pub fn with_terrain(mut self, terrain: Box<dyn TerrainProvider>) -> Self {
        self.terrain = terrain;
        self
    }
}
