//! Contextual Toolbar
//!
//! The session opens a toolbar for whatever it is working on and polls it
//! for actions each frame. Rendering the toolbar is the host's job.

use std::cell::RefCell;
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

use glam::Vec3;
use log::debug;

use crate::game::entity::EntityId;
use crate::game::scene::StackMode;
use crate::game::snap::SnapPolicy;

/// Which panel a toolbar shows; also the key actions are queued under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PanelKind {
    Placement,
    Selection,
    Stroke,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ToolbarAction {
    Confirm,
    Cancel,
    /// Quarter turn while placing, rotate handle while selecting
    Rotate,
    Move,
    Scale,
    Duplicate,
    Delete,
    Edit,
    /// Swap the selected entity for a new instance of `piece`
    Replace { piece: String },
    ToggleLocalSpace,
    TogglePerObject,
    /// Temporary color override for one slot of the placed entity
    Recolor { slot: usize, key: String },
    /// Scale change from the detail panel
    Rescale { scale: Vec3 },
    SetSnap(SnapPolicy),
    SetStacking(StackMode),
    ToggleAlign,
    /// Something the toolbar displays changed and should be re-read
    ContentChanged,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ToolbarRequest {
    pub panel: PanelKind,
    pub entities: Vec<EntityId>,
    pub actions: Vec<ToolbarAction>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ToolbarHandle(pub u64);

pub trait UiToolbar {
    fn open(&mut self, request: ToolbarRequest) -> ToolbarHandle;

    fn close(&mut self, handle: ToolbarHandle);

    /// Drain actions the user triggered on `panel` since the last poll.
    fn poll_actions(&mut self, panel: PanelKind) -> Vec<ToolbarAction>;

    /// User-facing message, e.g. a refused purchase.
    fn show_message(&mut self, message: &str);
}

#[derive(Debug, Default)]
struct ToolbarLog {
    next_handle: u64,
    open: BTreeMap<ToolbarHandle, ToolbarRequest>,
    opened_total: usize,
    messages: Vec<String>,
    queued: BTreeMap<PanelKind, VecDeque<ToolbarAction>>,
}

/// Toolbar that records what it was asked to show and replays queued
/// actions. Clones share the same log, so a test can keep one clone and hand
/// the other to the session.
#[derive(Debug, Clone, Default)]
pub struct RecordingToolbar {
    log: Rc<RefCell<ToolbarLog>>,
}

impl RecordingToolbar {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pretend the user pressed `action` on `panel`.
    pub fn queue(&self, panel: PanelKind, action: ToolbarAction) {
        self.log.borrow_mut().queued.entry(panel).or_default().push_back(action);
    }

    pub fn messages(&self) -> Vec<String> {
        self.log.borrow().messages.clone()
    }

    /// Requests of the toolbars currently open.
    pub fn open_requests(&self) -> Vec<ToolbarRequest> {
        self.log.borrow().open.values().cloned().collect()
    }

    pub fn is_open(&self, panel: PanelKind) -> bool {
        self.log.borrow().open.values().any(|r| r.panel == panel)
    }

    pub fn opened_total(&self) -> usize {
        self.log.borrow().opened_total
    }
}

impl UiToolbar for RecordingToolbar {
    fn open(&mut self, request: ToolbarRequest) -> ToolbarHandle {
        let mut log = self.log.borrow_mut();
        log.next_handle += 1;
        let handle = ToolbarHandle(log.next_handle);
        debug!("[Toolbar] Open {:?} for {} entities", request.panel, request.entities.len());
        log.open.insert(handle, request);
        log.opened_total += 1;
        handle
    }

    fn close(&mut self, handle: ToolbarHandle) {
        self.log.borrow_mut().open.remove(&handle);
    }

    fn poll_actions(&mut self, panel: PanelKind) -> Vec<ToolbarAction> {
        self.log
            .borrow_mut()
            .queued
            .get_mut(&panel)
            .map(|q| q.drain(..).collect())
            .unwrap_or_default()
    }

    fn show_message(&mut self, message: &str) {
        self.log.borrow_mut().messages.push(message.to_string());
    }
}
