//! Control lifecycle: the state machine between the host and the renderer.
//!
//! Mirrors the hosting platform's control interface: `init` creates an
//! instance, `update_view` receives the current record set, `outputs`
//! reports the (empty) output payload, and `destroy` tears the instance
//! down. Every render rewrites the whole surface and replaces the
//! interaction bindings wholesale, so element ids from a previous render
//! can never fire a stale action.

use tracing::debug;

use crate::group::{self, Granularity};
use crate::html;
use crate::types::ActivityRecord;
use crate::view::{needs_pagination, page_count, Direction, ViewState};

/// One user interaction, decoded from a rendered element id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Switch grouping granularity; pagination restarts at page 1.
    SelectView(Granularity),
    /// Turn the shared page counter over the date-group list.
    DatePage(Direction),
    /// Turn the shared page counter within one group's item list.
    GroupPage(Direction, String),
}

/// An element id paired with the action it triggers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Binding {
    pub target: String,
    pub action: Action,
}

impl Binding {
    pub fn new(target: impl Into<String>, action: Action) -> Self {
        Self {
            target: target.into(),
            action,
        }
    }
}

/// Interaction bindings registered by the latest render.
///
/// Installing a new set drops the previous one wholesale, which is the
/// revocation step: a binding that is no longer installed cannot fire.
#[derive(Debug, Default)]
pub struct HandlerRegistry {
    bindings: Vec<Binding>,
}

impl HandlerRegistry {
    pub fn install(&mut self, bindings: Vec<Binding>) {
        self.bindings = bindings;
    }

    pub fn resolve(&self, target: &str) -> Option<&Action> {
        self.bindings
            .iter()
            .find(|b| b.target == target)
            .map(|b| &b.action)
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    /// Revoke every outstanding binding; returns how many were dropped.
    pub fn clear(&mut self) -> usize {
        let revoked = self.bindings.len();
        self.bindings.clear();
        revoked
    }
}

/// Output payload returned to the host. This control produces no
/// host-visible output values; the call exists for interface completeness.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Outputs {}

/// The timeline control instance.
///
/// Owns the view state, the current record set, the rendered surface, and
/// the interaction bindings. Single-threaded and synchronous: every
/// operation completes before returning to the host.
pub struct TimelineControl {
    records: Vec<ActivityRecord>,
    view: ViewState,
    surface: String,
    handlers: HandlerRegistry,
}

impl TimelineControl {
    /// Fresh instance: monthly view, page 1, empty surface, no bindings.
    pub fn init() -> Self {
        Self {
            records: Vec::new(),
            view: ViewState::new(),
            surface: String::new(),
            handlers: HandlerRegistry::default(),
        }
    }

    /// Host update path: replace the record set and re-render.
    ///
    /// The shared page counter survives updates but is clamped to the
    /// new page range so a shrunken dataset never strands the view on an
    /// empty window.
    pub fn update_view(&mut self, records: Vec<ActivityRecord>) {
        self.records = records;
        let max = self.max_page();
        self.view.clamp_page(max);
        self.render();
    }

    /// Dispatch an interaction by rendered element id.
    ///
    /// Unknown or stale targets are ignored; returns whether an action
    /// fired. Disabled boundary buttons have no binding, so a boundary
    /// page turn resolves to nothing here and stays a no-op.
    pub fn dispatch(&mut self, target: &str) -> bool {
        let Some(action) = self.handlers.resolve(target).cloned() else {
            return false;
        };
        debug!(element = %target, ?action, "Dispatching interaction");
        self.apply(action);
        self.render();
        true
    }

    /// The control's rendered subtree. Rewritten wholesale on every
    /// update or dispatched interaction.
    pub fn markup(&self) -> &str {
        &self.surface
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn records(&self) -> &[ActivityRecord] {
        &self.records
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }

    pub fn outputs(&self) -> Outputs {
        Outputs::default()
    }

    /// Teardown: clear the surface and the record set, and revoke all
    /// outstanding bindings. Safe to call more than once; the second
    /// call finds nothing left to revoke.
    pub fn destroy(&mut self) {
        self.surface.clear();
        self.records.clear();
        let revoked = self.handlers.clear();
        if revoked > 0 {
            debug!(revoked, "Handler bindings revoked");
        }
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::SelectView(granularity) => self.view.select_granularity(granularity),
            Action::DatePage(direction) => {
                let groups = group::group_and_order(&self.records, self.view.granularity);
                self.view.turn_page(direction, page_count(groups.len()));
            }
            Action::GroupPage(direction, key) => {
                let groups = group::group_and_order(&self.records, self.view.granularity);
                let len = groups
                    .iter()
                    .find(|g| g.key == key)
                    .map(|g| g.records.len())
                    .unwrap_or(0);
                self.view.turn_page(direction, page_count(len));
            }
        }
    }

    fn render(&mut self) {
        let rendered = html::render_timeline(&self.records, &self.view);
        self.surface = rendered.markup.into_string();
        self.handlers.install(rendered.bindings);
    }

    /// Largest page any pagination scope can currently reach.
    fn max_page(&self) -> usize {
        let groups = group::group_and_order(&self.records, self.view.granularity);
        let date_pages = if needs_pagination(groups.len()) {
            page_count(groups.len())
        } else {
            1
        };
        let group_pages = groups
            .iter()
            .filter(|g| needs_pagination(g.records.len()))
            .map(|g| page_count(g.records.len()))
            .max()
            .unwrap_or(1);
        date_pages.max(group_pages)
    }
}

impl Default for TimelineControl {
    fn default() -> Self {
        Self::init()
    }
}
