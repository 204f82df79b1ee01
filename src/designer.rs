//! One editing session of the workflow designer.
//!
//! [`WorkflowDesigner`] owns the graph of the open definition, its layout,
//! the gesture state machine and the open transition proposal. Every
//! mutation is followed by a [`DesignerEvent`] to each subscriber so a
//! render surface can redraw.

use crate::backend::WorkflowBackend;
use crate::config::DesignerConfig;
use crate::error::{DesignerError, Result, ValidationError};
use crate::geometry::Point;
use crate::graph::{WorkflowGraph, normalize};
use crate::intent::{EdgeIntentEmitter, PendingProposal, TransitionDraft};
use crate::interaction::{
    GestureHandle, GestureOutcome, InteractionController, InteractionState, PointerEffect, Selection,
};
use crate::layout::{LayoutStorage, LayoutStore, PositionMap};
use crate::model::{
    DefinitionDetail, NewDefinition, NewState, ProcessDefinition, ProcessType, RecordId,
};
use crate::scene::Scene;

#[derive(Debug, Clone, PartialEq)]
pub enum DesignerEvent {
    CatalogueRefreshed { count: usize },
    GraphReloaded { definition_id: RecordId },
    PositionChanged { state_key: String, position: Point },
    SelectionChanged(Selection),
    InteractionChanged(InteractionState),
    ProposalOpened(TransitionDraft),
    ProposalClosed,
    /// A user action failed; `message` is meant for display.
    ActionFailed { action: &'static str, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Observer = Box<dyn FnMut(&DesignerEvent)>;

/// Issued when a definition load starts. Only the most recently issued
/// ticket may apply its response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    definition_id: RecordId,
    generation: u64,
}

impl LoadTicket {
    pub fn definition_id(&self) -> &RecordId {
        &self.definition_id
    }
}

pub struct WorkflowDesigner<B, S> {
    backend: B,
    config: DesignerConfig,
    layout: LayoutStore<S>,
    catalogue: Vec<ProcessDefinition>,
    catalogue_filter: Option<ProcessType>,
    definition_id: Option<RecordId>,
    graph: WorkflowGraph,
    interaction: InteractionController,
    intents: EdgeIntentEmitter,
    observers: Vec<(SubscriptionId, Observer)>,
    next_subscription: u64,
    load_generation: u64,
}

impl<B: WorkflowBackend, S: LayoutStorage> WorkflowDesigner<B, S> {
    pub fn new(backend: B, storage: S, config: DesignerConfig) -> Self {
        let layout = LayoutStore::new(storage, &config.storage.key_namespace, config.grid.clone());
        Self {
            backend,
            config,
            layout,
            catalogue: Vec::new(),
            catalogue_filter: None,
            definition_id: None,
            graph: WorkflowGraph::new(),
            interaction: InteractionController::new(),
            intents: EdgeIntentEmitter::new(),
            observers: Vec::new(),
            next_subscription: 0,
            load_generation: 0,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn config(&self) -> &DesignerConfig {
        &self.config
    }

    pub fn layout(&self) -> &LayoutStore<S> {
        &self.layout
    }

    pub fn graph(&self) -> &WorkflowGraph {
        &self.graph
    }

    pub fn catalogue(&self) -> &[ProcessDefinition] {
        &self.catalogue
    }

    pub fn definition_id(&self) -> Option<&RecordId> {
        self.definition_id.as_ref()
    }

    pub fn interaction_state(&self) -> &InteractionState {
        self.interaction.state()
    }

    pub fn selection(&self) -> &Selection {
        self.interaction.selection()
    }

    pub fn pending_proposal(&self) -> Option<&PendingProposal> {
        self.intents.pending()
    }

    pub fn position_of(&self, state_key: &str) -> Option<Point> {
        let definition_id = self.definition_id.as_ref()?;
        self.layout.position_of(definition_id.as_str(), state_key)
    }

    pub fn positions(&self) -> Option<&PositionMap> {
        let definition_id = self.definition_id.as_ref()?;
        self.layout.positions(definition_id.as_str())
    }

    pub fn scene(&self) -> Scene {
        Scene::build(
            &self.graph,
            self.positions(),
            self.interaction.state(),
            self.interaction.selection(),
            &self.config,
        )
    }

    // ── Observers ───────────────────────────────────────────────────

    pub fn subscribe(&mut self, observer: impl FnMut(&DesignerEvent) + 'static) -> SubscriptionId {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.observers.push((id, Box::new(observer)));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.observers.len();
        self.observers.retain(|(existing, _)| *existing != id);
        self.observers.len() != before
    }

    fn notify(&mut self, event: DesignerEvent) {
        for (_, observer) in &mut self.observers {
            observer(&event);
        }
    }

    fn report<T>(&mut self, action: &'static str, result: Result<T>) -> Result<T> {
        if let Err(err) = &result {
            self.notify(DesignerEvent::ActionFailed {
                action,
                message: err.to_string(),
            });
        }
        result
    }

    // ── Definitions ─────────────────────────────────────────────────

    pub fn refresh_catalogue(&mut self, process_type: Option<ProcessType>) -> Result<&[ProcessDefinition]> {
        let result = self
            .backend
            .list_definitions(process_type)
            .map_err(DesignerError::from);
        let definitions = self.report("list definitions", result)?;
        tracing::info!(count = definitions.len(), filter = ?process_type, "definitions listed");
        self.catalogue = definitions;
        self.catalogue_filter = process_type;
        self.notify(DesignerEvent::CatalogueRefreshed {
            count: self.catalogue.len(),
        });
        Ok(self.catalogue.as_slice())
    }

    pub fn create_definition(&mut self, definition: &NewDefinition) -> Result<()> {
        let result = self
            .backend
            .create_definition(definition)
            .map_err(DesignerError::from);
        self.report("create definition", result)?;
        tracing::info!(key = %definition.key, version = definition.version, "definition created");
        self.refresh_catalogue(self.catalogue_filter)?;
        Ok(())
    }

    pub fn activate_definition(&mut self, id: &RecordId) -> Result<()> {
        let result = self.backend.activate_definition(id).map_err(DesignerError::from);
        self.report("activate definition", result)?;
        tracing::info!(definition_id = %id, "definition activated");
        self.refresh_catalogue(self.catalogue_filter)?;
        if self.definition_id.as_ref() == Some(id) {
            self.reload()?;
        }
        Ok(())
    }

    /// Loads a definition from the backend and makes it the open one. On
    /// failure the previously rendered graph stays as it was and a load the
    /// host already began stays current.
    pub fn open_definition(&mut self, id: &RecordId) -> Result<()> {
        let result = self.backend.get_definition(id).map_err(DesignerError::from);
        let detail = self.report("load definition", result)?;
        let ticket = self.begin_load(id);
        self.apply_load(ticket, detail);
        Ok(())
    }

    /// Fully reloads the open definition.
    pub fn reload(&mut self) -> Result<()> {
        let id = self
            .definition_id
            .clone()
            .ok_or(DesignerError::NoActiveDefinition)?;
        self.open_definition(&id)
    }

    /// Starts a load whose response the host fetches on its own schedule.
    /// Starting another load makes this ticket stale.
    pub fn begin_load(&mut self, id: &RecordId) -> LoadTicket {
        self.load_generation += 1;
        LoadTicket {
            definition_id: id.clone(),
            generation: self.load_generation,
        }
    }

    /// Replaces the graph with `detail` if `ticket` is still the latest load.
    /// Returns whether the detail was applied.
    pub fn apply_load(&mut self, ticket: LoadTicket, detail: DefinitionDetail) -> bool {
        if ticket.generation != self.load_generation {
            tracing::warn!(
                definition_id = %ticket.definition_id,
                generation = ticket.generation,
                latest = self.load_generation,
                "dropping stale definition response"
            );
            return false;
        }

        let switched = self.definition_id.as_ref() != Some(&ticket.definition_id);
        let graph = normalize(detail);
        let keys = graph.state_keys();
        self.layout.seed_defaults(ticket.definition_id.as_str(), &keys);
        self.graph = graph;

        if switched {
            self.interaction.cancel();
            self.interaction.clear_selection();
            if self.intents.cancel().is_some() {
                self.notify(DesignerEvent::ProposalClosed);
            }
        } else {
            self.drop_dangling_state();
        }

        tracing::info!(
            definition_id = %ticket.definition_id,
            states = self.graph.nodes.len(),
            transitions = self.graph.edges.len(),
            "definition loaded"
        );
        self.definition_id = Some(ticket.definition_id.clone());
        self.notify(DesignerEvent::GraphReloaded {
            definition_id: ticket.definition_id,
        });
        true
    }

    /// After a same-definition reload, forget gestures and selections that
    /// point at nodes or edges the backend no longer returns.
    fn drop_dangling_state(&mut self) {
        let gesture_key = match self.interaction.state() {
            InteractionState::Dragging { state_key, .. } => Some(state_key.clone()),
            InteractionState::Connecting { from_state_key, .. } => Some(from_state_key.clone()),
            InteractionState::Idle => None,
        };
        if gesture_key.is_some_and(|key| !self.graph.contains(&key)) {
            self.interaction.cancel();
        }
        let stale = match self.interaction.selection() {
            Selection::Node(key) => !self.graph.contains(key),
            Selection::Edge(index) => *index >= self.graph.edges.len(),
            Selection::None => false,
        };
        if stale {
            self.interaction.clear_selection();
        }
    }

    /// Asks the backend for a new state, then reloads. Nodes only ever appear
    /// once the backend returns them.
    pub fn add_state(&mut self, state: &NewState) -> Result<()> {
        let id = self
            .definition_id
            .clone()
            .ok_or(DesignerError::NoActiveDefinition)?;
        let result = validate_state(state)
            .map_err(DesignerError::from)
            .and_then(|state| self.backend.add_state(&id, &state).map_err(DesignerError::from));
        self.report("add state", result)?;
        tracing::info!(definition_id = %id, state_key = %state.state_key, "state added");
        self.reload()
    }

    // ── Gestures ────────────────────────────────────────────────────

    pub fn begin_drag(&mut self, state_key: &str, pointer_offset: Point) -> Result<GestureHandle> {
        self.require_state(state_key)?;
        let handle = self.interaction.begin_drag(state_key, pointer_offset)?;
        self.notify(DesignerEvent::SelectionChanged(self.interaction.selection().clone()));
        self.notify(DesignerEvent::InteractionChanged(self.interaction.state().clone()));
        Ok(handle)
    }

    pub fn begin_connect(&mut self, from_state_key: &str, pointer: Point) -> Result<GestureHandle> {
        self.require_state(from_state_key)?;
        let handle = self.interaction.begin_connect(from_state_key, pointer)?;
        self.notify(DesignerEvent::InteractionChanged(self.interaction.state().clone()));
        Ok(handle)
    }

    /// Pointer-down in canvas coordinates: a port starts a connect, a node
    /// body starts a drag, empty canvas clears the selection.
    pub fn pointer_down(&mut self, pointer: Point) -> Result<Option<GestureHandle>> {
        let scene = self.scene();
        if let Some(node) = scene.port_at(pointer, self.config.canvas.port_width) {
            return self.begin_connect(&node.state_key, pointer).map(Some);
        }
        if let Some(node) = scene.node_at(pointer) {
            let offset = pointer.minus(node.rect.origin());
            return self.begin_drag(&node.state_key, offset).map(Some);
        }
        self.clear_selection();
        Ok(None)
    }

    pub fn pointer_move(&mut self, pointer: Point) -> Result<()> {
        let Some(effect) = self.interaction.pointer_move(pointer, &self.config.canvas) else {
            return Ok(());
        };
        match effect {
            PointerEffect::NodeMoved { state_key, position } => {
                let id = self
                    .definition_id
                    .clone()
                    .ok_or(DesignerError::NoActiveDefinition)?;
                self.layout
                    .set_position(id.as_str(), &state_key, position.x, position.y)?;
                self.notify(DesignerEvent::PositionChanged { state_key, position });
            }
            PointerEffect::PreviewMoved { .. } => {
                self.notify(DesignerEvent::InteractionChanged(self.interaction.state().clone()));
            }
        }
        Ok(())
    }

    /// Pointer-up at `pointer`. A connect released over another node's body
    /// opens a transition proposal.
    pub fn end_gesture(&mut self, handle: GestureHandle, pointer: Point) -> GestureOutcome {
        let target = self
            .scene()
            .node_at(pointer)
            .map(|node| node.state_key.clone());
        let outcome = self.interaction.end_gesture(handle, target.as_deref());
        if outcome == GestureOutcome::Ignored {
            return outcome;
        }
        self.notify(DesignerEvent::InteractionChanged(InteractionState::Idle));
        if let GestureOutcome::ConnectRequested {
            from_state_key,
            to_state_key,
        } = &outcome
        {
            let draft = self.intents.propose_edge(from_state_key, to_state_key).clone();
            self.notify(DesignerEvent::ProposalOpened(draft));
        }
        outcome
    }

    // ── Selection ───────────────────────────────────────────────────

    pub fn select_node(&mut self, state_key: &str) -> Result<()> {
        self.require_state(state_key)?;
        self.interaction.select_node(state_key);
        self.notify(DesignerEvent::SelectionChanged(self.interaction.selection().clone()));
        Ok(())
    }

    pub fn select_edge(&mut self, index: usize) -> Result<()> {
        let Some(edge) = self.graph.edge(index) else {
            return Err(DesignerError::UnknownTransition(index));
        };
        tracing::debug!(index, event = %edge.event_key, "edge selected");
        self.interaction.select_edge(index);
        self.notify(DesignerEvent::SelectionChanged(self.interaction.selection().clone()));
        Ok(())
    }

    pub fn clear_selection(&mut self) {
        if *self.interaction.selection() == Selection::None {
            return;
        }
        self.interaction.clear_selection();
        self.notify(DesignerEvent::SelectionChanged(Selection::None));
    }

    // ── Transition proposal ─────────────────────────────────────────

    /// Opens a proposal directly, without a gesture.
    pub fn propose_edge(&mut self, from_state_key: &str, to_state_key: &str) -> Result<&TransitionDraft> {
        self.require_state(from_state_key)?;
        self.require_state(to_state_key)?;
        let draft = self.intents.propose_edge(from_state_key, to_state_key).clone();
        self.notify(DesignerEvent::ProposalOpened(draft));
        self.intents
            .pending()
            .map(|proposal| &proposal.draft)
            .ok_or(DesignerError::NoPendingProposal)
    }

    pub fn edit_proposal(&mut self, edit: impl FnOnce(&mut TransitionDraft)) -> Result<()> {
        let draft = self
            .intents
            .draft_mut()
            .ok_or(DesignerError::NoPendingProposal)?;
        edit(draft);
        Ok(())
    }

    /// Sends the open proposal. On success the proposal closes and the whole
    /// definition is reloaded; on failure the proposal stays open with its
    /// error and nothing else changes.
    pub fn submit_proposal(&mut self) -> Result<()> {
        let id = self
            .definition_id
            .clone()
            .ok_or(DesignerError::NoActiveDefinition)?;
        let result = self.intents.submit(&self.backend, &id);
        self.report("add transition", result)?;
        self.notify(DesignerEvent::ProposalClosed);
        self.reload()
    }

    pub fn cancel_proposal(&mut self) {
        if self.intents.cancel().is_some() {
            self.notify(DesignerEvent::ProposalClosed);
        }
    }

    fn require_state(&self, state_key: &str) -> Result<()> {
        if self.definition_id.is_none() {
            return Err(DesignerError::NoActiveDefinition);
        }
        if !self.graph.contains(state_key) {
            return Err(DesignerError::UnknownState(state_key.to_string()));
        }
        Ok(())
    }
}

fn validate_state(state: &NewState) -> std::result::Result<NewState, ValidationError> {
    let state_key = state.state_key.trim();
    if state_key.is_empty() {
        return Err(ValidationError::EmptyStateKey);
    }
    let name = state.name.trim();
    if name.is_empty() {
        return Err(ValidationError::EmptyName);
    }
    Ok(NewState {
        state_key: state_key.to_string(),
        name: name.to_string(),
        ..state.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::StateType;

    #[test]
    fn state_validation_trims() {
        let state = NewState {
            state_key: " RESOLVED ".to_string(),
            name: " Resolved".to_string(),
            state_type: StateType::Normal,
            external_status: None,
            ui_color: None,
        };
        let valid = validate_state(&state).unwrap();
        assert_eq!(valid.state_key, "RESOLVED");
        assert_eq!(valid.name, "Resolved");

        let blank = NewState {
            state_key: "  ".to_string(),
            ..state
        };
        assert_eq!(validate_state(&blank), Err(ValidationError::EmptyStateKey));
    }
}
