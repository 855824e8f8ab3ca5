//! Render - ステータス表示の描画命令
//!
//! UI ツリーを直接書き換えず、(EntityId, Status) から描画命令のリストを作る純粋関数を提供します。
//! `StatusBoard` は命令を適用する側のモデル（テスト・CLI 用）。

use std::collections::{BTreeSet, HashMap};

use serde::Serialize;

use super::ids::EntityId;
use super::status::Status;

/// Class that marks an element as a status display element.
pub const MARKER_CLASS: &str = "ehf-status";

/// Class shown while a lookup is in flight.
pub const IN_FLIGHT_CLASS: &str = "spinner";

/// Mutually exclusive state classes. Applying an instruction removes all of them first.
pub const STATE_CLASSES: [&str; 4] = ["grønn", "gul", "rød", IN_FLIGHT_CLASS];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "status")]
pub enum RenderState {
    InFlight,
    Settled(Status),
}

impl RenderState {
    pub fn state_class(self) -> &'static str {
        match self {
            RenderState::InFlight => IN_FLIGHT_CLASS,
            RenderState::Settled(status) => status.label(),
        }
    }

    pub fn glyph(self) -> &'static str {
        match self {
            RenderState::InFlight => Status::Pending.glyph(),
            RenderState::Settled(status) => status.glyph(),
        }
    }
}

/// One visual update for every element bound to `entity_id`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderInstruction {
    pub entity_id: EntityId,
    pub state: RenderState,
}

impl RenderInstruction {
    pub fn in_flight(entity_id: EntityId) -> Self {
        Self {
            entity_id,
            state: RenderState::InFlight,
        }
    }

    pub fn settled(entity_id: EntityId, status: Status) -> Self {
        Self {
            entity_id,
            state: RenderState::Settled(status),
        }
    }

    pub fn state_class(&self) -> &'static str {
        self.state.state_class()
    }

    pub fn glyph(&self) -> &'static str {
        self.state.glyph()
    }
}

/// Pure mapping from resolved statuses to render instructions, in input order.
pub fn render<'a, I>(statuses: I) -> Vec<RenderInstruction>
where
    I: IntoIterator<Item = (&'a EntityId, &'a Status)>,
{
    statuses
        .into_iter()
        .map(|(id, status)| RenderInstruction::settled(id.clone(), *status))
        .collect()
}

/// Display element bound 1:1 to an entity id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusElement {
    entity_id: EntityId,
    classes: BTreeSet<String>,
    content: String,
}

impl StatusElement {
    pub fn new(entity_id: EntityId) -> Self {
        let mut classes = BTreeSet::new();
        classes.insert(MARKER_CLASS.to_string());
        Self {
            entity_id,
            classes,
            content: String::new(),
        }
    }

    pub fn entity_id(&self) -> &EntityId {
        &self.entity_id
    }

    pub fn classes(&self) -> &BTreeSet<String> {
        &self.classes
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.classes.contains(class)
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    fn apply(&mut self, state: RenderState) {
        for class in STATE_CLASSES {
            self.classes.remove(class);
        }
        self.classes.insert(state.state_class().to_string());
        self.content = state.glyph().to_string();
    }
}

/// The set of display elements on one page.
#[derive(Debug, Clone, Default)]
pub struct StatusBoard {
    elements: Vec<StatusElement>,
    written: HashMap<EntityId, Status>,
}

impl StatusBoard {
    pub fn new(elements: Vec<StatusElement>) -> Self {
        Self {
            elements,
            written: HashMap::new(),
        }
    }

    pub fn from_ids<I>(ids: I) -> Self
    where
        I: IntoIterator<Item = EntityId>,
    {
        Self::new(ids.into_iter().map(StatusElement::new).collect())
    }

    pub fn elements(&self) -> &[StatusElement] {
        &self.elements
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Distinct entity ids in document order.
    pub fn entity_ids(&self) -> Vec<EntityId> {
        let mut seen = BTreeSet::new();
        self.elements
            .iter()
            .filter(|el| seen.insert(el.entity_id.clone()))
            .map(|el| el.entity_id.clone())
            .collect()
    }

    /// Applies one instruction to every element bound to its entity id.
    /// Returns how many elements were touched.
    pub fn apply(&mut self, instruction: &RenderInstruction) -> usize {
        let mut touched = 0;
        for el in self
            .elements
            .iter_mut()
            .filter(|el| el.entity_id == instruction.entity_id)
        {
            el.apply(instruction.state);
            touched += 1;
        }
        if let RenderState::Settled(status) = instruction.state {
            self.written.insert(instruction.entity_id.clone(), status);
        }
        touched
    }

    pub fn apply_all<'a, I>(&mut self, instructions: I)
    where
        I: IntoIterator<Item = &'a RenderInstruction>,
    {
        for instruction in instructions {
            self.apply(instruction);
        }
    }

    /// Last status written for `id`, or `Pending` if it was never resolved.
    pub fn status_of(&self, id: &EntityId) -> Status {
        self.written.get(id).copied().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> EntityId {
        EntityId::new(s).unwrap()
    }

    #[test]
    fn render_keeps_input_order() {
        let a = id("A");
        let b = id("B");
        let statuses = [(a.clone(), Status::Rejected), (b.clone(), Status::Confirmed)];
        let out = render(statuses.iter().map(|(i, s)| (i, s)));

        assert_eq!(out.len(), 2);
        assert_eq!(out[0].entity_id, a);
        assert_eq!(out[0].state_class(), "rød");
        assert_eq!(out[0].glyph(), "❌");
        assert_eq!(out[1].entity_id, b);
        assert_eq!(out[1].state_class(), "grønn");
        assert_eq!(out[1].glyph(), "✅");
    }

    #[test]
    fn state_classes_are_mutually_exclusive() {
        let mut board = StatusBoard::from_ids([id("A")]);
        board.apply(&RenderInstruction::in_flight(id("A")));
        board.apply(&RenderInstruction::settled(id("A"), Status::Confirmed));

        let el = &board.elements()[0];
        assert!(el.has_class(MARKER_CLASS));
        assert!(el.has_class("grønn"));
        assert!(!el.has_class(IN_FLIGHT_CLASS));
        assert_eq!(el.classes().len(), 2);
        assert_eq!(el.content(), "✅");
    }

    #[test]
    fn status_of_defaults_to_pending() {
        let mut board = StatusBoard::from_ids([id("A"), id("B")]);
        board.apply(&RenderInstruction::in_flight(id("A")));
        assert_eq!(board.status_of(&id("A")), Status::Pending);

        board.apply(&RenderInstruction::settled(id("B"), Status::Rejected));
        assert_eq!(board.status_of(&id("B")), Status::Rejected);
    }

    #[test]
    fn apply_touches_every_element_with_the_id() {
        let mut board = StatusBoard::from_ids([id("A"), id("B"), id("A")]);
        let touched = board.apply(&RenderInstruction::settled(id("A"), Status::Confirmed));
        assert_eq!(touched, 2);
        assert_eq!(board.entity_ids(), vec![id("A"), id("B")]);
        assert_eq!(board.elements()[1].content(), "");
    }

    #[test]
    fn render_state_serializes_with_kind_tag() {
        let v = serde_json::to_value(RenderInstruction::settled(id("A"), Status::Confirmed))
            .unwrap();
        assert_eq!(v["entity_id"], "A");
        assert_eq!(v["state"]["kind"], "settled");
        assert_eq!(v["state"]["status"], "confirmed");
    }
}
