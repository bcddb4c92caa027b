//! Staged subtree deletion.
//!
//! A cascade removes a bubble and its descendants one breadth-first layer at
//! a time with a pause between layers, driven by the frame clock. The layers
//! are fixed when the cascade starts; every bubble in them is locked against
//! edits until the cascade finishes or is cancelled.

use bubble_core::{BubbleId, NodeIndex, SceneGraph};
use std::collections::{HashSet, VecDeque};

#[derive(Debug, Clone)]
pub struct Cascade {
    root: BubbleId,
    layers: VecDeque<Vec<BubbleId>>,
    doomed: HashSet<BubbleId>,
    /// Clock time at which the next layer is due.
    next_at_ms: f64,
}

impl Cascade {
    /// Plan the deletion of `root`'s subtree. The first layer is due at `now_ms`.
    pub fn plan(graph: &SceneGraph, root: NodeIndex, now_ms: f64) -> Option<Self> {
        let root_id = graph.id_of(root)?;
        let layers: VecDeque<Vec<BubbleId>> = graph
            .subtree_layers(root)
            .into_iter()
            .map(|layer| layer.into_iter().filter_map(|idx| graph.id_of(idx)).collect())
            .collect();
        let doomed = layers.iter().flatten().copied().collect();
        Some(Self {
            root: root_id,
            layers,
            doomed,
            next_at_ms: now_ms,
        })
    }

    pub fn root(&self) -> BubbleId {
        self.root
    }

    /// Whether `id` belongs to a layer that has not been removed yet.
    pub fn is_doomed(&self, id: BubbleId) -> bool {
        self.doomed.contains(&id)
    }

    pub fn remaining_layers(&self) -> usize {
        self.layers.len()
    }

    pub fn is_finished(&self) -> bool {
        self.layers.is_empty()
    }

    /// Take the next layer if it is due, scheduling the one after it
    /// `delay_ms` later.
    pub fn due_layer(&mut self, now_ms: f64, delay_ms: f64) -> Option<Vec<BubbleId>> {
        if now_ms < self.next_at_ms {
            return None;
        }
        let layer = self.layers.pop_front()?;
        for id in &layer {
            self.doomed.remove(id);
        }
        self.next_at_ms = now_ms + delay_ms;
        Some(layer)
    }

    /// Take every remaining layer at once.
    pub fn drain(&mut self) -> Vec<BubbleId> {
        self.doomed.clear();
        self.layers.drain(..).flatten().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bubble_core::{Bubble, BubbleKind, Vec2};

    fn chain() -> (SceneGraph, NodeIndex) {
        let mut sg = SceneGraph::new();
        let a = sg
            .insert(Bubble::new(BubbleId(1), "a", BubbleKind::Root, Vec2::ZERO))
            .unwrap();
        let b = sg
            .insert_child(a, Bubble::new(BubbleId(2), "b", BubbleKind::Branch, Vec2::ZERO))
            .unwrap();
        sg.insert_child(a, Bubble::new(BubbleId(3), "c", BubbleKind::Branch, Vec2::ZERO))
            .unwrap();
        sg.insert_child(b, Bubble::new(BubbleId(4), "d", BubbleKind::Branch, Vec2::ZERO))
            .unwrap();
        (sg, a)
    }

    #[test]
    fn layers_come_out_on_schedule() {
        let (sg, a) = chain();
        let mut c = Cascade::plan(&sg, a, 1000.0).unwrap();
        assert!(c.is_doomed(BubbleId(4)));
        assert_eq!(c.remaining_layers(), 3);

        assert_eq!(c.due_layer(1000.0, 80.0), Some(vec![BubbleId(1)]));
        assert!(!c.is_doomed(BubbleId(1)));
        assert_eq!(c.due_layer(1050.0, 80.0), None);
        assert_eq!(c.due_layer(1080.0, 80.0), Some(vec![BubbleId(2), BubbleId(3)]));
        assert_eq!(c.due_layer(1200.0, 80.0), Some(vec![BubbleId(4)]));
        assert!(c.is_finished());
        assert_eq!(c.due_layer(5000.0, 80.0), None);
    }

    #[test]
    fn drain_releases_everything() {
        let (sg, a) = chain();
        let mut c = Cascade::plan(&sg, a, 0.0).unwrap();
        c.due_layer(0.0, 80.0);
        assert_eq!(c.drain(), vec![BubbleId(2), BubbleId(3), BubbleId(4)]);
        assert!(c.is_finished());
        assert!(!c.is_doomed(BubbleId(4)));
    }
}
