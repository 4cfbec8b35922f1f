// SPDX-License-Identifier: MIT OR Apache-2.0
//! Scene bindings between graph nodes and live scene objects.

use crate::node::NodeId;
use crate::scene::{ObjectId, PropertyChange, PropertyObserver, Scene, WatchId};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;

/// Association between a node and the object it mirrors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SceneBinding {
    /// Bound node
    pub node: NodeId,
    /// Mirrored object
    pub object: ObjectId,
    watch: WatchId,
}

impl SceneBinding {
    /// Install change detection on `object` and record the binding.
    ///
    /// Returns `None` when the object is not in the scene.
    pub fn attach(scene: &mut Scene, node: NodeId, object: ObjectId, inbox: &ChangeInbox) -> Option<Self> {
        let watch = scene.watch(object, Arc::new(inbox.clone()))?;
        Some(Self {
            node,
            object,
            watch,
        })
    }

    /// Remove the watcher installed by [`SceneBinding::attach`]
    pub fn detach(&self, scene: &mut Scene) -> bool {
        scene.unwatch(self.object, self.watch)
    }
}

/// Observer collecting changed objects until the engine drains them.
///
/// Writes can arrive at any time (host edits, or bound nodes driving their
/// objects mid-tick); the engine resynchronizes the affected nodes at the
/// start of the next tick.
#[derive(Debug, Clone, Default)]
pub struct ChangeInbox {
    changed: Arc<Mutex<Vec<PropertyChange>>>,
}

impl ChangeInbox {
    /// Create an empty inbox
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the set of changed objects, in first-change order
    pub fn drain_objects(&self) -> Vec<ObjectId> {
        let changes = std::mem::take(&mut *self.changed.lock());
        let mut seen = HashSet::new();
        changes
            .into_iter()
            .map(|c| c.object)
            .filter(|id| seen.insert(*id))
            .collect()
    }

    /// Whether any change is pending
    pub fn is_empty(&self) -> bool {
        self.changed.lock().is_empty()
    }
}

impl PropertyObserver for ChangeInbox {
    fn property_changed(&self, change: &PropertyChange) {
        self.changed.lock().push(*change);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::SceneObject;

    #[test]
    fn test_attach_and_detach() {
        let mut scene = Scene::new();
        let object = scene.insert(SceneObject::new("Cube"));
        let inbox = ChangeInbox::new();

        let binding = SceneBinding::attach(&mut scene, NodeId(1), object, &inbox).unwrap();
        scene.get_mut(object).unwrap().set_position([1.0, 1.0, 1.0]);
        scene.get_mut(object).unwrap().set_rotation([0.5, 0.0, 0.0]);
        assert_eq!(inbox.drain_objects(), vec![object]);
        assert!(inbox.is_empty());

        assert!(binding.detach(&mut scene));
        scene.get_mut(object).unwrap().set_position([2.0, 2.0, 2.0]);
        assert!(inbox.is_empty());
    }

    #[test]
    fn test_attach_missing_object() {
        let mut scene = Scene::new();
        let inbox = ChangeInbox::new();
        assert!(SceneBinding::attach(&mut scene, NodeId(1), ObjectId::new(), &inbox).is_none());
    }
}
