//! Per-run dependency bookkeeping.
//!
//! Every object the scheduler has discovered but not yet completed owns a
//! [`DependencyState`]. A state is removed the moment its object completes,
//! so the set of live states is exactly the set of in-flight objects.

use std::collections::{HashMap, HashSet};

use gitdag_types::ObjectHash;

use crate::error::{PushError, PushResult};

/// Bookkeeping for one in-flight object.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct DependencyState {
    /// Children not yet complete.
    pub outstanding: usize,
    /// Objects whose `outstanding` counts this one.
    pub waiting_parents: Vec<ObjectHash>,
    /// Links were extracted; `outstanding` no longer grows.
    pub resolved: bool,
    /// The sink acknowledged this object's node.
    pub committed: bool,
    /// A completion item ran before the sink acknowledged; it is requeued on
    /// acknowledgement.
    pub parked: bool,
    /// A completion item is queued or parked.
    pub completion_queued: bool,
}

impl DependencyState {
    fn ready(&self) -> bool {
        self.resolved && self.outstanding == 0 && !self.completion_queued
    }
}

/// Dependency states of one run plus the objects it completed.
#[derive(Debug, Default)]
pub struct DependencyTracker {
    states: HashMap<ObjectHash, DependencyState>,
    completed: HashSet<ObjectHash>,
}

impl DependencyTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start tracking `hash`. Returns `false` if it already was tracked or
    /// completed.
    pub fn track(&mut self, hash: ObjectHash) -> bool {
        if self.completed.contains(&hash) || self.states.contains_key(&hash) {
            return false;
        }
        self.states.insert(hash, DependencyState::default());
        true
    }

    pub fn is_tracked(&self, hash: &ObjectHash) -> bool {
        self.states.contains_key(hash)
    }

    /// Whether `hash` completed during this run.
    pub fn is_completed(&self, hash: &ObjectHash) -> bool {
        self.completed.contains(hash)
    }

    /// Whether `hash` was already processed this run.
    pub fn is_resolved(&self, hash: &ObjectHash) -> bool {
        self.states.get(hash).is_some_and(|s| s.resolved)
    }

    pub fn state(&self, hash: &ObjectHash) -> Option<&DependencyState> {
        self.states.get(hash)
    }

    /// Number of objects discovered but not complete.
    pub fn pending(&self) -> usize {
        self.states.len()
    }

    /// Some object that has not completed, if any.
    pub fn first_pending(&self) -> Option<ObjectHash> {
        self.states.keys().min().copied()
    }

    /// Record that `parent` cannot complete before `child`.
    ///
    /// Returns `true` if `child` was not tracked before and must be
    /// scheduled by the caller.
    pub fn add_dependency(&mut self, parent: ObjectHash, child: ObjectHash) -> PushResult<bool> {
        let parent_state = self.states.get_mut(&parent).ok_or_else(|| {
            PushError::invariant(parent, "dependency added to untracked parent")
        })?;
        if parent_state.resolved {
            return Err(PushError::invariant(parent, "dependency added after resolution"));
        }
        parent_state.outstanding += 1;

        let newly_tracked = self.track(child);
        let child_state = self
            .states
            .get_mut(&child)
            .ok_or_else(|| PushError::invariant(child, "dependency on completed child"))?;
        child_state.waiting_parents.push(parent);
        Ok(newly_tracked)
    }

    /// Mark the links of `hash` as fully recorded.
    ///
    /// Returns `true` if nothing is outstanding and a completion item must be
    /// queued.
    pub fn mark_resolved(&mut self, hash: &ObjectHash) -> PushResult<bool> {
        let state = self
            .states
            .get_mut(hash)
            .ok_or_else(|| PushError::invariant(*hash, "resolving untracked object"))?;
        state.resolved = true;
        Ok(claim(state))
    }

    /// Record the sink acknowledgement for `hash`.
    ///
    /// Returns `true` if a completion item was parked waiting for it and must
    /// be queued again.
    pub fn mark_committed(&mut self, hash: &ObjectHash) -> PushResult<bool> {
        let state = self
            .states
            .get_mut(hash)
            .ok_or_else(|| PushError::invariant(*hash, "acknowledgement for untracked object"))?;
        state.committed = true;
        Ok(std::mem::take(&mut state.parked))
    }

    /// Called when a completion item for `hash` runs.
    ///
    /// Returns `true` if the object may complete now. Otherwise the item is
    /// parked until [`mark_committed`](Self::mark_committed).
    pub fn try_begin_completion(&mut self, hash: &ObjectHash) -> PushResult<bool> {
        let state = self
            .states
            .get_mut(hash)
            .ok_or_else(|| PushError::invariant(*hash, "completion for untracked object"))?;
        if state.outstanding != 0 || !state.completion_queued {
            return Err(PushError::invariant(*hash, "completion with outstanding children"));
        }
        if state.committed {
            Ok(true)
        } else {
            state.parked = true;
            Ok(false)
        }
    }

    /// Retire `hash` and release its waiting parents.
    ///
    /// Returns the parents that became ready; the caller queues a completion
    /// item for each.
    pub fn finish(&mut self, hash: &ObjectHash) -> PushResult<Vec<ObjectHash>> {
        let state = self
            .states
            .remove(hash)
            .ok_or_else(|| PushError::invariant(*hash, "finishing untracked object"))?;
        self.completed.insert(*hash);

        let mut ready = Vec::new();
        for parent in state.waiting_parents {
            let parent_state = self.states.get_mut(&parent).ok_or_else(|| {
                PushError::invariant(parent, "waiting parent completed before its child")
            })?;
            parent_state.outstanding = parent_state
                .outstanding
                .checked_sub(1)
                .ok_or_else(|| PushError::invariant(parent, "outstanding count underflow"))?;
            if claim(parent_state) {
                ready.push(parent);
            }
        }
        Ok(ready)
    }
}

/// Claim the single completion item of a ready state.
fn claim(state: &mut DependencyState) -> bool {
    if state.ready() {
        state.completion_queued = true;
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn h(n: u8) -> ObjectHash {
        ObjectHash::from_raw([n; 20])
    }

    #[test]
    fn leaf_is_ready_once_resolved() {
        let mut d = DependencyTracker::new();
        assert!(d.track(h(1)));
        assert!(!d.track(h(1)));
        assert!(d.mark_resolved(&h(1)).unwrap());
        // Only one completion item is ever claimed.
        assert!(!d.mark_resolved(&h(1)).unwrap());
    }

    #[test]
    fn completion_parks_until_committed() {
        let mut d = DependencyTracker::new();
        d.track(h(1));
        d.mark_resolved(&h(1)).unwrap();
        assert!(!d.try_begin_completion(&h(1)).unwrap());
        assert!(d.state(&h(1)).unwrap().parked);
        assert!(d.mark_committed(&h(1)).unwrap());
        assert!(d.try_begin_completion(&h(1)).unwrap());
    }

    #[test]
    fn ack_before_completion_does_not_requeue() {
        let mut d = DependencyTracker::new();
        d.track(h(1));
        d.mark_resolved(&h(1)).unwrap();
        assert!(!d.mark_committed(&h(1)).unwrap());
        assert!(d.try_begin_completion(&h(1)).unwrap());
    }

    #[test]
    fn cascade_releases_parent_after_last_child() {
        let mut d = DependencyTracker::new();
        d.track(h(1));
        assert!(d.add_dependency(h(1), h(2)).unwrap());
        assert!(d.add_dependency(h(1), h(3)).unwrap());
        assert!(!d.mark_resolved(&h(1)).unwrap());
        assert_eq!(d.state(&h(1)).unwrap().outstanding, 2);

        d.mark_resolved(&h(2)).unwrap();
        d.mark_resolved(&h(3)).unwrap();
        assert!(d.finish(&h(2)).unwrap().is_empty());
        assert_eq!(d.finish(&h(3)).unwrap(), vec![h(1)]);
        assert!(d.is_completed(&h(2)));
        assert_eq!(d.pending(), 1);
    }

    #[test]
    fn shared_child_notifies_every_parent() {
        let mut d = DependencyTracker::new();
        d.track(h(1));
        d.track(h(2));
        assert!(d.add_dependency(h(1), h(9)).unwrap());
        assert!(!d.add_dependency(h(2), h(9)).unwrap());
        d.mark_resolved(&h(1)).unwrap();
        d.mark_resolved(&h(2)).unwrap();
        d.mark_resolved(&h(9)).unwrap();

        let mut ready = d.finish(&h(9)).unwrap();
        ready.sort();
        assert_eq!(ready, vec![h(1), h(2)]);
    }

    #[test]
    fn parent_not_ready_before_resolution() {
        let mut d = DependencyTracker::new();
        d.track(h(1));
        d.add_dependency(h(1), h(2)).unwrap();
        d.mark_resolved(&h(2)).unwrap();
        // Parent still extracting links: no completion yet.
        assert!(d.finish(&h(2)).unwrap().is_empty());
        assert!(d.mark_resolved(&h(1)).unwrap());
    }

    #[test]
    fn self_reference_never_completes() {
        let mut d = DependencyTracker::new();
        d.track(h(1));
        assert!(!d.add_dependency(h(1), h(1)).unwrap());
        assert!(!d.mark_resolved(&h(1)).unwrap());
        assert_eq!(d.first_pending(), Some(h(1)));
    }

    #[test]
    fn completed_objects_are_not_tracked_again() {
        let mut d = DependencyTracker::new();
        d.track(h(1));
        d.mark_resolved(&h(1)).unwrap();
        d.finish(&h(1)).unwrap();
        assert!(!d.track(h(1)));
        assert_eq!(d.pending(), 0);
    }

    #[test]
    fn finishing_unknown_object_is_an_error() {
        let mut d = DependencyTracker::new();
        assert!(matches!(d.finish(&h(4)), Err(PushError::Invariant { .. })));
    }
}
