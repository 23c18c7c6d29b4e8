//! The live-object table of one context.

use crate::{InjectedScriptId, InspectorError, RemoteObjectId, Value};
use indexmap::IndexSet;
use log::debug;
use rustc_hash::FxHashMap;

/// Owns every value a client holds a handle to, and the named release groups.
///
/// Ids are allocated by pure increment and never reused.
#[derive(Debug)]
pub struct ObjectBinder {
    injected_script_id: InjectedScriptId,
    last_bound_id: u64,
    bound: FxHashMap<u64, Value>,
    id_to_group: FxHashMap<u64, String>,
    groups: FxHashMap<String, IndexSet<u64>>,
}

impl ObjectBinder {
    /// Creates an empty table for the given context.
    #[must_use]
    pub fn new(injected_script_id: InjectedScriptId) -> Self {
        Self {
            injected_script_id,
            last_bound_id: 0,
            bound: FxHashMap::default(),
            id_to_group: FxHashMap::default(),
            groups: FxHashMap::default(),
        }
    }

    /// The context this table belongs to.
    #[must_use]
    pub fn injected_script_id(&self) -> InjectedScriptId {
        self.injected_script_id
    }

    /// Stores `value` under a fresh id, optionally as a member of `group`.
    ///
    /// Binding the same object twice yields two distinct ids.
    pub fn bind(&mut self, value: Value, group: Option<&str>) -> RemoteObjectId {
        self.last_bound_id += 1;
        let id = self.last_bound_id;
        self.bound.insert(id, value);

        if let Some(group) = group {
            self.groups.entry(group.to_owned()).or_default().insert(id);
            self.id_to_group.insert(id, group.to_owned());
        }

        debug!(
            "bound object {id} in context {} (group {group:?})",
            self.injected_script_id
        );

        RemoteObjectId {
            injected_script_id: self.injected_script_id,
            id,
        }
    }

    /// Looks up a bound value.
    ///
    /// Ids of other contexts never resolve, even if the local number exists here.
    pub fn resolve(&self, object_id: &RemoteObjectId) -> Result<&Value, InspectorError> {
        if object_id.injected_script_id != self.injected_script_id {
            return Err(InspectorError::ObjectNotFound);
        }
        self.bound
            .get(&object_id.id)
            .ok_or(InspectorError::ObjectNotFound)
    }

    /// The group the local id was bound into.
    #[must_use]
    pub fn group_of(&self, id: u64) -> Option<&str> {
        self.id_to_group.get(&id).map(String::as_str)
    }

    /// Drops one binding. Unknown ids are ignored.
    pub fn release(&mut self, id: u64) {
        if self.bound.remove(&id).is_none() {
            return;
        }
        if let Some(group) = self.id_to_group.remove(&id) {
            let now_empty = self.groups.get_mut(&group).is_some_and(|members| {
                members.shift_remove(&id);
                members.is_empty()
            });
            if now_empty {
                self.groups.remove(&group);
            }
        }
        debug!("released object {id} in context {}", self.injected_script_id);
    }

    /// Drops every binding of `group`, then the group itself. Unknown groups are ignored.
    pub fn release_group(&mut self, group: &str) {
        let Some(members) = self.groups.remove(group) else {
            return;
        };
        for id in &members {
            self.bound.remove(id);
            self.id_to_group.remove(id);
        }
        debug!(
            "released group {group:?} ({} objects) in context {}",
            members.len(),
            self.injected_script_id
        );
    }

    /// Member ids of `group`, in bind order.
    pub fn group_members(&self, group: &str) -> impl Iterator<Item = u64> + '_ {
        self.groups.get(group).into_iter().flatten().copied()
    }

    /// Drops every binding and group.
    pub fn clear(&mut self) {
        self.bound.clear();
        self.id_to_group.clear();
        self.groups.clear();
    }

    /// Number of live bindings.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bound.len()
    }

    /// Whether no binding is live.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }
}
