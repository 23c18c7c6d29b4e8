//! Routing between the contexts of one inspector.

use crate::{
    CallFrameId, InjectedScript, InjectedScriptId, InspectorError, InspectorHost, RemoteObjectId,
};
use indexmap::IndexMap;
use log::debug;

/// Owns every attached context and routes handles to the context that minted them.
#[derive(Debug)]
pub struct InjectedScriptManager<H> {
    next_id: u32,
    scripts: IndexMap<InjectedScriptId, InjectedScript<H>>,
}

impl<H> Default for InjectedScriptManager<H> {
    fn default() -> Self {
        Self {
            next_id: 1,
            scripts: IndexMap::new(),
        }
    }
}

impl<H: InspectorHost> InjectedScriptManager<H> {
    /// Creates a manager without contexts.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a new context backed by `host` and returns its id.
    pub fn create(&mut self, host: H) -> InjectedScriptId {
        let id = InjectedScriptId(self.next_id);
        self.next_id += 1;
        self.scripts.insert(id, InjectedScript::new(id, host));
        debug!("created context {id}");
        id
    }

    /// The context with `id`.
    pub fn get(&self, id: InjectedScriptId) -> Result<&InjectedScript<H>, InspectorError> {
        self.scripts
            .get(&id)
            .ok_or(InspectorError::UnknownContext(id))
    }

    /// The context with `id`, mutably.
    pub fn get_mut(
        &mut self,
        id: InjectedScriptId,
    ) -> Result<&mut InjectedScript<H>, InspectorError> {
        self.scripts
            .get_mut(&id)
            .ok_or(InspectorError::UnknownContext(id))
    }

    /// The first attached context, used when a request names none.
    pub fn default_context(&mut self) -> Result<&mut InjectedScript<H>, InspectorError> {
        self.scripts
            .first_mut()
            .map(|(_, script)| script)
            .ok_or(InspectorError::UnknownContext(InjectedScriptId(0)))
    }

    /// The context that minted `object_id`.
    ///
    /// A handle of a discarded context is reported like any other unknown handle.
    pub fn for_object_id(
        &mut self,
        object_id: &RemoteObjectId,
    ) -> Result<&mut InjectedScript<H>, InspectorError> {
        self.scripts
            .get_mut(&object_id.injected_script_id)
            .ok_or(InspectorError::ObjectNotFound)
    }

    /// The context whose stack `call_frame_id` points into.
    pub fn for_call_frame_id(
        &mut self,
        call_frame_id: &CallFrameId,
    ) -> Result<&mut InjectedScript<H>, InspectorError> {
        self.scripts
            .get_mut(&call_frame_id.injected_script_id)
            .ok_or(InspectorError::CallFrameNotFound)
    }

    /// Releases `group` in every context.
    pub fn release_object_group(&mut self, group: &str) {
        for script in self.scripts.values_mut() {
            script.release_object_group(group);
        }
    }

    /// Detaches a context, invalidating all of its handles.
    pub fn discard(&mut self, id: InjectedScriptId) -> Option<InjectedScript<H>> {
        let mut script = self.scripts.shift_remove(&id)?;
        script.clear();
        debug!("discarded context {id}");
        Some(script)
    }

    /// Ids of the attached contexts, in creation order.
    pub fn ids(&self) -> impl Iterator<Item = InjectedScriptId> + '_ {
        self.scripts.keys().copied()
    }

    /// Number of attached contexts.
    #[must_use]
    pub fn len(&self) -> usize {
        self.scripts.len()
    }

    /// Whether no context is attached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scripts.is_empty()
    }
}
