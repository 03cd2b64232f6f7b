//! Request context threaded through every collaborator call.

use uuid::Uuid;

/// Identifies a request, and the request it was spawned from.
///
/// Cancellation is not modeled here. Dropping the future of a request cancels it, including any
/// collaborator calls in flight.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct Context {
    request_id: Uuid,
    parent: Option<Uuid>,
}

impl Default for Context {
    fn default() -> Self {
        Self::new()
    }
}

impl Context {
    /// A root context with a fresh request id.
    pub fn new() -> Self {
        Self {
            request_id: Uuid::new_v4(),
            parent: None,
        }
    }

    /// A child context with a fresh request id, recording this context's id as its parent.
    pub fn sub_context(&self) -> Self {
        Self {
            request_id: Uuid::new_v4(),
            parent: Some(self.request_id),
        }
    }

    /// This request's id.
    pub fn request_id(&self) -> Uuid {
        self.request_id
    }

    /// The id of the request this one was spawned from, if any.
    pub fn parent(&self) -> Option<Uuid> {
        self.parent
    }
}
