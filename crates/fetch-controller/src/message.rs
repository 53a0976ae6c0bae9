//! # Controller Messages
//!
//! Commands a [`FetchHandle`](crate::FetchHandle) sends to its
//! [`FetchController`](crate::FetchController), and the settlement records
//! request tasks send back.

use crate::descriptor::{RequestDescriptor, RequestOptions};
use crate::error::FetchError;
use crate::generation::Generation;
use std::fmt;
use tokio::sync::oneshot;

/// One-shot reply channel used by every command.
pub type Reply<R> = oneshot::Sender<R>;

/// Local data transformation applied by [`ControllerRequest::SetData`].
pub type Updater<T> = Box<dyn FnOnce(Option<T>) -> Option<T> + Send>;

/// Commands processed sequentially by the controller.
pub enum ControllerRequest<T> {
    /// Replace the whole descriptor. Replies `true` when it activated a request.
    SetDescriptor {
        descriptor: RequestDescriptor,
        respond_to: Reply<bool>,
    },
    /// Replace only the resource, keeping the current options.
    SetResource {
        resource: String,
        respond_to: Reply<bool>,
    },
    SetSkip {
        skip: bool,
        respond_to: Reply<()>,
    },
    /// Start a new generation. Replies once it settles or is superseded.
    Refetch {
        resource: Option<String>,
        options: Option<RequestOptions>,
        respond_to: Reply<()>,
    },
    SetData {
        updater: Updater<T>,
        respond_to: Reply<()>,
    },
    Shutdown {
        respond_to: Reply<()>,
    },
}

impl<T> fmt::Debug for ControllerRequest<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ControllerRequest::SetDescriptor { descriptor, .. } => f
                .debug_struct("SetDescriptor")
                .field("descriptor", descriptor)
                .finish(),
            ControllerRequest::SetResource { resource, .. } => f
                .debug_struct("SetResource")
                .field("resource", resource)
                .finish(),
            ControllerRequest::SetSkip { skip, .. } => {
                f.debug_struct("SetSkip").field("skip", skip).finish()
            }
            ControllerRequest::Refetch {
                resource, options, ..
            } => f
                .debug_struct("Refetch")
                .field("resource", resource)
                .field("options", options)
                .finish(),
            ControllerRequest::SetData { .. } => f.write_str("SetData"),
            ControllerRequest::Shutdown { .. } => f.write_str("Shutdown"),
        }
    }
}

/// How a dispatched request ended.
#[derive(Debug)]
pub enum Outcome<T> {
    Success(T),
    Failure(FetchError),
    Cancelled,
}

/// A finished request, tagged with the generation that dispatched it.
#[derive(Debug)]
pub struct Settlement<T> {
    pub generation: Generation,
    pub outcome: Outcome<T>,
}
