//! # Fetch Handle
//!
//! The consumer-facing half of a controller.

use crate::descriptor::{validate_resource, RequestDescriptor, RequestOptions};
use crate::error::FetchError;
use crate::message::{ControllerRequest, Reply};
use crate::state::RequestState;
use tokio::sync::{mpsc, oneshot, watch};

/// ## FetchHandle
///
/// The `FetchHandle<T>` is how a consumer drives a [`FetchController`](crate::FetchController)
/// and reads its `{data, loading, error}` state. It holds the command sender
/// and a `watch` receiver, so it is cheap to clone and share across tasks.
///
/// * **Failures live in state** – `refetch` returns `Ok(())` even when the
///   request fails; look at [`state`](Self::state) for the error.
/// * **Programmer errors return `Err`** – a malformed override resource or a
///   closed controller.
/// * **Teardown** – dropping the last handle stops the controller and cancels
///   whatever is in flight, just like [`shutdown`](Self::shutdown).
pub struct FetchHandle<T> {
    sender: mpsc::Sender<ControllerRequest<T>>,
    state: watch::Receiver<RequestState<T>>,
}

impl<T> Clone for FetchHandle<T> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
            state: self.state.clone(),
        }
    }
}

impl<T> FetchHandle<T> {
    pub fn new(
        sender: mpsc::Sender<ControllerRequest<T>>,
        state: watch::Receiver<RequestState<T>>,
    ) -> Self {
        Self { sender, state }
    }
}

impl<T> FetchHandle<T>
where
    T: Clone + Send + 'static,
{
    /// Current snapshot.
    pub fn state(&self) -> RequestState<T> {
        self.state.borrow().clone()
    }

    /// A receiver that wakes on every transition after this call.
    pub fn subscribe(&self) -> watch::Receiver<RequestState<T>> {
        let mut receiver = self.state.clone();
        receiver.mark_unchanged();
        receiver
    }

    /// Waits until the state is not loading and returns that snapshot.
    ///
    /// If the controller is gone, returns the last published snapshot.
    pub async fn wait_settled(&self) -> RequestState<T> {
        let mut receiver = self.state.clone();
        let settled = receiver
            .wait_for(|state| state.is_settled())
            .await
            .map(|state| state.clone());
        match settled {
            Ok(state) => state,
            Err(_) => receiver.borrow().clone(),
        }
    }

    /// Starts a new request generation and waits for it to settle.
    ///
    /// With no overrides the last-known descriptor is reused. Overrides are
    /// merged onto it and become the new last-known descriptor. Resolves once
    /// the new generation succeeds, fails or is itself superseded.
    pub async fn refetch(
        &self,
        resource: Option<&str>,
        options: Option<RequestOptions>,
    ) -> Result<(), FetchError> {
        if let Some(resource) = resource {
            validate_resource(resource)?;
        }
        self.call(|respond_to| ControllerRequest::Refetch {
            resource: resource.map(str::to_string),
            options,
            respond_to,
        })
        .await
    }

    /// Transforms the held data locally without issuing a request.
    ///
    /// `loading` and `error` are left alone. The updater sees whatever data the
    /// controller holds when it reaches this command.
    pub async fn set_data<F>(&self, updater: F) -> Result<(), FetchError>
    where
        F: FnOnce(Option<T>) -> Option<T> + Send + 'static,
    {
        self.call(|respond_to| ControllerRequest::SetData {
            updater: Box::new(updater),
            respond_to,
        })
        .await
    }

    /// Replaces the descriptor. Returns `true` when the change started a new
    /// request, `false` when it was identical or skipped.
    pub async fn set_descriptor(&self, descriptor: RequestDescriptor) -> Result<bool, FetchError> {
        validate_resource(&descriptor.resource)?;
        self.call(|respond_to| ControllerRequest::SetDescriptor {
            descriptor,
            respond_to,
        })
        .await
    }

    /// Replaces only the resource, keeping the current options.
    pub async fn set_resource(&self, resource: impl Into<String>) -> Result<bool, FetchError> {
        let resource = resource.into();
        validate_resource(&resource)?;
        self.call(|respond_to| ControllerRequest::SetResource {
            resource,
            respond_to,
        })
        .await
    }

    /// Toggles automatic activation. Turning skip off starts a request; turning
    /// it on cancels the one in flight.
    pub async fn set_skip(&self, skip: bool) -> Result<(), FetchError> {
        self.call(|respond_to| ControllerRequest::SetSkip { skip, respond_to })
            .await
    }

    /// Stops the controller and cancels its in-flight request.
    pub async fn shutdown(&self) -> Result<(), FetchError> {
        self.call(|respond_to| ControllerRequest::Shutdown { respond_to })
            .await
    }

    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    async fn call<R>(
        &self,
        request: impl FnOnce(Reply<R>) -> ControllerRequest<T>,
    ) -> Result<R, FetchError> {
        let (respond_to, response) = oneshot::channel();
        self.sender
            .send(request(respond_to))
            .await
            .map_err(|_| FetchError::ControllerClosed)?;
        response.await.map_err(|_| FetchError::ControllerClosed)
    }
}
