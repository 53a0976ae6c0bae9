//! # Fetch Controller
//!
//! The `FetchController` is the server half of a controller: it owns the
//! request state, the current descriptor and the live generation, and it
//! processes commands one at a time. Request futures run in their own tasks and
//! report back through a settlement channel, so the loop never blocks on I/O.

use crate::config::ControllerConfig;
use crate::descriptor::RequestDescriptor;
use crate::error::{FetchError, SourceError};
use crate::generation::{Generation, GenerationCounter};
use crate::handle::FetchHandle;
use crate::message::{ControllerRequest, Outcome, Reply, Settlement};
use crate::source::{DataSource, SourceResponse};
use crate::state::RequestState;
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Owns the lifecycle of the single "current" request for one consumer.
///
/// # Concurrency Model
///
/// All state lives inside the task running [`FetchController::run`]. Commands
/// from [`FetchHandle`]s and settlements from request tasks are interleaved on
/// that one task, so nothing here needs a lock. Snapshots leave through a
/// `watch` channel after every transition.
///
/// # Generations
///
/// Every activation (first run, a changed descriptor, a refetch, turning
/// `skip` off) cancels the live [`CancellationToken`] and mints a new
/// [`Generation`]. A settlement commits only if its generation is still the
/// live one; anything else is dropped without touching state. The winner is
/// always the latest generation, never the first to finish.
///
/// # State Transitions
///
/// * **Activate**: `loading = true`, `error` cleared, stale `data` kept.
/// * **Success**: `data` replaced, `error` cleared.
/// * **Failure** (non-2xx, network, decode): `data` cleared, `error` set.
/// * **Superseded, or cancelled by the controller**: no transition.
/// * **Skip turned on**: the live request is cancelled and `loading` cleared.
/// * **Cancelled by the source on its own**: a failure like any other.
///
/// # Usage
///
/// ```rust
/// use fetch_controller::mock::ScriptedSource;
/// use fetch_controller::{ControllerConfig, FetchController, RequestDescriptor};
/// use serde_json::json;
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() {
///     let source = ScriptedSource::new();
///     source.expect_fetch("https://api.test/posts/1").return_json(json!({"id": 1}));
///
///     let handle = FetchController::<serde_json::Value>::spawn(
///         Arc::new(source.clone()),
///         RequestDescriptor::new("https://api.test/posts/1"),
///         ControllerConfig::default(),
///     );
///
///     let state = handle.wait_settled().await;
///     assert_eq!(state.data, Some(json!({"id": 1})));
///     source.verify();
/// }
/// ```
pub struct FetchController<T> {
    receiver: mpsc::Receiver<ControllerRequest<T>>,
    settlements: mpsc::UnboundedReceiver<Settlement<T>>,
    settlement_sender: mpsc::UnboundedSender<Settlement<T>>,
    state: watch::Sender<RequestState<T>>,
    source: Arc<dyn DataSource>,
    descriptor: RequestDescriptor,
    generations: GenerationCounter,
    waiters: Vec<(Generation, Reply<()>)>,
}

impl<T> FetchController<T>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    /// Creates a controller and the handle that talks to it.
    ///
    /// The controller does nothing until [`run`](Self::run) is polled. The
    /// handle already reports `loading = true` unless the descriptor is
    /// skipped, in which case it reports the idle state.
    pub fn new(
        source: Arc<dyn DataSource>,
        descriptor: RequestDescriptor,
        config: ControllerConfig,
    ) -> (Self, FetchHandle<T>) {
        let (sender, receiver) = mpsc::channel(config.buffer_size.max(1));
        let (settlement_sender, settlements) = mpsc::unbounded_channel();
        let initial = if descriptor.is_skipped() {
            RequestState::idle()
        } else {
            RequestState::loading()
        };
        let (state, state_receiver) = watch::channel(initial);

        let controller = Self {
            receiver,
            settlements,
            settlement_sender,
            state,
            source,
            descriptor,
            generations: GenerationCounter::new(),
            waiters: Vec::new(),
        };
        (controller, FetchHandle::new(sender, state_receiver))
    }

    /// Creates a controller and runs it on a new Tokio task.
    pub fn spawn(
        source: Arc<dyn DataSource>,
        descriptor: RequestDescriptor,
        config: ControllerConfig,
    ) -> FetchHandle<T> {
        let (controller, handle) = Self::new(source, descriptor, config);
        tokio::spawn(controller.run());
        handle
    }

    /// Runs the event loop until shutdown or until every handle is dropped.
    pub async fn run(mut self) {
        let data_type = data_type_name::<T>();
        info!(
            data_type,
            resource = %self.descriptor.resource,
            skip = self.descriptor.is_skipped(),
            "Controller started"
        );

        if !self.descriptor.is_skipped() {
            self.dispatch(data_type);
        }

        let shutdown_reply = loop {
            tokio::select! {
                biased;
                request = self.receiver.recv() => match request {
                    Some(request) => {
                        if let Some(reply) = self.handle_request(request, data_type) {
                            break Some(reply);
                        }
                    }
                    None => break None,
                },
                Some(settlement) = self.settlements.recv() => self.settle(settlement, data_type),
            }
        };

        self.teardown(data_type);
        if let Some(reply) = shutdown_reply {
            let _ = reply.send(());
        }
    }

    /// Applies one command. Returns the reply channel when the command was a
    /// shutdown.
    fn handle_request(
        &mut self,
        request: ControllerRequest<T>,
        data_type: &'static str,
    ) -> Option<Reply<()>> {
        debug!(data_type, ?request, "Request");
        match request {
            ControllerRequest::SetDescriptor {
                descriptor,
                respond_to,
            } => {
                let activated = self.apply_descriptor(descriptor, data_type);
                let _ = respond_to.send(activated);
            }
            ControllerRequest::SetResource {
                resource,
                respond_to,
            } => {
                let descriptor = RequestDescriptor {
                    resource,
                    options: self.descriptor.options.clone(),
                };
                let activated = self.apply_descriptor(descriptor, data_type);
                let _ = respond_to.send(activated);
            }
            ControllerRequest::SetSkip { skip, respond_to } => {
                let was_skipped = self.descriptor.options.skip;
                self.descriptor.options.skip = skip;
                if was_skipped && !skip {
                    self.dispatch(data_type);
                } else if !was_skipped && skip {
                    self.suspend(data_type);
                }
                let _ = respond_to.send(());
            }
            ControllerRequest::Refetch {
                resource,
                options,
                respond_to,
            } => {
                self.descriptor = self.descriptor.with_overrides(resource, options.as_ref());
                let generation = self.dispatch(data_type);
                self.waiters.push((generation, respond_to));
            }
            ControllerRequest::SetData {
                updater,
                respond_to,
            } => {
                self.state.send_modify(move |state| {
                    let current = state.data.take();
                    state.data = updater(current);
                });
                let _ = respond_to.send(());
            }
            ControllerRequest::Shutdown { respond_to } => return Some(respond_to),
        }
        None
    }

    /// Adopts `descriptor` and activates when it differs from the current one
    /// and is not skipped.
    fn apply_descriptor(&mut self, descriptor: RequestDescriptor, data_type: &'static str) -> bool {
        if descriptor == self.descriptor {
            debug!(data_type, resource = %descriptor.resource, "Descriptor unchanged");
            return false;
        }
        let skipped = descriptor.is_skipped();
        self.descriptor = descriptor;
        if skipped {
            info!(data_type, resource = %self.descriptor.resource, "Descriptor changed, activation skipped");
            self.suspend(data_type);
            return false;
        }
        self.dispatch(data_type);
        true
    }

    /// Supersedes the live generation and starts a request for the current
    /// descriptor.
    fn dispatch(&mut self, data_type: &'static str) -> Generation {
        if let Some(previous) = self.generations.cancel_active() {
            debug!(data_type, generation = %previous, "Superseded");
        }
        let (generation, cancel) = self.generations.mint();
        self.release_waiters(|waiting| waiting < generation);
        self.state.send_modify(RequestState::begin_loading);
        info!(
            data_type,
            %generation,
            method = %self.descriptor.method(),
            resource = %self.descriptor.resource,
            "Dispatch"
        );

        let source = Arc::clone(&self.source);
        let descriptor = self.descriptor.clone();
        let settlements = self.settlement_sender.clone();
        tokio::spawn(async move {
            let outcome = execute::<T>(source.as_ref(), &descriptor, cancel).await;
            // The controller may already be gone; nothing to report to then.
            let _ = settlements.send(Settlement {
                generation,
                outcome,
            });
        });
        generation
    }

    /// Cancels the live generation because skip was turned on. `loading` is
    /// cleared; `data` and `error` stay as they were.
    fn suspend(&mut self, data_type: &'static str) {
        let Some(generation) = self.generations.cancel_active() else {
            return;
        };
        info!(data_type, %generation, "Cancelled in-flight request, skip set");
        self.state.send_modify(RequestState::stop_loading);
        self.release_waiters(|waiting| waiting <= generation);
    }

    fn settle(&mut self, settlement: Settlement<T>, data_type: &'static str) {
        let Settlement {
            generation,
            outcome,
        } = settlement;

        if !self.generations.retire(generation) {
            debug!(data_type, %generation, "Discarded superseded result");
            return;
        }

        match outcome {
            Outcome::Success(data) => {
                self.state.send_modify(move |state| state.succeed(data));
                info!(data_type, %generation, "Loaded");
            }
            Outcome::Failure(error) => {
                warn!(data_type, %generation, error = %error, "Request failed");
                self.state.send_modify(move |state| state.fail(error));
            }
            Outcome::Cancelled => {
                // Nobody asked for this cancel, so the generation fails
                let error = FetchError::Network("Request cancelled by source".to_string());
                warn!(data_type, %generation, error = %error, "Source cancelled a live request");
                self.state.send_modify(move |state| state.fail(error));
            }
        }
        self.release_waiters(|waiting| waiting <= generation);
    }

    fn teardown(&mut self, data_type: &'static str) {
        if let Some(generation) = self.generations.cancel_active() {
            info!(data_type, %generation, "Cancelled in-flight request");
        }
        self.release_waiters(|_| true);
        info!(data_type, resource = %self.descriptor.resource, "Shutdown");
    }

    fn release_waiters(&mut self, released: impl Fn(Generation) -> bool) {
        let (ready, pending): (Vec<_>, Vec<_>) = std::mem::take(&mut self.waiters)
            .into_iter()
            .partition(|(generation, _)| released(*generation));
        self.waiters = pending;
        for (_, waiter) in ready {
            let _ = waiter.send(());
        }
    }
}

/// Runs one request against `source` and classifies the result.
async fn execute<T: DeserializeOwned>(
    source: &dyn DataSource,
    descriptor: &RequestDescriptor,
    cancel: CancellationToken,
) -> Outcome<T> {
    match source.fetch(descriptor, cancel).await {
        Ok(response) => decode(response, &descriptor.resource),
        Err(SourceError::Cancelled) => Outcome::Cancelled,
        Err(SourceError::Network(message)) => Outcome::Failure(FetchError::Network(message)),
        Err(SourceError::InvalidRequest(message)) => {
            Outcome::Failure(FetchError::InvalidResource(message))
        }
    }
}

fn decode<T: DeserializeOwned>(response: SourceResponse, resource: &str) -> Outcome<T> {
    if !response.is_success() {
        return Outcome::Failure(FetchError::Status {
            status: response.status,
            resource: resource.to_string(),
        });
    }
    match serde_json::from_slice(&response.body) {
        Ok(data) => Outcome::Success(data),
        Err(e) => Outcome::Failure(FetchError::Decode(e.to_string())),
    }
}

/// Short type name for log fields, e.g. `Post` for `Vec<dashboard::model::Post>`.
fn data_type_name<T>() -> &'static str {
    std::any::type_name::<T>()
        .rsplit("::")
        .next()
        .unwrap_or("Unknown")
        .trim_end_matches('>')
}
