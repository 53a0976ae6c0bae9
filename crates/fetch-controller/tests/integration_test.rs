use fetch_controller::mock::{create_mock_source, expect_fetch, PendingFetch, ScriptedSource};
use fetch_controller::{
    ControllerConfig, FetchController, FetchError, FetchHandle, Phase, RequestDescriptor,
    RequestOptions, RequestState, SourceError,
};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::watch;

const A: &str = "https://api.test/a";
const B: &str = "https://api.test/b";
const C: &str = "https://api.test/c";
const D: &str = "https://api.test/d";

fn spawn_mock(
    descriptor: RequestDescriptor,
) -> (FetchHandle<Value>, UnboundedReceiver<PendingFetch>) {
    let (source, fetches) = create_mock_source();
    let handle = FetchController::spawn(Arc::new(source), descriptor, ControllerConfig::default());
    (handle, fetches)
}

async fn next_fetch(fetches: &mut UnboundedReceiver<PendingFetch>) -> PendingFetch {
    expect_fetch(fetches).await.expect("Expected a fetch")
}

/// Asserts that no state is published for a short while.
async fn assert_no_transition(receiver: &mut watch::Receiver<RequestState<Value>>) {
    let changed = tokio::time::timeout(Duration::from_millis(50), receiver.changed()).await;
    assert!(
        !matches!(changed, Ok(Ok(()))),
        "Unexpected transition: {:?}",
        *receiver.borrow()
    );
}

#[tokio::test]
async fn test_initial_state_is_loading() {
    let (handle, mut fetches) = spawn_mock(RequestDescriptor::new(A));
    let state = handle.state();
    assert!(state.loading);
    assert!(state.data.is_none());
    assert!(state.error.is_none());

    let pending = next_fetch(&mut fetches).await;
    assert_eq!(pending.resource(), A);
}

/// Resolve, refetch with stale data visible, resolve again.
#[tokio::test]
async fn test_refetch_keeps_stale_data_while_loading() {
    let (handle, mut fetches) = spawn_mock(RequestDescriptor::new(A));

    next_fetch(&mut fetches).await.respond_json(json!({"id": 1}));
    let state = handle.wait_settled().await;
    assert_eq!(
        state,
        RequestState {
            data: Some(json!({"id": 1})),
            loading: false,
            error: None,
        }
    );

    let refetch = tokio::spawn({
        let handle = handle.clone();
        async move { handle.refetch(None, None).await }
    });

    let pending = next_fetch(&mut fetches).await;
    assert_eq!(pending.resource(), A);
    let during = handle.state();
    assert!(during.loading);
    assert_eq!(during.data, Some(json!({"id": 1})));
    assert!(during.error.is_none());

    pending.respond_json(json!({"id": 1, "updated": true}));
    refetch.await.unwrap().unwrap();

    assert_eq!(
        handle.state(),
        RequestState {
            data: Some(json!({"id": 1, "updated": true})),
            loading: false,
            error: None,
        }
    );
}

#[tokio::test]
async fn test_not_found_sets_error_and_clears_data() {
    let (handle, mut fetches) = spawn_mock(RequestDescriptor::new(B));

    next_fetch(&mut fetches).await.respond_status(404);
    let state = handle.wait_settled().await;

    assert!(state.data.is_none());
    assert!(!state.loading);
    let error = state.error.expect("Expected error");
    assert!(error.to_string().contains("404"));
    assert_eq!(
        error,
        FetchError::Status {
            status: 404,
            resource: B.to_string()
        }
    );
}

#[tokio::test]
async fn test_failure_after_success_clears_data() {
    let (handle, mut fetches) = spawn_mock(RequestDescriptor::new(A));
    next_fetch(&mut fetches).await.respond_json(json!([1, 2, 3]));
    handle.wait_settled().await;

    let refetch = tokio::spawn({
        let handle = handle.clone();
        async move { handle.refetch(None, None).await }
    });
    next_fetch(&mut fetches).await.fail("connection reset");
    refetch.await.unwrap().unwrap();

    let state = handle.state();
    assert_eq!(state.phase(), Phase::Failed);
    assert!(state.data.is_none());
    assert_eq!(
        state.error,
        Some(FetchError::Network("connection reset".into()))
    );

    // A later success clears the error again
    let refetch = tokio::spawn({
        let handle = handle.clone();
        async move { handle.refetch(None, None).await }
    });
    next_fetch(&mut fetches).await.respond_json(json!([4]));
    refetch.await.unwrap().unwrap();
    let state = handle.state();
    assert_eq!(state.data, Some(json!([4])));
    assert!(state.error.is_none());
}

#[tokio::test]
async fn test_undecodable_body_is_a_failure() {
    let source = ScriptedSource::new();
    source
        .expect_fetch(A)
        .return_response(fetch_controller::SourceResponse::new(200, "<html>"));
    let handle = FetchController::<Value>::spawn(
        Arc::new(source),
        RequestDescriptor::new(A),
        ControllerConfig::default(),
    );

    let state = handle.wait_settled().await;
    assert!(matches!(state.error, Some(FetchError::Decode(_))));
    assert!(state.data.is_none());
}

/// Superseded request C resolves late and must be ignored; D wins.
#[tokio::test]
async fn test_superseded_success_is_discarded() {
    let (handle, mut fetches) = spawn_mock(RequestDescriptor::new(C));
    let first = next_fetch(&mut fetches).await;

    let refetch = tokio::spawn({
        let handle = handle.clone();
        async move { handle.refetch(Some(D), None).await }
    });
    let second = next_fetch(&mut fetches).await;
    assert_eq!(second.resource(), D);
    assert!(first.is_cancelled());
    assert!(!second.is_cancelled());

    second.respond_json(json!({"from": "d"}));
    refetch.await.unwrap().unwrap();
    assert_eq!(handle.state().data, Some(json!({"from": "d"})));

    let mut receiver = handle.subscribe();
    first.respond_json(json!({"from": "c"}));
    assert_no_transition(&mut receiver).await;
    assert_eq!(handle.state().data, Some(json!({"from": "d"})));
}

#[tokio::test]
async fn test_superseded_failure_is_discarded() {
    let (handle, mut fetches) = spawn_mock(RequestDescriptor::new(C));
    let first = next_fetch(&mut fetches).await;

    let refetch = tokio::spawn({
        let handle = handle.clone();
        async move { handle.refetch(Some(D), None).await }
    });
    let second = next_fetch(&mut fetches).await;

    // The stale failure arrives first, while D is still loading
    let mut receiver = handle.subscribe();
    first.respond_status(500);
    assert_no_transition(&mut receiver).await;
    let during = handle.state();
    assert!(during.loading);
    assert!(during.error.is_none());

    second.respond_json(json!({"from": "d"}));
    refetch.await.unwrap().unwrap();
    let state = handle.state();
    assert_eq!(state.data, Some(json!({"from": "d"})));
    assert!(state.error.is_none());
}

/// Many overlapping generations finishing in reverse order.
#[tokio::test]
async fn test_latest_generation_wins_regardless_of_completion_order() {
    let (handle, mut fetches) = spawn_mock(RequestDescriptor::new(A));
    let mut pending = vec![next_fetch(&mut fetches).await];

    let mut refetches = Vec::new();
    for i in 1..=4 {
        let resource = format!("https://api.test/items/{i}");
        refetches.push(tokio::spawn({
            let handle = handle.clone();
            async move { handle.refetch(Some(resource.as_str()), None).await }
        }));
        pending.push(next_fetch(&mut fetches).await);
    }

    let earlier: Vec<bool> = pending[..4].iter().map(PendingFetch::is_cancelled).collect();
    assert_eq!(earlier, vec![true; 4]);

    for (i, fetch) in pending.into_iter().enumerate().rev() {
        fetch.respond_json(json!({ "n": i }));
    }
    for refetch in refetches {
        refetch.await.unwrap().unwrap();
    }

    let mut receiver = handle.subscribe();
    assert_no_transition(&mut receiver).await;
    assert_eq!(handle.state().data, Some(json!({"n": 4})));
}

#[tokio::test]
async fn test_superseded_refetch_resolves_without_error() {
    let (handle, mut fetches) = spawn_mock(RequestDescriptor::new(A));
    next_fetch(&mut fetches).await.respond_json(json!(1));
    handle.wait_settled().await;

    let superseded = tokio::spawn({
        let handle = handle.clone();
        async move { handle.refetch(None, None).await }
    });
    let first = next_fetch(&mut fetches).await;

    let latest = tokio::spawn({
        let handle = handle.clone();
        async move { handle.refetch(None, None).await }
    });
    let second = next_fetch(&mut fetches).await;

    // Superseded refetch resolves as soon as the newer generation starts
    superseded.await.unwrap().unwrap();
    assert!(first.is_cancelled());

    second.respond_json(json!(2));
    latest.await.unwrap().unwrap();
    assert_eq!(handle.state().data, Some(json!(2)));
}

#[tokio::test]
async fn test_set_data_leaves_loading_and_error() {
    let (handle, mut fetches) = spawn_mock(RequestDescriptor::new(A));

    // While loading: updater sees no data, loading stays true
    let pending = next_fetch(&mut fetches).await;
    handle
        .set_data(|current| {
            assert!(current.is_none());
            Some(json!({"draft": true}))
        })
        .await
        .unwrap();
    let state = handle.state();
    assert!(state.loading);
    assert_eq!(state.data, Some(json!({"draft": true})));

    pending.respond_json(json!({"count": 1}));
    handle.wait_settled().await;

    handle
        .set_data(|current| {
            let mut value = current.expect("data present");
            value["count"] = json!(value["count"].as_i64().unwrap() + 1);
            Some(value)
        })
        .await
        .unwrap();
    handle
        .set_data(|current| {
            let mut value = current.expect("data present");
            value["count"] = json!(value["count"].as_i64().unwrap() + 1);
            Some(value)
        })
        .await
        .unwrap();

    let state = handle.state();
    assert_eq!(state.data, Some(json!({"count": 3})));
    assert!(!state.loading);
    assert!(state.error.is_none());
}

#[tokio::test]
async fn test_set_data_keeps_error() {
    let (handle, mut fetches) = spawn_mock(RequestDescriptor::new(A));
    next_fetch(&mut fetches).await.respond_status(503);
    handle.wait_settled().await;

    handle.set_data(|_| Some(json!("local"))).await.unwrap();
    let state = handle.state();
    assert_eq!(state.data, Some(json!("local")));
    assert_eq!(state.error.and_then(|e| e.status()), Some(503));
    assert!(!state.loading);
}

#[tokio::test]
async fn test_skip_never_dispatches_until_refetch() {
    let descriptor = RequestDescriptor::new(A).with_options(RequestOptions::new().skipped());
    let (handle, mut fetches) = spawn_mock(descriptor);

    let state = handle.state();
    assert_eq!(state.phase(), Phase::Idle);
    assert!(!state.loading);

    // Descriptor changes do not activate a skipped controller
    let activated = handle
        .set_descriptor(RequestDescriptor::new(B).with_options(RequestOptions::new().skipped()))
        .await
        .unwrap();
    assert!(!activated);
    assert!(
        tokio::time::timeout(Duration::from_millis(50), fetches.recv())
            .await
            .is_err(),
        "Skipped controller dispatched a request"
    );

    let refetch = tokio::spawn({
        let handle = handle.clone();
        async move { handle.refetch(None, None).await }
    });
    let pending = next_fetch(&mut fetches).await;
    assert_eq!(pending.resource(), B);
    pending.respond_json(json!("loaded"));
    refetch.await.unwrap().unwrap();
    assert_eq!(handle.state().data, Some(json!("loaded")));
}

#[tokio::test]
async fn test_turning_skip_off_activates() {
    let descriptor = RequestDescriptor::new(A).with_options(RequestOptions::new().skipped());
    let (handle, mut fetches) = spawn_mock(descriptor);

    handle.set_skip(false).await.unwrap();
    assert!(handle.state().loading);
    let pending = next_fetch(&mut fetches).await;
    assert_eq!(pending.resource(), A);
}

#[tokio::test]
async fn test_descriptor_change_reactivates() {
    let (handle, mut fetches) = spawn_mock(RequestDescriptor::new(A));
    let first = next_fetch(&mut fetches).await;

    // Identical descriptor: no new request
    assert!(!handle.set_descriptor(RequestDescriptor::new(A)).await.unwrap());

    assert!(handle.set_resource(B).await.unwrap());
    let second = next_fetch(&mut fetches).await;
    assert_eq!(second.resource(), B);
    assert!(first.is_cancelled());

    // Options count as a dependency too
    let with_header =
        RequestDescriptor::new(B).with_options(RequestOptions::new().with_header("x-page", "2"));
    assert!(handle.set_descriptor(with_header).await.unwrap());
    let third = next_fetch(&mut fetches).await;
    assert_eq!(third.descriptor.options.headers["x-page"], "2");
    assert!(second.is_cancelled());

    third.respond_json(json!({"page": 2}));
    let state = handle.wait_settled().await;
    assert_eq!(state.data, Some(json!({"page": 2})));
}

#[tokio::test]
async fn test_turning_skip_on_cancels_in_flight() {
    let (handle, mut fetches) = spawn_mock(RequestDescriptor::new(A));
    next_fetch(&mut fetches).await.respond_json(json!("first"));
    handle.wait_settled().await;

    let refetch = tokio::spawn({
        let handle = handle.clone();
        async move { handle.refetch(None, None).await }
    });
    let pending = next_fetch(&mut fetches).await;
    assert!(handle.state().loading);

    handle.set_skip(true).await.unwrap();
    assert!(pending.is_cancelled());
    refetch.await.unwrap().unwrap();

    // Stale data stays, only loading is cleared
    let mut receiver = handle.subscribe();
    let state = receiver.borrow_and_update().clone();
    assert!(!state.loading);
    assert_eq!(state.data, Some(json!("first")));
    assert!(state.error.is_none());

    // A late answer from the cancelled request is discarded
    pending.respond_json(json!("late"));
    assert_no_transition(&mut receiver).await;
    assert_eq!(handle.state().data, Some(json!("first")));
}

#[tokio::test]
async fn test_skipped_descriptor_cancels_in_flight() {
    let (handle, mut fetches) = spawn_mock(RequestDescriptor::new(A));
    let pending = next_fetch(&mut fetches).await;

    let skipped = RequestDescriptor::new(B).with_options(RequestOptions::new().skipped());
    assert!(!handle.set_descriptor(skipped).await.unwrap());
    assert!(pending.is_cancelled());

    let mut receiver = handle.subscribe();
    let state = receiver.borrow_and_update().clone();
    assert!(!state.loading);
    assert!(state.data.is_none());
    assert!(state.error.is_none());

    pending.respond_json(json!("late"));
    assert_no_transition(&mut receiver).await;
    assert!(
        tokio::time::timeout(Duration::from_millis(50), fetches.recv())
            .await
            .is_err(),
        "Skipped controller dispatched a request"
    );
}

#[tokio::test]
async fn test_source_cancel_of_live_request_settles() {
    let (handle, mut fetches) = spawn_mock(RequestDescriptor::new(A));
    next_fetch(&mut fetches).await.respond_json(json!("first"));
    handle.wait_settled().await;

    let refetch = tokio::spawn({
        let handle = handle.clone();
        async move { handle.refetch(None, None).await }
    });
    let pending = next_fetch(&mut fetches).await;
    assert!(!pending.is_cancelled());
    pending.respond(Err(SourceError::Cancelled));

    tokio::time::timeout(Duration::from_secs(1), refetch)
        .await
        .expect("refetch should resolve")
        .unwrap()
        .unwrap();
    let state = tokio::time::timeout(Duration::from_secs(1), handle.wait_settled())
        .await
        .expect("state should settle");
    assert_eq!(state.phase(), Phase::Failed);
    assert!(state.data.is_none());
    assert_eq!(
        state.error,
        Some(FetchError::Network("Request cancelled by source".into()))
    );
}

#[tokio::test]
async fn test_dropped_live_request_settles() {
    let (handle, mut fetches) = spawn_mock(RequestDescriptor::new(A));
    drop(next_fetch(&mut fetches).await);

    let state = tokio::time::timeout(Duration::from_secs(1), handle.wait_settled())
        .await
        .expect("state should settle");
    assert!(!state.loading);
    assert!(matches!(state.error, Some(FetchError::Network(_))));
}

#[tokio::test]
async fn test_refetch_override_becomes_last_known() {
    let base = RequestDescriptor::new(A)
        .with_options(RequestOptions::new().with_header("accept", "application/json"));
    let (handle, mut fetches) = spawn_mock(base);
    next_fetch(&mut fetches).await.respond_json(json!(0));
    handle.wait_settled().await;

    let refetch = tokio::spawn({
        let handle = handle.clone();
        async move {
            handle
                .refetch(
                    Some(B),
                    Some(RequestOptions::new().with_header("x-trace", "1")),
                )
                .await
        }
    });
    let pending = next_fetch(&mut fetches).await;
    assert_eq!(pending.resource(), B);
    assert_eq!(pending.descriptor.options.headers["accept"], "application/json");
    assert_eq!(pending.descriptor.options.headers["x-trace"], "1");
    pending.respond_json(json!(1));
    refetch.await.unwrap().unwrap();

    let refetch = tokio::spawn({
        let handle = handle.clone();
        async move { handle.refetch(None, None).await }
    });
    let pending = next_fetch(&mut fetches).await;
    assert_eq!(pending.resource(), B);
    assert_eq!(pending.descriptor.options.headers["x-trace"], "1");
    pending.respond_json(json!(2));
    refetch.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_refetch_rejects_malformed_resource() {
    let (handle, mut fetches) = spawn_mock(RequestDescriptor::new(A));
    let _pending = next_fetch(&mut fetches).await;

    let result = handle.refetch(Some(""), None).await;
    assert!(matches!(result, Err(FetchError::InvalidResource(_))));

    let result = handle.set_resource("has space").await;
    assert!(matches!(result, Err(FetchError::InvalidResource(_))));

    // Nothing was dispatched and state is untouched
    assert!(
        tokio::time::timeout(Duration::from_millis(50), fetches.recv())
            .await
            .is_err()
    );
    assert!(handle.state().loading);
}

#[tokio::test]
async fn test_shutdown_cancels_without_transition() {
    let (handle, mut fetches) = spawn_mock(RequestDescriptor::new(A));
    let pending = next_fetch(&mut fetches).await;

    let mut receiver = handle.subscribe();
    handle.shutdown().await.unwrap();
    assert!(pending.is_cancelled());

    pending.respond_json(json!({"late": true}));
    // The controller is gone: the receiver sees the sender close, not a new value
    let changed = tokio::time::timeout(Duration::from_millis(50), receiver.changed()).await;
    assert!(!matches!(changed, Ok(Ok(()))));
    let state = handle.state();
    assert!(state.loading);
    assert!(state.data.is_none());
    assert!(state.error.is_none());

    assert_eq!(
        handle.refetch(None, None).await,
        Err(FetchError::ControllerClosed)
    );
    assert!(handle.is_closed());
}

#[tokio::test]
async fn test_shutdown_resolves_pending_refetch() {
    let (handle, mut fetches) = spawn_mock(RequestDescriptor::new(A));
    next_fetch(&mut fetches).await.respond_json(json!(1));
    handle.wait_settled().await;

    let refetch = tokio::spawn({
        let handle = handle.clone();
        async move { handle.refetch(None, None).await }
    });
    let pending = next_fetch(&mut fetches).await;

    handle.shutdown().await.unwrap();
    assert!(pending.is_cancelled());
    refetch.await.unwrap().unwrap();
    assert_eq!(handle.state().data, Some(json!(1)));
}

#[tokio::test]
async fn test_dropping_handles_tears_down() {
    let (handle, mut fetches) = spawn_mock(RequestDescriptor::new(A));
    let pending = next_fetch(&mut fetches).await;
    let mut receiver = handle.subscribe();

    drop(handle);
    // Sender side of the state channel closes once the controller stops
    let closed = tokio::time::timeout(Duration::from_secs(1), receiver.changed()).await;
    assert!(matches!(closed, Ok(Err(_))));
    assert!(pending.is_cancelled());
    assert!(receiver.borrow().loading);
}

#[tokio::test]
async fn test_honoring_source_cancels_superseded_request() {
    let (source, mut fetches) = create_mock_source();
    let handle = FetchController::<Value>::spawn(
        Arc::new(source.honoring_cancellation()),
        RequestDescriptor::new(C),
        ControllerConfig::default(),
    );
    let first = next_fetch(&mut fetches).await;

    let refetch = tokio::spawn({
        let handle = handle.clone();
        async move { handle.refetch(Some(D), None).await }
    });
    let second = next_fetch(&mut fetches).await;
    assert!(first.is_cancelled());
    drop(first);

    second.respond_json(json!("d"));
    refetch.await.unwrap().unwrap();
    let state = handle.state();
    assert_eq!(state.data, Some(json!("d")));
    assert!(state.error.is_none());
}

#[tokio::test]
async fn test_scripted_flow_with_verify() {
    let source = ScriptedSource::new();
    source.expect_fetch(A).return_json(json!([{"id": 1}]));
    source.expect_fetch(B).return_status(404);
    source.expect_fetch(A).return_json(json!([{"id": 2}]));

    let handle = FetchController::<Value>::spawn(
        Arc::new(source.clone()),
        RequestDescriptor::new(A),
        ControllerConfig::default(),
    );
    assert_eq!(handle.wait_settled().await.phase(), Phase::Success);

    assert!(handle.set_resource(B).await.unwrap());
    assert_eq!(handle.wait_settled().await.phase(), Phase::Failed);

    handle.refetch(Some(A), None).await.unwrap();
    assert_eq!(handle.state().data, Some(json!([{"id": 2}])));

    source.verify();
    let resources: Vec<String> = source.calls().into_iter().map(|d| d.resource).collect();
    assert_eq!(resources, vec![A, B, A]);
}
