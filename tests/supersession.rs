// Integration tests for cancellation, the staleness gate, and teardown.

use std::sync::Arc;

use serde_json::{Value, json};
use tokio::time::{Duration, sleep, timeout};

use refetch::Variables;
use refetch::config::ControllerConfig;
use refetch::controller::QueryController;
use refetch::error::TransportError;
use refetch::state::QueryState;
use refetch::transport::mock::MockTransport;

const QUERY: &str = "query { countries { code name } }";

fn variables(value: Value) -> Variables {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object, got {other}"),
    }
}

fn controller(mock: Arc<MockTransport>) -> QueryController<&'static str, Value> {
    QueryController::new(ControllerConfig::new("https://example.com"), mock)
}

async fn settled(controller: &QueryController<&'static str, Value>) -> QueryState<Value> {
    let mut rx = controller.subscribe();
    let state = timeout(Duration::from_secs(1), rx.wait_for(|state| !state.is_pending()))
        .await
        .expect("fetch should settle within a second")
        .expect("controller alive")
        .clone();
    state
}

#[tokio::test]
async fn test_superseded_success_is_discarded() {
    let mock = Arc::new(MockTransport::new());
    // The first attempt's transport ignores cancellation and completes
    // anyway; only the staleness gate keeps its result out.
    let first = mock.hold_detached();
    mock.respond_ok(json!({"filter": "B"}));
    let mut controller = controller(mock);

    controller.evaluate(QUERY, variables(json!({"filter": "A"})));
    controller.evaluate(QUERY, variables(json!({"filter": "B"})));

    let state = settled(&controller).await;
    assert_eq!(state.data(), Some(&json!({"filter": "B"})));

    // The stale attempt now completes successfully; its result must not
    // overwrite the newer one.
    first
        .send(Ok(json!({"filter": "A"})))
        .expect("attempt still parked");
    sleep(Duration::from_millis(50)).await;
    assert_eq!(controller.state().data(), Some(&json!({"filter": "B"})));
}

#[tokio::test]
async fn test_superseded_failure_is_discarded() {
    let mock = Arc::new(MockTransport::new());
    let first = mock.hold_detached();
    mock.respond_ok(json!(2));
    let mut controller = controller(mock);

    controller.evaluate(QUERY, variables(json!({"filter": "A"})));
    controller.evaluate(QUERY, variables(json!({"filter": "B"})));

    let state = settled(&controller).await;
    assert!(state.is_success());

    first
        .send(Err(TransportError::Network("too late".to_string())))
        .expect("attempt still parked");
    sleep(Duration::from_millis(50)).await;
    assert!(controller.state().is_success());
}

#[tokio::test]
async fn test_canceled_attempt_never_produces_an_error() {
    let mock = Arc::new(MockTransport::new());
    // The first attempt honors cancellation and resolves to Canceled once
    // superseded; that signal must be swallowed, not surfaced.
    let _first = mock.hold();
    mock.respond_ok(json!(2));
    let mut controller = controller(mock.clone());

    controller.evaluate(QUERY, variables(json!({"filter": "A"})));
    controller.evaluate(QUERY, variables(json!({"filter": "B"})));

    let state = settled(&controller).await;
    assert_eq!(state.data(), Some(&json!(2)));

    sleep(Duration::from_millis(50)).await;
    assert!(controller.state().is_success());

    let recorded = mock.recorded();
    assert_eq!(recorded.len(), 2);
    assert!(recorded[0].token.is_cancelled());
}

#[tokio::test]
async fn test_at_most_one_token_is_live() {
    let mock = Arc::new(MockTransport::new());
    let _a = mock.hold();
    let _b = mock.hold();
    let _c = mock.hold();
    let mut controller = controller(mock.clone());

    controller.evaluate(QUERY, variables(json!({"filter": "A"})));
    controller.evaluate(QUERY, variables(json!({"filter": "B"})));
    controller.evaluate(QUERY, variables(json!({"filter": "C"})));
    sleep(Duration::from_millis(50)).await;

    let recorded = mock.recorded();
    assert_eq!(recorded.len(), 3);
    let live = recorded
        .iter()
        .filter(|call| !call.token.is_cancelled())
        .count();
    assert_eq!(live, 1);
}

#[tokio::test]
async fn test_teardown_cancels_the_live_attempt() {
    let mock = Arc::new(MockTransport::new());
    let parked = mock.hold_detached();
    let mut controller = controller(mock.clone());

    controller.evaluate(QUERY, Variables::new());
    let rx = controller.subscribe();
    sleep(Duration::from_millis(20)).await;

    drop(controller);
    assert!(mock.recorded()[0].token.is_cancelled());

    // A completion arriving after teardown must not mutate state.
    parked.send(Ok(json!(1))).expect("attempt still parked");
    sleep(Duration::from_millis(50)).await;
    assert!(rx.borrow().is_pending());
}

#[tokio::test]
async fn test_refetch_supersedes_an_inflight_fetch() {
    let mock = Arc::new(MockTransport::new());
    let _slow = mock.hold();
    mock.respond_ok(json!(2));
    let mut controller = controller(mock.clone());

    controller.evaluate(QUERY, Variables::new());
    sleep(Duration::from_millis(20)).await;
    controller.refetch();

    let state = settled(&controller).await;
    assert_eq!(state.data(), Some(&json!(2)));
    assert!(mock.recorded()[0].token.is_cancelled());
}
