//! Popup opener and lifecycle state machine.
//!
//! ```text
//! Constructed ──load()──► Opening ──ready──► Ready ──hidden──► Closed
//!                            │
//!                            └──timeout──► Failed
//! ```
//!
//! [`PopupOpener::load`] performs its synchronous part immediately (launcher
//! call, context registration) and returns a future for the readiness wait.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::sync::Arc;

use futures_util::FutureExt;
use futures_util::future::BoxFuture;
use parking_lot::Mutex;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::context::Context;
use crate::dom::Element;
use crate::error::{Error, Result};
use crate::focus::popup_ready;
use crate::identifiers::PopupId;
use crate::launcher::{OpenCallback, OpenRequest};
use crate::observer::{CloseHandler, VisibilityObserver};

use super::core::ManagerInner;

// ============================================================================
// Types
// ============================================================================

/// Handler invoked with the popup element once it is ready.
pub type LoadHandler = Arc<dyn Fn(&Element) + Send + Sync>;

/// Custom readiness predicate.
pub type ReadyPredicate = Arc<dyn Fn() -> bool + Send + Sync>;

/// Lifecycle state of a popup opener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PopupState {
    /// Created, `load()` not called yet.
    Constructed,
    /// Waiting for readiness.
    Opening,
    /// Ready; the visibility observer is attached.
    Ready,
    /// Readiness wait failed.
    Failed,
    /// Hidden after being ready. Terminal.
    Closed,
}

impl PopupState {
    /// Returns the state name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Constructed => "constructed",
            Self::Opening => "opening",
            Self::Ready => "ready",
            Self::Failed => "failed",
            Self::Closed => "closed",
        }
    }
}

impl fmt::Display for PopupState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mutable load bookkeeping shared with in-flight loads.
struct LoadStatus {
    state: PopupState,
    /// Bumped by every `load()`; stale loads and observers leave state alone.
    generation: u64,
    observer: Option<VisibilityObserver>,
}

// ============================================================================
// PopupOpener
// ============================================================================

/// A request to open one popup.
///
/// Created by [`PopupManager::opener`](super::PopupManager::opener) and
/// configured with the `with_*` / `on_*` methods before [`load`](Self::load).
///
/// Cloning yields another handle sharing the lifecycle state and observer.
#[derive(Clone)]
pub struct PopupOpener {
    /// Owning manager.
    manager: Arc<ManagerInner>,
    /// Log correlation id.
    uuid: Uuid,
    /// Target container id.
    target_id: PopupId,
    /// Content URL.
    url: String,
    /// Opaque payload.
    data: Value,
    /// Opaque callback.
    callback: Option<OpenCallback>,
    /// Opaque positioning parameter.
    p: Value,
    /// Opaque timing parameter.
    t: Value,
    /// Ready handler.
    on_load: Option<LoadHandler>,
    /// Close handler.
    on_close: Option<CloseHandler>,
    /// Parent of the context registered by `load()`.
    parent_context: Option<Context>,
    /// Custom readiness predicate.
    predicate: Option<ReadyPredicate>,
    /// Lifecycle bookkeeping.
    status: Arc<Mutex<LoadStatus>>,
}

impl fmt::Debug for PopupOpener {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PopupOpener")
            .field("uuid", &self.uuid)
            .field("target_id", &self.target_id)
            .field("url", &self.url)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl PopupOpener {
    /// Creates a new opener.
    pub(crate) fn new(manager: Arc<ManagerInner>, target_id: PopupId, url: String) -> Self {
        Self {
            manager,
            uuid: Uuid::new_v4(),
            target_id,
            url,
            data: Value::Null,
            callback: None,
            p: Value::Null,
            t: Value::Null,
            on_load: None,
            on_close: None,
            parent_context: None,
            predicate: None,
            status: Arc::new(Mutex::new(LoadStatus {
                state: PopupState::Constructed,
                generation: 0,
                observer: None,
            })),
        }
    }
}

// ============================================================================
// PopupOpener - Configuration
// ============================================================================

impl PopupOpener {
    /// Sets the opaque payload passed to the launcher.
    ///
    /// # Arguments
    ///
    /// * `data` - Payload forwarded unchanged in [`OpenRequest::data`]
    #[must_use]
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    /// Sets the opaque callback passed to the launcher.
    ///
    /// # Arguments
    ///
    /// * `callback` - Closure forwarded in [`OpenRequest::callback`]; never called here
    #[must_use]
    pub fn with_callback<F>(mut self, callback: F) -> Self
    where
        F: Fn(Value) + Send + Sync + 'static,
    {
        self.callback = Some(Arc::new(callback));
        self
    }

    /// Sets the opaque positioning parameter passed to the launcher.
    ///
    /// # Arguments
    ///
    /// * `p` - Positioning value (e.g., `"center"`)
    #[must_use]
    pub fn with_p(mut self, p: Value) -> Self {
        self.p = p;
        self
    }

    /// Sets the opaque timing parameter passed to the launcher.
    ///
    /// # Arguments
    ///
    /// * `t` - Timing value (e.g., an animation duration in ms)
    #[must_use]
    pub fn with_t(mut self, t: Value) -> Self {
        self.t = t;
        self
    }

    /// Sets the handler invoked with the element once the popup is ready.
    ///
    /// # Arguments
    ///
    /// * `handler` - Runs on the task awaiting `load()`, before it resolves
    #[must_use]
    pub fn on_load<F>(mut self, handler: F) -> Self
    where
        F: Fn(&Element) + Send + Sync + 'static,
    {
        self.on_load = Some(Arc::new(handler));
        self
    }

    /// Sets the handler invoked once when the ready popup becomes hidden.
    ///
    /// # Arguments
    ///
    /// * `handler` - Runs on the observer task
    #[must_use]
    pub fn on_close<F>(mut self, handler: F) -> Self
    where
        F: Fn() + Send + Sync + 'static,
    {
        self.on_close = Some(Arc::new(handler));
        self
    }

    /// Sets the context the popup's context inherits from.
    ///
    /// # Arguments
    ///
    /// * `parent` - Context whose properties read through from the popup's context
    #[must_use]
    pub fn with_parent_context(mut self, parent: Context) -> Self {
        self.parent_context = Some(parent);
        self
    }

    /// Replaces the default readiness predicate.
    ///
    /// # Arguments
    ///
    /// * `predicate` - Polled on every tick until it returns `true`
    ///
    /// The target element must exist once the predicate holds, otherwise
    /// `load()` fails with [`Error::ElementNotFound`].
    #[must_use]
    pub fn with_predicate<F>(mut self, predicate: F) -> Self
    where
        F: Fn() -> bool + Send + Sync + 'static,
    {
        self.predicate = Some(Arc::new(predicate));
        self
    }
}

// ============================================================================
// PopupOpener - Accessors
// ============================================================================

impl PopupOpener {
    /// Returns the target container id.
    #[inline]
    #[must_use]
    pub fn target_id(&self) -> &PopupId {
        &self.target_id
    }

    /// Returns the content URL.
    #[inline]
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Returns the opaque payload.
    #[inline]
    #[must_use]
    pub fn data(&self) -> &Value {
        &self.data
    }

    /// Returns the opaque positioning parameter.
    #[inline]
    #[must_use]
    pub fn p(&self) -> &Value {
        &self.p
    }

    /// Returns the opaque timing parameter.
    #[inline]
    #[must_use]
    pub fn t(&self) -> &Value {
        &self.t
    }

    /// Returns the parent context, if set.
    #[inline]
    #[must_use]
    pub fn parent_context(&self) -> Option<&Context> {
        self.parent_context.as_ref()
    }

    /// Returns the log correlation id.
    #[inline]
    #[must_use]
    pub fn uuid(&self) -> &Uuid {
        &self.uuid
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub fn state(&self) -> PopupState {
        self.status.lock().state
    }

    /// Returns the visibility observer of the latest successful load.
    #[must_use]
    pub fn observer(&self) -> Option<VisibilityObserver> {
        self.status.lock().observer.clone()
    }

    /// Returns the context currently registered for this popup's target id.
    #[must_use]
    pub fn context(&self) -> Option<Context> {
        self.manager.registry.lookup(self.target_id.as_str())
    }
}

// ============================================================================
// PopupOpener - Load
// ============================================================================

impl PopupOpener {
    /// Opens the popup and waits for it to become ready.
    ///
    /// Before returning, this synchronously:
    ///
    /// 1. hands an [`OpenRequest`] to the launcher,
    /// 2. registers a fresh context for the target id (replacing any previous
    ///    one), inheriting from the parent context if set.
    ///
    /// The returned future then polls the readiness predicate (custom, or
    /// "the target contains a focusable element"). Once ready it attaches the
    /// visibility observer, calls `on_load`, and yields the element.
    ///
    /// # Errors
    ///
    /// - [`Error::Timeout`] if the popup is not ready within the manager's
    ///   ready timeout; `on_load` is not called and no observer is attached
    /// - [`Error::ElementNotFound`] if a custom predicate holds but the
    ///   target element does not exist
    pub fn load(&self) -> BoxFuture<'static, Result<Element>> {
        let generation = {
            let mut status = self.status.lock();
            status.generation += 1;
            status.state = PopupState::Opening;
            status.generation
        };

        info!(
            opener = %self.uuid,
            target_id = %self.target_id,
            url = %self.url,
            generation,
            "Loading popup"
        );

        let request = OpenRequest {
            target_id: self.target_id.clone(),
            url: self.url.clone(),
            data: self.data.clone(),
            callback: self.callback.clone(),
            p: self.p.clone(),
            t: self.t.clone(),
        };
        self.manager.launcher.open(&request);

        self.manager
            .registry
            .register(self.target_id.clone(), self.parent_context.clone());

        let predicate = self.readiness_predicate();
        let waiter = self.manager.options.waiter();
        let document = Arc::clone(&self.manager.document);
        let target_id = self.target_id.clone();
        let uuid = self.uuid;
        let on_load = self.on_load.clone();
        let on_close = self.on_close.clone();
        let status = Arc::clone(&self.status);

        async move {
            if let Err(err) = waiter.wait(|| predicate()).await {
                warn!(
                    opener = %uuid,
                    target_id = %target_id,
                    error = %err,
                    "Popup did not become ready"
                );
                Self::transition(&status, generation, PopupState::Failed);
                return Err(match err {
                    Error::Timeout { timeout_ms, .. } => {
                        Error::timeout(format!("popup '{target_id}' readiness"), timeout_ms)
                    }
                    other => other,
                });
            }

            let Some(element) = Element::by_id(&document, target_id.as_str()) else {
                warn!(opener = %uuid, target_id = %target_id, "Ready popup has no target element");
                Self::transition(&status, generation, PopupState::Failed);
                return Err(Error::element_not_found(target_id));
            };

            Self::transition(&status, generation, PopupState::Ready);
            info!(opener = %uuid, target_id = %target_id, node = %element.node(), "Popup ready");

            let close_status = Arc::clone(&status);
            let close_target = target_id.clone();
            let close_handler: CloseHandler = Arc::new(move || {
                Self::transition(&close_status, generation, PopupState::Closed);
                info!(opener = %uuid, target_id = %close_target, "Popup closed");
                if let Some(handler) = &on_close {
                    handler();
                }
            });

            let observer = VisibilityObserver::attach(&element, Some(close_handler));
            {
                let mut current = status.lock();
                if current.generation == generation {
                    current.observer = Some(observer);
                }
            }

            if let Some(handler) = &on_load {
                debug!(opener = %uuid, target_id = %target_id, "Invoking load handler");
                handler(&element);
            }

            Ok(element)
        }
        .boxed()
    }

    /// Picks the custom predicate, or the default one bound to the target id.
    fn readiness_predicate(&self) -> ReadyPredicate {
        if let Some(predicate) = &self.predicate {
            return Arc::clone(predicate);
        }

        let document = Arc::clone(&self.manager.document);
        let target_id = self.target_id.clone();
        Arc::new(move || popup_ready(document.as_ref(), target_id.as_str()))
    }

    /// Moves to `state` if `generation` is still the latest load.
    fn transition(status: &Mutex<LoadStatus>, generation: u64, state: PopupState) {
        let mut status = status.lock();
        if status.generation != generation {
            debug!(generation, latest = status.generation, %state, "Ignoring stale transition");
            return;
        }
        status.state = state;
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use std::time::Duration;

    use serde_json::json;
    use tokio_test::{assert_pending, assert_ready_ok};

    use crate::dom::MemoryDocument;
    use crate::identifiers::NodeId;
    use crate::launcher::RecordingLauncher;
    use crate::popup::{PopupManager, PopupOptions};

    struct Fixture {
        doc: Arc<MemoryDocument>,
        launcher: Arc<RecordingLauncher>,
        popups: PopupManager,
        layer: NodeId,
    }

    /// A `menu` layer containing a button.
    fn fixture() -> Fixture {
        let doc = Arc::new(MemoryDocument::new());
        let layer = doc.create_element("div");
        let button = doc.create_element("button");
        doc.set_id(layer, "menu");
        doc.append_child(doc.body(), layer);
        doc.append_child(layer, button);

        let launcher = Arc::new(RecordingLauncher::new());
        let popups = PopupManager::builder()
            .document(doc.clone())
            .launcher(launcher.clone())
            .options(PopupOptions::new().with_ready_timeout(Duration::from_millis(200)))
            .build()
            .expect("complete builder");

        Fixture {
            doc,
            launcher,
            popups,
            layer,
        }
    }

    #[test]
    fn test_state_display() {
        assert_eq!(PopupState::Opening.to_string(), "opening");
        assert_eq!(
            serde_json::to_value(PopupState::Closed).unwrap(),
            json!("closed")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_load_lifecycle() {
        let fx = fixture();
        let opener = fx.popups.opener("menu", "/menu.html").expect("valid");
        assert_eq!(opener.state(), PopupState::Constructed);

        let pending = opener.load();
        assert_eq!(opener.state(), PopupState::Opening);

        let element = pending.await.expect("ready");
        assert_eq!(element.node(), fx.layer);
        assert_eq!(opener.state(), PopupState::Ready);

        let observer = opener.observer().expect("observer attached");
        fx.doc.set_style(fx.layer, "display", "none");
        observer.closed().await;
        assert_eq!(opener.state(), PopupState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_launcher_receives_request() {
        let fx = fixture();
        let opener = fx
            .popups
            .opener("menu", "/menu.html")
            .expect("valid")
            .with_data(json!({ "id": 7 }))
            .with_p(json!("center"))
            .with_t(json!(300))
            .with_callback(|_| {});

        opener.load().await.expect("ready");

        let requests = fx.launcher.requests();
        assert_eq!(requests.len(), 1);
        let request = &requests[0];
        assert_eq!(request.target_id.as_str(), "menu");
        assert_eq!(request.url, "/menu.html");
        assert_eq!(request.data, json!({ "id": 7 }));
        assert_eq!(request.p, json!("center"));
        assert_eq!(request.t, json!(300));
        assert!(request.callback.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_context_registered_before_future_polled() {
        let fx = fixture();
        let ready = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ready);
        let opener = fx
            .popups
            .opener("menu", "/menu.html")
            .expect("valid")
            .with_predicate(move || flag.load(Ordering::SeqCst));

        assert!(fx.popups.get_context("menu").is_none());

        let mut task = tokio_test::task::spawn(opener.load());
        let context = fx.popups.get_context("menu").expect("registered");
        context.extend([&json!({ "step": 1 })]).expect("object source");
        assert_pending!(task.poll());

        ready.store(true, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(32)).await;
        assert_ready_ok!(task.poll());
        assert_eq!(opener.context().and_then(|c| c.get("step")), Some(json!(1)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_fails_without_onload_or_observer() {
        let fx = fixture();
        let loaded = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&loaded);
        let opener = fx
            .popups
            .opener("menu", "/menu.html")
            .expect("valid")
            .with_predicate(|| false)
            .on_load(move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            });

        let err = opener.load().await.expect_err("times out");

        assert!(err.is_timeout());
        assert!(err.to_string().contains("popup 'menu' readiness"));
        assert_eq!(opener.state(), PopupState::Failed);
        assert!(opener.observer().is_none());
        assert_eq!(loaded.load(Ordering::SeqCst), 0);
        assert_eq!(fx.doc.subscriber_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_custom_predicate_without_element() {
        let fx = fixture();
        let opener = fx
            .popups
            .opener("ghost", "/ghost.html")
            .expect("valid")
            .with_predicate(|| true);

        let err = opener.load().await.expect_err("no element");
        assert!(matches!(err, Error::ElementNotFound { .. }));
        assert_eq!(opener.state(), PopupState::Failed);
    }

    #[tokio::test(start_paused = true)]
    async fn test_onload_receives_target_element() {
        let fx = fixture();
        let seen = Arc::new(Mutex::new(None));
        let sink = Arc::clone(&seen);
        let opener = fx
            .popups
            .opener("menu", "/menu.html")
            .expect("valid")
            .on_load(move |element| {
                *sink.lock() = Some(element.node());
            });

        opener.load().await.expect("ready");
        assert_eq!(*seen.lock(), Some(fx.layer));
    }

    #[tokio::test(start_paused = true)]
    async fn test_reload_replaces_context_and_observer() {
        let fx = fixture();
        let opener = fx.popups.opener("menu", "/menu.html").expect("valid");

        opener.load().await.expect("first load");
        let first_context = opener.context().expect("registered");
        let first_observer = opener.observer().expect("attached");

        opener.load().await.expect("second load");
        let second_context = opener.context().expect("registered");
        let second_observer = opener.observer().expect("attached");

        assert!(!first_context.ptr_eq(&second_context));
        assert_eq!(first_observer.node(), second_observer.node());
        assert_eq!(fx.launcher.request_count(), 2);
        assert_eq!(fx.popups.registry().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_parent_context_inherited() {
        let fx = fixture();
        let parent = Context::new();
        parent.set("user", json!("ada"));

        let opener = fx
            .popups
            .opener("menu", "/menu.html")
            .expect("valid")
            .with_parent_context(parent.clone());
        let _pending = opener.load();

        let context = fx.popups.get_context("menu").expect("registered");
        assert_eq!(context.get("user"), Some(json!("ada")));
        assert!(context.own_keys().is_empty());
        assert!(opener.parent_context().is_some_and(|p| p.ptr_eq(&parent)));
    }

    #[test]
    fn test_opener_is_clone_send_sync_and_debug() {
        fn assert_handle<T: Clone + Send + Sync + fmt::Debug>() {}
        assert_handle::<PopupOpener>();
    }

    #[tokio::test(start_paused = true)]
    async fn test_clones_share_lifecycle() {
        let fx = fixture();
        let opener = fx.popups.opener("menu", "/menu.html").expect("valid");
        let handle = opener.clone();

        handle.load().await.expect("ready");

        assert_eq!(opener.uuid(), handle.uuid());
        assert_eq!(opener.state(), PopupState::Ready);
        assert!(opener.observer().is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn test_hide_during_wait_is_not_observed() {
        let fx = fixture();
        let ready = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ready);
        let closes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&closes);
        let opener = fx
            .popups
            .opener("menu", "/menu.html")
            .expect("valid")
            .with_predicate(move || flag.load(Ordering::SeqCst))
            .on_close(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });

        let mut task = tokio_test::task::spawn(opener.load());
        assert_pending!(task.poll());

        tokio::time::sleep(Duration::from_millis(50)).await;
        fx.doc.set_style(fx.layer, "display", "none");
        tokio::time::sleep(Duration::from_millis(16)).await;
        assert_pending!(task.poll());
        assert_eq!(fx.doc.subscriber_count(), 0);

        ready.store(true, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(32)).await;
        assert_ready_ok!(task.poll());
        assert_eq!(fx.doc.subscriber_count(), 1);

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(closes.load(Ordering::SeqCst), 0);
        assert_eq!(opener.state(), PopupState::Ready);
        assert!(!opener.observer().expect("attached").is_closed());
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_load_attaches_its_own_observer() {
        let fx = fixture();
        let closes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&closes);
        let opener = fx
            .popups
            .opener("menu", "/menu.html")
            .expect("valid")
            .on_close(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            });

        opener.load().await.expect("first load");
        let first = opener.observer().expect("attached");
        opener.load().await.expect("second load");
        let second = opener.observer().expect("attached");
        assert_eq!(fx.doc.subscriber_count(), 2);

        fx.doc.set_style(fx.layer, "display", "none");
        first.closed().await;
        second.closed().await;

        assert_eq!(closes.load(Ordering::SeqCst), 2);
        assert_eq!(opener.state(), PopupState::Closed);
        assert_eq!(fx.doc.subscriber_count(), 0);
    }
}
