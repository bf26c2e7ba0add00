//! Session establishment listener.
//!
//! After a magic link is opened, the listener decides whether a session was
//! established and routes the user exactly once:
//!
//! ```text
//!            SIGNED_IN / INITIAL_SESSION (with session)
//!   WAITING ───────────────────────────────────────────▶ ESTABLISHED ─▶ /dashboard
//!      │     SIGNED_OUT (no session)
//!      ├───────────────────────────────────────────────▶ REJECTED    ─▶ /signin
//!      │     deadline → direct query: session present
//!      ├───────────────────────────────────────────────▶ ESTABLISHED ─▶ /dashboard
//!      │     deadline → direct query: no session
//!      └───────────────────────────────────────────────▶ TIMED_OUT   ─▶ /signin
//! ```
//!
//! The state and the liveness flag live behind one mutex. Every transition
//! re-checks both, so once a terminal state is reached or the listener is
//! unmounted, nothing else can change state or navigate.

use std::fmt;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use utoipa::ToSchema;

use crate::domain::{AuthChangeEvent, SessionEvent};
use crate::identity::{SessionSource, SessionSubscription};

/// Route of the authenticated area.
pub const DASHBOARD_ROUTE: &str = "/dashboard";
/// Route of the sign-in entry point.
pub const SIGN_IN_ROUTE: &str = "/signin";
/// Route of the "check your email" waiting page.
pub const CHECK_EMAIL_ROUTE: &str = "/signin/check-email";

/// Listener state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ListenerState {
    /// No outcome yet.
    Waiting,
    /// A session exists; the user goes to the dashboard.
    Established,
    /// The identity client signed out while waiting.
    Rejected,
    /// The deadline passed and no session exists.
    TimedOut,
}

impl ListenerState {
    /// Returns `true` for every state except [`ListenerState::Waiting`].
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Waiting)
    }

    /// Navigation performed on entering this state, if any.
    #[must_use]
    pub fn navigation(self) -> Option<Navigation> {
        let (route, title, description, destructive) = match self {
            Self::Waiting => return None,
            Self::Established => (
                DASHBOARD_ROUTE,
                "Signed In",
                "You have been successfully signed in. Redirecting...",
                false,
            ),
            Self::Rejected => (
                SIGN_IN_ROUTE,
                "Session Error",
                "Your session may have expired or is invalid. Please try signing in again.",
                true,
            ),
            Self::TimedOut => (
                SIGN_IN_ROUTE,
                "Authentication Timeout",
                "Authentication timed out. Please try signing in again.",
                true,
            ),
        };
        Some(Navigation {
            state: self,
            route: route.to_string(),
            notice: Notice {
                title: title.to_string(),
                description: description.to_string(),
                destructive,
            },
        })
    }
}

/// Message shown alongside a navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Notice {
    /// Short heading.
    pub title: String,
    /// Body text.
    pub description: String,
    /// Whether the notice reports a failure.
    pub destructive: bool,
}

/// A one-time, history-replacing navigation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct Navigation {
    /// Terminal state that caused the navigation.
    pub state: ListenerState,
    /// Destination route.
    pub route: String,
    /// Message to show on arrival.
    pub notice: Notice,
}

/// Receives the listener's single navigation.
pub trait Navigator: Send + Sync + fmt::Debug {
    /// Replaces the current view with `navigation.route`.
    fn replace(&self, navigation: Navigation);
}

/// [`Navigator`] that hands the navigation to a oneshot receiver.
#[derive(Debug)]
pub struct ChannelNavigator {
    sender: Mutex<Option<oneshot::Sender<Navigation>>>,
}

impl ChannelNavigator {
    /// Creates the navigator and the receiver its navigation arrives on.
    #[must_use]
    pub fn new() -> (Self, oneshot::Receiver<Navigation>) {
        let (sender, receiver) = oneshot::channel();
        (
            Self {
                sender: Mutex::new(Some(sender)),
            },
            receiver,
        )
    }
}

impl Navigator for ChannelNavigator {
    fn replace(&self, navigation: Navigation) {
        let sender = self.sender.lock().ok().and_then(|mut guard| guard.take());
        match sender {
            Some(sender) => {
                let _ = sender.send(navigation);
            }
            None => tracing::warn!(route = %navigation.route, "duplicate navigation dropped"),
        }
    }
}

/// State change triggered by a lifecycle notification, if any.
#[must_use]
pub fn transition_for(state: ListenerState, event: &SessionEvent) -> Option<ListenerState> {
    if state.is_terminal() {
        return None;
    }
    match (event.kind, event.has_session()) {
        (AuthChangeEvent::SignedIn | AuthChangeEvent::InitialSession, true) => {
            Some(ListenerState::Established)
        }
        (AuthChangeEvent::SignedOut, false) => Some(ListenerState::Rejected),
        _ => None,
    }
}

#[derive(Debug)]
struct Guard {
    state: ListenerState,
    active: bool,
}

#[derive(Debug)]
struct Shared {
    guard: Mutex<Guard>,
    navigator: Arc<dyn Navigator>,
}

impl Shared {
    fn state(&self) -> ListenerState {
        self.guard
            .lock()
            .map(|g| g.state)
            .unwrap_or(ListenerState::Waiting)
    }

    fn is_waiting(&self) -> bool {
        self.guard
            .lock()
            .is_ok_and(|g| g.active && g.state == ListenerState::Waiting)
    }

    fn deactivate(&self) {
        if let Ok(mut g) = self.guard.lock() {
            g.active = false;
        }
    }

    /// Moves to `next` and navigates, unless already terminal or unmounted.
    fn settle(&self, next: ListenerState) {
        let entered = match self.guard.lock() {
            Ok(mut g) if g.active && !g.state.is_terminal() => {
                g.state = next;
                true
            }
            _ => false,
        };
        if entered && let Some(navigation) = next.navigation() {
            tracing::info!(state = ?next, route = %navigation.route, "session listener settled");
            self.navigator.replace(navigation);
        }
    }
}

/// A mounted session listener.
///
/// Owns one subscription and one deadline. Both are released when the
/// listener is unmounted or dropped.
#[derive(Debug)]
pub struct SessionListener {
    shared: Arc<Shared>,
    task: JoinHandle<()>,
}

impl SessionListener {
    /// Subscribes to `source`, arms the deadline, and starts listening.
    ///
    /// Must be called from within a tokio runtime.
    pub async fn mount(
        source: Arc<dyn SessionSource>,
        navigator: Arc<dyn Navigator>,
        deadline: Duration,
    ) -> Self {
        let shared = Arc::new(Shared {
            guard: Mutex::new(Guard {
                state: ListenerState::Waiting,
                active: true,
            }),
            navigator,
        });
        let subscription = source.subscribe().await;
        let task = tokio::spawn(run(Arc::clone(&shared), subscription, source, deadline));
        tracing::debug!(deadline_ms = deadline.as_millis(), "session listener mounted");
        Self { shared, task }
    }

    /// Returns the current state.
    #[must_use]
    pub fn state(&self) -> ListenerState {
        self.shared.state()
    }

    /// Unsubscribes and cancels the deadline. No transition happens after
    /// this returns.
    pub fn unmount(self) {
        drop(self);
    }
}

impl Drop for SessionListener {
    fn drop(&mut self) {
        self.shared.deactivate();
        self.task.abort();
    }
}

async fn run(
    shared: Arc<Shared>,
    mut subscription: SessionSubscription,
    source: Arc<dyn SessionSource>,
    deadline: Duration,
) {
    let timer = tokio::time::sleep(deadline);
    tokio::pin!(timer);

    loop {
        tokio::select! {
            event = subscription.recv() => {
                let Some(event) = event else {
                    // Source gone: only the deadline can still settle us.
                    (&mut timer).await;
                    on_deadline(&shared, source.as_ref()).await;
                    break;
                };
                tracing::debug!(event = %event.kind, has_session = event.has_session(), "session event");
                if let Some(next) = transition_for(shared.state(), &event) {
                    shared.settle(next);
                }
                if !shared.is_waiting() {
                    break;
                }
            }
            () = &mut timer => {
                on_deadline(&shared, source.as_ref()).await;
                break;
            }
        }
    }
    subscription.unsubscribe();
}

async fn on_deadline(shared: &Shared, source: &dyn SessionSource) {
    if !shared.is_waiting() {
        return;
    }
    let next = match source.current_session().await {
        Some(_) => {
            tracing::info!("deadline reached with a session; notification was missed");
            ListenerState::Established
        }
        None => {
            tracing::warn!("authentication timed out without a session");
            ListenerState::TimedOut
        }
    };
    shared.settle(next);
}
