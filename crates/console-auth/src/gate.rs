//! Session gate: decides once per mount whether protected content may render.
//!
//! ```text
//!   Unknown ──Mount──► Checking ──Grant──► Authenticated
//!                          │
//!                          └──────Deny───► Unauthenticated
//! ```
//!
//! Both terminal states have no outgoing transitions. A new evaluation needs
//! a new gate.

use crate::claims::is_expired;
use crate::{AuthError, AuthResult, LogoutOutcome, LogoutService, RefreshCoordinator};
use console_storage::CredentialStore;
use parking_lot::Mutex;
use rust_fsm::*;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::watch;
use tracing::{debug, info, warn};

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub gate_machine(Unknown)

    Unknown => {
        Mount => Checking
    },
    Checking => {
        Grant => Authenticated,
        Deny => Unauthenticated
    }
}

pub use gate_machine::Input as GateMachineInput;
pub use gate_machine::State as GateMachineState;
pub use gate_machine::StateMachine as GateMachine;

/// Session status as seen by guarded views.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Unknown,
    Checking,
    Authenticated,
    Unauthenticated,
}

impl SessionStatus {
    pub fn is_settled(&self) -> bool {
        matches!(
            self,
            SessionStatus::Authenticated | SessionStatus::Unauthenticated
        )
    }
}

impl From<&GateMachineState> for SessionStatus {
    fn from(state: &GateMachineState) -> Self {
        match state {
            GateMachineState::Unknown => SessionStatus::Unknown,
            GateMachineState::Checking => SessionStatus::Checking,
            GateMachineState::Authenticated => SessionStatus::Authenticated,
            GateMachineState::Unauthenticated => SessionStatus::Unauthenticated,
        }
    }
}

/// One protected-region mount.
pub struct SessionGate {
    store: CredentialStore,
    coordinator: RefreshCoordinator,
    logout: LogoutService,
    machine: Mutex<GateMachine>,
    logged_out: AtomicBool,
    status_tx: watch::Sender<SessionStatus>,
}

impl SessionGate {
    /// Mount a gate in the `Unknown` state.
    pub fn mount(
        store: CredentialStore,
        coordinator: RefreshCoordinator,
        logout: LogoutService,
    ) -> Self {
        let (status_tx, _) = watch::channel(SessionStatus::Unknown);
        Self {
            store,
            coordinator,
            logout,
            machine: Mutex::new(GateMachine::new()),
            logged_out: AtomicBool::new(false),
            status_tx,
        }
    }

    pub fn status(&self) -> SessionStatus {
        SessionStatus::from(self.machine.lock().state())
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionStatus> {
        self.status_tx.subscribe()
    }

    fn transition(&self, input: &GateMachineInput) -> AuthResult<SessionStatus> {
        let mut machine = self.machine.lock();
        let old_status = SessionStatus::from(machine.state());

        machine.consume(input).map_err(|_| {
            AuthError::InvalidStateTransition(format!(
                "Cannot apply {:?} in state {:?}",
                input,
                machine.state()
            ))
        })?;

        let new_status = SessionStatus::from(machine.state());
        drop(machine);

        if old_status != new_status {
            debug!(?old_status, ?new_status, "session gate transition");
            self.status_tx.send_replace(new_status);
        }

        Ok(new_status)
    }

    /// Establish the status for this mount. Only the first call does any work;
    /// later calls wait until that check has settled and return its status.
    pub async fn evaluate(&self) -> SessionStatus {
        if self.transition(&GateMachineInput::Mount).is_err() {
            return self.settled().await;
        }

        let verdict = match self.store.get() {
            Ok(None) => {
                debug!("no stored credential");
                GateMachineInput::Deny
            }
            Ok(Some(credential)) if !is_expired(Some(&credential.access_token)) => {
                GateMachineInput::Grant
            }
            Ok(Some(_)) => match self.coordinator.refresh().await {
                Ok(_) => GateMachineInput::Grant,
                Err(e) => {
                    warn!(error = %e, "refresh during session check failed");
                    GateMachineInput::Deny
                }
            },
            Err(e) => {
                warn!(error = %e, "could not read credential");
                GateMachineInput::Deny
            }
        };

        let status = match self.transition(&verdict) {
            Ok(status) => status,
            Err(e) => {
                warn!(error = %e, "session gate settled concurrently");
                self.status()
            }
        };

        if status == SessionStatus::Unauthenticated {
            self.end_session_once().await;
        }

        info!(?status, "session gate evaluated");
        status
    }

    async fn settled(&self) -> SessionStatus {
        let mut rx = self.subscribe();
        let settled = rx
            .wait_for(SessionStatus::is_settled)
            .await
            .map(|status| *status);
        settled.unwrap_or_else(|_| self.status())
    }

    /// Run `children` only when the mount is authenticated.
    pub fn render<T>(&self, children: impl FnOnce() -> T) -> Option<T> {
        match self.status() {
            SessionStatus::Authenticated => Some(children()),
            _ => None,
        }
    }

    /// Evaluate, then render.
    pub async fn guard<T>(&self, children: impl FnOnce() -> T) -> Option<T> {
        self.evaluate().await;
        self.render(children)
    }

    /// Whether this mount has already triggered its logout.
    pub fn has_logged_out(&self) -> bool {
        self.logged_out.load(Ordering::SeqCst)
    }

    async fn end_session_once(&self) -> Option<LogoutOutcome> {
        if self.logged_out.swap(true, Ordering::SeqCst) {
            return None;
        }
        Some(self.logout.logout().await)
    }
}
