//! Single-flight credential refresh.
//!
//! Any number of callers may discover an expired credential at the same
//! time. The first one starts the refresh call and parks a shared future in
//! the coordinator's slot; everyone else clones that future and awaits the
//! same settlement. The slot is emptied as soon as the call settles, so the
//! next expiry starts a fresh cycle.
//!
//! ```text
//!   Idle ──Start──► InFlight ──Succeed──► Succeeded ──Reset──► Idle
//!                       │
//!                       └────Fail────► Failed ──Reset──► Idle
//! ```

use crate::{AuthError, AuthResult, AuthService, LogoutService};
use console_storage::{Credential, CredentialStore};
use futures_util::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use rust_fsm::*;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

state_machine! {
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub refresh_machine(Idle)

    Idle => {
        Start => InFlight
    },
    InFlight => {
        Succeed => Succeeded,
        Fail => Failed
    },
    Succeeded => {
        Reset => Idle
    },
    Failed => {
        Reset => Idle
    }
}

pub use refresh_machine::Input as RefreshMachineInput;
pub use refresh_machine::State as RefreshMachineState;
pub use refresh_machine::StateMachine as RefreshMachine;

/// Refresh coordinator settings.
#[derive(Debug, Clone)]
pub struct RefreshConfig {
    /// Upper bound for one refresh call. Expiry counts as a failed refresh.
    pub timeout: Duration,
}

impl Default for RefreshConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
        }
    }
}

type SharedRefresh = Shared<BoxFuture<'static, Result<Credential, Arc<AuthError>>>>;

struct RefreshSlot {
    machine: RefreshMachine,
    pending: Option<SharedRefresh>,
    /// Completed cycles, for diagnostics.
    cycles: u64,
}

struct Inner {
    store: CredentialStore,
    auth: Arc<dyn AuthService>,
    logout: LogoutService,
    config: RefreshConfig,
    slot: Mutex<RefreshSlot>,
}

/// Deduplicates concurrent refresh requests into one auth service call.
///
/// Cheap to clone; clones share the same slot.
#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<Inner>,
}

impl RefreshCoordinator {
    pub fn new(
        store: CredentialStore,
        auth: Arc<dyn AuthService>,
        logout: LogoutService,
        config: RefreshConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                store,
                auth,
                logout,
                config,
                slot: Mutex::new(RefreshSlot {
                    machine: RefreshMachine::new(),
                    pending: None,
                    cycles: 0,
                }),
            }),
        }
    }

    /// Obtain a new credential, joining the outstanding attempt if there is one.
    ///
    /// On failure the session has already been ended locally and the error is
    /// [`AuthError::RefreshFailed`] wrapping the shared cause.
    pub async fn refresh(&self) -> AuthResult<Credential> {
        let shared = {
            let mut slot = self.inner.slot.lock();
            match &slot.pending {
                Some(pending) => {
                    debug!("joining in-flight refresh");
                    pending.clone()
                }
                None => {
                    slot.machine
                        .consume(&RefreshMachineInput::Start)
                        .map_err(|_| {
                            AuthError::InvalidStateTransition(format!(
                                "Cannot start refresh in state {:?}",
                                slot.machine.state()
                            ))
                        })?;
                    let attempt = run_refresh(self.inner.clone()).boxed().shared();
                    slot.pending = Some(attempt.clone());
                    debug!("refresh started");
                    attempt
                }
            }
        };

        shared.await.map_err(AuthError::RefreshFailed)
    }

    /// Current machine state.
    pub fn state(&self) -> RefreshMachineState {
        self.inner.slot.lock().machine.state().clone()
    }

    pub fn is_in_flight(&self) -> bool {
        self.inner.slot.lock().pending.is_some()
    }

    /// Number of refresh cycles that have settled.
    pub fn completed_cycles(&self) -> u64 {
        self.inner.slot.lock().cycles
    }
}

async fn run_refresh(inner: Arc<Inner>) -> Result<Credential, Arc<AuthError>> {
    match inner.fetch().await {
        Ok(credential) => {
            inner.settle(RefreshMachineInput::Succeed);
            info!("access token refreshed");
            Ok(credential)
        }
        Err(err) => {
            warn!(error = %err, "refresh failed, ending session");
            inner.logout.end_session_locally();
            inner.settle(RefreshMachineInput::Fail);
            Err(Arc::new(err))
        }
    }
}

impl Inner {
    async fn fetch(&self) -> AuthResult<Credential> {
        let refresh_token_id = self
            .store
            .refresh_token_id()?
            .ok_or(AuthError::NotLoggedIn)?;

        let grant = tokio::time::timeout(self.config.timeout, self.auth.refresh(&refresh_token_id))
            .await
            .map_err(|_| AuthError::Timeout)??;

        let credential = grant.credential()?;
        // Stored before the shared result resolves, so no waiter reads a stale value.
        self.store.set(&credential)?;
        Ok(credential)
    }

    fn settle(&self, outcome: RefreshMachineInput) {
        let mut slot = self.slot.lock();
        if slot.machine.consume(&outcome).is_err() {
            warn!(?outcome, state = ?slot.machine.state(), "unexpected refresh outcome");
        }
        if slot.machine.consume(&RefreshMachineInput::Reset).is_err() {
            slot.machine = RefreshMachine::new();
        }
        slot.pending = None;
        slot.cycles += 1;
    }
}
