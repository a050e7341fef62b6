//! Session and token lifecycle for the QA console.
//!
//! This crate provides:
//! - Unverified claim inspection (`is_expired`)
//! - A single-flight refresh coordinator shared by every caller
//! - An authenticated request pipeline with one refresh-and-retry on 401
//! - A per-mount session gate backed by an explicit state machine
//! - Login and logout against the role-based auth service
//!
//! Nothing here holds global state. The composition root builds one
//! [`RefreshCoordinator`] and hands clones to the pipeline and every gate.

mod auth_client;
pub mod claims;
mod error;
mod gate;
mod login;
mod logout;
mod navigation;
mod pipeline;
mod refresh;
mod transport;

#[cfg(test)]
mod tests;

pub use auth_client::{AuthService, RbacAuthClient, TokenGrant};
pub use claims::{decode_claims, is_expired, is_expired_at, Claims};
pub use error::{AuthError, AuthResult};
pub use gate::gate_machine;
pub use gate::{GateMachine, GateMachineInput, GateMachineState, SessionGate, SessionStatus};
pub use login::{LoginOutcome, LoginService};
pub use logout::{LogoutOutcome, LogoutService, RemoteLogout};
pub use navigation::{Navigator, Route, RouteNavigator};
pub use pipeline::RequestPipeline;
pub use refresh::refresh_machine;
pub use refresh::{
    RefreshConfig, RefreshCoordinator, RefreshMachine, RefreshMachineInput, RefreshMachineState,
};
pub use transport::{ApiRequest, ApiResponse, ApiTransport, ReqwestTransport};
