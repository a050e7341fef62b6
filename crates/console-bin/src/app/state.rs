//! Console state: the composition root for the session layer.

use console_auth::{
    ApiTransport, AuthService, LoginService, LogoutService, RbacAuthClient, RefreshConfig,
    RefreshCoordinator, ReqwestTransport, RequestPipeline, RouteNavigator, SessionGate,
};
use console_config_and_utils::{Config, Paths};
use console_storage::{CredentialStore, FileStorage, SessionStorage};
use std::sync::Arc;
use tracing::debug;

/// Everything a command needs. One refresh coordinator is shared by the
/// pipeline and every gate mounted from here.
pub struct ConsoleState {
    pub paths: Arc<Paths>,
    pub store: CredentialStore,
    pub navigator: Arc<RouteNavigator>,
    pub logout: LogoutService,
    pub coordinator: RefreshCoordinator,
    pub pipeline: RequestPipeline,
    pub login: LoginService,
}

impl ConsoleState {
    /// Build production state: file-backed session area, reqwest clients.
    pub fn build(config: Config, paths: Paths) -> Result<Self, Box<dyn std::error::Error>> {
        paths.ensure_dirs()?;

        let storage: Arc<dyn SessionStorage> = Arc::new(FileStorage::open(paths.session_file())?);
        let auth: Arc<dyn AuthService> = Arc::new(RbacAuthClient::new(
            &config.auth_url()?,
            config.application_id.clone(),
        )?);
        let transport: Arc<dyn ApiTransport> = Arc::new(ReqwestTransport::new(config.api_url()?)?);

        Ok(Self::with_services(&config, paths, storage, auth, transport))
    }

    /// Wire the session layer over the given backends.
    pub fn with_services(
        config: &Config,
        paths: Paths,
        storage: Arc<dyn SessionStorage>,
        auth: Arc<dyn AuthService>,
        transport: Arc<dyn ApiTransport>,
    ) -> Self {
        let store = CredentialStore::new(storage);
        let navigator = Arc::new(RouteNavigator::default());

        let logout = LogoutService::new(
            store.clone(),
            auth.clone(),
            navigator.clone(),
            config.refresh_timeout(),
        );
        let coordinator = RefreshCoordinator::new(
            store.clone(),
            auth.clone(),
            logout.clone(),
            RefreshConfig {
                timeout: config.refresh_timeout(),
            },
        );
        let pipeline = RequestPipeline::new(store.clone(), coordinator.clone(), transport);
        let login = LoginService::new(store.clone(), auth, config.allowed_roles.clone());

        debug!(
            api_url = %config.api_url,
            auth_url = %config.auth_url,
            session_file = %paths.session_file().display(),
            "console state initialized"
        );

        Self {
            paths: Arc::new(paths),
            store,
            navigator,
            logout,
            coordinator,
            pipeline,
            login,
        }
    }

    /// Mount a fresh session gate.
    pub fn mount_gate(&self) -> SessionGate {
        SessionGate::mount(
            self.store.clone(),
            self.coordinator.clone(),
            self.logout.clone(),
        )
    }
}
