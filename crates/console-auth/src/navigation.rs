//! Navigation seam: how the session layer sends the operator back to sign-in.

use tokio::sync::watch;
use tracing::info;

/// Where the operator is being sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    /// Protected content.
    Dashboard,
    /// Unauthenticated entry point.
    Login,
}

pub trait Navigator: Send + Sync {
    /// Replace the current location with the sign-in entry point.
    fn redirect_to_login(&self);
}

/// Navigator that publishes the requested route on a watch channel.
#[derive(Debug)]
pub struct RouteNavigator {
    tx: watch::Sender<Route>,
}

impl RouteNavigator {
    pub fn new(initial: Route) -> Self {
        let (tx, _) = watch::channel(initial);
        Self { tx }
    }

    pub fn current(&self) -> Route {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<Route> {
        self.tx.subscribe()
    }

    /// True once any component asked for the sign-in route.
    pub fn redirected_to_login(&self) -> bool {
        self.current() == Route::Login
    }
}

impl Default for RouteNavigator {
    fn default() -> Self {
        Self::new(Route::Dashboard)
    }
}

impl Navigator for RouteNavigator {
    fn redirect_to_login(&self) {
        let previous = self.tx.send_replace(Route::Login);
        if previous != Route::Login {
            info!("redirecting to login");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_updates_current_route() {
        let navigator = RouteNavigator::default();
        assert_eq!(navigator.current(), Route::Dashboard);
        assert!(!navigator.redirected_to_login());

        navigator.redirect_to_login();
        assert!(navigator.redirected_to_login());
    }

    #[tokio::test]
    async fn subscribers_observe_redirect() {
        let navigator = RouteNavigator::default();
        let mut rx = navigator.subscribe();

        navigator.redirect_to_login();

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), Route::Login);
    }
}
