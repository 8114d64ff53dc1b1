//! Hook invoked when the server reports the session as expired.

/// Receives control after a `401` once stored tokens have been cleared.
///
/// A browser host navigates to `redirect_to`; tests record the call.
pub trait SessionExpiredHandler: Send + Sync {
    fn session_expired(&self, redirect_to: &str);
}

impl<F> SessionExpiredHandler for F
where
    F: Fn(&str) + Send + Sync,
{
    fn session_expired(&self, redirect_to: &str) {
        self(redirect_to)
    }
}

/// Default handler: logs the redirect target and does nothing else.
#[derive(Clone, Copy, Debug, Default)]
pub struct LogSessionExpired;

impl SessionExpiredHandler for LogSessionExpired {
    fn session_expired(&self, _redirect_to: &str) {
        #[cfg(feature = "tracing")]
        tracing::warn!(redirect_to = _redirect_to, "session expired, login required");
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::{LogSessionExpired, SessionExpiredHandler};

    #[test]
    fn closures_are_handlers() {
        let seen = Mutex::new(Vec::new());
        let handler = |to: &str| seen.lock().expect("not poisoned").push(to.to_owned());
        handler.session_expired("/login");
        assert_eq!(*seen.lock().expect("not poisoned"), vec!["/login".to_owned()]);
    }

    #[test]
    fn log_handler_is_callable() {
        LogSessionExpired.session_expired("/login");
    }
}
