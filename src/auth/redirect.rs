// Login redirect collaborator

/// Invoked once when the session cannot be recovered
pub trait LoginRedirect: Send + Sync {
    fn redirect_to_login(&self, login_path: &str);
}

impl<F> LoginRedirect for F
where
    F: Fn(&str) + Send + Sync,
{
    fn redirect_to_login(&self, login_path: &str) {
        self(login_path)
    }
}

/// Redirect for headless use: logs where the user has to go
#[derive(Debug, Default, Clone, Copy)]
pub struct LogRedirect;

impl LoginRedirect for LogRedirect {
    fn redirect_to_login(&self, login_path: &str) {
        tracing::warn!(
            login_path = login_path,
            "Session expired, sign in again (`studio-client login`)"
        );
    }
}
