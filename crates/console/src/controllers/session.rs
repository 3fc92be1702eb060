//! Login, registration and logout.
//!
//! Every session transition re-renders the full set of session-dependent
//! views. A successful login additionally reloads the favorites and closes
//! the login dialog after a short confirmation delay.

use pricewatch_core::{AuthPayload, Email, User};
use secrecy::{ExposeSecret, SecretString};
use tracing::{info, instrument, warn};

use super::FavoritesController;
use crate::command::Credentials;
use crate::error::{ConsoleError, Result, clear_sentry_user, set_sentry_user};
use crate::service::{DataService, ServiceResult};
use crate::state::{AppState, AuthNotice};
use crate::views;

/// Which endpoint an authentication attempt uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Register,
}

impl AuthMode {
    const fn progress(self) -> &'static str {
        match self {
            Self::Login => "Выполняется вход...",
            Self::Register => "Регистрируем...",
        }
    }

    const fn success(self) -> &'static str {
        match self {
            Self::Login => "Вход выполнен успешно!",
            Self::Register => "Регистрация прошла успешно!",
        }
    }
}

/// Drives the session lifecycle.
pub struct SessionController<'a, S> {
    state: &'a AppState<S>,
}

impl<'a, S: DataService> SessionController<'a, S> {
    #[must_use]
    pub const fn new(state: &'a AppState<S>) -> Self {
        Self { state }
    }

    /// Re-render every view keyed on the session.
    pub fn render_session_views(&self) {
        let snapshot = self.state.snapshot();
        views::render_session_views(self.state.screen(), self.state.chart(), &snapshot);
    }

    fn show_notice(&self, notice: Option<AuthNotice>) {
        let dialog = {
            let mut dialog = self.state.auth_dialog_mut();
            dialog.notice = notice;
            dialog.clone()
        };
        views::render_auth_modal(self.state.screen(), &dialog);
    }

    /// Open the login dialog with a clean message line.
    pub fn open_auth(&self) {
        let dialog = {
            let mut dialog = self.state.auth_dialog_mut();
            dialog.open = true;
            dialog.notice = None;
            dialog.close_token += 1;
            dialog.clone()
        };
        views::render_auth_modal(self.state.screen(), &dialog);
    }

    pub fn close_auth(&self) {
        let dialog = {
            let mut dialog = self.state.auth_dialog_mut();
            dialog.open = false;
            dialog.notice = None;
            dialog.close_token += 1;
            dialog.clone()
        };
        views::render_auth_modal(self.state.screen(), &dialog);
    }

    /// Sign in with existing credentials.
    ///
    /// # Errors
    ///
    /// Returns [`ConsoleError::Validation`] for a malformed email or empty
    /// password, [`ConsoleError::AuthInProgress`] if another attempt is
    /// running and [`ConsoleError::Service`] if the service refuses. The
    /// service's message is shown in the dialog verbatim.
    pub async fn login(&self, credentials: &Credentials) -> Result<User> {
        self.authenticate(AuthMode::Login, credentials).await
    }

    /// Create a new account and sign in to it.
    ///
    /// # Errors
    ///
    /// Same as [`SessionController::login`].
    pub async fn register(&self, credentials: &Credentials) -> Result<User> {
        self.authenticate(AuthMode::Register, credentials).await
    }

    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    async fn authenticate(&self, mode: AuthMode, credentials: &Credentials) -> Result<User> {
        let email = match Email::parse(&credentials.email) {
            Ok(email) => email,
            Err(err) => {
                self.show_notice(Some(AuthNotice::error(err.to_string())));
                return Err(err.into());
            }
        };
        let password = credentials.password();
        if password.expose_secret().is_empty() {
            let err = ConsoleError::Validation("введите пароль".to_owned());
            self.show_notice(Some(AuthNotice::error(err.to_string())));
            return Err(err);
        }

        let ticket = self.state.session().begin_auth()?;
        self.show_notice(Some(AuthNotice::info(mode.progress())));

        let response = self.call(mode, &email, &password).await;

        let payload = match response {
            Ok(payload) => payload,
            Err(err) => {
                warn!(?mode, error = %err, "Authentication failed");
                self.state.session().fail_auth(ticket);
                self.show_notice(Some(AuthNotice::error(err.message.clone())));
                self.render_session_views();
                return Err(err.into());
            }
        };

        let user = payload.user.clone();
        let Some(generation) = self.state.session().complete_auth(
            ticket,
            payload.user,
            SecretString::from(payload.token),
        ) else {
            info!("Session changed during authentication; result dropped");
            self.state.service().forget_session();
            return Err(ConsoleError::SessionChanged);
        };

        info!(?mode, user_id = %user.id, "Signed in");
        set_sentry_user(&user.id, Some(user.email.as_str()));
        self.show_notice(Some(AuthNotice::info(mode.success())));
        self.schedule_auth_close();

        self.post_auth_refresh(&user, generation).await;
        Ok(user)
    }

    async fn call(
        &self,
        mode: AuthMode,
        email: &Email,
        password: &SecretString,
    ) -> ServiceResult<AuthPayload> {
        match mode {
            AuthMode::Login => self.state.service().login(email, password).await,
            AuthMode::Register => self.state.service().register(email, password).await,
        }
    }

    /// Render the signed-in views, then reload the favorites behind them.
    async fn post_auth_refresh(&self, user: &User, generation: u64) {
        self.render_session_views();
        if let Err(err) = FavoritesController::new(self.state)
            .reload_for(user, generation)
            .await
        {
            warn!(error = %err, "Favorites reload after sign-in failed");
        }
    }

    /// Close the dialog after the configured delay, unless it was reopened
    /// or closed in the meantime.
    fn schedule_auth_close(&self) {
        let token = {
            let mut dialog = self.state.auth_dialog_mut();
            dialog.close_token += 1;
            dialog.close_token
        };
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            self.close_auth();
            return;
        };

        let state = self.state.clone();
        let delay = self.state.config().auth_close_delay;
        runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            let dialog = {
                let mut dialog = state.auth_dialog_mut();
                if dialog.close_token != token || !dialog.open {
                    return;
                }
                dialog.open = false;
                dialog.notice = None;
                dialog.clone()
            };
            views::render_auth_modal(state.screen(), &dialog);
        });
    }

    /// Sign out locally. Favorites are discarded; the comparison stays.
    ///
    /// Returns the user that was signed in.
    #[instrument(skip(self))]
    pub fn logout(&self) -> Option<User> {
        let user = self.state.sign_out();
        self.state.service().forget_session();
        clear_sentry_user();
        if let Some(user) = &user {
            info!(user_id = %user.id, "Signed out");
        }
        self.render_session_views();
        user
    }
}
