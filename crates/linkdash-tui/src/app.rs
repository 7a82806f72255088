//! Application state management for linkdash.
//!
//! `App` is the session controller: it owns the bearer token and its expiry
//! timer, the current link snapshot, the create and edit forms, and the
//! channel through which background API tasks report back.

use std::future::Future;
use std::time::{Duration, Instant};

use anyhow::Result;
use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use linkdash_core::auth::{ExpiryPlan, TokenStore};
use linkdash_core::models::short_url;
use linkdash_core::validate::{validate_new_link, validate_url_update};
use linkdash_core::{ApiClient, ApiError, Config, ExpiryTimer, Link, Session};

use crate::actions;

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the background task message channel.
const CHANNEL_BUFFER_SIZE: usize = 32;

/// Maximum length for password input.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Maximum length for slug input.
const MAX_SLUG_LENGTH: usize = 64;

/// Maximum length for URL input.
const MAX_URL_LENGTH: usize = 2048;

/// How long the copy indicator shows a check mark.
pub const COPY_FEEDBACK_DURATION: Duration = Duration::from_millis(1500);

/// Number of rows to move on page up/down.
pub const PAGE_SCROLL_SIZE: usize = 10;

pub const SESSION_EXPIRED_MESSAGE: &str = "Session expired, please log in again.";

// ============================================================================
// UI State Types
// ============================================================================

/// Overall application state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    LoggingIn,
    Normal,
    EditingLink,
    ConfirmingDelete,
    ShowingHelp,
    ConfirmingQuit,
    Quitting,
}

/// Dashboard focus: the create form fields or the link table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Slug,
    Url,
    Table,
}

impl Focus {
    pub fn next(&self) -> Self {
        match self {
            Focus::Slug => Focus::Url,
            Focus::Url => Focus::Table,
            Focus::Table => Focus::Slug,
        }
    }

    pub fn prev(&self) -> Self {
        match self {
            Focus::Slug => Focus::Table,
            Focus::Url => Focus::Slug,
            Focus::Table => Focus::Url,
        }
    }
}

/// The link currently open in the edit modal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditContext {
    pub slug: String,
    pub url_input: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Error,
}

/// Blocking message that must be dismissed before anything else happens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn info(message: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Info, message: message.into() }
    }

    pub fn success(message: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Success, message: message.into() }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self { kind: NoticeKind::Error, message: message.into() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CopyFeedback {
    pub slug: String,
    pub until: Instant,
}

/// A server-side change to a link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Create { slug: String, url: String },
    Update { slug: String, url: String },
    Delete { slug: String },
}

impl Mutation {
    /// Shown when the server rejects the change without a message.
    fn fallback_message(&self) -> &'static str {
        match self {
            Mutation::Create { .. } => "Failed to create link",
            Mutation::Update { .. } => "Failed to save changes",
            Mutation::Delete { .. } => "Failed to delete link",
        }
    }

    /// Shown for transport or unexpected failures.
    fn unexpected_message(&self) -> &'static str {
        match self {
            Mutation::Create { .. } => "Something went wrong while creating the link. Please try again.",
            Mutation::Update { .. } => "Something went wrong while saving changes. Please try again.",
            Mutation::Delete { .. } => "Something went wrong while deleting the link. Please try again.",
        }
    }

    async fn apply(&self, api: &ApiClient) -> Result<(), ApiError> {
        match self {
            Mutation::Create { slug, url } => api.create_link(slug, url).await,
            Mutation::Update { slug, url } => api.update_link(slug, url).await,
            Mutation::Delete { slug } => api.delete_link(slug).await,
        }
    }
}

// ============================================================================
// Background Task Results
// ============================================================================

/// Outcome of a mutation: either it failed, or it succeeded and the list was
/// re-fetched.
#[derive(Debug)]
pub enum MutationOutcome {
    Failed(ApiError),
    Done { reload: Result<Vec<Link>, ApiError> },
}

/// Result types from background tasks, sent through the MPSC channel.
#[derive(Debug)]
enum TaskResult {
    /// Login finished with a token or an error
    LoggedIn(Result<String, ApiError>),
    /// Link list fetched
    LinksLoaded(Result<Vec<Link>, ApiError>),
    /// Create, update or delete finished
    Mutated(Mutation, MutationOutcome),
    /// The expiry timer fired
    SessionExpired,
}

/// A task result tagged with the session generation it was started under.
/// Results from an older generation are dropped.
#[derive(Debug)]
struct TaskMessage {
    generation: u64,
    result: TaskResult,
}

// ============================================================================
// Main Application Struct
// ============================================================================

pub struct App {
    // Core services
    pub config: Config,
    pub session: Session,
    pub api: ApiClient,

    // UI State
    pub state: AppState,
    pub focus: Focus,

    // Login form state
    pub login_password: String,
    pub login_error: Option<String>,

    // Create form state
    pub slug_input: String,
    pub url_input: String,

    // Latest snapshot from the API, in server order
    pub links: Vec<Link>,
    pub selection: usize,

    pub edit: Option<EditContext>,
    pub pending_delete: Option<String>,

    pub notice: Option<Notice>,
    pub status_message: Option<String>,
    pub copy_feedback: Option<CopyFeedback>,

    /// A login or mutation is in flight
    pub busy: bool,
    /// A list fetch is in flight
    pub loading: bool,

    generation: u64,
    expiry_timer: Option<ExpiryTimer>,

    // Background task channel
    task_rx: mpsc::Receiver<TaskMessage>,
    task_tx: mpsc::Sender<TaskMessage>,
}

impl App {
    /// Create the controller and restore any stored session.
    ///
    /// A restored token puts the app straight into the dashboard; it is not
    /// checked against the server until `start` issues the first list fetch.
    pub fn new(config: Config, store: Box<dyn TokenStore>) -> Result<Self> {
        let mut session = Session::new(store);
        match session.load() {
            Ok(found) => debug!(found, "Session restore"),
            Err(e) => warn!(error = %e, "Failed to load stored session"),
        }

        let mut api = ApiClient::from_config(&config)?;
        let state = match session.token() {
            Some(token) => {
                api.set_token(token);
                AppState::Normal
            }
            None => AppState::LoggingIn,
        };

        let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);

        Ok(Self {
            config,
            session,
            api,

            state,
            focus: Focus::Slug,

            login_password: String::new(),
            login_error: None,

            slug_input: String::new(),
            url_input: String::new(),

            links: Vec::new(),
            selection: 0,

            edit: None,
            pending_delete: None,

            notice: None,
            status_message: None,
            copy_feedback: None,

            busy: false,
            loading: false,

            generation: 0,
            expiry_timer: None,

            task_rx: rx,
            task_tx: tx,
        })
    }

    /// Arm the expiry for a restored session and load the dashboard.
    pub fn start(&mut self) {
        if self.is_authenticated() {
            self.schedule_expiry();
        }
        if self.is_authenticated() {
            self.load_links();
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.session.token().is_some() && self.state != AppState::LoggingIn
    }

    pub fn short_url(&self, slug: &str) -> String {
        short_url(&self.config.short_domain, slug)
    }

    pub fn selected_link(&self) -> Option<&Link> {
        self.links.get(self.selection)
    }

    fn spawn_task<F>(&self, task: F)
    where
        F: Future<Output = TaskResult> + Send + 'static,
    {
        let tx = self.task_tx.clone();
        let generation = self.generation;
        tokio::spawn(async move {
            let result = task.await;
            Self::send_result(&tx, TaskMessage { generation, result }).await;
        });
    }

    /// Helper to send task results, logging any channel errors
    async fn send_result(tx: &mpsc::Sender<TaskMessage>, message: TaskMessage) {
        if let Err(e) = tx.send(message).await {
            error!(error = %e, "Failed to send task result - channel closed");
        }
    }

    // =========================================================================
    // Authentication
    // =========================================================================

    /// Send the login form's password to the API.
    pub fn attempt_login(&mut self) {
        if self.login_password.is_empty() {
            return;
        }
        if self.busy {
            self.status_message = Some("Request in progress...".to_string());
            return;
        }

        self.login_error = None;
        self.busy = true;
        self.status_message = Some("Logging in...".to_string());

        let mut api = self.api.clone();
        api.clear_token();
        let password = self.login_password.clone();
        self.spawn_task(async move { TaskResult::LoggedIn(api.login(&password).await) });
    }

    fn finish_login(&mut self, result: Result<String, ApiError>) {
        self.busy = false;
        self.status_message = None;

        match result {
            Ok(token) => {
                if let Err(e) = self.session.start(token) {
                    warn!(error = %e, "Failed to persist session");
                }
                if let Some(token) = self.session.token() {
                    self.api.set_token(token);
                }
                self.generation += 1;
                self.login_password.clear();
                self.login_error = None;
                self.state = AppState::Normal;
                self.focus = Focus::Slug;
                info!("Login successful");

                self.schedule_expiry();
                if self.is_authenticated() {
                    self.load_links();
                }
            }
            Err(e @ (ApiError::Unauthorized(_) | ApiError::Rejected { .. })) => {
                warn!(error = %e, "Login rejected");
                self.login_error = Some(e.user_message("Incorrect password"));
            }
            Err(e) => {
                error!(error = %e, "Login failed");
                self.notice = Some(Notice::error("Login failed, please try again."));
            }
        }
    }

    /// Drop the session and return to the login view. Idempotent.
    pub fn logout(&mut self) {
        if let Err(e) = self.session.clear() {
            warn!(error = %e, "Failed to clear stored session");
        }
        if let Some(timer) = self.expiry_timer.take() {
            timer.cancel();
        }
        self.api.clear_token();
        self.generation += 1;

        self.links.clear();
        self.selection = 0;
        self.edit = None;
        self.pending_delete = None;
        self.copy_feedback = None;
        self.busy = false;
        self.loading = false;

        self.login_password.clear();
        self.state = AppState::LoggingIn;
        info!("Logged out");
    }

    /// Arm (or re-arm) the expiry timer for the current session.
    ///
    /// Already-expired sessions are logged out at once. Sessions whose token
    /// has no readable expiry get no timer.
    pub fn schedule_expiry(&mut self) {
        let plan = ExpiryPlan::for_expiry(self.session.expires_at(), Utc::now());
        debug!(?plan, "Scheduling session expiry");

        match plan {
            ExpiryPlan::Never => {
                self.expiry_timer = None;
            }
            ExpiryPlan::Immediate => {
                info!("Stored session already expired");
                self.logout();
            }
            ExpiryPlan::After(delay) => {
                let tx = self.task_tx.clone();
                let generation = self.generation;
                self.expiry_timer = Some(ExpiryTimer::arm(delay, async move {
                    Self::send_result(
                        &tx,
                        TaskMessage { generation, result: TaskResult::SessionExpired },
                    )
                    .await;
                }));
            }
        }
    }

    /// 401/403 from any call: log out without retrying.
    fn handle_auth_failure(&mut self, error: &ApiError) {
        warn!(error = %error, "Authorization failure, logging out");
        self.logout();
        self.login_error = Some(SESSION_EXPIRED_MESSAGE.to_string());
    }

    // =========================================================================
    // Link list
    // =========================================================================

    /// Fetch the full link list in the background.
    pub fn load_links(&mut self) {
        if !self.api.has_token() {
            return;
        }
        self.loading = true;
        let api = self.api.clone();
        self.spawn_task(async move { TaskResult::LinksLoaded(api.list_links().await) });
    }

    /// Replace the rendered list with a fresh snapshot, or report why not.
    fn apply_links(&mut self, result: Result<Vec<Link>, ApiError>) {
        self.loading = false;
        match result {
            Ok(links) => {
                debug!(count = links.len(), "Link list replaced");
                self.links = links;
                self.selection = self.selection.min(self.links.len().saturating_sub(1));
                self.status_message = None;
            }
            Err(e) if e.is_auth_failure() => self.handle_auth_failure(&e),
            Err(e) => {
                error!(error = %e, "Failed to load links");
                self.status_message = Some("Failed to load links".to_string());
            }
        }
    }

    pub fn select_next(&mut self) {
        self.selection = (self.selection + 1).min(self.links.len().saturating_sub(1));
    }

    pub fn select_prev(&mut self) {
        self.selection = self.selection.saturating_sub(1);
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    fn dispatch_mutation(&mut self, mutation: Mutation) {
        self.busy = true;
        self.status_message = Some("Saving...".to_string());

        let api = self.api.clone();
        self.spawn_task(async move {
            let outcome = match mutation.apply(&api).await {
                Ok(()) => MutationOutcome::Done { reload: api.list_links().await },
                Err(e) => MutationOutcome::Failed(e),
            };
            TaskResult::Mutated(mutation, outcome)
        });
    }

    /// Returns false (and says so) if another submission is in flight.
    fn ready_to_submit(&mut self) -> bool {
        if self.busy {
            self.status_message = Some("Request in progress...".to_string());
            return false;
        }
        true
    }

    /// Create a link from the dashboard form.
    pub fn submit_create(&mut self) {
        if !self.ready_to_submit() {
            return;
        }
        let (slug, url) = match validate_new_link(&self.slug_input, &self.url_input) {
            Ok((slug, url)) => (slug.to_string(), url.to_string()),
            Err(e) => {
                self.notice = Some(Notice::error(e.to_string()));
                return;
            }
        };
        self.dispatch_mutation(Mutation::Create { slug, url });
    }

    /// Open the edit modal for the selected link, pre-filled with its URL.
    pub fn open_edit(&mut self) {
        if let Some(link) = self.selected_link() {
            self.edit = Some(EditContext {
                slug: link.slug.clone(),
                url_input: link.url.clone(),
            });
            self.state = AppState::EditingLink;
        }
    }

    pub fn close_edit(&mut self) {
        self.edit = None;
        if self.state == AppState::EditingLink {
            self.state = AppState::Normal;
        }
    }

    /// Save the edit modal's URL for the slug captured when it opened.
    pub fn save_edit(&mut self) {
        if self.edit.is_none() || !self.ready_to_submit() {
            return;
        }
        let Some(edit) = self.edit.as_ref() else {
            return;
        };
        let url = match validate_url_update(&edit.url_input) {
            Ok(url) => url.to_string(),
            Err(e) => {
                self.notice = Some(Notice::error(e.to_string()));
                return;
            }
        };
        let slug = edit.slug.clone();
        self.dispatch_mutation(Mutation::Update { slug, url });
    }

    /// Ask for confirmation before deleting the selected link.
    pub fn request_delete(&mut self) {
        if let Some(link) = self.selected_link() {
            self.pending_delete = Some(link.slug.clone());
            self.state = AppState::ConfirmingDelete;
        }
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
        if self.state == AppState::ConfirmingDelete {
            self.state = AppState::Normal;
        }
    }

    pub fn confirm_delete(&mut self) {
        if !self.ready_to_submit() {
            return;
        }
        if let Some(slug) = self.pending_delete.take() {
            self.state = AppState::Normal;
            self.dispatch_mutation(Mutation::Delete { slug });
        }
    }

    fn finish_mutation(&mut self, mutation: Mutation, outcome: MutationOutcome) {
        self.busy = false;
        self.status_message = None;

        let reload = match outcome {
            MutationOutcome::Failed(e) if e.is_auth_failure() => {
                self.handle_auth_failure(&e);
                return;
            }
            MutationOutcome::Failed(e @ ApiError::Rejected { .. }) => {
                warn!(error = %e, ?mutation, "Mutation rejected");
                self.notice = Some(Notice::error(e.user_message(mutation.fallback_message())));
                return;
            }
            MutationOutcome::Failed(e) => {
                error!(error = %e, ?mutation, "Mutation failed");
                self.notice = Some(Notice::error(mutation.unexpected_message()));
                return;
            }
            MutationOutcome::Done { reload } => reload,
        };

        info!(?mutation, "Mutation applied");
        let notice = match &mutation {
            Mutation::Create { slug, .. } => {
                self.slug_input.clear();
                self.url_input.clear();
                Notice::success(format!("Link created\n{}", self.short_url(slug)))
            }
            Mutation::Update { slug, .. } => {
                // The modal may have been reopened on another link meanwhile
                if self.edit.as_ref().map(|e| &e.slug) == Some(slug) {
                    self.close_edit();
                }
                Notice::success("Link updated")
            }
            Mutation::Delete { .. } => Notice::success("Link deleted"),
        };

        self.apply_links(reload);
        if self.is_authenticated() {
            self.notice = Some(notice);
        }
    }

    // =========================================================================
    // Row actions
    // =========================================================================

    /// Copy the selected link's short URL to the clipboard.
    pub fn copy_selected(&mut self) {
        let Some(slug) = self.selected_link().map(|l| l.slug.clone()) else {
            return;
        };
        let url = self.short_url(&slug);
        match actions::copy_to_clipboard(&url) {
            Ok(()) => {
                self.mark_copied(slug, Instant::now());
                self.status_message = Some(format!("Copied: {}", url));
            }
            Err(e) => {
                warn!(error = %e, "Clipboard copy failed");
                self.notice = Some(Notice::error("Failed to copy link."));
            }
        }
    }

    pub fn mark_copied(&mut self, slug: String, now: Instant) {
        self.copy_feedback = Some(CopyFeedback {
            slug,
            until: now + COPY_FEEDBACK_DURATION,
        });
    }

    /// True while the copy indicator for `slug` should show a check mark.
    pub fn copy_feedback_active(&self, slug: &str, now: Instant) -> bool {
        self.copy_feedback
            .as_ref()
            .is_some_and(|f| f.slug == slug && now < f.until)
    }

    /// Clear the copy indicator once its time is up.
    pub fn expire_copy_feedback(&mut self, now: Instant) {
        if self.copy_feedback.as_ref().is_some_and(|f| now >= f.until) {
            self.copy_feedback = None;
        }
    }

    /// Open the selected link's short URL in the system browser.
    pub fn open_selected(&mut self) {
        let Some(slug) = self.selected_link().map(|l| l.slug.clone()) else {
            return;
        };
        let url = self.short_url(&slug);
        if let Err(e) = actions::open_in_browser(&url) {
            warn!(error = %e, "Failed to open browser");
            self.notice = Some(Notice::error(format!("Could not open a browser.\n{}", url)));
        }
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    // =========================================================================
    // Background results
    // =========================================================================

    /// Check for completed background tasks and process results
    pub fn check_background_tasks(&mut self) {
        while let Ok(message) = self.task_rx.try_recv() {
            self.process_task_message(message);
        }
        self.expire_copy_feedback(Instant::now());
    }

    fn process_task_message(&mut self, message: TaskMessage) {
        if message.generation != self.generation {
            debug!(
                generation = message.generation,
                current = self.generation,
                "Dropping result from a previous session"
            );
            return;
        }

        match message.result {
            TaskResult::LoggedIn(result) => self.finish_login(result),
            TaskResult::LinksLoaded(result) => self.apply_links(result),
            TaskResult::Mutated(mutation, outcome) => self.finish_mutation(mutation, outcome),
            TaskResult::SessionExpired => {
                info!("Session expired");
                self.logout();
                self.notice = Some(Notice::info(SESSION_EXPIRED_MESSAGE));
            }
        }
    }

    /// Wait for the next background result and process it.
    #[cfg(test)]
    pub async fn wait_for_task(&mut self) {
        let message = tokio::time::timeout(Duration::from_secs(10), self.task_rx.recv())
            .await
            .expect("timed out waiting for background task")
            .expect("task channel closed");
        self.process_task_message(message);
    }
}

// ============================================================================
// Input validation helpers (exported for use in input.rs)
// ============================================================================

/// Check if a character is valid for input (no control characters)
fn is_valid_input_char(c: char) -> bool {
    !c.is_control()
}

pub fn can_add_password_char(current_len: usize, c: char) -> bool {
    current_len < MAX_PASSWORD_LENGTH && is_valid_input_char(c)
}

pub fn can_add_slug_char(current_len: usize, c: char) -> bool {
    current_len < MAX_SLUG_LENGTH && is_valid_input_char(c)
}

pub fn can_add_url_char(current_len: usize, c: char) -> bool {
    current_len < MAX_URL_LENGTH && is_valid_input_char(c)
}

// ============================================================================
// Tests
// ============================================================================
