/*
[INPUT]:  AuthProvider (auth-state notifications), DocumentStore, Notifier
[OUTPUT]: Session state (identity, loading flag, tasks) on a watch channel
[POS]:    Sync layer - mediates between the view and the remote services
[UPDATE]: When changing auth handling, fetch semantics or mutation flow
*/

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use firetodo_adapter::{
    AuthProvider, AuthState, DocumentStore, FirebaseError, GoogleCredential, Identity,
};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::auth_messages::message_for_code;
use crate::notify::Notifier;
use crate::task::{NewTask, OWNER_FIELD, Task, TaskPatch};

const FETCH_ERROR: &str = "An error occurred while fetching tasks. Please try again.";
const CREATE_ERROR: &str = "An error occurred while creating the task. Please try again.";
const UPDATE_ERROR: &str = "An error occurred while updating the task. Please try again.";
const DELETE_ERROR: &str = "An error occurred while deleting the task. Please try again.";
const GOOGLE_ERROR: &str = "An error occurred during Google sign-in. Please try again.";
const SIGN_OUT_ERROR: &str = "An error occurred while signing out. Please try again.";

/// Error returned by session operations
///
/// User-facing notifications are emitted before the error is returned.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("no user is signed in")]
    NotSignedIn,

    #[error("task title is empty")]
    EmptyTitle,

    #[error("task update has no fields")]
    EmptyPatch,

    #[error("{message} ({code})")]
    Auth { code: String, message: String },

    #[error(transparent)]
    Remote(#[from] FirebaseError),
}

#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Collection holding task documents
    pub collection: String,
    /// Apply the identity returned by a sign-in call before the
    /// auth-state notification arrives
    pub identity_hint: bool,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            collection: "tasks".to_string(),
            identity_hint: true,
        }
    }
}

/// State the view renders from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub identity: Option<Identity>,
    /// True until the first auth-state notification has been handled
    pub loading: bool,
    pub tasks: Vec<Task>,
}

impl Default for SessionSnapshot {
    fn default() -> Self {
        Self {
            identity: None,
            loading: true,
            tasks: Vec::new(),
        }
    }
}

struct Inner {
    auth: Arc<dyn AuthProvider>,
    store: Arc<dyn DocumentStore>,
    notifier: Notifier,
    state: watch::Sender<SessionSnapshot>,
    options: SessionOptions,
}

/// Todo session: current identity, its tasks, and the operations on them
///
/// Create one per front end, call `init` once, and `shutdown` on exit.
pub struct TodoSession {
    inner: Arc<Inner>,
    shutdown: CancellationToken,
    listener: Mutex<Option<JoinHandle<()>>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl TodoSession {
    pub fn new(
        auth: Arc<dyn AuthProvider>,
        store: Arc<dyn DocumentStore>,
        notifier: Notifier,
        options: SessionOptions,
    ) -> Self {
        let (state, _rx) = watch::channel(SessionSnapshot::default());
        Self {
            inner: Arc::new(Inner {
                auth,
                store,
                notifier,
                state,
                options,
            }),
            shutdown: CancellationToken::new(),
            listener: Mutex::new(None),
        }
    }

    /// Start listening for auth-state notifications
    ///
    /// Returns once the first notification has been handled, i.e. when
    /// `loading` is false. Calling it again only waits.
    pub async fn init(&self) {
        {
            let mut listener = lock(&self.listener);
            if listener.is_none() && !self.shutdown.is_cancelled() {
                let inner = self.inner.clone();
                let shutdown = self.shutdown.clone();
                *listener = Some(tokio::spawn(run_listener(inner, shutdown)));
            }
        }

        let mut rx = self.inner.state.subscribe();
        tokio::select! {
            _ = rx.wait_for(|snapshot| !snapshot.loading) => {}
            _ = self.shutdown.cancelled() => {}
        }
    }

    /// Stop the auth-state listener and wait for it to exit
    pub async fn shutdown(&self) {
        self.shutdown.cancel();
        let handle = lock(&self.listener).take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                warn!(error = %err, "auth listener ended abnormally");
            }
        }
        debug!("session shut down");
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.inner.state.subscribe()
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        self.inner.state.borrow().clone()
    }

    /// Replace the task collection with the current user's stored tasks
    pub async fn fetch_tasks(&self) -> Result<(), SessionError> {
        self.inner.fetch_tasks().await
    }

    pub async fn create_task(&self, task: NewTask) -> Result<(), SessionError> {
        if task.title.trim().is_empty() {
            return Err(SessionError::EmptyTitle);
        }
        let identity = self.inner.require_identity("create")?;

        let fields = task.into_fields(&identity.uid);
        match self
            .inner
            .store
            .add_document(&self.inner.options.collection, fields)
            .await
        {
            Ok(id) => {
                info!(task_id = %id, uid = %identity.uid, "task created");
                self.inner.refresh().await;
                self.inner.notifier.success("Task created");
                Ok(())
            }
            Err(err) => {
                error!(error = %err, "failed to create task");
                self.inner.notifier.error(CREATE_ERROR);
                Err(err.into())
            }
        }
    }

    /// Write the present fields of `patch` to task `id`
    ///
    /// An empty patch is rejected before any remote call.
    pub async fn update_task(&self, id: &str, patch: TaskPatch) -> Result<(), SessionError> {
        if patch.is_empty() {
            return Err(SessionError::EmptyPatch);
        }
        self.inner.require_identity("update")?;

        match self
            .inner
            .store
            .update_document(&self.inner.options.collection, id, patch.into_fields())
            .await
        {
            Ok(()) => {
                info!(task_id = %id, "task updated");
                self.inner.refresh().await;
                self.inner.notifier.success("Task updated");
                Ok(())
            }
            Err(err) => {
                error!(task_id = %id, error = %err, "failed to update task");
                self.inner.notifier.error(UPDATE_ERROR);
                Err(err.into())
            }
        }
    }

    pub async fn delete_task(&self, id: &str) -> Result<(), SessionError> {
        self.inner.require_identity("delete")?;

        match self
            .inner
            .store
            .delete_document(&self.inner.options.collection, id)
            .await
        {
            Ok(()) => {
                info!(task_id = %id, "task deleted");
                self.inner.refresh().await;
                self.inner.notifier.success("Task deleted");
                Ok(())
            }
            Err(err) => {
                error!(task_id = %id, error = %err, "failed to delete task");
                self.inner.notifier.error(DELETE_ERROR);
                Err(err.into())
            }
        }
    }

    /// Flip the completion flag of `task`
    pub async fn toggle_task(&self, task: &Task) -> Result<(), SessionError> {
        self.update_task(&task.id, TaskPatch::completed(!task.completed))
            .await
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, SessionError> {
        match self.inner.auth.sign_up(email, password).await {
            Ok(identity) => {
                info!(uid = %identity.uid, "signed up");
                self.inner.apply_hint(&identity);
                self.inner.notifier.success("Successfully signed up");
                Ok(identity)
            }
            Err(err) => Err(self.inner.auth_failure("sign-up", err, None)),
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Identity, SessionError> {
        match self.inner.auth.sign_in(email, password).await {
            Ok(identity) => {
                info!(uid = %identity.uid, "signed in");
                self.inner.apply_hint(&identity);
                self.inner.notifier.success("Successfully signed in");
                Ok(identity)
            }
            Err(err) => Err(self.inner.auth_failure("sign-in", err, None)),
        }
    }

    pub async fn sign_in_with_google(
        &self,
        credential: &GoogleCredential,
    ) -> Result<Identity, SessionError> {
        match self.inner.auth.sign_in_with_google(credential).await {
            Ok(identity) => {
                info!(uid = %identity.uid, "signed in with google");
                self.inner.apply_hint(&identity);
                self.inner.notifier.success("Signed in with Google");
                Ok(identity)
            }
            Err(err) => Err(self.inner.auth_failure("google sign-in", err, Some(GOOGLE_ERROR))),
        }
    }

    /// Request sign-out; identity and tasks are cleared by the resulting
    /// auth-state notification
    pub async fn sign_out(&self) -> Result<(), SessionError> {
        match self.inner.auth.sign_out().await {
            Ok(()) => {
                info!("sign-out requested");
                Ok(())
            }
            Err(err) => {
                error!(error = %err, "sign-out failed");
                self.inner.notifier.error(SIGN_OUT_ERROR);
                Err(err.into())
            }
        }
    }
}

impl Drop for TodoSession {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

async fn run_listener(inner: Arc<Inner>, shutdown: CancellationToken) {
    let mut auth_rx = inner.auth.subscribe();

    tokio::select! {
        result = inner.auth.initialize() => {
            if let Err(err) = result {
                warn!(error = %err, "auth initialization failed");
            }
        }
        _ = shutdown.cancelled() => return,
    }

    loop {
        let state = auth_rx.borrow_and_update().clone();
        inner.apply_auth_state(state).await;

        tokio::select! {
            _ = shutdown.cancelled() => break,
            changed = auth_rx.changed() => {
                if changed.is_err() {
                    debug!("auth provider dropped its notification channel");
                    break;
                }
            }
        }
    }
    debug!("auth listener stopped");
}

impl Inner {
    fn current_identity(&self) -> Option<Identity> {
        self.state.borrow().identity.clone()
    }

    fn require_identity(&self, action: &str) -> Result<Identity, SessionError> {
        match self.current_identity() {
            Some(identity) => Ok(identity),
            None => {
                warn!(action, "task mutation without a signed-in user");
                self.notifier
                    .error(format!("You must be logged in to {action} a task"));
                Err(SessionError::NotSignedIn)
            }
        }
    }

    async fn apply_auth_state(&self, state: AuthState) {
        match state {
            AuthState::Initializing => {}
            AuthState::SignedIn(identity) => {
                info!(uid = %identity.uid, "auth state: signed in");
                self.set_identity(identity);
                self.refresh().await;
                self.state.send_if_modified(|snapshot| {
                    std::mem::replace(&mut snapshot.loading, false)
                });
            }
            AuthState::SignedOut => {
                info!("auth state: signed out");
                self.state.send_if_modified(|snapshot| {
                    let changed =
                        snapshot.loading || snapshot.identity.is_some() || !snapshot.tasks.is_empty();
                    snapshot.identity = None;
                    snapshot.tasks.clear();
                    snapshot.loading = false;
                    changed
                });
            }
        }
    }

    /// Set the identity, discarding tasks that belong to another user
    fn set_identity(&self, identity: Identity) {
        self.state.send_if_modified(|snapshot| {
            if snapshot.identity.as_ref() == Some(&identity) {
                return false;
            }
            let same_user = snapshot
                .identity
                .as_ref()
                .is_some_and(|current| current.uid == identity.uid);
            if !same_user {
                snapshot.tasks.clear();
            }
            snapshot.identity = Some(identity);
            true
        });
    }

    fn apply_hint(&self, identity: &Identity) {
        if self.options.identity_hint {
            self.set_identity(identity.clone());
        }
    }

    fn auth_failure(
        &self,
        action: &str,
        err: FirebaseError,
        fixed_message: Option<&str>,
    ) -> SessionError {
        let code = match &err {
            FirebaseError::Auth { code, .. } => code.clone(),
            FirebaseError::Http(_) => "auth/network-request-failed".to_string(),
            FirebaseError::Api { code, .. } if *code >= 500 => {
                "auth/network-request-failed".to_string()
            }
            _ => "auth/internal-error".to_string(),
        };
        error!(action, code = %code, error = %err, "auth request failed");

        let message = fixed_message
            .map(str::to_string)
            .unwrap_or_else(|| message_for_code(&code));
        self.notifier.error(message.clone());
        SessionError::Auth { code, message }
    }

    /// Fetch after a write; failures are already logged and notified
    async fn refresh(&self) {
        let _ = self.fetch_tasks().await;
    }

    async fn fetch_tasks(&self) -> Result<(), SessionError> {
        let Some(identity) = self.current_identity() else {
            debug!("fetch without a signed-in user, clearing tasks");
            self.state.send_if_modified(|snapshot| {
                let changed = !snapshot.tasks.is_empty();
                snapshot.tasks.clear();
                changed
            });
            return Ok(());
        };

        let owner = Value::String(identity.uid.clone());
        let documents = match self
            .store
            .query_equal(&self.options.collection, OWNER_FIELD, &owner)
            .await
        {
            Ok(documents) => documents,
            Err(err) => {
                error!(uid = %identity.uid, error = %err, "failed to fetch tasks");
                self.notifier.error(FETCH_ERROR);
                return Err(err.into());
            }
        };

        let tasks: Vec<Task> = documents
            .into_iter()
            .filter_map(|document| {
                let id = document.id.clone();
                match Task::from_document(document) {
                    Ok(task) => Some(task),
                    Err(err) => {
                        warn!(task_id = %id, error = %err, "skipping malformed task");
                        None
                    }
                }
            })
            .collect();

        let count = tasks.len();
        let changed = self.state.send_if_modified(|snapshot| {
            let still_current = snapshot
                .identity
                .as_ref()
                .is_some_and(|current| current.uid == identity.uid);
            if !still_current || snapshot.tasks == tasks {
                return false;
            }
            snapshot.tasks = tasks;
            true
        });
        debug!(uid = %identity.uid, count, changed, "tasks fetched");
        Ok(())
    }
}
