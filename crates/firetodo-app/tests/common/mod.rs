/*
[INPUT]:  Test configuration and in-memory service fakes
[OUTPUT]: Session harness, fixtures, and wait helpers
[POS]:    Test infrastructure - shared across all test modules
[UPDATE]: When adding new test patterns or fixtures
*/

//! Common test utilities for firetodo-app tests

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use firetodo_adapter::{Identity, MemoryDocumentStore, MockAuthProvider, SignInMethod};
use firetodo_app::{Notification, SessionOptions, SessionSnapshot, TodoSession, notify};
use serde_json::{Map, Value, json};
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::time::{Instant, sleep, timeout};

pub const WAIT: Duration = Duration::from_secs(2);

pub struct Harness {
    pub session: TodoSession,
    pub auth: Arc<MockAuthProvider>,
    pub store: Arc<MemoryDocumentStore>,
    pub notifications: UnboundedReceiver<Notification>,
}

impl Harness {
    pub fn new(auth: MockAuthProvider) -> Self {
        Self::with_options(auth, SessionOptions::default())
    }

    pub fn with_options(auth: MockAuthProvider, options: SessionOptions) -> Self {
        let auth = Arc::new(auth);
        let store = Arc::new(MemoryDocumentStore::new());
        let (notifier, notifications) = notify::channel();
        let session = TodoSession::new(auth.clone(), store.clone(), notifier, options);
        Self {
            session,
            auth,
            store,
            notifications,
        }
    }

    /// Messages received so far, in order
    pub fn messages(&mut self) -> Vec<String> {
        let mut messages = Vec::new();
        while let Ok(notification) = self.notifications.try_recv() {
            messages.push(notification.message);
        }
        messages
    }

    /// Wait until the published snapshot satisfies `predicate`
    pub async fn wait_until(&self, predicate: impl Fn(&SessionSnapshot) -> bool) -> SessionSnapshot {
        let mut rx = self.session.subscribe();
        let snapshot = timeout(WAIT, rx.wait_for(|snapshot| predicate(snapshot)))
            .await
            .expect("timed out waiting for session state")
            .expect("session state channel closed")
            .clone();
        snapshot
    }

    /// Wait until the store has answered `count` queries and the results
    /// have been applied
    pub async fn wait_for_queries(&self, count: usize) {
        let deadline = Instant::now() + WAIT;
        while self.store.query_count() < count {
            assert!(
                Instant::now() < deadline,
                "timed out waiting for {count} queries, saw {}",
                self.store.query_count()
            );
            sleep(Duration::from_millis(5)).await;
        }
        sleep(Duration::from_millis(20)).await;
    }
}

pub fn identity(uid: &str, email: &str) -> Identity {
    Identity {
        uid: uid.to_string(),
        email: Some(email.to_string()),
        display_name: None,
        sign_in_method: SignInMethod::Password,
    }
}

pub fn alice() -> Identity {
    identity("uid-alice", "alice@example.com")
}

pub fn bob() -> Identity {
    identity("uid-bob", "bob@example.com")
}

pub fn task_fields(title: &str, user_id: &str, completed: bool) -> Map<String, Value> {
    json!({
        "title": title,
        "dueDate": "2024-01-01",
        "completed": completed,
        "priority": 1,
        "userId": user_id,
    })
    .as_object()
    .cloned()
    .expect("object literal")
}
