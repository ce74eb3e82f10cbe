//! Per-device link state machine
//!
//! ```text
//! Disconnected ──attach──▶ Connected ──begin_auto_read──▶ AutoReading
//!      ▲                      ▲  │                            │
//!      │                      │  └──────────detach───────────┐│
//!      │                      └──────end_auto_read───────────┘│
//!      └──────────────────────────detach──────────────────────┘
//! ```
//!
//! `C` is whatever the device needs to keep while connected (an open
//! reader for serial devices, nothing for the simulator).

use super::error::{ChronoError, ChronoResult};
use std::sync::{Mutex, MutexGuard, PoisonError};
use tokio_util::sync::CancellationToken;

enum LinkState<C> {
    Disconnected,
    Connected(C),
    AutoReading(C, CancellationToken),
}

pub(crate) struct Link<C> {
    state: Mutex<LinkState<C>>,
}

impl<C: Clone> Link<C> {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(LinkState::Disconnected),
        }
    }

    // Every transition leaves a complete state behind, so a poisoned lock
    // still guards consistent data
    fn lock(&self) -> MutexGuard<'_, LinkState<C>> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Store a fresh connection; fails if one is already held
    pub(crate) fn attach(&self, conn: C) -> ChronoResult<()> {
        let mut state = self.lock();
        if !matches!(*state, LinkState::Disconnected) {
            return Err(ChronoError::AlreadyConnected);
        }
        *state = LinkState::Connected(conn);
        Ok(())
    }

    /// Store a connection unless one is already held
    pub(crate) fn attach_if_detached(&self, conn: C) {
        let mut state = self.lock();
        if matches!(*state, LinkState::Disconnected) {
            *state = LinkState::Connected(conn);
        }
    }

    /// Cancel any auto-read loop and drop to `Disconnected`
    pub(crate) fn detach(&self) -> Option<C> {
        let mut state = self.lock();
        match std::mem::replace(&mut *state, LinkState::Disconnected) {
            LinkState::Disconnected => None,
            LinkState::Connected(conn) => Some(conn),
            LinkState::AutoReading(conn, token) => {
                token.cancel();
                Some(conn)
            }
        }
    }

    pub(crate) fn connection(&self) -> Option<C> {
        match &*self.lock() {
            LinkState::Disconnected => None,
            LinkState::Connected(conn) | LinkState::AutoReading(conn, _) => Some(conn.clone()),
        }
    }

    pub(crate) fn is_connected(&self) -> bool {
        !matches!(*self.lock(), LinkState::Disconnected)
    }

    /// A loop whose token was cancelled from inside (consumer gone) no
    /// longer counts as running
    pub(crate) fn is_auto_reading(&self) -> bool {
        match &*self.lock() {
            LinkState::AutoReading(_, token) => !token.is_cancelled(),
            _ => false,
        }
    }

    /// Claim the single auto-read slot and hand out the loop's token
    pub(crate) fn begin_auto_read(&self) -> ChronoResult<CancellationToken> {
        let mut state = self.lock();
        let conn = match &*state {
            LinkState::Disconnected => return Err(ChronoError::NotConnected),
            LinkState::AutoReading(_, token) if !token.is_cancelled() => {
                return Err(ChronoError::AlreadyRunning)
            }
            LinkState::Connected(conn) | LinkState::AutoReading(conn, _) => conn.clone(),
        };

        let token = CancellationToken::new();
        *state = LinkState::AutoReading(conn, token.clone());
        Ok(token)
    }

    /// Cancel the loop if one runs; no-op otherwise
    pub(crate) fn end_auto_read(&self) {
        let mut state = self.lock();
        *state = match std::mem::replace(&mut *state, LinkState::Disconnected) {
            LinkState::AutoReading(conn, token) => {
                token.cancel();
                LinkState::Connected(conn)
            }
            other => other,
        };
    }
}
