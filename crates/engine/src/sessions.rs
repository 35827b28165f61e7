// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process session registry.
//!
//! The registry owns every session; devices hold at most a token value.
//! One mutex guards the whole map; operations are O(1) lookups and the
//! registry is never held across a suspension point.

use crate::error::ControlError;
use devlab_core::{Clock, DeviceId, SessionRecord, SessionToken, TokenGen};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// Process-wide session store.
pub struct SessionRegistry<C: Clock, G: TokenGen> {
    inner: Arc<Mutex<HashMap<SessionToken, SessionRecord>>>,
    clock: C,
    tokens: G,
    default_ttl_ms: u64,
}

impl<C: Clock, G: TokenGen> Clone for SessionRegistry<C, G> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            clock: self.clock.clone(),
            tokens: self.tokens.clone(),
            default_ttl_ms: self.default_ttl_ms,
        }
    }
}

impl<C: Clock, G: TokenGen> SessionRegistry<C, G> {
    pub fn new(clock: C, tokens: G, default_ttl_ms: u64) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HashMap::new())),
            clock,
            tokens,
            default_ttl_ms,
        }
    }

    /// Open a session for a device.
    ///
    /// Fails with [`ControlError::SessionAlreadyActive`] while a live
    /// session exists for the same device; an expired leftover is swept
    /// instead of blocking the new session.
    pub fn create(&self, device_id: &DeviceId) -> Result<SessionToken, ControlError> {
        let now = self.clock.epoch_ms();
        let mut inner = self.inner.lock();

        if let Some(existing) = inner
            .values()
            .find(|s| s.device_id == *device_id)
            .map(|s| (s.token.clone(), s.is_expired(now)))
        {
            let (token, expired) = existing;
            if expired {
                tracing::debug!(device = %device_id.short(12), "sweeping expired session");
                inner.remove(&token);
            } else {
                return Err(ControlError::SessionAlreadyActive);
            }
        }

        let token = self.tokens.mint();
        inner.insert(
            token.clone(),
            SessionRecord::new(token.clone(), device_id.clone(), now, self.default_ttl_ms),
        );
        Ok(token)
    }

    /// True iff the token is registered and fresh.
    ///
    /// A successful validation refreshes the TTL window; a failed one
    /// destroys the session. Stale sessions are never silently renewed.
    pub fn validate(&self, token: &SessionToken) -> bool {
        let now = self.clock.epoch_ms();
        let mut inner = self.inner.lock();
        match inner.get_mut(token) {
            Some(session) if !session.is_expired(now) => {
                session.touch(now);
                true
            }
            Some(_) => {
                inner.remove(token);
                false
            }
            None => false,
        }
    }

    /// Token string equality plus [`validate`].
    ///
    /// [`validate`]: SessionRegistry::validate
    pub fn compare_and_validate(
        &self,
        expected: Option<&SessionToken>,
        provided: &SessionToken,
    ) -> bool {
        expected == Some(provided) && self.validate(provided)
    }

    /// Remove a session. Idempotent.
    pub fn destroy(&self, token: &SessionToken) {
        self.inner.lock().remove(token);
    }

    /// Token of the live session bound to a device, if any.
    pub fn session_for_device(&self, device_id: &DeviceId) -> Option<SessionToken> {
        let now = self.clock.epoch_ms();
        self.inner
            .lock()
            .values()
            .find(|s| s.device_id == *device_id && !s.is_expired(now))
            .map(|s| s.token.clone())
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }
}

#[cfg(test)]
#[path = "sessions_tests.rs"]
mod tests;
