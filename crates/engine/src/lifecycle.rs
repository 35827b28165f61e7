// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-device lifecycle orchestration.
//!
//! Every mutating operation runs the guarded template: validate the
//! caller's session, assert the file lock, check the state machine, then
//! delegate to the driver. State commits happen only on success; a failed
//! operation leaves the record as it found it.

use crate::error::ControlError;
use crate::lockfile::DeviceLock;
use crate::sessions::SessionRegistry;
use crate::table::DeviceCell;
use devlab_core::{
    Clock, DeviceEvent, DeviceId, DeviceOs, DeviceRecord, DeviceState, InstrumentId, Orientation,
    SessionToken, StateEvent, TokenGen,
};
use devlab_adapters::ProcessSignal;
use parking_lot::Mutex;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;

/// Boot polling and settle parameters.
#[derive(Debug, Clone, Copy)]
pub struct BootOptions {
    /// Probe budget; the final probe's answer governs the outcome.
    pub attempts: u32,
    pub poll_interval: Duration,
    /// Observed after the device reports booted, before resolving.
    pub settle_delay: Duration,
}

impl BootOptions {
    pub fn for_os(os: DeviceOs) -> Self {
        match os {
            DeviceOs::Ios => Self {
                attempts: 10,
                poll_interval: Duration::from_secs(1),
                settle_delay: Duration::from_secs(3),
            },
            DeviceOs::Android => Self {
                attempts: 180,
                poll_interval: Duration::from_secs(1),
                settle_delay: Duration::ZERO,
            },
        }
    }
}

/// Handle on one device.
///
/// Cheap to clone; clones share the same cell, so instrument handles and
/// the runtime child survive re-lookups through the registry.
pub struct Device<C: Clock, G: TokenGen> {
    cell: Arc<DeviceCell>,
    id: DeviceId,
    sessions: SessionRegistry<C, G>,
    lock: DeviceLock,
    booting: Arc<Mutex<HashSet<DeviceId>>>,
    events: broadcast::Sender<DeviceEvent>,
}

impl<C: Clock, G: TokenGen> std::fmt::Debug for Device<C, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Device").field("id", &self.id).finish()
    }
}

impl<C: Clock, G: TokenGen> Clone for Device<C, G> {
    fn clone(&self) -> Self {
        Self {
            cell: Arc::clone(&self.cell),
            id: self.id.clone(),
            sessions: self.sessions.clone(),
            lock: self.lock.clone(),
            booting: Arc::clone(&self.booting),
            events: self.events.clone(),
        }
    }
}

impl<C: Clock, G: TokenGen> Device<C, G> {
    pub(crate) fn new(
        cell: Arc<DeviceCell>,
        sessions: SessionRegistry<C, G>,
        lock: DeviceLock,
        booting: Arc<Mutex<HashSet<DeviceId>>>,
        events: broadcast::Sender<DeviceEvent>,
    ) -> Self {
        let id = cell.record.lock().id.clone();
        Self { cell, id, sessions, lock, booting, events }
    }

    pub fn id(&self) -> &DeviceId {
        &self.id
    }

    pub fn name(&self) -> String {
        self.cell.record.lock().name.clone()
    }

    /// Cloned record snapshot; never a torn read.
    pub fn snapshot(&self) -> DeviceRecord {
        self.cell.record.lock().clone()
    }

    /// Available iff no live session is bound to the device AND no live
    /// foreign process holds its lock.
    pub fn is_available(&self) -> Result<bool, ControlError> {
        let no_session = self.sessions.session_for_device(&self.id).is_none();
        let unlocked = self.lock.held_by_foreign()?.is_none();
        Ok(no_session && unlocked)
    }

    // ── Sessions ────────────────────────────────────────────────────────────

    /// Acquire the device: file lock first (inter-process), then the
    /// session (in-process).
    pub fn start_session(&self) -> Result<SessionToken, ControlError> {
        let already_held = self.lock.held_by_self()?;
        self.lock.acquire()?;
        match self.sessions.create(&self.id) {
            Ok(token) => {
                self.cell.record.lock().current_session = Some(token.clone());
                Ok(token)
            }
            Err(e) => {
                // Drop the lock only if this call took it; an active
                // session's lock stays put.
                if !already_held {
                    let _ = self.lock.release();
                }
                Err(e)
            }
        }
    }

    /// Destroy the session by its original token and release the lock.
    ///
    /// Destroying an unknown or already-destroyed token is a no-op.
    pub fn end_session(&self, token: &SessionToken) -> Result<(), ControlError> {
        let is_current = {
            let mut record = self.cell.record.lock();
            if record.current_session.as_ref() == Some(token) {
                record.current_session = None;
                true
            } else {
                false
            }
        };
        self.sessions.destroy(token);
        if is_current {
            self.lock.release()?;
        }
        Ok(())
    }

    /// Guarded-template steps 1 and 2: session validity, then lock
    /// ownership. Same-pid lock re-acquisition is a no-op, so `acquire`
    /// doubles as the "held by this process" assertion.
    fn guard(&self, token: &SessionToken) -> Result<(), ControlError> {
        let expected = self.cell.record.lock().current_session.clone();
        if !self.sessions.compare_and_validate(expected.as_ref(), token) {
            // The validate may have destroyed an expired session; drop the
            // dangling token from the record.
            if expected.is_some() && self.sessions.session_for_device(&self.id).is_none() {
                self.cell.record.lock().current_session = None;
            }
            return Err(ControlError::InvalidSession);
        }
        self.lock.acquire()?;
        Ok(())
    }

    fn require_booted(&self) -> Result<(), ControlError> {
        if self.cell.record.lock().state.is_booted() {
            Ok(())
        } else {
            Err(ControlError::DeviceNotBooted)
        }
    }

    // ── Boot / shutdown ─────────────────────────────────────────────────────

    /// Boot with per-OS defaults.
    pub async fn boot(&self, session: Option<&SessionToken>) -> Result<(), ControlError> {
        let os = self.cell.record.lock().os;
        self.boot_with(session, BootOptions::for_os(os)).await
    }

    /// Boot the device.
    ///
    /// No active session is required, but when one exists the caller must
    /// present it. Fails with [`ControlError::DeviceLocked`] when another
    /// live process holds the lock, and [`ControlError::DeviceNotReady`]
    /// when a boot for this id is already in flight.
    pub async fn boot_with(
        &self,
        session: Option<&SessionToken>,
        options: BootOptions,
    ) -> Result<(), ControlError> {
        let current = self.cell.record.lock().current_session.clone();
        if let Some(expected) = current {
            let provided = session.ok_or(ControlError::InvalidSession)?;
            if !self.sessions.compare_and_validate(Some(&expected), provided) {
                return Err(ControlError::InvalidSession);
            }
        }
        self.lock.acquire()?;

        if !self.booting.lock().insert(self.id.clone()) {
            return Err(ControlError::DeviceNotReady);
        }
        let result = self.boot_inner(options).await;
        self.booting.lock().remove(&self.id);
        result
    }

    async fn boot_inner(&self, options: BootOptions) -> Result<(), ControlError> {
        {
            let mut record = self.cell.record.lock();
            if record.state == DeviceState::Booted {
                return Err(ControlError::DeviceAlreadyBooted);
            }
            record.state = record.state.apply(StateEvent::Boot)?;
        }

        match self.cell.driver.boot(&self.id).await {
            Ok(child) => {
                if let Some(child) = child {
                    *self.cell.runtime_child.lock() = Some(child);
                }
            }
            Err(e) => {
                self.commit(StateEvent::BootFail);
                return Err(e.into());
            }
        }

        if !self.await_booted(options).await {
            self.commit(StateEvent::BootFail);
            return Err(ControlError::BootTimeout { attempts: options.attempts });
        }

        // Refresh screen metrics now that the device can answer.
        match self.cell.driver.read_metrics(&self.id).await {
            Ok(metrics) => self.cell.record.lock().apply_metrics(metrics),
            Err(e) => {
                tracing::warn!(device = %self.id.short(12), error = %e, "metrics refresh failed")
            }
        }

        self.commit(StateEvent::BootOk);

        if !options.settle_delay.is_zero() {
            tokio::time::sleep(options.settle_delay).await;
        }
        Ok(())
    }

    /// Bounded boot wait. A failed probe is transient; only the exhausted
    /// budget decides, and the final probe's answer is authoritative.
    async fn await_booted(&self, options: BootOptions) -> bool {
        for attempt in 0..options.attempts {
            match self.cell.driver.is_booted(&self.id).await {
                Ok(true) => return true,
                Ok(false) => {}
                Err(e) => {
                    tracing::debug!(device = %self.id.short(12), attempt, error = %e,
                        "boot probe failed")
                }
            }
            if attempt + 1 < options.attempts && !options.poll_interval.is_zero() {
                tokio::time::sleep(options.poll_interval).await;
            }
        }
        false
    }

    /// Stop instruments, shut the device down, release the lock.
    ///
    /// Shutting down a device stranded in `Errored` is the recovery path:
    /// the backend is stopped best-effort and the record settles to
    /// `Shutdown`.
    pub async fn shutdown(&self, token: &SessionToken) -> Result<(), ControlError> {
        self.guard(token)?;

        let prior = {
            let mut record = self.cell.record.lock();
            match record.state {
                // Already off: resolve rather than reject.
                DeviceState::Shutdown => return Ok(()),
                DeviceState::Errored => DeviceState::Errored,
                state => {
                    record.state = state.apply(StateEvent::Shutdown)?;
                    state
                }
            }
        };

        self.stop_instruments_inner().await;

        if prior == DeviceState::Errored {
            // Whatever half-state the failed boot left behind, stop it and
            // settle the record.
            if let Err(e) = self.cell.driver.shutdown(&self.id).await {
                tracing::warn!(device = %self.id.short(12), error = %e,
                    "backend shutdown during recovery failed");
            }
            if let Some(child) = self.cell.runtime_child.lock().take() {
                let _ = child.signal(ProcessSignal::Interrupt);
            }
            self.commit(StateEvent::Recover);
            self.lock.release()?;
            return Ok(());
        }

        match self.cell.driver.shutdown(&self.id).await {
            Ok(()) => {
                if let Some(child) = self.cell.runtime_child.lock().take() {
                    if let Err(e) = child.signal(ProcessSignal::Interrupt) {
                        tracing::warn!(device = %self.id.short(12), error = %e,
                            "emulator interrupt failed");
                    }
                }
                self.commit(StateEvent::ShutdownOk);
                self.lock.release()?;
                Ok(())
            }
            Err(e) => {
                self.cell.record.lock().state = prior;
                Err(e.into())
            }
        }
    }

    /// Restart in place and wait for the device to come back.
    pub async fn restart(&self, token: &SessionToken) -> Result<(), ControlError> {
        let os = self.cell.record.lock().os;
        self.restart_with(token, BootOptions::for_os(os)).await
    }

    pub async fn restart_with(
        &self,
        token: &SessionToken,
        options: BootOptions,
    ) -> Result<(), ControlError> {
        self.guard(token)?;

        if !self.booting.lock().insert(self.id.clone()) {
            return Err(ControlError::DeviceNotReady);
        }
        let result = self.restart_inner(options).await;
        self.booting.lock().remove(&self.id);
        result
    }

    async fn restart_inner(&self, options: BootOptions) -> Result<(), ControlError> {
        {
            let mut record = self.cell.record.lock();
            record.state = record.state.apply(StateEvent::Restart)?;
        }

        if let Err(e) = self.cell.driver.restart(&self.id).await {
            self.commit(StateEvent::BootFail);
            return Err(e.into());
        }

        if !self.await_booted(options).await {
            self.commit(StateEvent::BootFail);
            return Err(ControlError::BootTimeout { attempts: options.attempts });
        }

        self.commit(StateEvent::BootOk);
        if !options.settle_delay.is_zero() {
            tokio::time::sleep(options.settle_delay).await;
        }
        Ok(())
    }

    /// Factory-reset a shut-down, unlocked device.
    pub async fn erase(&self, token: &SessionToken) -> Result<(), ControlError> {
        self.guard(token)?;
        {
            let record = self.cell.record.lock();
            if record.state != DeviceState::Shutdown {
                return Err(ControlError::StorageBusy {
                    reason: format!("erase requires shutdown, device is {}", record.state),
                });
            }
        }
        self.cell.driver.erase(&self.id).await?;
        Ok(())
    }

    // ── App control ─────────────────────────────────────────────────────────

    pub async fn install(&self, token: &SessionToken, app_path: &str) -> Result<(), ControlError> {
        self.guard(token)?;
        non_empty(app_path, "app_path")?;
        self.require_booted()?;
        self.cell.driver.install(&self.id, app_path).await?;
        Ok(())
    }

    pub async fn uninstall(
        &self,
        token: &SessionToken,
        bundle_id: &str,
    ) -> Result<(), ControlError> {
        self.guard(token)?;
        non_empty(bundle_id, "bundle_id")?;
        self.require_booted()?;
        self.cell.driver.uninstall(&self.id, bundle_id).await?;
        Ok(())
    }

    pub async fn launch(&self, token: &SessionToken, bundle_id: &str) -> Result<(), ControlError> {
        self.guard(token)?;
        non_empty(bundle_id, "bundle_id")?;
        self.require_booted()?;
        self.cell.driver.launch(&self.id, bundle_id).await?;
        Ok(())
    }

    // ── Orientation and keys ────────────────────────────────────────────────

    pub async fn rotate_left(&self, token: &SessionToken) -> Result<Orientation, ControlError> {
        let current = self.cell.record.lock().orientation;
        self.rotate_to(token, current.rotated_left()).await
    }

    pub async fn rotate_right(&self, token: &SessionToken) -> Result<Orientation, ControlError> {
        let current = self.cell.record.lock().orientation;
        self.rotate_to(token, current.rotated_right()).await
    }

    /// Rotate to an absolute orientation.
    ///
    /// The record is updated optimistically and reverted when the backend
    /// refuses the turn.
    pub async fn rotate_to(
        &self,
        token: &SessionToken,
        target: Orientation,
    ) -> Result<Orientation, ControlError> {
        self.guard(token)?;
        self.require_booted()?;

        let current = {
            let mut record = self.cell.record.lock();
            let current = record.orientation;
            record.orientation = target;
            current
        };
        match self.cell.driver.set_orientation(&self.id, current, target).await {
            Ok(()) => Ok(target),
            Err(e) => {
                self.cell.record.lock().orientation = current;
                Err(e.into())
            }
        }
    }

    pub async fn perform_key_event(
        &self,
        token: &SessionToken,
        code: u32,
    ) -> Result<(), ControlError> {
        self.guard(token)?;
        self.require_booted()?;
        self.cell.driver.key_event(&self.id, code).await?;
        Ok(())
    }

    pub async fn lock_screen(&self, token: &SessionToken) -> Result<(), ControlError> {
        self.guard(token)?;
        self.require_booted()?;
        self.cell.driver.lock_screen(&self.id).await?;
        Ok(())
    }

    pub async fn press_home_key(&self, token: &SessionToken) -> Result<(), ControlError> {
        self.guard(token)?;
        self.require_booted()?;
        self.cell.driver.press_home(&self.id).await?;
        Ok(())
    }

    pub async fn shake_screen(&self, token: &SessionToken) -> Result<(), ControlError> {
        self.guard(token)?;
        self.require_booted()?;
        self.cell.driver.shake(&self.id).await?;
        Ok(())
    }

    pub async fn set_hardware_keyboard_connected(
        &self,
        token: &SessionToken,
        connected: bool,
    ) -> Result<(), ControlError> {
        self.guard(token)?;
        self.require_booted()?;
        self.cell.driver.set_hardware_keyboard(&self.id, connected).await?;
        Ok(())
    }

    // ── Instruments ─────────────────────────────────────────────────────────

    /// Attach an instrument; trace artifacts land in the device storage dir.
    ///
    /// An instrument that exits without being stopped emits
    /// [`DeviceEvent::InstrumentTerminated`].
    pub async fn start_instrument(
        &self,
        token: &SessionToken,
        template: &str,
    ) -> Result<InstrumentId, ControlError> {
        self.guard(token)?;
        non_empty(template, "template")?;
        self.require_booted()?;

        let artifact_dir = self.cell.record.lock().local_storage_path.clone();
        let child = self
            .cell
            .driver
            .start_instrument(&self.id, template, &artifact_dir)
            .await?;

        let instrument_id = InstrumentId::new(uuid::Uuid::new_v4().to_string());
        self.cell
            .instruments
            .lock()
            .insert(instrument_id.clone(), Arc::clone(&child));

        // Exit watcher: an entry still tracked at exit time was not stopped
        // by anyone, so the termination is surfaced as an event.
        let cell = Arc::clone(&self.cell);
        let events = self.events.clone();
        let device_id = self.id.clone();
        let watched_id = instrument_id.clone();
        tokio::spawn(async move {
            let exit_code = child.wait().await;
            let unexpected = cell.instruments.lock().remove(&watched_id).is_some();
            if unexpected {
                tracing::warn!(device = %device_id.short(12), instrument = %watched_id,
                    ?exit_code, "instrument terminated unexpectedly");
                let _ = events.send(DeviceEvent::InstrumentTerminated {
                    device_id,
                    instrument_id: watched_id,
                    exit_code,
                });
            }
        });

        Ok(instrument_id)
    }

    /// Stop one instrument with SIGINT and forget it.
    pub async fn stop_instrument(
        &self,
        token: &SessionToken,
        instrument_id: &InstrumentId,
    ) -> Result<(), ControlError> {
        self.guard(token)?;
        let child = self
            .cell
            .instruments
            .lock()
            .remove(instrument_id)
            .ok_or_else(|| ControlError::UnknownInstrument(instrument_id.clone()))?;
        child.signal(ProcessSignal::Interrupt)?;
        Ok(())
    }

    /// Stop every tracked instrument.
    pub async fn stop_all_instruments(&self, token: &SessionToken) -> Result<(), ControlError> {
        self.guard(token)?;
        self.stop_instruments_inner().await;
        Ok(())
    }

    /// Best-effort drain used by shutdown; removal precedes the signal so
    /// the exit watchers stay quiet.
    async fn stop_instruments_inner(&self) {
        let drained: Vec<_> = {
            let mut instruments = self.cell.instruments.lock();
            instruments.drain().collect()
        };
        for (instrument_id, child) in drained {
            if let Err(e) = child.signal(ProcessSignal::Interrupt) {
                tracing::warn!(instrument = %instrument_id, error = %e, "instrument stop failed");
            }
        }
    }

    /// Instrument ids currently tracked.
    pub fn running_instruments(&self) -> Vec<InstrumentId> {
        self.cell.instruments.lock().keys().cloned().collect()
    }

    // ── Storage ─────────────────────────────────────────────────────────────

    /// Delete and recreate the device storage tree.
    ///
    /// Refused while the device is up or any live process holds its lock.
    pub fn purge_local_storage(&self) -> Result<(), ControlError> {
        self.purge_guard()?;
        let (storage_path, _temp) = self.storage_paths();
        remove_dir_if_present(&storage_path)?;
        self.recreate_storage()?;
        Ok(())
    }

    /// Delete and recreate only the temp scratch area.
    pub fn purge_temp_storage(&self) -> Result<(), ControlError> {
        self.purge_guard()?;
        let (_storage, temp_path) = self.storage_paths();
        remove_dir_if_present(&temp_path)?;
        self.recreate_storage()?;
        Ok(())
    }

    fn purge_guard(&self) -> Result<(), ControlError> {
        let state = self.cell.record.lock().state;
        if matches!(state, DeviceState::Booted | DeviceState::Booting) {
            return Err(ControlError::StorageBusy {
                reason: format!("device is {state}"),
            });
        }
        let lock_state = self.lock.read()?;
        if lock_state.locked && crate::lockfile::pid_alive(lock_state.pid) {
            return Err(ControlError::StorageBusy {
                reason: format!("locked by pid {}", lock_state.pid),
            });
        }
        Ok(())
    }

    fn storage_paths(&self) -> (std::path::PathBuf, std::path::PathBuf) {
        let record = self.cell.record.lock();
        (record.local_storage_path.clone(), record.temp_storage_path.clone())
    }

    fn recreate_storage(&self) -> Result<(), ControlError> {
        let (_, temp) = self.storage_paths();
        std::fs::create_dir_all(temp)?;
        Ok(())
    }

    fn commit(&self, event: StateEvent) {
        let mut record = self.cell.record.lock();
        match record.state.apply(event) {
            Ok(next) => record.state = next,
            Err(e) => {
                // Commits follow a successful admission check; a refusal
                // here means the record changed under us. Keep it.
                tracing::warn!(device = %self.id.short(12), error = %e, "state commit refused");
            }
        }
    }
}

fn non_empty(value: &str, what: &str) -> Result<(), ControlError> {
    if value.trim().is_empty() {
        Err(ControlError::InvalidArgument(format!("{what} must be a non-empty string")))
    } else {
        Ok(())
    }
}

fn remove_dir_if_present(path: &std::path::Path) -> std::io::Result<()> {
    match std::fs::remove_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
