// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Identifier newtypes and session-token generation.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

/// Define a newtype ID wrapper around `String`.
///
/// Generates `new()`, `as_str()`, `short()`, `Display`, `From<String>`,
/// `From<&str>`, `PartialEq<str>`, `PartialEq<&str>`, and `Borrow<str>`
/// implementations.
#[macro_export]
macro_rules! define_id {
    (
        $(#[$meta:meta])*
        pub struct $name:ident;
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Returns a string slice truncated to at most `n` characters.
            pub fn short(&self, n: usize) -> &str {
                if self.0.len() <= n {
                    &self.0
                } else {
                    &self.0[..n]
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl PartialEq<str> for $name {
            fn eq(&self, other: &str) -> bool {
                self.0 == other
            }
        }

        impl PartialEq<&str> for $name {
            fn eq(&self, other: &&str) -> bool {
                self.0 == *other
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

define_id! {
    /// Stable opaque device identifier.
    ///
    /// A UDID for iOS devices and simulators; an AVD id or adb serial for
    /// Android. Immutable for the lifetime of the device record.
    pub struct DeviceId;
}

define_id! {
    /// Identifier for a running instrumentation attach on a device.
    pub struct InstrumentId;
}

define_id! {
    /// Opaque authorization token scoping mutating operations to one caller.
    ///
    /// Tokens are locally collision-resistant and carry no structure that
    /// callers may rely on.
    pub struct SessionToken;
}

/// Mints session tokens.
pub trait TokenGen: Clone + Send + Sync + 'static {
    fn mint(&self) -> SessionToken;
}

/// Production token source.
///
/// Combines a high-resolution timestamp, a per-process random salt, and a
/// sequence counter so tokens are unguessable by neighbors of the same
/// process and never collide locally.
#[derive(Clone)]
pub struct SaltedTokenGen {
    salt: u64,
    counter: Arc<AtomicU64>,
}

impl SaltedTokenGen {
    pub fn new() -> Self {
        Self {
            salt: rand::random::<u64>(),
            counter: Arc::new(AtomicU64::new(0)),
        }
    }
}

impl Default for SaltedTokenGen {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenGen for SaltedTokenGen {
    fn mint(&self) -> SessionToken {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_nanos())
            .unwrap_or(0);
        let seq = self.counter.fetch_add(1, Ordering::Relaxed);
        SessionToken::new(format!("{:x}.{:x}.{:x}", nanos, self.salt, seq))
    }
}

/// Sequential token source for deterministic tests.
#[derive(Clone)]
pub struct SequentialTokenGen {
    prefix: String,
    counter: Arc<AtomicU64>,
}

impl SequentialTokenGen {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            counter: Arc::new(AtomicU64::new(1)),
        }
    }
}

impl Default for SequentialTokenGen {
    fn default() -> Self {
        Self::new("token")
    }
}

impl TokenGen for SequentialTokenGen {
    fn mint(&self) -> SessionToken {
        let n = self.counter.fetch_add(1, Ordering::SeqCst);
        SessionToken::new(format!("{}-{}", self.prefix, n))
    }
}

#[cfg(test)]
#[path = "id_tests.rs"]
mod tests;
