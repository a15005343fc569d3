// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session persistence.

pub mod session;
pub mod storage;

pub use session::SessionStore;
pub use storage::{FileStorage, MemoryStorage, Storage, StorageError};

/// Storage key names as constants.
pub mod keys {
    pub const ACCESS: &str = "access";
    pub const REFRESH: &str = "refresh";
    /// JSON-serialized user record
    pub const USER: &str = "user";

    pub const ALL: [&str; 3] = [ACCESS, REFRESH, USER];
}
