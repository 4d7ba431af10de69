//! Android-specific implementations for the SAF bridge.
//!
//! This module is only compiled on Android builds (`target_os = "android"`).
//!
//! ## Architecture
//!
//! On Android, users cannot grant blanket filesystem access. Instead:
//! 1. User picks a directory via SAF file picker
//! 2. App receives a `content://` URI with read/write permissions
//! 3. App persists the permission with `takePersistableUriPermission()`
//! 4. On subsequent launches, app can access that directory without re-prompting
//!
//! The shell keeps the tree URI and passes it back with every call; all
//! document lookups start from that root again.

#![cfg(target_os = "android")]

pub mod saf;
