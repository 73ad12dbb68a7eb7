//! Process-wide popup manager.
//!
//! Hosts that expose popups through a single well-known entry point install
//! one manager here. Installation is idempotent: the first manager wins and
//! later calls return it unchanged.

use std::sync::OnceLock;

use tracing::{debug, info};

use super::core::PopupManager;

static INSTALLED: OnceLock<PopupManager> = OnceLock::new();

/// Installs `manager` as the process-wide manager unless one is installed.
///
/// Returns the installed manager, which is `manager` only on the first call.
pub fn install(manager: PopupManager) -> &'static PopupManager {
    let mut fresh = false;
    let installed = INSTALLED.get_or_init(|| {
        fresh = true;
        manager
    });

    if fresh {
        info!("Global popup manager installed");
    } else {
        debug!("Global popup manager already installed, keeping existing");
    }

    installed
}

/// Returns the process-wide manager, if installed.
#[inline]
#[must_use]
pub fn installed() -> Option<&'static PopupManager> {
    INSTALLED.get()
}

// ============================================================================
// Tests
// ============================================================================
