//! Startup privilege guard
//!
//! Reading peer tables needs root (or CAP_NET_ADMIN for netlink). Without
//! it no request can succeed, so the process refuses to start.

use crate::error::{TunnelError, TunnelResult};

/// Effective user id of this process, `None` where the platform has none
pub fn effective_uid() -> Option<u32> {
    #[cfg(unix)]
    {
        // SAFETY: geteuid has no preconditions and cannot fail.
        Some(unsafe { libc::geteuid() })
    }

    #[cfg(not(unix))]
    {
        None
    }
}

/// Check an effective uid against the privilege requirement
pub fn check_privilege(euid: Option<u32>) -> TunnelResult<()> {
    match euid {
        Some(0) | None => Ok(()),
        Some(uid) => Err(TunnelError::PermissionDenied(format!(
            "must be run as root (effective uid is {})",
            uid
        ))),
    }
}

/// Fail unless the process runs with superuser privilege
pub fn ensure_privileged() -> TunnelResult<()> {
    check_privilege(effective_uid())
}
