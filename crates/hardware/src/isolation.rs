//! Host thread isolation hook.
//!
//! Hart threads execute guest-controlled work, so each one restricts itself
//! at startup when isolation is enabled in the configuration. The policy
//! itself is deliberately minimal and host-specific; embedders wanting full
//! sandboxing layer their own policy on top.

/// Restricts the calling thread's ambient authority.
///
/// On Linux this sets `no_new_privs`, preventing the thread (and anything it
/// ever executes) from gaining privileges through setuid or capability bits.
/// On other hosts this is a no-op.
pub fn restrict_current_thread() {
    #[cfg(target_os = "linux")]
    {
        // SAFETY: prctl(PR_SET_NO_NEW_PRIVS, 1, 0, 0, 0) takes no pointers
        // and only affects the calling thread's credentials.
        let ret = unsafe { libc::prctl(libc::PR_SET_NO_NEW_PRIVS, 1, 0, 0, 0) };
        if ret != 0 {
            tracing::warn!("failed to restrict hart thread");
        }
    }
}
