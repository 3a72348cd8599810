// src/exec/kill.rs

use std::io;

use crate::engine::ProcessHandle;

/// Immediately and unconditionally terminate the process behind `handle`.
///
/// - unix: `SIGKILL`, to the whole process group when the child leads one,
///   so children of a shell command die with it.
/// - windows: `taskkill /F /T`, which also takes the process tree.
///
/// An already-exited process yields an error (`ESRCH` on unix); callers log
/// it and carry on.
pub fn hard_kill(handle: &ProcessHandle) -> io::Result<()> {
    if handle.pid == 0 {
        return Err(io::Error::new(io::ErrorKind::InvalidInput, "refusing to kill pid 0"));
    }

    #[cfg(unix)]
    {
        sigkill(handle.pid, handle.process_group)
    }

    #[cfg(not(unix))]
    {
        taskkill(handle.pid)
    }
}

#[cfg(unix)]
fn sigkill(pid: u32, process_group: bool) -> io::Result<()> {
    let pid = libc::pid_t::try_from(pid)
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidInput, "pid out of range"))?;

    // SAFETY: kill/killpg only take integers; `pid` is a child we spawned.
    let rc = unsafe {
        if process_group {
            libc::killpg(pid, libc::SIGKILL)
        } else {
            libc::kill(pid, libc::SIGKILL)
        }
    };

    if rc == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn taskkill(pid: u32) -> io::Result<()> {
    let status = std::process::Command::new("taskkill")
        .args(["/F", "/T", "/PID", &pid.to_string()])
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()?;

    if status.success() {
        Ok(())
    } else {
        Err(io::Error::other(format!("taskkill exited with {status}")))
    }
}
