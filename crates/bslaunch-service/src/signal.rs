//! Process signalling by pid.

use std::io;

/// Terminate `pid` unconditionally (SIGKILL).
#[cfg(unix)]
pub fn kill_pid(pid: u32) -> io::Result<()> {
    let pid = signal_target(pid)?;
    // SAFETY: kill(2) has no memory-safety preconditions; `pid` is a single
    // positive process id, never a process group.
    #[allow(unsafe_code)]
    let ret = unsafe { libc::kill(pid, libc::SIGKILL) };
    if ret == 0 {
        Ok(())
    } else {
        Err(io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
pub fn kill_pid(pid: u32) -> io::Result<()> {
    Err(io::Error::new(
        io::ErrorKind::Unsupported,
        format!("killing pid {pid} is only supported on unix"),
    ))
}

/// Whether a process with `pid` exists.
#[cfg(unix)]
pub fn is_alive(pid: u32) -> bool {
    let Ok(pid) = signal_target(pid) else {
        return false;
    };
    // SAFETY: signal 0 performs the existence and permission checks only.
    #[allow(unsafe_code)]
    let ret = unsafe { libc::kill(pid, 0) };
    ret == 0 || io::Error::last_os_error().raw_os_error() == Some(libc::EPERM)
}

#[cfg(not(unix))]
pub fn is_alive(_pid: u32) -> bool {
    false
}

#[cfg(unix)]
fn signal_target(pid: u32) -> io::Result<i32> {
    match i32::try_from(pid) {
        Ok(pid) if pid > 0 => Ok(pid),
        _ => Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{pid} is not a signalable process id"),
        )),
    }
}

#[cfg(all(test, unix))]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn current_process_is_alive() {
        assert!(is_alive(std::process::id()));
    }

    #[test]
    fn rejects_group_and_overflowing_pids() {
        assert!(!is_alive(0));
        assert_eq!(
            kill_pid(0).unwrap_err().kind(),
            io::ErrorKind::InvalidInput
        );
        assert_eq!(
            kill_pid(u32::MAX).unwrap_err().kind(),
            io::ErrorKind::InvalidInput
        );
    }

    #[test]
    fn kills_child_process() {
        let mut child = std::process::Command::new("sleep").arg("30").spawn().unwrap();
        let pid = child.id();
        kill_pid(pid).unwrap();
        let status = child.wait().unwrap();
        assert!(!status.success());
    }
}
