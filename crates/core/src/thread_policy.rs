//! Thread name, CPU affinity and OS scheduling class for the calling
//! thread. Shared by every executor that owns a dedicated thread.

use crate::error::ThreadPolicyError;

/// Sets the OS thread name of the calling thread.
///
/// Names longer than 15 bytes are truncated to `first8 + ".." + last5` to
/// stay within the 16-byte (including NUL) limit `pthread_setname_np`
/// enforces on Linux.
pub fn set_name(thread_name: &str) {
    let real_name = if thread_name.len() < 15 {
        thread_name.to_string()
    } else {
        format!("{}..{}", &thread_name[..8], &thread_name[thread_name.len() - 5..])
    };
    set_name_os(&real_name);
}

#[cfg(target_os = "linux")]
fn set_name_os(name: &str) {
    use std::ffi::CString;
    let Ok(cname) = CString::new(name) else {
        tracing::error!(name, "thread name contains a NUL byte");
        return;
    };
    // SAFETY: `cname` stays alive for the duration of the call and
    // `pthread_setname_np` only reads it.
    let ret = unsafe { libc::pthread_setname_np(libc::pthread_self(), cname.as_ptr()) };
    if ret != 0 {
        tracing::error!(name, ret, "pthread_setname_np failed");
    }
}

#[cfg(not(target_os = "linux"))]
fn set_name_os(name: &str) {
    tracing::warn!(name, "thread naming is not implemented on this platform");
}

/// Binds the calling thread to the given set of CPU indices.
///
/// An empty list is a no-op. Every index must be less than the reported
/// hardware concurrency.
pub fn bind_cpu(cpus: &[u32]) -> Result<(), ThreadPolicyError> {
    if cpus.is_empty() {
        return Ok(());
    }

    let max = std::thread::available_parallelism().map(|n| n.get() as u32).unwrap_or(1);
    for &idx in cpus {
        if idx >= max {
            return Err(ThreadPolicyError::InvalidCpuIndex { idx, max });
        }
    }

    bind_cpu_os(cpus)
}

#[cfg(target_os = "linux")]
fn bind_cpu_os(cpus: &[u32]) -> Result<(), ThreadPolicyError> {
    use nix::sched::{sched_setaffinity, CpuSet};
    use nix::unistd::Pid;

    let mut set = CpuSet::new();
    for &idx in cpus {
        set.set(idx as usize).map_err(|_| ThreadPolicyError::BindCpu)?;
    }
    sched_setaffinity(Pid::from_raw(0), &set).map_err(|_| ThreadPolicyError::BindCpu)
}

#[cfg(not(target_os = "linux"))]
fn bind_cpu_os(_cpus: &[u32]) -> Result<(), ThreadPolicyError> {
    tracing::warn!("CPU affinity is not implemented on this platform");
    Ok(())
}

/// Sets the OS scheduling class of the calling thread.
///
/// An empty string is a no-op. `"SCHED_OTHER"` selects the default policy.
/// `"SCHED_FIFO:<N>"` / `"SCHED_RR:<N>"` select a real-time policy with
/// priority `N`, which must fall within the OS-reported range for that
/// policy.
pub fn set_sched(sched: &str) -> Result<(), ThreadPolicyError> {
    if sched.is_empty() {
        return Ok(());
    }

    if sched == "SCHED_OTHER" {
        return set_sched_other_os();
    }

    let Some((policy_str, priority_str)) = sched.split_once(':') else {
        return Err(ThreadPolicyError::InvalidSchedSpec(sched.to_string()));
    };
    if priority_str.is_empty() {
        return Err(ThreadPolicyError::InvalidSchedSpec(sched.to_string()));
    }

    let priority: i32 = priority_str
        .parse()
        .map_err(|_| ThreadPolicyError::InvalidSchedSpec(sched.to_string()))?;

    let policy = match policy_str {
        "SCHED_FIFO" => RtPolicy::Fifo,
        "SCHED_RR" => RtPolicy::RoundRobin,
        _ => return Err(ThreadPolicyError::InvalidSchedSpec(sched.to_string())),
    };

    set_sched_rt_os(policy, priority)
}

enum RtPolicy {
    Fifo,
    RoundRobin,
}

#[cfg(target_os = "linux")]
fn set_sched_other_os() -> Result<(), ThreadPolicyError> {
    let param = libc::sched_param { sched_priority: 0 };
    // SAFETY: `param` is a valid, fully-initialized sched_param.
    let ret = unsafe { libc::pthread_setschedparam(libc::pthread_self(), libc::SCHED_OTHER, &param) };
    if ret != 0 {
        return Err(ThreadPolicyError::SetSched(std::io::Error::from_raw_os_error(ret)));
    }
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn set_sched_other_os() -> Result<(), ThreadPolicyError> {
    tracing::warn!("scheduling policy is not implemented on this platform");
    Ok(())
}

#[cfg(target_os = "linux")]
fn set_sched_rt_os(policy: RtPolicy, priority: i32) -> Result<(), ThreadPolicyError> {
    let (policy_name, policy_const) = match policy {
        RtPolicy::Fifo => ("SCHED_FIFO", libc::SCHED_FIFO),
        RtPolicy::RoundRobin => ("SCHED_RR", libc::SCHED_RR),
    };

    // SAFETY: `policy_const` is one of the fixed libc scheduling constants.
    let (min, max) =
        unsafe { (libc::sched_get_priority_min(policy_const), libc::sched_get_priority_max(policy_const)) };

    if priority < min || priority > max {
        return Err(ThreadPolicyError::InvalidSchedPriority {
            policy: policy_name.to_string(),
            priority,
            min,
            max,
        });
    }

    let param = libc::sched_param { sched_priority: priority };
    // SAFETY: `param` is valid and `policy_const` is a recognized policy.
    let ret =
        unsafe { libc::pthread_setschedparam(libc::pthread_self(), policy_const, &param) };
    if ret != 0 {
        return Err(ThreadPolicyError::SetSched(std::io::Error::from_raw_os_error(ret)));
    }
    Ok(())
}

#[cfg(not(target_os = "linux"))]
fn set_sched_rt_os(_policy: RtPolicy, _priority: i32) -> Result<(), ThreadPolicyError> {
    tracing::warn!("scheduling policy is not implemented on this platform");
    Ok(())
}

#[cfg(test)]
#[path = "thread_policy_tests.rs"]
mod tests;
