use std::io::{Error, Result};
use std::mem::MaybeUninit;

use libc::{sched_param, sigaction, termios, timespec};

pub fn clock_gettime(clock: i32) -> Result<timespec> {
    let mut ts = MaybeUninit::<timespec>::uninit();
    let result = unsafe { libc::clock_gettime(clock, ts.as_mut_ptr()) };
    if result != -1 {
        Ok(unsafe { ts.assume_init() })
    } else {
        Err(Error::last_os_error())
    }
}

// Returns the error number directly instead of setting errno.
pub fn clock_nanosleep_abs(clock: i32, deadline: &timespec) -> Result<()> {
    loop {
        let errno = unsafe {
            libc::clock_nanosleep(clock, libc::TIMER_ABSTIME, deadline, std::ptr::null_mut())
        };
        match errno {
            0 => return Ok(()),
            libc::EINTR => continue,
            e => return Err(Error::from_raw_os_error(e)),
        }
    }
}

pub fn mlockall(flags: i32) -> Result<()> {
    let result = unsafe { libc::mlockall(flags) };
    if result != -1 {
        Ok(())
    } else {
        Err(Error::last_os_error())
    }
}

// Also returns the error number directly.
pub fn set_thread_sched(policy: i32, priority: i32) -> Result<()> {
    let param = sched_param {
        sched_priority: priority,
    };
    let errno = unsafe { libc::pthread_setschedparam(libc::pthread_self(), policy, &param) };
    if errno == 0 {
        Ok(())
    } else {
        Err(Error::from_raw_os_error(errno))
    }
}

pub fn sched_priority_range(policy: i32) -> Result<(i32, i32)> {
    let min = unsafe { libc::sched_get_priority_min(policy) };
    if min == -1 {
        return Err(Error::last_os_error());
    }
    let max = unsafe { libc::sched_get_priority_max(policy) };
    if max == -1 {
        return Err(Error::last_os_error());
    }
    Ok((min, max))
}

pub fn install_handler(signum: i32, handler: extern "C" fn(i32)) -> Result<()> {
    let mut act = unsafe { MaybeUninit::<sigaction>::zeroed().assume_init() };
    act.sa_sigaction = handler as usize;
    let result = unsafe { libc::sigaction(signum, &act, std::ptr::null_mut()) };
    if result != -1 {
        Ok(())
    } else {
        Err(Error::last_os_error())
    }
}

/// Polls a single fd for input; returns whether it became readable
/// within `timeout_ms`.
pub fn poll_in(fd: i32, timeout_ms: i32) -> Result<bool> {
    let mut pfd = libc::pollfd {
        fd,
        events: libc::POLLIN,
        revents: 0,
    };
    let result = unsafe { libc::poll(&mut pfd, 1, timeout_ms) };
    match result {
        -1 => {
            let e = Error::last_os_error();
            if e.raw_os_error() == Some(libc::EINTR) {
                Ok(false)
            } else {
                Err(e)
            }
        }
        0 => Ok(false),
        _ => Ok(pfd.revents & libc::POLLIN != 0),
    }
}

pub fn read_byte(fd: i32) -> Result<Option<u8>> {
    let mut buf = [0u8];
    let bytes = unsafe { libc::read(fd, buf.as_mut_ptr() as _, 1) };
    match bytes {
        -1 => Err(Error::last_os_error()),
        0 => Ok(None),
        _ => Ok(Some(buf[0])),
    }
}

pub fn tcgetattr(fd: i32) -> Result<termios> {
    let mut tio = MaybeUninit::<termios>::uninit();
    let result = unsafe { libc::tcgetattr(fd, tio.as_mut_ptr()) };
    if result != -1 {
        Ok(unsafe { tio.assume_init() })
    } else {
        Err(Error::last_os_error())
    }
}

pub fn tcsetattr(fd: i32, tio: &termios) -> Result<()> {
    let result = unsafe { libc::tcsetattr(fd, libc::TCSANOW, tio) };
    if result != -1 {
        Ok(())
    } else {
        Err(Error::last_os_error())
    }
}
