//! Stdin command surface: one character per command.
//!
//! `b` posts a sort event, `d` an e-stop, `h` bumps the HMI setpoint, `q`
//! quits. Event stamps are taken at the keypress, so actuator latency is
//! measured from the operator's action. The terminal is switched to
//! non-canonical mode for the run so keys act without a newline; a piped
//! stdin falls back to line-buffered reads.

use std::thread;
use std::time::Duration;

use libc::termios;

use crate::ffi::syscall::{poll_in, read_byte, tcgetattr, tcsetattr};
use crate::tasks::Shared;
use crate::{clock, rt};

const POLL_MS: i32 = 100;

/// Restores the saved terminal attributes on drop.
pub struct RawMode {
    saved: termios,
}

impl RawMode {
    /// Puts stdin into non-canonical, no-echo mode.
    pub fn enter() -> std::io::Result<Self> {
        let saved = tcgetattr(libc::STDIN_FILENO)?;
        let mut raw = saved;
        raw.c_lflag &= !(libc::ICANON | libc::ECHO);
        raw.c_cc[libc::VMIN] = 1;
        raw.c_cc[libc::VTIME] = 0;
        tcsetattr(libc::STDIN_FILENO, &raw)?;
        Ok(Self { saved })
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        let _ = tcsetattr(libc::STDIN_FILENO, &self.saved);
    }
}

/// Runs the command pump until shutdown.
///
/// Polls stdin with a bounded timeout so a termination signal or a stop
/// requested elsewhere is observed within [`POLL_MS`]. Returns once
/// `shared.running()` is false; `q` and signals request the stop here.
pub fn pump(shared: &Shared) {
    let _raw = match RawMode::enter() {
        Ok(guard) => Some(guard),
        Err(e) => {
            log::warn!("raw terminal mode unavailable ({e}); input is line-buffered");
            None
        }
    };

    let mut stdin_open = true;
    while shared.running() {
        if rt::signaled() {
            log::info!("termination signal received");
            shared.request_stop();
            break;
        }
        if !stdin_open {
            thread::sleep(Duration::from_millis(POLL_MS as u64));
            continue;
        }
        match poll_in(libc::STDIN_FILENO, POLL_MS) {
            Ok(false) => continue,
            Ok(true) => match read_byte(libc::STDIN_FILENO) {
                Ok(Some(byte)) => dispatch(shared, byte),
                Ok(None) => stdin_open = false,
                Err(e) => {
                    log::warn!("stdin read failed: {e}");
                    stdin_open = false;
                }
            },
            Err(e) => {
                log::warn!("stdin poll failed: {e}");
                stdin_open = false;
            }
        }
    }
}

fn dispatch(shared: &Shared, byte: u8) {
    let stamp = clock::now();
    match byte {
        b'b' => shared.post_sort(stamp),
        b'd' => shared.post_estop(stamp),
        b'h' => {
            let setpoint = shared.hmi_bump();
            log::info!("HMI: setpoint -> {setpoint:.0} rpm");
        }
        b'q' => shared.request_stop(),
        _ => {}
    }
}
