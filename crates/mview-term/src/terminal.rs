//! Terminal plumbing: raw mode, window size, and the stdin key reader.

use std::io::{self, IsTerminal, Read};

use tokio::sync::mpsc;
use tracing::debug;

const DEFAULT_WIDTH: usize = 80;

pub fn stdin_is_tty() -> bool {
    io::stdin().is_terminal()
}

/// Columns of the controlling terminal, or 80 when stdout is not one.
pub fn terminal_width() -> usize {
    imp::width().filter(|w| *w > 0).unwrap_or(DEFAULT_WIDTH)
}

/// Canonical mode and echo off for stdin; restored on drop.
///
/// Signals stay enabled, so Ctrl-C still reaches the process as SIGINT.
pub struct RawMode {
    saved: imp::Saved,
}

impl RawMode {
    pub fn enable() -> io::Result<Self> {
        let saved = imp::enable()?;
        debug!("terminal raw mode enabled");
        Ok(Self { saved })
    }
}

impl Drop for RawMode {
    fn drop(&mut self) {
        if let Err(e) = imp::restore(&self.saved) {
            debug!(error = %e, "failed to restore terminal mode");
        }
    }
}

/// Forward stdin bytes to a channel from a detached thread.
///
/// The thread ends on EOF, on a read error, or once the receiver is dropped
/// and the next byte arrives.
pub fn spawn_key_reader() -> io::Result<mpsc::UnboundedReceiver<u8>> {
    let (tx, rx) = mpsc::unbounded_channel();
    std::thread::Builder::new()
        .name("stdin-keys".into())
        .spawn(move || {
            let mut stdin = io::stdin().lock();
            let mut byte = [0u8; 1];
            loop {
                match stdin.read(&mut byte) {
                    Ok(0) => break,
                    Ok(_) => {
                        if tx.send(byte[0]).is_err() {
                            break;
                        }
                    }
                    Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                    Err(e) => {
                        debug!(error = %e, "stdin read failed");
                        break;
                    }
                }
            }
        })?;
    Ok(rx)
}

#[cfg(unix)]
mod imp {
    use std::io;

    pub type Saved = libc::termios;

    pub fn enable() -> io::Result<Saved> {
        let fd = libc::STDIN_FILENO;
        // SAFETY: termios is plain data; tcgetattr fills it or fails.
        let mut saved: libc::termios = unsafe { std::mem::zeroed() };
        if unsafe { libc::tcgetattr(fd, &mut saved) } != 0 {
            return Err(io::Error::last_os_error());
        }

        let mut raw = saved;
        raw.c_lflag &= !(libc::ICANON | libc::ECHO);
        raw.c_cc[libc::VMIN] = 1;
        raw.c_cc[libc::VTIME] = 0;
        if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &raw) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(saved)
    }

    pub fn restore(saved: &Saved) -> io::Result<()> {
        if unsafe { libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, saved) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(())
    }

    pub fn width() -> Option<usize> {
        // SAFETY: winsize is plain data; TIOCGWINSZ fills it or fails.
        let mut size: libc::winsize = unsafe { std::mem::zeroed() };
        let rc = unsafe { libc::ioctl(libc::STDOUT_FILENO, libc::TIOCGWINSZ, &mut size) };
        (rc == 0).then_some(size.ws_col as usize)
    }
}

#[cfg(not(unix))]
mod imp {
    use std::io;

    pub type Saved = ();

    pub fn enable() -> io::Result<Saved> {
        Ok(())
    }

    pub fn restore(_saved: &Saved) -> io::Result<()> {
        Ok(())
    }

    pub fn width() -> Option<usize> {
        None
    }
}
