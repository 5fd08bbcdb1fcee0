//! Gain-update command channel.
//!
//! Commands arrive as JSON lines such as `{"Kp": 120.0, "Ki": 30.0, "Kd": 45.0}`.
//! A reader thread moves lines into a bounded channel; the control loop
//! drains it without blocking and keeps only the newest valid request.

use crate::error::{AppError, AppResult};
use crossbeam::channel::{Receiver, TryRecvError, bounded};
use pl_control::ControllerGains;
use std::io::BufRead;
use std::thread::JoinHandle;
use tracing::{debug, info, warn};

/// Parse one command line into a validated gain set.
///
/// All three keys are required; unknown keys are ignored.
pub fn parse_command(line: &str) -> AppResult<ControllerGains> {
    let malformed = |reason: String| AppError::MalformedCommand {
        line: line.to_string(),
        reason,
    };
    let gains: ControllerGains =
        serde_json::from_str(line.trim()).map_err(|e| malformed(e.to_string()))?;
    gains.validate().map_err(|e| malformed(e.to_string()))?;
    Ok(gains)
}

/// Non-blocking source of gain updates.
pub trait CommandSource {
    /// Return the most recent pending request, if any. Never blocks.
    fn try_recv(&mut self) -> Option<ControllerGains>;

    /// Number of commands discarded as malformed so far.
    fn malformed(&self) -> u64 {
        0
    }
}

/// Command source over a channel of raw lines.
#[derive(Debug)]
pub struct ChannelCommandSource {
    rx: Receiver<String>,
    malformed: u64,
    closed: bool,
}

impl ChannelCommandSource {
    pub fn new(rx: Receiver<String>) -> Self {
        Self {
            rx,
            malformed: 0,
            closed: false,
        }
    }

    /// True once the producer side has gone away and the channel is empty.
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

impl CommandSource for ChannelCommandSource {
    fn try_recv(&mut self) -> Option<ControllerGains> {
        let mut latest = None;
        loop {
            match self.rx.try_recv() {
                Ok(line) => {
                    if line.trim().is_empty() {
                        continue;
                    }
                    match parse_command(&line) {
                        Ok(gains) => {
                            if latest.is_some() {
                                debug!(%gains, "Coalescing pending gain update");
                            }
                            latest = Some(gains);
                        }
                        Err(e) => {
                            self.malformed += 1;
                            warn!(error = %e, "Discarding command");
                        }
                    }
                }
                Err(TryRecvError::Empty) => break,
                Err(TryRecvError::Disconnected) => {
                    if !self.closed {
                        info!("Command stream closed, keeping last accepted gains");
                        self.closed = true;
                    }
                    break;
                }
            }
        }
        latest
    }

    fn malformed(&self) -> u64 {
        self.malformed
    }
}

/// Read lines from `reader` on a dedicated thread into a bounded channel.
///
/// Lines that are not valid UTF-8 are forwarded lossily so the parser
/// rejects them as malformed. The thread blocks while the channel is full
/// and ends at end of input, on a read error, or once the receiver is
/// dropped.
pub fn spawn_line_reader<R>(mut reader: R, capacity: usize) -> (Receiver<String>, JoinHandle<()>)
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = bounded(capacity);
    let handle = std::thread::spawn(move || {
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf);
                    let line = line.trim_end_matches(|c: char| c == '\n' || c == '\r').to_string();
                    if tx.send(line).is_err() {
                        break;
                    }
                }
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    warn!(error = %e, "Command input failed");
                    break;
                }
            }
        }
        debug!("Command reader finished");
    });
    (rx, handle)
}
