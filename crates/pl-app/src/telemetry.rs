//! Telemetry sink.
//!
//! The control loop hands samples to a bounded channel without blocking.
//! A writer thread drains the channel and writes one JSON object per line.

use crate::error::{AppError, AppResult};
use crate::pacing::Shutdown;
use crossbeam::channel::{Receiver, Sender, TrySendError};
use pl_sim::Sample;
use std::io::Write;
use std::thread::JoinHandle;
use tracing::{debug, warn};

/// Non-blocking destination for telemetry samples.
pub trait TelemetrySink {
    /// Hand off one sample. Returns [`AppError::SinkUnavailable`] when the
    /// sample cannot be accepted right now.
    fn try_deliver(&mut self, sample: &Sample) -> AppResult<()>;
}

/// Sink backed by a bounded crossbeam channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<Sample>,
}

impl ChannelSink {
    pub fn new(tx: Sender<Sample>) -> Self {
        Self { tx }
    }
}

impl TelemetrySink for ChannelSink {
    fn try_deliver(&mut self, sample: &Sample) -> AppResult<()> {
        match self.tx.try_send(*sample) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) | Err(TrySendError::Disconnected(_)) => {
                Err(AppError::SinkUnavailable)
            }
        }
    }
}

/// Write every sample received on `rx` as a JSON line, flushing after each.
///
/// Returns the number of records written once the channel closes. Once
/// `shutdown` is triggered, queued samples are discarded and nothing more is
/// written. A write failure ends the thread; later deliveries then see a
/// disconnected sink.
pub fn spawn_json_writer<W>(
    mut writer: W,
    rx: Receiver<Sample>,
    shutdown: Shutdown,
) -> JoinHandle<AppResult<u64>>
where
    W: Write + Send + 'static,
{
    std::thread::spawn(move || {
        let mut written = 0u64;
        for sample in rx.iter() {
            if shutdown.is_triggered() {
                debug!(
                    written,
                    pending = rx.len() + 1,
                    "Shutdown requested, discarding queued telemetry"
                );
                break;
            }
            let result = serde_json::to_writer(&mut writer, &sample)
                .map_err(AppError::from)
                .and_then(|()| writer.write_all(b"\n").map_err(AppError::from))
                .and_then(|()| writer.flush().map_err(AppError::from));
            if let Err(e) = result {
                warn!(error = %e, written, "Telemetry output failed");
                return Err(e);
            }
            written += 1;
        }
        debug!(written, "Telemetry writer finished");
        Ok(written)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam::channel::bounded;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct SharedBuf(Arc<Mutex<Vec<u8>>>);

    impl Write for SharedBuf {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    fn sample(t: f64) -> Sample {
        Sample {
            pressure: 12.5,
            valve_angle: 3.0,
            motor_current: 1.25,
            setpoint: 500.0,
            timestamp: t,
        }
    }

    #[test]
    fn full_channel_is_unavailable() {
        let (tx, _rx) = bounded(1);
        let mut sink = ChannelSink::new(tx);
        sink.try_deliver(&sample(0.1)).unwrap();
        assert!(matches!(
            sink.try_deliver(&sample(0.2)),
            Err(AppError::SinkUnavailable)
        ));
    }

    #[test]
    fn closed_channel_is_unavailable() {
        let (tx, rx) = bounded(4);
        drop(rx);
        let mut sink = ChannelSink::new(tx);
        assert!(matches!(
            sink.try_deliver(&sample(0.1)),
            Err(AppError::SinkUnavailable)
        ));
    }

    #[test]
    fn writer_discards_queue_after_shutdown() {
        let buf = SharedBuf::default();
        let (tx, rx) = bounded(8);
        let mut sink = ChannelSink::new(tx);
        for k in 1..=5 {
            sink.try_deliver(&sample(0.1 * k as f64)).unwrap();
        }

        let shutdown = Shutdown::new();
        shutdown.trigger();
        let handle = spawn_json_writer(buf.clone(), rx, shutdown);
        drop(sink);

        assert_eq!(handle.join().unwrap().unwrap(), 0);
        assert!(buf.0.lock().unwrap().is_empty());
    }

    #[test]
    fn writer_emits_one_object_per_line() {
        let buf = SharedBuf::default();
        let (tx, rx) = bounded(4);
        let handle = spawn_json_writer(buf.clone(), rx, Shutdown::new());

        let mut sink = ChannelSink::new(tx);
        sink.try_deliver(&sample(0.1)).unwrap();
        sink.try_deliver(&sample(0.2)).unwrap();
        drop(sink);

        assert_eq!(handle.join().unwrap().unwrap(), 2);
        let text = String::from_utf8(buf.0.lock().unwrap().clone()).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 2);

        let parsed: Sample = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(parsed, sample(0.2));
        let obj: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(obj["setpoint"], 500.0);
        assert_eq!(obj["timestamp"], 0.1);
    }
}
