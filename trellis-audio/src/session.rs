use std::any::Any;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use crate::recorder::CaptureError;

/// Finalized mono PCM audio from one recording session.
#[derive(Debug, Clone, PartialEq)]
pub struct CapturedAudio {
    pub sample_rate_hz: u32,
    pub samples: Vec<f32>,
}

impl CapturedAudio {
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate_hz == 0 {
            return 0.0;
        }
        self.samples.len() as f64 / f64::from(self.sample_rate_hz)
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

pub type LevelCallback = Arc<dyn Fn(&[f32]) + Send + Sync + 'static>;

enum Cmd {
    Pause,
    Resume,
    Cancel,
    Stop(mpsc::Sender<Vec<f32>>),
}

/// One microphone recording in progress.
///
/// The session owns a consumer worker fed by a channel of mono f32 chunks.
/// Accumulation starts immediately; pausing halts accumulation and the
/// elapsed counter while the source (and the level callback feeding the live
/// waveform) stays alive. `stop` and `cancel` are the only exits that hand
/// control back; dropping an active session cancels it. Either way the
/// source guard is released exactly once.
pub struct RecordingSession {
    cmd_tx: mpsc::Sender<Cmd>,
    worker: Option<std::thread::JoinHandle<()>>,
    // Keeps the input stream alive; dropped on any terminal transition.
    guard: Option<Box<dyn Any + Send>>,
    sample_rate_hz: u32,
    recorded: Arc<AtomicU64>,
    paused: Arc<AtomicBool>,
}

impl RecordingSession {
    /// Build a session over an arbitrary sample source. Production code goes
    /// through `Microphone::record`; tests feed the channel directly.
    pub fn from_source(
        sample_rx: mpsc::Receiver<Vec<f32>>,
        sample_rate_hz: u32,
        level_cb: Option<LevelCallback>,
    ) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel::<Cmd>();
        let recorded = Arc::new(AtomicU64::new(0));
        let recorded_worker = recorded.clone();

        let worker = std::thread::spawn(move || {
            run_consumer(sample_rx, cmd_rx, recorded_worker, level_cb);
        });

        Self {
            cmd_tx,
            worker: Some(worker),
            guard: None,
            sample_rate_hz,
            recorded,
            paused: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Attach the object that keeps the underlying input stream alive.
    pub fn with_guard(mut self, guard: impl Any + Send) -> Self {
        self.guard = Some(Box::new(guard));
        self
    }

    pub fn sample_rate_hz(&self) -> u32 {
        self.sample_rate_hz
    }

    /// Whole seconds of audio accumulated so far (pauses excluded).
    pub fn elapsed_seconds(&self) -> u64 {
        if self.sample_rate_hz == 0 {
            return 0;
        }
        self.recorded.load(Ordering::Relaxed) / u64::from(self.sample_rate_hz)
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Relaxed)
    }

    pub fn pause(&self) -> Result<(), CaptureError> {
        self.paused.store(true, Ordering::Relaxed);
        self.cmd_tx.send(Cmd::Pause).map_err(|_| CaptureError::Channel)
    }

    pub fn resume(&self) -> Result<(), CaptureError> {
        self.paused.store(false, Ordering::Relaxed);
        self.cmd_tx.send(Cmd::Resume).map_err(|_| CaptureError::Channel)
    }

    /// Flip between recording and paused; returns true when now paused.
    pub fn toggle_pause(&self) -> Result<bool, CaptureError> {
        if self.is_paused() {
            self.resume()?;
            Ok(false)
        } else {
            self.pause()?;
            Ok(true)
        }
    }

    /// Discard everything accumulated and release the source. Emits nothing.
    pub fn cancel(mut self) {
        let _ = self.cmd_tx.send(Cmd::Cancel);
        self.teardown();
    }

    /// Finalize the accumulated chunks into one audio object and release the
    /// source.
    pub fn stop(mut self) -> Result<CapturedAudio, CaptureError> {
        let (resp_tx, resp_rx) = mpsc::channel();
        self.cmd_tx
            .send(Cmd::Stop(resp_tx))
            .map_err(|_| CaptureError::Channel)?;

        let samples = resp_rx
            .recv_timeout(Duration::from_secs(3))
            .map_err(|e| match e {
                mpsc::RecvTimeoutError::Timeout => CaptureError::StopTimeout,
                mpsc::RecvTimeoutError::Disconnected => CaptureError::Channel,
            })?;

        self.teardown();
        Ok(CapturedAudio {
            sample_rate_hz: self.sample_rate_hz,
            samples,
        })
    }

    fn teardown(&mut self) {
        // Release the input stream before joining so the worker's sample
        // channel drains and closes.
        self.guard.take();
        if let Some(handle) = self.worker.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for RecordingSession {
    fn drop(&mut self) {
        if self.worker.is_some() {
            let _ = self.cmd_tx.send(Cmd::Cancel);
            self.teardown();
        }
    }
}

fn run_consumer(
    sample_rx: mpsc::Receiver<Vec<f32>>,
    cmd_rx: mpsc::Receiver<Cmd>,
    recorded: Arc<AtomicU64>,
    level_cb: Option<LevelCallback>,
) {
    let mut accumulating = true;
    let mut captured: Vec<f32> = Vec::new();

    loop {
        // Always drain commands promptly, even if the stream is stalled.
        while let Ok(cmd) = cmd_rx.try_recv() {
            match cmd {
                Cmd::Pause => accumulating = false,
                Cmd::Resume => accumulating = true,
                Cmd::Cancel => return,
                Cmd::Stop(resp) => {
                    let _ = resp.send(std::mem::take(&mut captured));
                    return;
                }
            }
        }

        match sample_rx.recv_timeout(Duration::from_millis(50)) {
            Ok(chunk) => {
                if let Some(cb) = &level_cb {
                    cb(&chunk);
                }
                if accumulating {
                    recorded.fetch_add(chunk.len() as u64, Ordering::Relaxed);
                    captured.extend_from_slice(&chunk);
                }
            }
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                // Source is gone; only a terminal command remains meaningful.
                for cmd in cmd_rx.iter() {
                    match cmd {
                        Cmd::Cancel => return,
                        Cmd::Stop(resp) => {
                            let _ = resp.send(std::mem::take(&mut captured));
                            return;
                        }
                        _ => {}
                    }
                }
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    // The consumer checks its command queue at least every 50ms; give it
    // comfortably more than that between state changes.
    const SETTLE: Duration = Duration::from_millis(150);

    struct ReleaseFlag(Arc<AtomicBool>);

    impl Drop for ReleaseFlag {
        fn drop(&mut self) {
            self.0.store(true, Ordering::Relaxed);
        }
    }

    fn wait_for_elapsed(session: &RecordingSession, seconds: u64) {
        for _ in 0..100 {
            if session.elapsed_seconds() >= seconds {
                return;
            }
            std::thread::sleep(Duration::from_millis(10));
        }
        panic!(
            "elapsed never reached {seconds}s (got {})",
            session.elapsed_seconds()
        );
    }

    #[test]
    fn cancel_discards_chunks_and_releases_source() {
        let (tx, rx) = mpsc::channel();
        let released = Arc::new(AtomicBool::new(false));
        let session = RecordingSession::from_source(rx, 4, None)
            .with_guard(ReleaseFlag(released.clone()));

        tx.send(vec![0.1, 0.2, 0.3, 0.4]).unwrap();
        wait_for_elapsed(&session, 1);

        session.cancel();

        assert!(released.load(Ordering::Relaxed), "guard not dropped");
        // The consumer is gone: the source channel is closed.
        assert!(tx.send(vec![0.0]).is_err());
    }

    #[test]
    fn pause_halts_elapsed_and_resume_continues() {
        let (tx, rx) = mpsc::channel();
        let session = RecordingSession::from_source(rx, 4, None);

        tx.send(vec![0.0; 8]).unwrap();
        wait_for_elapsed(&session, 2);

        session.pause().unwrap();
        assert!(session.is_paused());
        std::thread::sleep(SETTLE);

        // Chunks arriving while paused are not accumulated.
        tx.send(vec![0.0; 8]).unwrap();
        std::thread::sleep(SETTLE);
        assert_eq!(session.elapsed_seconds(), 2);

        assert!(!session.toggle_pause().unwrap());
        std::thread::sleep(SETTLE);
        tx.send(vec![0.0; 4]).unwrap();
        wait_for_elapsed(&session, 3);

        let audio = session.stop().unwrap();
        assert!(!audio.is_empty());
        assert_eq!(audio.sample_rate_hz, 4);
        // 2s before the pause + 1s after it.
        assert_eq!(audio.samples.len(), 12);
    }

    #[test]
    fn stop_after_two_ticks_yields_audio() {
        let (tx, rx) = mpsc::channel();
        let session = RecordingSession::from_source(rx, 4, None);

        tx.send(vec![0.5; 4]).unwrap();
        tx.send(vec![0.5; 4]).unwrap();
        wait_for_elapsed(&session, 2);

        let audio = session.stop().unwrap();
        assert!(audio.samples.len() >= 8);
        assert!(audio.duration_seconds() >= 2.0);
    }

    #[test]
    fn level_callback_fires_even_while_paused() {
        let (tx, rx) = mpsc::channel();
        let seen: Arc<Mutex<Vec<usize>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_cb = seen.clone();
        let cb: LevelCallback = Arc::new(move |chunk: &[f32]| {
            seen_cb.lock().unwrap().push(chunk.len());
        });

        let session = RecordingSession::from_source(rx, 4, Some(cb));
        session.pause().unwrap();
        std::thread::sleep(SETTLE);

        tx.send(vec![0.0; 4]).unwrap();
        std::thread::sleep(SETTLE);

        assert_eq!(seen.lock().unwrap().as_slice(), &[4]);
        assert_eq!(session.elapsed_seconds(), 0);
        session.cancel();
    }

    #[test]
    fn dropping_an_active_session_releases_the_source() {
        let (tx, rx) = mpsc::channel();
        let released = Arc::new(AtomicBool::new(false));
        let session = RecordingSession::from_source(rx, 4, None)
            .with_guard(ReleaseFlag(released.clone()));

        drop(session);
        assert!(released.load(Ordering::Relaxed));
        assert!(tx.send(vec![0.0]).is_err());
    }

    #[test]
    fn stop_works_after_source_disconnects() {
        let (tx, rx) = mpsc::channel();
        let session = RecordingSession::from_source(rx, 4, None);
        tx.send(vec![0.25; 4]).unwrap();
        wait_for_elapsed(&session, 1);
        drop(tx);

        let audio = session.stop().unwrap();
        assert_eq!(audio.samples.len(), 4);
    }
}
