//
// CPAL-based microphone source for the chat widget.
//
// The microphone side only opens the device and pumps mono f32 chunks into
// a channel; all recording state (pause, stop, cancel) lives in
// `RecordingSession`.

use std::sync::{mpsc, Arc, Mutex};
use std::time::Duration;

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, Sample, SampleFormat, SizedSample, Stream};

use crate::session::{LevelCallback, RecordingSession};

#[derive(Debug, thiserror::Error)]
pub enum CaptureError {
    #[error("no input device found")]
    NoInputDevice,

    #[error("failed to list input devices: {0}")]
    ListDevices(#[from] cpal::DevicesError),

    #[error("failed to get default config: {0}")]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),

    #[error("failed to build input stream: {0}")]
    BuildStream(#[from] cpal::BuildStreamError),

    #[error("failed to play stream: {0}")]
    PlayStream(#[from] cpal::PlayStreamError),

    #[error("audio worker failed: {0}")]
    Worker(String),

    #[error("audio worker startup timeout")]
    WorkerTimeout,

    #[error("recording stop timed out")]
    StopTimeout,

    #[error("failed to resample: {0}")]
    Resample(#[from] anyhow::Error),

    #[error("invalid capture transition: {0}")]
    InvalidTransition(&'static str),

    #[error("internal channel error")]
    Channel,
}

enum WorkerMsg {
    Ready,
    Error(String),
}

/// Keeps the CPAL stream alive until dropped.
struct StreamHandle {
    shutdown_tx: mpsc::Sender<()>,
    join: Option<std::thread::JoinHandle<()>>,
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(());
        if let Some(h) = self.join.take() {
            let _ = h.join();
        }
    }
}

pub struct Microphone;

impl Microphone {
    pub fn list_input_device_names() -> Result<Vec<String>, CaptureError> {
        let host = cpal::default_host();
        let mut out = Vec::new();
        for dev in host.input_devices()? {
            if let Ok(name) = dev.name() {
                out.push(name);
            }
        }
        out.sort();
        out.dedup();
        Ok(out)
    }

    /// Open an input device and start a recording session over it.
    ///
    /// A preferred device name falls back to the system default when it is
    /// not present. The session accumulates immediately.
    pub fn record(
        device_name: Option<&str>,
        level_cb: Option<LevelCallback>,
    ) -> Result<RecordingSession, CaptureError> {
        let device = open_device(device_name)?;

        // Take the device's default input config; resampling to the upload
        // rate happens at send time.
        let default_cfg = device.default_input_config()?;
        let sample_rate_hz = default_cfg.sample_rate().0;

        let (sample_tx, sample_rx) = mpsc::channel::<Vec<f32>>();
        let (worker_tx, worker_rx) = mpsc::channel::<WorkerMsg>();
        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();

        let join = std::thread::spawn(move || {
            let config = default_cfg;
            let sample_format = config.sample_format();
            let channels = config.channels() as usize;

            let stream = match sample_format {
                SampleFormat::F32 => {
                    build_input_stream::<f32>(&device, &config.clone().into(), channels, sample_tx)
                }
                SampleFormat::I16 => {
                    build_input_stream::<i16>(&device, &config.clone().into(), channels, sample_tx)
                }
                SampleFormat::U16 => {
                    build_input_stream::<u16>(&device, &config.clone().into(), channels, sample_tx)
                }
                SampleFormat::I8 => {
                    build_input_stream::<i8>(&device, &config.clone().into(), channels, sample_tx)
                }
                SampleFormat::U8 => {
                    build_input_stream::<u8>(&device, &config.clone().into(), channels, sample_tx)
                }
                SampleFormat::I32 => {
                    build_input_stream::<i32>(&device, &config.clone().into(), channels, sample_tx)
                }
                SampleFormat::U32 => {
                    build_input_stream::<u32>(&device, &config.clone().into(), channels, sample_tx)
                }
                SampleFormat::F64 => {
                    build_input_stream::<f64>(&device, &config.clone().into(), channels, sample_tx)
                }
                _ => build_input_stream::<f32>(&device, &config.clone().into(), channels, sample_tx),
            };

            let stream = match stream {
                Ok(s) => s,
                Err(e) => {
                    let _ = worker_tx.send(WorkerMsg::Error(format!("build stream: {e}")));
                    log::error!("Audio stream build failed: {e}");
                    return;
                }
            };

            if let Err(e) = stream.play() {
                let _ = worker_tx.send(WorkerMsg::Error(format!("play stream: {e}")));
                log::error!("Audio stream play failed: {e}");
                return;
            }

            let _ = worker_tx.send(WorkerMsg::Ready);

            // Hold the stream until the session tears down.
            let _ = shutdown_rx.recv();
            drop(stream);
        });

        // Block briefly until the worker has either started the stream or failed.
        match worker_rx.recv_timeout(Duration::from_secs(2)) {
            Ok(WorkerMsg::Ready) => {}
            Ok(WorkerMsg::Error(e)) => return Err(CaptureError::Worker(e)),
            Err(mpsc::RecvTimeoutError::Timeout) => return Err(CaptureError::WorkerTimeout),
            Err(_) => return Err(CaptureError::Channel),
        }

        let guard = StreamHandle {
            shutdown_tx,
            join: Some(join),
        };

        Ok(RecordingSession::from_source(sample_rx, sample_rate_hz, level_cb).with_guard(guard))
    }
}

fn open_device(device_name: Option<&str>) -> Result<Device, CaptureError> {
    let host = cpal::default_host();

    if let Some(needle) = device_name {
        let needle = needle.trim();
        if !needle.is_empty() {
            if let Ok(devices) = host.input_devices() {
                for dev in devices {
                    if let Ok(name) = dev.name() {
                        if name == needle {
                            log::info!("Using input device: {name}");
                            return Ok(dev);
                        }
                    }
                }
            }

            log::warn!("Preferred input device not found, falling back to default: {needle}");
        }
    }

    host.default_input_device().ok_or(CaptureError::NoInputDevice)
}

fn build_input_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    channels: usize,
    sample_tx: mpsc::Sender<Vec<f32>>,
) -> Result<Stream, cpal::BuildStreamError>
where
    T: Sample + SizedSample + Send + 'static,
    f32: cpal::FromSample<T>,
{
    let output_buffer: Arc<Mutex<Vec<f32>>> = Arc::new(Mutex::new(Vec::new()));
    let out_buf = output_buffer.clone();

    let cb = move |data: &[T], _: &cpal::InputCallbackInfo| {
        let mut buf = out_buf.lock().unwrap();
        buf.clear();

        if channels == 1 {
            buf.extend(data.iter().map(|&s| s.to_sample::<f32>()));
        } else {
            for frame in data.chunks_exact(channels) {
                let mono =
                    frame.iter().map(|&s| s.to_sample::<f32>()).sum::<f32>() / channels as f32;
                buf.push(mono);
            }
        }

        let _ = sample_tx.send(buf.clone());
    };

    device.build_input_stream(
        config,
        cb,
        |err| {
            // These errors are crucial to debug “recording started but silent”.
            log::error!("Audio stream error: {err}");
        },
        None,
    )
}
