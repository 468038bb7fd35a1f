use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use crossbeam_channel::Sender;

use crate::capture::domain::acquisition_error::AcquisitionError;
use crate::capture::domain::camera_backend::CameraBackend;
use crate::capture::domain::capture_request::{CaptureRequest, FacingDirection};
use crate::capture::domain::frame_source::FrameSource;
use crate::shared::frame::Frame;

use super::camera_devices::CameraDevices;
use super::latest_frame::LatestFrame;

/// Opens cameras through libavdevice and decodes them on a worker thread.
///
/// The ffmpeg input context never leaves the worker: it is opened there, and
/// the outcome is reported back before `open` returns.
pub struct FfmpegCameraBackend {
    devices: CameraDevices,
}

impl FfmpegCameraBackend {
    pub fn new(devices: CameraDevices) -> Self {
        Self { devices }
    }
}

impl Default for FfmpegCameraBackend {
    fn default() -> Self {
        Self::new(CameraDevices::default())
    }
}

impl CameraBackend for FfmpegCameraBackend {
    fn open(&mut self, request: &CaptureRequest) -> Result<Box<dyn FrameSource>, AcquisitionError> {
        let device = self
            .devices
            .device_for(request.facing)
            .ok_or(AcquisitionError::NoDevice(request.facing))?
            .to_string();
        let input_format = self.devices.input_format.clone();
        let request = *request;

        let latest = Arc::new(LatestFrame::new());
        let stop = Arc::new(AtomicBool::new(false));
        let (opened_tx, opened_rx) = crossbeam_channel::bounded(1);

        let worker = {
            let latest = latest.clone();
            let stop = stop.clone();
            std::thread::Builder::new()
                .name(format!("capture-{}", request.facing))
                .spawn(move || {
                    run_capture(
                        &device,
                        input_format.as_deref(),
                        &request,
                        opened_tx,
                        &latest,
                        &stop,
                    )
                })
                .map_err(|e| AcquisitionError::Backend(e.to_string()))?
        };

        let (width, height) = match opened_rx.recv() {
            Ok(Ok(size)) => size,
            Ok(Err(e)) => {
                let _ = worker.join();
                return Err(e);
            }
            Err(_) => {
                let _ = worker.join();
                return Err(AcquisitionError::Backend(
                    "capture worker exited before opening the device".to_string(),
                ));
            }
        };
        log::info!("Camera opened at {width}x{height}");

        Ok(Box::new(FfmpegCameraSource {
            latest,
            stop,
            worker: Some(worker),
        }))
    }
}

/// A live ffmpeg capture. Frames are published into a single-slot cell.
pub struct FfmpegCameraSource {
    latest: Arc<LatestFrame>,
    stop: Arc<AtomicBool>,
    worker: Option<JoinHandle<()>>,
}

impl FrameSource for FfmpegCameraSource {
    fn is_ready(&self) -> bool {
        self.latest.get().is_some()
    }

    fn dimensions(&self) -> Option<(u32, u32)> {
        self.latest.get().map(|f| f.dimensions())
    }

    fn current_frame(&self) -> Option<Frame> {
        self.latest.get()
    }

    fn release(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        // The worker notices the flag after its current packet read returns.
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                log::warn!("Capture worker panicked");
            }
        }
        self.latest.clear();
    }
}

impl Drop for FfmpegCameraSource {
    fn drop(&mut self) {
        self.release();
    }
}

// ---------------------------------------------------------------------------
// Worker
// ---------------------------------------------------------------------------

type OpenResult = Result<(u32, u32), AcquisitionError>;

fn run_capture(
    device: &str,
    input_format: Option<&str>,
    request: &CaptureRequest,
    opened_tx: Sender<OpenResult>,
    latest: &LatestFrame,
    stop: &AtomicBool,
) {
    let opened = match open_device(device, input_format, request) {
        Ok(opened) => opened,
        Err(e) => {
            let _ = opened_tx.send(Err(e));
            return;
        }
    };
    let OpenedDevice {
        mut ictx,
        mut decoder,
        stream_index,
        pace,
    } = opened;

    if opened_tx
        .send(Ok((decoder.width(), decoder.height())))
        .is_err()
    {
        return;
    }

    let mut converter = RgbConverter::default();
    let mut sequence: u64 = 0;
    let mut next_due = Instant::now();

    for (stream, packet) in ictx.packets() {
        if stop.load(Ordering::Relaxed) {
            break;
        }
        if stream.index() != stream_index {
            continue;
        }
        if let Err(e) = decoder.send_packet(&packet) {
            log::debug!("Dropping undecodable packet: {e}");
            continue;
        }

        let mut decoded = ffmpeg_next::util::frame::video::Video::empty();
        while decoder.receive_frame(&mut decoded).is_ok() {
            match converter.convert(&decoded, sequence) {
                Ok(Some(frame)) => {
                    latest.publish(frame);
                    sequence += 1;
                }
                Ok(None) => continue,
                Err(e) => log::warn!("Frame conversion failed: {e}"),
            }
            if let Some(interval) = pace {
                next_due += interval;
                let now = Instant::now();
                if next_due > now {
                    std::thread::sleep(next_due - now);
                } else {
                    next_due = now;
                }
            }
        }
    }
    log::debug!("Capture worker for {device} stopped after {sequence} frames");
}

struct OpenedDevice {
    ictx: ffmpeg_next::format::context::Input,
    decoder: ffmpeg_next::decoder::Video,
    stream_index: usize,
    /// Set for file inputs, which would otherwise decode faster than real time.
    pace: Option<Duration>,
}

fn open_device(
    device: &str,
    input_format: Option<&str>,
    request: &CaptureRequest,
) -> Result<OpenedDevice, AcquisitionError> {
    ffmpeg_next::init().map_err(|e| AcquisitionError::Backend(e.to_string()))?;
    ffmpeg_next::device::register_all();

    let ictx = match input_format {
        Some(name) => {
            let format = ffmpeg_next::device::input::video()
                .find(|f| f.name() == name)
                .ok_or_else(|| {
                    AcquisitionError::Backend(format!("input format '{name}' not available"))
                })?;
            let mut options = ffmpeg_next::Dictionary::new();
            options.set(
                "video_size",
                &format!("{}x{}", request.width_hint, request.height_hint),
            );
            match ffmpeg_next::format::open_with(
                Path::new(device),
                &ffmpeg_next::format::Format::Input(format),
                options,
            ) {
                Ok(ffmpeg_next::format::context::Context::Input(ictx)) => ictx,
                Ok(_) => {
                    return Err(AcquisitionError::Backend(format!(
                        "{device} did not open as an input"
                    )))
                }
                Err(e) => return Err(classify(device, request.facing, e)),
            }
        }
        None => ffmpeg_next::format::input(Path::new(device)).map_err(|e| classify(device, request.facing, e))?,
    };

    let stream = ictx
        .streams()
        .best(ffmpeg_next::media::Type::Video)
        .ok_or(AcquisitionError::NoDevice(request.facing))?;
    let stream_index = stream.index();

    let codec_ctx = ffmpeg_next::codec::context::Context::from_parameters(stream.parameters())
        .map_err(|e| AcquisitionError::Backend(e.to_string()))?;
    let decoder = codec_ctx
        .decoder()
        .video()
        .map_err(|e| AcquisitionError::Backend(e.to_string()))?;

    let pace = if input_format.is_none() {
        let rate = stream.rate();
        (rate.numerator() > 0 && rate.denominator() > 0).then(|| {
            Duration::from_secs_f64(rate.denominator() as f64 / rate.numerator() as f64)
        })
    } else {
        None
    };

    Ok(OpenedDevice {
        ictx,
        decoder,
        stream_index,
        pace,
    })
}

fn classify(device: &str, facing: FacingDirection, error: ffmpeg_next::Error) -> AcquisitionError {
    if let ffmpeg_next::Error::Other { errno } = error {
        if errno == ENOENT || errno == ENODEV {
            log::warn!("{device}: no such device");
            return AcquisitionError::NoDevice(facing);
        }
    }
    AcquisitionError::from_backend_message(format!("{device}: {error}"))
}

const ENOENT: i32 = 2;
const ENODEV: i32 = 19;

/// Converts decoded frames to packed RGB24, rebuilding the scaler whenever
/// the source format or size changes. Frames without a usable size yield
/// nothing, so playback only starts once the device reports real dimensions.
#[derive(Default)]
struct RgbConverter {
    scaler: Option<ffmpeg_next::software::scaling::Context>,
    key: Option<(ffmpeg_next::format::Pixel, u32, u32)>,
}

impl RgbConverter {
    fn convert(
        &mut self,
        decoded: &ffmpeg_next::util::frame::video::Video,
        sequence: u64,
    ) -> Result<Option<Frame>, ffmpeg_next::Error> {
        let width = decoded.width();
        let height = decoded.height();
        // Zero-sized frames show up while some devices negotiate a format.
        if width == 0 || height == 0 {
            return Ok(None);
        }
        let key = (decoded.format(), width, height);

        if self.key != Some(key) {
            self.scaler = Some(ffmpeg_next::software::scaling::Context::get(
                key.0,
                width,
                height,
                ffmpeg_next::format::Pixel::RGB24,
                width,
                height,
                ffmpeg_next::software::scaling::Flags::BILINEAR,
            )?);
            self.key = Some(key);
        }
        let Some(scaler) = self.scaler.as_mut() else {
            return Err(ffmpeg_next::Error::Bug);
        };

        let mut rgb_frame = ffmpeg_next::util::frame::video::Video::empty();
        scaler.run(decoded, &mut rgb_frame)?;
        let pixels = extract_rgb_pixels(&rgb_frame, width, height);
        Ok(Some(Frame::new(pixels, width, height, 3, sequence)))
    }
}

/// Copies RGB rows out of an ffmpeg frame, dropping per-row stride padding.
fn extract_rgb_pixels(
    rgb_frame: &ffmpeg_next::util::frame::video::Video,
    width: u32,
    height: u32,
) -> Vec<u8> {
    let stride = rgb_frame.stride(0);
    let data = rgb_frame.data(0);
    let w = width as usize;
    let h = height as usize;

    let mut pixels = Vec::with_capacity(w * h * 3);
    for row in 0..h {
        let row_start = row * stride;
        pixels.extend_from_slice(&data[row_start..row_start + w * 3]);
    }
    pixels
}
