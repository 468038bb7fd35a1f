use std::time::Instant;

use crossbeam_channel::{Receiver, TryRecvError};
use iced::widget::{button, canvas, center, column, container, image, stack, text, Space};
use iced::{ContentFit, Element, Length, Subscription, Task, Theme};

use lookout_core::capture::infrastructure::ffmpeg_camera::FfmpegCameraBackend;
use lookout_core::detection::domain::object_detector::ObjectDetector;
use lookout_core::detection::infrastructure::model_loader::{ModelLoader, PendingModel};
use lookout_core::detection::infrastructure::onnx_yolo_detector::DEFAULT_MODEL_CONFIDENCE;
use lookout_core::pipeline::live_pipeline::LivePipeline;
use lookout_core::pipeline::pipeline_config::PipelineConfig;
use lookout_core::rendering::domain::drawing_surface::DrawingSurface;
use lookout_core::rendering::infrastructure::display_list::DisplayList;
use lookout_core::shared::constants::{CAMERA_UNAVAILABLE_MESSAGE, MODEL_UNAVAILABLE_MESSAGE};

use crate::settings::Settings;
use crate::widgets::overlay_canvas::OverlayCanvas;
use crate::workers::camera_worker::{self, CameraJob, CameraOutcome};

pub const WINDOW_WIDTH: f32 = 840.0;
pub const WINDOW_HEIGHT: f32 = 720.0;

// ---------------------------------------------------------------------------
// Message
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub enum Message {
    /// The window is about to draw a new frame.
    Frame(Instant),
    FlipCamera,
}

enum ModelStatus {
    Loading(PendingModel),
    /// Loaded while the camera worker holds the pipeline.
    Loaded(Box<dyn ObjectDetector>),
    Ready,
    Failed,
}

enum CameraStatus {
    /// The camera worker owns the pipeline until it reports back.
    Acquiring(Receiver<CameraOutcome>),
    Live,
    Unavailable,
}

// ---------------------------------------------------------------------------
// App
// ---------------------------------------------------------------------------

pub struct App {
    settings: Settings,
    pipeline: Option<LivePipeline>,
    model: ModelStatus,
    camera: CameraStatus,
    overlay: DisplayList,
    /// Latest video frame, keyed by its capture sequence.
    video: Option<(u64, image::Handle)>,
}

impl App {
    pub fn new() -> (Self, Task<Message>) {
        let settings = Settings::load();
        let config = valid_config(&settings);

        let model = ModelStatus::Loading(ModelLoader::spawn(
            config.model.clone(),
            DEFAULT_MODEL_CONFIDENCE,
        ));

        let backend = FfmpegCameraBackend::new(config.devices.clone());
        let camera = match LivePipeline::new(Box::new(backend), &config) {
            Ok(pipeline) => CameraStatus::Acquiring(camera_worker::spawn(
                pipeline,
                CameraJob::Start(config.capture),
            )),
            Err(e) => {
                log::error!("Could not set up live pipeline: {e}");
                CameraStatus::Unavailable
            }
        };

        (
            Self {
                settings,
                pipeline: None,
                model,
                camera,
                overlay: DisplayList::new(),
                video: None,
            },
            Task::none(),
        )
    }

    pub fn update(&mut self, message: Message) -> Task<Message> {
        match message {
            Message::Frame(_) => {
                self.poll_camera();
                self.poll_model();
                if let Some(pipeline) = self.pipeline.as_mut() {
                    pipeline.tick(Some(&mut self.overlay));

                    if let Some(frame) = pipeline.current_frame() {
                        let seen = self.video.as_ref().map(|(seq, _)| *seq);
                        if seen != Some(frame.sequence()) {
                            let handle =
                                image::Handle::from_rgba(frame.width(), frame.height(), frame.to_rgba());
                            self.video = Some((frame.sequence(), handle));
                        }
                    }
                }
            }
            Message::FlipCamera => {
                if let Some(pipeline) = self.pipeline.take() {
                    self.overlay.clear();
                    self.video = None;
                    self.camera =
                        CameraStatus::Acquiring(camera_worker::spawn(pipeline, CameraJob::Flip));
                }
            }
        }
        Task::none()
    }

    fn poll_camera(&mut self) {
        let CameraStatus::Acquiring(rx) = &self.camera else {
            return;
        };
        match rx.try_recv() {
            Ok(outcome) => {
                self.pipeline = Some(outcome.pipeline);
                self.camera = match outcome.result {
                    Ok(facing) => {
                        log::info!("{facing} camera live");
                        CameraStatus::Live
                    }
                    Err(e) => {
                        log::error!("{e}");
                        CameraStatus::Unavailable
                    }
                };
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => {
                log::error!("Camera worker stopped without returning the pipeline");
                self.camera = CameraStatus::Unavailable;
            }
        }
    }

    fn poll_model(&mut self) {
        if let ModelStatus::Loading(pending) = &mut self.model {
            match pending.try_take() {
                None => return,
                Some(Ok(detector)) => self.model = ModelStatus::Loaded(detector),
                Some(Err(e)) => {
                    log::error!("{MODEL_UNAVAILABLE_MESSAGE}: {e}");
                    self.model = ModelStatus::Failed;
                    return;
                }
            }
        }

        let Some(pipeline) = self.pipeline.as_mut() else {
            return;
        };
        if matches!(self.model, ModelStatus::Loaded(_)) {
            if let ModelStatus::Loaded(detector) =
                std::mem::replace(&mut self.model, ModelStatus::Ready)
            {
                pipeline.install_model(detector);
            }
        }
    }

    pub fn view(&self) -> Element<'_, Message> {
        let video: Element<'_, Message> = match &self.video {
            Some((_, handle)) => image(handle.clone())
                .content_fit(ContentFit::Contain)
                .width(Length::Fill)
                .height(Length::Fill)
                .into(),
            None => Space::new().width(Length::Fill).height(Length::Fill).into(),
        };
        let overlay = canvas(OverlayCanvas::new(&self.overlay))
            .width(Length::Fill)
            .height(Length::Fill);
        let mut layers = stack![video, overlay];

        if let Some(status) = self.status_text() {
            layers = layers.push(center(text(status).size(20)));
        }

        let flip = button(text("Flip The Camera"))
            .on_press_maybe(self.pipeline.is_some().then_some(Message::FlipCamera))
            .padding([8, 16]);

        column![
            container(layers).height(Length::Fill),
            container(flip).center_x(Length::Fill).padding(12),
        ]
        .height(Length::Fill)
        .into()
    }

    fn status_text(&self) -> Option<String> {
        match (&self.camera, &self.model) {
            (CameraStatus::Unavailable, _) => Some(CAMERA_UNAVAILABLE_MESSAGE.to_string()),
            (_, ModelStatus::Failed) => Some(MODEL_UNAVAILABLE_MESSAGE.to_string()),
            (_, ModelStatus::Loading(pending)) => {
                let (downloaded, total) = pending.progress();
                if total > 0 && downloaded < total {
                    Some(format!("Loading... {}%", downloaded * 100 / total))
                } else {
                    Some("Loading...".to_string())
                }
            }
            (CameraStatus::Acquiring(_), _) | (_, ModelStatus::Loaded(_)) => {
                Some("Loading...".to_string())
            }
            (CameraStatus::Live, ModelStatus::Ready) => None,
        }
    }

    pub fn theme(&self) -> Theme {
        if self.settings.dark_mode {
            Theme::Dark
        } else {
            Theme::Light
        }
    }

    pub fn subscription(&self) -> Subscription<Message> {
        if self.pipeline.is_some() || matches!(self.camera, CameraStatus::Acquiring(_)) {
            iced::window::frames().map(Message::Frame)
        } else {
            Subscription::none()
        }
    }
}

fn valid_config(settings: &Settings) -> PipelineConfig {
    let config = settings.to_config(WINDOW_WIDTH as u32);
    match config.validate() {
        Ok(()) => config,
        Err(e) => {
            log::warn!("Invalid settings ({e}), using defaults");
            Settings::default().to_config(WINDOW_WIDTH as u32)
        }
    }
}
