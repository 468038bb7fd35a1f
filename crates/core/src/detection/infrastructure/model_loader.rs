use std::path::Path;
use std::sync::{Arc, Mutex};
use std::thread;

use crossbeam_channel::{Receiver, TryRecvError};

use crate::detection::domain::errors::ModelLoadError;
use crate::detection::domain::object_detector::ObjectDetector;
use crate::detection::infrastructure::model_resolver::{self, ModelSource, ProgressFn};
use crate::detection::infrastructure::onnx_yolo_detector::OnnxYoloDetector;

pub type LoadResult = Result<Box<dyn ObjectDetector>, ModelLoadError>;

/// Builds a detector from a resolved model file.
pub type DetectorFactory =
    Box<dyn FnOnce(&Path) -> Result<Box<dyn ObjectDetector>, ModelLoadError> + Send>;

/// Resolves and loads the detection model in the background at startup.
pub struct ModelLoader;

impl ModelLoader {
    /// Start loading the YOLO detector for `source`.
    ///
    /// `confidence` is the model-side floor applied before NMS.
    pub fn spawn(source: ModelSource, confidence: f64) -> PendingModel {
        Self::spawn_with(
            source,
            Box::new(move |path| {
                OnnxYoloDetector::new(path, confidence)
                    .map(|d| Box::new(d) as Box<dyn ObjectDetector>)
                    .map_err(|e| ModelLoadError::Session(e.to_string()))
            }),
        )
    }

    /// Start loading with a custom detector factory.
    pub fn spawn_with(source: ModelSource, factory: DetectorFactory) -> PendingModel {
        let (tx, rx) = crossbeam_channel::bounded::<LoadResult>(1);
        let progress = Arc::new(Mutex::new((0u64, 0u64)));
        let progress_slot = progress.clone();

        let spawned = thread::Builder::new()
            .name("lookout-model-loader".into())
            .spawn(move || {
                let on_progress: ProgressFn = Box::new(move |downloaded, total| {
                    if let Ok(mut p) = progress_slot.lock() {
                        *p = (downloaded, total);
                    }
                });
                let result = model_resolver::resolve(&source, Some(on_progress))
                    .map_err(ModelLoadError::from)
                    .and_then(|path| factory(&path));
                let _ = tx.send(result);
            });
        if let Err(e) = spawned {
            log::error!("Failed to spawn model loader: {e}");
        }

        PendingModel {
            rx,
            progress,
            done: false,
        }
    }
}

/// Handle to a model that is still loading.
pub struct PendingModel {
    rx: Receiver<LoadResult>,
    progress: Arc<Mutex<(u64, u64)>>,
    done: bool,
}

impl PendingModel {
    /// The finished result, or `None` while loading is still in progress.
    /// Yields `Some` exactly once.
    pub fn try_take(&mut self) -> Option<LoadResult> {
        if self.done {
            return None;
        }
        match self.rx.try_recv() {
            Ok(result) => {
                self.done = true;
                Some(result)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.done = true;
                Some(Err(ModelLoadError::Abandoned))
            }
        }
    }

    /// Blocks until loading finishes, forwarding download progress.
    pub fn wait(self, on_progress: &dyn Fn(u64, u64)) -> LoadResult {
        if self.done {
            return Err(ModelLoadError::Abandoned);
        }
        let mut last = (0, 0);
        loop {
            match self.rx.recv_timeout(std::time::Duration::from_millis(100)) {
                Ok(result) => return result,
                Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                    return Err(ModelLoadError::Abandoned)
                }
                Err(crossbeam_channel::RecvTimeoutError::Timeout) => {
                    let current = self.progress();
                    if current != last && current.1 > 0 {
                        on_progress(current.0, current.1);
                        last = current;
                    }
                }
            }
        }
    }

    /// Latest `(downloaded, total)` byte counts; `total` is 0 when unknown.
    pub fn progress(&self) -> (u64, u64) {
        self.progress.lock().map(|p| *p).unwrap_or((0, 0))
    }
}
