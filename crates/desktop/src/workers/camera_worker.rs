use std::thread;

use crossbeam_channel::Receiver;

use lookout_core::capture::domain::capture_request::{CaptureRequest, FacingDirection};
use lookout_core::pipeline::live_pipeline::LivePipeline;
use lookout_core::pipeline::pipeline_error::PipelineError;

/// Camera work that waits on the device: opening it, or releasing the old
/// one and opening the other.
pub enum CameraJob {
    Start(CaptureRequest),
    Flip,
}

/// The pipeline handed back once its camera job has finished.
pub struct CameraOutcome {
    pub pipeline: LivePipeline,
    pub result: Result<FacingDirection, PipelineError>,
}

/// Run `job` on its own thread. The pipeline travels with the job and comes
/// back through the returned receiver, whether the camera opened or not.
pub fn spawn(mut pipeline: LivePipeline, job: CameraJob) -> Receiver<CameraOutcome> {
    let (tx, rx) = crossbeam_channel::bounded(1);

    thread::spawn(move || {
        let result = match job {
            CameraJob::Start(request) => pipeline.start(request).map(|()| request.facing),
            CameraJob::Flip => pipeline.flip_camera(),
        };
        // A closed window drops the receiver; the pipeline tears down here.
        let _ = tx.send(CameraOutcome { pipeline, result });
    });

    rx
}
