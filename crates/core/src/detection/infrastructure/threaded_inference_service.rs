use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender, TrySendError};

use crate::detection::domain::errors::DetectionError;
use crate::detection::domain::inference_service::{
    InferenceOutcome, InferenceRequest, InferenceService,
};
use crate::detection::domain::object_detector::ObjectDetector;

/// Runs an [`ObjectDetector`] on a dedicated worker thread.
///
/// The request channel holds a single frame, so a caller that submits while
/// the model is still busy with a queued request gets
/// [`DetectionError::Busy`] instead of piling up work. Completions are
/// buffered until the next [`InferenceService::poll_completed`].
pub struct ThreadedInferenceService {
    requests: Option<Sender<InferenceRequest>>,
    completions: Receiver<InferenceOutcome>,
    worker: Option<JoinHandle<()>>,
}

impl ThreadedInferenceService {
    pub fn spawn(detector: Box<dyn ObjectDetector>) -> Self {
        let (request_tx, request_rx) = crossbeam_channel::bounded::<InferenceRequest>(1);
        let (outcome_tx, outcome_rx) = crossbeam_channel::unbounded::<InferenceOutcome>();

        let worker = std::thread::Builder::new()
            .name("lookout-inference".into())
            .spawn(move || run_worker(detector, request_rx, outcome_tx))
            .map_err(|e| log::error!("Failed to spawn inference worker: {e}"))
            .ok();

        Self {
            requests: worker.as_ref().map(|_| request_tx),
            completions: outcome_rx,
            worker,
        }
    }
}

fn run_worker(
    mut detector: Box<dyn ObjectDetector>,
    requests: Receiver<InferenceRequest>,
    outcomes: Sender<InferenceOutcome>,
) {
    for request in requests.iter() {
        let (frame_width, frame_height) = request.frame.dimensions();
        let result = detector.detect(&request.frame);
        let outcome = InferenceOutcome {
            ticket: request.ticket,
            frame_width,
            frame_height,
            result,
        };
        if outcomes.send(outcome).is_err() {
            break;
        }
    }
    log::debug!("Inference worker exiting");
}

impl InferenceService for ThreadedInferenceService {
    fn submit(&mut self, request: InferenceRequest) -> Result<(), DetectionError> {
        let tx = self.requests.as_ref().ok_or(DetectionError::Disconnected)?;
        tx.try_send(request).map_err(|e| match e {
            TrySendError::Full(_) => DetectionError::Busy,
            TrySendError::Disconnected(_) => DetectionError::Disconnected,
        })
    }

    fn poll_completed(&mut self) -> Vec<InferenceOutcome> {
        self.completions.try_iter().collect()
    }
}

impl Drop for ThreadedInferenceService {
    fn drop(&mut self) {
        // Closing the request side ends the worker loop once the current
        // call returns. The worker is detached rather than joined so teardown
        // never waits on the model.
        self.requests.take();
        drop(self.worker.take());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    use crossbeam_channel::bounded;

    use crate::detection::domain::inference_service::InferenceTicket;
    use crate::shared::detection::{BoundingBox, Detection, DetectionBatch};
    use crate::shared::frame::Frame;

    struct LabelDetector(&'static str);

    impl ObjectDetector for LabelDetector {
        fn detect(&mut self, frame: &Frame) -> Result<DetectionBatch, DetectionError> {
            Ok(DetectionBatch::new(vec![Detection::new(
                self.0,
                0.9,
                BoundingBox::new(0.0, 0.0, frame.width() as f64, frame.height() as f64),
            )]))
        }
    }

    /// Blocks inside `detect` until the test releases it.
    struct GatedDetector {
        gate: Receiver<()>,
    }

    impl ObjectDetector for GatedDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<DetectionBatch, DetectionError> {
            let _ = self.gate.recv();
            Ok(DetectionBatch::default())
        }
    }

    struct FailingDetector;

    impl ObjectDetector for FailingDetector {
        fn detect(&mut self, _frame: &Frame) -> Result<DetectionBatch, DetectionError> {
            Err(DetectionError::Inference("boom".into()))
        }
    }

    fn request(sequence: u64, width: u32, height: u32) -> InferenceRequest {
        InferenceRequest {
            ticket: InferenceTicket {
                generation: 1,
                sequence,
            },
            frame: Frame::new(vec![0u8; (width * height * 3) as usize], width, height, 3, sequence),
        }
    }

    fn poll_until(service: &mut ThreadedInferenceService, count: usize) -> Vec<InferenceOutcome> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut outcomes = Vec::new();
        while outcomes.len() < count && Instant::now() < deadline {
            outcomes.extend(service.poll_completed());
            std::thread::sleep(Duration::from_millis(5));
        }
        outcomes
    }

    #[test]
    fn test_outcome_carries_ticket_and_frame_size() {
        let mut service = ThreadedInferenceService::spawn(Box::new(LabelDetector("person")));
        service.submit(request(4, 8, 6)).unwrap();

        let outcomes = poll_until(&mut service, 1);

        assert_eq!(outcomes.len(), 1);
        let outcome = &outcomes[0];
        assert_eq!(outcome.ticket.sequence, 4);
        assert_eq!((outcome.frame_width, outcome.frame_height), (8, 6));
        let batch = outcome.result.as_ref().unwrap();
        assert_eq!(batch.iter().next().unwrap().class_label(), "person");
    }

    #[test]
    fn test_failure_is_reported_as_outcome() {
        let mut service = ThreadedInferenceService::spawn(Box::new(FailingDetector));
        service.submit(request(1, 2, 2)).unwrap();

        let outcomes = poll_until(&mut service, 1);

        assert_eq!(
            outcomes[0].result,
            Err(DetectionError::Inference("boom".into()))
        );
    }

    #[test]
    fn test_submit_reports_busy_when_queue_is_full() {
        let (gate_tx, gate_rx) = bounded::<()>(0);
        let mut service = ThreadedInferenceService::spawn(Box::new(GatedDetector { gate: gate_rx }));

        // First request is picked up by the worker and blocks in detect.
        service.submit(request(1, 2, 2)).unwrap();
        // Second one waits in the channel; keep trying until the worker has
        // taken the first so the slot is free.
        let deadline = Instant::now() + Duration::from_secs(5);
        while service.submit(request(2, 2, 2)).is_err() && Instant::now() < deadline {
            std::thread::sleep(Duration::from_millis(5));
        }

        assert_eq!(service.submit(request(3, 2, 2)), Err(DetectionError::Busy));

        gate_tx.send(()).unwrap();
        gate_tx.send(()).unwrap();
        let outcomes = poll_until(&mut service, 2);
        let sequences: Vec<u64> = outcomes.iter().map(|o| o.ticket.sequence).collect();
        assert_eq!(sequences, vec![1, 2]);
    }

    #[test]
    fn test_poll_without_submissions_is_empty() {
        let mut service = ThreadedInferenceService::spawn(Box::new(LabelDetector("cup")));
        assert!(service.poll_completed().is_empty());
    }

    #[test]
    fn test_drop_does_not_wait_for_running_call() {
        let (_gate_tx, gate_rx) = bounded::<()>(0);
        let mut service = ThreadedInferenceService::spawn(Box::new(GatedDetector { gate: gate_rx }));
        service.submit(request(1, 2, 2)).unwrap();

        let start = Instant::now();
        drop(service);
        assert!(start.elapsed() < Duration::from_secs(1));
    }
}
