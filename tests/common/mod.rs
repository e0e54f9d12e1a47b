#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use eyeguard::constants::AVERAGE_IPD_CM;
use eyeguard::detection::estimator;
use eyeguard::pipeline::{
    AnalyzerHandle, CapturePipeline, DetectorEvent, FaceDetector, PipelineError, WarningNotifier,
};
use eyeguard::service::{DetectionHandle, DetectionService};
use eyeguard::settings::SettingsStore;
use eyeguard::types::{Detection, FaceGeometry, Frame, OrientationBucket, Point, Rect};

pub const FRAME_WIDTH: u32 = 640;
pub const FRAME_HEIGHT: u32 = 480;

/// Capture pipeline mock: records every call and hands the frame sender
/// back to the test so it can inject frames.
#[derive(Default)]
pub struct MockPipeline {
    pub fail_next_bind: AtomicBool,
    state: Mutex<MockPipelineState>,
}

#[derive(Default)]
struct MockPipelineState {
    frame_sender: Option<mpsc::Sender<Frame>>,
    bind_count: u32,
    unbind_count: u32,
    bind_rotations: Vec<OrientationBucket>,
    rotations: Vec<OrientationBucket>,
}

impl MockPipeline {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn frame_sender(&self) -> Option<mpsc::Sender<Frame>> {
        self.state.lock().unwrap().frame_sender.clone()
    }

    pub fn bind_count(&self) -> u32 {
        self.state.lock().unwrap().bind_count
    }

    pub fn unbind_count(&self) -> u32 {
        self.state.lock().unwrap().unbind_count
    }

    pub fn bind_rotations(&self) -> Vec<OrientationBucket> {
        self.state.lock().unwrap().bind_rotations.clone()
    }

    pub fn rotation_updates(&self) -> Vec<OrientationBucket> {
        self.state.lock().unwrap().rotations.clone()
    }
}

impl CapturePipeline for MockPipeline {
    fn bind(
        &self,
        rotation: OrientationBucket,
        frames: mpsc::Sender<Frame>,
    ) -> Result<AnalyzerHandle, PipelineError> {
        if self.fail_next_bind.swap(false, Ordering::SeqCst) {
            return Err(PipelineError::CameraUnavailable(
                "camera permission denied".to_string(),
            ));
        }
        let mut state = self.state.lock().unwrap();
        state.bind_count += 1;
        state.bind_rotations.push(rotation);
        state.frame_sender = Some(frames);
        Ok(AnalyzerHandle::new())
    }

    fn unbind(&self) {
        let mut state = self.state.lock().unwrap();
        state.unbind_count += 1;
        state.frame_sender = None;
    }

    fn set_rotation(&self, bucket: OrientationBucket) {
        self.state.lock().unwrap().rotations.push(bucket);
    }
}

/// Detector mock: replays a scripted queue of outcomes, one per submitted
/// frame, sending completions synchronously so tests stay deterministic.
#[derive(Default)]
pub struct ScriptedDetector {
    script: Mutex<Vec<DetectorEvent>>,
}

impl ScriptedDetector {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, event: DetectorEvent) {
        self.script.lock().unwrap().push(event);
    }

    pub fn remaining(&self) -> usize {
        self.script.lock().unwrap().len()
    }
}

impl FaceDetector for ScriptedDetector {
    fn submit(&self, _frame: Frame, completions: mpsc::Sender<DetectorEvent>) {
        let mut script = self.script.lock().unwrap();
        if script.is_empty() {
            return;
        }
        let event = script.remove(0);
        let _ = completions.try_send(event);
    }
}

/// Notifier mock recording every warning shown.
#[derive(Default)]
pub struct RecordingNotifier {
    warnings: Mutex<Vec<(String, bool)>>,
    dismissals: Mutex<u32>,
}

impl RecordingNotifier {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn warnings(&self) -> Vec<(String, bool)> {
        self.warnings.lock().unwrap().clone()
    }

    pub fn dismissals(&self) -> u32 {
        *self.dismissals.lock().unwrap()
    }
}

impl WarningNotifier for RecordingNotifier {
    fn show_warning(&self, message: &str, use_voice: bool) {
        self.warnings
            .lock()
            .unwrap()
            .push((message.to_string(), use_voice));
    }

    fn dismiss(&self) {
        *self.dismissals.lock().unwrap() += 1;
    }
}

pub struct Harness {
    pub pipeline: Arc<MockPipeline>,
    pub detector: Arc<ScriptedDetector>,
    pub notifier: Arc<RecordingNotifier>,
    pub settings: Arc<SettingsStore>,
    pub handle: DetectionHandle,
    _settings_dir: tempfile::TempDir,
    next_seq: u64,
}

impl Harness {
    /// Build the full service with mock collaborators and spawn its loop.
    pub fn spawn() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.sled");
        let settings =
            Arc::new(SettingsStore::open(path.to_str().expect("path")).expect("open settings"));

        let pipeline = MockPipeline::new();
        let detector = ScriptedDetector::new();
        let notifier = RecordingNotifier::new();

        let (service, handle) = DetectionService::new(
            pipeline.clone(),
            detector.clone(),
            notifier.clone(),
            settings.clone(),
        );
        tokio::spawn(service.run());

        Self {
            pipeline,
            detector,
            notifier,
            settings,
            handle,
            _settings_dir: dir,
            next_seq: 0,
        }
    }

    /// Queue one detection outcome and push a frame through the pipeline.
    pub async fn feed(&mut self, event: DetectorEvent) {
        self.detector.push(event);
        let sender = self
            .pipeline
            .frame_sender()
            .expect("pipeline is not bound");
        let frame = Frame {
            seq: self.next_seq,
            width: FRAME_WIDTH,
            height: FRAME_HEIGHT,
            data: Vec::new(),
        };
        self.next_seq += 1;
        sender.send(frame).await.expect("frame channel closed");
        settle().await;
    }

    pub async fn feed_many(&mut self, event: DetectorEvent, count: usize) {
        for _ in 0..count {
            self.feed(event.clone()).await;
        }
    }
}

/// Let the service loop drain everything that is ready. Under a paused
/// clock this only advances time by 1ms once all tasks are idle.
pub async fn settle() {
    tokio::time::sleep(std::time::Duration::from_millis(1)).await;
}

/// A detection whose estimated distance equals `distance_cm` exactly.
pub fn detection_at(distance_cm: f32) -> DetectorEvent {
    let focal = estimator::focal_length_px(FRAME_WIDTH, FRAME_HEIGHT);
    let span = focal * AVERAGE_IPD_CM / distance_cm;
    let cx = FRAME_WIDTH as f32 / 2.0;
    let cy = FRAME_HEIGHT as f32 / 2.0;
    DetectorEvent::Completed(Detection {
        frame_width: FRAME_WIDTH,
        frame_height: FRAME_HEIGHT,
        face: Some(FaceGeometry {
            left_eye: Some(Point::new(cx + span / 2.0, cy)),
            right_eye: Some(Point::new(cx - span / 2.0, cy)),
            bounding_box: Rect::new(cx - span * 1.7, cy - span * 2.0, span / 0.30, span * 4.0),
        }),
    })
}

pub fn no_face() -> DetectorEvent {
    DetectorEvent::Completed(Detection::no_face(FRAME_WIDTH, FRAME_HEIGHT))
}
