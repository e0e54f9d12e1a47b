//! 检测状态机
//!
//! 顶层编排：Idle → Detecting → Idle。帧投递、检测完成与方向传感器
//! 是互相独立的异步事件源，本模块把它们全部收敛到一个 tokio 任务的
//! 串行循环里，防抖/节能/冷却三个状态机的变更绝不交错。定时器是
//! 可取消的单次任务，按会话 id 打标，Stop 时整批 abort——停止之后
//! 不允许任何挂起的恢复再生效。

use std::sync::Arc;
use std::time::{Duration, Instant};

use thiserror::Error;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::constants::{CAMERA_RESUME_DELAY, MAX_NO_FACE_FRAMES, WARNING_COOLDOWN};
use crate::detection::{
    estimator, CameraPowerController, OrientationAdapter, PowerDirective, PowerState,
    ProximityDebouncer, WarningCooldownController,
};
use crate::pipeline::{
    AnalyzerHandle, CapturePipeline, DetectorEvent, FaceDetector, PipelineError, WarningNotifier,
};
use crate::settings::SettingsStore;
use crate::types::{Detection, Frame, Measurement, OrientationBucket, ThresholdConfig};

const EVENT_QUEUE_CAPACITY: usize = 32;

/// 帧队列容量故意很小：下游消费不过来时丢帧而不是排队
/// （keep-only-latest），检测是尽力而为的省电路径。
const FRAME_QUEUE_CAPACITY: usize = 4;

/// 启动检测失败的原因，调用方可以重试
#[derive(Debug, Error)]
pub enum StartError {
    #[error("capture bind failed: {0}")]
    CaptureBind(#[from] PipelineError),
    #[error("detection service is gone")]
    ServiceGone,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TimerKind {
    CameraResume,
    CooldownElapsed,
}

enum ServiceEvent {
    Start {
        reply: oneshot::Sender<Result<(), StartError>>,
    },
    Stop {
        reply: oneshot::Sender<()>,
    },
    Toggle {
        reply: oneshot::Sender<Result<bool, StartError>>,
    },
    OrientationSample(u16),
    TimerFired {
        session_id: Uuid,
        timer: TimerKind,
    },
    Shutdown {
        reply: oneshot::Sender<()>,
    },
}

/// 一次检测会话的全部状态，Start 时创建，Stop 时整体丢弃
struct Session {
    id: Uuid,
    detections_tx: mpsc::Sender<DetectorEvent>,
    analyzer: Option<AnalyzerHandle>,
    orientation: OrientationAdapter,
    debouncer: ProximityDebouncer,
    power: CameraPowerController,
    cooldown: WarningCooldownController,
    resume_timer: Option<JoinHandle<()>>,
    cooldown_timer: Option<JoinHandle<()>>,
}

/// 向检测服务发送生命周期命令与传感器采样的句柄
#[derive(Clone)]
pub struct DetectionHandle {
    events_tx: mpsc::Sender<ServiceEvent>,
}

impl DetectionHandle {
    /// 启动检测；已在检测中则为幂等空操作
    pub async fn start(&self) -> Result<(), StartError> {
        let (tx, rx) = oneshot::channel();
        self.events_tx
            .send(ServiceEvent::Start { reply: tx })
            .await
            .map_err(|_| StartError::ServiceGone)?;
        rx.await.map_err(|_| StartError::ServiceGone)?
    }

    /// 停止检测并释放采集管线；未在检测中则为空操作
    pub async fn stop(&self) {
        let (tx, rx) = oneshot::channel();
        if self
            .events_tx
            .send(ServiceEvent::Stop { reply: tx })
            .await
            .is_ok()
        {
            let _ = rx.await;
        }
    }

    /// 检测中则停止，否则启动；返回切换后是否在检测中
    pub async fn toggle(&self) -> Result<bool, StartError> {
        let (tx, rx) = oneshot::channel();
        self.events_tx
            .send(ServiceEvent::Toggle { reply: tx })
            .await
            .map_err(|_| StartError::ServiceGone)?;
        rx.await.map_err(|_| StartError::ServiceGone)?
    }

    /// 投递一个方向传感器采样（角度，0–359）
    pub async fn orientation_sample(&self, degrees: u16) {
        let _ = self
            .events_tx
            .send(ServiceEvent::OrientationSample(degrees))
            .await;
    }

    /// 停止检测并结束服务任务
    pub async fn shutdown(&self) {
        let (tx, rx) = oneshot::channel();
        if self
            .events_tx
            .send(ServiceEvent::Shutdown { reply: tx })
            .await
            .is_ok()
        {
            let _ = rx.await;
        }
    }
}

/// 检测服务，单任务串行处理所有事件
pub struct DetectionService {
    pipeline: Arc<dyn CapturePipeline>,
    detector: Arc<dyn FaceDetector>,
    notifier: Arc<dyn WarningNotifier>,
    settings: Arc<SettingsStore>,
    initial_rotation: OrientationBucket,
    events_tx: mpsc::Sender<ServiceEvent>,
    events_rx: mpsc::Receiver<ServiceEvent>,
    frames_rx: Option<mpsc::Receiver<Frame>>,
    detections_rx: Option<mpsc::Receiver<DetectorEvent>>,
    session: Option<Session>,
}

enum Input {
    Event(ServiceEvent),
    Frame(Frame),
    FramesClosed,
    Detection(DetectorEvent),
}

impl DetectionService {
    pub fn new(
        pipeline: Arc<dyn CapturePipeline>,
        detector: Arc<dyn FaceDetector>,
        notifier: Arc<dyn WarningNotifier>,
        settings: Arc<SettingsStore>,
    ) -> (Self, DetectionHandle) {
        let (events_tx, events_rx) = mpsc::channel(EVENT_QUEUE_CAPACITY);
        let handle = DetectionHandle {
            events_tx: events_tx.clone(),
        };
        let service = Self {
            pipeline,
            detector,
            notifier,
            settings,
            initial_rotation: OrientationBucket::Rot0,
            events_tx,
            events_rx,
            frames_rx: None,
            detections_rx: None,
            session: None,
        };
        (service, handle)
    }

    /// 设置启动时的显示旋转档位（默认 Rot0）
    pub fn with_initial_rotation(mut self, bucket: OrientationBucket) -> Self {
        self.initial_rotation = bucket;
        self
    }

    /// 事件循环，直到句柄全部丢弃或收到 Shutdown
    pub async fn run(mut self) {
        loop {
            let input = tokio::select! {
                maybe = self.events_rx.recv() => match maybe {
                    Some(event) => Input::Event(event),
                    None => break,
                },
                frame = next_message(&mut self.frames_rx) => match frame {
                    Some(frame) => Input::Frame(frame),
                    None => Input::FramesClosed,
                },
                Some(event) = next_message(&mut self.detections_rx) => Input::Detection(event),
            };

            match input {
                Input::Event(ServiceEvent::Start { reply }) => {
                    let _ = reply.send(self.handle_start());
                }
                Input::Event(ServiceEvent::Stop { reply }) => {
                    self.handle_stop();
                    let _ = reply.send(());
                }
                Input::Event(ServiceEvent::Toggle { reply }) => {
                    let result = if self.session.is_some() {
                        self.handle_stop();
                        Ok(false)
                    } else {
                        self.handle_start().map(|()| true)
                    };
                    let _ = reply.send(result);
                }
                Input::Event(ServiceEvent::OrientationSample(degrees)) => {
                    self.handle_orientation(degrees);
                }
                Input::Event(ServiceEvent::TimerFired { session_id, timer }) => {
                    self.handle_timer(session_id, timer);
                }
                Input::Event(ServiceEvent::Shutdown { reply }) => {
                    self.handle_stop();
                    let _ = reply.send(());
                    break;
                }
                Input::Frame(frame) => self.handle_frame(frame),
                Input::FramesClosed => self.handle_frames_closed(),
                Input::Detection(event) => self.handle_detection(event),
            }
        }

        // 循环退出前兜底释放会话
        self.handle_stop();
    }

    fn handle_start(&mut self) -> Result<(), StartError> {
        if self.session.is_some() {
            tracing::debug!("start requested while already detecting, ignoring");
            return Ok(());
        }

        let orientation = OrientationAdapter::new(self.initial_rotation);
        let (frames_tx, frames_rx) = mpsc::channel(FRAME_QUEUE_CAPACITY);
        let analyzer = self
            .pipeline
            .bind(orientation.current(), frames_tx)
            .map_err(|e| {
                tracing::error!(error = %e, "could not start detection: capture bind failed");
                StartError::CaptureBind(e)
            })?;

        let (detections_tx, detections_rx) = mpsc::channel(FRAME_QUEUE_CAPACITY);
        self.frames_rx = Some(frames_rx);
        self.detections_rx = Some(detections_rx);
        self.session = Some(Session {
            id: Uuid::new_v4(),
            detections_tx,
            analyzer: Some(analyzer),
            orientation,
            debouncer: ProximityDebouncer::new(),
            power: CameraPowerController::new(),
            cooldown: WarningCooldownController::new(),
            resume_timer: None,
            cooldown_timer: None,
        });

        if let Err(e) = self.settings.set_detection_enabled(true) {
            tracing::warn!(error = %e, "failed to persist detection flag");
        }
        tracing::info!("detection started");
        Ok(())
    }

    fn handle_stop(&mut self) {
        let Some(mut session) = self.session.take() else {
            return;
        };

        // 先取消挂起的定时器：停止之后不允许任何恢复再触发
        if let Some(timer) = session.resume_timer.take() {
            timer.abort();
        }
        if let Some(timer) = session.cooldown_timer.take() {
            timer.abort();
        }

        self.frames_rx = None;
        self.detections_rx = None;
        self.pipeline.unbind();
        self.notifier.dismiss();

        if let Err(e) = self.settings.set_detection_enabled(false) {
            tracing::warn!(error = %e, "failed to persist detection flag");
        }
        tracing::info!("detection stopped");
    }

    fn handle_orientation(&mut self, degrees: u16) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        if let Some(bucket) = session.orientation.update(degrees) {
            tracing::debug!(rotation = bucket.degrees(), "orientation bucket changed");
            self.pipeline.set_rotation(bucket);
        }
    }

    fn handle_frame(&mut self, frame: Frame) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        // 解绑与最后几帧之间存在竞争，暂停期间的残留帧直接丢弃
        if session.power.state() == PowerState::Suspended {
            return;
        }
        self.detector.submit(frame, session.detections_tx.clone());
    }

    fn handle_frames_closed(&mut self) {
        self.frames_rx = None;
        if self.session.is_some() {
            tracing::warn!("frame source closed while detecting");
        }
    }

    fn handle_detection(&mut self, event: DetectorEvent) {
        let Some(session) = self.session.as_mut() else {
            return;
        };

        let detection = match event {
            DetectorEvent::Completed(detection) => detection,
            DetectorEvent::Failed { reason } => {
                // 单帧检测故障按"无人脸"恢复，绝不终止会话
                tracing::warn!(%reason, "face detection failed, treating frame as no-face");
                Detection::no_face(0, 0)
            }
        };
        let face_found = detection.face_found();

        // 相机节能：用户长时间离开时解绑管线
        if let PowerDirective::Suspend { resume_after } = session.power.observe(face_found) {
            tracing::info!(
                idle_frames = MAX_NO_FACE_FRAMES,
                "no face detected for a while, suspending camera to save power"
            );
            self.frames_rx = None;
            if let Some(analyzer) = session.analyzer.take() {
                tracing::debug!(analyzer = %analyzer.id, "capture pipeline unbound");
            }
            self.pipeline.unbind();
            session.resume_timer = Some(spawn_timer(
                self.events_tx.clone(),
                session.id,
                TimerKind::CameraResume,
                resume_after,
            ));
        }

        // 冷却门控：警告之后的压制期内不评估距离
        if session.cooldown.is_suppressed() {
            return;
        }

        // 每帧取一份新的设置快照，UI 可能并发修改
        let snapshot = match self.settings.snapshot() {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!(error = %e, "settings read failed, using defaults for this frame");
                ThresholdConfig::default()
            }
        };

        let distance = Measurement::from_detection(&detection).map(|m| estimator::estimate(&m));
        if let Some(distance) = distance {
            tracing::trace!(
                distance_cm = distance.centimeters,
                threshold_cm = snapshot.distance_threshold_cm,
                "distance estimated"
            );
        }

        if session
            .debouncer
            .observe(face_found, distance, snapshot.distance_threshold_cm)
            && session.cooldown.trigger(Instant::now())
        {
            tracing::info!(
                threshold_cm = snapshot.distance_threshold_cm,
                "proximity warning raised"
            );
            self.notifier
                .show_warning(&snapshot.warning_message, snapshot.voice_warning_enabled);
            session.cooldown_timer = Some(spawn_timer(
                self.events_tx.clone(),
                session.id,
                TimerKind::CooldownElapsed,
                WARNING_COOLDOWN,
            ));
        }
    }

    fn handle_timer(&mut self, session_id: Uuid, timer: TimerKind) {
        let Some(session) = self.session.as_mut() else {
            tracing::debug!("timer fired after stop, ignoring");
            return;
        };
        if session.id != session_id {
            tracing::debug!("timer from a previous session, ignoring");
            return;
        }

        match timer {
            TimerKind::CameraResume => {
                session.resume_timer = None;
                if session.power.state() != PowerState::Suspended {
                    return;
                }
                let (frames_tx, frames_rx) = mpsc::channel(FRAME_QUEUE_CAPACITY);
                match self.pipeline.bind(session.orientation.current(), frames_tx) {
                    Ok(analyzer) => {
                        self.frames_rx = Some(frames_rx);
                        session.analyzer = Some(analyzer);
                        session.power.notify_resumed();
                        tracing::info!("camera re-activated after power save");
                    }
                    Err(e) => {
                        // 重新绑定失败则保持暂停，按同样的延迟再试
                        tracing::error!(error = %e, "camera re-activation failed, retrying later");
                        session.resume_timer = Some(spawn_timer(
                            self.events_tx.clone(),
                            session.id,
                            TimerKind::CameraResume,
                            CAMERA_RESUME_DELAY,
                        ));
                    }
                }
            }
            TimerKind::CooldownElapsed => {
                session.cooldown_timer = None;
                session.cooldown.resume();
                session.debouncer.reset();
                self.notifier.dismiss();
                tracing::debug!("warning cooldown elapsed, proximity evaluation resumed");
            }
        }
    }
}

/// 单次可取消定时器：睡满 delay 后把事件投回串行循环
fn spawn_timer(
    events_tx: mpsc::Sender<ServiceEvent>,
    session_id: Uuid,
    timer: TimerKind,
    delay: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let _ = events_tx
            .send(ServiceEvent::TimerFired { session_id, timer })
            .await;
    })
}

async fn next_message<T>(rx: &mut Option<mpsc::Receiver<T>>) -> Option<T> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}
