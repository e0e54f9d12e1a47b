//! 模拟协作者
//!
//! 无摄像头环境下演示完整检测链路：模拟管线按固定帧率产帧，
//! 模拟检测器用脚本化的距离曲线回放"靠近—远离—离开"的使用
//! 场景，通知器把警告打到日志。二进制 `eyeguard` 用它们把整条
//! 控制回路跑起来，算法语义与真实相机部署完全一致。

use std::sync::Mutex;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::config::SimConfig;
use crate::constants::AVERAGE_IPD_CM;
use crate::detection::estimator;
use crate::pipeline::{
    AnalyzerHandle, CapturePipeline, DetectorEvent, FaceDetector, PipelineError, WarningNotifier,
};
use crate::types::{Detection, FaceGeometry, Frame, OrientationBucket, Point, Rect};

/// 模拟采集管线：绑定后起一个产帧任务，解绑时取消
pub struct SimulatedPipeline {
    config: SimConfig,
    producer: Mutex<Option<JoinHandle<()>>>,
}

impl SimulatedPipeline {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            config: config.clone(),
            producer: Mutex::new(None),
        }
    }
}

impl CapturePipeline for SimulatedPipeline {
    fn bind(
        &self,
        rotation: OrientationBucket,
        frames: mpsc::Sender<Frame>,
    ) -> Result<AnalyzerHandle, PipelineError> {
        let mut producer = self
            .producer
            .lock()
            .map_err(|_| PipelineError::BindRejected("producer lock poisoned".to_string()))?;
        if let Some(previous) = producer.take() {
            previous.abort();
        }

        let interval = Duration::from_millis(1000 / u64::from(self.config.fps.max(1)));
        let width = self.config.frame_width;
        let height = self.config.frame_height;
        tracing::debug!(rotation = rotation.degrees(), "simulated pipeline bound");

        *producer = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            let mut seq = 0_u64;
            loop {
                ticker.tick().await;
                let frame = Frame {
                    seq,
                    width,
                    height,
                    data: Vec::new(),
                };
                seq += 1;
                // 下游消费不过来就丢帧（keep-only-latest），绝不阻塞产帧
                if let Err(mpsc::error::TrySendError::Closed(_)) = frames.try_send(frame) {
                    break;
                }
            }
        }));
        Ok(AnalyzerHandle::new())
    }

    fn unbind(&self) {
        if let Ok(mut producer) = self.producer.lock() {
            if let Some(task) = producer.take() {
                task.abort();
            }
        }
    }

    fn set_rotation(&self, bucket: OrientationBucket) {
        tracing::debug!(rotation = bucket.degrees(), "simulated rotation updated");
    }
}

/// 模拟检测器：按帧号回放一条距离脚本
///
/// 每个周期 20 秒（600 帧 @30fps）：先在 60cm 停留，然后逐渐凑近
/// 到 20cm 并保持（触发警告与冷却），最后离开画面一段时间
/// （触发相机节能）。
pub struct SimulatedDetector {
    frame_width: u32,
    frame_height: u32,
    fps: u64,
}

impl SimulatedDetector {
    pub fn new(config: &SimConfig) -> Self {
        Self {
            frame_width: config.frame_width,
            frame_height: config.frame_height,
            fps: u64::from(config.fps.max(1)),
        }
    }

    /// 帧号 → 脚本化的观看距离；None 表示画面里没有人
    fn scripted_distance_cm(&self, seq: u64) -> Option<f32> {
        let cycle = seq % (self.fps * 20);
        let second = cycle / self.fps;
        match second {
            0..=4 => Some(60.0),
            // 5 秒内从 60cm 匀速凑近到 20cm
            5..=9 => {
                let progress = (cycle - self.fps * 5) as f32 / (self.fps * 5) as f32;
                Some(60.0 - progress * 40.0)
            }
            10..=14 => Some(20.0),
            // 用户离开画面
            _ => None,
        }
    }

    fn detection_at(&self, distance_cm: f32) -> Detection {
        let focal = estimator::focal_length_px(self.frame_width, self.frame_height);
        let span = focal * AVERAGE_IPD_CM / distance_cm;
        let center_x = self.frame_width as f32 / 2.0;
        let center_y = self.frame_height as f32 / 2.0;
        Detection {
            frame_width: self.frame_width,
            frame_height: self.frame_height,
            face: Some(FaceGeometry {
                left_eye: Some(Point::new(center_x + span / 2.0, center_y)),
                right_eye: Some(Point::new(center_x - span / 2.0, center_y)),
                bounding_box: Rect::new(
                    center_x - span * 1.7,
                    center_y - span * 2.0,
                    span / crate::constants::EYE_SPAN_FACE_WIDTH_RATIO,
                    span * 4.0,
                ),
            }),
        }
    }
}

impl FaceDetector for SimulatedDetector {
    fn submit(&self, frame: Frame, completions: mpsc::Sender<DetectorEvent>) {
        let detection = match self.scripted_distance_cm(frame.seq) {
            Some(distance_cm) => self.detection_at(distance_cm),
            None => Detection::no_face(frame.width, frame.height),
        };
        tokio::spawn(async move {
            // 模拟推理延迟，完成事件异步回到串行循环
            tokio::time::sleep(Duration::from_millis(5)).await;
            let _ = completions.send(DetectorEvent::Completed(detection)).await;
        });
    }
}

/// 把警告打到日志的通知器
pub struct LogNotifier;

impl WarningNotifier for LogNotifier {
    fn show_warning(&self, message: &str, use_voice: bool) {
        tracing::warn!(use_voice, "{message}");
    }

    fn dismiss(&self) {
        tracing::info!("warning dismissed");
    }
}
