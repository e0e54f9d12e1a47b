//! 外部协作者接口
//!
//! 采集管线、人脸检测器与警告通知器只在调用边界上约定，真实的
//! 相机驱动、推理模型和悬浮窗渲染都在本 crate 之外。检测服务通过
//! 这些 trait 组合协作者，测试用记录型 mock，演示二进制用 `sim`
//! 模块的模拟实现。

use thiserror::Error;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::types::{Detection, Frame, OrientationBucket};

/// 绑定采集管线失败的原因，作为启动失败向上层报告
#[derive(Debug, Clone, Error)]
pub enum PipelineError {
    #[error("camera unavailable: {0}")]
    CameraUnavailable(String),
    #[error("bind rejected: {0}")]
    BindRejected(String),
}

/// 一次成功绑定返回的分析器句柄
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnalyzerHandle {
    pub id: Uuid,
}

impl AnalyzerHandle {
    pub fn new() -> Self {
        Self { id: Uuid::new_v4() }
    }
}

impl Default for AnalyzerHandle {
    fn default() -> Self {
        Self::new()
    }
}

/// 帧采集管线
///
/// `bind` 之后管线持续把帧送进 `frames`，直到 `unbind`。发送端
/// 容量有限，管线实现应丢弃装不下的帧而不是阻塞（keep-only-latest）。
pub trait CapturePipeline: Send + Sync + 'static {
    fn bind(
        &self,
        rotation: OrientationBucket,
        frames: mpsc::Sender<Frame>,
    ) -> Result<AnalyzerHandle, PipelineError>;

    fn unbind(&self);

    /// 更新旋转提示，让下游关键点几何在正确的坐标系里解读
    fn set_rotation(&self, bucket: OrientationBucket);
}

/// 检测器的异步完成事件
#[derive(Debug, Clone)]
pub enum DetectorEvent {
    Completed(Detection),
    /// 模型错误或坏帧；调用方记日志并按无人脸处理，绝不致命
    Failed { reason: String },
}

/// 人脸/关键点检测器
///
/// 提交是非阻塞的，完成事件异步投递回 `completions`——第 N 帧的
/// 检测可能在第 N+1 帧到达之后才完成，调用方把先到的结果当作
/// "当前帧"的结论处理，不强行排序。
pub trait FaceDetector: Send + Sync + 'static {
    fn submit(&self, frame: Frame, completions: mpsc::Sender<DetectorEvent>);
}

/// 警告展示方，fire-and-forget，核心不等待其完成
pub trait WarningNotifier: Send + Sync + 'static {
    fn show_warning(&self, message: &str, use_voice: bool);
    fn dismiss(&self);
}
