use std::time::Duration;

/// 平均人眼瞳距（厘米）
pub const AVERAGE_IPD_CM: f32 = 6.3;

/// 前置摄像头假定的对角视场角（度）
pub const ASSUMED_FOV_DEGREES: f32 = 70.0;

/// 焦距估算下限（像素），用于剔除异常分辨率
pub const MIN_FOCAL_PX: f32 = 500.0;

/// 焦距估算上限（像素）
pub const MAX_FOCAL_PX: f32 = 2000.0;

/// 距离估计下限（厘米）
pub const MIN_DISTANCE_CM: f32 = 10.0;

/// 距离估计上限（厘米），同时作为"无法判断"时的安全值
pub const MAX_DISTANCE_CM: f32 = 200.0;

/// 瞳距与人脸宽度的近似比例（瞳距 ≈ 脸宽 × 0.30）
pub const EYE_SPAN_FACE_WIDTH_RATIO: f32 = 0.30;

/// 触发警告所需的连续过近帧数
pub const MAX_CONSECUTIVE_CLOSE_FRAMES: u32 = 5;

/// 暂停相机前允许的连续无人脸帧数
pub const MAX_NO_FACE_FRAMES: u32 = 30;

/// 相机暂停后重新激活的延迟
pub const CAMERA_RESUME_DELAY: Duration = Duration::from_millis(3000);

/// 一次警告后的冷却时长，期间不再评估距离
pub const WARNING_COOLDOWN: Duration = Duration::from_millis(10_000);

/// 距离阈值允许下限（厘米）
pub const MIN_DISTANCE_THRESHOLD_CM: f32 = 20.0;

/// 距离阈值允许上限（厘米）
pub const MAX_DISTANCE_THRESHOLD_CM: f32 = 50.0;

/// 默认距离阈值（厘米）
pub const DEFAULT_DISTANCE_THRESHOLD_CM: f32 = 30.0;

/// 默认警告文案
pub const DEFAULT_WARNING_MESSAGE: &str = "离屏幕太近，注意护眼！";
