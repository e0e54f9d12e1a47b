//! 核心数据类型
//!
//! 定义帧、人脸检测结果、几何测量值与距离估计等贯穿整条检测链路的类型。
//! 这些类型全部按值传递，单帧的测量值只被距离估计消费一次。

use crate::constants::EYE_SPAN_FACE_WIDTH_RATIO;

/// 图像平面上的一个点（像素坐标）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// 人脸边界框（像素坐标）
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub left: f32,
    pub top: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }
}

/// 采集管线投递给分析回调的一帧图像
///
/// 像素内容对本 crate 是不透明的，只有外部检测器会解读它。
#[derive(Debug, Clone)]
pub struct Frame {
    pub seq: u64,
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// 检测器返回的人脸几何信息
///
/// 眼部特征点可能缺失（侧脸、遮挡），边界框始终存在。
#[derive(Debug, Clone, Copy)]
pub struct FaceGeometry {
    pub left_eye: Option<Point>,
    pub right_eye: Option<Point>,
    pub bounding_box: Rect,
}

/// 单帧的检测结论：`face == None` 表示该帧没有人脸
#[derive(Debug, Clone, Copy)]
pub struct Detection {
    pub frame_width: u32,
    pub frame_height: u32,
    pub face: Option<FaceGeometry>,
}

impl Detection {
    pub fn no_face(frame_width: u32, frame_height: u32) -> Self {
        Self {
            frame_width,
            frame_height,
            face: None,
        }
    }

    pub fn face_found(&self) -> bool {
        self.face.is_some()
    }
}

/// 测量值来源：双眼特征点或人脸边界框兜底
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasurementKind {
    EyePair,
    FaceBoundingBox,
}

/// 一次几何测量，距离估计的唯一输入
#[derive(Debug, Clone, Copy)]
pub struct Measurement {
    pub kind: MeasurementKind,
    pub primary_px: f32,
    pub frame_width: u32,
    pub frame_height: u32,
}

impl Measurement {
    /// 从单帧检测结论提取测量值
    ///
    /// 双眼特征点齐全时用瞳距像素跨度（水平分量），
    /// 否则退回人脸边界框宽度。无人脸时没有测量值。
    pub fn from_detection(detection: &Detection) -> Option<Measurement> {
        let geometry = detection.face.as_ref()?;
        match (geometry.left_eye, geometry.right_eye) {
            (Some(left), Some(right)) => Some(Measurement {
                kind: MeasurementKind::EyePair,
                primary_px: (left.x - right.x).abs(),
                frame_width: detection.frame_width,
                frame_height: detection.frame_height,
            }),
            _ => Some(Measurement {
                kind: MeasurementKind::FaceBoundingBox,
                primary_px: geometry.bounding_box.width,
                frame_width: detection.frame_width,
                frame_height: detection.frame_height,
            }),
        }
    }

    /// 换算为瞳距像素跨度
    pub fn eye_span_px(&self) -> f32 {
        match self.kind {
            MeasurementKind::EyePair => self.primary_px,
            MeasurementKind::FaceBoundingBox => self.primary_px * EYE_SPAN_FACE_WIDTH_RATIO,
        }
    }
}

/// 估算出的观看距离，始终落在 [10, 200] 厘米内
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceEstimate {
    pub centimeters: f32,
}

/// 设备旋转档位，对应采集管线的 targetRotation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OrientationBucket {
    #[default]
    Rot0,
    Rot90,
    Rot180,
    Rot270,
}

impl OrientationBucket {
    pub fn degrees(self) -> u16 {
        match self {
            Self::Rot0 => 0,
            Self::Rot90 => 90,
            Self::Rot180 => 180,
            Self::Rot270 => 270,
        }
    }
}

/// 一次评估用到的设置快照
///
/// 每帧从设置存储重新读取，UI 可能并发写入，绝不跨帧缓存。
#[derive(Debug, Clone)]
pub struct ThresholdConfig {
    pub distance_threshold_cm: f32,
    pub warning_message: String,
    pub voice_warning_enabled: bool,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            distance_threshold_cm: crate::constants::DEFAULT_DISTANCE_THRESHOLD_CM,
            warning_message: crate::constants::DEFAULT_WARNING_MESSAGE.to_string(),
            voice_warning_enabled: false,
        }
    }
}
