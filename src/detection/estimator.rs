//! 距离估计模块
//!
//! 基于针孔相机模型，由瞳距像素跨度估算用户与屏幕的距离：
//! `distance = focal_px * IPD_cm / eye_span_px`。
//! 焦距由帧分辨率按固定 70° 视场角推算，避免依赖逐设备标定。
//! 这是一个全函数：任何输入都产出 [10, 200] 厘米内的有限值，
//! 零或负的像素尺寸视为"无法判断"，映射到上限而不是报错。

use crate::constants::{
    ASSUMED_FOV_DEGREES, AVERAGE_IPD_CM, MAX_DISTANCE_CM, MAX_FOCAL_PX, MIN_DISTANCE_CM,
    MIN_FOCAL_PX,
};
use crate::types::{DistanceEstimate, Measurement};

/// 由帧分辨率估算等效焦距（像素）
///
/// 用帧对角线的一半除以半视场角的正切，结果限制在 [500, 2000]
/// 以剔除异常分辨率。
pub fn focal_length_px(frame_width: u32, frame_height: u32) -> f32 {
    let diagonal_px = (frame_width as f32).hypot(frame_height as f32);
    let half_fov = (ASSUMED_FOV_DEGREES / 2.0).to_radians();
    let focal = (diagonal_px / 2.0) / half_fov.tan();
    focal.clamp(MIN_FOCAL_PX, MAX_FOCAL_PX)
}

/// 估算观看距离
pub fn estimate(measurement: &Measurement) -> DistanceEstimate {
    let eye_span_px = measurement.eye_span_px();
    if !(eye_span_px > 0.0) || !eye_span_px.is_finite() {
        // 测量退化（零/负/非有限），按最远处理
        return DistanceEstimate {
            centimeters: MAX_DISTANCE_CM,
        };
    }

    let focal = focal_length_px(measurement.frame_width, measurement.frame_height);
    let distance_cm = focal * AVERAGE_IPD_CM / eye_span_px;

    DistanceEstimate {
        centimeters: distance_cm.clamp(MIN_DISTANCE_CM, MAX_DISTANCE_CM),
    }
}
