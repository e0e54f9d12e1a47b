//! 过近防抖模块
//!
//! 逐帧消费"距离是否小于阈值"的判定，只有连续 5 帧过近才触发
//! 一次警告。这是游程防抖而不是滑动窗口：任何一个非过近帧或
//! 无检测帧都会把进度完全清零，以抵御检测器的瞬时噪声，同时在
//! 持续靠近时仍能在约 5 帧内（典型分析帧率下 150–200ms）做出反应。

use crate::constants::MAX_CONSECUTIVE_CLOSE_FRAMES;
use crate::types::DistanceEstimate;

/// 过近游程状态
#[derive(Debug, Default)]
pub struct ProximityDebouncer {
    consecutive_close_frames: u32,
}

impl ProximityDebouncer {
    pub fn new() -> Self {
        Self::default()
    }

    /// 观察一帧的判定结果，恰好在触发警告的那一帧返回 true
    ///
    /// 触发后计数立即清零：一次合格游程只发一次警告，第 6 个连续
    /// 过近帧会开始新的计数。
    pub fn observe(
        &mut self,
        face_found: bool,
        distance: Option<DistanceEstimate>,
        threshold_cm: f32,
    ) -> bool {
        let Some(distance) = distance.filter(|_| face_found) else {
            self.consecutive_close_frames = 0;
            return false;
        };

        if distance.centimeters < threshold_cm {
            self.consecutive_close_frames += 1;
            if self.consecutive_close_frames >= MAX_CONSECUTIVE_CLOSE_FRAMES {
                self.consecutive_close_frames = 0;
                return true;
            }
        } else {
            self.consecutive_close_frames = 0;
        }
        false
    }

    /// 清零游程，冷却结束后由状态机调用，保证下一次警告需要全新游程
    pub fn reset(&mut self) {
        self.consecutive_close_frames = 0;
    }

    pub fn consecutive_close_frames(&self) -> u32 {
        self.consecutive_close_frames
    }
}
