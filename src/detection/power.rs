//! 相机节能模块
//!
//! 逐帧消费人脸有无的判定，在用户长时间离开时暂停采集管线省电。
//! 连续 30 帧无人脸才暂停，避免短暂遮挡引起的反复开关；暂停指令
//! 自带 3 秒的恢复延迟，限制快速重启带来的电量消耗。暂停期间
//! 管线已解绑，不会再有帧到达，`observe` 也就不会被调用。

use std::time::Duration;

use crate::constants::{CAMERA_RESUME_DELAY, MAX_NO_FACE_FRAMES};

/// 采集管线的供电状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    Active,
    Suspended,
}

/// 一帧观察后要执行的动作
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerDirective {
    /// 无需动作
    None,
    /// 解绑管线省电，并在 `resume_after` 之后重新绑定
    Suspend { resume_after: Duration },
}

/// 相机电源控制器
#[derive(Debug)]
pub struct CameraPowerController {
    state: PowerState,
    consecutive_no_face_frames: u32,
}

impl CameraPowerController {
    pub fn new() -> Self {
        Self {
            state: PowerState::Active,
            consecutive_no_face_frames: 0,
        }
    }

    pub fn state(&self) -> PowerState {
        self.state
    }

    /// 观察一帧的人脸有无
    ///
    /// 第 30 个连续无人脸帧恰好发出一条携带恢复延迟的暂停指令，
    /// 之后进入 Suspended 并清零计数；有人脸的帧只清零计数。
    pub fn observe(&mut self, face_found: bool) -> PowerDirective {
        if self.state == PowerState::Suspended {
            // 暂停期间不应有帧到达，若到达则忽略
            return PowerDirective::None;
        }

        if face_found {
            self.consecutive_no_face_frames = 0;
            return PowerDirective::None;
        }

        self.consecutive_no_face_frames += 1;
        if self.consecutive_no_face_frames >= MAX_NO_FACE_FRAMES {
            self.state = PowerState::Suspended;
            self.consecutive_no_face_frames = 0;
            return PowerDirective::Suspend {
                resume_after: CAMERA_RESUME_DELAY,
            };
        }
        PowerDirective::None
    }

    /// 管线重新绑定成功后由状态机调用，回到 Active 且计数清零
    pub fn notify_resumed(&mut self) {
        self.state = PowerState::Active;
        self.consecutive_no_face_frames = 0;
    }
}

impl Default for CameraPowerController {
    fn default() -> Self {
        Self::new()
    }
}
