//! 警告冷却模块
//!
//! 一次警告发出后暂停距离评估 10 秒，把警告频率限制在每 10 秒
//! 最多一次，无论用户靠得多持久。触发是幂等的：已处于冷却中再次
//! 触发不会二次弹窗、也不会重复排定恢复任务。

use std::time::Instant;

use crate::constants::WARNING_COOLDOWN;

/// 冷却状态：待命或带恢复时刻的压制中
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownState {
    Armed,
    Suppressed { resume_deadline: Instant },
}

/// 警告冷却控制器
#[derive(Debug)]
pub struct WarningCooldownController {
    state: CooldownState,
}

impl WarningCooldownController {
    pub fn new() -> Self {
        Self {
            state: CooldownState::Armed,
        }
    }

    /// 评估距离前的门控：压制中则跳过防抖评估
    pub fn is_suppressed(&self) -> bool {
        matches!(self.state, CooldownState::Suppressed { .. })
    }

    /// 警告触发
    ///
    /// 仅当从 Armed 进入 Suppressed 时返回 true，此时调用方应向用户
    /// 展示一次警告并排定一个冷却恢复定时器。压制中重复触发是
    /// 无害的空操作（门控正常时不可达，但不会 panic 或重复排定）。
    pub fn trigger(&mut self, now: Instant) -> bool {
        match self.state {
            CooldownState::Armed => {
                self.state = CooldownState::Suppressed {
                    resume_deadline: now + WARNING_COOLDOWN,
                };
                true
            }
            CooldownState::Suppressed { .. } => false,
        }
    }

    /// 冷却到期，回到待命
    pub fn resume(&mut self) {
        self.state = CooldownState::Armed;
    }

    pub fn resume_deadline(&self) -> Option<Instant> {
        match self.state {
            CooldownState::Armed => None,
            CooldownState::Suppressed { resume_deadline } => Some(resume_deadline),
        }
    }
}

impl Default for WarningCooldownController {
    fn default() -> Self {
        Self::new()
    }
}
