//! 近距检测核心算法
//!
//! 本模块收纳检测链路里所有纯状态机：距离估计、方向量化、
//! 过近防抖、相机节能与警告冷却。它们不做任何 I/O，也不感知
//! 异步运行时，由 `service` 模块在单一串行上下文里驱动。
//!
//! ## 子模块
//! - `estimator`: 针孔模型距离估计
//! - `orientation`: 方向档位量化
//! - `debounce`: 连续过近帧防抖
//! - `power`: 无人脸节能控制
//! - `cooldown`: 警告冷却限频

pub mod cooldown;
pub mod debounce;
pub mod estimator;
pub mod orientation;
pub mod power;

pub use cooldown::{CooldownState, WarningCooldownController};
pub use debounce::ProximityDebouncer;
pub use orientation::OrientationAdapter;
pub use power::{CameraPowerController, PowerDirective, PowerState};
