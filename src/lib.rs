//! eyeguard —— 观看距离保护服务
//!
//! 从前置摄像头的人脸关键点流实时估算观看距离，距离持续过近时
//! 发出防抖后的警告，同时管理相机供电与设备方向校正。相机驱动、
//! 检测模型与悬浮窗渲染都是外部协作者，只在 `pipeline` 的 trait
//! 边界上约定。

pub mod config;
pub mod constants;
pub mod detection;
pub mod logging;
pub mod pipeline;
pub mod service;
pub mod settings;
pub mod sim;
pub mod types;
