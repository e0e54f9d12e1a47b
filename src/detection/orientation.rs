//! 设备方向适配模块
//!
//! 把连续的方向传感器角度量化为四个离散旋转档位，只在档位跳变时
//! 发出事件（边沿触发）。档位宽度本身就构成了滞回带，不需要额外
//! 的防抖定时器。传感器采样频率与帧率无关，可能远高于帧率。

use crate::types::OrientationBucket;

/// 角度 → 旋转档位
///
/// 区间与采集管线的 targetRotation 语义一致：
/// [45,134] → Rot270，[135,224] → Rot180，[225,314] → Rot90，其余 → Rot0。
pub fn bucket_for(raw_degrees: u16) -> OrientationBucket {
    match raw_degrees {
        45..=134 => OrientationBucket::Rot270,
        135..=224 => OrientationBucket::Rot180,
        225..=314 => OrientationBucket::Rot90,
        _ => OrientationBucket::Rot0,
    }
}

/// 方向适配器，保存当前档位并检测跳变
#[derive(Debug)]
pub struct OrientationAdapter {
    current: OrientationBucket,
}

impl OrientationAdapter {
    /// 以初始档位创建，通常取启动时的显示旋转
    pub fn new(initial: OrientationBucket) -> Self {
        Self { current: initial }
    }

    pub fn current(&self) -> OrientationBucket {
        self.current
    }

    /// 输入一个传感器采样
    ///
    /// 仅当计算出的档位与当前档位不同才返回 `Some(new_bucket)`，
    /// 调用方应将其转发给采集管线的旋转配置。
    pub fn update(&mut self, raw_degrees: u16) -> Option<OrientationBucket> {
        let bucket = bucket_for(raw_degrees);
        if bucket == self.current {
            return None;
        }
        self.current = bucket;
        Some(bucket)
    }
}
