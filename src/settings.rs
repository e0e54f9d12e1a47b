//! 设置存储
//!
//! 基于 sled 的键值设置存储。UI 线程可能在任意两帧之间写入，
//! 检测服务每次评估前取一份独立一致的快照，last-write-wins，
//! 不要求事务性。值以 JSON 编码落盘。

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use crate::constants::{
    DEFAULT_DISTANCE_THRESHOLD_CM, DEFAULT_WARNING_MESSAGE, MAX_DISTANCE_THRESHOLD_CM,
    MIN_DISTANCE_THRESHOLD_CM,
};
use crate::types::ThresholdConfig;

const SETTINGS_TREE: &str = "settings";

const KEY_DISTANCE_THRESHOLD: &str = "distance_threshold";
const KEY_WARNING_MESSAGE: &str = "warning_message";
const KEY_VOICE_WARNING_ENABLED: &str = "voice_warning_enabled";
const KEY_DETECTION_ENABLED: &str = "detection_enabled";

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("validation error: {0}")]
    Validation(String),
}

/// 设置存储，可被 UI 与检测服务并发访问
#[derive(Debug)]
pub struct SettingsStore {
    #[allow(dead_code)]
    db: sled::Db,
    tree: sled::Tree,
}

impl SettingsStore {
    pub fn open(path: &str) -> Result<Self, SettingsError> {
        let db = sled::open(path)?;
        let tree = db.open_tree(SETTINGS_TREE)?;
        Ok(Self { db, tree })
    }

    fn get_json<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, SettingsError> {
        match self.tree.get(key)? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn put_json<T: Serialize>(&self, key: &str, value: &T) -> Result<(), SettingsError> {
        let bytes = serde_json::to_vec(value)?;
        self.tree.insert(key, bytes)?;
        Ok(())
    }

    /// 距离阈值（厘米）
    ///
    /// 读取时夹回 [20, 50]：旧版本或外部写入可能留下越界值，
    /// 读取方永远拿到合法阈值。
    pub fn distance_threshold(&self) -> Result<f32, SettingsError> {
        let raw: f32 = self
            .get_json(KEY_DISTANCE_THRESHOLD)?
            .unwrap_or(DEFAULT_DISTANCE_THRESHOLD_CM);
        Ok(raw.clamp(MIN_DISTANCE_THRESHOLD_CM, MAX_DISTANCE_THRESHOLD_CM))
    }

    pub fn set_distance_threshold(&self, threshold_cm: f32) -> Result<(), SettingsError> {
        if !threshold_cm.is_finite()
            || !(MIN_DISTANCE_THRESHOLD_CM..=MAX_DISTANCE_THRESHOLD_CM).contains(&threshold_cm)
        {
            return Err(SettingsError::Validation(format!(
                "distance threshold must be within [{MIN_DISTANCE_THRESHOLD_CM}, {MAX_DISTANCE_THRESHOLD_CM}] cm, got {threshold_cm}"
            )));
        }
        self.put_json(KEY_DISTANCE_THRESHOLD, &threshold_cm)
    }

    pub fn warning_message(&self) -> Result<String, SettingsError> {
        Ok(self
            .get_json(KEY_WARNING_MESSAGE)?
            .unwrap_or_else(|| DEFAULT_WARNING_MESSAGE.to_string()))
    }

    pub fn set_warning_message(&self, message: &str) -> Result<(), SettingsError> {
        let trimmed = message.trim();
        if trimmed.is_empty() {
            return Err(SettingsError::Validation(
                "warning message must not be empty".to_string(),
            ));
        }
        self.put_json(KEY_WARNING_MESSAGE, &trimmed)
    }

    pub fn voice_warning_enabled(&self) -> Result<bool, SettingsError> {
        Ok(self.get_json(KEY_VOICE_WARNING_ENABLED)?.unwrap_or(false))
    }

    pub fn set_voice_warning_enabled(&self, enabled: bool) -> Result<(), SettingsError> {
        self.put_json(KEY_VOICE_WARNING_ENABLED, &enabled)
    }

    /// 上次会话是否开着检测，进程重启后用于恢复用户选择
    pub fn detection_enabled(&self) -> Result<bool, SettingsError> {
        Ok(self.get_json(KEY_DETECTION_ENABLED)?.unwrap_or(false))
    }

    pub fn set_detection_enabled(&self, enabled: bool) -> Result<(), SettingsError> {
        self.put_json(KEY_DETECTION_ENABLED, &enabled)
    }

    /// 取一份评估用的设置快照
    ///
    /// 三个键分别读取，写入方可能在两次读取之间落笔，快照内部
    /// 不保证互相一致——这正是 last-write-wins 键值契约的语义。
    pub fn snapshot(&self) -> Result<ThresholdConfig, SettingsError> {
        Ok(ThresholdConfig {
            distance_threshold_cm: self.distance_threshold()?,
            warning_message: self.warning_message()?,
            voice_warning_enabled: self.voice_warning_enabled()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn open_store() -> (tempfile::TempDir, SettingsStore) {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("settings.sled");
        let store = SettingsStore::open(path.to_str().expect("path")).expect("open store");
        (dir, store)
    }

    #[test]
    fn snapshot_returns_defaults_on_empty_store() {
        let (_dir, store) = open_store();
        let snapshot = store.snapshot().expect("snapshot");
        assert_eq!(snapshot.distance_threshold_cm, 30.0);
        assert_eq!(snapshot.warning_message, DEFAULT_WARNING_MESSAGE);
        assert!(!snapshot.voice_warning_enabled);
    }

    #[test]
    fn round_trips_each_setting() {
        let (_dir, store) = open_store();
        store.set_distance_threshold(42.5).expect("set threshold");
        store.set_warning_message("歇一歇眼睛").expect("set message");
        store.set_voice_warning_enabled(true).expect("set voice");
        store.set_detection_enabled(true).expect("set enabled");

        let snapshot = store.snapshot().expect("snapshot");
        assert_eq!(snapshot.distance_threshold_cm, 42.5);
        assert_eq!(snapshot.warning_message, "歇一歇眼睛");
        assert!(snapshot.voice_warning_enabled);
        assert!(store.detection_enabled().expect("enabled"));
    }

    #[test]
    fn rejects_out_of_range_threshold() {
        let (_dir, store) = open_store();
        assert!(matches!(
            store.set_distance_threshold(10.0),
            Err(SettingsError::Validation(_))
        ));
        assert!(matches!(
            store.set_distance_threshold(75.0),
            Err(SettingsError::Validation(_))
        ));
        assert!(matches!(
            store.set_distance_threshold(f32::NAN),
            Err(SettingsError::Validation(_))
        ));
    }

    #[test]
    fn rejects_blank_warning_message() {
        let (_dir, store) = open_store();
        assert!(matches!(
            store.set_warning_message("   "),
            Err(SettingsError::Validation(_))
        ));
    }

    #[test]
    fn clamps_stale_out_of_range_threshold_on_read() {
        let (_dir, store) = open_store();
        // 绕过校验直接写入越界值，模拟旧版本残留数据
        store
            .put_json(KEY_DISTANCE_THRESHOLD, &120.0_f32)
            .expect("raw write");
        assert_eq!(store.distance_threshold().expect("read"), 50.0);
    }
}
