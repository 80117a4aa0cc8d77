//! # Store 模块
//!
//! 基于 JSON 文件的设置存储。
//!
//! ## 文件格式
//!
//! ```json
//! {
//!   "saved_at": "2025-01-01T12:00:00+08:00",
//!   "values": {
//!     "settings_masterVolume": { "float": 0.8 },
//!     "settings_muted": { "bool": false }
//!   }
//! }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use stage_runtime::error::StoreError;
use stage_runtime::settings::{PersistenceStore, StoreSnapshot};
use tracing::debug;

/// 设置文件内容
#[derive(Debug, Serialize, Deserialize)]
struct SettingsFile {
    saved_at: DateTime<Local>,
    #[serde(default)]
    values: StoreSnapshot,
}

/// JSON 文件存储
#[derive(Debug)]
pub struct JsonFileStore {
    path: PathBuf,
    working: StoreSnapshot,
    saved_at: Option<DateTime<Local>>,
}

impl JsonFileStore {
    /// 创建存储（不读取文件，读取在 `load()` 中进行）
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            working: StoreSnapshot::new(),
            saved_at: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 最近一次保存（或读取到的保存）的时间
    pub fn saved_at(&self) -> Option<DateTime<Local>> {
        self.saved_at
    }

    /// 格式化的保存时间
    pub fn saved_at_display(&self) -> Option<String> {
        self.saved_at
            .map(|t| t.format("%Y-%m-%d %H:%M:%S").to_string())
    }

    /// 确保所在目录存在
    fn ensure_dir(&self) -> Result<(), StoreError> {
        if let Some(dir) = self.path.parent()
            && !dir.as_os_str().is_empty()
            && !dir.exists()
        {
            fs::create_dir_all(dir)
                .map_err(|e| StoreError::Io(format!("无法创建设置目录: {}", e)))?;
        }
        Ok(())
    }
}

impl PersistenceStore for JsonFileStore {
    fn snapshot(&self) -> &StoreSnapshot {
        &self.working
    }

    fn snapshot_mut(&mut self) -> &mut StoreSnapshot {
        &mut self.working
    }

    /// 先写临时文件再替换，写入中途失败不会损坏已有文件
    fn save(&mut self) -> Result<(), StoreError> {
        self.ensure_dir()?;

        let file = SettingsFile {
            saved_at: Local::now(),
            values: self.working.clone(),
        };
        let json = serde_json::to_string_pretty(&file)
            .map_err(|e| StoreError::Io(format!("序列化失败: {}", e)))?;

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| StoreError::Io(format!("无法写入设置文件: {}", e)))?;
        fs::rename(&tmp, &self.path)
            .map_err(|e| StoreError::Io(format!("无法替换设置文件: {}", e)))?;

        self.saved_at = Some(file.saved_at);
        debug!(path = ?self.path, keys = self.working.len(), "设置文件已写入");
        Ok(())
    }

    /// 文件不存在视为空存储
    fn load(&mut self) -> Result<(), StoreError> {
        if !self.path.exists() {
            self.working = StoreSnapshot::new();
            self.saved_at = None;
            return Ok(());
        }

        let json = fs::read_to_string(&self.path)
            .map_err(|e| StoreError::Io(format!("无法读取设置文件: {}", e)))?;
        let file: SettingsFile =
            serde_json::from_str(&json).map_err(|e| StoreError::Corrupt(e.to_string()))?;

        self.working = file.values;
        self.saved_at = Some(file.saved_at);
        debug!(path = ?self.path, keys = self.working.len(), "设置文件已读取");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stage_runtime::settings::keys;
    use tempfile::TempDir;

    fn setup() -> (TempDir, JsonFileStore) {
        let dir = TempDir::new().unwrap();
        let store = JsonFileStore::new(dir.path().join("nested").join("settings.json"));
        (dir, store)
    }

    #[test]
    fn test_missing_file_is_empty() {
        let (_dir, mut store) = setup();
        store.load().unwrap();
        assert!(store.snapshot().is_empty());
        assert!(store.saved_at().is_none());
    }

    #[test]
    fn test_save_and_load() {
        let (_dir, mut store) = setup();
        store.set_f32(keys::MASTER_VOLUME, 0.5);
        store.set_bool(keys::MUTED, true);
        store.set_i32(keys::ANTI_ALIASING, 4);
        store.save().unwrap();
        assert!(store.saved_at_display().is_some());

        let mut reloaded = JsonFileStore::new(store.path());
        reloaded.load().unwrap();
        assert_eq!(reloaded.get_f32(keys::MASTER_VOLUME), Some(0.5));
        assert_eq!(reloaded.get_bool(keys::MUTED), Some(true));
        assert_eq!(reloaded.get_i32(keys::ANTI_ALIASING), Some(4));
        assert!(reloaded.saved_at().is_some());
    }

    #[test]
    fn test_corrupt_file() {
        let (_dir, mut store) = setup();
        store.save().unwrap();
        fs::write(store.path(), "{ not json").unwrap();

        let err = store.load().unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }
}
