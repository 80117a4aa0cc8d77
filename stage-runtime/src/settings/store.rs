//! 键值持久化存储
//!
//! 存储维护一份工作副本：`set_*` 只修改工作副本，`save()` 提交，
//! `load()` 用已提交的数据覆盖工作副本。

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::StoreError;

/// 类型化的值
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreValue {
    Float(f32),
    Int(i32),
    Bool(bool),
}

/// 存储内容快照
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StoreSnapshot {
    values: BTreeMap<String, StoreValue>,
}

impl StoreSnapshot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<StoreValue> {
        self.values.get(key).copied()
    }

    pub fn set(&mut self, key: &str, value: StoreValue) {
        self.values.insert(key.to_string(), value);
    }

    pub fn remove(&mut self, key: &str) -> bool {
        self.values.remove(key).is_some()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, StoreValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// 类型不匹配时返回 `None`；整数可以按浮点读取
    pub fn get_f32(&self, key: &str) -> Option<f32> {
        match self.get(key)? {
            StoreValue::Float(v) => Some(v),
            StoreValue::Int(v) => Some(v as f32),
            StoreValue::Bool(_) => None,
        }
    }

    pub fn get_i32(&self, key: &str) -> Option<i32> {
        match self.get(key)? {
            StoreValue::Int(v) => Some(v),
            _ => None,
        }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.get(key)? {
            StoreValue::Bool(v) => Some(v),
            StoreValue::Int(v) => Some(v != 0),
            StoreValue::Float(_) => None,
        }
    }
}

/// 持久化存储
pub trait PersistenceStore {
    /// 当前工作副本
    fn snapshot(&self) -> &StoreSnapshot;

    fn snapshot_mut(&mut self) -> &mut StoreSnapshot;

    /// 提交工作副本
    fn save(&mut self) -> Result<(), StoreError>;

    /// 读取已提交的数据
    fn load(&mut self) -> Result<(), StoreError>;

    fn get_f32(&self, key: &str) -> Option<f32> {
        self.snapshot().get_f32(key)
    }

    fn get_i32(&self, key: &str) -> Option<i32> {
        self.snapshot().get_i32(key)
    }

    fn get_bool(&self, key: &str) -> Option<bool> {
        self.snapshot().get_bool(key)
    }

    fn set_f32(&mut self, key: &str, value: f32) {
        self.snapshot_mut().set(key, StoreValue::Float(value));
    }

    fn set_i32(&mut self, key: &str, value: i32) {
        self.snapshot_mut().set(key, StoreValue::Int(value));
    }

    fn set_bool(&mut self, key: &str, value: bool) {
        self.snapshot_mut().set(key, StoreValue::Bool(value));
    }

    fn has_key(&self, key: &str) -> bool {
        self.snapshot().contains(key)
    }

    fn delete_key(&mut self, key: &str) -> bool {
        self.snapshot_mut().remove(key)
    }
}

/// 内存存储
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    committed: StoreSnapshot,
    working: StoreSnapshot,
    saves: u32,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 以已提交的数据创建
    pub fn with_committed(snapshot: StoreSnapshot) -> Self {
        Self {
            committed: snapshot,
            ..Self::default()
        }
    }

    pub fn committed(&self) -> &StoreSnapshot {
        &self.committed
    }

    /// 成功提交的次数
    pub fn save_count(&self) -> u32 {
        self.saves
    }
}

impl PersistenceStore for MemoryStore {
    fn snapshot(&self) -> &StoreSnapshot {
        &self.working
    }

    fn snapshot_mut(&mut self) -> &mut StoreSnapshot {
        &mut self.working
    }

    fn save(&mut self) -> Result<(), StoreError> {
        self.committed = self.working.clone();
        self.saves += 1;
        Ok(())
    }

    fn load(&mut self) -> Result<(), StoreError> {
        self.working = self.committed.clone();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_commit_and_load() {
        let mut store = MemoryStore::new();
        store.set_f32("volume", 0.5);
        assert!(store.has_key("volume"));
        assert!(store.committed().is_empty());

        store.save().unwrap();
        store.set_f32("volume", 0.1);
        store.load().unwrap();
        assert_eq!(store.get_f32("volume"), Some(0.5));
        assert_eq!(store.save_count(), 1);
    }

    #[test]
    fn test_typed_reads() {
        let mut snapshot = StoreSnapshot::new();
        snapshot.set("a", StoreValue::Int(3));
        snapshot.set("b", StoreValue::Bool(true));
        assert_eq!(snapshot.get_f32("a"), Some(3.0));
        assert_eq!(snapshot.get_i32("b"), None);
        assert_eq!(snapshot.get_bool("a"), Some(true));
        assert_eq!(snapshot.get_bool("missing"), None);
    }

    #[test]
    fn test_snapshot_json_shape() {
        let mut snapshot = StoreSnapshot::new();
        snapshot.set("settings_muted", StoreValue::Bool(false));
        snapshot.set("settings_qualityLevel", StoreValue::Int(2));
        let json = serde_json::to_string(&snapshot).unwrap();
        assert_eq!(
            json,
            r#"{"settings_muted":{"bool":false},"settings_qualityLevel":{"int":2}}"#
        );
    }
}
