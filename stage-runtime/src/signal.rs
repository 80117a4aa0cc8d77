//! # Signal 模块
//!
//! 类型化的观察者列表。订阅返回 `SubscriptionId`，
//! 订阅者的生命周期结束时用同一个 ID 取消订阅。

use std::fmt;

/// 订阅标识符
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubscriptionId({})", self.0)
    }
}

type Slot<T> = Box<dyn FnMut(&T)>;

/// 观察者列表
pub struct Signal<T> {
    slots: Vec<(SubscriptionId, Slot<T>)>,
    next_id: u64,
}

impl<T> Default for Signal<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("subscribers", &self.slots.len())
            .finish()
    }
}

impl<T> Signal<T> {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            next_id: 1,
        }
    }

    /// 注册观察者
    pub fn subscribe(&mut self, slot: impl FnMut(&T) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.slots.push((id, Box::new(slot)));
        id
    }

    /// 取消订阅
    ///
    /// # 返回
    /// ID 不存在（已取消过）时返回 `false`
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.slots.len();
        self.slots.retain(|(slot_id, _)| *slot_id != id);
        self.slots.len() != before
    }

    /// 按订阅顺序通知所有观察者
    pub fn emit(&mut self, value: &T) {
        for (_, slot) in &mut self.slots {
            slot(value);
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_emit_in_subscription_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let mut signal = Signal::<u32>::new();

        let a = log.clone();
        signal.subscribe(move |v| a.borrow_mut().push(("a", *v)));
        let b = log.clone();
        signal.subscribe(move |v| b.borrow_mut().push(("b", *v)));

        signal.emit(&7);
        assert_eq!(*log.borrow(), vec![("a", 7), ("b", 7)]);
    }

    #[test]
    fn test_unsubscribe() {
        let count = Rc::new(RefCell::new(0));
        let mut signal = Signal::<()>::new();

        let c = count.clone();
        let id = signal.subscribe(move |_| *c.borrow_mut() += 1);
        signal.emit(&());
        assert!(signal.unsubscribe(id));
        signal.emit(&());

        assert_eq!(*count.borrow(), 1);
        assert!(signal.is_empty());
        // 重复取消返回 false
        assert!(!signal.unsubscribe(id));
    }
}
