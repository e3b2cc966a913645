//! 已见集合
//!
//! 记录进程生命周期内出现过的去重标识。默认不淘汰；
//! 设置容量后按插入顺序淘汰最旧的标识。

use std::collections::{HashSet, VecDeque};

use super::ItemIdentity;

/// 已见标识集合
///
/// 由所属循环独占持有，不做任何内部同步
#[derive(Debug, Default)]
pub struct SeenSet {
    ids: HashSet<ItemIdentity>,
    /// 插入顺序，仅在设置容量时维护
    order: VecDeque<ItemIdentity>,
    capacity: Option<usize>,
}

impl SeenSet {
    /// 无上限集合
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// 最多保留 `capacity` 个标识，超出时淘汰最旧的
    ///
    /// `capacity` 为 0 时等同于 [`SeenSet::unbounded`]
    pub fn with_capacity(capacity: usize) -> Self {
        if capacity == 0 {
            return Self::unbounded();
        }
        Self {
            ids: HashSet::with_capacity(capacity),
            order: VecDeque::with_capacity(capacity),
            capacity: Some(capacity),
        }
    }

    /// 首次出现时记录并返回 true；已见过则返回 false
    pub fn insert(&mut self, id: ItemIdentity) -> bool {
        if self.ids.contains(&id) {
            return false;
        }

        if let Some(capacity) = self.capacity {
            while self.order.len() >= capacity {
                match self.order.pop_front() {
                    Some(oldest) => {
                        self.ids.remove(&oldest);
                    }
                    None => break,
                }
            }
            self.order.push_back(id.clone());
        }

        self.ids.insert(id);
        true
    }

    pub fn contains(&self, id: &ItemIdentity) -> bool {
        self.ids.contains(id)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    pub fn capacity(&self) -> Option<usize> {
        self.capacity
    }
}
