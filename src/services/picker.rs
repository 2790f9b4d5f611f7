//! 随机选择器
//!
//! 预设回复的随机抽取通过该接口注入，测试时可固定种子或固定下标。

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// 随机源
pub trait ResponsePicker: Send + Sync {
    /// 返回 `[0, len)` 内的下标；`len` 为 0 时返回 0
    fn pick_index(&self, len: usize) -> usize;

    /// 返回 `[low, high]` 内的整数
    fn pick_in_range(&self, low: usize, high: usize) -> usize {
        if high <= low {
            return low;
        }
        low + self.pick_index(high - low + 1)
    }
}

/// 从切片中均匀抽取一项
pub fn choose<'a, T>(picker: &dyn ResponsePicker, items: &'a [T]) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    items.get(picker.pick_index(items.len()))
}

/// 基于 StdRng 的随机源，可指定种子
pub struct SeededPicker {
    rng: Mutex<StdRng>,
}

impl SeededPicker {
    /// 固定种子，输出可复现
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    /// 使用系统熵初始化
    pub fn from_entropy() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_entropy()),
        }
    }
}

impl ResponsePicker for SeededPicker {
    fn pick_index(&self, len: usize) -> usize {
        if len == 0 {
            return 0;
        }
        self.rng.lock().gen_range(0..len)
    }
}

/// 总是返回同一个下标（越界时取最后一个），用于测试
#[derive(Debug, Clone, Copy)]
pub struct FixedPicker(pub usize);

impl ResponsePicker for FixedPicker {
    fn pick_index(&self, len: usize) -> usize {
        self.0.min(len.saturating_sub(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_seed_same_sequence() {
        let a = SeededPicker::from_seed(42);
        let b = SeededPicker::from_seed(42);
        let seq_a: Vec<usize> = (0..20).map(|_| a.pick_index(7)).collect();
        let seq_b: Vec<usize> = (0..20).map(|_| b.pick_index(7)).collect();
        assert_eq!(seq_a, seq_b);
        assert!(seq_a.iter().all(|i| *i < 7));
    }

    #[test]
    fn test_zero_len_is_safe() {
        let picker = SeededPicker::from_entropy();
        assert_eq!(picker.pick_index(0), 0);
        assert!(choose::<u8>(&picker, &[]).is_none());
    }

    #[test]
    fn test_fixed_picker_clamps() {
        let picker = FixedPicker(10);
        assert_eq!(picker.pick_index(3), 2);
        assert_eq!(choose(&picker, &["a", "b"]), Some(&"b"));
    }

    #[test]
    fn test_pick_in_range_inclusive() {
        let picker = FixedPicker(usize::MAX);
        assert_eq!(picker.pick_in_range(3, 5), 5);
        assert_eq!(FixedPicker(0).pick_in_range(3, 5), 3);
        assert_eq!(FixedPicker(0).pick_in_range(4, 4), 4);
    }
}
