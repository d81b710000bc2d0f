use itertools::Itertools;
use std::cmp::{Ordering, Reverse};
use std::rc::Rc;

/// 一次排序中某个键的全部取值，按元素下标比较。
type KeyColumn = Box<dyn Fn(usize, usize) -> Ordering>;

/// 对缓冲的元素逐个计算一次键。
type KeyExtractor<T> = Rc<dyn Fn(&[T]) -> KeyColumn>;

/// 多级排序键：先按第一个键比较，相等时依次按后续键比较。
pub struct SortKeys<T> {
    keys: Vec<KeyExtractor<T>>,
}

impl<T> Clone for SortKeys<T> {
    fn clone(&self) -> Self {
        SortKeys { keys: self.keys.clone() }
    }
}

impl<T> SortKeys<T> {
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// 稳定排序。每个键对每个元素只计算一次。
    pub(crate) fn sort(&self, items: Vec<T>) -> Vec<T> {
        let columns = self.keys.iter().map(|key| key(&items)).collect::<Vec<_>>();
        let order = (0..items.len())
            .sorted_by(|&a, &b| columns.iter().fold(Ordering::Equal, |ord, column| ord.then_with(|| column(a, b))));
        let mut slots = items.into_iter().map(Some).collect::<Vec<_>>();
        order.filter_map(|index| slots[index].take()).collect()
    }
}

impl<T: 'static> SortKeys<T> {
    pub(crate) fn by<K: Ord + 'static>(key: impl Fn(&T) -> K + 'static, desc: bool) -> SortKeys<T> {
        SortKeys { keys: vec![extractor(key, desc)] }
    }

    /// 追加次级排序键，返回新的排序键，原排序键不变。
    pub(crate) fn then<K: Ord + 'static>(&self, key: impl Fn(&T) -> K + 'static, desc: bool) -> SortKeys<T> {
        let mut keys = self.keys.clone();
        keys.push(extractor(key, desc));
        SortKeys { keys }
    }
}

fn extractor<T: 'static, K: Ord + 'static>(key: impl Fn(&T) -> K + 'static, desc: bool) -> KeyExtractor<T> {
    Rc::new(move |items: &[T]| -> KeyColumn {
        let values = items.iter().map(&key).collect::<Vec<K>>();
        if desc {
            Box::new(move |a, b| Reverse(&values[a]).cmp(&Reverse(&values[b])))
        } else {
            Box::new(move |a, b| values[a].cmp(&values[b]))
        }
    })
}
