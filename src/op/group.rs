use crate::query::Query;
use rustc_hash::FxHashMap;
use std::hash::Hash;
use std::rc::Rc;

/// 分组：键和按原始顺序排列的组内元素。
///
/// 组内元素是分组时缓冲下来的快照，可以反复遍历，不会再读取数据源。
#[derive(Debug, PartialEq)]
pub struct Group<K, V> {
    key: K,
    items: Rc<[V]>,
}

impl<K: Clone, V> Clone for Group<K, V> {
    fn clone(&self) -> Self {
        Group { key: self.key.clone(), items: Rc::clone(&self.items) }
    }
}

impl<K, V> Group<K, V> {
    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn items(&self) -> &[V] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, V> {
        self.items.iter()
    }
}

impl<K, V: Clone + 'static> Group<K, V> {
    /// 以组内快照作为数据源的查询。
    pub fn to_query(&self) -> Query<V> {
        let items = Rc::clone(&self.items);
        Query::from_fn(move || {
            let items = Rc::clone(&items);
            (0..items.len()).map(move |index| items[index].clone())
        })
    }
}

impl<'a, K, V> IntoIterator for &'a Group<K, V> {
    type Item = &'a V;
    type IntoIter = std::slice::Iter<'a, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// 按键分组，键的顺序为首次出现的顺序，组内元素保持原始顺序。
pub(crate) fn group<T, K, V>(items: Vec<T>, key: &dyn Fn(&T) -> K, element: &dyn Fn(T) -> V) -> Vec<Group<K, V>>
where
    K: Eq + Hash + Clone,
{
    let mut index = FxHashMap::default();
    let mut groups: Vec<(K, Vec<V>)> = Vec::new();
    for item in items {
        let k = key(&item);
        let pos = *index.entry(k.clone()).or_insert_with(|| {
            groups.push((k, Vec::new()));
            groups.len() - 1
        });
        groups[pos].1.push(element(item));
    }
    groups.into_iter().map(|(key, items)| Group { key, items: Rc::from(items) }).collect()
}
