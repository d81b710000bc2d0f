use crate::RqRes;
use crate::err::RqErr;
use std::cell::RefCell;
use std::fmt::{Debug, Formatter};
use std::rc::Rc;

/// 可变的共享数据源。
///
/// 克隆得到的是同一数据源的另一个句柄，而不是数据的副本。
/// 每次遍历开始时固定当前缓冲区，遍历期间对数据源的修改会先复制缓冲区（写时复制），
/// 因此一次遍历看到的始终是开始时刻的完整内容。
pub struct Source<T> {
    items: Rc<RefCell<Rc<Vec<T>>>>,
}

impl<T> Clone for Source<T> {
    fn clone(&self) -> Self {
        Source { items: Rc::clone(&self.items) }
    }
}

impl<T: Debug> Debug for Source<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(self.items.borrow().iter()).finish()
    }
}

impl<T> From<Vec<T>> for Source<T> {
    fn from(items: Vec<T>) -> Self {
        Source::new(items)
    }
}

impl<T> Source<T> {
    pub fn new(items: Vec<T>) -> Source<T> {
        Source { items: Rc::new(RefCell::new(Rc::new(items))) }
    }

    pub fn len(&self) -> usize {
        self.items.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.borrow().is_empty()
    }

    /// 从当前内容开始一次新的遍历。
    pub fn cursor(&self) -> Cursor<T> {
        Cursor { items: Rc::clone(&*self.items.borrow()), pos: 0 }
    }
}

impl<T: Clone> Source<T> {
    /// 当前内容的独立副本。
    pub fn snapshot(&self) -> Vec<T> {
        (**self.items.borrow()).clone()
    }

    pub fn get(&self, index: usize) -> Option<T> {
        self.items.borrow().get(index).cloned()
    }

    /// 替换指定位置的元素。
    pub fn set(&self, index: usize, item: T) -> RqRes<()> {
        self.modify(|items| match items.get_mut(index) {
            Some(slot) => {
                *slot = item;
                Ok(())
            }
            None => Err(RqErr::InvalidArgument { op: "set", arg: "index", value: index.to_string() }),
        })
    }

    pub fn push(&self, item: T) {
        self.modify(|items| items.push(item))
    }

    pub fn remove(&self, index: usize) -> RqRes<T> {
        self.modify(|items| {
            if index < items.len() {
                Ok(items.remove(index))
            } else {
                Err(RqErr::InvalidArgument { op: "remove", arg: "index", value: index.to_string() })
            }
        })
    }

    /// 仅保留满足条件的元素，返回移除的数量。
    ///
    /// 条件函数可以读取本数据源，读到的是修改前的内容。
    pub fn retain(&self, mut f: impl FnMut(&T) -> bool) -> usize {
        self.update(|items| {
            let before = items.len();
            items.retain(|item| f(item));
            before - items.len()
        })
    }

    pub fn clear(&self) {
        self.modify(|items| items.clear())
    }

    /// 在当前内容的副本上修改，完成后整体替换数据源。
    ///
    /// 修改函数执行期间可以读取本数据源，读到的是修改前的内容；
    /// 期间对本数据源的其他写入会被本次替换覆盖。
    pub fn update<R>(&self, f: impl FnOnce(&mut Vec<T>) -> R) -> R {
        let mut items = Rc::clone(&*self.items.borrow());
        let res = f(Rc::make_mut(&mut items));
        *self.items.borrow_mut() = items;
        res
    }

    /// 原地修改，仅用于不调用外部函数的修改；仍被遍历固定的缓冲区会先被复制。
    fn modify<R>(&self, f: impl FnOnce(&mut Vec<T>) -> R) -> R {
        let mut guard = self.items.borrow_mut();
        f(Rc::make_mut(&mut *guard))
    }
}

/// 一次遍历的游标，持有遍历开始时的缓冲区。
pub struct Cursor<T> {
    items: Rc<Vec<T>>,
    pos: usize,
}

impl<T: Clone> Iterator for Cursor<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        let item = self.items.get(self.pos).cloned();
        if item.is_some() {
            self.pos += 1;
        }
        item
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.items.len().saturating_sub(self.pos);
        (remaining, Some(remaining))
    }
}
