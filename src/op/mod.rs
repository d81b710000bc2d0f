pub mod group;
pub mod sort;

use crate::err::RqErr;
use crate::op::sort::SortKeys;
use crate::pipe::Pipe;
use crate::{Integer, RqRes};
use rustc_hash::FxHashSet;
use std::fmt::{Debug, Formatter};
use std::hash::Hash;
use std::rc::Rc;

type Predicate<T> = Rc<dyn Fn(&T) -> bool>;

/// 每次遍历创建一个新的过滤器，过滤器内部的状态只在本次遍历内有效。
type FilterFactory<T> = Rc<dyn Fn() -> Box<dyn FnMut(&T) -> bool>>;

/// 不改变元素类型的单个查询阶段。
///
/// 改变元素类型的投影和分组由`Query`以派生查询的方式表达。
pub enum Op<T> {
    /* **************************************** 访问 **************************************** */
    /// 遍历到每个元素时调用回调，不改变数据。
    Inspect(Rc<dyn Fn(&T)>),
    /* **************************************** 减少 **************************************** */
    /// 仅保留满足条件的元素，条件可能失败。
    Filter(Rc<dyn Fn(&T) -> RqRes<bool>>),
    /// 保留前N个元素，产出N个后不再拉取上游；N为负数时报错。
    Take(Integer),
    /// 丢弃前N个元素；N为负数时报错。
    Skip(Integer),
    /// 持续保留元素，直到条件首次不满足。
    TakeWhile(Predicate<T>),
    /// 持续丢弃元素，直到条件首次不满足。
    SkipWhile(Predicate<T>),
    /// 去重，保留首次出现的元素。
    Distinct(FilterFactory<T>),
    /* **************************************** 调整位置 **************************************** */
    /// 稳定排序，缓冲整个上游。
    Sort(SortKeys<T>),
    /// 逆序，缓冲整个上游。
    Reverse,
}

impl<T> Clone for Op<T> {
    fn clone(&self) -> Self {
        match self {
            Op::Inspect(f) => Op::Inspect(Rc::clone(f)),
            Op::Filter(f) => Op::Filter(Rc::clone(f)),
            Op::Take(count) => Op::Take(*count),
            Op::Skip(count) => Op::Skip(*count),
            Op::TakeWhile(f) => Op::TakeWhile(Rc::clone(f)),
            Op::SkipWhile(f) => Op::SkipWhile(Rc::clone(f)),
            Op::Distinct(factory) => Op::Distinct(Rc::clone(factory)),
            Op::Sort(keys) => Op::Sort(keys.clone()),
            Op::Reverse => Op::Reverse,
        }
    }
}

impl<T> Debug for Op<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Op::Inspect(_) => write!(f, "inspect"),
            Op::Filter(_) => write!(f, "filter"),
            Op::Take(count) => write!(f, "take({count})"),
            Op::Skip(count) => write!(f, "skip({count})"),
            Op::TakeWhile(_) => write!(f, "take_while"),
            Op::SkipWhile(_) => write!(f, "skip_while"),
            Op::Distinct(_) => write!(f, "distinct"),
            Op::Sort(keys) => write!(f, "sort({} key{})", keys.len(), if keys.len() > 1 { "s" } else { "" }),
            Op::Reverse => write!(f, "reverse"),
        }
    }
}

impl<T: 'static> Op<T> {
    pub fn new_filter(f: impl Fn(&T) -> bool + 'static) -> Op<T> {
        Op::Filter(Rc::new(move |item: &T| Ok(f(item))))
    }
    pub fn new_try_filter(f: impl Fn(&T) -> RqRes<bool> + 'static) -> Op<T> {
        Op::Filter(Rc::new(f))
    }
    pub fn new_take_while(f: impl Fn(&T) -> bool + 'static) -> Op<T> {
        Op::TakeWhile(Rc::new(f))
    }
    pub fn new_skip_while(f: impl Fn(&T) -> bool + 'static) -> Op<T> {
        Op::SkipWhile(Rc::new(f))
    }
    pub fn new_inspect(f: impl Fn(&T) + 'static) -> Op<T> {
        Op::Inspect(Rc::new(f))
    }
    pub fn new_distinct() -> Op<T>
    where
        T: Eq + Hash + Clone,
    {
        Op::new_distinct_by(T::clone)
    }
    pub fn new_distinct_by<K: Eq + Hash + 'static>(key: impl Fn(&T) -> K + 'static) -> Op<T> {
        let key = Rc::new(key);
        Op::Distinct(Rc::new(move || {
            let key = Rc::clone(&key);
            let mut seen = FxHashSet::default();
            Box::new(move |item: &T| seen.insert(key(item))) as Box<dyn FnMut(&T) -> bool>
        }))
    }

    /// 在上游数据流上叠加本阶段，不拉取任何数据。
    pub fn wrap(&self, pipe: Pipe<T>) -> Pipe<T> {
        match self {
            Op::Inspect(f) => {
                let f = Rc::clone(f);
                pipe.op_inspect(move |item| f(item))
            }
            Op::Filter(f) => {
                let f = Rc::clone(f);
                pipe.op_try_filter(move |item| f(item))
            }
            Op::Take(count) => match usize::try_from(*count) {
                Ok(count) => Pipe::new(pipe.take(count)),
                Err(_) => Pipe::fail(RqErr::invalid_count("take", count)),
            },
            Op::Skip(count) => match usize::try_from(*count) {
                Ok(count) => Pipe::new(pipe.skip(count)),
                Err(_) => Pipe::fail(RqErr::invalid_count("skip", count)),
            },
            Op::TakeWhile(f) => {
                let f = Rc::clone(f);
                Pipe::new(pipe.take_while(move |item| item.as_ref().map_or(true, |item| f(item))))
            }
            Op::SkipWhile(f) => {
                let f = Rc::clone(f);
                Pipe::new(pipe.skip_while(move |item| item.as_ref().map_or(false, |item| f(item))))
            }
            Op::Distinct(factory) => pipe.op_filter(factory()),
            Op::Sort(keys) => {
                let keys = keys.clone();
                pipe.op_buffered(move |items| keys.sort(items))
            }
            Op::Reverse => pipe.op_buffered(|mut items| {
                items.reverse();
                items
            }),
        }
    }
}
