use crate::RqRes;
use crate::err::RqErr;
use itertools::Either;
use std::iter::once;

/// 一次遍历中的惰性数据流。
///
/// 元素以`Result`形式流动，产出第一个错误后即结束。
pub struct Pipe<T> {
    pub(crate) iter: Box<dyn Iterator<Item = RqRes<T>>>,
    failed: bool,
}

impl<T> Iterator for Pipe<T> {
    type Item = RqRes<T>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }
        let next = self.iter.next();
        if let Some(Err(_)) = next {
            self.failed = true;
        }
        next
    }
}

impl<T: 'static> Pipe<T> {
    pub(crate) fn new(iter: impl Iterator<Item = RqRes<T>> + 'static) -> Pipe<T> {
        Pipe { iter: Box::new(iter), failed: false }
    }

    pub(crate) fn of(iter: impl Iterator<Item = T> + 'static) -> Pipe<T> {
        Pipe::new(iter.map(Ok))
    }

    /// 首次拉取时产出错误的数据流。
    pub(crate) fn fail(err: RqErr) -> Pipe<T> {
        Pipe::new(once(Err(err)))
    }

    pub(crate) fn op_map<U: 'static>(self, mut f: impl FnMut(T) -> U + 'static) -> Pipe<U> {
        Pipe::new(self.map(move |item| item.map(&mut f)))
    }

    pub(crate) fn op_try_map<U: 'static>(self, mut f: impl FnMut(T) -> RqRes<U> + 'static) -> Pipe<U> {
        Pipe::new(self.map(move |item| item.and_then(&mut f)))
    }

    pub(crate) fn op_flat_map<U: 'static, I>(self, mut f: impl FnMut(T) -> I + 'static) -> Pipe<U>
    where
        I: IntoIterator<Item = U>,
        I::IntoIter: 'static,
    {
        Pipe::new(self.flat_map(move |item| match item {
            Ok(item) => Either::Left(f(item).into_iter().map(Ok)),
            Err(err) => Either::Right(once(Err(err))),
        }))
    }

    pub(crate) fn op_filter(self, mut f: impl FnMut(&T) -> bool + 'static) -> Pipe<T> {
        Pipe::new(self.filter(move |item| item.as_ref().map_or(true, &mut f)))
    }

    pub(crate) fn op_try_filter(self, mut f: impl FnMut(&T) -> RqRes<bool> + 'static) -> Pipe<T> {
        Pipe::new(self.filter_map(move |item| match item {
            Ok(item) => match f(&item) {
                Ok(true) => Some(Ok(item)),
                Ok(false) => None,
                Err(err) => Some(Err(err)),
            },
            Err(err) => Some(Err(err)),
        }))
    }

    pub(crate) fn op_inspect(self, mut f: impl FnMut(&T) + 'static) -> Pipe<T> {
        Pipe::new(self.inspect(move |item| {
            if let Ok(item) = item {
                f(item)
            }
        }))
    }

    /// 缓冲整个上游后再产出，缓冲发生在首次拉取时。
    pub(crate) fn op_buffered<U: 'static>(self, f: impl FnOnce(Vec<T>) -> Vec<U> + 'static) -> Pipe<U> {
        Pipe::new(
            std::iter::once_with(move || self.collect::<RqRes<Vec<T>>>().map(f)).flat_map(|buffer| match buffer {
                Ok(items) => Either::Left(items.into_iter().map(Ok)),
                Err(err) => Either::Right(once(Err(err))),
            }),
        )
    }
}
