use crate::err::RqErr;
use crate::query::Query;
use crate::{Float, RqRes};
use itertools::process_results;
use ordered_float::OrderedFloat;

/// 可以求和、求平均值的数值类型。
pub trait Numeric: Copy {
    const ZERO: Self;

    fn to_float(self) -> Float;

    /// 溢出时返回`None`。
    fn checked_add(self, rhs: Self) -> Option<Self>;
}

macro_rules! impl_numeric {
    (int: $($t:ty),*) => {
        $(
            impl Numeric for $t {
                const ZERO: Self = 0;

                #[inline]
                fn to_float(self) -> Float {
                    self as Float
                }

                #[inline]
                fn checked_add(self, rhs: Self) -> Option<Self> {
                    <$t>::checked_add(self, rhs)
                }
            }
        )*
    };
    (float: $($t:ty),*) => {
        $(
            impl Numeric for $t {
                const ZERO: Self = 0.0;

                #[inline]
                fn to_float(self) -> Float {
                    self as Float
                }

                #[inline]
                fn checked_add(self, rhs: Self) -> Option<Self> {
                    Some(self + rhs)
                }
            }
        )*
    };
}

impl_numeric!(int: i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);
impl_numeric!(float: f32, f64);

impl Numeric for OrderedFloat<Float> {
    const ZERO: Self = OrderedFloat(0.0);

    #[inline]
    fn to_float(self) -> Float {
        self.into_inner()
    }

    #[inline]
    fn checked_add(self, rhs: Self) -> Option<Self> {
        Some(self + rhs)
    }
}

/// 终结操作：每次调用都完整地进行一次新的遍历，不共享、不缓存结果。
impl<T: 'static> Query<T> {
    pub fn count(&self) -> RqRes<usize> {
        self.iter().try_fold(0, |count, item| item.map(|_| count + 1))
    }

    /// 空序列的和为零值，整数溢出时报错。
    pub fn sum(&self) -> RqRes<T>
    where
        T: Numeric,
    {
        self.iter().try_fold(T::ZERO, |total, item| total.checked_add(item?).ok_or(RqErr::Overflow { op: "sum" }))
    }

    pub fn average(&self) -> RqRes<Float>
    where
        T: Numeric,
    {
        let (total, count) = self.iter().try_fold((0.0, 0usize), |(total, count), item| {
            item.map(|item| (total + item.to_float(), count + 1))
        })?;
        if count == 0 { Err(RqErr::EmptySequence { op: "average" }) } else { Ok(total / count as Float) }
    }

    /// 最小值，多个相等时取第一个。
    pub fn min(&self) -> RqRes<T>
    where
        T: Ord,
    {
        process_results(self.iter(), |items| items.min())?.ok_or(RqErr::EmptySequence { op: "min" })
    }

    /// 最大值，多个相等时取最后一个。
    pub fn max(&self) -> RqRes<T>
    where
        T: Ord,
    {
        process_results(self.iter(), |items| items.max())?.ok_or(RqErr::EmptySequence { op: "max" })
    }

    pub fn min_by_key<K: Ord>(&self, key: impl Fn(&T) -> K) -> RqRes<T> {
        process_results(self.iter(), |items| items.min_by_key(|item| key(item)))?
            .ok_or(RqErr::EmptySequence { op: "min_by_key" })
    }

    pub fn max_by_key<K: Ord>(&self, key: impl Fn(&T) -> K) -> RqRes<T> {
        process_results(self.iter(), |items| items.max_by_key(|item| key(item)))?
            .ok_or(RqErr::EmptySequence { op: "max_by_key" })
    }

    /// 第一个满足条件的元素，找到后不再拉取上游。
    pub fn first(&self, f: impl Fn(&T) -> bool) -> RqRes<T> {
        self.first_or_none(f)?.ok_or(RqErr::NotFound { op: "first" })
    }

    pub fn first_or_none(&self, f: impl Fn(&T) -> bool) -> RqRes<Option<T>> {
        for item in self.iter() {
            let item = item?;
            if f(&item) {
                return Ok(Some(item));
            }
        }
        Ok(None)
    }

    pub fn any(&self, f: impl Fn(&T) -> bool) -> RqRes<bool> {
        Ok(self.first_or_none(f)?.is_some())
    }

    pub fn all(&self, f: impl Fn(&T) -> bool) -> RqRes<bool> {
        Ok(self.first_or_none(|item| !f(item))?.is_none())
    }

    pub fn fold<A>(&self, init: A, mut f: impl FnMut(A, T) -> A) -> RqRes<A> {
        self.iter().try_fold(init, |acc, item| item.map(|item| f(acc, item)))
    }
}
