mod aggregate;

pub use aggregate::Numeric;

use crate::op::Op;
use crate::op::group::{Group, group};
use crate::op::sort::SortKeys;
use crate::pipe::Pipe;
use crate::source::Source;
use crate::{Integer, RqRes};
use std::fmt::{Debug, Formatter};
use std::hash::Hash;
use std::ops::Deref;
use std::rc::Rc;

/// 不可变的惰性查询。
///
/// 组合操作只会生成新的查询，不会修改原查询，也不会触碰任何数据；
/// 每次调用[`Query::iter`]都会从数据源的当前内容重新开始一次遍历。
pub struct Query<T> {
    stage: Rc<Stage<T>>,
}

enum Stage<T> {
    /// 数据源或派生查询，`parent`为派生查询的上游。
    Produce { name: &'static str, parent: Option<Rc<dyn Plan>>, produce: Box<dyn Fn() -> Pipe<T>> },
    /// 上游查询后接一个阶段。
    Op { upstream: Query<T>, op: Op<T> },
}

/// 描述查询的各个阶段。
trait Plan {
    fn plan_into(&self, plan: &mut Vec<String>);
}

impl<T> Plan for Query<T> {
    fn plan_into(&self, plan: &mut Vec<String>) {
        match self.stage.as_ref() {
            Stage::Produce { name, parent, .. } => {
                if let Some(parent) = parent {
                    parent.plan_into(plan);
                }
                plan.push(name.to_string());
            }
            Stage::Op { upstream, op } => {
                upstream.plan_into(plan);
                plan.push(format!("{op:?}"));
            }
        }
    }
}

impl<T> Clone for Query<T> {
    fn clone(&self) -> Self {
        Query { stage: Rc::clone(&self.stage) }
    }
}

impl<T> Debug for Query<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.plan().join(" -> "))
    }
}

impl<T: 'static> IntoIterator for &Query<T> {
    type Item = RqRes<T>;
    type IntoIter = Pipe<T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T> Query<T> {
    /// 从数据源到最后一个阶段的阶段列表，不触碰数据。
    pub fn plan(&self) -> Vec<String> {
        let mut plan = Vec::new();
        self.plan_into(&mut plan);
        plan
    }
}

impl<T: 'static> Query<T> {
    /* **************************************** 构造 **************************************** */
    /// 以共享数据源构造查询，查询只持有数据源的句柄。
    pub fn from_source(source: &Source<T>) -> Query<T>
    where
        T: Clone,
    {
        let source = source.clone();
        Query::produce("source", None, move || Pipe::of(source.cursor()))
    }

    /// 以固定的元素构造查询。
    pub fn from_vec(items: Vec<T>) -> Query<T>
    where
        T: Clone,
    {
        Query::from_source(&Source::new(items))
    }

    /// 以可重复调用的生成函数构造查询，每次遍历调用一次，可以是无限序列。
    pub fn from_fn<I>(f: impl Fn() -> I + 'static) -> Query<T>
    where
        I: IntoIterator<Item = T>,
        I::IntoIter: 'static,
    {
        Query::produce("generator", None, move || Pipe::of(f().into_iter()))
    }

    fn produce(
        name: &'static str, parent: Option<Rc<dyn Plan>>, produce: impl Fn() -> Pipe<T> + 'static,
    ) -> Query<T> {
        Query { stage: Rc::new(Stage::Produce { name, parent, produce: Box::new(produce) }) }
    }

    /// 基于本查询派生新元素类型的查询。
    fn derive<U: 'static>(&self, name: &'static str, f: impl Fn(Pipe<T>) -> Pipe<U> + 'static) -> Query<U> {
        let upstream = self.clone();
        let parent: Rc<dyn Plan> = Rc::new(self.clone());
        Query::produce(name, Some(parent), move || f(upstream.iter()))
    }

    /* **************************************** 组合 **************************************** */
    /// 在本查询后追加一个阶段，返回新查询。
    pub fn compose(&self, op: Op<T>) -> Query<T> {
        Query { stage: Rc::new(Stage::Op { upstream: self.clone(), op }) }
    }

    pub fn filter(&self, f: impl Fn(&T) -> bool + 'static) -> Query<T> {
        self.compose(Op::new_filter(f))
    }

    /// 条件函数返回的错误原样传递给触发遍历的调用者。
    pub fn try_filter(&self, f: impl Fn(&T) -> RqRes<bool> + 'static) -> Query<T> {
        self.compose(Op::new_try_filter(f))
    }

    pub fn project<U: 'static>(&self, f: impl Fn(T) -> U + 'static) -> Query<U> {
        let f = Rc::new(f);
        self.derive("project", move |pipe| {
            let f = Rc::clone(&f);
            pipe.op_map(move |item| f(item))
        })
    }

    pub fn try_project<U: 'static>(&self, f: impl Fn(T) -> RqRes<U> + 'static) -> Query<U> {
        let f = Rc::new(f);
        self.derive("project", move |pipe| {
            let f = Rc::clone(&f);
            pipe.op_try_map(move |item| f(item))
        })
    }

    /// 每个元素投影为多个元素并展开。
    pub fn project_many<U: 'static, I>(&self, f: impl Fn(T) -> I + 'static) -> Query<U>
    where
        I: IntoIterator<Item = U>,
        I::IntoIter: 'static,
    {
        let f = Rc::new(f);
        self.derive("project_many", move |pipe| {
            let f = Rc::clone(&f);
            pipe.op_flat_map(move |item| f(item))
        })
    }

    pub fn sort_by<K: Ord + 'static>(&self, key: impl Fn(&T) -> K + 'static) -> Sorted<T> {
        Sorted::new(self.clone(), SortKeys::by(key, false))
    }

    pub fn sort_by_desc<K: Ord + 'static>(&self, key: impl Fn(&T) -> K + 'static) -> Sorted<T> {
        Sorted::new(self.clone(), SortKeys::by(key, true))
    }

    /// 按键分组，组的顺序为键首次出现的顺序。
    pub fn group_by<K>(&self, key: impl Fn(&T) -> K + 'static) -> Query<Group<K, T>>
    where
        K: Eq + Hash + Clone + 'static,
    {
        self.group_by_with(key, |item| item)
    }

    /// 按键分组，组内元素由`element`投影。
    pub fn group_by_with<K, V: 'static>(
        &self, key: impl Fn(&T) -> K + 'static, element: impl Fn(T) -> V + 'static,
    ) -> Query<Group<K, V>>
    where
        K: Eq + Hash + Clone + 'static,
    {
        let selectors = Rc::new((key, element));
        self.derive("group_by", move |pipe| {
            let selectors = Rc::clone(&selectors);
            pipe.op_buffered(move |items| group(items, &selectors.0, &selectors.1))
        })
    }

    pub fn take(&self, count: Integer) -> Query<T> {
        self.compose(Op::Take(count))
    }

    pub fn skip(&self, count: Integer) -> Query<T> {
        self.compose(Op::Skip(count))
    }

    pub fn take_while(&self, f: impl Fn(&T) -> bool + 'static) -> Query<T> {
        self.compose(Op::new_take_while(f))
    }

    pub fn skip_while(&self, f: impl Fn(&T) -> bool + 'static) -> Query<T> {
        self.compose(Op::new_skip_while(f))
    }

    pub fn distinct(&self) -> Query<T>
    where
        T: Eq + Hash + Clone,
    {
        self.compose(Op::new_distinct())
    }

    pub fn distinct_by<K: Eq + Hash + 'static>(&self, key: impl Fn(&T) -> K + 'static) -> Query<T> {
        self.compose(Op::new_distinct_by(key))
    }

    pub fn reverse(&self) -> Query<T> {
        self.compose(Op::Reverse)
    }

    pub fn inspect(&self, f: impl Fn(&T) + 'static) -> Query<T> {
        self.compose(Op::new_inspect(f))
    }

    /* **************************************** 遍历 **************************************** */
    /// 开始一次新的遍历，在首次拉取前不读取任何数据。
    pub fn iter(&self) -> Pipe<T> {
        match self.stage.as_ref() {
            Stage::Produce { produce, .. } => produce(),
            Stage::Op { upstream, op } => op.wrap(upstream.iter()),
        }
    }

    /// 立即遍历并收集结果，结果与数据源后续的修改无关。
    pub fn materialize(&self) -> RqRes<Vec<T>> {
        self.iter().collect()
    }
}

/// 排序后的查询，可以继续追加次级排序键。
pub struct Sorted<T> {
    upstream: Query<T>,
    keys: SortKeys<T>,
    query: Query<T>,
}

impl<T> Clone for Sorted<T> {
    fn clone(&self) -> Self {
        Sorted { upstream: self.upstream.clone(), keys: self.keys.clone(), query: self.query.clone() }
    }
}

impl<T> Deref for Sorted<T> {
    type Target = Query<T>;

    fn deref(&self) -> &Self::Target {
        &self.query
    }
}

impl<T> From<Sorted<T>> for Query<T> {
    fn from(sorted: Sorted<T>) -> Self {
        sorted.query
    }
}

impl<T: 'static> Sorted<T> {
    fn new(upstream: Query<T>, keys: SortKeys<T>) -> Sorted<T> {
        let query = upstream.compose(Op::Sort(keys.clone()));
        Sorted { upstream, keys, query }
    }

    /// 主键相等时按此键升序排序。
    pub fn then_by<K: Ord + 'static>(&self, key: impl Fn(&T) -> K + 'static) -> Sorted<T> {
        Sorted::new(self.upstream.clone(), self.keys.then(key, false))
    }

    /// 主键相等时按此键降序排序。
    pub fn then_by_desc<K: Ord + 'static>(&self, key: impl Fn(&T) -> K + 'static) -> Sorted<T> {
        Sorted::new(self.upstream.clone(), self.keys.then(key, true))
    }

    pub fn into_query(self) -> Query<T> {
        self.query
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::err::RqErr;
    use std::cell::{Cell, RefCell};

    #[derive(Debug, Clone, PartialEq)]
    struct Person {
        name: &'static str,
        age: i32,
    }

    fn person(name: &'static str, age: i32) -> Person {
        Person { name, age }
    }

    fn counter() -> (Rc<Cell<usize>>, Rc<Cell<usize>>) {
        let calls = Rc::new(Cell::new(0));
        (Rc::clone(&calls), calls)
    }

    #[test]
    fn test_compose_is_lazy() {
        let (calls, c) = counter();
        let source = Source::new(vec![1, 2, 3, 4]);
        let c1 = Rc::clone(&c);
        let c2 = Rc::clone(&c);
        let c3 = Rc::clone(&c);
        let query = Query::from_source(&source)
            .filter(move |x| {
                c1.set(c1.get() + 1);
                x % 2 == 0
            })
            .project(move |x| {
                c2.set(c2.get() + 1);
                x * 10
            })
            .sort_by(move |x| {
                c3.set(c3.get() + 1);
                -x
            })
            .then_by(|x| *x)
            .reverse()
            .group_by(|x| *x > 20)
            .take(1);
        let pipe = query.iter();
        assert_eq!(calls.get(), 0);
        drop(pipe);
        assert_eq!(calls.get(), 0);
        assert_eq!(query.count(), Ok(1));
        assert!(calls.get() > 0);
    }

    #[test]
    fn test_live_reread() {
        let names = Source::new(vec!["A", "B", "C"]);
        let query = Query::from_source(&names).filter(|x| *x == "A");
        assert_eq!(query.materialize(), Ok(vec!["A"]));
        names.set(0, "Z").unwrap();
        assert_eq!(query.materialize(), Ok(vec![]));
    }

    #[test]
    fn test_live_reread_prefix() {
        let names = Source::new(vec!["Allen", "Arthur", "Bennett"]);
        let ayes = Query::from_source(&names).filter(|s| s.starts_with('A'));
        assert_eq!(ayes.materialize(), Ok(vec!["Allen", "Arthur"]));
        names.set(0, "Bob").unwrap();
        assert_eq!(ayes.materialize(), Ok(vec!["Arthur"]));
    }

    #[test]
    fn test_materialize_decouples() {
        let names = Source::new(vec!["A", "B", "C"]);
        let snapshot = Query::from_source(&names).filter(|x| *x == "A").materialize().unwrap();
        names.set(0, "Z").unwrap();
        assert_eq!(snapshot, vec!["A"]);
    }

    #[test]
    fn test_traversal_snapshot() {
        let source = Source::new(vec![1, 2, 3]);
        let query = Query::from_source(&source).project(|x| x * 2);
        let mut first = query.iter();
        assert_eq!(first.next(), Some(Ok(2)));
        source.set(1, 100).unwrap();
        let second = query.materialize();
        assert_eq!(first.collect::<RqRes<Vec<_>>>(), Ok(vec![4, 6]));
        assert_eq!(second, Ok(vec![2, 200, 6]));
    }

    #[test]
    fn test_filter_then_project_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let (l1, l2) = (Rc::clone(&log), Rc::clone(&log));
        let query = Query::from_vec(vec![1, 2, 3])
            .filter(move |x| {
                l1.borrow_mut().push(format!("filter {x}"));
                *x != 2
            })
            .project(move |x| {
                l2.borrow_mut().push(format!("project {x}"));
                x
            });
        assert_eq!(query.materialize(), Ok(vec![1, 3]));
        assert_eq!(*log.borrow(), vec!["filter 1", "project 1", "filter 2", "filter 3", "project 3"]);
    }

    #[test]
    fn test_predicate_once_per_element() {
        let (calls, c) = counter();
        let query = Query::from_vec(vec![1, 2, 3]).filter(move |_| {
            c.set(c.get() + 1);
            true
        });
        assert_eq!(query.count(), Ok(3));
        assert_eq!(calls.get(), 3);
        assert_eq!(query.count(), Ok(3));
        assert_eq!(calls.get(), 6);
    }

    #[test]
    fn test_predicate_observes_external_state() {
        let limit = Rc::new(Cell::new(2));
        let l = Rc::clone(&limit);
        let query = Query::from_vec(vec![1, 2, 3, 4]).filter(move |x| *x <= l.get());
        assert_eq!(query.materialize(), Ok(vec![1, 2]));
        limit.set(3);
        assert_eq!(query.materialize(), Ok(vec![1, 2, 3]));
    }

    #[test]
    fn test_compose_keeps_original() {
        let base = Query::from_vec(vec![3, 1, 2]);
        let sorted = base.sort_by(|x| *x);
        let taken = base.take(1);
        assert_eq!(base.materialize(), Ok(vec![3, 1, 2]));
        assert_eq!(sorted.materialize(), Ok(vec![1, 2, 3]));
        assert_eq!(taken.materialize(), Ok(vec![3]));
    }

    #[test]
    fn test_stable_multi_key_sort() {
        let people = Query::from_vec(vec![person("Claudia", 49), person("Claudia", 48), person("Marvin", 25)]);
        let sorted = people.sort_by(|p| p.name).then_by(|p| p.age);
        assert_eq!(
            sorted.materialize(),
            Ok(vec![person("Claudia", 48), person("Claudia", 49), person("Marvin", 25)])
        );
        assert_eq!(
            sorted.reverse().materialize(),
            Ok(vec![person("Marvin", 25), person("Claudia", 49), person("Claudia", 48)])
        );
    }

    #[test]
    fn test_sort_ties_keep_source_order() {
        let people = Query::from_vec(vec![person("b", 1), person("a", 2), person("b", 0), person("a", 1)]);
        let sorted = people.sort_by(|p| p.name).materialize().unwrap();
        assert_eq!(sorted.iter().map(|p| p.age).collect::<Vec<_>>(), vec![2, 1, 1, 0]);
        let reversed = people.sort_by(|p| p.name).reverse().materialize().unwrap();
        assert_eq!(reversed.iter().map(|p| p.age).collect::<Vec<_>>(), vec![0, 1, 1, 2]);
    }

    #[test]
    fn test_sort_desc() {
        let people = Query::from_vec(vec![person("a", 1), person("b", 2), person("a", 3)]);
        let sorted = people.sort_by_desc(|p| p.name).then_by_desc(|p| p.age);
        assert_eq!(sorted.materialize(), Ok(vec![person("b", 2), person("a", 3), person("a", 1)]));
        let sorted = people.sort_by(|p| p.name).then_by_desc(|p| p.age).then_by(|p| p.name);
        assert_eq!(sorted.materialize(), Ok(vec![person("a", 3), person("a", 1), person("b", 2)]));
    }

    #[test]
    fn test_then_by_keeps_primary() {
        let people = Query::from_vec(vec![person("b", 1), person("a", 2)]);
        let primary = people.sort_by(|p| p.name);
        let _refined = primary.then_by(|p| p.age);
        assert_eq!(primary.plan(), vec!["source", "sort(1 key)"]);
    }

    #[test]
    fn test_group_by() {
        let people = Query::from_vec(vec![person("Cláudia", 49), person("Jorge", 63), person("Cláudia", 48)]);
        let groups = people.group_by_with(|p| p.name, |p| p.age).materialize().unwrap();
        assert_eq!(groups.len(), 2);
        assert_eq!((groups[0].key(), groups[0].items()), (&"Cláudia", &[49, 48][..]));
        assert_eq!((groups[1].key(), groups[1].items()), (&"Jorge", &[63][..]));
        let groups = people.group_by(|p| p.name).materialize().unwrap();
        assert_eq!(groups[0].items(), &[person("Cláudia", 49), person("Cláudia", 48)]);
    }

    #[test]
    fn test_group_rebuffers_each_traversal() {
        let source = Source::new(vec![1, 2, 3]);
        let groups = Query::from_source(&source).group_by(|x| x % 2);
        assert_eq!(groups.count(), Ok(2));
        source.update(|items| items.retain(|x| x % 2 == 1));
        let snapshot = groups.materialize().unwrap();
        assert_eq!(snapshot.len(), 1);
        source.push(5);
        assert_eq!(snapshot[0].items(), &[1, 3]);
        assert_eq!(groups.materialize().unwrap()[0].items(), &[1, 3, 5]);
    }

    #[test]
    fn test_take_skip_boundary() {
        let (calls, c) = counter();
        let query = Query::from_vec(vec![1, 2, 3]).inspect(move |_| c.set(c.get() + 1));
        assert_eq!(query.take(0).materialize(), Ok(vec![]));
        assert_eq!(calls.get(), 0);
        assert_eq!(query.skip(5).materialize(), Ok(vec![]));
        assert_eq!(query.skip(1).take(1).materialize(), Ok(vec![2]));
        assert_eq!(query.take(-1).materialize(), Err(RqErr::invalid_count("take", -1)));
        assert_eq!(query.skip(-1).materialize(), Err(RqErr::invalid_count("skip", -1)));
    }

    #[test]
    fn test_invalid_count_on_first_pull() {
        let query = Query::from_vec(vec![1]).take(-5);
        let mut pipe = query.iter();
        assert_eq!(pipe.next(), Some(Err(RqErr::invalid_count("take", -5))));
        assert_eq!(pipe.next(), None);
    }

    #[test]
    fn test_unbounded_source() {
        let query = Query::from_fn(|| 1..).filter(|x: &i64| x % 3 == 0).take(3);
        assert_eq!(query.materialize(), Ok(vec![3, 6, 9]));
    }

    #[test]
    fn test_try_project_error_unchanged() {
        let query = Query::from_vec(vec!["1", "x", "3"])
            .try_project(|s| s.parse::<i32>().map_err(|err| RqErr::Selector(format!("{s}: {err}"))));
        assert_eq!(
            query.materialize(),
            Err(RqErr::Selector("x: invalid digit found in string".to_string()))
        );
    }

    #[test]
    fn test_project_many() {
        let names = Query::from_vec(vec!["Marvin Thomaz", "Jorge Batista"]);
        let words = names.project_many(|name| name.split(' ').collect::<Vec<_>>());
        assert_eq!(words.materialize(), Ok(vec!["Marvin", "Thomaz", "Jorge", "Batista"]));
    }

    #[test]
    fn test_distinct_reverse() {
        let query = Query::from_vec(vec![1, 2, 1, 3, 2]).distinct().reverse();
        assert_eq!(query.materialize(), Ok(vec![3, 2, 1]));
        let query = Query::from_vec(vec!["a", "A", "b"]).distinct_by(|s| s.to_lowercase());
        assert_eq!(query.materialize(), Ok(vec!["a", "b"]));
    }

    #[test]
    fn test_take_skip_while() {
        let query = Query::from_vec(vec![1, 2, 5, 1]);
        assert_eq!(query.take_while(|x| *x < 3).materialize(), Ok(vec![1, 2]));
        assert_eq!(query.skip_while(|x| *x < 3).materialize(), Ok(vec![5, 1]));
    }

    #[test]
    fn test_plan() {
        let query = Query::from_vec(vec![1, 2, 3]).filter(|x| *x > 1).project(|x| x.to_string()).take(2);
        assert_eq!(query.plan(), vec!["source", "filter", "project", "take(2)"]);
        assert_eq!(format!("{query:?}"), "source -> filter -> project -> take(2)");
    }

    #[test]
    fn test_into_iterator() {
        let query = Query::from_vec(vec![1, 2]);
        let mut total = 0;
        for item in &query {
            total += item.unwrap();
        }
        assert_eq!(total, 3);
    }
}
