use crate::RqRes;
use crate::query::Query;
use crate::source::Source;
use std::marker::PhantomData;

/// 数据访问对象，负责元素的增删改查。
pub trait Dao<T> {
    fn create(&self, entity: T);

    /// 以`entity`替换所有满足`target`的元素，返回替换的数量。
    fn update(&self, entity: T, target: &dyn Fn(&T) -> bool) -> usize;

    /// 移除所有满足条件的元素，返回移除的数量。
    fn delete(&self, condition: &dyn Fn(&T) -> bool) -> usize;

    /// 所有元素的惰性查询，每次遍历读取当前内容。
    fn list(&self) -> Query<T>;
}

/// 以共享数据源存储元素的[`Dao`]。
pub struct SourceDao<T> {
    source: Source<T>,
}

impl<T> SourceDao<T> {
    pub fn new(source: Source<T>) -> SourceDao<T> {
        SourceDao { source }
    }

    pub fn source(&self) -> &Source<T> {
        &self.source
    }
}

impl<T: Clone + 'static> Dao<T> for SourceDao<T> {
    fn create(&self, entity: T) {
        self.source.push(entity)
    }

    fn update(&self, entity: T, target: &dyn Fn(&T) -> bool) -> usize {
        self.source.update(|items| {
            let mut updated = 0;
            for slot in items.iter_mut().filter(|item| target(item)) {
                *slot = entity.clone();
                updated += 1;
            }
            updated
        })
    }

    fn delete(&self, condition: &dyn Fn(&T) -> bool) -> usize {
        self.source.retain(|item| !condition(item))
    }

    fn list(&self) -> Query<T> {
        Query::from_source(&self.source)
    }
}

/// 基于[`Dao`]的仓储。
pub struct Repository<T, D> {
    dao: D,
    _entity: PhantomData<T>,
}

impl<T: 'static, D: Dao<T>> Repository<T, D> {
    pub fn new(dao: D) -> Repository<T, D> {
        Repository { dao, _entity: PhantomData }
    }

    pub fn dao(&self) -> &D {
        &self.dao
    }

    /// 已存在键相等的元素时更新，否则新增。返回是否为更新。
    pub fn save<K: PartialEq>(&self, entity: T, key: impl Fn(&T) -> K) -> RqRes<bool> {
        let id = key(&entity);
        let same = |item: &T| key(item) == id;
        if self.dao.list().any(same)? {
            self.dao.update(entity, &same);
            Ok(true)
        } else {
            self.dao.create(entity);
            Ok(false)
        }
    }

    pub fn delete(&self, condition: impl Fn(&T) -> bool) -> usize {
        self.dao.delete(&condition)
    }

    /// 满足条件的元素的惰性查询，与数据源的后续修改保持同步。
    pub fn find(&self, condition: impl Fn(&T) -> bool + 'static) -> Query<T> {
        self.dao.list().filter(condition)
    }

    pub fn find_by_id(&self, condition: impl Fn(&T) -> bool) -> RqRes<Option<T>> {
        self.dao.list().first_or_none(condition)
    }

    pub fn to_list(&self) -> Query<T> {
        self.dao.list()
    }
}
