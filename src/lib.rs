//! 惰性查询流水线：在内存序列上声明过滤、投影、排序、分组与聚合，
//! 每次遍历时才从数据源重新拉取数据。

pub mod err;
pub mod expr;
pub mod op;
pub mod parse;
pub mod pipe;
pub mod query;
pub mod repository;
pub mod source;

pub use err::RqErr;
pub use op::group::Group;
pub use pipe::Pipe;
pub use query::{Numeric, Query, Sorted};
pub use source::Source;

/// 整数类型
pub type Integer = i64;

/// 浮点数类型
pub type Float = f64;

pub type RqRes<T> = Result<T, RqErr>;
