use crate::err::RqErr;
use crate::{Float, Integer, RqRes};
use ordered_float::OrderedFloat;
use regex::Regex;
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};
use std::rc::Rc;

/// 表达式中的值
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Integer(Integer),
    Float(OrderedFloat<Float>),
    Text(String),
    Bool(bool),
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Integer(i) => write!(f, "{i}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Text(s) => write!(f, "\"{s}\""),
            Value::Bool(b) => write!(f, "{b}"),
        }
    }
}

impl From<Integer> for Value {
    fn from(value: Integer) -> Self {
        Value::Integer(value)
    }
}

impl From<Float> for Value {
    fn from(value: Float) -> Self {
        Value::Float(OrderedFloat(value))
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Text(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl Value {
    fn as_float(&self) -> Option<Float> {
        match self {
            Value::Integer(i) => Some(*i as Float),
            Value::Float(v) => Some(v.into_inner()),
            _ => None,
        }
    }

    /// 不同类型的数值按浮点数比较，其他类型只能与同类型比较。
    fn compare(&self, other: &Value) -> Option<Ordering> {
        match (self, other) {
            (Value::Integer(l), Value::Integer(r)) => Some(l.cmp(r)),
            (Value::Text(l), Value::Text(r)) => Some(l.cmp(r)),
            (Value::Bool(l), Value::Bool(r)) => Some(l.cmp(r)),
            (l, r) => Some(OrderedFloat(l.as_float()?).cmp(&OrderedFloat(r.as_float()?))),
        }
    }

    /// 文本拼接时使用的原始文本，不带引号。
    fn raw(&self) -> String {
        match self {
            Value::Text(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// 按名称访问字段，供表达式求值使用。
pub trait Fields {
    fn field(&self, name: &str) -> Option<Value>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    Equal,
    NotEqual,
    LessThan,
    LessThanOrEqual,
    GreaterThan,
    GreaterThanOrEqual,
    AndAlso,
    OrElse,
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
}

impl BinOp {
    pub fn symbol(&self) -> &'static str {
        match self {
            BinOp::Equal => "==",
            BinOp::NotEqual => "!=",
            BinOp::LessThan => "<",
            BinOp::LessThanOrEqual => "<=",
            BinOp::GreaterThan => ">",
            BinOp::GreaterThanOrEqual => ">=",
            BinOp::AndAlso => "&&",
            BinOp::OrElse => "||",
            BinOp::Add => "+",
            BinOp::Subtract => "-",
            BinOp::Multiply => "*",
            BinOp::Divide => "/",
            BinOp::Modulo => "%",
        }
    }

    pub fn node_type(&self) -> &'static str {
        match self {
            BinOp::Equal => "Equal",
            BinOp::NotEqual => "NotEqual",
            BinOp::LessThan => "LessThan",
            BinOp::LessThanOrEqual => "LessThanOrEqual",
            BinOp::GreaterThan => "GreaterThan",
            BinOp::GreaterThanOrEqual => "GreaterThanOrEqual",
            BinOp::AndAlso => "AndAlso",
            BinOp::OrElse => "OrElse",
            BinOp::Add => "Add",
            BinOp::Subtract => "Subtract",
            BinOp::Multiply => "Multiply",
            BinOp::Divide => "Divide",
            BinOp::Modulo => "Modulo",
        }
    }
}

/// 表达式树节点
#[derive(Debug, Clone)]
pub enum Expr {
    Parameter(String),
    Constant(Value),
    Member { target: Box<Expr>, name: String },
    Not(Box<Expr>),
    Negate(Box<Expr>),
    Binary { op: BinOp, left: Box<Expr>, right: Box<Expr> },
    /// 文本整体匹配正则，`pattern`为原始正则。
    Match { target: Box<Expr>, pattern: String, regex: Regex },
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Expr::Parameter(l), Expr::Parameter(r)) => l == r,
            (Expr::Constant(l), Expr::Constant(r)) => l == r,
            (Expr::Member { target: l_t, name: l_n }, Expr::Member { target: r_t, name: r_n }) => {
                l_t == r_t && l_n == r_n
            }
            (Expr::Not(l), Expr::Not(r)) => l == r,
            (Expr::Negate(l), Expr::Negate(r)) => l == r,
            (
                Expr::Binary { op: l_op, left: l_l, right: l_r },
                Expr::Binary { op: r_op, left: r_l, right: r_r },
            ) => l_op == r_op && l_l == r_l && l_r == r_r,
            // Regex 比较模式字符串
            (Expr::Match { target: l_t, pattern: l_p, .. }, Expr::Match { target: r_t, pattern: r_p, .. }) => {
                l_t == r_t && l_p == r_p
            }
            _ => false,
        }
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Expr::Parameter(name) => write!(f, "{name}"),
            Expr::Constant(value) => write!(f, "{value}"),
            Expr::Member { target, name } => write!(f, "{target}.{name}"),
            Expr::Not(inner) => write!(f, "Not({inner})"),
            Expr::Negate(inner) => write!(f, "-{inner}"),
            Expr::Binary { op, left, right } => write!(f, "({left} {} {right})", op.symbol()),
            Expr::Match { target, pattern, .. } => write!(f, "({target} ~ \"{pattern}\")"),
        }
    }
}

impl Expr {
    pub fn binary(op: BinOp, left: Expr, right: Expr) -> Expr {
        Expr::Binary { op, left: Box::new(left), right: Box::new(right) }
    }

    pub fn member(target: Expr, name: impl Into<String>) -> Expr {
        Expr::Member { target: Box::new(target), name: name.into() }
    }

    /// 构造正则匹配节点，正则需要匹配整个文本。
    pub fn new_match(target: Expr, pattern: String) -> RqRes<Expr> {
        let reg = format!(r"\A(?:{})\z", pattern);
        match Regex::new(&reg) {
            Ok(regex) => Ok(Expr::Match { target: Box::new(target), pattern, regex }),
            Err(err) => Err(RqErr::InvalidArgument { op: "match", arg: "regex", value: format!("{pattern}: {err}") }),
        }
    }

    pub fn node_type(&self) -> &'static str {
        match self {
            Expr::Parameter(_) => "Parameter",
            Expr::Constant(_) => "Constant",
            Expr::Member { .. } => "MemberAccess",
            Expr::Not(_) => "Not",
            Expr::Negate(_) => "Negate",
            Expr::Binary { op, .. } => op.node_type(),
            Expr::Match { .. } => "Match",
        }
    }

    /// 所有引用到的参数名。
    fn parameters<'a>(&'a self, names: &mut Vec<&'a str>) {
        match self {
            Expr::Parameter(name) => names.push(name),
            Expr::Constant(_) => {}
            Expr::Member { target, .. } | Expr::Not(target) | Expr::Negate(target) | Expr::Match { target, .. } => {
                target.parameters(names)
            }
            Expr::Binary { left, right, .. } => {
                left.parameters(names);
                right.parameters(names);
            }
        }
    }

    fn eval<T: Fields>(&self, param: &str, item: &T) -> RqRes<Value> {
        match self {
            Expr::Parameter(name) => Err(self.error(format!("parameter `{name}` cannot be used as a value"))),
            Expr::Constant(value) => Ok(value.clone()),
            Expr::Member { target, name } => match target.as_ref() {
                Expr::Parameter(p) if p == param => {
                    item.field(name).ok_or_else(|| self.error(format!("unknown field `{name}`")))
                }
                _ => Err(self.error("member access is only supported on the parameter".to_string())),
            },
            Expr::Not(inner) => match inner.eval(param, item)? {
                Value::Bool(b) => Ok(Value::Bool(!b)),
                other => Err(self.error(format!("expected bool, found {other}"))),
            },
            Expr::Negate(inner) => match inner.eval(param, item)? {
                Value::Integer(i) => i.checked_neg().map(Value::Integer).ok_or_else(|| self.error("overflow".to_string())),
                Value::Float(v) => Ok(Value::Float(-v)),
                other => Err(self.error(format!("expected number, found {other}"))),
            },
            Expr::Binary { op: BinOp::AndAlso, left, right } => {
                Ok(Value::Bool(self.eval_bool(left, param, item)? && self.eval_bool(right, param, item)?))
            }
            Expr::Binary { op: BinOp::OrElse, left, right } => {
                Ok(Value::Bool(self.eval_bool(left, param, item)? || self.eval_bool(right, param, item)?))
            }
            Expr::Binary { op, left, right } => {
                let l = left.eval(param, item)?;
                let r = right.eval(param, item)?;
                self.apply(*op, l, r)
            }
            Expr::Match { target, regex, .. } => match target.eval(param, item)? {
                Value::Text(text) => Ok(Value::Bool(regex.is_match(&text))),
                other => Err(self.error(format!("expected text, found {other}"))),
            },
        }
    }

    fn eval_bool<T: Fields>(&self, expr: &Expr, param: &str, item: &T) -> RqRes<bool> {
        match expr.eval(param, item)? {
            Value::Bool(b) => Ok(b),
            other => Err(self.error(format!("expected bool operand, found {other}"))),
        }
    }

    fn apply(&self, op: BinOp, l: Value, r: Value) -> RqRes<Value> {
        let mismatch = |l: &Value, r: &Value| self.error(format!("unsupported operands {l} {} {r}", op.symbol()));
        match op {
            BinOp::Equal | BinOp::NotEqual => {
                let ord = l.compare(&r).ok_or_else(|| mismatch(&l, &r))?;
                Ok(Value::Bool((ord == Ordering::Equal) == (op == BinOp::Equal)))
            }
            BinOp::LessThan | BinOp::LessThanOrEqual | BinOp::GreaterThan | BinOp::GreaterThanOrEqual => {
                let ord = l.compare(&r).ok_or_else(|| mismatch(&l, &r))?;
                Ok(Value::Bool(match op {
                    BinOp::LessThan => ord.is_lt(),
                    BinOp::LessThanOrEqual => ord.is_le(),
                    BinOp::GreaterThan => ord.is_gt(),
                    _ => ord.is_ge(),
                }))
            }
            BinOp::Add if matches!(l, Value::Text(_)) || matches!(r, Value::Text(_)) => {
                Ok(Value::Text(l.raw() + &r.raw()))
            }
            _ => match (&l, &r) {
                (Value::Integer(a), Value::Integer(b)) => {
                    let value = match op {
                        BinOp::Add => a.checked_add(*b),
                        BinOp::Subtract => a.checked_sub(*b),
                        BinOp::Multiply => a.checked_mul(*b),
                        BinOp::Divide => a.checked_div(*b),
                        _ => a.checked_rem(*b),
                    };
                    value.map(Value::Integer).ok_or_else(|| self.error("overflow or division by zero".to_string()))
                }
                (a, b) => {
                    let (a, b) = a.as_float().zip(b.as_float()).ok_or_else(|| mismatch(&l, &r))?;
                    let value = match op {
                        BinOp::Add => a + b,
                        BinOp::Subtract => a - b,
                        BinOp::Multiply => a * b,
                        BinOp::Divide => a / b,
                        _ => a % b,
                    };
                    Ok(Value::from(value))
                }
            },
        }
    }

    fn error(&self, error: String) -> RqErr {
        RqErr::Eval { expr: self.to_string(), error }
    }
}

/// 单参数的lambda表达式，例如`c => c.Idade == 25`。
#[derive(Debug, Clone, PartialEq)]
pub struct Lambda {
    param: String,
    body: Expr,
}

impl Display for Lambda {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} => {}", self.param, self.body)
    }
}

impl Lambda {
    /// 函数体只能引用lambda自身的参数。
    pub fn new(param: String, body: Expr) -> RqRes<Lambda> {
        let mut names = Vec::new();
        body.parameters(&mut names);
        if let Some(unknown) = names.into_iter().find(|name| *name != param) {
            return Err(RqErr::Eval { expr: body.to_string(), error: format!("unknown parameter `{unknown}`") });
        }
        Ok(Lambda { param, body })
    }

    pub fn param(&self) -> &str {
        &self.param
    }

    pub fn body(&self) -> &Expr {
        &self.body
    }

    pub fn node_type(&self) -> &'static str {
        "Lambda"
    }

    pub fn eval<T: Fields>(&self, item: &T) -> RqRes<Value> {
        self.body.eval(&self.param, item)
    }

    /// 转为条件函数，结果不是布尔值时报错。
    pub fn predicate<T: Fields + 'static>(&self) -> impl Fn(&T) -> RqRes<bool> + use<T> {
        let lambda = Rc::new(self.clone());
        move |item: &T| match lambda.eval(item)? {
            Value::Bool(b) => Ok(b),
            other => Err(lambda.body.error(format!("expected bool result, found {other}"))),
        }
    }

    /// 转为投影函数。
    pub fn selector<T: Fields + 'static>(&self) -> impl Fn(&T) -> RqRes<Value> + use<T> {
        let lambda = Rc::new(self.clone());
        move |item: &T| lambda.eval(item)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Person {
        name: &'static str,
        age: Integer,
    }

    impl Fields for Person {
        fn field(&self, name: &str) -> Option<Value> {
            match name {
                "Nome" => Some(Value::from(self.name)),
                "Idade" => Some(Value::from(self.age)),
                _ => None,
            }
        }
    }

    fn age_eq(age: Integer) -> Lambda {
        let body = Expr::binary(
            BinOp::Equal,
            Expr::member(Expr::Parameter("c".to_string()), "Idade"),
            Expr::Constant(Value::from(age)),
        );
        Lambda::new("c".to_string(), body).unwrap()
    }

    #[test]
    fn test_display() {
        let lambda = age_eq(25);
        assert_eq!(lambda.to_string(), "c => (c.Idade == 25)");
        assert_eq!(lambda.body().to_string(), "(c.Idade == 25)");
        assert_eq!(lambda.node_type(), "Lambda");
        assert_eq!(lambda.body().node_type(), "Equal");
    }

    #[test]
    fn test_eval() {
        let marvin = Person { name: "Marvin", age: 25 };
        let jorge = Person { name: "Jorge", age: 63 };
        assert_eq!(age_eq(25).eval(&marvin), Ok(Value::Bool(true)));
        assert_eq!(age_eq(25).eval(&jorge), Ok(Value::Bool(false)));
        let predicate = age_eq(63).predicate::<Person>();
        assert_eq!(predicate(&jorge), Ok(true));
    }

    #[test]
    fn test_arithmetic() {
        let p = Person { name: "Marvin", age: 25 };
        let c = || Expr::Parameter("c".to_string());
        let add = Expr::binary(BinOp::Add, Expr::member(c(), "Idade"), Expr::Constant(Value::from(0.5)));
        assert_eq!(Lambda::new("c".to_string(), add).unwrap().eval(&p), Ok(Value::from(25.5)));
        let concat = Expr::binary(BinOp::Add, Expr::member(c(), "Nome"), Expr::member(c(), "Idade"));
        assert_eq!(Lambda::new("c".to_string(), concat).unwrap().eval(&p), Ok(Value::from("Marvin25")));
        let div = Expr::binary(BinOp::Divide, Expr::member(c(), "Idade"), Expr::Constant(Value::Integer(0)));
        assert!(matches!(Lambda::new("c".to_string(), div).unwrap().eval(&p), Err(RqErr::Eval { .. })));
    }

    #[test]
    fn test_eval_errors() {
        let p = Person { name: "Marvin", age: 25 };
        let unknown = Expr::member(Expr::Parameter("c".to_string()), "Altura");
        assert_eq!(
            Lambda::new("c".to_string(), unknown).unwrap().eval(&p),
            Err(RqErr::Eval { expr: "c.Altura".to_string(), error: "unknown field `Altura`".to_string() })
        );
        let not_bool = Lambda::new("c".to_string(), Expr::member(Expr::Parameter("c".to_string()), "Idade")).unwrap();
        assert!(not_bool.predicate::<Person>()(&p).is_err());
        assert!(Lambda::new("c".to_string(), Expr::Parameter("x".to_string())).is_err());
    }

    #[test]
    fn test_match() {
        let p = Person { name: "Marvin", age: 25 };
        let expr = Expr::new_match(Expr::member(Expr::Parameter("c".to_string()), "Nome"), "M.*".to_string()).unwrap();
        assert_eq!(expr.to_string(), "(c.Nome ~ \"M.*\")");
        assert_eq!(Lambda::new("c".to_string(), expr).unwrap().eval(&p), Ok(Value::Bool(true)));
        let partial = Expr::new_match(Expr::member(Expr::Parameter("c".to_string()), "Nome"), "M".to_string()).unwrap();
        assert_eq!(Lambda::new("c".to_string(), partial).unwrap().eval(&p), Ok(Value::Bool(false)));
        assert!(matches!(
            Expr::new_match(Expr::Parameter("c".to_string()), "(".to_string()),
            Err(RqErr::InvalidArgument { op: "match", .. })
        ));
    }

    #[test]
    fn test_compare_mixed() {
        assert_eq!(Value::Integer(2).compare(&Value::from(2.0)), Some(Ordering::Equal));
        assert_eq!(Value::from("a").compare(&Value::Integer(1)), None);
        assert_eq!(Value::from("a").compare(&Value::from("b")), Some(Ordering::Less));
    }
}
