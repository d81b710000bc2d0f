use crate::expr::{BinOp, Expr, Value};
use crate::parse::base_parser::{ParserError, ParserResult, identifier, number, string_literal, ws};
use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::character::complete::char;
use nom::combinator::{cut, map, opt, value};
use nom::error::context;
use nom::multi::fold_many0;
use nom::sequence::{delimited, pair, preceded};
use nom::{Err, Parser};
use nom_language::error::VerboseErrorKind;
use std::cell::Cell;

/// 括号和一元运算符允许的最大嵌套层数
const MAX_DEPTH: usize = 32;

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// 比较运算符之后的部分
enum Tail {
    Cmp(BinOp, Expr),
    Match(String),
}

/// 解析器，支持解析`param => body`，返回参数名和函数体。
pub(super) fn lambda(input: &str) -> ParserResult<'_, (String, Expr)> {
    context(
        "Lambda",
        map(
            (
                ws(identifier), // 参数
                tag("=>"),      // 丢弃：箭头
                cut(context("Body", or_expr)),
            ),
            |(param, _, body)| (param.to_string(), body),
        ),
    )
    .parse(input)
}

fn or_expr(input: &str) -> ParserResult<'_, Expr> {
    let (input, first) = and_expr(input)?;
    fold_many0(
        preceded(ws(tag("||")), and_expr),
        move || first.clone(),
        |acc, rhs| Expr::binary(BinOp::OrElse, acc, rhs),
    )
    .parse(input)
}

fn and_expr(input: &str) -> ParserResult<'_, Expr> {
    let (input, first) = comparison(input)?;
    fold_many0(
        preceded(ws(tag("&&")), comparison),
        move || first.clone(),
        |acc, rhs| Expr::binary(BinOp::AndAlso, acc, rhs),
    )
    .parse(input)
}

fn comparison(input: &str) -> ParserResult<'_, Expr> {
    let (input, left) = additive(input)?;
    let (rest, tail) = opt(alt((
        map(preceded(ws(char('~')), cut(ws(string_literal))), Tail::Match), // 正则匹配
        map(pair(ws(cmp_op), additive), |(op, right)| Tail::Cmp(op, right)), // 比较
    )))
    .parse(input)?;
    match tail {
        None => Ok((rest, left)),
        Some(Tail::Cmp(op, right)) => Ok((rest, Expr::binary(op, left, right))),
        Some(Tail::Match(pattern)) => match Expr::new_match(left, pattern) {
            Ok(expr) => Ok((rest, expr)),
            Err(_) => Err(Err::Failure(ParserError { errors: vec![(input, VerboseErrorKind::Context("Regex"))] })),
        },
    }
}

/// 以`parser`解析嵌套的子表达式，超过最大嵌套层数时失败。
fn nested<'a, O>(input: &'a str, parser: fn(&'a str) -> ParserResult<'a, O>) -> ParserResult<'a, O> {
    let depth = DEPTH.with(|depth| {
        depth.set(depth.get() + 1);
        depth.get()
    });
    let res = if depth > MAX_DEPTH {
        Err(Err::Failure(ParserError { errors: vec![(input, VerboseErrorKind::Context("Nesting"))] }))
    } else {
        parser(input)
    };
    DEPTH.with(|depth| depth.set(depth.get() - 1));
    res
}

fn cmp_op(input: &str) -> ParserResult<'_, BinOp> {
    alt((
        value(BinOp::Equal, tag("==")),
        value(BinOp::NotEqual, tag("!=")),
        value(BinOp::LessThanOrEqual, tag("<=")),
        value(BinOp::GreaterThanOrEqual, tag(">=")),
        value(BinOp::LessThan, tag("<")),
        value(BinOp::GreaterThan, tag(">")),
    ))
    .parse(input)
}

fn additive(input: &str) -> ParserResult<'_, Expr> {
    let (input, first) = multiplicative(input)?;
    fold_many0(
        pair(ws(alt((value(BinOp::Add, char('+')), value(BinOp::Subtract, char('-'))))), multiplicative),
        move || first.clone(),
        |acc, (op, rhs)| Expr::binary(op, acc, rhs),
    )
    .parse(input)
}

fn multiplicative(input: &str) -> ParserResult<'_, Expr> {
    let (input, first) = unary(input)?;
    fold_many0(
        pair(
            ws(alt((
                value(BinOp::Multiply, char('*')),
                value(BinOp::Divide, char('/')),
                value(BinOp::Modulo, char('%')),
            ))),
            unary,
        ),
        move || first.clone(),
        |acc, (op, rhs)| Expr::binary(op, acc, rhs),
    )
    .parse(input)
}

fn unary(input: &str) -> ParserResult<'_, Expr> {
    alt((
        map(preceded(ws(char('!')), |input| nested(input, unary)), |expr| Expr::Not(Box::new(expr))),
        map(preceded(ws(char('-')), |input| nested(input, unary)), |expr| Expr::Negate(Box::new(expr))),
        member_access,
    ))
    .parse(input)
}

fn member_access(input: &str) -> ParserResult<'_, Expr> {
    let (input, target) = primary(input)?;
    fold_many0(
        preceded(ws(char('.')), identifier),
        move || target.clone(),
        |acc, name: &str| Expr::member(acc, name),
    )
    .parse(input)
}

fn primary(input: &str) -> ParserResult<'_, Expr> {
    context(
        "Primary",
        ws(alt((
            map(number, Expr::Constant),
            map(string_literal, |text| Expr::Constant(Value::Text(text))),
            map(identifier, |name: &str| match name {
                "true" => Expr::Constant(Value::Bool(true)),
                "false" => Expr::Constant(Value::Bool(false)),
                _ => Expr::Parameter(name.to_string()),
            }),
            delimited(char('('), |input| nested(input, or_expr), cut(ws(char(')')))),
        ))),
    )
    .parse(input)
}
