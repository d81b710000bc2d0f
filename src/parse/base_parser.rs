use crate::expr::Value;
use crate::{Float, Integer};
use nom::branch::alt;
use nom::bytes::complete::{tag, take_until};
use nom::character::complete::{alpha1, alphanumeric1, char, digit1, multispace0};
use nom::combinator::{map, map_res, recognize};
use nom::multi::many0_count;
use nom::sequence::{delimited, pair};
use nom::{IResult, Parser};
use nom_language::error::VerboseError;

pub(super) type ParserError<'a> = VerboseError<&'a str>;

pub(super) type ParserResult<'a, O> = IResult<&'a str, O, ParserError<'a>>;

/// 构造一个解析器，丢弃内部解析器前后的空白字符。
pub(super) fn ws<'a, O, F>(inner: F) -> impl Parser<&'a str, Output = O, Error = ParserError<'a>>
where
    F: Parser<&'a str, Output = O, Error = ParserError<'a>>,
{
    delimited(multispace0, inner, multispace0)
}

/// 解析器，支持解析标识符：字母或下划线开头，后跟字母、数字或下划线。
pub(super) fn identifier(input: &str) -> ParserResult<'_, &str> {
    recognize(pair(
        alt((alpha1, tag("_"))),                   // 首字符
        many0_count(alt((alphanumeric1, tag("_")))), // 后续字符
    ))
    .parse(input)
}

/// 解析器，支持解析双引号包围的文本，不支持转义。
pub(super) fn string_literal(input: &str) -> ParserResult<'_, String> {
    map(delimited(char('"'), take_until("\""), char('"')), |s: &str| s.to_string()).parse(input)
}

/// 解析器，支持解析非负整数和浮点数，负数由一元负号表达。
pub(super) fn number(input: &str) -> ParserResult<'_, Value> {
    alt((
        map_res(recognize((digit1, char('.'), digit1)), |s: &str| s.parse::<Float>().map(Value::from)), // 浮点数
        map_res(digit1, |s: &str| s.parse::<Integer>().map(Value::from)),                            // 整数
    ))
    .parse(input)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier() {
        assert_eq!(identifier("c.Idade"), Ok((".Idade", "c")));
        assert_eq!(identifier("_tmp1 "), Ok((" ", "_tmp1")));
        assert!(identifier("1abc").is_err());
        assert!(identifier("").is_err());
    }

    #[test]
    fn test_string_literal() {
        assert_eq!(string_literal(r#""Marvin" =="#), Ok((" ==", "Marvin".to_string())));
        assert_eq!(string_literal(r#""""#), Ok(("", String::new())));
        assert!(string_literal(r#""open"#).is_err());
        assert!(string_literal("bare").is_err());
    }

    #[test]
    fn test_number() {
        assert_eq!(number("25)"), Ok((")", Value::Integer(25))));
        assert_eq!(number("2.5 "), Ok((" ", Value::from(2.5))));
        assert_eq!(number("25.Idade"), Ok((".Idade", Value::Integer(25))));
        assert!(number("x").is_err());
        assert!(number("99999999999999999999").is_err());
    }

    #[test]
    fn test_ws() {
        assert_eq!(ws(identifier).parse("  abc  =>"), Ok(("=>", "abc")));
    }
}
