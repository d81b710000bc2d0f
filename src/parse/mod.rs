use crate::RqRes;
use crate::err::RqErr;
use crate::expr::Lambda;
use crate::parse::lambda::lambda;
use nom::Err;
use nom_language::error::convert_error;

mod base_parser;
mod lambda;

/// 解析lambda文本，例如`c => c.Idade == 25 && c.Nome ~ "M.*"`。
///
/// 支持的语法，优先级从低到高：
/// - `||`
/// - `&&`
/// - 比较：`==`、`!=`、`<`、`<=`、`>`、`>=`，以及正则整体匹配`~ "regex"`
/// - `+`、`-`
/// - `*`、`/`、`%`
/// - 一元：`!`、`-`
/// - 成员访问：`c.Field`
/// - 整数、浮点数、双引号文本、`true`、`false`、参数名、括号
pub fn parse_lambda(text: &str) -> RqRes<Lambda> {
    match lambda(text) {
        Ok((remaining, (param, body))) => {
            if !remaining.trim().is_empty() {
                Err(RqErr::UnexpectedRemaining { expr: text.to_owned(), remaining: remaining.to_owned() })?
            }
            Lambda::new(param, body)
        }
        Err(Err::Error(err) | Err::Failure(err)) => {
            Err(RqErr::ParseExprErr { expr: text.to_owned(), error: convert_error(text, err) })
        }
        Err(Err::Incomplete(_)) => {
            Err(RqErr::ParseExprErr { expr: text.to_owned(), error: "incomplete input".to_owned() })
        }
    }
}
