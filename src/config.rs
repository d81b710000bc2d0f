use rquery::RqRes;
use rquery::err::RqErr;
use std::iter::Peekable;

#[derive(Debug, Eq, PartialEq)]
pub(crate) enum Config {
    /// 帮助 `-h`
    Help,
    /// 版本 `-V`
    Version,
    /// 打印查询的阶段 `-v`
    Verbose,
    /// 仅构造查询并打印阶段，不遍历 `-d`
    DryRun,
    /// 文本排序忽略大小写 `--nocase`
    Nocase,
    /// 解析并打印lambda的表达式树 `--expr <lambda>`
    Expr(String),
}

#[inline]
pub(crate) fn is_nocase(nocase: bool, configs: &[Config]) -> bool {
    nocase || configs.contains(&Config::Nocase)
}

/// 解析位于命令名之前的全部选项。
pub(crate) fn parse_configs(args: &mut Peekable<impl Iterator<Item = String>>) -> RqRes<Vec<Config>> {
    let mut configs = Vec::new();
    while let Some(arg) = args.next_if(|arg| arg.starts_with('-')) {
        let config = match arg.as_str() {
            "-h" => Config::Help,
            "-V" => Config::Version,
            "-v" => Config::Verbose,
            "-d" => Config::DryRun,
            "--nocase" => Config::Nocase,
            "--expr" => match args.next() {
                Some(lambda) => Config::Expr(lambda),
                None => Err(RqErr::MissingArg { cmd: "--expr", arg: "lambda" })?,
            },
            _ => Err(RqErr::UnknownArgs { args: vec![arg] })?,
        };
        configs.push(config);
    }
    Ok(configs)
}
