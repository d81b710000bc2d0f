#[macro_use]
mod print;
mod config;
mod demo;

use crate::config::{Config, is_nocase, parse_configs};
use crate::demo::{Ctx, Demo, dump_expr};
use rquery::RqRes;
use rquery::err::RqErr;

fn main() {
    if let Err(e) = run() {
        e.termination();
    }
}

fn run() -> RqRes<()> {
    let mut args = std::env::args().skip(1).peekable();
    let configs = parse_configs(&mut args)?;
    if configs.contains(&Config::Help) {
        print_help();
        return Ok(());
    }
    if configs.contains(&Config::Version) {
        println!("rq {}", env!("CARGO_PKG_VERSION"));
        return Ok(());
    }
    let ctx = Ctx {
        verbose: configs.contains(&Config::Verbose),
        dry_run: configs.contains(&Config::DryRun),
        nocase: is_nocase(false, &configs),
    };

    let exprs = configs
        .iter()
        .filter_map(|config| match config {
            Config::Expr(text) => Some(text.as_str()),
            _ => None,
        })
        .collect::<Vec<_>>();
    for text in &exprs {
        dump_expr(text)?;
    }

    let (demos, unknown): (Vec<_>, Vec<_>) = args.map(|arg| Demo::from_cmd(&arg).ok_or(arg)).partition(Result::is_ok);
    if !unknown.is_empty() {
        Err(RqErr::UnknownArgs { args: unknown.into_iter().filter_map(Result::err).collect() })?
    }
    let demos = demos.into_iter().filter_map(Result::ok).collect::<Vec<_>>();
    // 仅打印表达式时不运行演示
    let demos = if demos.is_empty() && exprs.is_empty() { Demo::all().to_vec() } else { demos };
    if ctx.verbose {
        println_info!("Demos: {}", demos.iter().map(Demo::cmd).collect::<Vec<_>>().join(", "));
    }
    for demo in demos {
        if let Err(err) = demo.run(&ctx) {
            println_err!("Demo `{}` failed", demo.cmd());
            return Err(err);
        }
    }
    Ok(())
}

fn print_help() {
    println_title!("Usage: rq [configs] [demo ...]");
    println!();
    println_info!("Configs:");
    println!("    -h              打印帮助信息。");
    println!("    -V              打印版本。");
    println!("    -v              运行前打印每个查询的阶段。");
    println!("    -d              仅构造查询并打印阶段，不遍历数据。");
    println!("    --nocase        文本排序忽略大小写。");
    println!("    --expr <lambda> 解析并打印lambda的表达式树，例如：");
    println!("                        --expr 'c => c.Idade == 25'");
    println!();
    println_info!("Demos: (未指定时运行全部演示)");
    for (_, help) in Demo::all_help() {
        for line in help.lines() {
            println!("    {line}");
        }
    }
}
