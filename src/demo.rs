use cmd_help::CmdHelp;
use rquery::err::RqErr;
use rquery::expr::{Fields, Lambda, Value};
use rquery::parse::parse_lambda;
use rquery::repository::{Repository, SourceDao};
use rquery::{Integer, Query, RqRes, Source};
use std::fmt::Display;
use time::Date;
use time::macros::{date, format_description};
use unicase::UniCase;

#[derive(Debug, Clone, Copy, Eq, PartialEq, CmdHelp)]
pub(crate) enum Demo {
    /// delegates   将闭包作为值保存并调用。
    Delegates,
    /// lambda      过滤、排序、投影组合为一个查询：
    ///                 长度小于6的名字，排序后转为大写。
    Lambda,
    /// anonymous   以不同形式的条件函数调用同一个函数：
    ///                 闭包、函数指针。
    Anonymous,
    /// expr        解析lambda文本并打印其表达式树，再以该表达式过滤元素。
    ///             使用`--expr <lambda>`可以打印任意表达式的表达式树。
    Expr,
    /// live        查询在每次遍历时重新读取数据源：
    ///                 修改数据源后再次遍历同一个查询，结果随之改变。
    Live,
    /// snapshot    立即收集的结果与数据源后续的修改无关。
    Snapshot,
    /// order       多键稳定排序、倒序以及分组。
    ///             使用`--nocase`时名字排序忽略大小写。
    Order,
    /// sum         求和、平均值、最小值、最大值。
    Sum,
    /// select      投影以及一对多投影。
    Select,
    /// repo        基于共享数据源的仓储：保存、删除、查找。
    Repo,
}

/// 运行演示时的选项
#[derive(Debug, Default)]
pub(crate) struct Ctx {
    pub(crate) verbose: bool,
    pub(crate) dry_run: bool,
    pub(crate) nocase: bool,
}

impl Ctx {
    fn title(&self, title: &str) {
        println!();
        println_title!("-----//-----");
        println_title!("{title}");
    }

    /// 按需打印查询的阶段，返回是否需要遍历。
    fn plan<T>(&self, query: &Query<T>) -> bool {
        if self.verbose || self.dry_run {
            println_notice!("plan: {query:?}");
        }
        !self.dry_run
    }

    fn print_all<T: Display + 'static>(&self, query: &Query<T>) -> RqRes<()> {
        if self.plan(query) {
            for item in query {
                println!("{}", item?);
            }
        }
        Ok(())
    }

    fn print_value<T, V: Display>(
        &self, label: &str, query: &Query<T>, terminal: impl FnOnce(&Query<T>) -> RqRes<V>,
    ) -> RqRes<()> {
        if self.plan(query) {
            println!("{label}: {}", terminal(query)?);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Person {
    name: &'static str,
    age: Integer,
    birth: Date,
}

impl Person {
    fn new(name: &'static str, age: Integer, birth: Date) -> Person {
        Person { name, age, birth }
    }

    fn describe(&self) -> RqRes<String> {
        let birth = self
            .birth
            .format(format_description!("[month]/[day]/[year]"))
            .map_err(|err| RqErr::Format(err.to_string()))?;
        Ok(format!("{} {} {}", self.name, self.age, birth))
    }
}

impl Fields for Person {
    fn field(&self, name: &str) -> Option<Value> {
        match name {
            "Nome" => Some(Value::from(self.name)),
            "Idade" => Some(Value::Integer(self.age)),
            "DataNascimento" => Some(Value::from(self.birth.to_string())),
            _ => None,
        }
    }
}

fn family() -> Vec<Person> {
    vec![
        Person::new("Marvin", 25, date!(1990-12-27)),
        Person::new("Cláudia", 49, date!(1968-04-15)),
        Person::new("Cláudia", 48, date!(1968-04-15)),
        Person::new("Giovanna", 13, date!(2003-07-04)),
        Person::new("Jorge", 63, date!(1953-04-02)),
    ]
}

impl Demo {
    pub(crate) fn run(&self, ctx: &Ctx) -> RqRes<()> {
        match self {
            Demo::Delegates => delegates(ctx),
            Demo::Lambda => lambda(ctx),
            Demo::Anonymous => anonymous(ctx),
            Demo::Expr => expr(ctx),
            Demo::Live => live(ctx),
            Demo::Snapshot => snapshot(ctx),
            Demo::Order => order(ctx),
            Demo::Sum => sum(ctx),
            Demo::Select => select(ctx),
            Demo::Repo => repo(ctx),
        }
    }
}

fn delegates(ctx: &Ctx) -> RqRes<()> {
    ctx.title("Delegates and Functions");
    let filter = |name: &str| name.chars().count() == 6;
    println!("{}", filter("Marvin"));
    let names = Query::from_vec(vec!["Marvin", "Jorge", "Rafael"]).filter(move |name| filter(*name));
    ctx.print_all(&names)
}

fn lambda(ctx: &Ctx) -> RqRes<()> {
    ctx.title("Query and Lambda");
    let names = Query::from_vec(vec!["Marvin", "Rafaela", "Giovanna", "Jorge", "Claudia", "Tom", "Suze"]);
    let short = names.filter(|name| name.chars().count() < 6).sort_by(|name| *name).project(|name| name.to_uppercase());
    ctx.print_all(&short)
}

fn is_five(integer: Integer) -> bool {
    integer * 2 == 10
}

fn test(predicate: &dyn Fn(Integer) -> bool, ctx: &Ctx) -> RqRes<()> {
    ctx.title("Anonymous Function");
    println!("{}", predicate(4));
    let matched = Query::from_fn(|| 1..=10);
    ctx.print_value("matched in 1..=10", &matched, |query| {
        query.fold(0, |count, item| if predicate(item) { count + 1 } else { count })
    })
}

fn anonymous(ctx: &Ctx) -> RqRes<()> {
    test(&|entity| entity % 2 == 0, ctx)?;
    test(&|entity| entity == 4, ctx)?;
    test(&is_five, ctx)
}

fn dump(lambda: &Lambda) {
    println!("{lambda}");
    println!("{}", lambda.body());
    println!("{}", lambda.body().node_type());
}

/// 打印任意lambda文本的表达式树。
pub(crate) fn dump_expr(text: &str) -> RqRes<()> {
    let lambda = parse_lambda(text)?;
    dump(&lambda);
    Ok(())
}

fn expr(ctx: &Ctx) -> RqRes<()> {
    ctx.title("Expression");
    let lambda = parse_lambda("c => c.Idade == 25")?;
    dump(&lambda);
    let matched = Query::from_vec(family()).try_filter(lambda.predicate()).try_project(|p| p.describe());
    ctx.print_all(&matched)
}

fn live(ctx: &Ctx) -> RqRes<()> {
    ctx.title("Deferred Query");
    let names = Source::new(vec!["Allen", "Arthur", "Bennett"]);
    let ayes = Query::from_source(&names).filter(|name| name.starts_with('A'));
    ctx.print_all(&ayes)?;
    names.set(0, "Bob")?;
    ctx.print_all(&ayes)
}

fn snapshot(ctx: &Ctx) -> RqRes<()> {
    ctx.title("Materialized Query");
    let names = Source::new(vec!["Allen", "Arthur", "Bennett"]);
    let ayes = Query::from_source(&names).filter(|name| name.starts_with('A'));
    if !ctx.plan(&ayes) {
        return Ok(());
    }
    let ayes = ayes.materialize()?;
    ayes.iter().for_each(|name| println!("{name}"));
    names.set(0, "Bob")?;
    ayes.iter().for_each(|name| println!("{name}"));
    Ok(())
}

fn order(ctx: &Ctx) -> RqRes<()> {
    ctx.title("Order By");
    let people = Query::from_vec(family());
    let sorted = if ctx.nocase {
        people.sort_by(|p| UniCase::new(p.name))
    } else {
        people.sort_by(|p| p.name)
    };
    let sorted = sorted.then_by(|p| p.age).reverse();
    ctx.print_all(&sorted.try_project(|p| p.describe()))?;

    let groups = sorted.group_by(|p| p.name);
    if ctx.plan(&groups) {
        for group in &groups {
            let group = group?;
            println!("Grupo: {}", group.key());
            println!("-----//-----");
            for person in &group {
                println!("{}", person.describe()?);
            }
        }
    }

    let groups = sorted.try_project(|p| Ok((p.name, p.describe()?))).group_by_with(|(name, _)| *name, |(_, line)| line);
    if ctx.plan(&groups) {
        for group in &groups {
            let group = group?;
            println!("Grupo: {}", group.key());
            println!("-----//-----");
            group.iter().for_each(|line| println!("{line}"));
        }
    }
    Ok(())
}

fn sum(ctx: &Ctx) -> RqRes<()> {
    ctx.title("Fold and Sum");
    let numbers = Query::from_vec(vec![1, 2, 3, 4, 5, 6, 7]);
    ctx.print_value("Soma", &numbers, Query::sum)?;
    ctx.print_value("Média", &numbers, Query::average)?;
    ctx.print_value("Mínimo", &numbers, Query::min)?;
    ctx.print_value("Máximo", &numbers, Query::max)
}

fn words(name: &str) -> Vec<String> {
    name.replace(" do ", " ").replace(" dos ", " ").split(' ').map(str::to_string).collect()
}

fn select(ctx: &Ctx) -> RqRes<()> {
    ctx.title("Select");
    let names = Query::from_vec(vec![
        "Marvin Thomaz do Nascimento",
        "Claudia Denise Thomaz dos Santos Nascimento",
        "Jorge Batista do Nascimento",
        "Giovanna Thomaz do Nascimento",
    ]);
    ctx.print_all(&names.project_many(words))?;
    let short = names.try_project(|name| match words(name).as_slice() {
        [first, second, ..] => Ok(format!("{first} {second}")),
        _ => Err(RqErr::Selector(format!("`{name}` has no surname"))),
    });
    ctx.print_all(&short)
}

fn repo(ctx: &Ctx) -> RqRes<()> {
    ctx.title("Repository");
    let repo: Repository<Person, _> = Repository::new(SourceDao::new(Source::new(family())));
    let adults = repo.find(|p| p.age >= 18).try_project(|p| p.describe());
    ctx.print_all(&adults)?;
    if ctx.dry_run {
        return Ok(());
    }
    let updated = repo.save(Person::new("Giovanna", 14, date!(2003-07-04)), |p| p.name)?;
    println_info!("saved Giovanna, updated: {updated}");
    let updated = repo.save(Person::new("Rafaela", 20, date!(2005-01-10)), |p| p.name)?;
    println_info!("saved Rafaela, updated: {updated}");
    let removed = repo.delete(|p| p.name == "Cláudia");
    println_info!("deleted Cláudia: {removed}");
    ctx.print_all(&adults)?;
    match repo.find_by_id(|p| p.name == "Giovanna")? {
        Some(person) => println!("{}", person.describe()?),
        None => println_notice!("Giovanna not found"),
    }
    ctx.print_value("total", &repo.to_list(), Query::count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_cmd() {
        assert_eq!(Demo::from_cmd("live"), Some(Demo::Live));
        assert_eq!(Demo::from_cmd("Live"), None);
        assert_eq!(Demo::Repo.cmd(), "repo");
        assert_eq!(Demo::all().len(), Demo::all_help().len());
        assert!(Demo::Sum.help().starts_with("sum"));
    }

    #[test]
    fn test_describe() {
        assert_eq!(family()[0].describe(), Ok("Marvin 25 12/27/1990".to_string()));
    }

    #[test]
    fn test_person_fields() {
        let lambda = parse_lambda(r#"c => c.Idade > 40 && c.Nome ~ "Cl.*""#).unwrap();
        let matched = Query::from_vec(family()).try_filter(lambda.predicate()).project(|p| p.age);
        assert_eq!(matched.materialize(), Ok(vec![49, 48]));
    }

    #[test]
    fn test_all_demos_dry_run() {
        let ctx = Ctx { dry_run: true, ..Ctx::default() };
        for demo in Demo::all() {
            assert_eq!(demo.run(&ctx), Ok(()));
        }
    }

    #[test]
    fn test_all_demos_run() {
        let ctx = Ctx { nocase: true, ..Ctx::default() };
        for demo in Demo::all() {
            assert_eq!(demo.run(&ctx), Ok(()));
        }
    }

    #[test]
    fn test_order_reverse() {
        let sorted = Query::from_vec(family()).sort_by(|p| p.name).then_by(|p| p.age).reverse().project(|p| p.age);
        assert_eq!(sorted.materialize(), Ok(vec![25, 63, 13, 49, 48]));
    }
}
