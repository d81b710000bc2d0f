/// 终端输出时以`color`着色，否则原样输出。
macro_rules! println_colored {
    ($stream:expr, $color:literal, $print:ident, $println:ident, $($arg:tt)*) => {
        if std::io::IsTerminal::is_terminal(&$stream) {
            $print!("\x1b[{}m", $color);
            $print!($($arg)*);
            $println!("\x1b[0m");
        } else {
            $println!($($arg)*);
        }
    };
}

macro_rules! println_err {
    () => {};
    ($($arg:tt)*) => {
        println_colored!(std::io::stderr(), "1;31", eprint, eprintln, $($arg)*)
    };
}

macro_rules! println_title {
    () => {};
    ($($arg:tt)*) => {
        println_colored!(std::io::stdout(), "1;32", print, println, $($arg)*)
    };
}

macro_rules! println_info {
    () => {};
    ($($arg:tt)*) => {
        println_colored!(std::io::stdout(), "1;34", print, println, $($arg)*)
    };
}

macro_rules! println_notice {
    () => {};
    ($($arg:tt)*) => {
        println_colored!(std::io::stdout(), "35", print, println, $($arg)*)
    };
}
