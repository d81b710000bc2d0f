use std::process::{ExitCode, Termination};
use thiserror::Error;

#[derive(Error, Debug, Clone, Eq, PartialEq)]
pub enum RqErr {
    #[error("[Bad Arg] Invalid value `{value}` of argument `{arg}` for op `{op}`")]
    InvalidArgument { op: &'static str, arg: &'static str, value: String },

    #[error("[Query] Op `{op}` requires at least one element, but the sequence is empty")]
    EmptySequence { op: &'static str },

    #[error("[Query] Arithmetic overflow in op `{op}`")]
    Overflow { op: &'static str },

    #[error("[Query] No element matches the condition of op `{op}`")]
    NotFound { op: &'static str },

    #[error("[Query] Selector failed: {0}")]
    Selector(String),

    #[error("[Expr] Unable to parse expression `{expr}`, error:\n{error}")]
    ParseExprErr { expr: String, error: String },

    #[error("[Expr] Unexpected remaining `{remaining}` of expression `{expr}`")]
    UnexpectedRemaining { expr: String, remaining: String },

    #[error("[Expr] Evaluate `{expr}` error: {error}")]
    Eval { expr: String, error: String },

    #[error("[Format] Format value error: {0}")]
    Format(String),

    #[error("[Missing Arg] Missing argument `{arg}` of cmd `{cmd}`")]
    MissingArg { cmd: &'static str, arg: &'static str },

    #[error("[Bad Arg] Unknown arguments: {args:?}")]
    UnknownArgs { args: Vec<String> },
}

impl Termination for RqErr {
    fn report(self) -> ExitCode {
        eprintln!("{}", self);
        ExitCode::from(self.exit_code())
    }
}

impl RqErr {
    pub fn termination(self) -> ! {
        let exit_code = self.exit_code();
        self.report();
        std::process::exit(exit_code as i32);
    }

    pub fn exit_code(&self) -> u8 {
        match self {
            RqErr::InvalidArgument { .. } => 1,
            RqErr::EmptySequence { .. } => 2,
            RqErr::NotFound { .. } => 3,
            RqErr::Selector(_) => 4,
            RqErr::ParseExprErr { .. } => 5,
            RqErr::UnexpectedRemaining { .. } => 6,
            RqErr::Eval { .. } => 7,
            RqErr::Format(_) => 8,
            RqErr::MissingArg { .. } => 9,
            RqErr::UnknownArgs { .. } => 10,
            RqErr::Overflow { .. } => 11,
        }
    }

    pub(crate) fn invalid_count(op: &'static str, count: impl ToString) -> RqErr {
        RqErr::InvalidArgument { op, arg: "count", value: count.to_string() }
    }
}
