pub mod error;
pub mod eval;
pub mod lex;
pub mod parse;
pub mod repl;
pub mod rewrite;
pub mod system;

pub use error::{CalcError, ErrorKind};
pub use eval::{Environment, Evaluation};
pub use lex::Lexer;
pub use parse::Parser;
pub use repl::Shell;

/// Runs one line of user input through the whole pipeline: call rewriting,
/// shunting-yard parsing and RPN evaluation against `env`.
pub fn calculate(line: &str, env: &mut Environment) -> Result<Evaluation, CalcError> {
    let rewritten = rewrite::rewrite_calls(line)?;
    let rpn = parse::parse(&rewritten)?;
    log::debug!("rpn: {}", parse::DisplayRpn(&rpn));
    eval::execute(&rpn, env)
}
