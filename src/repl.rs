use std::{
    io::{self, BufRead, Write},
    ops::ControlFlow,
};

use crate::{
    Environment, Evaluation, calculate,
    eval::MAX_PRECISION,
    system,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Help,
    Vars,
    Clear,
    /// `None` when the argument is missing or not a number.
    Precision(Option<usize>),
    Quit,
}

impl Command {
    pub fn parse(line: &str) -> Option<Command> {
        match line {
            ":help" => Some(Command::Help),
            ":vars" => Some(Command::Vars),
            ":clear" => Some(Command::Clear),
            ":quit" => Some(Command::Quit),
            _ => line
                .strip_prefix(":precision")
                .map(|rest| Command::Precision(rest.trim().parse().ok())),
        }
    }
}

/// Interactive front end: owns the [`Environment`] and answers one line at a
/// time.
pub struct Shell {
    env: Environment,
}

impl Default for Shell {
    fn default() -> Self {
        Self::new(Environment::new())
    }
}

impl Shell {
    pub fn new(env: Environment) -> Self {
        Shell { env }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    fn format(&self, value: f64) -> String {
        let precision = self.env.precision();
        format!("{value:.precision$}")
    }

    /// Reads lines until EOF or `:quit`, prompting with `> `.
    pub fn run(&mut self, input: impl BufRead, out: &mut impl Write) -> io::Result<()> {
        writeln!(
            out,
            "SuperCalc. Type :help for help, :quit or Ctrl+D to leave."
        )?;
        let mut lines = input.lines();
        loop {
            write!(out, "> ")?;
            out.flush()?;
            let Some(line) = lines.next() else {
                break;
            };
            if self.handle(&line?, out)?.is_break() {
                break;
            }
        }
        Ok(())
    }

    pub fn handle(&mut self, line: &str, out: &mut impl Write) -> io::Result<ControlFlow<()>> {
        let line = line.trim();
        if line.is_empty() {
            return Ok(ControlFlow::Continue(()));
        }

        let Some(command) = Command::parse(line) else {
            match calculate(line, &mut self.env) {
                Ok(evaluation) => {
                    if let Evaluation::Assigned { name, value } = &evaluation {
                        writeln!(out, "[ok] {name} = {}", self.format(*value))?;
                    }
                    writeln!(out, "= {}", self.format(evaluation.value()))?;
                }
                Err(e) => {
                    writeln!(out, "[error] {e}")?;
                    log::debug!("{:?}", miette::Report::new(e));
                }
            }
            return Ok(ControlFlow::Continue(()));
        };

        match command {
            Command::Quit => return Ok(ControlFlow::Break(())),
            Command::Help => {
                writeln!(out, "Commands: :help, :vars, :clear, :precision N, :quit")?;
                writeln!(out, "Functions: {}", system::names().join(", "))?;
                writeln!(out, "Constants: pi, e")?;
                writeln!(out, "Examples: sin(pi/2), pow(2,8), x=5, 3*x^2 + 1")?;
            }
            Command::Vars => {
                for (name, value) in self.env.vars() {
                    writeln!(out, "{name} = {}", self.format(value))?;
                }
            }
            Command::Clear => {
                self.env.clear();
                writeln!(out, "[ok] variables cleared")?;
            }
            Command::Precision(precision) => {
                match precision.map(|p| self.env.set_precision(p)) {
                    Some(Ok(())) => writeln!(out, "[ok] precision = {}", self.env.precision())?,
                    _ => writeln!(out, "usage: :precision N (0..{MAX_PRECISION})")?,
                }
            }
        }
        Ok(ControlFlow::Continue(()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run_lines(shell: &mut Shell, lines: &[&str]) -> String {
        let mut out = Vec::new();
        for line in lines {
            shell.handle(line, &mut out).unwrap();
        }
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn commands_parse() {
        assert_eq!(Command::parse(":help"), Some(Command::Help));
        assert_eq!(Command::parse(":precision 4"), Some(Command::Precision(Some(4))));
        assert_eq!(Command::parse(":precision x"), Some(Command::Precision(None)));
        assert_eq!(Command::parse("1+1"), None);
    }

    #[test]
    fn evaluation_is_printed_with_precision() {
        let mut shell = Shell::default();
        let out = run_lines(&mut shell, &[":precision 2", "1/3"]);
        assert_eq!(out, "[ok] precision = 2\n= 0.33\n");
    }

    #[test]
    fn assignment_prints_both_lines() {
        let mut shell = Shell::default();
        let out = run_lines(&mut shell, &[":precision 0", "x = 5"]);
        assert_eq!(out, "[ok] precision = 0\n[ok] x = 5\n= 5\n");
        assert_eq!(shell.env().get("x"), Some(5.0));
    }

    #[test]
    fn errors_do_not_stop_the_shell() {
        let mut shell = Shell::default();
        let out = run_lines(&mut shell, &["5/0", "y+1"]);
        assert_eq!(out, "[error] division by zero\n[error] undefined variable: y\n");
    }

    #[test]
    fn bad_precision() {
        let mut shell = Shell::default();
        let out = run_lines(&mut shell, &[":precision 31", ":precision"]);
        assert_eq!(out, "usage: :precision N (0..30)\n".repeat(2));
        assert_eq!(shell.env().precision(), 10);
    }

    #[test]
    fn vars_and_clear() {
        let mut shell = Shell::default();
        let out = run_lines(&mut shell, &[":precision 1", "a = 2", ":clear", ":vars"]);
        assert!(out.ends_with("[ok] variables cleared\ne = 2.7\npi = 3.1\n"));
        assert!(!shell.env().contains("a"));
    }

    #[test]
    fn run_stops_at_quit() {
        let mut shell = Shell::default();
        let input = "2+2\n:quit\n3+3\n".as_bytes();
        let mut out = Vec::new();
        shell.run(input, &mut out).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("= 4.0000000000"));
        assert!(!out.contains("= 6"));
    }
}
