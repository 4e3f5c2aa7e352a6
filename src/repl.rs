use crate::JSError;
use crate::core::{Context, Value};

/// A persistent interactive environment: one extended context shared by
/// every `eval`, so variables and functions survive between lines.
pub struct Repl {
    ctx: Context,
}

impl Default for Repl {
    fn default() -> Self {
        Self::new()
    }
}

impl Repl {
    pub fn new() -> Repl {
        Repl {
            ctx: Context::new(true),
        }
    }

    pub fn context(&self) -> &Context {
        &self.ctx
    }

    /// Evaluates one submission in the persistent context.
    pub fn eval(&self, source: &str) -> Result<Value, JSError> {
        let mut source = source.to_string();
        source.push(';');
        self.ctx.eval(&source, "[stdin]")
    }

    /// Heuristic used by line editors to decide whether to keep reading:
    /// the input is complete when no bracket, string or comment is open.
    pub fn is_complete_input(source: &str) -> bool {
        let mut depth: i32 = 0;
        let mut chars = source.chars().peekable();
        let mut in_string: Option<char> = None;
        let mut in_line_comment = false;
        let mut in_block_comment = false;
        while let Some(ch) = chars.next() {
            if in_line_comment {
                if ch == '\n' {
                    in_line_comment = false;
                }
                continue;
            }
            if in_block_comment {
                if ch == '*' && chars.peek() == Some(&'/') {
                    chars.next();
                    in_block_comment = false;
                }
                continue;
            }
            if let Some(quote) = in_string {
                if ch == '\\' {
                    chars.next();
                } else if ch == quote || ch == '\n' {
                    in_string = None;
                }
                continue;
            }
            match ch {
                '\'' | '"' => in_string = Some(ch),
                '/' if chars.peek() == Some(&'/') => in_line_comment = true,
                '/' if chars.peek() == Some(&'*') => {
                    chars.next();
                    in_block_comment = true;
                }
                '(' | '[' | '{' => depth += 1,
                ')' | ']' | '}' => depth -= 1,
                _ => {}
            }
        }
        depth <= 0 && in_string.is_none() && !in_block_comment
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn state_persists_between_lines() {
        let repl = Repl::new();
        repl.eval("var counter = 1").unwrap();
        repl.eval("counter = counter + 1").unwrap();
        match repl.eval("counter").unwrap() {
            Value::Integer(2) => {}
            other => panic!("expected 2, got {other:?}"),
        }
    }

    #[test]
    fn complete_input_heuristic() {
        assert!(Repl::is_complete_input("1 + 2"));
        assert!(!Repl::is_complete_input("function f() {"));
        assert!(Repl::is_complete_input("function f() { return 1; }"));
        assert!(!Repl::is_complete_input("var s = 'open"));
        assert!(!Repl::is_complete_input("/* comment"));
        assert!(Repl::is_complete_input("// just a comment"));
    }
}
