use miette::SourceSpan;

use crate::error::CalcError;

/// Turns every `name(a, b, ...)` into `(a b ...) name` so the shunting-yard
/// parser sees the function after its arguments.
///
/// Arguments are copied verbatim: a call nested inside another call's
/// argument list is not rewritten, and multi-token arguments are joined by a
/// plain space. Both are known limitations and are kept as-is.
pub fn rewrite_calls(input: &str) -> Result<String, CalcError> {
    let bytes = input.as_bytes();
    let mut out = String::with_capacity(input.len() * 2);
    let mut i = 0;

    while i < bytes.len() {
        let c = bytes[i];
        if !(c.is_ascii_alphabetic() || c == b'_') {
            let ch = input[i..].chars().next().unwrap_or_default();
            out.push(ch);
            i += ch.len_utf8().max(1);
            continue;
        }

        let mut j = i + 1;
        while j < bytes.len() && (bytes[j].is_ascii_alphanumeric() || bytes[j] == b'_') {
            j += 1;
        }
        let name = &input[i..j];

        let mut k = j;
        while k < bytes.len() && bytes[k].is_ascii_whitespace() {
            k += 1;
        }
        if bytes.get(k) != Some(&b'(') {
            out.push_str(name);
            i = j;
            continue;
        }

        let (args, close) = split_arguments(input, k).ok_or_else(|| CalcError::UnbalancedCall {
            name: name.to_string(),
            src: input.to_string(),
            span: SourceSpan::from(i..input.len()),
        })?;

        out.push('(');
        out.push_str(&args.join(" "));
        out.push_str(") ");
        out.push_str(name);
        i = close + 1;
    }

    log::debug!("rewrote {input:?} into {out:?}");
    Ok(out)
}

/// Splits the argument list whose `(` sits at `open` on top-level commas.
/// Returns the arguments and the index of the matching `)`.
fn split_arguments(input: &str, open: usize) -> Option<(Vec<&str>, usize)> {
    let mut depth = 0usize;
    let mut args = Vec::new();
    let mut start = open + 1;

    for (p, c) in input.char_indices().skip_while(|&(p, _)| p < open) {
        match c {
            '(' => depth += 1,
            ')' => {
                depth -= 1;
                if depth == 0 {
                    args.push(&input[start..p]);
                    return Some((args, p));
                }
            }
            ',' if depth == 1 => {
                args.push(&input[start..p]);
                start = p + 1;
            }
            _ => {}
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn leaves_plain_text_alone() {
        assert_eq!(rewrite_calls("3*x^2 + 1").unwrap(), "3*x^2 + 1");
        assert_eq!(rewrite_calls("(x)").unwrap(), "(x)");
    }

    #[test]
    fn single_and_multiple_arguments() {
        assert_eq!(rewrite_calls("sin(pi/2)").unwrap(), "(pi/2) sin");
        assert_eq!(rewrite_calls("pow(2,8)").unwrap(), "(2 8) pow");
        assert_eq!(rewrite_calls("1 + pow (2, 8)").unwrap(), "1 + (2  8) pow");
    }

    #[test]
    fn calls_side_by_side() {
        assert_eq!(
            rewrite_calls("sin(x)+cos(x)").unwrap(),
            "(x) sin+(x) cos"
        );
    }

    #[test]
    fn nested_call_is_copied_verbatim() {
        assert_eq!(
            rewrite_calls("sqrt(pow(2,4))").unwrap(),
            "(pow(2,4)) sqrt"
        );
    }

    #[test]
    fn inner_parentheses_survive() {
        assert_eq!(rewrite_calls("abs((1-3)*2)").unwrap(), "((1-3)*2) abs");
    }

    #[test]
    fn unclosed_call() {
        let err = rewrite_calls("sin(1+(2)").unwrap_err();
        assert_eq!(err.to_string(), "unbalanced parentheses in call to `sin`");
    }

    #[test]
    fn stray_close_is_left_to_the_parser() {
        assert_eq!(rewrite_calls("1+2)").unwrap(), "1+2)");
    }
}
