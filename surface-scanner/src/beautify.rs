const INDENT: &str = "    ";

/// Expand minified/compressed JavaScript into a multi-line, indented
/// form. String and template literals pass through untouched, so
/// every quoted span survives for the matcher; only structural
/// characters outside strings introduce line breaks.
pub fn beautify(source: &str) -> String {
    let mut out = String::with_capacity(source.len() + source.len() / 4);
    let mut depth: usize = 0;
    let mut in_string: Option<char> = None;
    let mut escaped = false;
    let mut chars = source.chars().peekable();

    while let Some(c) = chars.next() {
        if let Some(quote) = in_string {
            out.push(c);
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == quote {
                in_string = None;
            }
            continue;
        }

        match c {
            '"' | '\'' | '`' => {
                in_string = Some(c);
                out.push(c);
            }
            '{' => {
                out.push(c);
                depth += 1;
                push_break(&mut out, depth);
            }
            '}' => {
                depth = depth.saturating_sub(1);
                push_break(&mut out, depth);
                out.push(c);
                // A closer not followed by a continuation starts a new line.
                match chars.peek() {
                    Some(';') | Some(',') | Some(')') | Some('}') => {}
                    _ => push_break(&mut out, depth),
                }
            }
            ';' => {
                out.push(c);
                push_break(&mut out, depth);
            }
            '\n' | '\r' => {
                if !out.ends_with('\n') && !out.is_empty() {
                    push_break(&mut out, depth);
                }
            }
            _ => out.push(c),
        }
    }

    out
}

fn push_break(out: &mut String, depth: usize) {
    // Avoid stacking blank lines when breaks coincide.
    while out.ends_with(' ') {
        out.pop();
    }
    if out.ends_with('\n') {
        while out.ends_with('\n') {
            out.pop();
        }
    }
    out.push('\n');
    for _ in 0..depth {
        out.push_str(INDENT);
    }
}
