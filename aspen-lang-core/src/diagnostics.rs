use crate::span::Span;

/// A few numbered source lines around `span` with a caret row under
/// the offending range.
pub fn code_frame(source: &str, span: Span) -> String {
    let lines: Vec<&str> = source.split('\n').collect();
    let line = span.start.line as usize;
    let first = line.saturating_sub(2).max(1);
    let last = (line + 1).min(lines.len());
    let width = last.to_string().len();

    let mut out = Vec::new();
    for n in first..=last {
        out.push(format!(
            "{:>width$} |  {}",
            n,
            lines.get(n - 1).unwrap_or(&""),
            width = width
        ));
        if n == line {
            let carets = if span.end.line == span.start.line {
                (span.end.col.saturating_sub(span.start.col)).max(1) as usize
            } else {
                1
            };
            out.push(format!(
                "{:>width$} |  {}{}",
                "",
                " ".repeat(span.start.col.saturating_sub(1) as usize),
                "^".repeat(carets),
                width = width
            ));
        }
    }
    out.join("\n")
}

/// Code frame plus message when the error location is known, the bare
/// message otherwise.
pub fn render(source: &str, span: Option<Span>, message: &str) -> String {
    match span {
        Some(span) => format!("{}\n\n{}", code_frame(source, span), message),
        None => message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Position;

    #[test]
    fn test_code_frame() {
        let source = "let a = 1;\nlet b = a + c;\nlet d = 2;";
        let span = Span {
            start: Position { line: 2, col: 13 },
            end: Position { line: 2, col: 14 },
        };
        assert_eq!(
            code_frame(source, span),
            "1 |  let a = 1;\n\
             2 |  let b = a + c;\n  \
               |              ^\n\
             3 |  let d = 2;"
        );
    }

    #[test]
    fn test_frame_at_first_line() {
        let source = "x;";
        let span = Span {
            start: Position { line: 1, col: 1 },
            end: Position { line: 1, col: 2 },
        };
        assert_eq!(code_frame(source, span), "1 |  x;\n  |  ^");
    }

    #[test]
    fn test_render_without_span() {
        assert_eq!(render("x;", None, "boom"), "boom");
    }
}
