use xview_document::vocabulary::BRIDGE_BINDING;

use crate::text::escape_literal;

const EXPR_OPEN: &str = "${";
const EXPR_CLOSE: char = '}';

/// Accumulates generated code.
///
/// Consecutive literal output is kept pending and emitted as one print
/// statement right before the next statement, or at [`finish`](Self::finish).
#[derive(Debug, Default)]
pub struct CodeBuilder {
    code: String,
    pending: String,
}

impl CodeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends literal output, turning each `${expr}` into a print of `expr`.
    ///
    /// The expression ends at the first `}` after `${`. An unterminated `${`
    /// is kept as literal text.
    pub fn output(&mut self, text: &str) -> &mut Self {
        let mut rest = text;
        while let Some(begin) = rest.find(EXPR_OPEN) {
            let expr_start = begin + EXPR_OPEN.len();
            let Some(len) = rest[expr_start..].find(EXPR_CLOSE) else {
                break;
            };

            self.pending.push_str(&rest[..begin]);
            let expr = &rest[expr_start..expr_start + len];
            self.statement(&format!("{}:print({});\n", BRIDGE_BINDING, expr));
            rest = &rest[expr_start + len + EXPR_CLOSE.len_utf8()..];
        }
        self.pending.push_str(rest);
        self
    }

    /// Appends executable code, flushing pending output first.
    pub fn statement(&mut self, code: &str) -> &mut Self {
        self.flush();
        self.code.push_str(code);
        self
    }

    fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        let literal = escape_literal(&self.pending);
        self.code
            .push_str(&format!("{}:print(\"{}\");\n", BRIDGE_BINDING, literal));
        self.pending.clear();
    }

    /// Flushes pending output and returns the generated code.
    pub fn finish(mut self) -> String {
        self.flush();
        self.code
    }
}
