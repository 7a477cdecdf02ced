/// Accumulates `(content, depth)` pairs and renders them in one pass.
///
/// All indentation arithmetic lives here: callers hand over trimmed line
/// content plus a depth, and rendering prefixes each line with the indent
/// unit repeated `depth` times, joining with single newlines and appending
/// no trailing newline.
pub(crate) struct Writer {
    lines: Vec<(String, usize)>,
    indent_unit: String,
    indent_cache: Vec<String>,
}

impl Writer {
    pub fn new(indent_width: usize) -> Self {
        Self {
            lines: Vec::new(),
            indent_unit: " ".repeat(indent_width),
            indent_cache: vec![String::new()],
        }
    }

    pub fn push(&mut self, content: impl Into<String>, depth: usize) {
        self.lines.push((content.into(), depth));
    }

    pub fn finish(mut self) -> String {
        let mut capacity = 0;
        for (content, depth) in &self.lines {
            capacity += content.len() + depth * self.indent_unit.len() + 1;
        }

        let mut out = String::with_capacity(capacity);
        for (i, (content, depth)) in self.lines.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            if *depth >= self.indent_cache.len() {
                extend_indent_cache(&mut self.indent_cache, &self.indent_unit, *depth);
            }
            out.push_str(&self.indent_cache[*depth]);
            out.push_str(content);
        }
        out
    }
}

fn extend_indent_cache(cache: &mut Vec<String>, unit: &str, depth: usize) {
    while cache.len() <= depth {
        let mut next = String::with_capacity(cache.last().map_or(0, String::len) + unit.len());
        if let Some(prev) = cache.last() {
            next.push_str(prev);
        }
        next.push_str(unit);
        cache.push(next);
    }
}
