use crate::board::model::Point;

/// External markup-to-glyph renderer. It always re-renders the whole
/// document, so it receives every entry each time.
pub trait Typesetter {
    fn retypeset(&mut self, entries: &[RenderedResult]);
}

/// Typesetter that only records the request in the log.
#[derive(Debug, Default)]
pub struct LogTypesetter;

impl Typesetter for LogTypesetter {
    fn retypeset(&mut self, entries: &[RenderedResult]) {
        tracing::debug!(entries = entries.len(), "retypeset requested");
    }
}

/// Inline math markup for one result.
pub fn render_markup(expression: &str, answer: &str) -> String {
    format!("\\(\\LARGE{{{expression} = {answer}}}\\)")
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedResult {
    markup: String,
    position: Point,
}

impl RenderedResult {
    pub fn markup(&self) -> &str {
        &self.markup
    }

    pub fn position(&self) -> Point {
        self.position
    }
}

/// Ordered, individually draggable results laid over the board.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ResultOverlay {
    entries: Vec<RenderedResult>,
    needs_typeset: bool,
}

impl ResultOverlay {
    pub fn append(&mut self, markup: String, position: Point) {
        tracing::debug!(
            index = self.entries.len(),
            x = position.x,
            y = position.y,
            "appending result overlay"
        );
        self.entries.push(RenderedResult { markup, position });
        self.needs_typeset = true;
    }

    /// Move the entry at `index`. Returns false when there is no such entry.
    pub fn reposition(&mut self, index: usize, position: Point) -> bool {
        match self.entries.get_mut(index) {
            Some(entry) => {
                entry.position = position;
                true
            }
            None => false,
        }
    }

    pub fn entries(&self) -> &[RenderedResult] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn needs_typeset(&self) -> bool {
        self.needs_typeset
    }

    /// Run one re-typeset for every append since the last flush.
    pub fn flush_typeset(&mut self, typesetter: &mut dyn Typesetter) -> bool {
        if !self.needs_typeset {
            return false;
        }
        self.needs_typeset = false;
        if self.entries.is_empty() {
            return false;
        }
        typesetter.retypeset(&self.entries);
        true
    }

    pub fn reset(&mut self) {
        self.entries.clear();
        self.needs_typeset = false;
    }
}
