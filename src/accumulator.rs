//! Character-budgeted accumulation of streamed model output.

/// Accumulates streamed text while enforcing a character budget.
///
/// Length is counted in Unicode scalar values, so `写周报` is three
/// characters. The accumulated text never grows beyond the budget.
#[derive(Debug, Clone)]
pub struct BudgetAccumulator {
    limit: usize,
    text: String,
    length: usize,
}

impl BudgetAccumulator {
    /// Create an accumulator admitting at most `limit` characters.
    pub fn new(limit: usize) -> Self {
        Self {
            limit,
            text: String::new(),
            length: 0,
        }
    }

    /// Append one character.
    ///
    /// Returns `false` once the character would push the length past the
    /// limit; the character is dropped.
    pub fn push(&mut self, ch: char) -> bool {
        if self.length >= self.limit {
            return false;
        }
        self.text.push(ch);
        self.length += 1;
        true
    }

    /// Text accumulated so far.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Number of characters accumulated so far.
    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Consume the accumulator, returning the raw text.
    pub fn into_text(self) -> String {
        self.text
    }
}
