//! Mutation interception pipeline.
//!
//! Filters wrap the document's mutation entry points and may transform,
//! reject, or split an operation before it reaches the unfiltered document.
//! The chain is an explicit ordered stack applied as a fold: each filter is
//! handed the remainder of the chain, and the fold's seed is the document's
//! unfiltered operation. The most recently pushed filter runs first.

use std::rc::Rc;

use tracing::trace;
use unicode_normalization::{UnicodeNormalization, is_nfc};

use crate::document::{DocumentError, TextDocument};
use crate::info::EditInfo;

/// The rest of the chain below the current filter. Invoking `insert_at` /
/// `delete_at` forwards to the next filter, or to the unfiltered document
/// operation once the chain is exhausted.
pub struct FilterChain<'a> {
    pub(crate) rest: &'a mut [Box<dyn DocumentFilter>],
    pub(crate) doc: &'a mut TextDocument,
}

impl FilterChain<'_> {
    /// Read-only peek at the document (length checks and the like).
    pub fn document(&self) -> &TextDocument {
        self.doc
    }

    pub fn insert_at(
        &mut self,
        offset: usize,
        text: &str,
    ) -> Result<Option<Rc<EditInfo>>, DocumentError> {
        match self.rest.split_last_mut() {
            Some((head, rest)) => {
                let mut chain = FilterChain {
                    rest,
                    doc: &mut *self.doc,
                };
                head.insert_at(&mut chain, offset, text)
            }
            None => self.doc.insert_unfiltered(offset, text),
        }
    }

    pub fn delete_at(
        &mut self,
        offset: usize,
        length: usize,
    ) -> Result<Option<Rc<EditInfo>>, DocumentError> {
        match self.rest.split_last_mut() {
            Some((head, rest)) => {
                let mut chain = FilterChain {
                    rest,
                    doc: &mut *self.doc,
                };
                head.delete_at(&mut chain, offset, length)
            }
            None => self.doc.delete_unfiltered(offset, length),
        }
    }
}

/// A pluggable interceptor for document mutations.
///
/// Default implementations forward unchanged; a filter overrides the
/// operations it cares about and decides whether (and with what arguments)
/// to invoke the rest of the chain. Returning `Ok(None)` without forwarding
/// rejects the mutation silently.
pub trait DocumentFilter {
    fn name(&self) -> &str;

    fn insert_at(
        &mut self,
        chain: &mut FilterChain<'_>,
        offset: usize,
        text: &str,
    ) -> Result<Option<Rc<EditInfo>>, DocumentError> {
        chain.insert_at(offset, text)
    }

    fn delete_at(
        &mut self,
        chain: &mut FilterChain<'_>,
        offset: usize,
        length: usize,
    ) -> Result<Option<Rc<EditInfo>>, DocumentError> {
        chain.delete_at(offset, length)
    }
}

/// Caps the document length; oversized inserts are truncated to the room
/// left and fully rejected once the cap is reached.
#[derive(Debug, Clone, Copy)]
pub struct MaxLengthFilter {
    max_chars: usize,
}

impl MaxLengthFilter {
    pub fn new(max_chars: usize) -> Self {
        Self { max_chars }
    }
}

impl DocumentFilter for MaxLengthFilter {
    fn name(&self) -> &str {
        "max-length"
    }

    fn insert_at(
        &mut self,
        chain: &mut FilterChain<'_>,
        offset: usize,
        text: &str,
    ) -> Result<Option<Rc<EditInfo>>, DocumentError> {
        let room = self.max_chars.saturating_sub(chain.document().len());
        if room == 0 {
            trace!(target: "document.filter", filter = self.name(), "insert rejected");
            return Ok(None);
        }
        if text.chars().count() <= room {
            return chain.insert_at(offset, text);
        }
        let truncated: String = text.chars().take(room).collect();
        trace!(
            target: "document.filter",
            filter = self.name(),
            kept = room,
            "insert truncated"
        );
        chain.insert_at(offset, &truncated)
    }
}

/// Suppresses line breaks for single-line fields: any run of `'\n'`/`'\r'`
/// in inserted text collapses to a single space.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineBreakFilter;

impl LineBreakFilter {
    fn sanitize(text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        let mut in_break = false;
        for ch in text.chars() {
            if ch == '\n' || ch == '\r' {
                if !in_break {
                    out.push(' ');
                    in_break = true;
                }
            } else {
                out.push(ch);
                in_break = false;
            }
        }
        out
    }
}

impl DocumentFilter for LineBreakFilter {
    fn name(&self) -> &str {
        "line-break"
    }

    fn insert_at(
        &mut self,
        chain: &mut FilterChain<'_>,
        offset: usize,
        text: &str,
    ) -> Result<Option<Rc<EditInfo>>, DocumentError> {
        if !text.contains(['\n', '\r']) {
            return chain.insert_at(offset, text);
        }
        trace!(target: "document.filter", filter = self.name(), "line breaks suppressed");
        chain.insert_at(offset, &Self::sanitize(text))
    }
}

/// Normalizes inserted text to NFC so the buffer holds one canonical form
/// regardless of the input source (IME, paste, composition).
#[derive(Debug, Clone, Copy, Default)]
pub struct NfcFilter;

impl DocumentFilter for NfcFilter {
    fn name(&self) -> &str {
        "nfc"
    }

    fn insert_at(
        &mut self,
        chain: &mut FilterChain<'_>,
        offset: usize,
        text: &str,
    ) -> Result<Option<Rc<EditInfo>>, DocumentError> {
        if is_nfc(text) {
            return chain.insert_at(offset, text);
        }
        let normalized: String = text.nfc().collect();
        trace!(target: "document.filter", filter = self.name(), "normalized insert");
        chain.insert_at(offset, &normalized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_collapses_break_runs() {
        assert_eq!(LineBreakFilter::sanitize("a\r\nb\nc"), "a b c");
        assert_eq!(LineBreakFilter::sanitize("\n\n"), " ");
    }
}
