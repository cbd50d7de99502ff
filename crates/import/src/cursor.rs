use quick_xml::events::Event;
use quick_xml::name::QName;
use quick_xml::Reader;

use crate::error::{markup, OfxError};
use crate::util::re;

re!(re_stmttrn_open, r"(?i)<\s*STMTTRN\b");

/// An element the cursor has just entered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementStart {
    pub name: String,
    /// Depth of this element; the document root is depth 1.
    pub depth: usize,
    /// Byte offset of the `<` that opens the element.
    offset: usize,
    /// Byte offset just past the start tag.
    tag_end: usize,
    empty: bool,
}

impl ElementStart {
    /// `<NAME/>`: there is no content and no end event to wait for.
    pub fn is_empty(&self) -> bool {
        self.empty
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CursorEvent {
    Start(ElementStart),
    End { name: String, depth: usize },
}

/// Forward-only, depth-tracking walk over balanced markup.
///
/// Callers that care about one element's contents call [`take_element`]
/// to get its outer markup and parse that slice on its own, so no tree of
/// the whole document is ever built.
///
/// [`take_element`]: ElementCursor::take_element
pub struct ElementCursor<'a> {
    reader: Reader<&'a [u8]>,
    source: &'a str,
    depth: usize,
}

impl<'a> ElementCursor<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            reader: Reader::from_str(source),
            source,
            depth: 0,
        }
    }

    fn position(&self) -> usize {
        self.reader.buffer_position() as usize
    }

    /// Next start or end of an element; text and other events are skipped.
    pub fn next(&mut self) -> Result<Option<CursorEvent>, OfxError> {
        loop {
            match self.reader.read_event().map_err(markup)? {
                Event::Start(e) => {
                    self.depth += 1;
                    let start = self.element_start(e.name().as_ref(), false);
                    return Ok(Some(CursorEvent::Start(start)));
                }
                Event::Empty(e) => {
                    let start = self.element_start(e.name().as_ref(), true);
                    return Ok(Some(CursorEvent::Start(start)));
                }
                Event::End(e) => {
                    let depth = self.depth;
                    self.depth = self.depth.saturating_sub(1);
                    return Ok(Some(CursorEvent::End {
                        name: String::from_utf8_lossy(e.name().as_ref()).into_owned(),
                        depth,
                    }));
                }
                Event::Eof => return Ok(None),
                _ => {}
            }
        }
    }

    /// Like [`next`](Self::next), scoped to the element entered at `depth`:
    /// yields `None` once that element's end tag has been consumed.
    pub fn next_within(&mut self, depth: usize) -> Result<Option<CursorEvent>, OfxError> {
        match self.next()? {
            Some(CursorEvent::End { depth: closed, .. }) if closed <= depth => Ok(None),
            other => Ok(other),
        }
    }

    /// Consumes the rest of the element just entered and returns its outer markup.
    pub fn take_element(&mut self, start: &ElementStart) -> Result<&'a str, OfxError> {
        let source = self.source;
        if start.empty {
            return Ok(&source[start.offset..start.tag_end]);
        }
        self.reader
            .read_to_end(QName(start.name.as_bytes()))
            .map_err(markup)?;
        self.depth = self.depth.saturating_sub(1);
        Ok(&source[start.offset..self.position()])
    }

    fn element_start(&self, name: &[u8], empty: bool) -> ElementStart {
        let tag_end = self.position();
        let offset = self.source[..tag_end].rfind('<').unwrap_or(0);
        ElementStart {
            name: String::from_utf8_lossy(name).into_owned(),
            depth: if empty { self.depth + 1 } else { self.depth },
            offset,
            tag_end,
            empty,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourcePosition {
    /// 1-based line in the decoded input.
    pub line: usize,
    pub byte_offset: usize,
}

/// Finds successive `<STMTTRN` tags in the original (unrepaired) text so that
/// diagnostics can point at the user's file rather than the repaired copy.
pub struct SourceLocator<'a> {
    source: &'a str,
    offset: usize,
    line: usize,
}

impl<'a> SourceLocator<'a> {
    pub fn new(source: &'a str) -> Self {
        Self {
            source,
            offset: 0,
            line: 1,
        }
    }

    /// Position of the next transaction tag after the previous one, if any.
    pub fn next_transaction(&mut self) -> Option<SourcePosition> {
        let m = re_stmttrn_open().find_at(self.source, self.offset)?;
        let line = self.line + newlines(&self.source[self.offset..m.start()]);
        self.line = line + newlines(m.as_str());
        self.offset = m.end();
        Some(SourcePosition {
            line,
            byte_offset: m.start(),
        })
    }
}

fn newlines(s: &str) -> usize {
    s.bytes().filter(|b| *b == b'\n').count()
}
