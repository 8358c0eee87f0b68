//! Tag tokenizer and element tree for cascade definitions.
//!
//! Only the subset of markup found in cascade files is understood: paired
//! tags, text content, comments, declarations and attributes (which are
//! dropped). Self-closing tags carry no data and are skipped.

use super::error::CascadeParseError;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Token<'a> {
    Open(&'a str),
    Close(&'a str),
    Text(&'a str),
}

pub(crate) struct Tokenizer<'a> {
    src: &'a str,
    pos: usize,
}

impl<'a> Tokenizer<'a> {
    pub(crate) fn new(src: &'a str) -> Self {
        Self { src, pos: 0 }
    }

    fn skip_past(&mut self, marker: &str) -> Result<(), CascadeParseError> {
        let start = self.pos;
        match self.src[start..].find(marker) {
            Some(i) => {
                self.pos = start + i + marker.len();
                Ok(())
            }
            None => Err(CascadeParseError::UnterminatedTag {
                line: line_of(self.src, start),
            }),
        }
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Result<(Token<'a>, usize), CascadeParseError>;

    /// Yields each token with the byte offset where it starts.
    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let rest = &self.src[self.pos..];
            if rest.is_empty() {
                return None;
            }
            let start = self.pos;

            if !rest.starts_with('<') {
                let end = rest.find('<').unwrap_or(rest.len());
                self.pos += end;
                let text = rest[..end].trim();
                if text.is_empty() {
                    continue;
                }
                return Some(Ok((Token::Text(text), start)));
            }

            if rest.starts_with("<!--") {
                if let Err(e) = self.skip_past("-->") {
                    return Some(Err(e));
                }
                continue;
            }
            if rest.starts_with("<?") || rest.starts_with("<!") {
                if let Err(e) = self.skip_past(">") {
                    return Some(Err(e));
                }
                continue;
            }

            let Some(end) = rest.find('>') else {
                self.pos = self.src.len();
                return Some(Err(CascadeParseError::UnterminatedTag {
                    line: line_of(self.src, start),
                }));
            };
            self.pos += end + 1;
            let inner = rest[1..end].trim();
            if inner.ends_with('/') {
                continue;
            }
            let token = match inner.strip_prefix('/') {
                Some(name) => Token::Close(name.trim()),
                None => Token::Open(inner.split_whitespace().next().unwrap_or("")),
            };
            return Some(Ok((token, start)));
        }
    }
}

/// 1-based line number of a byte offset.
pub(crate) fn line_of(src: &str, offset: usize) -> usize {
    src[..offset.min(src.len())]
        .bytes()
        .filter(|&b| b == b'\n')
        .count()
        + 1
}

/// Parsed element: tag name, text content and child elements in order.
#[derive(Clone, Debug, Default)]
pub(crate) struct Element<'a> {
    pub name: &'a str,
    pub line: usize,
    text: Vec<&'a str>,
    pub children: Vec<Element<'a>>,
}

impl<'a> Element<'a> {
    /// Whitespace-separated words of the element's own text.
    pub(crate) fn words(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.text.iter().flat_map(|t| (*t).split_whitespace())
    }

    pub(crate) fn text(&self) -> String {
        self.words().collect::<Vec<_>>().join(" ")
    }

    /// First direct child with one of the given names.
    pub(crate) fn child(&self, names: &[&str]) -> Option<&Element<'a>> {
        self.children.iter().find(|c| names.contains(&c.name))
    }

    /// Direct children named `_` (list items).
    pub(crate) fn items(&self) -> impl Iterator<Item = &Element<'a>> {
        self.children.iter().filter(|c| c.name == "_")
    }

    /// First descendant (depth-first, document order) with one of the names.
    pub(crate) fn find(&self, names: &[&str]) -> Option<&Element<'a>> {
        for child in &self.children {
            if names.contains(&child.name) {
                return Some(child);
            }
            if let Some(found) = child.find(names) {
                return Some(found);
            }
        }
        None
    }

    /// Element that directly contains the first descendant named `name`,
    /// along with that descendant's index among its siblings.
    pub(crate) fn find_parent_of(&self, name: &str) -> Option<(&Element<'a>, usize)> {
        if let Some(idx) = self.children.iter().position(|c| c.name == name) {
            return Some((self, idx));
        }
        self.children.iter().find_map(|c| c.find_parent_of(name))
    }
}

/// Build the element tree for a whole document.
///
/// The returned root has an empty name and holds the top-level elements.
pub(crate) fn parse_document(src: &str) -> Result<Element<'_>, CascadeParseError> {
    let mut stack: Vec<Element<'_>> = vec![Element::default()];
    for item in Tokenizer::new(src) {
        let (token, at) = item?;
        match token {
            Token::Open(name) => stack.push(Element {
                name,
                line: line_of(src, at),
                ..Element::default()
            }),
            Token::Text(text) => {
                if let Some(top) = stack.last_mut() {
                    top.text.push(text);
                }
            }
            Token::Close(name) => {
                if stack.len() < 2 {
                    return Err(CascadeParseError::UnexpectedClose {
                        found: name.to_string(),
                        expected: String::new(),
                        line: line_of(src, at),
                    });
                }
                let Some(done) = stack.pop() else {
                    break;
                };
                if done.name != name {
                    return Err(CascadeParseError::UnexpectedClose {
                        found: name.to_string(),
                        expected: done.name.to_string(),
                        line: line_of(src, at),
                    });
                }
                if let Some(parent) = stack.last_mut() {
                    parent.children.push(done);
                }
            }
        }
    }

    if stack.len() > 1 {
        if stack.iter().any(|e| e.name == "stages") {
            return Err(CascadeParseError::UnclosedStages);
        }
        let open = &stack[1];
        return Err(CascadeParseError::UnclosedTag {
            tag: open.name.to_string(),
            line: open.line,
        });
    }
    Ok(stack.pop().unwrap_or_default())
}
