use std::{
    io,
    path::{Path, PathBuf},
};

use self::lexer::Span;

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod symbol;

/// A rill source text together with where it came from. Spans produced by
/// the lexer index into `contents`, so the text is kept alive for the whole
/// parse and slicing a span back out is always valid.
#[derive(Debug)]
pub struct SourceFile {
    contents: String,
    path: Option<PathBuf>,
}

impl SourceFile {
    /// Wraps a string that has no backing file, e.g. in tests.
    pub fn in_memory(contents: impl Into<String>) -> Self {
        Self {
            contents: contents.into(),
            path: None,
        }
    }

    /// Loads a source file from disk, remembering its path for diagnostics.
    pub fn read(path: impl AsRef<Path>) -> io::Result<Self> {
        let path = path.as_ref();

        Ok(Self {
            contents: std::fs::read_to_string(path)?,
            path: Some(path.to_path_buf()),
        })
    }

    pub fn contents(&self) -> &str {
        &self.contents
    }

    /// The text a span covers.
    pub fn value_of_span(&self, span: Span) -> &str {
        &self.contents[span.start..span.end]
    }

    /// Name to show in messages: the on-disk path, or `<memory>`.
    pub fn display_name(&self) -> String {
        match &self.path {
            Some(path) => path.display().to_string(),
            None => "<memory>".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spans_slice_back_into_the_text() {
        let source = SourceFile::in_memory("int main");
        assert_eq!(source.value_of_span(Span::new(4, 8)), "main");
        assert_eq!(source.display_name(), "<memory>");
    }
}
