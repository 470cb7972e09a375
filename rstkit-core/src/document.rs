//! Document assembly: ordered fragments in, one document body out.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DocumentError {
    /// No fragments were supplied. This is distinct from fragments that
    /// happen to render as empty text.
    #[error("Missing content_list")]
    EmptyInput,
}

/// Join fragments with a single newline, in the given order.
///
/// Fragments are neither trimmed nor reordered, so each keeps its own
/// trailing blank-line convention.
///
/// ```
/// use rstkit_core::{assemble, DocumentError};
///
/// assert_eq!(assemble(&["a", "b"]).unwrap(), "a\nb");
/// assert_eq!(assemble::<&str>(&[]), Err(DocumentError::EmptyInput));
/// ```
pub fn assemble<S: AsRef<str>>(fragments: &[S]) -> Result<String, DocumentError> {
    if fragments.is_empty() {
        return Err(DocumentError::EmptyInput);
    }

    let capacity = fragments.iter().map(|f| f.as_ref().len() + 1).sum();
    let mut out = String::with_capacity(capacity);
    for (index, fragment) in fragments.iter().enumerate() {
        if index > 0 {
            out.push('\n');
        }
        out.push_str(fragment.as_ref());
    }
    Ok(out)
}

/// Ordered collection of formatted fragments.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Document {
    fragments: Vec<String>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, fragment: impl Into<String>) {
        self.fragments.push(fragment.into());
    }

    pub fn len(&self) -> usize {
        self.fragments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fragments.is_empty()
    }

    pub fn fragments(&self) -> &[String] {
        &self.fragments
    }

    pub fn render(&self) -> Result<String, DocumentError> {
        assemble(&self.fragments)
    }
}

impl<S: Into<String>> FromIterator<S> for Document {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            fragments: iter.into_iter().map(Into::into).collect(),
        }
    }
}

impl<S: Into<String>> Extend<S> for Document {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        self.fragments.extend(iter.into_iter().map(Into::into));
    }
}
