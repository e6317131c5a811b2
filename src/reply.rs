/// Marker sent instead of an empty message body.
pub const EMPTY_MARKER: &str = "<empty>";

/// What a command handler answers with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// Plain text; clears any quick-reply keyboard previously shown.
    PlainText(String),
    /// Text plus a single row of quick-reply options. `options` is never empty.
    Suggested { text: String, options: Vec<String> },
}

impl Reply {
    pub fn plain(text: impl Into<String>) -> Self {
        Reply::PlainText(text.into())
    }

    /// Builds a `Suggested` reply, degrading to `PlainText` when there is
    /// nothing to suggest.
    pub fn suggested<I, S>(text: impl Into<String>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let options: Vec<String> = options.into_iter().map(Into::into).collect();
        if options.is_empty() {
            Reply::PlainText(text.into())
        } else {
            Reply::Suggested {
                text: text.into(),
                options,
            }
        }
    }

    pub fn text(&self) -> &str {
        match self {
            Reply::PlainText(text) => text,
            Reply::Suggested { text, .. } => text,
        }
    }

    pub fn options(&self) -> &[String] {
        match self {
            Reply::PlainText(_) => &[],
            Reply::Suggested { options, .. } => options,
        }
    }

    /// Replaces an empty body with [`EMPTY_MARKER`] so the transport never
    /// receives a blank message.
    pub fn normalized(self) -> Self {
        match self {
            Reply::PlainText(text) if text.is_empty() => Reply::plain(EMPTY_MARKER),
            Reply::Suggested { text, options } if text.is_empty() => Reply::Suggested {
                text: EMPTY_MARKER.to_string(),
                options,
            },
            other => other,
        }
    }
}
