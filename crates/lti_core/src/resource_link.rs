/// A learning activity instance exposed by a platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LtiResourceLink {
    identifier: String,
    url: Option<String>,
    title: Option<String>,
    text: Option<String>,
}

impl LtiResourceLink {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            url: None,
            title: None,
            text: None,
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }
}
