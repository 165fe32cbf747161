//! Tag queries for `next_tag_with`

/// Whether a query stops on closing tags
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TagClosers {
    #[default]
    Skip,
    Visit,
}

/// Which tag `next_tag_with` should stop on.
///
/// ```
/// use xml_tag_processor::{TagQuery, XmlProcessor};
///
/// let mut processor = XmlProcessor::new("<list><item/><item/><item/></list>");
/// let query = TagQuery::new().tag_name("item").match_offset(2);
/// assert!(processor.next_tag_with(&query));
/// assert_eq!(processor.get_breadcrumbs(), vec!["list", "item"]);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TagQuery<'a> {
    /// Exact, case-sensitive tag name. None matches any tag.
    pub tag_name: Option<&'a str>,
    pub tag_closers: TagClosers,
    /// Stop on the n-th match, counting from 1
    pub match_offset: usize,
    /// Breadcrumb suffix the tag must sit at (structural processor only)
    pub breadcrumbs: Option<&'a [&'a str]>,
}

impl Default for TagQuery<'_> {
    fn default() -> Self {
        TagQuery {
            tag_name: None,
            tag_closers: TagClosers::Skip,
            match_offset: 1,
            breadcrumbs: None,
        }
    }
}

impl<'a> TagQuery<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn tag_name(mut self, name: &'a str) -> Self {
        self.tag_name = Some(name);
        self
    }

    pub fn visit_closers(mut self) -> Self {
        self.tag_closers = TagClosers::Visit;
        self
    }

    pub fn match_offset(mut self, offset: usize) -> Self {
        self.match_offset = offset;
        self
    }

    pub fn breadcrumbs(mut self, pattern: &'a [&'a str]) -> Self {
        self.breadcrumbs = Some(pattern);
        self
    }

    /// Check the name and closer filters, ignoring breadcrumbs
    pub(crate) fn matches_tag(&self, name: &str, is_closer: bool) -> bool {
        if is_closer && self.tag_closers == TagClosers::Skip {
            return false;
        }
        self.tag_name.map_or(true, |wanted| wanted == name)
    }
}
