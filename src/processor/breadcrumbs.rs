//! Breadcrumb pattern matching
//!
//! A pattern is matched against the end of the open-element path, so
//! `["content", "image"]` matches `wp:post > content > image`. A `*`
//! segment matches exactly one element of any name.

/// One segment of a breadcrumb pattern
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Segment<'a> {
    Any,
    Name(&'a str),
}

impl<'a> From<&'a str> for Segment<'a> {
    fn from(segment: &'a str) -> Self {
        match segment {
            "*" => Segment::Any,
            name => Segment::Name(name),
        }
    }
}

impl Segment<'_> {
    #[inline]
    pub fn matches(&self, crumb: &str) -> bool {
        match self {
            Segment::Any => true,
            Segment::Name(name) => *name == crumb,
        }
    }
}

/// Whether `pattern` matches the trailing elements of `crumbs`
///
/// An empty pattern matches any path.
pub fn matches_suffix<S: AsRef<str>>(crumbs: &[S], pattern: &[&str]) -> bool {
    let Some(offset) = crumbs.len().checked_sub(pattern.len()) else {
        return false;
    };
    pattern
        .iter()
        .zip(&crumbs[offset..])
        .all(|(segment, crumb)| Segment::from(*segment).matches(crumb.as_ref()))
}
