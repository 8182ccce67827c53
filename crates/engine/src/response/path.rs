use std::sync::Arc;

use async_graphql_value::Name;
use error::{ErrorPath, ErrorPathSegment, InsertIntoErrorPath};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PathSegment {
    Field(Name),
    Index(usize),
}

struct PathNode {
    parent: ResponsePath,
    segment: PathSegment,
    len: usize,
}

/// Path of a value within the response, shared between a task and the tasks it spawns.
///
/// Appending a segment is a single allocation, no matter how deep the path is.
#[derive(Clone, Default)]
pub struct ResponsePath(Option<Arc<PathNode>>);

impl ResponsePath {
    pub fn root() -> Self {
        Self(None)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_none()
    }

    pub fn len(&self) -> usize {
        self.0.as_ref().map(|node| node.len).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.is_root()
    }

    #[must_use]
    pub fn field(&self, name: &Name) -> Self {
        self.push(PathSegment::Field(name.clone()))
    }

    #[must_use]
    pub fn index(&self, index: usize) -> Self {
        self.push(PathSegment::Index(index))
    }

    fn push(&self, segment: PathSegment) -> Self {
        Self(Some(Arc::new(PathNode {
            parent: self.clone(),
            segment,
            len: self.len() + 1,
        })))
    }

    pub fn last(&self) -> Option<&PathSegment> {
        self.0.as_ref().map(|node| &node.segment)
    }

    pub fn parent(&self) -> Option<&ResponsePath> {
        self.0.as_ref().map(|node| &node.parent)
    }

    /// Segments from the root down to this path.
    pub fn segments(&self) -> Vec<&PathSegment> {
        let mut segments = Vec::with_capacity(self.len());
        let mut current = self;
        while let Some(node) = &current.0 {
            segments.push(&node.segment);
            current = &node.parent;
        }
        segments.reverse();
        segments
    }

    pub fn to_error_path(&self) -> ErrorPath {
        ErrorPath::from(self)
    }
}

impl InsertIntoErrorPath for &ResponsePath {
    fn insert_into(self, path: &mut ErrorPath) {
        for segment in self.segments() {
            path.push(match segment {
                PathSegment::Field(name) => ErrorPathSegment::Field(name.as_str().into()),
                PathSegment::Index(index) => ErrorPathSegment::Index(*index),
            });
        }
    }
}

impl std::fmt::Display for ResponsePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, segment) in self.segments().into_iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            match segment {
                PathSegment::Field(name) => f.write_str(name)?,
                PathSegment::Index(index) => write!(f, "{index}")?,
            }
        }
        Ok(())
    }
}

impl std::fmt::Debug for ResponsePath {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "ResponsePath({self})")
    }
}

impl PartialEq for ResponsePath {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.segments() == other.segments()
    }
}

impl Eq for ResponsePath {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn children_share_their_parent() {
        let users = ResponsePath::root().field(&Name::new("users"));
        let first = users.index(0).field(&Name::new("name"));
        let second = users.index(1).field(&Name::new("name"));

        assert_eq!(first.to_string(), "users.0.name");
        assert_eq!(second.len(), 3);
        assert_eq!(first.parent().and_then(ResponsePath::parent), Some(&users));
        assert_eq!(
            serde_json::to_value(second.to_error_path()).unwrap(),
            serde_json::json!(["users", 1, "name"])
        );
    }
}
