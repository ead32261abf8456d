//! Generic tree rewriting shared by plans and expressions
//!
//! Transforms never mutate their input: every node that changes (or has a
//! changed descendant) is rebuilt through [`TreeNode::with_new_children`],
//! untouched subtrees are cloned as-is.

use crate::error::Result;

/// Result of a rewrite, carrying whether anything actually changed
#[derive(Debug, Clone, PartialEq)]
pub struct Transformed<T> {
    pub data: T,
    pub transformed: bool,
}

impl<T> Transformed<T> {
    pub fn new(data: T, transformed: bool) -> Self {
        Self { data, transformed }
    }

    /// The value was rewritten
    pub fn yes(data: T) -> Self {
        Self::new(data, true)
    }

    /// The value is the input, unchanged
    pub fn no(data: T) -> Self {
        Self::new(data, false)
    }

    pub fn map_data<U, F: FnOnce(T) -> U>(self, f: F) -> Transformed<U> {
        Transformed::new(f(self.data), self.transformed)
    }

    /// Apply a fallible rewrite, keeping the change flag sticky
    pub fn transform_data<U, F>(self, f: F) -> Result<Transformed<U>>
    where
        F: FnOnce(T) -> Result<Transformed<U>>,
    {
        let transformed = self.transformed;
        f(self.data).map(|mut t| {
            t.transformed |= transformed;
            t
        })
    }
}

/// Controls descent in [`TreeNode::apply`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VisitRecursion {
    /// Visit the children of this node
    Continue,
    /// Do not visit the children of this node
    Skip,
}

/// A node with ordered children that can be rebuilt
pub trait TreeNode: Sized + Clone {
    fn children(&self) -> Vec<&Self>;

    /// Rebuild this node with replacement children.
    ///
    /// Fails with `InvalidChildrenNumber` when `children.len()` differs from
    /// the node's arity.
    fn with_new_children(&self, children: Vec<Self>) -> Result<Self>;

    /// Rewrite children first, then the (possibly rebuilt) node itself.
    fn transform_up<F>(&self, f: &mut F) -> Result<Transformed<Self>>
    where
        F: FnMut(Self) -> Result<Transformed<Self>>,
    {
        let rebuilt = self.map_children(|child| child.transform_up(f))?;
        rebuilt.transform_data(|node| f(node))
    }

    /// Rewrite the node first, then the children of whatever it became.
    fn transform_down<F>(&self, f: &mut F) -> Result<Transformed<Self>>
    where
        F: FnMut(Self) -> Result<Transformed<Self>>,
    {
        f(self.clone())?.transform_data(|node| node.map_children(|child| child.transform_down(f)))
    }

    /// Apply `f` to every child, rebuilding only when one of them changed
    fn map_children<F>(&self, mut f: F) -> Result<Transformed<Self>>
    where
        F: FnMut(&Self) -> Result<Transformed<Self>>,
    {
        let children = self.children();
        if children.is_empty() {
            return Ok(Transformed::no(self.clone()));
        }

        let mut transformed = false;
        let mut new_children = Vec::with_capacity(children.len());
        for child in children {
            let t = f(child)?;
            transformed |= t.transformed;
            new_children.push(t.data);
        }

        if transformed {
            Ok(Transformed::yes(self.with_new_children(new_children)?))
        } else {
            Ok(Transformed::no(self.clone()))
        }
    }

    /// Pre-order visit of the tree
    fn apply<F>(&self, f: &mut F) -> Result<()>
    where
        F: FnMut(&Self) -> Result<VisitRecursion>,
    {
        if f(self)? == VisitRecursion::Continue {
            for child in self.children() {
                child.apply(f)?;
            }
        }
        Ok(())
    }

    /// True if any node in the tree satisfies `pred`
    fn exists<F>(&self, mut pred: F) -> bool
    where
        F: FnMut(&Self) -> bool,
    {
        let mut found = false;
        // the visitor never fails
        let _ = self.apply(&mut |node| {
            if found || pred(node) {
                found = true;
                return Ok(VisitRecursion::Skip);
            }
            Ok(VisitRecursion::Continue)
        });
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[derive(Debug, Clone, PartialEq)]
    struct Node {
        label: String,
        children: Vec<Node>,
    }

    fn leaf(label: &str) -> Node {
        Node {
            label: label.to_string(),
            children: vec![],
        }
    }

    fn node(label: &str, children: Vec<Node>) -> Node {
        Node {
            label: label.to_string(),
            children,
        }
    }

    impl TreeNode for Node {
        fn children(&self) -> Vec<&Self> {
            self.children.iter().collect()
        }

        fn with_new_children(&self, children: Vec<Self>) -> Result<Self> {
            if children.len() != self.children.len() {
                return Err(Error::InvalidChildrenNumber {
                    node: self.label.clone(),
                    got: children.len(),
                    expected: self.children.len(),
                });
            }
            Ok(Node {
                label: self.label.clone(),
                children,
            })
        }
    }

    fn sample() -> Node {
        node("root", vec![node("a", vec![leaf("a1")]), leaf("b")])
    }

    #[test]
    fn test_transform_up_visits_children_first() {
        let tree = sample();
        let mut order = Vec::new();
        let result = tree
            .transform_up(&mut |n: Node| {
                order.push(n.label.clone());
                Ok(Transformed::no(n))
            })
            .unwrap();
        assert_eq!(order, vec!["a1", "a", "b", "root"]);
        assert!(!result.transformed);
        assert_eq!(result.data, tree);
    }

    #[test]
    fn test_transform_down_visits_parent_first() {
        let tree = sample();
        let mut order = Vec::new();
        tree.transform_down(&mut |n: Node| {
            order.push(n.label.clone());
            Ok(Transformed::no(n))
        })
        .unwrap();
        assert_eq!(order, vec!["root", "a", "a1", "b"]);
    }

    #[test]
    fn test_transform_does_not_mutate_input() {
        let tree = sample();
        let result = tree
            .transform_up(&mut |mut n: Node| {
                if n.label == "a1" {
                    n.label = "changed".to_string();
                    return Ok(Transformed::yes(n));
                }
                Ok(Transformed::no(n))
            })
            .unwrap();
        assert!(result.transformed);
        assert_eq!(result.data.children[0].children[0].label, "changed");
        assert_eq!(tree, sample());
    }

    #[test]
    fn test_transform_error_propagates() {
        let tree = sample();
        let err = tree
            .transform_up(&mut |n: Node| {
                if n.label == "b" {
                    return Err(Error::TableNotFound("b".to_string()));
                }
                Ok(Transformed::no(n))
            })
            .unwrap_err();
        assert!(matches!(err, Error::TableNotFound(name) if name == "b"));
    }

    #[test]
    fn test_exists() {
        let tree = sample();
        assert!(tree.exists(|n| n.label == "a1"));
        assert!(!tree.exists(|n| n.label == "zzz"));
    }
}
