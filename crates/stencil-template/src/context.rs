/*
 * context.rs
 * Copyright (c) 2025 Posit, PBC
 */

//! Scope chain for template evaluation.
//!
//! The scope is a stack of frames above the caller's data object. Each loop
//! iteration pushes a frame carrying the current element and its iteration
//! metadata, and pops it when the iteration ends. Caller data is never
//! mutated; the automatic loop names live only in the frames.

use crate::value::Value;

/// One level of the iteration stack.
#[derive(Debug, Clone)]
pub struct Frame {
    /// The current element of the enclosing loop.
    pub this: Value,
    /// Zero-based iteration index.
    pub index: usize,
    /// Total number of iterations of the enclosing loop.
    pub count: usize,
}

impl Frame {
    /// Resolve one of the automatic loop names exposed by this frame.
    fn auto(&self, name: &str) -> Option<Value> {
        match name {
            "this" => Some(self.this.clone()),
            "index" => Some(Value::Number(self.index as f64)),
            "first" => Some(Value::Bool(self.index == 0)),
            "last" => Some(Value::Bool(self.index + 1 == self.count)),
            "count" => Some(Value::Number(self.count as f64)),
            _ => None,
        }
    }
}

/// A stack of bindings rooted at the caller's data object.
#[derive(Debug, Clone)]
pub struct Scope<'a> {
    root: &'a Value,
    frames: Vec<Frame>,
}

impl<'a> Scope<'a> {
    /// Create a scope whose bottom frame is the given data object.
    pub fn new(root: &'a Value) -> Self {
        Self {
            root,
            frames: Vec::new(),
        }
    }

    /// Push a loop frame. Must be balanced with [`Scope::pop`].
    pub fn push(&mut self, this: Value, index: usize, count: usize) {
        self.frames.push(Frame { this, index, count });
    }

    /// Pop the innermost loop frame.
    pub fn pop(&mut self) {
        self.frames.pop();
    }

    /// The innermost `this`, if any loop is active.
    pub fn this(&self) -> Option<&Value> {
        self.frames.last().map(|f| &f.this)
    }

    /// Resolve the `parent` name: the element of the loop enclosing the
    /// innermost one. With a single active loop this is `Null`.
    ///
    /// `depth` counts extra `parent` segments: `parent.parent` is depth 1.
    pub fn parent(&self, depth: usize) -> Value {
        let n = self.frames.len();
        // parent at depth 0 is the frame below the innermost one
        if n < depth + 2 {
            return Value::Null;
        }
        self.frames[n - depth - 2].this.clone()
    }

    /// Look up a bare identifier, searching frames top-down and finally the
    /// root data object. Automatic names shadow element keys within a frame.
    pub fn lookup(&self, name: &str) -> Value {
        for frame in self.frames.iter().rev() {
            if let Some(v) = frame.auto(name) {
                return v;
            }
            if let Some(v) = frame.this.get_key(name) {
                return v.clone();
            }
        }
        self.root.get_key(name).cloned().unwrap_or(Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hashlink::LinkedHashMap;

    fn record(entries: &[(&str, Value)]) -> Value {
        let mut m = LinkedHashMap::new();
        for (k, v) in entries {
            m.insert((*k).to_string(), v.clone());
        }
        Value::Record(m)
    }

    #[test]
    fn test_root_lookup() {
        let root = record(&[("name", Value::String("Ada".into()))]);
        let scope = Scope::new(&root);
        assert_eq!(scope.lookup("name"), Value::String("Ada".into()));
        assert_eq!(scope.lookup("missing"), Value::Null);
    }

    #[test]
    fn test_frame_shadows_root() {
        let root = record(&[("name", Value::String("outer".into()))]);
        let mut scope = Scope::new(&root);
        scope.push(record(&[("name", Value::String("inner".into()))]), 0, 2);

        assert_eq!(scope.lookup("name"), Value::String("inner".into()));
        scope.pop();
        assert_eq!(scope.lookup("name"), Value::String("outer".into()));
    }

    #[test]
    fn test_auto_names() {
        let root = record(&[]);
        let mut scope = Scope::new(&root);
        scope.push(Value::String("a".into()), 1, 3);

        assert_eq!(scope.lookup("index"), Value::Number(1.0));
        assert_eq!(scope.lookup("first"), Value::Bool(false));
        assert_eq!(scope.lookup("last"), Value::Bool(false));
        assert_eq!(scope.lookup("count"), Value::Number(3.0));
    }

    #[test]
    fn test_parent_chain() {
        let root = record(&[]);
        let mut scope = Scope::new(&root);
        scope.push(Value::String("grand".into()), 0, 1);
        scope.push(Value::String("outer".into()), 0, 1);
        scope.push(Value::String("inner".into()), 0, 1);

        assert_eq!(scope.parent(0), Value::String("outer".into()));
        assert_eq!(scope.parent(1), Value::String("grand".into()));
        assert_eq!(scope.parent(2), Value::Null);
    }

    #[test]
    fn test_frames_released_on_pop() {
        let root = record(&[]);
        let mut scope = Scope::new(&root);
        scope.push(Value::String("x".into()), 0, 1);
        assert!(scope.this().is_some());
        scope.pop();
        assert!(scope.this().is_none());
        assert_eq!(scope.lookup("index"), Value::Null);
    }
}
