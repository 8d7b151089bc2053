use std::cell::{Cell, RefCell};

use crate::value::Value;

/// A segment in a navigable path used to address state.
///
/// Paths are produced by the accessor machinery and parsed back into
/// segments when a memory resolves or writes them.
#[derive(Debug, Clone, PartialEq)]
pub enum PathSegment {
    /// Object field access by name
    ///
    /// # Examples
    /// - `name` → `Field("name")`
    /// - `user.email` → `[Field("user"), Field("email")]`
    /// - `items['first name']` → `[Field("items"), Field("first name")]`
    Field(String),

    /// Array element access by index
    ///
    /// # Examples
    /// - `items[0]` → `[Field("items"), Index(0)]`
    /// - `items[-1]` → `[Field("items"), Index(-1)]` (negative indices supported)
    Index(i64),
}

/// A sequence of path segments navigating a document.
pub type Path = Vec<PathSegment>;

/// Parse a dotted/bracketed path string into segments.
///
/// Accepts `a.b`, `a[0]`, `a[-1]`, and `a['key']` / `a["key"]` forms in any
/// combination. Returns `None` for malformed paths; a memory treats that the
/// same as a path that resolves to nothing.
pub fn parse_path(path: &str) -> Option<Path> {
    let chars: Vec<char> = path.chars().collect();
    let mut segments = Vec::new();
    let mut pos = 0;

    while pos < chars.len() {
        match chars[pos] {
            '.' => {
                // A dot must sit between two segments
                if segments.is_empty() || pos + 1 >= chars.len() {
                    return None;
                }
                pos += 1;
            }
            '[' => {
                pos += 1;
                if pos >= chars.len() {
                    return None;
                }
                if chars[pos] == '\'' || chars[pos] == '"' {
                    let quote = chars[pos];
                    pos += 1;
                    let start = pos;
                    while pos < chars.len() && chars[pos] != quote {
                        pos += 1;
                    }
                    if pos >= chars.len() {
                        return None;
                    }
                    let name: String = chars[start..pos].iter().collect();
                    pos += 1; // closing quote
                    if pos >= chars.len() || chars[pos] != ']' {
                        return None;
                    }
                    pos += 1;
                    segments.push(PathSegment::Field(name));
                } else {
                    let start = pos;
                    while pos < chars.len() && chars[pos] != ']' {
                        pos += 1;
                    }
                    if pos >= chars.len() {
                        return None;
                    }
                    let text: String = chars[start..pos].iter().collect();
                    pos += 1;
                    match text.trim().parse::<i64>() {
                        Ok(index) => segments.push(PathSegment::Index(index)),
                        Err(_) => return None,
                    }
                }
            }
            c if c.is_alphanumeric() || c == '_' => {
                let start = pos;
                while pos < chars.len() && (chars[pos].is_alphanumeric() || chars[pos] == '_') {
                    pos += 1;
                }
                segments.push(PathSegment::Field(chars[start..pos].iter().collect()));
            }
            _ => return None,
        }
    }

    if segments.is_empty() {
        return None;
    }
    Some(segments)
}

/// Walk a value along parsed segments, returning the addressed subvalue.
pub fn navigate<'v>(value: &'v Value, segments: &[PathSegment]) -> Option<&'v Value> {
    let mut current = value;
    for segment in segments {
        match segment {
            PathSegment::Field(name) => match current {
                Value::Object(obj) => current = obj.get(name)?,
                _ => return None,
            },
            PathSegment::Index(index) => match current {
                Value::Array(arr) => {
                    let len = arr.len() as i64;
                    let actual = if *index < 0 { len + index } else { *index };
                    if actual < 0 || actual >= len {
                        return None;
                    }
                    current = &arr[actual as usize];
                }
                _ => return None,
            },
        }
    }
    Some(current)
}

/// External state an expression evaluates against.
///
/// Implementations own the lookup strategy; the engine only ever hands them
/// whole path strings (`user.items[2].name`) and treats an unresolved path
/// as "no value", never as an error.
pub trait Memory {
    /// Look up a path, returning the value it addresses if any.
    fn resolve(&self, path: &str) -> Option<Value>;

    /// Write a value at a path. Returns false when the path cannot be
    /// written (missing parent, non-container in the middle, read-only).
    fn set_value(&self, path: &str, value: Value) -> bool;

    /// An opaque tag that changes whenever the visible state changes.
    fn version(&self) -> String;
}

/// Memory over a single owned JSON-like document.
///
/// Writes go through interior mutability so the evaluator can hold `&dyn
/// Memory` everywhere; the version counter bumps on every successful write.
pub struct SimpleObjectMemory {
    document: RefCell<Value>,
    version: Cell<u64>,
}

impl SimpleObjectMemory {
    pub fn new(document: Value) -> Self {
        SimpleObjectMemory {
            document: RefCell::new(document),
            version: Cell::new(0),
        }
    }

    pub fn from_json(json: serde_json::Value) -> Self {
        SimpleObjectMemory::new(Value::from(json))
    }

    /// Clone out the current document (primarily for tests and the CLI).
    pub fn snapshot(&self) -> Value {
        self.document.borrow().clone()
    }
}

impl Memory for SimpleObjectMemory {
    fn resolve(&self, path: &str) -> Option<Value> {
        let segments = parse_path(path)?;
        navigate(&self.document.borrow(), &segments).cloned()
    }

    fn set_value(&self, path: &str, value: Value) -> bool {
        let Some(segments) = parse_path(path) else {
            return false;
        };
        let (last, parents) = match segments.split_last() {
            Some(split) => split,
            None => return false,
        };

        let mut document = self.document.borrow_mut();
        let mut current = &mut *document;
        // Intermediate segments must already exist and be containers.
        for segment in parents {
            match segment {
                PathSegment::Field(name) => match current {
                    Value::Object(obj) => match obj.get_mut(name) {
                        Some(next) => current = next,
                        None => return false,
                    },
                    _ => return false,
                },
                PathSegment::Index(index) => match current {
                    Value::Array(arr) => {
                        let len = arr.len() as i64;
                        let actual = if *index < 0 { len + index } else { *index };
                        if actual < 0 || actual >= len {
                            return false;
                        }
                        current = &mut arr[actual as usize];
                    }
                    _ => return false,
                },
            }
        }

        match last {
            PathSegment::Field(name) => match current {
                Value::Object(obj) => {
                    obj.insert(name.clone(), value);
                }
                _ => return false,
            },
            PathSegment::Index(index) => match current {
                Value::Array(arr) => {
                    let len = arr.len() as i64;
                    let actual = if *index < 0 { len + index } else { *index };
                    if actual < 0 || actual > len {
                        return false;
                    }
                    // Index == length appends
                    if actual == len {
                        arr.push(value);
                    } else {
                        arr[actual as usize] = value;
                    }
                }
                _ => return false,
            },
        }

        self.version.set(self.version.get() + 1);
        true
    }

    fn version(&self) -> String {
        self.version.get().to_string()
    }
}

/// A memory layering one named binding over a parent memory.
///
/// Used by iterating functions to expose the current element under the
/// iterator name while everything else still resolves against the parent.
pub struct ScopedMemory<'a> {
    parent: &'a dyn Memory,
    name: String,
    value: Value,
}

impl<'a> ScopedMemory<'a> {
    pub fn new(parent: &'a dyn Memory, name: &str, value: Value) -> Self {
        ScopedMemory {
            parent,
            name: name.to_string(),
            value,
        }
    }
}

impl Memory for ScopedMemory<'_> {
    fn resolve(&self, path: &str) -> Option<Value> {
        let segments = parse_path(path)?;
        match segments.first() {
            Some(PathSegment::Field(name)) if *name == self.name => {
                navigate(&self.value, &segments[1..]).cloned()
            }
            _ => self.parent.resolve(path),
        }
    }

    fn set_value(&self, path: &str, value: Value) -> bool {
        // The binding itself is read-only; everything else writes through.
        if let Some(segments) = parse_path(path) {
            if let Some(PathSegment::Field(name)) = segments.first() {
                if *name == self.name {
                    return false;
                }
            }
        }
        self.parent.set_value(path, value)
    }

    fn version(&self) -> String {
        self.parent.version()
    }
}
