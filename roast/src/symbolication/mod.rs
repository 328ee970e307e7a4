use fnv::FnvHashMap;

use crate::calltree::Frame;

pub use self::mcp::MappingError;

pub mod mcp;

/// Human readable name of one obfuscated class, with its method candidates.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ClassMapping {
    actual: String,
    methods: FnvHashMap<String, Vec<String>>,
}

impl ClassMapping {
    pub fn new(actual: impl Into<String>) -> Self {
        Self {
            actual: actual.into(),
            methods: FnvHashMap::default(),
        }
    }

    pub fn actual(&self) -> &str {
        &self.actual
    }

    /// every known candidate for `raw`, possibly none
    pub fn resolve_method(&self, raw: &str) -> &[String] {
        self.methods.get(raw).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn add_method(&mut self, raw: impl Into<String>, actual: impl Into<String>) {
        let actual = actual.into();
        let candidates = self.methods.entry(raw.into()).or_default();
        if !candidates.contains(&actual) {
            candidates.push(actual);
        }
    }
}

/// Lookup tables translating raw identifiers into readable names.
/// Read-only once loaded.
#[derive(Debug, Default, Clone)]
pub struct Symbols {
    classes: FnvHashMap<String, ClassMapping>,
    method_ids: FnvHashMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MethodResolution {
    Unmapped,
    Matched(String),
    Ambiguous(Vec<String>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedName<'a> {
    pub raw: &'a Frame,
    /// readable class name when the class is mapped
    pub class: Option<&'a str>,
    pub method: MethodResolution,
}

impl ResolvedName<'_> {
    pub fn class_name(&self) -> &str {
        self.class.unwrap_or(&self.raw.class)
    }

    pub fn method_name(&self) -> &str {
        match &self.method {
            MethodResolution::Matched(m) => m,
            MethodResolution::Unmapped | MethodResolution::Ambiguous(_) => &self.raw.method,
        }
    }

    pub fn candidates(&self) -> &[String] {
        match &self.method {
            MethodResolution::Ambiguous(c) => c,
            _ => &[],
        }
    }

    /// `Class.method()` with whatever could be resolved
    pub fn display(&self) -> String {
        format!("{}.{}()", self.class_name(), self.method_name())
    }
}

impl Symbols {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty() && self.method_ids.is_empty()
    }

    pub fn resolve_class(&self, raw: &str) -> Option<&ClassMapping> {
        self.classes.get(raw)
    }

    pub fn resolve_method_id(&self, raw: &str) -> Option<&str> {
        self.method_ids.get(raw).map(String::as_str)
    }

    pub fn class_mut(&mut self, raw: impl Into<String>, actual: impl Into<String>) -> &mut ClassMapping {
        self.classes
            .entry(raw.into())
            .or_insert_with(|| ClassMapping::new(actual))
    }

    pub fn add_method_id(&mut self, raw: impl Into<String>, actual: impl Into<String>) {
        self.method_ids.insert(raw.into(), actual.into());
    }

    /// Resolve a frame. A mapped class resolves its method through the class
    /// table only; otherwise the global method id table is the fallback.
    pub fn resolve_frame<'a>(&'a self, frame: &'a Frame) -> ResolvedName<'a> {
        match self.resolve_class(&frame.class) {
            Some(class) => {
                let method = match class.resolve_method(&frame.method) {
                    [] => MethodResolution::Unmapped,
                    [single] => MethodResolution::Matched(single.clone()),
                    many => MethodResolution::Ambiguous(many.to_vec()),
                };
                ResolvedName {
                    raw: frame,
                    class: Some(class.actual()),
                    method,
                }
            }
            None => ResolvedName {
                raw: frame,
                class: None,
                method: self
                    .resolve_method_id(&frame.method)
                    .map(|m| MethodResolution::Matched(m.to_owned()))
                    .unwrap_or(MethodResolution::Unmapped),
            },
        }
    }
}
