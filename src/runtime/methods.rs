//! Loaded classes, their methods, and the in-memory method registry.

use crate::core::{RestoreError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};

/// Fully qualified method signature, rendered as `class.method(descriptor)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MethodSignature {
    pub class_name: String,
    pub method_name: String,
    pub descriptor: String,
}

impl MethodSignature {
    pub fn new(
        class_name: impl Into<String>,
        method_name: impl Into<String>,
        descriptor: impl Into<String>,
    ) -> Self {
        Self {
            class_name: class_name.into(),
            method_name: method_name.into(),
            descriptor: descriptor.into(),
        }
    }

    /// Byte length of the rendered signature.
    pub fn encoded_len(&self) -> usize {
        self.class_name.len() + 1 + self.method_name.len() + self.descriptor.len()
    }

    /// Renders the signature into `buf` without allocating.
    ///
    /// `buf` must hold at least [`encoded_len`](Self::encoded_len) bytes.
    pub fn encode_into<'b>(&self, buf: &'b mut [u8]) -> Result<&'b str> {
        let len = self.encoded_len();
        if buf.len() < len {
            return Err(RestoreError::Allocation { requested: len });
        }

        let mut offset = 0;
        for part in [
            self.class_name.as_bytes(),
            ".".as_bytes(),
            self.method_name.as_bytes(),
            self.descriptor.as_bytes(),
        ] {
            buf[offset..offset + part.len()].copy_from_slice(part);
            offset += part.len();
        }

        // Built only from `&str` pieces, so always valid UTF-8.
        std::str::from_utf8(&buf[..len])
            .map_err(|e| RestoreError::Collaborator(format!("signature encoding: {}", e)))
    }
}

impl fmt::Display for MethodSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}{}", self.class_name, self.method_name, self.descriptor)
    }
}

/// A method together with its compiled-body state.
#[derive(Debug)]
pub struct CompiledMethodRecord {
    pub signature: MethodSignature,
    compiled: AtomicBool,
    /// Opaque handle to the compiled body; zero when none.
    body: AtomicUsize,
}

impl CompiledMethodRecord {
    pub fn interpreted(signature: MethodSignature) -> Self {
        Self {
            signature,
            compiled: AtomicBool::new(false),
            body: AtomicUsize::new(0),
        }
    }

    pub fn compiled(signature: MethodSignature, body: usize) -> Self {
        Self {
            signature,
            compiled: AtomicBool::new(true),
            body: AtomicUsize::new(body),
        }
    }

    pub fn is_compiled(&self) -> bool {
        self.compiled.load(Ordering::Acquire)
    }

    pub fn body(&self) -> usize {
        self.body.load(Ordering::Acquire)
    }

    /// Marks the method as needing recompilation.
    ///
    /// Returns `true` only for the call that actually performed the
    /// transition; concurrent or repeated calls return `false`.
    pub fn invalidate(&self) -> bool {
        if self
            .compiled
            .compare_exchange(true, false, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
        {
            self.body.store(0, Ordering::Release);
            true
        } else {
            false
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadedClass {
    pub name: String,
    pub methods: Vec<Arc<CompiledMethodRecord>>,
}

impl LoadedClass {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            methods: Vec::new(),
        }
    }

    pub fn with_method(mut self, method: CompiledMethodRecord) -> Self {
        self.methods.push(Arc::new(method));
        self
    }
}

/// Enumeration of loaded classes and compiled-body invalidation.
pub trait MethodTable: Send + Sync {
    /// Visits every loaded class. An error from `visit` stops the walk.
    fn walk_classes(&self, visit: &mut dyn FnMut(&LoadedClass) -> Result<()>) -> Result<()>;

    /// Queues `method` for recompilation. Returns `true` if this call
    /// performed the invalidation.
    fn invalidate_method_body(&self, method: &CompiledMethodRecord) -> bool;
}

/// Loaded-class table kept in memory.
#[derive(Debug, Default)]
pub struct MethodRegistry {
    classes: RwLock<Vec<LoadedClass>>,
}

impl MethodRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, class: LoadedClass) -> Result<()> {
        self.classes.write()?.push(class);
        Ok(())
    }

    pub fn class_count(&self) -> Result<usize> {
        Ok(self.classes.read()?.len())
    }

    pub fn compiled_count(&self) -> Result<usize> {
        Ok(self
            .classes
            .read()?
            .iter()
            .flat_map(|class| class.methods.iter())
            .filter(|method| method.is_compiled())
            .count())
    }

    pub fn find(&self, signature: &MethodSignature) -> Result<Option<Arc<CompiledMethodRecord>>> {
        Ok(self
            .classes
            .read()?
            .iter()
            .flat_map(|class| class.methods.iter())
            .find(|method| &method.signature == signature)
            .cloned())
    }
}

impl MethodTable for MethodRegistry {
    fn walk_classes(&self, visit: &mut dyn FnMut(&LoadedClass) -> Result<()>) -> Result<()> {
        let classes = self.classes.read()?;
        for class in classes.iter() {
            visit(class)?;
        }
        Ok(())
    }

    fn invalidate_method_body(&self, method: &CompiledMethodRecord) -> bool {
        method.invalidate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signature() -> MethodSignature {
        MethodSignature::new("java/lang/String", "hashCode", "()I")
    }

    #[test]
    fn test_signature_rendering() {
        let sig = signature();
        assert_eq!(sig.to_string(), "java/lang/String.hashCode()I");
        assert_eq!(sig.encoded_len(), sig.to_string().len());

        let mut buf = [0u8; 64];
        assert_eq!(sig.encode_into(&mut buf).unwrap(), "java/lang/String.hashCode()I");
    }

    #[test]
    fn test_encode_into_short_buffer_fails() {
        let mut buf = [0u8; 4];
        assert!(matches!(
            signature().encode_into(&mut buf),
            Err(RestoreError::Allocation { .. })
        ));
    }

    #[test]
    fn test_invalidate_is_single_shot() {
        let record = CompiledMethodRecord::compiled(signature(), 0xdead);
        assert!(record.is_compiled());
        assert!(record.invalidate());
        assert!(!record.is_compiled());
        assert_eq!(record.body(), 0);
        assert!(!record.invalidate());

        let interpreted = CompiledMethodRecord::interpreted(signature());
        assert!(!interpreted.invalidate());
    }

    #[test]
    fn test_registry_walk_and_counts() {
        let registry = MethodRegistry::new();
        registry
            .register(
                LoadedClass::new("A")
                    .with_method(CompiledMethodRecord::compiled(MethodSignature::new("A", "f", "()V"), 1))
                    .with_method(CompiledMethodRecord::interpreted(MethodSignature::new("A", "g", "()V"))),
            )
            .unwrap();
        registry.register(LoadedClass::new("B")).unwrap();

        assert_eq!(registry.class_count().unwrap(), 2);
        assert_eq!(registry.compiled_count().unwrap(), 1);

        let mut names = Vec::new();
        registry
            .walk_classes(&mut |class: &LoadedClass| {
                names.push(class.name.clone());
                Ok(())
            })
            .unwrap();
        assert_eq!(names, vec!["A", "B"]);

        let found = registry.find(&MethodSignature::new("A", "f", "()V")).unwrap();
        assert!(found.is_some_and(|m| registry.invalidate_method_body(&m)));
        assert_eq!(registry.compiled_count().unwrap(), 0);
    }

    #[test]
    fn test_walk_stops_on_error() {
        let registry = MethodRegistry::new();
        registry.register(LoadedClass::new("A")).unwrap();
        registry.register(LoadedClass::new("B")).unwrap();

        let mut visited = 0;
        let result = registry.walk_classes(&mut |_: &LoadedClass| {
            visited += 1;
            Err(RestoreError::Collaborator("stop".into()))
        });
        assert!(result.is_err());
        assert_eq!(visited, 1);
    }
}
