//! Compile-time mirror of the runtime stack of frames.
//!
//! Each [`Scope`] stands for one runtime frame. A binding's `depth` is the
//! number of frame-chain hops from the innermost scope to the scope that
//! owns it; opening a scope pushes every visible binding one hop further
//! away and closing it pulls them back.

use std::collections::HashMap;

use crate::bytecode::compile_error::CompileError;
use crate::bytecode::expr::Lowered;
use crate::lang::node::Param;
use crate::lang::value::Type;

#[derive(Debug, Clone, PartialEq)]
pub struct Signature {
    pub label: String,
    pub params: Vec<Param>,
    pub ret: Type,
}

#[derive(Debug, Clone, PartialEq)]
pub enum BindingKind {
    /// One frame slot. `hint` records how the last value stored here was
    /// classified; it is bookkeeping only and never changes what is emitted.
    Scalar { ty: Type, slot: usize, hint: Lowered },

    /// `len` contiguous slots starting at `base`.
    Array { ty: Type, base: usize, len: usize },

    /// Functions take no slot.
    Function(Signature),
}

impl BindingKind {
    pub fn describe(&self) -> &'static str {
        match self {
            BindingKind::Scalar { .. } => "a variable",
            BindingKind::Array { .. } => "an array",
            BindingKind::Function(_) => "a function",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub kind: BindingKind,
    pub depth: usize,
}

impl Binding {
    #[cfg(test)]
    pub fn hint(&self) -> Option<&Lowered> {
        match &self.kind {
            BindingKind::Scalar { hint, .. } => Some(hint),
            _ => None,
        }
    }
}

#[derive(Debug, Default)]
pub struct Scope {
    bindings: HashMap<String, Binding>,
    /// Next free slot.
    cursor: usize,
    /// Largest number of slots in use at any point, i.e. the frame size.
    high_water: usize,
}

impl Scope {
    pub fn slots(&self) -> usize {
        self.high_water
    }

    fn take(&mut self, n: usize) -> usize {
        let slot = self.cursor;
        self.cursor += n;
        self.high_water = self.high_water.max(self.cursor);
        slot
    }
}

pub struct ScopeStack {
    scopes: Vec<Scope>,
}

impl ScopeStack {
    /// A stack holding only the top-level scope.
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
        }
    }

    pub fn open(&mut self) {
        for scope in &mut self.scopes {
            for binding in scope.bindings.values_mut() {
                binding.depth += 1;
            }
        }
        self.scopes.push(Scope::default());
    }

    /// Discard the innermost scope and hand it back so the caller can read
    /// its frame size.
    pub fn close(&mut self) -> Result<Scope, CompileError> {
        if self.scopes.len() == 1 {
            return Err(CompileError::internal("cannot close the top-level scope"));
        }

        let closed = self
            .scopes
            .pop()
            .ok_or_else(|| CompileError::internal("scope stack is empty"))?;

        for scope in &mut self.scopes {
            for binding in scope.bindings.values_mut() {
                binding.depth -= 1;
            }
        }

        Ok(closed)
    }

    pub fn innermost(&self) -> &Scope {
        // new() seeds one scope and close() never pops it
        &self.scopes[self.scopes.len() - 1]
    }

    fn innermost_mut(&mut self) -> &mut Scope {
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    /// Forget the innermost scope's bindings and start again from slot 0,
    /// keeping its frame size. Used where two branches share one frame.
    pub fn rewind(&mut self) {
        let scope = self.innermost_mut();
        scope.bindings.clear();
        scope.cursor = 0;
    }

    pub fn declare_scalar(&mut self, name: &str, ty: Type, hint: Lowered) -> usize {
        let scope = self.innermost_mut();
        let slot = scope.take(1);
        scope.bindings.insert(
            name.to_string(),
            Binding {
                kind: BindingKind::Scalar { ty, slot, hint },
                depth: 0,
            },
        );
        slot
    }

    pub fn declare_array(&mut self, name: &str, ty: Type, len: usize) -> usize {
        let scope = self.innermost_mut();
        let base = scope.take(len);
        scope.bindings.insert(
            name.to_string(),
            Binding {
                kind: BindingKind::Array { ty, base, len },
                depth: 0,
            },
        );
        base
    }

    /// Returns the binding this one replaced, if the name was already
    /// present in the innermost scope.
    pub fn declare_function(&mut self, name: &str, signature: Signature) -> Option<Binding> {
        self.innermost_mut().bindings.insert(
            name.to_string(),
            Binding {
                kind: BindingKind::Function(signature),
                depth: 0,
            },
        )
    }

    pub fn resolve(&self, name: &str) -> Result<&Binding, CompileError> {
        let innermost = self.scopes.len() - 1;
        for (level, scope) in self.scopes.iter().enumerate().rev() {
            if let Some(binding) = scope.bindings.get(name) {
                debug_assert_eq!(binding.depth, innermost - level);
                return Ok(binding);
            }
        }
        Err(CompileError::unresolved(name))
    }

    pub fn resolve_mut(&mut self, name: &str) -> Result<&mut Binding, CompileError> {
        self.scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.bindings.get_mut(name))
            .ok_or_else(|| CompileError::unresolved(name))
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lang::value::Value;

    fn slot_and_depth(scopes: &ScopeStack, name: &str) -> (usize, usize) {
        match scopes.resolve(name).unwrap() {
            Binding {
                kind: BindingKind::Scalar { slot, .. },
                depth,
            } => (*slot, *depth),
            other => panic!("expected scalar, got {:?}", other),
        }
    }

    #[test]
    fn test_slots_are_assigned_in_order() {
        let mut scopes = ScopeStack::new();
        assert_eq!(scopes.declare_scalar("a", Type::Int, Lowered::Dynamic), 0);
        assert_eq!(scopes.declare_scalar("b", Type::Int, Lowered::Dynamic), 1);
        assert_eq!(scopes.declare_array("c", Type::Int, 4), 2);
        assert_eq!(scopes.declare_scalar("d", Type::Int, Lowered::Dynamic), 6);
        assert_eq!(scopes.innermost().slots(), 7);
    }

    #[test]
    fn test_depth_follows_open_and_close() {
        let mut scopes = ScopeStack::new();
        scopes.declare_scalar("x", Type::Int, Lowered::Dynamic);
        assert_eq!(slot_and_depth(&scopes, "x"), (0, 0));

        scopes.open();
        scopes.declare_scalar("y", Type::Int, Lowered::Dynamic);
        assert_eq!(slot_and_depth(&scopes, "x"), (0, 1));
        assert_eq!(slot_and_depth(&scopes, "y"), (0, 0));

        scopes.open();
        assert_eq!(slot_and_depth(&scopes, "x"), (0, 2));
        assert_eq!(slot_and_depth(&scopes, "y"), (0, 1));

        scopes.close().unwrap();
        assert_eq!(slot_and_depth(&scopes, "x"), (0, 1));

        scopes.close().unwrap();
        assert_eq!(slot_and_depth(&scopes, "x"), (0, 0));
        assert!(scopes.resolve("y").is_err());
    }

    #[test]
    fn test_inner_declaration_shadows_outer() {
        let mut scopes = ScopeStack::new();
        scopes.declare_scalar("x", Type::Int, Lowered::Dynamic);
        scopes.declare_scalar("z", Type::Int, Lowered::Dynamic);
        scopes.open();
        scopes.declare_scalar("x", Type::Float, Lowered::Dynamic);

        assert_eq!(slot_and_depth(&scopes, "x"), (0, 0));
        assert_eq!(slot_and_depth(&scopes, "z"), (1, 1));
    }

    #[test]
    fn test_redeclaration_in_same_scope_overwrites() {
        let mut scopes = ScopeStack::new();
        scopes.declare_scalar("x", Type::Int, Lowered::Static(Value::Int(1)));
        scopes.declare_scalar("x", Type::Int, Lowered::Static(Value::Int(2)));

        assert_eq!(slot_and_depth(&scopes, "x"), (1, 0));
        assert_eq!(
            scopes.resolve("x").unwrap().hint(),
            Some(&Lowered::Static(Value::Int(2)))
        );
    }

    #[test]
    fn test_rewind_keeps_frame_size() {
        let mut scopes = ScopeStack::new();
        scopes.open();
        scopes.declare_scalar("a", Type::Int, Lowered::Dynamic);
        scopes.declare_scalar("b", Type::Int, Lowered::Dynamic);
        scopes.rewind();
        assert_eq!(scopes.declare_scalar("c", Type::Int, Lowered::Dynamic), 0);
        assert!(scopes.resolve("a").is_err());

        let closed = scopes.close().unwrap();
        assert_eq!(closed.slots(), 2);
    }

    #[test]
    fn test_unresolved_and_top_level_close() {
        let mut scopes = ScopeStack::new();
        assert!(matches!(
            scopes.resolve("ghost"),
            Err(CompileError::Unresolved(_))
        ));
        assert!(scopes.close().is_err());
    }

    #[test]
    fn test_function_binding_replaces() {
        let mut scopes = ScopeStack::new();
        let sig = Signature {
            label: "f".to_string(),
            params: Vec::new(),
            ret: Type::Int,
        };
        assert!(scopes.declare_function("f", sig.clone()).is_none());
        assert!(scopes.declare_function("f", sig).is_some());
        assert_eq!(scopes.innermost().slots(), 0);
    }
}
