//! Per-invocation context exposing memory, context, and message (spec §3).
//!
//! A frame owns none of its three slots; it carries borrowed references
//! only, for the duration of one instruction or method evaluation.

use crate::value::Value;

/// The running agent's private, mutable memory map.
pub struct Memory<'a> {
    root: &'a mut Value,
}

impl<'a> Memory<'a> {
    pub fn new(root: &'a mut Value) -> Self {
        debug_assert!(root.is_map(), "memory root must be a map");
        Self { root }
    }

    pub fn root(&self) -> &Value {
        self.root
    }

    pub fn root_mut(&mut self) -> &mut Value {
        self.root
    }
}

/// A frame's view over memory, context, and the current message.
pub struct Frame<'a> {
    memory: Memory<'a>,
    context: &'a Value,
    message: &'a Value,
}

impl<'a> Frame<'a> {
    pub fn new(memory: &'a mut Value, context: &'a Value, message: &'a Value) -> Self {
        Frame {
            memory: Memory::new(memory),
            context,
            message,
        }
    }

    pub fn memory(&self) -> &Value {
        self.memory.root()
    }

    pub fn memory_mut(&mut self) -> &mut Value {
        self.memory.root_mut()
    }

    pub fn context(&self) -> &Value {
        self.context
    }

    pub fn message(&self) -> &Value {
        self.message
    }
}
