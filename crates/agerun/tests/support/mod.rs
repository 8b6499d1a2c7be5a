//! Minimal collaborator doubles shared by the integration test binaries.
//! The crate's own doubles live under `collab::test_doubles`, which is
//! `#[cfg(test)]`-gated and therefore invisible from outside the crate.

use std::collections::BTreeMap;

use agerun::{AgeRunError, AgentRegistry, Frame, Methodology, Value};

#[derive(Default)]
pub struct Registry {
    next_id: i32,
    alive: BTreeMap<i32, Vec<Value>>,
}

impl AgentRegistry for Registry {
    fn enqueue(&mut self, agent_id: i32, value: Value) -> agerun::AgeRunResult<bool> {
        match self.alive.get_mut(&agent_id) {
            Some(inbox) => {
                inbox.push(value);
                Ok(true)
            }
            None => {
                value.destroy()?;
                Ok(false)
            }
        }
    }

    fn spawn(&mut self, _method_name: &str, _version: &str, context: Value) -> agerun::AgeRunResult<i32> {
        self.next_id += 1;
        self.alive.insert(self.next_id, Vec::new());
        context.destroy()?;
        Ok(self.next_id)
    }

    fn kill(&mut self, agent_id: i32) -> agerun::AgeRunResult<bool> {
        match self.alive.remove(&agent_id) {
            Some(inbox) => {
                for value in inbox {
                    value.destroy()?;
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

#[derive(Default)]
pub struct Methods {
    bodies: BTreeMap<(String, String), String>,
}

impl Methodology for Methods {
    fn compile(&mut self, name: &str, body: &str, version: &str) -> agerun::AgeRunResult<bool> {
        self.bodies.insert((name.to_string(), version.to_string()), body.to_string());
        Ok(true)
    }

    fn deprecate(&mut self, name: &str, version: &str) -> agerun::AgeRunResult<bool> {
        Ok(self.bodies.remove(&(name.to_string(), version.to_string())).is_some())
    }
}

/// Parses and runs `source` as a one-shot method against fresh empty
/// context/message values, against `memory`.
pub fn run(source: &str, memory: &mut Value) -> Result<(), (usize, AgeRunError)> {
    let ast = agerun::parse_method(source)?;
    let context = Value::map();
    let message = Value::integer(0);
    let mut frame = Frame::new(memory, &context, &message);
    let mut registry = Registry::default();
    let mut methodology = Methods::default();
    agerun::eval_method(&ast, &mut frame, &mut registry, &mut methodology).map_err(|e| (0, e))
}
