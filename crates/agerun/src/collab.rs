//! External collaborator contracts (spec §6): the agent registry and the
//! methodology live outside the language core. The core only calls through
//! these traits; it never refers to a process-wide singleton (spec §9).

use crate::error::AgeRunResult;
use crate::value::Value;

/// Invoked by the `send`, `create`, `destroy`, and `exit` instruction
/// evaluators. Ownership of `value`/`context` passes into the registry on
/// success; on failure the caller still owns them and must dispose of them.
pub trait AgentRegistry {
    /// Enqueue `value` for delivery to `agent_id`. `false` for an unknown id.
    fn enqueue(&mut self, agent_id: i32, value: Value) -> AgeRunResult<bool>;

    /// Spawn a new agent running `method_name`/`version` with the given
    /// context, returning its fresh agent id.
    fn spawn(&mut self, method_name: &str, version: &str, context: Value) -> AgeRunResult<i32>;

    /// Terminate `agent_id`. `false` for an unknown id.
    fn kill(&mut self, agent_id: i32) -> AgeRunResult<bool>;
}

/// Invoked by `compile` and `deprecate`.
pub trait Methodology {
    fn compile(&mut self, name: &str, body: &str, version: &str) -> AgeRunResult<bool>;
    fn deprecate(&mut self, name: &str, version: &str) -> AgeRunResult<bool>;
}

#[cfg(test)]
pub mod test_doubles {
    use super::*;
    use std::collections::BTreeMap;

    /// A minimal in-memory agent registry for evaluator tests. Spawns get
    /// sequential ids starting at 1; enqueue/kill report `false` for ids
    /// the registry never spawned or has already killed.
    #[derive(Default)]
    pub struct InMemoryAgentRegistry {
        next_id: i32,
        alive: BTreeMap<i32, Vec<Value>>,
    }

    impl InMemoryAgentRegistry {
        pub fn new() -> Self {
            Self {
                next_id: 1,
                alive: BTreeMap::new(),
            }
        }

        pub fn inbox(&self, agent_id: i32) -> Option<&[Value]> {
            self.alive.get(&agent_id).map(Vec::as_slice)
        }
    }

    impl AgentRegistry for InMemoryAgentRegistry {
        fn enqueue(&mut self, agent_id: i32, value: Value) -> AgeRunResult<bool> {
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

        fn spawn(&mut self, _method_name: &str, _version: &str, context: Value) -> AgeRunResult<i32> {
            let id = self.next_id;
            self.next_id += 1;
            self.alive.insert(id, Vec::new());
            context.destroy()?;
            Ok(id)
        }

        fn kill(&mut self, agent_id: i32) -> AgeRunResult<bool> {
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

    /// A minimal in-memory methodology: `compile` stores the source keyed by
    /// `name/version`, `deprecate` removes it. Neither actually re-parses the
    /// method body; that belongs to the method parser.
    #[derive(Default)]
    pub struct InMemoryMethodology {
        methods: BTreeMap<(String, String), String>,
    }

    impl InMemoryMethodology {
        pub fn new() -> Self {
            Self {
                methods: BTreeMap::new(),
            }
        }

        pub fn source(&self, name: &str, version: &str) -> Option<&str> {
            self.methods
                .get(&(name.to_string(), version.to_string()))
                .map(String::as_str)
        }
    }

    impl Methodology for InMemoryMethodology {
        fn compile(&mut self, name: &str, body: &str, version: &str) -> AgeRunResult<bool> {
            self.methods
                .insert((name.to_string(), version.to_string()), body.to_string());
            Ok(true)
        }

        fn deprecate(&mut self, name: &str, version: &str) -> AgeRunResult<bool> {
            Ok(self
                .methods
                .remove(&(name.to_string(), version.to_string()))
                .is_some())
        }
    }
}
