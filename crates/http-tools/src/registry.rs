//! In-memory tool registry.
//!
//! Readers take a cheap snapshot (`Arc<ToolSet>`) and never hold the lock across I/O. Writers swap
//! the whole set at once, so a reader sees either the old tools or the new ones, never a mix.

use crate::tool::ToolDefinition;
use parking_lot::RwLock;
use rmcp::model::Tool;
use std::collections::HashMap;
use std::sync::Arc;

/// One immutable compiled tool set.
#[derive(Debug, Default)]
pub struct ToolSet {
    tools: Vec<Arc<ToolDefinition>>,
    index: HashMap<String, usize>,
}

impl ToolSet {
    /// Build a set from compiled tools, keeping their order.
    ///
    /// A later tool with the same name replaces an earlier one.
    #[must_use]
    pub fn new(tools: Vec<ToolDefinition>) -> Self {
        let mut out: Vec<Arc<ToolDefinition>> = Vec::with_capacity(tools.len());
        let mut index: HashMap<String, usize> = HashMap::with_capacity(tools.len());
        for tool in tools {
            if let Some(&slot) = index.get(&tool.name) {
                out[slot] = Arc::new(tool);
            } else {
                index.insert(tool.name.clone(), out.len());
                out.push(Arc::new(tool));
            }
        }
        Self { tools: out, index }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<ToolDefinition>> {
        self.index.get(name).map(|&i| &self.tools[i])
    }

    #[must_use]
    pub fn tools(&self) -> &[Arc<ToolDefinition>] {
        &self.tools
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

/// Shared, injectable name → tool store.
#[derive(Debug, Default)]
pub struct ToolRegistry {
    current: RwLock<Arc<ToolSet>>,
}

impl ToolRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace every registered tool with `tools`.
    pub fn replace_all(&self, tools: Vec<ToolDefinition>) {
        let next = Arc::new(ToolSet::new(tools));
        *self.current.write() = next;
    }

    /// The current tool set. Later replacements do not affect the returned snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Arc<ToolSet> {
        Arc::clone(&*self.current.read())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<ToolDefinition>> {
        self.current.read().get(name).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.current.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.current.read().is_empty()
    }

    /// Registered tools as MCP `Tool`s, in compilation order.
    #[must_use]
    pub fn list_tools(&self) -> Vec<Tool> {
        self.snapshot()
            .tools()
            .iter()
            .map(|t| t.to_mcp_tool())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tool::{InputSchema, ToolMeta};
    use reqwest::Method;

    fn tool(name: &str, path: &str) -> ToolDefinition {
        ToolDefinition {
            name: name.to_string(),
            title: None,
            description: None,
            input_schema: InputSchema::default(),
            output_schema: None,
            meta: ToolMeta::new(Method::GET, path),
        }
    }

    #[test]
    fn replace_all_swaps_the_whole_set() {
        let registry = ToolRegistry::new();
        registry.replace_all(vec![tool("a", "/a"), tool("b", "/b")]);
        let before = registry.snapshot();

        registry.replace_all(vec![tool("c", "/c")]);

        assert_eq!(before.len(), 2);
        assert!(before.get("a").is_some());
        assert_eq!(registry.len(), 1);
        assert!(registry.get("a").is_none());
        assert!(registry.get("c").is_some());
    }

    #[test]
    fn later_duplicate_overwrites_in_place() {
        let set = ToolSet::new(vec![tool("a", "/first"), tool("b", "/b"), tool("a", "/second")]);
        assert_eq!(set.len(), 2);
        assert_eq!(set.tools()[0].meta.path_template, "/second");
        assert_eq!(set.tools()[1].name, "b");
    }

    #[test]
    fn list_tools_keeps_compilation_order() {
        let registry = ToolRegistry::new();
        registry.replace_all(vec![tool("zeta", "/z"), tool("alpha", "/a")]);
        let names: Vec<String> = registry
            .list_tools()
            .into_iter()
            .map(|t| t.name.to_string())
            .collect();
        assert_eq!(names, vec!["zeta", "alpha"]);
    }
}
