use serde_json::Value as Json;

const DEFAULT_MAX_BYTES: usize = 1_000_000; // 1 MiB
const DEFAULT_MAX_NODES: usize = 100_000;

/// Input size guards. Off unless a caller opts in with [`RenderLimits::from_env`] or explicit values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenderLimits {
    /// Maximum size of the whole manifest stream, in bytes.
    pub max_bytes: usize,
    /// Maximum number of value nodes in a single document.
    pub max_nodes: usize,
}

impl Default for RenderLimits {
    fn default() -> Self {
        Self { max_bytes: DEFAULT_MAX_BYTES, max_nodes: DEFAULT_MAX_NODES }
    }
}

impl RenderLimits {
    /// Read `KUBESTATE_MAX_YAML_BYTES` / `KUBESTATE_MAX_YAML_NODES`, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            max_bytes: env_usize("KUBESTATE_MAX_YAML_BYTES").unwrap_or(DEFAULT_MAX_BYTES),
            max_nodes: env_usize("KUBESTATE_MAX_YAML_NODES").unwrap_or(DEFAULT_MAX_NODES),
        }
    }

    pub fn unlimited() -> Self {
        Self { max_bytes: usize::MAX, max_nodes: usize::MAX }
    }
}

fn env_usize(var: &str) -> Option<usize> {
    std::env::var(var).ok().and_then(|s| s.trim().parse::<usize>().ok())
}

/// True when `v` holds more than `max` nodes. Stops walking one node past the budget.
pub(crate) fn node_budget_exceeded(v: &Json, max: usize) -> bool {
    fn walk(v: &Json, seen: &mut usize, stop: usize) {
        if *seen >= stop { return; }
        *seen += 1;
        let children: Box<dyn Iterator<Item = &Json>> = match v {
            Json::Object(map) => Box::new(map.values()),
            Json::Array(arr) => Box::new(arr.iter()),
            _ => return,
        };
        for child in children {
            if *seen >= stop { break; }
            walk(child, seen, stop);
        }
    }
    let mut seen = 0usize;
    walk(v, &mut seen, max.saturating_add(1));
    seen > max
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_budget_counts_nested_values() {
        let v = serde_json::json!({ "a": [1, 2, 3], "b": { "c": true } });
        // root, a, 1, 2, 3, b, c
        assert!(!node_budget_exceeded(&v, 8));
        assert!(!node_budget_exceeded(&v, 7));
        assert!(node_budget_exceeded(&v, 6));
        assert!(node_budget_exceeded(&v, 2));
        assert!(!node_budget_exceeded(&v, usize::MAX));
    }

    #[test]
    fn defaults_are_bounded() {
        let l = RenderLimits::default();
        assert_eq!(l.max_bytes, 1_000_000);
        assert_eq!(l.max_nodes, 100_000);
        assert!(RenderLimits::unlimited().max_bytes > l.max_bytes);
    }
}
