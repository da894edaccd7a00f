/// Human-readable step label, also used by the state engine to deduplicate steps.
///
/// `Apply {apiVersion}/{kind} '{namespace}/{name}'`, or without the
/// namespace part for cluster-scoped objects.
pub fn step_label(api_version: &str, kind: &str, name: &str, namespace: Option<&str>) -> String {
    match namespace {
        Some(ns) => format!("Apply {}/{} '{}/{}'", api_version, kind, ns, name),
        None => format!("Apply {}/{} '{}'", api_version, kind, name),
    }
}
