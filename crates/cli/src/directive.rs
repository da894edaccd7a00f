use anyhow::{bail, Result};

/// Strip a leading `#!<pipeline>` renderer directive, if any.
///
/// Only the bare `kubernetes` pipeline is accepted: this tool performs no
/// templating, so `#!jinja | kubernetes` would render unexpanded templates.
pub fn strip_directive(text: &str) -> Result<&str> {
    let Some(rest) = text.strip_prefix("#!") else {
        return Ok(text);
    };
    let (line, body) = rest.split_once('\n').unwrap_or((rest, ""));
    let stages: Vec<&str> = line.split('|').map(str::trim).collect();
    if stages.as_slice() != ["kubernetes"] {
        bail!("unsupported renderer pipeline `#!{}` (only `#!kubernetes` is handled)", line.trim());
    }
    Ok(body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_directive_passes_through() {
        let text = "apiVersion: v1\n";
        assert_eq!(strip_directive(text).unwrap(), text);
    }

    #[test]
    fn kubernetes_directive_is_stripped() {
        assert_eq!(strip_directive("#!kubernetes\nkind: X\n").unwrap(), "kind: X\n");
        assert_eq!(strip_directive("#! kubernetes \r\nkind: X\n").unwrap(), "kind: X\n");
        assert_eq!(strip_directive("#!kubernetes").unwrap(), "");
    }

    #[test]
    fn templating_pipelines_are_refused() {
        let e = strip_directive("#!jinja | kubernetes\nkind: X\n").unwrap_err().to_string();
        assert!(e.contains("unsupported renderer pipeline"), "e={}", e);
        assert!(strip_directive("#!yaml\n").is_err());
    }
}
