//! Handlers shipped with the renderer.

use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kubestate_core::{HandlerKey, ManifestDocument, RenderError, StepBody};

use crate::registry::{Handler, RegistryBuilder};

pub const SERVICEACCOUNT_PRESENT: &str = "metalk8s_kubernetes.serviceaccount_present";

/// Register every built-in handler. Call once, before the registry is built.
pub fn register_builtins(builder: &mut RegistryBuilder) {
    builder.register(ServiceAccountHandler);
}

/// `v1/ServiceAccount` → `serviceaccount_present(name, namespace)`.
pub struct ServiceAccountHandler;

impl Handler for ServiceAccountHandler {
    fn key(&self) -> HandlerKey {
        HandlerKey::new("v1", "ServiceAccount")
    }

    fn convert(&self, doc: &ManifestDocument) -> Result<StepBody, RenderError> {
        let missing = |field: &str| RenderError::MissingField { doc: doc.index(), field: field.to_string() };
        // Only metadata is read; the rest of the payload is left to the state.
        let raw_meta = doc.value_at("metadata")?.ok_or_else(|| missing("metadata.name"))?;
        let meta: ObjectMeta = serde_json::from_value(raw_meta.clone()).map_err(|e| RenderError::Handler {
            doc: doc.index(),
            key: self.key(),
            reason: format!("invalid metadata: {}", e),
        })?;
        let name = meta.name.ok_or_else(|| missing("metadata.name"))?;
        // ServiceAccounts are namespaced; the state needs the namespace spelled out.
        let namespace = meta
            .namespace
            .filter(|ns| !ns.is_empty())
            .ok_or_else(|| missing("metadata.namespace"))?;
        Ok(StepBody::new(SERVICEACCOUNT_PRESENT).with_arg("name", name).with_arg("namespace", namespace))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(v: serde_json::Value) -> ManifestDocument {
        ManifestDocument::from_value(0, v).unwrap()
    }

    #[test]
    fn service_account_arguments_in_order() {
        let body = ServiceAccountHandler
            .convert(&doc(json!({
                "apiVersion": "v1",
                "kind": "ServiceAccount",
                "metadata": { "name": "foo", "namespace": "bar" },
                "automountServiceAccountToken": false
            })))
            .unwrap();
        assert_eq!(
            body.to_json(),
            json!({ "metalk8s_kubernetes.serviceaccount_present": [ {"name": "foo"}, {"namespace": "bar"} ] })
        );
    }

    #[test]
    fn service_account_requires_namespace() {
        let err = ServiceAccountHandler
            .convert(&doc(json!({
                "apiVersion": "v1",
                "kind": "ServiceAccount",
                "metadata": { "name": "foo" }
            })))
            .unwrap_err();
        assert!(matches!(&err, RenderError::MissingField { field, .. } if field == "metadata.namespace"), "err={}", err);
    }

    #[test]
    fn unread_fields_are_not_validated() {
        let body = ServiceAccountHandler
            .convert(&doc(json!({
                "apiVersion": "v1",
                "kind": "ServiceAccount",
                "metadata": { "name": "foo", "namespace": "bar" },
                "secrets": "not-a-list"
            })))
            .unwrap();
        assert_eq!(body.arg("name"), Some(&json!("foo")));
    }

    #[test]
    fn malformed_metadata_is_a_handler_error() {
        let err = ServiceAccountHandler
            .convert(&doc(json!({
                "apiVersion": "v1",
                "kind": "ServiceAccount",
                "metadata": { "name": "foo", "namespace": "bar", "labels": "not-a-map" }
            })))
            .unwrap_err();
        assert!(matches!(&err, RenderError::Handler { key, .. } if key.kind == "ServiceAccount"), "err={}", err);
    }

    #[test]
    fn builtins_register_cleanly() {
        let mut b = RegistryBuilder::new();
        register_builtins(&mut b);
        let reg = b.build();
        assert!(reg.lookup("v1", "ServiceAccount").is_some());
    }
}
