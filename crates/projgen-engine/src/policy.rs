use projgen_domain::{Binding, ContextProperties, DeploymentEnv, OWNER_ROLE, Policy};
use tracing::debug;

/// Identity of the service account that runs deployments for `project_number`.
#[must_use]
pub fn owner_identity(project_number: &str) -> String {
    format!("serviceAccount:{project_number}@cloudservices.gserviceaccount.com")
}

/// Merge the deploying service account into the owner binding of the caller's
/// policy.
///
/// Without an `iam-policy` the result is a single owner binding. Otherwise the
/// caller's bindings are copied in order; the first `roles/owner` binding gains
/// the identity if it lacks it, and a new owner binding is appended when none
/// exists. Later `roles/owner` bindings are left as they are.
#[must_use]
pub fn merge_owner_binding(env: &DeploymentEnv, properties: &ContextProperties) -> Policy {
    let identity = owner_identity(env.project_number.as_str());

    let Some(iam_policy) = &properties.iam_policy else {
        debug!(%identity, "no caller policy, granting owner only");
        return Policy::new(vec![Binding::new(OWNER_ROLE, vec![identity])]);
    };

    let mut bindings = iam_policy.bindings.clone().unwrap_or_default();
    match bindings
        .iter()
        .position(|binding| binding.role == OWNER_ROLE)
    {
        Some(index) if bindings[index].has_member(&identity) => {
            debug!(%identity, "owner binding already grants the deploying identity");
        }
        Some(index) => {
            debug!(%identity, "adding deploying identity to existing owner binding");
            bindings[index].members.push(identity);
        }
        None => {
            debug!(%identity, "appending owner binding to caller policy");
            bindings.push(Binding::new(OWNER_ROLE, vec![identity]));
        }
    }

    Policy::new(bindings)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::expect_used)]

    use projgen_domain::{
        Binding, ContextProperties, DeploymentEnv, IamPolicy, OWNER_ROLE, Policy, ProjectNumber,
    };
    use serde_json::json;

    use super::{merge_owner_binding, owner_identity};

    const IDENTITY: &str = "serviceAccount:123456@cloudservices.gserviceaccount.com";

    fn env() -> DeploymentEnv {
        DeploymentEnv {
            name: "demo".to_string(),
            project_number: ProjectNumber::new("123456"),
        }
    }

    fn properties(iam_policy: Option<IamPolicy>) -> ContextProperties {
        ContextProperties {
            organization_id: "1".into(),
            billing_account_name: "billingAccounts/0".to_string(),
            apis: vec![],
            concurrent_api_activation: false,
            service_accounts: vec![],
            iam_policy,
            bucket_export_settings: None,
        }
    }

    fn with_bindings(bindings: Vec<Binding>) -> ContextProperties {
        properties(Some(IamPolicy {
            bindings: Some(bindings),
        }))
    }

    fn member(value: &str) -> String {
        value.to_string()
    }

    #[test]
    fn identity_is_derived_from_project_number() {
        assert_eq!(owner_identity("123456"), IDENTITY);
    }

    #[test]
    fn missing_policy_yields_single_owner_binding() {
        let merged = merge_owner_binding(&env(), &properties(None));
        assert_eq!(
            merged,
            Policy::new(vec![Binding::new(OWNER_ROLE, vec![member(IDENTITY)])])
        );
    }

    #[test]
    fn policy_without_bindings_key_gets_owner_binding() {
        let merged = merge_owner_binding(&env(), &properties(Some(IamPolicy::default())));
        assert_eq!(merged.bindings.len(), 1);
        assert_eq!(merged.bindings[0].role, OWNER_ROLE);
        assert_eq!(merged.bindings[0].members, vec![member(IDENTITY)]);
    }

    #[test]
    fn non_owner_bindings_survive_and_owner_is_appended() {
        let editor = Binding::new("roles/editor", vec![member("user:a@example.com")]);
        let merged = merge_owner_binding(&env(), &with_bindings(vec![editor.clone()]));

        assert_eq!(merged.bindings.len(), 2);
        assert_eq!(merged.bindings[0], editor);
        assert_eq!(
            merged.bindings[1],
            Binding::new(OWNER_ROLE, vec![member(IDENTITY)])
        );
    }

    #[test]
    fn existing_owner_binding_gains_identity_once() {
        let owner = Binding::new(OWNER_ROLE, vec![member("user:b@example.com")]);
        let first = merge_owner_binding(&env(), &with_bindings(vec![owner]));
        assert_eq!(
            first.bindings,
            vec![Binding::new(
                OWNER_ROLE,
                vec![member("user:b@example.com"), member(IDENTITY)]
            )]
        );

        let second = merge_owner_binding(&env(), &with_bindings(first.bindings.clone()));
        assert_eq!(second, first);
        let occurrences = second.bindings[0]
            .members
            .iter()
            .filter(|candidate| *candidate == IDENTITY)
            .count();
        assert_eq!(occurrences, 1);
    }

    #[test]
    fn only_first_owner_binding_is_merged() {
        let bindings = vec![
            Binding::new(OWNER_ROLE, vec![member("user:b@example.com")]),
            Binding::new(OWNER_ROLE, vec![member("user:c@example.com")]),
        ];
        let merged = merge_owner_binding(&env(), &with_bindings(bindings));

        assert!(merged.bindings[0].has_member(IDENTITY));
        assert_eq!(merged.bindings[1].members, vec![member("user:c@example.com")]);
    }

    #[test]
    fn caller_policy_is_not_modified() {
        let caller = with_bindings(vec![Binding::new(
            OWNER_ROLE,
            vec![member("user:b@example.com")],
        )]);
        let snapshot = caller.clone();
        let _ = merge_owner_binding(&env(), &caller);
        assert_eq!(caller, snapshot);
    }

    #[test]
    fn binding_conditions_are_preserved() {
        let conditional: Binding = serde_json::from_value(json!({
            "role": "roles/viewer",
            "members": ["group:ops@example.com"],
            "condition": {"title": "temporary"}
        }))
        .expect("binding");
        let merged = merge_owner_binding(&env(), &with_bindings(vec![conditional.clone()]));
        assert_eq!(merged.bindings[0], conditional);
    }

    #[test]
    fn bindings_without_members_pass_through_and_owner_gains_identity() {
        let viewer: Binding =
            serde_json::from_value(json!({"role": "roles/viewer"})).expect("viewer");
        let owner: Binding =
            serde_json::from_value(json!({"role": OWNER_ROLE})).expect("owner");
        let merged = merge_owner_binding(&env(), &with_bindings(vec![viewer.clone(), owner]));

        assert_eq!(merged.bindings[0], viewer);
        assert_eq!(merged.bindings[1].members, vec![member(IDENTITY)]);
        assert_eq!(
            serde_json::to_value(&merged).expect("encode")["bindings"][0],
            json!({"role": "roles/viewer"})
        );
    }
}
