//! Azure naming rules
//!
//! Checked locally on literal names so that a malformed name fails the
//! declaration instead of the deployment.

use stackflow_core::NameRule;

pub const RESOURCE_GROUP: NameRule = NameRule {
    resource_type: "resource group",
    min_len: 1,
    max_len: 90,
    pattern: r"^[A-Za-z0-9_\-\.\(\)]*[A-Za-z0-9_\-\(\)]$",
    description: "letters, digits, '-', '_', '.', '(' and ')', not ending in '.'",
};

pub const KEY_VAULT: NameRule = NameRule {
    resource_type: "key vault",
    min_len: 3,
    max_len: 24,
    pattern: r"^[A-Za-z](?:[A-Za-z0-9]|-[A-Za-z0-9])*$",
    description: "letters, digits and single hyphens, starting with a letter and not ending in '-'",
};

pub const COSMOS_ACCOUNT: NameRule = NameRule {
    resource_type: "cosmos db account",
    min_len: 3,
    max_len: 44,
    pattern: r"^[a-z0-9](?:[a-z0-9-]*[a-z0-9])?$",
    description: "lowercase letters, digits and hyphens, not starting or ending in '-'",
};

pub const MANAGED_CLUSTER: NameRule = NameRule {
    resource_type: "managed cluster",
    min_len: 1,
    max_len: 63,
    pattern: r"^[A-Za-z0-9](?:[A-Za-z0-9_-]*[A-Za-z0-9])?$",
    description: "letters, digits, '-' and '_', starting and ending with a letter or digit",
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resource_group() {
        assert!(RESOURCE_GROUP.check("rg-aks-dev").is_ok());
        assert!(RESOURCE_GROUP.check("rg_(prod)").is_ok());
        assert!(RESOURCE_GROUP.check("rg.").is_err());
        assert!(RESOURCE_GROUP.check("").is_err());
        assert!(RESOURCE_GROUP.check(&"a".repeat(91)).is_err());
    }

    #[test]
    fn test_key_vault() {
        assert!(KEY_VAULT.check("kv-dev").is_ok());
        assert!(KEY_VAULT.check("kv").is_err());
        assert!(KEY_VAULT.check("kv--dev").is_err());
        assert!(KEY_VAULT.check("kv-dev-").is_err());
        assert!(KEY_VAULT.check("1kv").is_err());
        assert!(KEY_VAULT.check("kv-my_stack").is_err());
        assert!(KEY_VAULT.check(&format!("kv-{}", "a".repeat(22))).is_err());
    }

    #[test]
    fn test_cosmos_account() {
        assert!(COSMOS_ACCOUNT.check("cosmos-dev").is_ok());
        assert!(COSMOS_ACCOUNT.check("cosmos-Dev").is_err());
        assert!(COSMOS_ACCOUNT.check("-cosmos").is_err());
    }

    #[test]
    fn test_managed_cluster() {
        assert!(MANAGED_CLUSTER.check("aks-dev").is_ok());
        assert!(MANAGED_CLUSTER.check("aks-").is_err());
    }
}
