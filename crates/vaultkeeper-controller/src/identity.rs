//! Account display names
//!
//! Precedence when an account gets a name: the persisted nickname for that
//! address, then a caller-supplied name, then `"Account n"` where `n` is one
//! more than the number of identities already held.

use vaultkeeper_types::{Address, IdentityMap, NicknameMap};

/// Next free `"Account n"` label
pub fn default_account_name(identities: &IdentityMap) -> String {
    let mut n = identities.len() + 1;
    loop {
        let name = format!("Account {}", n);
        if !identities.values().any(|identity| identity.name == name) {
            return name;
        }
        n += 1;
    }
}

/// Pick the display name for a newly surfaced account
pub fn resolve_account_name(
    address: &Address,
    nicknames: &NicknameMap,
    supplied: Option<&str>,
    identities: &IdentityMap,
) -> String {
    if let Some(nickname) = nicknames.get(address) {
        return nickname.clone();
    }
    match supplied.map(str::trim).filter(|name| !name.is_empty()) {
        Some(name) => name.to_string(),
        None => default_account_name(identities),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vaultkeeper_types::Identity;

    fn addr(byte: &str) -> Address {
        Address::parse(&byte.repeat(20)).unwrap()
    }

    #[test]
    fn test_default_name_counts_identities() {
        let mut identities = IdentityMap::new();
        assert_eq!(default_account_name(&identities), "Account 1");

        identities.insert(addr("aa"), Identity::new(addr("aa"), "Account 1"));
        assert_eq!(default_account_name(&identities), "Account 2");
    }

    #[test]
    fn test_default_name_skips_taken_labels() {
        let mut identities = IdentityMap::new();
        identities.insert(addr("aa"), Identity::new(addr("aa"), "Account 2"));
        assert_eq!(default_account_name(&identities), "Account 3");
    }

    #[test]
    fn test_nickname_wins_over_supplied_name() {
        let mut nicknames = NicknameMap::new();
        nicknames.insert(addr("aa"), "Cold storage".to_string());

        let name = resolve_account_name(&addr("aa"), &nicknames, Some("Hot"), &IdentityMap::new());
        assert_eq!(name, "Cold storage");

        let name = resolve_account_name(&addr("bb"), &nicknames, Some("Hot"), &IdentityMap::new());
        assert_eq!(name, "Hot");

        let name = resolve_account_name(&addr("bb"), &nicknames, Some("  "), &IdentityMap::new());
        assert_eq!(name, "Account 1");
    }
}
