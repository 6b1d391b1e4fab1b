//! Owner email normalization strategies.
//!
//! Some tenants publish owner mailboxes as `<prefix>_<address>`, where only
//! the part after the first underscore is deliverable. That convention is
//! organization specific, so it is a pluggable strategy rather than a rule.

/// Turns a raw owner email into a deliverable address.
pub trait OwnerEmailNormalizer: Send + Sync {
    /// Returns the deliverable address, or `None` when nothing deliverable remains.
    fn normalize(&self, raw: &str) -> Option<String>;
}

/// Keeps the address as published, trimming surrounding whitespace.
#[derive(Debug, Clone, Copy, Default)]
pub struct VerbatimEmailNormalizer;

impl OwnerEmailNormalizer for VerbatimEmailNormalizer {
    fn normalize(&self, raw: &str) -> Option<String> {
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| trimmed.to_owned())
    }
}

/// Strips a delegated-mailbox prefix up to the first underscore of the local part.
///
/// `svc_owner1@example.com` becomes `owner1@example.com`. Underscores that
/// only appear in the domain are left alone, and a prefix that would leave an
/// empty local part is kept verbatim.
#[derive(Debug, Clone, Copy, Default)]
pub struct MailboxPrefixNormalizer;

impl OwnerEmailNormalizer for MailboxPrefixNormalizer {
    fn normalize(&self, raw: &str) -> Option<String> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        let local_end = trimmed.find('@').unwrap_or(trimmed.len());
        match trimmed[..local_end].find('_') {
            Some(index) if index + 1 < local_end => Some(trimmed[index + 1..].to_owned()),
            _ => Some(trimmed.to_owned()),
        }
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::{MailboxPrefixNormalizer, OwnerEmailNormalizer, VerbatimEmailNormalizer};

    #[test]
    fn strips_mailbox_prefix() {
        assert_eq!(
            MailboxPrefixNormalizer.normalize("svc_owner1@example.com"),
            Some("owner1@example.com".to_owned())
        );
    }

    #[test]
    fn plain_address_is_unchanged() {
        assert_eq!(
            MailboxPrefixNormalizer.normalize("plain@example.com"),
            Some("plain@example.com".to_owned())
        );
    }

    #[test]
    fn only_first_underscore_is_a_prefix() {
        assert_eq!(
            MailboxPrefixNormalizer.normalize("adm_first_last@example.com"),
            Some("first_last@example.com".to_owned())
        );
    }

    #[test]
    fn domain_underscores_are_not_prefixes() {
        assert_eq!(
            MailboxPrefixNormalizer.normalize("owner@my_domain.example"),
            Some("owner@my_domain.example".to_owned())
        );
    }

    #[test]
    fn trailing_underscore_keeps_address() {
        assert_eq!(
            MailboxPrefixNormalizer.normalize("svc_@example.com"),
            Some("svc_@example.com".to_owned())
        );
    }

    #[test]
    fn blank_values_normalize_to_none() {
        assert_eq!(MailboxPrefixNormalizer.normalize("   "), None);
        assert_eq!(VerbatimEmailNormalizer.normalize(""), None);
    }

    #[test]
    fn verbatim_keeps_prefix() {
        assert_eq!(
            VerbatimEmailNormalizer.normalize(" svc_owner1@example.com "),
            Some("svc_owner1@example.com".to_owned())
        );
    }

    proptest! {
        #[test]
        fn prefixed_addresses_lose_exactly_the_prefix(
            prefix in "[a-z0-9]{1,8}",
            local in "[a-z0-9.]{1,12}",
            domain in "[a-z]{1,10}\\.[a-z]{2,4}",
        ) {
            let raw = format!("{prefix}_{local}@{domain}");
            prop_assert_eq!(
                MailboxPrefixNormalizer.normalize(raw.as_str()),
                Some(format!("{local}@{domain}"))
            );
        }

        #[test]
        fn addresses_without_underscores_are_fixed_points(
            local in "[a-z0-9.]{1,12}",
            domain in "[a-z]{1,10}\\.[a-z]{2,4}",
        ) {
            let raw = format!("{local}@{domain}");
            prop_assert_eq!(MailboxPrefixNormalizer.normalize(raw.as_str()), Some(raw.clone()));
        }
    }
}
