//! Account resolver system subjects

/// Wildcard subject the cluster sends account claims lookups to
pub const LOOKUP_SUBJECT: &str = "$SYS.REQ.ACCOUNT.*.CLAIMS.LOOKUP";

/// Subject for account claims update notifications
pub const UPDATE_SUBJECT: &str = "$SYS.REQ.CLAIMS.UPDATE";

const LOOKUP_PREFIX: &str = "$SYS.REQ.ACCOUNT.";
const LOOKUP_SUFFIX: &str = ".CLAIMS.LOOKUP";

/// Extract the account id from a lookup subject
///
/// Returns `None` unless the subject is exactly prefix, one non-empty
/// token, suffix.
pub fn account_id_from_subject(subject: &str) -> Option<&str> {
    let id = subject
        .strip_prefix(LOOKUP_PREFIX)?
        .strip_suffix(LOOKUP_SUFFIX)?;

    if id.is_empty() || id.contains('.') {
        return None;
    }
    Some(id)
}

/// Lookup subject for a specific account
pub fn lookup_subject(account_id: &str) -> String {
    format!("{}{}{}", LOOKUP_PREFIX, account_id, LOOKUP_SUFFIX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extracts_account_id() {
        assert_eq!(
            account_id_from_subject("$SYS.REQ.ACCOUNT.ABC123.CLAIMS.LOOKUP"),
            Some("ABC123")
        );
        assert_eq!(account_id_from_subject(&lookup_subject("AD2VB6")), Some("AD2VB6"));
    }

    #[test]
    fn test_rejects_malformed_subjects() {
        assert_eq!(account_id_from_subject("$SYS.REQ.ACCOUNT..CLAIMS.LOOKUP"), None);
        assert_eq!(account_id_from_subject("$SYS.REQ.ACCOUNT.A.B.CLAIMS.LOOKUP"), None);
        assert_eq!(account_id_from_subject("$SYS.REQ.CLAIMS.UPDATE"), None);
        assert_eq!(account_id_from_subject("$SYS.REQ.ACCOUNT.ABC123.CLAIMS"), None);
    }
}
