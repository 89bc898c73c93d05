//! Property-based tests for connection resolution and history paging.
//!
//! These tests use proptest to verify invariants hold across
//! randomly generated inputs.

use proptest::prelude::*;

use lakehook::core::connection::{
    normalize_host, resolve_credentials, ConfigurationError, Connection, ConnectionExtra,
};
use lakehook::store::mock::MockStore;
use lakehook::store::{CommitRequest, VersionedStore};

/// Credential-ish strings, including empty and blank values.
fn credential() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some(String::new())),
        Just(Some("  ".to_string())),
        "[A-Za-z0-9/+]{1,24}".prop_map(Some),
    ]
}

fn conn_type() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some("http".to_string())),
        Just(Some("lakefs".to_string())),
        Just(Some("s3".to_string())),
        "[a-z]{1,8}".prop_map(Some),
    ]
}

fn connection() -> impl Strategy<Value = Connection> {
    (
        credential(),
        credential(),
        credential(),
        credential(),
        conn_type(),
    )
        .prop_map(|(login, password, key, secret, conn_type)| Connection {
            host: Some("lakefs.example:8000".to_string()),
            login,
            password,
            conn_type,
            extra: ConnectionExtra {
                access_key_id: key,
                secret_access_key: secret,
            },
        })
}

fn filled(value: &Option<String>) -> bool {
    value.as_deref().map_or(false, |v| !v.trim().is_empty())
}

proptest! {
    /// Extra fields win only for auth-bearing types with both fields set.
    /// A missing type counts as lakefs.
    #[test]
    fn extra_credentials_priority(conn in connection()) {
        let auth_bearing = matches!(conn.conn_type.as_deref(), None | Some("http") | Some("lakefs"));
        let use_extra = auth_bearing && filled(&conn.extra.access_key_id) && filled(&conn.extra.secret_access_key);

        let (key, secret) = resolve_credentials(&conn);
        if use_extra {
            prop_assert_eq!(key, conn.extra.access_key_id.as_deref());
            prop_assert_eq!(secret, conn.extra.secret_access_key.as_deref());
        } else {
            prop_assert_eq!(key, conn.login.as_deref());
            prop_assert_eq!(secret, conn.password.as_deref());
        }
    }

    /// Resolution reports the first missing field: access key, then secret.
    #[test]
    fn resolve_reports_first_missing_field(conn in connection()) {
        let (key, secret) = resolve_credentials(&conn);
        let key_ok = key.map_or(false, |k| !k.trim().is_empty());
        let secret_ok = secret.map_or(false, |s| !s.trim().is_empty());

        match conn.resolve() {
            Ok(config) => {
                prop_assert!(key_ok && secret_ok);
                prop_assert_eq!(config.host(), "http://lakefs.example:8000");
            }
            Err(ConfigurationError::MissingAccessKey) => prop_assert!(!key_ok),
            Err(ConfigurationError::MissingSecretKey) => prop_assert!(key_ok && !secret_ok),
            Err(other) => prop_assert!(false, "unexpected error: {}", other),
        }
    }

    /// Normalized hosts always carry a scheme and no trailing slash.
    #[test]
    fn normalize_host_is_idempotent(
        scheme in prop_oneof![Just(""), Just("http://"), Just("https://")],
        host in "[a-z][a-z0-9.-]{0,20}(:[0-9]{1,5})?",
        slashes in 0usize..3,
    ) {
        let raw = format!("{}{}{}", scheme, host, "/".repeat(slashes));
        let once = normalize_host(&raw);
        prop_assert!(once.contains("://"));
        prop_assert!(!once.ends_with('/'));
        prop_assert_eq!(normalize_host(&once), once.clone());
    }

    /// Paging yields every commit exactly once, newest first, whatever the page size.
    #[test]
    fn log_visits_each_commit_once(commits in 0usize..12, page_size in 0usize..6) {
        let store = MockStore::new().with_repo("lake", "main");
        tokio_test::block_on(async {
            for i in 0..commits {
                store
                    .commit("lake", "main", CommitRequest::new(format!("c{}", i)))
                    .await
                    .unwrap();
            }
        });

        let history = tokio_test::block_on(
            lakehook::store::CommitLog::new(&store, "lake", "main", page_size).try_collect(),
        )
        .unwrap();

        // Plus the repository's initial commit
        prop_assert_eq!(history.len(), commits + 1);
        for pair in history.windows(2) {
            prop_assert_eq!(&pair[0].parents, &vec![pair[1].id.clone()]);
        }
    }
}
