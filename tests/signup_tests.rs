mod common;

use gatehouse::GatehouseError;
use gatehouse::service::registrar::{EMAIL_TAKEN, MISSING_FIELDS, PASSWORD_TOO_SHORT, USERNAME_TAKEN};
use gatehouse::types::Role;

#[tokio::test]
async fn first_account_is_admin_then_members() {
    let (_dir, state) = common::open_state().await;

    let alice = state
        .registrar
        .signup("alice", "alice@example.com", "secret1")
        .await
        .expect("first signup");
    assert!(alice.account.is_admin());
    assert!(!alice.token.is_empty());

    let bob = state
        .registrar
        .signup("bob", "bob@example.com", "secret2")
        .await
        .expect("second signup");
    assert_eq!(bob.account.user_role, Role::Member);

    // Both tokens verify against the one secret provisioned at bootstrap.
    let a = state.tokens.verify(&alice.token).await.expect("alice token");
    let b = state.tokens.verify(&bob.token).await.expect("bob token");
    assert_eq!(a.role, Role::Admin);
    assert_eq!(b.user_id, bob.account.id);
    assert_eq!(b.exp - b.iat, 24 * 60 * 60);
}

#[tokio::test]
async fn bootstrap_flag_is_spent_on_first_account() {
    let (_dir, state) = common::open_state().await;
    let alice = state
        .registrar
        .signup("alice", "alice@example.com", "secret1")
        .await
        .unwrap();

    let flag: String = sqlx::query_scalar(
        "SELECT setting_value FROM settings WHERE user_id IS NULL AND setting_key = 'bootstrap_admin'",
    )
    .fetch_one(&state.pool)
    .await
    .unwrap();
    assert_eq!(flag, alice.account.id.to_string());
}

#[tokio::test]
async fn password_length_counts_bytes() {
    let (_dir, state) = common::open_state().await;

    let err = state
        .registrar
        .signup("carol", "carol@example.com", "12345")
        .await
        .unwrap_err();
    assert!(matches!(err, GatehouseError::Validation(_)));
    assert_eq!(err.to_string(), PASSWORD_TOO_SHORT);

    state
        .registrar
        .signup("carol", "carol@example.com", "123456")
        .await
        .expect("six bytes is enough");

    // Three characters, six bytes.
    state
        .registrar
        .signup("pat", "pat@example.com", "ééé")
        .await
        .expect("multi-byte password of six bytes is accepted");

    // Two characters, four bytes.
    let err = state
        .registrar
        .signup("quinn", "quinn@example.com", "éé")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), PASSWORD_TOO_SHORT);
}

#[tokio::test]
async fn empty_fields_are_rejected_before_storage() {
    let (_dir, state) = common::open_state().await;
    for (u, e, p) in [
        ("", "x@example.com", "secret1"),
        ("x", "", "secret1"),
        ("x", "x@example.com", ""),
    ] {
        let err = state.registrar.signup(u, e, p).await.unwrap_err();
        assert_eq!(err.to_string(), MISSING_FIELDS);
    }
    let users: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(&state.pool)
        .await
        .unwrap();
    assert_eq!(users, 0);
}

#[tokio::test]
async fn duplicate_username_and_email_conflict() {
    let (_dir, state) = common::open_state().await;
    state
        .registrar
        .signup("dave", "dave@example.com", "secret1")
        .await
        .unwrap();

    let err = state
        .registrar
        .signup("dave", "other@example.com", "secret1")
        .await
        .unwrap_err();
    assert!(matches!(err, GatehouseError::Conflict(_)));
    assert_eq!(err.to_string(), USERNAME_TAKEN);

    let err = state
        .registrar
        .signup("dave2", "dave@example.com", "secret1")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), EMAIL_TAKEN);

    // A username equal to someone's email is also taken.
    let err = state
        .registrar
        .signup("dave@example.com", "new@example.com", "secret1")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), USERNAME_TAKEN);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_signups_for_same_username_admit_one() {
    let (_dir, cfg) = common::temp_config(4);
    let state = gatehouse::GatehouseState::open(&cfg).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..4 {
        let registrar = state.registrar.clone();
        handles.push(tokio::spawn(async move {
            registrar
                .signup("erin", &format!("erin{i}@example.com"), "secret1")
                .await
        }));
    }

    let mut ok = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => ok += 1,
            Err(e) => assert_eq!(e.to_string(), USERNAME_TAKEN),
        }
    }
    assert_eq!(ok, 1);

    let admins: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE user_role = 'admin'")
        .fetch_one(&state.pool)
        .await
        .unwrap();
    assert_eq!(admins, 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_first_signups_elect_one_admin() {
    let (_dir, cfg) = common::temp_config(4);
    let state = gatehouse::GatehouseState::open(&cfg).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..4 {
        let registrar = state.registrar.clone();
        handles.push(tokio::spawn(async move {
            registrar
                .signup(&format!("user{i}"), &format!("user{i}@example.com"), "secret1")
                .await
        }));
    }
    let mut sessions = Vec::new();
    for handle in handles {
        sessions.push(handle.await.unwrap().expect("distinct accounts all succeed"));
    }

    let admins = sessions
        .iter()
        .filter(|s| s.account.user_role == Role::Admin)
        .count();
    assert_eq!(admins, 1);
    for s in &sessions {
        state.tokens.verify(&s.token).await.expect("shared secret");
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_signups_for_same_email_admit_one() {
    let (_dir, cfg) = common::temp_config(4);
    let state = gatehouse::GatehouseState::open(&cfg).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..4 {
        let registrar = state.registrar.clone();
        handles.push(tokio::spawn(async move {
            registrar
                .signup(&format!("mallory{i}"), "mallory@example.com", "secret1")
                .await
        }));
    }

    let mut ok = 0;
    for handle in handles {
        match handle.await.unwrap() {
            Ok(_) => ok += 1,
            Err(e) => {
                assert!(matches!(e, GatehouseError::Conflict(_)));
                assert_eq!(e.to_string(), EMAIL_TAKEN);
            }
        }
    }
    assert_eq!(ok, 1);
}
