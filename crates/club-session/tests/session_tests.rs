//! Session provider behavior against the in-memory directory and mocks.

use async_trait::async_trait;
use club_access::{AuthError, IdentityId, Profile, Role};
use club_session::{
    AuthBackend, AuthChange, BackendError, CredentialMode, Identity, MemoryDirectory,
    ProfileStore, SessionConfig, SessionProvider, SessionState, SessionToken, SignUpRequest,
};
use club_test_utils::{demo_email, setup_demo, setup_provider, RecordingObserver, DEMO_PASSWORD};
use mockall::mock;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

mock! {
    pub Profiles {}

    #[async_trait]
    impl ProfileStore for Profiles {
        async fn fetch_profile(&self, identity: &IdentityId) -> Result<Profile, BackendError>;
    }
}

async fn wait_until(mut done: impl FnMut() -> bool) {
    for _ in 0..200 {
        if done() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached");
}

#[tokio::test]
async fn coach_sign_in_binds_profile() {
    let (_, provider) = setup_demo();

    let profile = provider
        .sign_in(demo_email(Role::Coach), DEMO_PASSWORD)
        .await
        .unwrap();

    assert_eq!(profile.role, Role::Coach);
    assert_eq!(profile.team_id.as_ref().map(|t| t.as_str()), Some("team-1"));

    let session = provider.get_session().unwrap();
    assert_eq!(session.identity.id, profile.identity_id);
    assert!(provider.has_role(&[Role::Coach, Role::Director]));
    assert!(!provider.has_role(&[Role::Admin]));
    assert_eq!(provider.last_error(), None);
}

#[tokio::test]
async fn unknown_email_is_profile_not_found() {
    let (_, provider) = setup_demo();
    let recorder = RecordingObserver::new();
    provider.subscribe(recorder.clone());

    let err = provider.sign_in("nobody@club.test", "x").await.unwrap_err();

    assert_eq!(err, AuthError::ProfileNotFound);
    assert_eq!(provider.state(), SessionState::Unauthenticated);
    assert!(provider.get_session().is_none());
    assert!(provider.current_profile().is_none());
    assert_eq!(provider.last_error(), Some(AuthError::ProfileNotFound));
    assert_eq!(recorder.labels(), vec!["loading", "unauthenticated"]);
}

#[tokio::test]
async fn strict_mode_rejects_wrong_password() {
    let config = SessionConfig::new().with_credential_mode(CredentialMode::Strict);
    let provider = setup_provider(MemoryDirectory::demo(&config), config);

    let err = provider
        .sign_in(demo_email(Role::Admin), "wrong")
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::InvalidCredentials);
    assert!(!err.is_retryable());

    // Form stays usable: a corrected attempt succeeds and clears the error
    provider
        .sign_in(demo_email(Role::Admin), DEMO_PASSWORD)
        .await
        .unwrap();
    assert_eq!(provider.last_error(), None);
}

#[tokio::test]
async fn outage_is_retryable_fetch_failure() {
    let (directory, provider) = setup_demo();
    directory.set_available(false);

    let err = provider
        .sign_in(demo_email(Role::Player), DEMO_PASSWORD)
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::FetchFailed(_)));
    assert!(err.is_retryable());
    assert!(provider.get_session().is_none());

    directory.set_available(true);
    let profile = provider
        .sign_in(demo_email(Role::Player), DEMO_PASSWORD)
        .await
        .unwrap();
    assert_eq!(profile.role, Role::Player);
}

#[tokio::test]
async fn sign_out_twice_is_idempotent() {
    let (_, provider) = setup_demo();
    let recorder = RecordingObserver::new();
    provider
        .sign_in(demo_email(Role::Parent), DEMO_PASSWORD)
        .await
        .unwrap();
    provider.subscribe(recorder.clone());

    provider.sign_out().await;
    assert_eq!(provider.state(), SessionState::Unauthenticated);
    provider.sign_out().await;
    assert_eq!(provider.state(), SessionState::Unauthenticated);

    assert_eq!(recorder.labels(), vec!["unauthenticated"]);
}

#[tokio::test(start_paused = true)]
async fn later_sign_in_supersedes_earlier_fetch() {
    let config = SessionConfig::default();
    let provider = setup_provider(
        MemoryDirectory::demo(&config).with_fetch_delay(Duration::from_millis(100)),
        config,
    );

    let first = {
        let provider = Arc::clone(&provider);
        tokio::spawn(async move {
            provider
                .sign_in(demo_email(Role::Coach), DEMO_PASSWORD)
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;

    let second = provider
        .sign_in(demo_email(Role::Admin), DEMO_PASSWORD)
        .await
        .unwrap();

    assert_eq!(first.await.unwrap(), Err(AuthError::Superseded));
    assert_eq!(second.role, Role::Admin);
    assert_eq!(provider.state().role(), Some(Role::Admin));
    // A superseded attempt never becomes the visible error
    assert_eq!(provider.last_error(), None);
}

#[tokio::test(start_paused = true)]
async fn sign_out_discards_in_flight_fetch() {
    let config = SessionConfig::default();
    let provider = setup_provider(
        MemoryDirectory::demo(&config).with_fetch_delay(Duration::from_millis(100)),
        config,
    );
    let recorder = RecordingObserver::new();
    provider.subscribe(recorder.clone());

    let pending = {
        let provider = Arc::clone(&provider);
        tokio::spawn(async move {
            provider
                .sign_in(demo_email(Role::Director), DEMO_PASSWORD)
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    provider.sign_out().await;

    assert_eq!(pending.await.unwrap(), Err(AuthError::Superseded));
    assert_eq!(provider.state(), SessionState::Unauthenticated);
    assert_eq!(recorder.labels(), vec!["loading", "unauthenticated"]);
}

#[tokio::test(start_paused = true)]
async fn slow_profile_fetch_times_out() {
    let config = SessionConfig::new().with_fetch_timeout(Duration::from_millis(50));
    let provider = setup_provider(
        MemoryDirectory::demo(&config).with_fetch_delay(Duration::from_secs(2)),
        config,
    );

    let err = provider
        .sign_in(demo_email(Role::Admin), DEMO_PASSWORD)
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::FetchFailed("profile fetch timed out".to_string()));
    assert!(provider.get_session().is_none());
}

#[tokio::test]
async fn backend_failure_maps_to_fetch_failed() {
    let config = SessionConfig::default();
    let directory = Arc::new(MemoryDirectory::demo(&config));
    let mut profiles = MockProfiles::new();
    profiles
        .expect_fetch_profile()
        .times(1)
        .returning(|_| Err(BackendError::Unavailable("connection reset".to_string())));

    let provider = SessionProvider::new(directory, Arc::new(profiles), config);
    let err = provider
        .sign_in(demo_email(Role::Coach), DEMO_PASSWORD)
        .await
        .unwrap_err();

    assert_eq!(
        err,
        AuthError::FetchFailed("backend unavailable: connection reset".to_string())
    );
}

#[tokio::test]
async fn profile_for_other_identity_is_rejected() {
    let config = SessionConfig::default();
    let directory = Arc::new(MemoryDirectory::demo(&config));
    let mut profiles = MockProfiles::new();
    profiles.expect_fetch_profile().returning(|_| {
        Ok(Profile::new("p-x", "someone-else", "Other", "o@club.test", Role::Admin))
    });

    let provider = SessionProvider::new(directory, Arc::new(profiles), config);
    let err = provider
        .sign_in(demo_email(Role::Parent), DEMO_PASSWORD)
        .await
        .unwrap_err();

    assert_eq!(err, AuthError::ProfileNotFound);
    assert!(provider.current_profile().is_none());
}

#[tokio::test]
async fn sign_up_defaults_to_player_profile() {
    let (directory, provider) = setup_demo();
    let before = directory.account_count();

    let profile = provider
        .sign_up(&SignUpRequest::new("rookie@club.test", "pw", "Rookie"))
        .await
        .unwrap();

    assert_eq!(profile.role, Role::Player);
    assert_eq!(directory.account_count(), before + 1);

    let err = provider
        .sign_up(&SignUpRequest::new("rookie@club.test", "pw", "Rookie"))
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::InvalidCredentials);
    assert!(provider.get_session().is_none());
}

#[tokio::test]
async fn expired_identity_reads_as_signed_out() {
    let config = SessionConfig::default();
    let provider = setup_provider(
        MemoryDirectory::demo(&config).with_session_ttl(chrono::Duration::zero()),
        config,
    );
    let recorder = RecordingObserver::new();
    provider.subscribe(recorder.clone());

    provider
        .sign_in(demo_email(Role::Coordinator), DEMO_PASSWORD)
        .await
        .unwrap();

    assert!(provider.get_session().is_none());
    assert_eq!(provider.state(), SessionState::Unauthenticated);
    assert_eq!(
        recorder.labels(),
        vec!["loading", "authenticated:coordinator", "unauthenticated"]
    );
}

#[tokio::test]
async fn restore_adopts_backend_session() {
    let (directory, provider) = setup_demo();
    assert_eq!(provider.restore().await, Ok(None));

    directory
        .sign_in_with_password(demo_email(Role::Director), DEMO_PASSWORD)
        .await
        .unwrap();

    let restored = provider.restore().await.unwrap().unwrap();
    assert_eq!(restored.role, Role::Director);
    assert!(provider.get_session().is_some());
}

#[tokio::test]
async fn listener_applies_backend_changes() {
    let (directory, provider) = setup_demo();
    let listener = provider.spawn_auth_listener();

    provider
        .sign_in(demo_email(Role::Coach), DEMO_PASSWORD)
        .await
        .unwrap();

    // Session ended from another client
    directory.push_change(AuthChange::Expired);
    wait_until(|| provider.state() == SessionState::Unauthenticated).await;

    // Signed in elsewhere as the player
    directory.push_change(AuthChange::SignedIn(Identity {
        id: IdentityId::new("3"),
        email: demo_email(Role::Player).to_string(),
        token: SessionToken("external".to_string()),
        expires_at: None,
    }));
    wait_until(|| provider.state().role() == Some(Role::Player)).await;

    listener.abort();
}

#[tokio::test]
async fn listener_ignores_echo_of_own_sign_in() {
    let (_, provider) = setup_demo();
    let recorder = RecordingObserver::new();
    provider.subscribe(recorder.clone());
    let listener = provider.spawn_auth_listener();

    provider
        .sign_in(demo_email(Role::Admin), DEMO_PASSWORD)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(recorder.labels(), vec!["loading", "authenticated:admin"]);
    listener.abort();
}

#[tokio::test(start_paused = true)]
async fn own_sign_out_echo_does_not_cancel_next_sign_in() {
    let config = SessionConfig::default();
    let provider = setup_provider(
        MemoryDirectory::demo(&config).with_fetch_delay(Duration::from_millis(100)),
        config,
    );
    let recorder = RecordingObserver::new();
    provider.subscribe(recorder.clone());
    let listener = provider.spawn_auth_listener();

    provider
        .sign_in(demo_email(Role::Coach), DEMO_PASSWORD)
        .await
        .unwrap();
    provider.sign_out().await;
    // The sign-out echo arrives while this attempt is loading
    let admin = provider
        .sign_in(demo_email(Role::Admin), DEMO_PASSWORD)
        .await
        .unwrap();

    assert_eq!(admin.role, Role::Admin);
    assert_eq!(provider.state().role(), Some(Role::Admin));
    assert_eq!(
        recorder.labels(),
        vec![
            "loading",
            "authenticated:coach",
            "unauthenticated",
            "loading",
            "authenticated:admin",
        ]
    );
    listener.abort();
}

#[tokio::test]
async fn late_sign_in_echo_does_not_revive_signed_out_session() {
    let (_, provider) = setup_demo();
    let recorder = RecordingObserver::new();
    provider.subscribe(recorder.clone());
    let listener = provider.spawn_auth_listener();

    provider
        .sign_in(demo_email(Role::Coach), DEMO_PASSWORD)
        .await
        .unwrap();
    provider.sign_out().await;
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(provider.state(), SessionState::Unauthenticated);
    assert_eq!(
        recorder.labels(),
        vec!["loading", "authenticated:coach", "unauthenticated"]
    );
    listener.abort();
}

#[tokio::test]
async fn stale_echoes_leave_newer_session_bound() {
    let (_, provider) = setup_demo();
    let recorder = RecordingObserver::new();
    provider.subscribe(recorder.clone());
    let listener = provider.spawn_auth_listener();

    provider
        .sign_in(demo_email(Role::Coach), DEMO_PASSWORD)
        .await
        .unwrap();
    provider.sign_out().await;
    provider
        .sign_in(demo_email(Role::Admin), DEMO_PASSWORD)
        .await
        .unwrap();
    // Coach sign-in, sign-out and admin sign-in echoes all arrive now
    tokio::time::sleep(Duration::from_millis(20)).await;

    assert_eq!(provider.state().role(), Some(Role::Admin));
    assert_eq!(recorder.last().as_deref(), Some("authenticated:admin"));
    assert_eq!(recorder.labels().len(), 5);
    listener.abort();
}

#[tokio::test]
async fn failed_sign_in_also_ends_backend_session() {
    let config = SessionConfig::new().with_credential_mode(CredentialMode::Strict);
    let directory = Arc::new(MemoryDirectory::demo(&config));
    let provider = SessionProvider::new(directory.clone(), directory.clone(), config);

    provider
        .sign_in(demo_email(Role::Admin), DEMO_PASSWORD)
        .await
        .unwrap();
    assert!(directory.current_session().await.is_some());

    let err = provider
        .sign_in(demo_email(Role::Admin), "wrong")
        .await
        .unwrap_err();
    assert_eq!(err, AuthError::InvalidCredentials);
    assert_eq!(provider.state(), SessionState::Unauthenticated);
    assert_eq!(directory.current_session().await, None);
}

#[tokio::test]
async fn expire_if_stale_clears_only_expired_sessions() {
    let (_, live) = setup_demo();
    live.sign_in(demo_email(Role::Parent), DEMO_PASSWORD)
        .await
        .unwrap();
    assert!(!live.expire_if_stale());
    assert!(live.state().is_authenticated());

    let config = SessionConfig::default();
    let expiring = setup_provider(
        MemoryDirectory::demo(&config).with_session_ttl(chrono::Duration::zero()),
        config,
    );
    expiring
        .sign_in(demo_email(Role::Parent), DEMO_PASSWORD)
        .await
        .unwrap();
    assert!(expiring.expire_if_stale());
    assert!(!expiring.expire_if_stale());
    assert_eq!(expiring.state(), SessionState::Unauthenticated);
}

#[tokio::test]
async fn unsubscribed_observer_is_not_called() {
    let (_, provider) = setup_demo();
    let recorder = RecordingObserver::new();
    let id = provider.subscribe(recorder.clone());

    assert!(provider.unsubscribe(id));
    provider
        .sign_in(demo_email(Role::Admin), DEMO_PASSWORD)
        .await
        .unwrap();

    assert!(recorder.labels().is_empty());
}
