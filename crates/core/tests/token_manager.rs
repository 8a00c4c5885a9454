//! Token refresh behaviour of `TokenManager`.

mod support;

use std::sync::Arc;
use std::time::Duration as StdDuration;

use cadence_core::{MockClock, TokenManager};
use cadence_domain::{CadenceError, OAuthCredential, TenantId, TokenGrant};
use chrono::Duration;
use support::calendar::MockOAuthClient;
use support::repositories::MockCredentialRepository;
use support::{credential, test_now};

fn manager(
    credentials: Arc<MockCredentialRepository>,
    oauth: Arc<MockOAuthClient>,
) -> TokenManager {
    TokenManager::new(credentials, oauth, Arc::new(MockClock::at(test_now())), 300)
}

fn expiring_in(minutes: i64) -> OAuthCredential {
    let mut credential = credential("clinic", test_now());
    credential.expires_at = test_now() + Duration::minutes(minutes);
    credential
}

#[tokio::test]
async fn refreshes_when_expiry_is_inside_threshold() {
    let credentials = Arc::new(MockCredentialRepository::with(vec![expiring_in(4)]));
    let oauth = Arc::new(MockOAuthClient::new());
    let tokens = manager(credentials.clone(), oauth.clone());

    let grant = tokens.get_valid_access_token(&TenantId::from("clinic")).await.unwrap();

    assert_eq!(oauth.calls(), 1);
    assert_eq!(grant.access_token, "refreshed-token");
    let stored = credentials.get("clinic").unwrap();
    assert_eq!(stored.access_token, "refreshed-token");
    assert_eq!(stored.expires_at, test_now() + Duration::seconds(3600));
    assert_eq!(stored.refresh_token, "refresh-clinic");
}

#[tokio::test]
async fn keeps_token_when_expiry_is_outside_threshold() {
    let credentials = Arc::new(MockCredentialRepository::with(vec![expiring_in(10)]));
    let oauth = Arc::new(MockOAuthClient::new());
    let tokens = manager(credentials.clone(), oauth.clone());

    let grant = tokens.get_valid_access_token(&TenantId::from("clinic")).await.unwrap();

    assert_eq!(oauth.calls(), 0);
    assert_eq!(grant.access_token, "token-clinic");
    assert_eq!(credentials.saves(), 0);
}

#[tokio::test]
async fn missing_credential_is_not_connected() {
    let tokens = manager(Arc::default(), Arc::new(MockOAuthClient::new()));

    let err = tokens.get_valid_access_token(&TenantId::from("nobody")).await.unwrap_err();

    assert!(matches!(err, CadenceError::NotConnected(_)));
}

#[tokio::test]
async fn rejected_refresh_flags_credential_for_reconnect() {
    let credentials = Arc::new(MockCredentialRepository::with(vec![expiring_in(1)]));
    let oauth = Arc::new(MockOAuthClient::new());
    oauth.respond_with(Err(CadenceError::Auth("invalid_grant: Token has been revoked".into())));
    let tokens = manager(credentials.clone(), oauth.clone());
    let tenant = TenantId::from("clinic");

    let err = tokens.get_valid_access_token(&tenant).await.unwrap_err();
    assert!(matches!(err, CadenceError::Auth(_)));
    assert!(credentials.get("clinic").unwrap().needs_reconnect);

    // Flagged credentials fail fast without another provider round trip.
    let err = tokens.get_valid_access_token(&tenant).await.unwrap_err();
    assert!(matches!(err, CadenceError::Auth(_)));
    assert_eq!(oauth.calls(), 1);
}

#[tokio::test]
async fn network_failure_leaves_credential_untouched() {
    let original = expiring_in(1);
    let credentials = Arc::new(MockCredentialRepository::with(vec![original.clone()]));
    let oauth = Arc::new(MockOAuthClient::new());
    oauth.respond_with(Err(CadenceError::Network("connection reset".into())));
    let tokens = manager(credentials.clone(), oauth);

    let err = tokens.get_valid_access_token(&TenantId::from("clinic")).await.unwrap_err();

    assert!(matches!(err, CadenceError::Network(_)));
    assert_eq!(credentials.get("clinic").unwrap(), original);
}

#[tokio::test]
async fn rotated_refresh_token_is_persisted() {
    let credentials = Arc::new(MockCredentialRepository::with(vec![expiring_in(0)]));
    let oauth = Arc::new(MockOAuthClient::new());
    oauth.respond_with(Ok(TokenGrant {
        access_token: "fresh".into(),
        expires_in: 1800,
        refresh_token: Some("rotated".into()),
    }));
    let tokens = manager(credentials.clone(), oauth);

    tokens.get_valid_access_token(&TenantId::from("clinic")).await.unwrap();

    let stored = credentials.get("clinic").unwrap();
    assert_eq!(stored.refresh_token, "rotated");
    assert_eq!(stored.expires_at, test_now() + Duration::seconds(1800));
}

#[tokio::test]
async fn out_of_range_lifetime_fails_without_touching_credential() {
    let original = expiring_in(1);
    let credentials = Arc::new(MockCredentialRepository::with(vec![original.clone()]));
    let oauth = Arc::new(MockOAuthClient::new());
    oauth.respond_with(Ok(TokenGrant {
        access_token: "fresh".into(),
        expires_in: i64::MAX,
        refresh_token: None,
    }));
    let tokens = manager(credentials.clone(), oauth);

    let err = tokens.get_valid_access_token(&TenantId::from("clinic")).await.unwrap_err();

    assert!(matches!(err, CadenceError::Auth(_)));
    let stored = credentials.get("clinic").unwrap();
    assert_eq!(stored, original);
    assert!(!stored.needs_reconnect);
}

#[tokio::test]
async fn concurrent_callers_share_one_refresh() {
    let credentials = Arc::new(MockCredentialRepository::with(vec![expiring_in(2)]));
    let oauth = Arc::new(MockOAuthClient::new());
    oauth.delay(StdDuration::from_millis(50));
    let tokens = Arc::new(manager(credentials, oauth.clone()));

    let handles: Vec<_> = (0..5)
        .map(|_| {
            let tokens = tokens.clone();
            tokio::spawn(async move {
                tokens.get_valid_access_token(&TenantId::from("clinic")).await
            })
        })
        .collect();

    for handle in handles {
        let grant = handle.await.unwrap().unwrap();
        assert_eq!(grant.access_token, "refreshed-token");
    }
    assert_eq!(oauth.calls(), 1);
}

#[tokio::test]
async fn reconnecting_clears_the_flag() {
    let mut flagged = expiring_in(30);
    flagged.needs_reconnect = true;
    let credentials = Arc::new(MockCredentialRepository::with(vec![flagged]));
    let tokens = manager(credentials.clone(), Arc::new(MockOAuthClient::new()));

    let fresh = credential("clinic", test_now());
    tokens.store_credential(fresh).await.unwrap();

    assert!(!credentials.get("clinic").unwrap().needs_reconnect);
    let grant = tokens.get_valid_access_token(&TenantId::from("clinic")).await.unwrap();
    assert_eq!(grant.access_token, "token-clinic");

    assert!(tokens.clear_credential(&TenantId::from("clinic")).await.unwrap());
    assert!(credentials.get("clinic").is_none());
}
