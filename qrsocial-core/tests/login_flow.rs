//! End-to-end login flows over on-disk datasets and session files.

use std::sync::Arc;
use std::time::Duration;

use qrsocial_core::{
    wait_hydrated, AuthError, AuthService, CaptureConfig, CaptureLoop, DatasetError,
    DatasetSourceConfig, DatasetSourceFactory, FileDatasetSource, FileStore, KeyValueStore,
    MockCamera, MockDecoder, Preset, Role, SessionState, SESSION_KEY,
};
use tempfile::TempDir;

const DATASET: &str = r#"{
    "groups": [
        {
            "name": "Bride",
            "guests": [
                {"id": "g1", "givenName": "Ana", "familyName": "Ruiz", "qrToken": "QR123",
                 "portraitUrl": "/img/ana.jpg", "relationLabel": "Hermana"},
                {"id": "g2", "givenName": "Luis", "familyName": "Ortega", "qrToken": "QR456",
                 "roleTag": "admin"}
            ]
        },
        {
            "name": "Groom",
            "guests": [
                {"id": "g3", "givenName": "Sofía", "qrToken": "QR789", "roleTag": "wizard"}
            ]
        }
    ],
    "config": {
        "testAccount": {"id": "tester", "givenName": "Invitado", "familyName": "Prueba",
                        "qrToken": "TEST-QR"}
    }
}"#;

struct Fixture {
    _dir: TempDir,
    dataset: std::path::PathBuf,
    session: std::path::PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let dataset = dir.path().join("invitados.json");
        std::fs::write(&dataset, DATASET).unwrap();
        let session = dir.path().join("state").join("session.json");
        Self {
            _dir: dir,
            dataset,
            session,
        }
    }

    fn service(&self) -> AuthService {
        AuthService::new(
            Arc::new(FileDatasetSource::new(&self.dataset)),
            Arc::new(FileStore::new(&self.session)),
        )
    }
}

fn fast() -> CaptureConfig {
    CaptureConfig {
        tick_interval: Duration::ZERO,
        ..Default::default()
    }
}

#[tokio::test]
async fn scan_login_survives_restart() {
    let fixture = Fixture::new();
    let mut auth = fixture.service();
    assert_eq!(auth.hydrate_session(), SessionState::Anonymous);

    let camera = MockCamera::new();
    let mut capture =
        CaptureLoop::start(&camera, fast(), Box::new(MockDecoder::on_call(5, "QR456"))).unwrap();
    let user = auth.scan_and_login(&mut capture).await.unwrap();
    assert_eq!(user.id, "g2");
    assert_eq!(user.role, Role::Admin);
    assert_eq!(camera.releases(), 1);

    let mut restarted = fixture.service();
    assert_eq!(restarted.hydrate_session(), SessionState::Authenticated(user));
}

#[tokio::test]
async fn unknown_role_becomes_guest() {
    let fixture = Fixture::new();
    let mut auth = fixture.service();
    let user = auth.login_with_token("QR789").await.unwrap();
    assert_eq!(user.role, Role::Guest);
    assert_eq!(user.family_name, "");
}

#[tokio::test]
async fn test_account_by_token_and_phrase() {
    let fixture = Fixture::new();
    let mut auth = fixture.service();

    assert_eq!(auth.login_with_token("TEST-QR").await.unwrap().id, "tester");
    assert_eq!(
        auth.login_with_name("  INVITADO   prueba ").await.unwrap().id,
        "tester"
    );
}

#[tokio::test]
async fn missing_dataset_file() {
    let dir = TempDir::new().unwrap();
    let source = DatasetSourceFactory::create(DatasetSourceConfig::from_location(
        dir.path().join("absent.json").to_str().unwrap(),
    ))
    .unwrap();
    let store = Arc::new(FileStore::new(dir.path().join("session.json")));

    let mut lenient = AuthService::new(source.clone(), store.clone());
    assert!(lenient.login_with_token("QR123").await.unwrap_err().is_no_match());

    let mut strict = AuthService::new(source, store).surface_dataset_errors(true);
    let err = strict.login_with_token("QR123").await.unwrap_err();
    assert!(matches!(
        err,
        AuthError::Dataset(DatasetError::DataUnavailable(_))
    ));
}

#[tokio::test]
async fn corrupt_session_file_is_repaired() {
    let fixture = Fixture::new();
    std::fs::create_dir_all(fixture.session.parent().unwrap()).unwrap();
    std::fs::write(
        &fixture.session,
        format!(r#"{{"{SESSION_KEY}": "{{ not a user"}}"#),
    )
    .unwrap();

    let mut auth = fixture.service();
    assert_eq!(auth.hydrate_session(), SessionState::Anonymous);
    assert_eq!(FileStore::new(&fixture.session).get(SESSION_KEY).unwrap(), None);

    auth.login_as_preset(Preset::Guest).unwrap();
    let mut restarted = fixture.service();
    assert_eq!(
        restarted.hydrate_session(),
        SessionState::Authenticated(Preset::Guest.user())
    );
}

#[tokio::test]
async fn consumers_wait_for_hydration() {
    let fixture = Fixture::new();
    let mut auth = fixture.service();
    auth.login_as_preset(Preset::Admin).unwrap();

    let mut restarted = fixture.service();
    let mut rx = restarted.session().subscribe();
    let consumer = tokio::spawn(async move { wait_hydrated(&mut rx).await });

    restarted.hydrate_session();
    let state = consumer.await.unwrap().unwrap();
    assert_eq!(state.user().map(|u| u.role), Some(Role::Admin));
}

#[tokio::test]
async fn logout_clears_file_record() {
    let fixture = Fixture::new();
    let mut auth = fixture.service();
    auth.login_with_name("ana ruiz").await.unwrap();
    auth.logout().unwrap();

    assert_eq!(FileStore::new(&fixture.session).get(SESSION_KEY).unwrap(), None);
    assert_eq!(fixture.service().hydrate_session(), SessionState::Anonymous);
}
