//! CLI integration tests for qrsocial-cli.
//!
//! These tests run the actual binary against temporary datasets and session
//! files, checking outputs and exit codes.

use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const DATASET: &str = r#"{
    "grupos": [
        {
            "nombre": "Familia",
            "invitados": [
                {"id": "g1", "nombre": "Ana", "apellido": "Ruiz", "codigo_qr_contenido": "QR123",
                 "relacion": "Hermana"},
                {"id": "g2", "nombre": "Luis", "apellido": "Ortega", "codigo_qr_contenido": "QR456",
                 "role": "admin"}
            ]
        }
    ],
    "config": {
        "acceso_prueba": {
            "usuario_prueba": {"id": "tester", "nombre": "Invitado", "apellido": "Prueba",
                               "codigo_qr_contenido": "TEST-QR"}
        }
    }
}"#;

/// Temporary dataset plus session file, wired into every command.
struct Env {
    dir: TempDir,
}

impl Env {
    fn new() -> Self {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("invitados.json"), DATASET).unwrap();
        Self { dir }
    }

    fn session_file(&self) -> PathBuf {
        self.dir.path().join("session.json")
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("qrsocial").unwrap();
        cmd.env_remove("QRSOCIAL_DATASET")
            .env_remove("QRSOCIAL_SESSION_FILE")
            .env_remove("QRSOCIAL_TICK_MS")
            .env_remove("RUST_LOG")
            .arg("--dataset")
            .arg(self.path("invitados.json"))
            .arg("--session-file")
            .arg(self.session_file());
        cmd
    }
}

fn write_blank_png(dir: &Path) {
    fs::create_dir_all(dir).unwrap();
    image::RgbaImage::from_pixel(64, 64, image::Rgba([255, 255, 255, 255]))
        .save(dir.join("frame-000.png"))
        .unwrap();
}

/// PNG of `text` as a black-on-white QR code, 4 px per module with a
/// four-module quiet zone.
fn write_qr_png(dir: &Path, text: &str) {
    const SCALE: u32 = 4;
    const QUIET_ZONE: u32 = 4;

    let code = qrcode::QrCode::new(text.as_bytes()).unwrap();
    let modules = code.width() as u32;
    let colors = code.to_colors();
    let side = (modules + 2 * QUIET_ZONE) * SCALE;

    let frame = image::RgbaImage::from_fn(side, side, |x, y| {
        let (mx, my) = (x / SCALE, y / SCALE);
        let inside = (QUIET_ZONE..QUIET_ZONE + modules).contains(&mx)
            && (QUIET_ZONE..QUIET_ZONE + modules).contains(&my);
        let is_dark = inside
            && colors[((my - QUIET_ZONE) * modules + (mx - QUIET_ZONE)) as usize]
                == qrcode::Color::Dark;
        if is_dark {
            image::Rgba([0, 0, 0, 255])
        } else {
            image::Rgba([255, 255, 255, 255])
        }
    });

    fs::create_dir_all(dir).unwrap();
    frame.save(dir.join("frame-000.png")).unwrap();
}

// ============================================================================
// Help and Version Tests
// ============================================================================

#[test]
fn test_help_displays_usage() {
    Command::cargo_bin("qrsocial")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Guest login by invitation QR code"))
        .stdout(predicate::str::contains("whoami"))
        .stdout(predicate::str::contains("login"))
        .stdout(predicate::str::contains("scan"))
        .stdout(predicate::str::contains("logout"));
}

#[test]
fn test_help_shows_exit_codes() {
    Command::cargo_bin("qrsocial")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("Exit codes:"))
        .stdout(predicate::str::contains("65"))
        .stdout(predicate::str::contains("75"));
}

#[test]
fn test_scan_help_shows_options() {
    Command::cargo_bin("qrsocial")
        .unwrap()
        .args(["scan", "--help"])
        .assert()
        .success()
        .stdout(predicate::str::contains("--frames"))
        .stdout(predicate::str::contains("--facing"))
        .stdout(predicate::str::contains("--timeout"));
}

#[test]
fn test_unknown_preset_is_usage_error() {
    let env = Env::new();
    env.cmd()
        .args(["login", "preset", "root"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown preset"));
}

// ============================================================================
// Session Lifecycle Tests
// ============================================================================

#[test]
fn test_fresh_install_is_anonymous() {
    let env = Env::new();
    env.cmd()
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("anonymous"));

    env.cmd()
        .args(["whoami", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::diff("null\n"));
}

#[test]
fn test_token_login_persists_across_runs() {
    let env = Env::new();
    env.cmd()
        .args(["login", "token", "QR123"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Welcome,"))
        .stdout(predicate::str::contains("Ana Ruiz"));

    env.cmd()
        .args(["whoami", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""id": "g1""#))
        .stdout(predicate::str::contains(r#""avatarUrl": "/img/default-avatar.png""#))
        .stdout(predicate::str::contains(r#""relationLabel": "Hermana""#));
}

#[test]
fn test_name_login_ignores_case_and_spacing() {
    let env = Env::new();
    env.cmd()
        .args(["login", "name", "luis", "ORTEGA"])
        .assert()
        .success()
        .stdout(predicate::str::contains("admin"));
}

#[test]
fn test_test_account_phrase() {
    let env = Env::new();
    env.cmd()
        .args(["--json", "login", "name", "Invitado Prueba"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""id": "tester""#));
}

#[test]
fn test_preset_login_then_logout() {
    let env = Env::new();
    env.cmd()
        .args(["login", "preset", "super-admin"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Modo Dios"));

    env.cmd()
        .args(["whoami", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""role": "super_admin""#));

    env.cmd()
        .arg("logout")
        .assert()
        .success()
        .stdout(predicate::str::contains("Logged out"));

    env.cmd()
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("anonymous"));
}

#[test]
fn test_corrupt_session_reads_as_anonymous() {
    let env = Env::new();
    fs::write(env.session_file(), r#"{"qrSocialUser": "{ broken"}"#).unwrap();

    env.cmd()
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("anonymous"));
}

#[test]
fn test_legacy_session_record_hydrates() {
    let env = Env::new();
    let record = r#"{"id":"g9","name":"Juan","lastName":"Pérez","avatar":"/img/juan.jpg","role":"guest","relation":"Primo"}"#;
    let file = serde_json_string_map("qrSocialUser", record);
    fs::write(env.session_file(), file).unwrap();

    env.cmd()
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("Juan Pérez"))
        .stdout(predicate::str::contains("Primo"));
}

/// `{"<key>": "<value>"}` with `value` escaped as a JSON string.
fn serde_json_string_map(key: &str, value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    format!(r#"{{"{key}": "{escaped}"}}"#)
}

// ============================================================================
// Exit Code Tests
// ============================================================================

#[test]
fn test_unknown_token_returns_no_match() {
    // Exit code 65 = EX_DATAERR
    let env = Env::new();
    env.cmd()
        .args(["login", "token", "QRXXX"])
        .assert()
        .code(65)
        .stderr(predicate::str::contains("No guest matches"));

    env.cmd()
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("anonymous"));
}

#[test]
fn test_token_is_case_sensitive() {
    let env = Env::new();
    env.cmd().args(["login", "token", "qr123"]).assert().code(65);
}

#[test]
fn test_missing_dataset_returns_input_error() {
    // Exit code 66 = EX_NOINPUT
    let env = Env::new();
    env.cmd()
        .arg("--dataset")
        .arg(env.path("absent.json"))
        .args(["login", "token", "QR123"])
        .assert()
        .code(66)
        .stderr(predicate::str::contains("Guest dataset unavailable"));
}

#[test]
fn test_malformed_dataset_returns_input_error() {
    let env = Env::new();
    fs::write(env.path("broken.json"), r#"{"groups": 3}"#).unwrap();
    env.cmd()
        .arg("--dataset")
        .arg(env.path("broken.json"))
        .args(["login", "name", "Ana Ruiz"])
        .assert()
        .code(66)
        .stderr(predicate::str::contains("malformed"));
}

#[test]
fn test_missing_frames_dir_returns_unavailable() {
    // Exit code 69 = EX_UNAVAILABLE
    let env = Env::new();
    env.cmd()
        .arg("scan")
        .arg("--frames")
        .arg(env.path("no-camera"))
        .assert()
        .code(69)
        .stderr(predicate::str::contains("Camera unavailable"));
}

#[test]
fn test_scan_without_code_times_out() {
    // Exit code 75 = EX_TEMPFAIL
    let env = Env::new();
    let frames = env.path("frames");
    write_blank_png(&frames);

    env.cmd()
        .arg("scan")
        .arg("--frames")
        .arg(&frames)
        .args(["--timeout", "1"])
        .assert()
        .code(75)
        .stderr(predicate::str::contains("No code decoded within 1s"));

    env.cmd()
        .arg("whoami")
        .assert()
        .success()
        .stdout(predicate::str::contains("anonymous"));
}

#[test]
fn test_scan_decodes_invitation_and_logs_in() {
    let env = Env::new();
    let frames = env.path("frames");
    write_qr_png(&frames, "QR123");

    env.cmd()
        .arg("scan")
        .arg("--frames")
        .arg(&frames)
        .args(["--timeout", "5"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Welcome,"))
        .stdout(predicate::str::contains("Ana Ruiz"));

    env.cmd()
        .args(["whoami", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains(r#""id": "g1""#));
}

#[test]
fn test_unwritable_session_returns_io_error() {
    // Exit code 74 = EX_IOERR
    let env = Env::new();
    let blocker = env.path("blocker");
    fs::write(&blocker, "a file, not a directory").unwrap();

    Command::cargo_bin("qrsocial")
        .unwrap()
        .env_remove("QRSOCIAL_DATASET")
        .env_remove("QRSOCIAL_SESSION_FILE")
        .arg("--dataset")
        .arg(env.path("invitados.json"))
        .arg("--session-file")
        .arg(blocker.join("session.json"))
        .args(["login", "preset", "guest"])
        .assert()
        .code(74);
}
