//! Shared session configuration fixture for behavioural tests.

use sftp_probe::SessionConfig;

pub fn session_config() -> SessionConfig {
    SessionConfig {
        host: String::from("sftp.example.test"),
        port: 22,
        username: String::from("probe"),
        password: String::from("not-a-real-password"),
        timeout: None,
    }
}
