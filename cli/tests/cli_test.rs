use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use mock_server::{MockConfig, MockState};
use predicates::prelude::*;
use std::process::Command;

fn viva() -> Command {
    let mut cmd = Command::new(cargo_bin!("viva"));
    for var in ["VIVA_MERCHANT_ID", "VIVA_API_KEY", "VIVA_PRODUCTION", "VIVA_BASE_URL", "LOG_FORMAT"] {
        cmd.env_remove(var);
    }
    cmd
}

/// Serve a mock API on a random port and return its root URL.
fn start_mock(state: MockState) -> String {
    let std_listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = std_listener.local_addr().unwrap();
    std_listener.set_nonblocking(true).unwrap();

    std::thread::spawn(move || {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap();
        rt.block_on(async {
            let listener = tokio::net::TcpListener::from_std(std_listener).unwrap();
            mock_server::run(listener, state).await
        })
        .unwrap();
    });

    format!("http://{addr}")
}

#[test]
fn redirect_url_uses_sandbox_by_default() -> Result<(), Box<dyn std::error::Error>> {
    viva()
        .args(["--merchant-id", "m", "--api-key", "k", "redirect-url", "175936509216"])
        .assert()
        .success()
        .stdout("http://demo.vivapayments.com/web/checkout?ref=175936509216\n");
    Ok(())
}

#[test]
fn redirect_url_reads_credentials_and_environment_from_env() -> Result<(), Box<dyn std::error::Error>> {
    viva()
        .env("VIVA_MERCHANT_ID", "m")
        .env("VIVA_API_KEY", "k")
        .env("VIVA_PRODUCTION", "true")
        .args(["redirect-url", "42"])
        .assert()
        .success()
        .stdout("https://www.vivapayments.com/web/checkout?ref=42\n");
    Ok(())
}

#[test]
fn missing_credentials_fail() -> Result<(), Box<dyn std::error::Error>> {
    viva()
        .args(["redirect-url", "42"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--merchant-id"));
    Ok(())
}

#[test]
fn malformed_param_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    viva()
        .args(["--merchant-id", "m", "--api-key", "k", "create-order", "--amount", "100", "--param", "oops"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("KEY=VALUE"));
    Ok(())
}

#[test]
fn create_order_against_mock_prints_response_and_redirect() -> Result<(), Box<dyn std::error::Error>> {
    let root = start_mock(MockState::new(MockConfig::new("merchant", "key")));

    viva()
        .args(["--merchant-id", "merchant", "--api-key", "key", "--base-url", &root])
        .args(["create-order", "--amount", "100", "--param", "RequestLang=en-US", "--redirect"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"OrderCode\": 175936509216"))
        .stdout(predicate::str::contains("\"TimeStamp\""))
        .stdout(predicate::str::contains(format!("{root}/web/checkout?ref=175936509216")));
    Ok(())
}

#[test]
fn provider_error_fails_with_status() -> Result<(), Box<dyn std::error::Error>> {
    let root = start_mock(MockState::new(MockConfig::new("merchant", "key")));

    viva()
        .args(["--merchant-id", "merchant", "--api-key", "key", "--base-url", &root])
        .args(["cancel-transaction", "NOPE", "--amount", "10"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("HTTP 404"));
    Ok(())
}
