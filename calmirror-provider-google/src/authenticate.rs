use anyhow::{Context, Result};
use std::path::PathBuf;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpListener;
use url::Url;

use crate::app_config::{self, Credentials};
use crate::session::{Session, TOKEN_URL, TokenResponse};

const AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

pub const SCOPES: &[&str] = &["https://www.googleapis.com/auth/calendar"];

const REDIRECT_PORT: u16 = 8085;

pub fn redirect_uri() -> String {
    format!("http://localhost:{}/callback", REDIRECT_PORT)
}

fn redirect_address() -> String {
    format!("127.0.0.1:{}", REDIRECT_PORT)
}

/// Consent page URL requesting offline access.
pub fn consent_url(creds: &Credentials, state: &str) -> Result<Url> {
    let url = Url::parse_with_params(
        AUTH_URL,
        &[
            ("client_id", creds.client_id.as_str()),
            ("redirect_uri", redirect_uri().as_str()),
            ("response_type", "code"),
            ("scope", SCOPES.join(" ").as_str()),
            ("access_type", "offline"),
            ("prompt", "consent"),
            ("state", state),
        ],
    )?;

    Ok(url)
}

/// Run the browser consent flow and store a session under `account`.
///
/// Returns the path of the saved session file.
pub async fn authenticate(account: &str) -> Result<PathBuf> {
    let creds = app_config::load()?;
    let state = uuid::Uuid::new_v4().to_string();
    let auth_url = consent_url(&creds, &state)?;

    eprintln!("\nOpen this URL in your browser to authenticate '{account}':\n");
    eprintln!("{}\n", auth_url);

    if open::that(auth_url.as_str()).is_err() {
        eprintln!("(Could not open browser automatically, please copy the URL above)");
    }

    let (code, returned_state) = wait_for_callback().await?;

    if returned_state != state {
        anyhow::bail!("OAuth state mismatch, refusing the callback");
    }

    eprintln!("\nReceived authorization code, exchanging for tokens...");

    let tokens = exchange_code(&creds, &code).await?;
    let path = Session::from_tokens(account, tokens)?.save()?;

    eprintln!("Authentication successful!");

    Ok(path)
}

async fn exchange_code(creds: &Credentials, code: &str) -> Result<TokenResponse> {
    let redirect = redirect_uri();
    let response = reqwest::Client::new()
        .post(TOKEN_URL)
        .form(&[
            ("code", code),
            ("client_id", creds.client_id.as_str()),
            ("client_secret", creds.client_secret.as_str()),
            ("redirect_uri", redirect.as_str()),
            ("grant_type", "authorization_code"),
        ])
        .send()
        .await
        .context("Failed to send token exchange request")?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        anyhow::bail!("Token exchange failed: {status} - {body}");
    }

    response
        .json()
        .await
        .context("Failed to parse token exchange response")
}

async fn wait_for_callback() -> Result<(String, String)> {
    let listener = TcpListener::bind(redirect_address())
        .await
        .context("Failed to bind OAuth callback listener")?;

    let (stream, _) = listener
        .accept()
        .await
        .context("Failed to accept OAuth callback")?;

    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    reader
        .read_line(&mut request_line)
        .await
        .context("Failed to read OAuth callback request line")?;

    let params = parse_callback(&request_line)?;

    let response = "HTTP/1.1 200 OK\r\n\
        Content-Type: text/html\r\n\
        Connection: close\r\n\
        \r\n\
        <html><body>\
        <h1>Authentication successful!</h1>\
        <p>You can close this window and return to the terminal.</p>\
        </body></html>";

    let mut stream = reader.into_inner();
    stream
        .write_all(response.as_bytes())
        .await
        .context("Failed to write OAuth callback response")?;
    stream.flush().await?;

    Ok(params)
}

/// Pull `(code, state)` out of the callback's HTTP request line.
fn parse_callback(request_line: &str) -> Result<(String, String)> {
    let path = request_line
        .split_whitespace()
        .nth(1)
        .ok_or_else(|| anyhow::anyhow!("Invalid HTTP request"))?;

    let url = Url::parse(&format!("http://localhost{}", path))?;
    let param = |name: &str| {
        url.query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.to_string())
    };

    if let Some(error) = param("error") {
        anyhow::bail!("Authorization was denied: {error}");
    }

    let code = param("code").ok_or_else(|| anyhow::anyhow!("No code in callback"))?;
    let state = param("state").ok_or_else(|| anyhow::anyhow!("No state in callback"))?;

    Ok((code, state))
}
