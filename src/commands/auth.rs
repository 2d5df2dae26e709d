use anyhow::Result;

pub async fn run(account: &str) -> Result<()> {
    println!("Authenticating '{account}' with Google...");

    // Runs the browser consent flow and stores the session
    let path = calmirror_provider_google::authenticate(account).await?;

    println!("Session saved to {}", path.display());
    println!("\nUse `account = \"{account}\"` under [source] or [satellite] in your config.");

    Ok(())
}
