use anyhow::Context;
use clap::Args;
use serde_json::Value;

use crate::cli::OutputFormat;

#[derive(Args)]
pub struct WhoamiArgs {
    #[arg(long, env = "VILLAGE_API_URL", default_value = "http://localhost:3000")]
    pub server: String,
    #[arg(long, env = "VILLAGE_TOKEN", hide_env_values = true)]
    pub token: String,
}

/// GET /api/users/me against a running server
pub async fn handle(args: WhoamiArgs, output_format: OutputFormat) -> anyhow::Result<()> {
    let url = url::Url::parse(&args.server)
        .and_then(|base| base.join("/api/users/me"))
        .with_context(|| format!("invalid server url '{}'", args.server))?;

    let response = reqwest::Client::new()
        .get(url)
        .bearer_auth(&args.token)
        .send()
        .await
        .context("request failed")?;

    let status = response.status();
    let body: Value = response.json().await.context("server did not return JSON")?;

    if !status.is_success() {
        let message = body["error"].as_str().unwrap_or("unknown error");
        anyhow::bail!("{} {}", status.as_u16(), message);
    }

    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&body["data"])?),
        OutputFormat::Text => {
            let id = body["data"]["id"].as_str().unwrap_or("?");
            println!("{}", id);
        }
    }
    Ok(())
}
