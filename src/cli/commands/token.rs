use anyhow::Context;
use clap::Subcommand;
use serde_json::json;

use crate::cli::OutputFormat;
use crate::identity::{jwt::generate_jwt, Claims, JwtIdentityProvider};

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Sign a development access token")]
    Mint {
        #[arg(long, help = "User id to place in the `sub` claim")]
        sub: String,
        #[arg(long, default_value_t = 1, help = "Hours until expiry")]
        hours: i64,
        #[arg(long, help = "Optional email claim")]
        email: Option<String>,
        #[arg(long, env = "AUTH_JWT_SECRET", hide_env_values = true)]
        secret: String,
        #[arg(long, env = "AUTH_JWT_AUDIENCE", default_value = "authenticated")]
        audience: String,
    },

    #[command(about = "Verify a token and print the identity it resolves to")]
    Verify {
        #[arg(help = "Access token")]
        token: String,
        #[arg(long, env = "AUTH_JWT_SECRET", hide_env_values = true)]
        secret: String,
        #[arg(long, env = "AUTH_JWT_AUDIENCE", default_value = "authenticated")]
        audience: String,
    },
}

pub async fn handle(cmd: TokenCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        TokenCommands::Mint {
            sub,
            hours,
            email,
            secret,
            audience,
        } => {
            let mut claims = Claims::new(sub, Some(audience.as_str()), hours);
            claims.email = email;
            let token = generate_jwt(&claims, &secret).context("failed to sign token")?;

            match output_format {
                OutputFormat::Json => println!("{}", json!({ "token": token, "exp": claims.exp })),
                OutputFormat::Text => println!("{}", token),
            }
            Ok(())
        }
        TokenCommands::Verify {
            token,
            secret,
            audience,
        } => {
            let provider = JwtIdentityProvider::new(&secret, Some(audience.as_str()))?;
            let claims = provider.decode_claims(&token)?;

            match output_format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&claims)?),
                OutputFormat::Text => {
                    let expires = chrono::DateTime::from_timestamp(claims.exp, 0)
                        .map(|t| t.to_rfc3339())
                        .unwrap_or_else(|| claims.exp.to_string());
                    println!("sub:     {}", claims.sub);
                    println!("expires: {}", expires);
                }
            }
            Ok(())
        }
    }
}
