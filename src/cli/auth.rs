//! Session commands: login, logout, identity, language preference.

use anyhow::bail;
use console::style;

use crate::api::{ApiError, Backend};

use super::helpers::AppContext;

/// Store a bearer token and verify it against the identity probe.
pub async fn login(ctx: &AppContext, token: &str) -> anyhow::Result<()> {
    ctx.session.set_token(token);
    match ctx.client.me().await {
        Ok(me) => {
            println!("Logged in as {} ({})", style(me.display_name()).bold(), me.email);
            Ok(())
        }
        // The 401 handler already dropped the rejected token.
        Err(ApiError::Unauthorized) => bail!("Token was rejected by the backend"),
        Err(err) => bail!("Could not verify token: {}", err),
    }
}

pub fn logout(ctx: &AppContext) {
    ctx.session.clear_token();
    println!("Logged out.");
}

pub async fn whoami(ctx: &AppContext) -> anyhow::Result<()> {
    if !ctx.session.is_authenticated() {
        bail!("Not logged in. Run `docsight login --token <token>` first.");
    }
    let me = ctx.client.me().await?;
    println!("{} ({})", style(me.display_name()).bold(), me.email);
    Ok(())
}

/// Show or set the preferred report/chat output language.
pub fn language(ctx: &AppContext, language: Option<&str>) {
    match language {
        Some(lang) => {
            ctx.session.set_language(lang);
            println!("Report language set to {}", ctx.session.language());
        }
        None => println!("{}", ctx.session.language()),
    }
}
