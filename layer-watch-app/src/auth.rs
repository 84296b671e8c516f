//! Interactive user login.
//!
//! Reuses the saved session when it is still authorized; otherwise asks
//! Telegram for a login code, reads it from stdin, and answers the 2FA
//! challenge with `TG_PASSWORD` or a prompted password.

use std::io::{self, BufRead, Write};

use anyhow::{Context, bail};
use layer_client::{Client, SignInError};

use crate::config::Settings;

pub async fn ensure_signed_in(client: &Client, settings: &Settings) -> anyhow::Result<()> {
    if client.is_authorized().await? {
        println!("✅ Already logged in");
        return Ok(());
    }

    println!("📱 Sending login code to {} …", settings.phone);
    let token = client.request_login_code(&settings.phone).await?;
    let code  = prompt("Enter the code you received: ")?;

    match client.sign_in(&token, &code).await {
        Ok(name) => println!("✅ Signed in as {name}"),
        Err(SignInError::PasswordRequired(pw_token)) => {
            let pw = match &settings.password {
                Some(pw) => pw.clone(),
                None => {
                    let hint = pw_token.hint().unwrap_or("(no hint)");
                    prompt(&format!("2FA password (hint: {hint}): "))?
                }
            };
            client.check_password(*pw_token, pw.trim()).await
                .context("two-factor password rejected")?;
            println!("✅ 2FA complete");
        }
        Err(SignInError::SignUpRequired) => {
            bail!("this number is not registered; sign up via the official Telegram app first")
        }
        Err(e) => return Err(e.into()),
    }

    client.save_session().await?;
    println!("💾 Session saved");
    Ok(())
}

fn prompt(msg: &str) -> io::Result<String> {
    print!("{msg}");
    io::stdout().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim().to_string())
}
