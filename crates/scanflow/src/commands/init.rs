//! `scanflow init` — interactive configuration setup

use colored::Colorize;
use scanflow_config::ENV_FILE;
use std::io::{self, Write};
use std::path::Path;

pub fn handle() -> anyhow::Result<()> {
    if Path::new(ENV_FILE).exists() {
        anyhow::bail!("{} already exists", ENV_FILE);
    }

    let project = prompt("Enter your project ID: ")?;
    if project.is_empty() {
        anyhow::bail!("project ID is required");
    }

    let mut region = prompt("Enter your region (default: global): ")?;
    if region.is_empty() {
        region = "global".to_string();
    }

    let use_token_file = prompt("Do you want to read the access token from a file? (y/n): ")?;
    let mut token_file = String::new();
    if use_token_file.eq_ignore_ascii_case("y") {
        token_file = prompt("Enter the path to the token file: ")?;
        if token_file.is_empty() {
            anyhow::bail!("token file path is required");
        }
        if !Path::new(&token_file).exists() {
            anyhow::bail!("token file not found at: {}", token_file);
        }
    }

    let mut content = format!("SCANFLOW_PROJECT={}\nSCANFLOW_REGION={}\n", project, region);
    if !token_file.is_empty() {
        content.push_str(&format!("SCANFLOW_TOKEN_FILE={}\n", token_file));
    }

    std::fs::write(ENV_FILE, content)?;
    // the file may end up holding credentials
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(ENV_FILE, std::fs::Permissions::from_mode(0o600))?;
    }

    println!();
    println!("{}", "Configuration initialized".green());
    if token_file.is_empty() {
        println!(
            "Note: no token file configured. Export {} or {} before running scanflow scan.",
            "SCANFLOW_TOKEN".cyan(),
            "GOOGLE_OAUTH_ACCESS_TOKEN".cyan()
        );
    }

    Ok(())
}

fn prompt(message: &str) -> anyhow::Result<String> {
    print!("{}", message);
    io::stdout().flush()?;
    let mut answer = String::new();
    io::stdin().read_line(&mut answer)?;
    Ok(answer.trim().to_string())
}
