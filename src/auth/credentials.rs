//! Credential management for CDSE authentication
//!
//! Credentials are an OAuth2 client id and secret, stored in a .env file
//! with restrictive permissions and read through the environment at runtime.

use std::env;
use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::Path;

use crate::app::{CatalogConfig, StacCatalogClient};
use crate::constants::{auth, env as env_constants};
use crate::errors::{AuthError, AuthResult};

/// Authentication status information
#[derive(Debug, Clone)]
pub struct AuthStatus {
    /// Whether the client id environment variable is set
    pub client_id_set: bool,
    /// Whether the client secret environment variable is set
    pub client_secret_set: bool,
    /// Whether .env file exists in current directory
    pub dotenv_file_exists: bool,
    /// Whether credentials have been verified (None = not tested)
    pub credentials_valid: Option<bool>,
}

impl AuthStatus {
    /// Check if both credentials are available in environment
    pub fn has_credentials(&self) -> bool {
        self.client_id_set && self.client_secret_set
    }

    /// Get descriptive status message for display
    pub fn status_message(&self) -> String {
        match (self.has_credentials(), self.credentials_valid) {
            (false, _) => "Missing credentials - run 'auth setup' to configure".to_string(),
            (true, None) => "Credentials configured but not verified".to_string(),
            (true, Some(true)) => "Credentials configured and verified".to_string(),
            (true, Some(false)) => "Credentials configured but invalid".to_string(),
        }
    }
}

/// Check current authentication status
pub fn get_auth_status() -> AuthStatus {
    AuthStatus {
        client_id_set: env::var(env_constants::CLIENT_ID).is_ok(),
        client_secret_set: env::var(env_constants::CLIENT_SECRET).is_ok(),
        dotenv_file_exists: Path::new(".env").exists(),
        credentials_valid: None,
    }
}

/// Check if credentials exist in environment variables
pub fn check_credentials() -> bool {
    env::var(env_constants::CLIENT_ID).is_ok() && env::var(env_constants::CLIENT_SECRET).is_ok()
}

/// Prompt user for credentials interactively
pub fn prompt_credentials() -> AuthResult<(String, String)> {
    print!("CDSE Client ID: ");
    io::stdout().flush().map_err(AuthError::CredentialStorage)?;

    let mut client_id = String::new();
    io::stdin()
        .read_line(&mut client_id)
        .map_err(AuthError::CredentialStorage)?;
    let client_id = client_id.trim().to_string();

    if !is_valid_client_id(&client_id) {
        return Err(AuthError::InvalidClientId {
            reason: "Client id should be non-empty and alphanumeric with optional dots, hyphens, or underscores"
                .to_string(),
        });
    }

    let client_secret = rpassword::prompt_password("CDSE Client Secret: ")
        .map_err(|e| AuthError::CredentialStorage(io::Error::new(io::ErrorKind::Other, e)))?;

    if client_secret.is_empty() {
        return Err(AuthError::InvalidClientId {
            reason: "Client secret cannot be empty".to_string(),
        });
    }

    Ok((client_id, client_secret))
}

/// Validate client id format
fn is_valid_client_id(client_id: &str) -> bool {
    if client_id.len() < auth::MIN_CLIENT_ID_LENGTH || client_id.len() > auth::MAX_CLIENT_ID_LENGTH
    {
        return false;
    }

    client_id
        .chars()
        .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == '_')
}

/// Save credentials to .env file with secure permissions
pub fn save_credentials(client_id: &str, client_secret: &str) -> AuthResult<()> {
    let env_path = Path::new(".env");
    let mut existing_lines = Vec::new();
    let mut id_found = false;
    let mut secret_found = false;

    // Preserve unrelated entries in an existing .env file
    if env_path.exists() {
        let file = File::open(env_path)?;
        let reader = BufReader::new(file);

        for line in reader.lines() {
            let line = line?;
            let trimmed = line.trim();

            if trimmed.starts_with(&format!("{}=", env_constants::CLIENT_ID)) {
                existing_lines.push(format!("{}={}", env_constants::CLIENT_ID, client_id));
                id_found = true;
            } else if trimmed.starts_with(&format!("{}=", env_constants::CLIENT_SECRET)) {
                existing_lines.push(format!("{}={}", env_constants::CLIENT_SECRET, client_secret));
                secret_found = true;
            } else {
                existing_lines.push(line);
            }
        }
    }

    if !id_found {
        existing_lines.push(format!("{}={}", env_constants::CLIENT_ID, client_id));
    }
    if !secret_found {
        existing_lines.push(format!("{}={}", env_constants::CLIENT_SECRET, client_secret));
    }

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(env_path)?;

    for line in existing_lines {
        writeln!(file, "{}", line)?;
    }

    // Restrict to owner read/write (Unix-like systems only)
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let mut perms = file.metadata()?.permissions();
        perms.set_mode(auth::ENV_FILE_PERMISSIONS);
        file.set_permissions(perms)?;
    }

    env::set_var(env_constants::CLIENT_ID, client_id);
    env::set_var(env_constants::CLIENT_SECRET, client_secret);

    println!("Credentials saved to .env file");

    #[cfg(unix)]
    println!("File permissions set to owner-only (600)");

    #[cfg(not(unix))]
    println!(
        "Warning: File permissions not set (non-Unix system). Please ensure .env file is protected."
    );

    Ok(())
}

/// Verify credentials by requesting a token from the CDSE identity service
pub async fn verify_credentials() -> AuthResult<bool> {
    if !check_credentials() {
        return Err(AuthError::MissingCredentials);
    }

    println!("Verifying credentials with CDSE...");

    let client = StacCatalogClient::new(CatalogConfig::default()).map_err(|e| {
        AuthError::InvalidClientId {
            reason: format!("Could not build catalog client: {}", e),
        }
    })?;

    match client.verify_credentials().await {
        Ok(()) => {
            println!("Credentials verified successfully!");
            Ok(true)
        }
        Err(e) => {
            println!("Credential verification failed: {}", e);
            Ok(false)
        }
    }
}

/// Interactive credential setup workflow
pub async fn setup_credentials() -> AuthResult<()> {
    println!("CDSE Authentication Setup");
    println!("===============================");
    println!();
    println!("This will help you configure OAuth2 client credentials for the");
    println!("Copernicus Data Space Ecosystem. Your credentials will be stored in a");
    println!(".env file in the current directory.");
    println!();

    let status = get_auth_status();
    if status.has_credentials() {
        println!("Warning: Credentials are already configured.");
        print!("Do you want to update them? [y/N]: ");
        io::stdout().flush().map_err(AuthError::CredentialStorage)?;

        let mut response = String::new();
        io::stdin()
            .read_line(&mut response)
            .map_err(AuthError::CredentialStorage)?;

        if !response.trim().to_lowercase().starts_with('y') {
            println!("Setup cancelled.");
            return Ok(());
        }
        println!();
    }

    let (client_id, client_secret) = prompt_credentials()?;

    println!();
    println!("Saving credentials...");
    save_credentials(&client_id, &client_secret)?;

    println!();
    println!("Verifying credentials...");
    let is_valid = verify_credentials().await?;

    if is_valid {
        println!();
        println!("Setup complete! You can now run search and download commands.");
    } else {
        println!();
        println!("Setup failed. Please check your credentials and try again.");
        println!("   You can run 'auth setup' again to re-enter your credentials.");
    }

    Ok(())
}

/// Show current authentication status
pub async fn show_auth_status() -> AuthResult<()> {
    let mut status = get_auth_status();

    println!("CDSE Authentication Status");
    println!("=============================");
    println!();

    if let Ok(client_id) = env::var(env_constants::CLIENT_ID) {
        println!("Client ID: {} (set)", client_id);
    } else {
        println!("Client ID: Not set");
    }

    println!(
        "Client secret: {}",
        if status.client_secret_set {
            "Set"
        } else {
            "Not set"
        }
    );

    println!(
        ".env file: {}",
        if status.dotenv_file_exists {
            "Exists"
        } else {
            "Not found"
        }
    );

    println!();

    if status.has_credentials() {
        println!("Testing credentials...");
        let is_valid = verify_credentials().await?;
        status.credentials_valid = Some(is_valid);

        println!();
    }

    println!("Status: {}", status.status_message());

    if !status.has_credentials() {
        println!();
        println!("To configure credentials, run: rainsat_fetcher auth setup");
    } else if status.credentials_valid == Some(false) {
        println!();
        println!("To update credentials, run: rainsat_fetcher auth setup");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_valid_client_id() {
        // Valid cases
        assert!(is_valid_client_id("sh-client"));
        assert!(is_valid_client_id("sh-1234.user_name"));
        assert!(is_valid_client_id("abc"));

        // Invalid cases
        assert!(!is_valid_client_id("")); // empty
        assert!(!is_valid_client_id("ab")); // too short
        assert!(!is_valid_client_id("client id")); // space
        assert!(!is_valid_client_id("client@id")); // special char
        assert!(!is_valid_client_id(&"a".repeat(129))); // too long
    }

    #[test]
    fn test_auth_status_messages() {
        let mut status = AuthStatus {
            client_id_set: false,
            client_secret_set: false,
            dotenv_file_exists: false,
            credentials_valid: None,
        };

        assert!(status.status_message().contains("Missing credentials"));

        status.client_id_set = true;
        status.client_secret_set = true;
        assert!(status.status_message().contains("not verified"));

        status.credentials_valid = Some(true);
        assert!(status.status_message().contains("verified"));

        status.credentials_valid = Some(false);
        assert!(status.status_message().contains("invalid"));
    }

    #[test]
    fn test_save_credentials_new_file() -> Result<(), Box<dyn std::error::Error>> {
        let temp_dir = TempDir::new()?;
        let env_path = temp_dir.path().join(".env");

        let original_dir = env::current_dir()?;
        env::set_current_dir(&temp_dir)?;

        let result = save_credentials("sh-testclient", "testsecret");
        let restore = env::set_current_dir(original_dir);

        result?;
        restore?;

        let contents = std::fs::read_to_string(&env_path)?;
        assert!(contents.contains("CDSE_CLIENT_ID=sh-testclient"));
        assert!(contents.contains("CDSE_CLIENT_SECRET=testsecret"));

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let metadata = std::fs::metadata(&env_path)?;
            assert_eq!(metadata.permissions().mode() & 0o777, 0o600);
        }

        Ok(())
    }
}
