// Account maintenance commands run outside the HTTP server

use std::sync::Arc;

use crate::app_data::AppData;
use crate::coordinators::AuthCoordinator;
use crate::providers::CryptoProvider;
use crate::types::internal::Role;

/// Create an ADMIN account and print its generated password once
pub async fn create_admin(
    app_data: Arc<AppData>,
    name: &str,
    email: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let password = CryptoProvider::new().generate_secure_password();
    let auth = AuthCoordinator::new(app_data);
    let user = auth.create_account(name, email, &password, Role::Admin).await?;

    tracing::info!(user_id = %user.id, "Admin account created from CLI");
    println!("\nAdmin account created");
    println!("  id:       {}", user.id);
    println!("  email:    {}", user.email);
    println!("  password: {}", password);
    println!("\nStore this password now. It will not be shown again.\n");
    Ok(())
}

pub async fn unlock(app_data: Arc<AppData>, user_id: &str) -> Result<(), Box<dyn std::error::Error>> {
    AuthCoordinator::new(app_data).unlock_account(user_id).await?;
    println!("Account {} unlocked", user_id);
    Ok(())
}

pub async fn cleanup_tokens(app_data: Arc<AppData>) -> Result<(), Box<dyn std::error::Error>> {
    let deleted = AuthCoordinator::new(app_data).cleanup_expired_tokens().await?;
    println!("Removed {} expired refresh token(s)", deleted);
    Ok(())
}
