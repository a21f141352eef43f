//! Maintenance tool that encrypts legacy plaintext tenant database secrets.
//!
//! Tenants written before secret encryption was introduced carry their
//! database secret as raw bytes. This walks every tenant row and rewrites
//! those payloads in the current AES-256-GCM format.

use anyhow::{Context, Result, anyhow};
use sea_orm::{ActiveModelTrait, EntityTrait, IntoActiveModel, Set};
use tenancy::{
    config::ConfigLoader,
    crypto::{CryptoKey, is_encrypted_payload},
    db,
    models::tenant,
};

#[tokio::main]
async fn main() -> Result<()> {
    let loader = ConfigLoader::new();
    let config = loader.load().context("loading configuration")?;

    let key_bytes = config
        .crypto_key
        .clone()
        .context("crypto key not present in configuration")?;
    let crypto_key = CryptoKey::new(key_bytes).context("initializing crypto key")?;

    let db = db::init_pool(&config)
        .await
        .context("initializing database connection pool")?;

    let tenants = tenant::Entity::find()
        .all(&db)
        .await
        .context("querying tenants")?;

    let mut updated_count = 0usize;

    for row in tenants {
        let tenant_id = row.id;

        let Some(secret) = row.db_secret_ciphertext.clone() else {
            continue;
        };
        if secret.is_empty() || is_encrypted_payload(&secret) {
            continue;
        }

        let plaintext = String::from_utf8(secret)
            .map_err(|_| anyhow!("stored secret for {} is not valid UTF-8", tenant_id))?;
        let ciphertext =
            tenancy::crypto::encrypt_tenant_secret(&crypto_key, tenant_id, &plaintext)
                .map_err(|err| anyhow!("failed to encrypt secret for {}: {}", tenant_id, err))?;

        let mut active = row.into_active_model();
        active.db_secret_ciphertext = Set(Some(ciphertext));
        active
            .update(&db)
            .await
            .with_context(|| format!("updating tenant {}", tenant_id))?;

        updated_count += 1;
    }

    println!("Re-encrypted {} tenant secret(s)", updated_count);

    Ok(())
}
