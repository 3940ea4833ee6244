//! Seed data: reference tables, the region hierarchy and demo vendors.
//!
//! Each seed skips tables that already hold rows, so running a command twice
//! is harmless.

use rand::Rng;
use rand::distr::Alphanumeric;

use rosewood_core::region::{self, RegionCode};
use rosewood_core::{Email, Mobile};
use rosewood_web::db::{
    NewVendor, PrivilegeRepository, ReferenceRepository, RegionRepository, RepositoryError,
    VendorRepository,
};
use rosewood_web::services::auth::{AuthService, hash_password};

use super::{CommandError, connect};

/// Username of the administrator created with the reference data.
const DEFAULT_ADMIN: &str = "admin";

/// Password shared by every demo vendor.
const DEMO_VENDOR_PASSWORD: &str = "rosewood-demo";

/// Load reference tables and create the default administrator when there is
/// none yet.
///
/// # Errors
///
/// Returns `CommandError` if the database is unreachable or an insert fails.
pub async fn reference(admin_password: Option<String>, admin_email: &str) -> Result<(), CommandError> {
    let pool = connect().await?;

    let report = ReferenceRepository::new(&pool).seed().await?;
    if report.is_empty() {
        tracing::info!("Reference tables already seeded");
    }
    for (table, rows) in &report {
        tracing::info!(table, rows, "Seeded reference table");
    }

    if !PrivilegeRepository::new(&pool).list().await?.is_empty() {
        tracing::info!("Administrators exist, default account skipped");
        return Ok(());
    }

    let generated = admin_password.is_none();
    let password = admin_password.unwrap_or_else(random_password);
    let privilege = AuthService::new(&pool)
        .create_privilege(DEFAULT_ADMIN, admin_email, &password)
        .await?;

    tracing::info!(privilege_id = %privilege.id, "Default administrator created");
    if generated {
        tracing::warn!("Generated password for '{DEFAULT_ADMIN}': {password}");
    }
    Ok(())
}

/// Load provinces, cities and districts from the embedded table.
///
/// # Errors
///
/// Returns `CommandError` if the table cannot be planned or an insert fails.
pub async fn regions() -> Result<(), CommandError> {
    let pool = connect().await?;
    let regions = RegionRepository::new(&pool);

    if regions.is_seeded().await? {
        tracing::info!("Regions already seeded");
        return Ok(());
    }

    let records = region::embedded_plan()?;
    tracing::info!(records = records.len(), "Loading regions...");
    let report = regions.seed(&records).await?;

    tracing::info!(
        provinces = report.provinces,
        cities = report.cities,
        districts = report.districts,
        "Regions seeded"
    );
    Ok(())
}

/// Create `count` demo vendors, each with an address in a random district.
///
/// # Errors
///
/// Returns `CommandError::Precondition` if regions are not loaded, or
/// `CommandError` if an insert fails for another reason than a collision.
pub async fn vendors(count: usize) -> Result<(), CommandError> {
    let pool = connect().await?;
    let vendors = VendorRepository::new(&pool);
    let regions = RegionRepository::new(&pool);

    if vendors.any().await? {
        tracing::info!("Vendors exist, demo vendors skipped");
        return Ok(());
    }
    if !regions.is_seeded().await? {
        return Err(CommandError::Precondition(
            "regions are not loaded; run `rw-cli seed regions` first",
        ));
    }

    let password_hash = hash_password(DEMO_VENDOR_PASSWORD)?;
    let mut created = 0;
    for n in 1..=count {
        let cn_id = regions.random_district_code().await?;
        let Some(vendor) = demo_vendor(n, cn_id, &password_hash) else {
            continue;
        };
        match vendors.create(&vendor).await {
            Ok(vendor) => {
                created += 1;
                tracing::debug!(vendor_id = %vendor.id, mobile = %vendor.mobile, "Demo vendor created");
            }
            // Random mobiles can collide; the slot is simply skipped.
            Err(RepositoryError::Conflict(what)) => {
                tracing::warn!(%what, "Demo vendor collided, skipped");
            }
            Err(e) => return Err(e.into()),
        }
    }

    tracing::info!(
        created,
        password = DEMO_VENDOR_PASSWORD,
        "Demo vendors seeded"
    );
    Ok(())
}

fn demo_vendor(n: usize, cn_id: RegionCode, password_hash: &str) -> Option<NewVendor> {
    let mut rng = rand::rng();
    let mobile = format!(
        "1{}{:09}",
        rng.random_range(3..=9),
        rng.random_range(0..1_000_000_000_u32)
    );
    let identity = format!(
        "{}19{:02}{:02}{:02}{:04}",
        cn_id.get(),
        rng.random_range(60..100),
        rng.random_range(1..=12),
        rng.random_range(1..=28),
        rng.random_range(0..10_000)
    );

    Some(NewVendor {
        password_hash: password_hash.to_owned(),
        mobile: Mobile::parse(&mobile).ok()?,
        email: Email::parse(&format!("vendor{n}@demo.rosewood.local")).ok()?,
        agent_name: format!("代理人{n}"),
        agent_identity: identity,
        name: format!("示范红木{n}号"),
        license_limit: "2030/12/31".to_string(),
        contact: format!("代理人{n}"),
        telephone: format!("0571-8{:07}", rng.random_range(0..10_000_000)),
        introduction: String::new(),
        cn_id,
        address: format!("工业园{n}号"),
    })
}

fn random_password() -> String {
    rand::rng()
        .sample_iter(&Alphanumeric)
        .take(20)
        .map(char::from)
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_demo_vendor_fields_are_valid() {
        let cn_id = RegionCode::parse("330106").unwrap();
        for n in 1..50 {
            let vendor = demo_vendor(n, cn_id, "hash").unwrap();
            assert_eq!(vendor.mobile.as_str().len(), 11);
            assert_eq!(vendor.agent_identity.len(), 18);
            assert!(vendor.agent_identity.starts_with("330106"));
            assert!(vendor.name.chars().count() <= 30);
            assert_eq!(vendor.cn_id, cn_id);
        }
    }

    #[test]
    fn test_random_password() {
        let password = random_password();
        assert_eq!(password.len(), 20);
        assert_ne!(password, random_password());
    }
}
