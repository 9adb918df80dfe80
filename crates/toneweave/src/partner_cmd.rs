//! Partner and relationship management: `tone partner add` and `tone relate`.
//!
//! Minimal write surface so a deployment can register who a user talks to
//! and how. A partner without a relationship record is addressed with the
//! default descriptor (polite acquaintance).

use anyhow::{bail, Result};

use toneweave_core::models::{
    PolitenessLevel, RelationshipCategory, RelationshipDescriptor, VibeType,
};
use toneweave_core::store::{PartnerProfile, Store};

use crate::config::Config;
use crate::db;
use crate::sqlite_store::SqliteStore;

pub async fn run_partner_add(config: &Config, name: &str, id: Option<&str>) -> Result<()> {
    let store = SqliteStore::new(db::connect(config).await?);

    let partner = PartnerProfile {
        id: id
            .map(|s| s.to_string())
            .unwrap_or_else(|| uuid::Uuid::new_v4().to_string()),
        name: name.to_string(),
    };
    store.upsert_partner(&partner).await?;

    println!("partner added");
    println!("  id: {}", partner.id);
    println!("  name: {}", partner.name);
    Ok(())
}

pub async fn run_relate(
    config: &Config,
    user_id: &str,
    partner_id: &str,
    category: &str,
    politeness: Option<&str>,
    vibe: Option<&str>,
) -> Result<()> {
    let category = RelationshipCategory::from_tag(category)
        .ok_or_else(|| anyhow::anyhow!("Unknown relationship category: {}", category))?;
    let politeness = match politeness {
        Some(tag) => PolitenessLevel::from_tag(tag)
            .ok_or_else(|| anyhow::anyhow!("Unknown politeness level: {}", tag))?,
        None => PolitenessLevel::Polite,
    };
    let vibe = match vibe {
        Some(tag) => {
            VibeType::from_tag(tag).ok_or_else(|| anyhow::anyhow!("Unknown vibe: {}", tag))?
        }
        None => VibeType::Calm,
    };

    let store = SqliteStore::new(db::connect(config).await?);

    if store.get_user(user_id).await?.is_none() {
        bail!("user not found: {}", user_id);
    }
    if store.get_partner(partner_id).await?.is_none() {
        bail!("partner not found: {}", partner_id);
    }

    store
        .upsert_relationship(
            user_id,
            partner_id,
            &RelationshipDescriptor {
                category,
                politeness,
                vibe,
            },
        )
        .await?;

    println!(
        "relationship set: {} -> {} ({}, {}, {})",
        user_id,
        partner_id,
        category.tag(),
        politeness.tag(),
        vibe.tag()
    );
    Ok(())
}
