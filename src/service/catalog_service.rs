//! Equipment catalog use cases
//!
//! Plain create/read/update/delete over profiles, projectiles and stored
//! sighting systems. Raw numbers come in, validated domain records go out.

use super::error::{ServiceError, ServiceResult};
use super::load_all;
use crate::domain::{
    Length, Magnification, Mass, Profile, ProfileCategory, Projectile, SightingSystem,
    SightingSystemType,
};
use crate::storage::{DataLayout, JsonRepository, RecordStore};
use std::sync::Arc;

/// Input for a new profile
#[derive(Debug, Clone)]
pub struct NewProfile {
    pub name: String,
    pub category: ProfileCategory,
    pub barrel_length_mm: f64,
    pub trigger_weight_g: f64,
    pub sight_height_mm: f64,
}

/// Input for a new optic or open sights
#[derive(Debug, Clone)]
pub struct NewOptic {
    pub kind: SightingSystemType,
    pub model_name: String,
    pub weight_g: f64,
    pub min_magnification: f64,
    pub max_magnification: f64,
}

impl NewOptic {
    fn build(self) -> ServiceResult<SightingSystem> {
        Ok(SightingSystem::new(
            self.kind,
            self.model_name,
            Mass::new(self.weight_g)?,
            Magnification::new(self.min_magnification)?,
            Magnification::new(self.max_magnification)?,
        )?)
    }
}

/// Input for a new projectile
#[derive(Debug, Clone)]
pub struct NewProjectile {
    pub name: String,
    pub weight_g: f64,
    pub bc: f64,
}

#[derive(Clone)]
pub struct CatalogService {
    profiles: Arc<dyn RecordStore<Profile>>,
    projectiles: Arc<dyn RecordStore<Projectile>>,
    sights: Arc<dyn RecordStore<SightingSystem>>,
}

impl CatalogService {
    pub fn new(
        profiles: Arc<dyn RecordStore<Profile>>,
        projectiles: Arc<dyn RecordStore<Projectile>>,
        sights: Arc<dyn RecordStore<SightingSystem>>,
    ) -> Self {
        Self {
            profiles,
            projectiles,
            sights,
        }
    }

    pub fn open(layout: &DataLayout) -> Self {
        Self::new(
            Arc::new(JsonRepository::<Profile>::new(layout.profiles_dir())),
            Arc::new(JsonRepository::<Projectile>::new(layout.projectiles_dir())),
            Arc::new(JsonRepository::<SightingSystem>::new(layout.sights_dir())),
        )
    }

    // ============================================
    // PROFILES
    // ============================================

    pub fn create_profile(&self, input: NewProfile) -> ServiceResult<Profile> {
        let profile = Profile::new(
            input.name,
            input.category,
            Length::new(input.barrel_length_mm)?,
            Mass::new(input.trigger_weight_g)?,
            Length::new(input.sight_height_mm)?,
        )?;

        self.profiles.save(&profile)?;
        tracing::info!(profile_id = %profile.id, name = %profile.name, "Created profile");
        Ok(profile)
    }

    pub fn load_profile(&self, id: &str) -> ServiceResult<Profile> {
        Ok(self.profiles.load(id)?)
    }

    /// Sorted by name; unreadable records are skipped
    pub fn list_profiles(&self) -> ServiceResult<Vec<Profile>> {
        let mut profiles = load_all(self.profiles.as_ref())?;
        profiles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(profiles)
    }

    pub fn delete_profile(&self, id: &str) -> ServiceResult<()> {
        self.profiles.delete(id)?;
        tracing::info!(profile_id = id, "Deleted profile");
        Ok(())
    }

    pub fn rename_profile(&self, id: &str, name: &str) -> ServiceResult<Profile> {
        self.update_profile(id, |profile| Ok(profile.rename(name)?))
    }

    /// Mount a new optic built from `input`
    pub fn set_optic(&self, profile_id: &str, input: NewOptic) -> ServiceResult<Profile> {
        let optic = input.build()?;
        self.update_profile(profile_id, |profile| {
            profile.set_optic(optic);
            Ok(())
        })
    }

    /// Mount a copy of a stored sighting system
    pub fn mount_sight(&self, profile_id: &str, sight_id: &str) -> ServiceResult<Profile> {
        let sight = self.sights.load(sight_id)?;
        self.update_profile(profile_id, |profile| {
            profile.set_optic(sight);
            Ok(())
        })
    }

    pub fn remove_optic(&self, profile_id: &str) -> ServiceResult<Profile> {
        self.update_profile(profile_id, |profile| {
            profile.remove_optic();
            Ok(())
        })
    }

    pub fn set_twist_rate(&self, profile_id: &str, twist_rate_mm: f64) -> ServiceResult<Profile> {
        let twist_rate = Length::new(twist_rate_mm)?;
        self.update_profile(profile_id, |profile| {
            profile.set_twist_rate(twist_rate);
            Ok(())
        })
    }

    /// The projectile must exist
    pub fn set_default_ammo(&self, profile_id: &str, projectile_id: &str) -> ServiceResult<Profile> {
        if !self.projectiles.exists(projectile_id) {
            return Err(ServiceError::NotFound {
                kind: "projectile",
                id: projectile_id.to_string(),
            });
        }
        self.update_profile(profile_id, |profile| {
            profile.set_default_ammo(projectile_id);
            Ok(())
        })
    }

    fn update_profile<F>(&self, id: &str, apply: F) -> ServiceResult<Profile>
    where
        F: FnOnce(&mut Profile) -> ServiceResult<()>,
    {
        let mut profile = self.profiles.load(id)?;
        apply(&mut profile)?;
        self.profiles.save(&profile)?;
        Ok(profile)
    }

    // ============================================
    // PROJECTILES
    // ============================================

    pub fn create_projectile(&self, input: NewProjectile) -> ServiceResult<Projectile> {
        let projectile = Projectile::new(input.name, Mass::new(input.weight_g)?, input.bc)?;
        self.projectiles.save(&projectile)?;
        tracing::info!(
            projectile_id = %projectile.id,
            name = %projectile.name,
            "Created projectile"
        );
        Ok(projectile)
    }

    pub fn load_projectile(&self, id: &str) -> ServiceResult<Projectile> {
        Ok(self.projectiles.load(id)?)
    }

    pub fn list_projectiles(&self) -> ServiceResult<Vec<Projectile>> {
        let mut projectiles = load_all(self.projectiles.as_ref())?;
        projectiles.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(projectiles)
    }

    /// Existing sessions keep the BC they were created with
    pub fn update_bc(&self, id: &str, bc: f64) -> ServiceResult<Projectile> {
        let mut projectile = self.projectiles.load(id)?;
        projectile.update_bc(bc)?;
        self.projectiles.save(&projectile)?;
        Ok(projectile)
    }

    pub fn rename_projectile(&self, id: &str, name: &str) -> ServiceResult<Projectile> {
        let mut projectile = self.projectiles.load(id)?;
        projectile.rename(name)?;
        self.projectiles.save(&projectile)?;
        Ok(projectile)
    }

    pub fn delete_projectile(&self, id: &str) -> ServiceResult<()> {
        self.projectiles.delete(id)?;
        tracing::info!(projectile_id = id, "Deleted projectile");
        Ok(())
    }

    // ============================================
    // SIGHTS
    // ============================================

    pub fn create_sight(&self, input: NewOptic) -> ServiceResult<SightingSystem> {
        let sight = input.build()?;
        self.sights.save(&sight)?;
        tracing::info!(sight_id = %sight.id, model = %sight.model_name, "Created sight");
        Ok(sight)
    }

    pub fn load_sight(&self, id: &str) -> ServiceResult<SightingSystem> {
        Ok(self.sights.load(id)?)
    }

    pub fn list_sights(&self) -> ServiceResult<Vec<SightingSystem>> {
        let mut sights = load_all(self.sights.as_ref())?;
        sights.sort_by(|a, b| a.model_name.cmp(&b.model_name));
        Ok(sights)
    }

    pub fn delete_sight(&self, id: &str) -> ServiceResult<()> {
        self.sights.delete(id)?;
        Ok(())
    }
}
