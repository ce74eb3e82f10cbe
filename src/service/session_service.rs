//! Session use cases
//!
//! Every mutating call follows the same cycle: load the session, apply one
//! domain operation, save it back and return the updated view.

use super::dto::{SessionSummary, SessionView};
use super::error::{ServiceError, ServiceResult};
use super::load_all;
use crate::domain::{
    DomainError, Profile, Projectile, Session, StatisticsReport, Temperature, Velocity,
};
use crate::storage::{DataLayout, JsonRepository, RecordStore};
use std::sync::Arc;

/// Orchestrates session creation, shot recording and statistics
#[derive(Clone)]
pub struct SessionService {
    sessions: Arc<dyn RecordStore<Session>>,
    profiles: Arc<dyn RecordStore<Profile>>,
    projectiles: Arc<dyn RecordStore<Projectile>>,
}

impl SessionService {
    pub fn new(
        sessions: Arc<dyn RecordStore<Session>>,
        profiles: Arc<dyn RecordStore<Profile>>,
        projectiles: Arc<dyn RecordStore<Projectile>>,
    ) -> Self {
        Self {
            sessions,
            profiles,
            projectiles,
        }
    }

    /// JSON-file stores below the given data directory
    pub fn open(layout: &DataLayout) -> Self {
        Self::new(
            Arc::new(JsonRepository::<Session>::new(layout.sessions_dir())),
            Arc::new(JsonRepository::<Profile>::new(layout.profiles_dir())),
            Arc::new(JsonRepository::<Projectile>::new(layout.projectiles_dir())),
        )
    }

    /// Start a new series, freezing the current profile and projectile records
    pub fn create_session(
        &self,
        profile_id: &str,
        projectile_id: &str,
        temperature_celsius: Option<f64>,
        note: Option<&str>,
    ) -> ServiceResult<SessionView> {
        require_id(profile_id, "Profile id")?;
        require_id(projectile_id, "Projectile id")?;

        let profile = self.profiles.load(profile_id)?;
        let projectile = self.projectiles.load(projectile_id)?;
        let temperature = temperature_celsius.map(Temperature::new).transpose()?;

        let mut session = Session::new(&profile, &projectile);
        session.set_temperature(temperature);
        if let Some(note) = note {
            session.set_note(note);
        }

        self.sessions.save(&session)?;
        tracing::info!(
            session_id = session.id(),
            profile = %profile.name,
            projectile = %projectile.name,
            "Created session"
        );

        Ok(SessionView::from(&session))
    }

    /// Append one reading
    pub fn record_shot(&self, session_id: &str, velocity_mps: f64) -> ServiceResult<SessionView> {
        require_id(session_id, "Session id")?;
        let velocity = Velocity::new(velocity_mps)?;

        self.update(session_id, |session| {
            session.record_shot(velocity);
            tracing::info!(
                session_id = session.id(),
                velocity_mps,
                shot_count = session.shot_count(),
                "Recorded shot"
            );
            Ok(())
        })
    }

    /// Flag the shot at `index` (0-based, insertion order) as a bad reading
    pub fn mark_shot_invalid(&self, session_id: &str, index: i64) -> ServiceResult<SessionView> {
        self.update(session_id, |session| {
            let index = shot_index(session, index)?;
            session.mark_shot_invalid(index)?;
            tracing::info!(session_id = session.id(), index, "Marked shot invalid");
            Ok(())
        })
    }

    /// Undo a previous invalidation
    pub fn mark_shot_valid(&self, session_id: &str, index: i64) -> ServiceResult<SessionView> {
        self.update(session_id, |session| {
            let index = shot_index(session, index)?;
            session.mark_shot_valid(index)?;
            tracing::info!(session_id = session.id(), index, "Marked shot valid");
            Ok(())
        })
    }

    pub fn get_statistics(&self, session_id: &str) -> ServiceResult<StatisticsReport> {
        Ok(self.load(session_id)?.statistics())
    }

    pub fn load_session(&self, session_id: &str) -> ServiceResult<SessionView> {
        Ok(SessionView::from(&self.load(session_id)?))
    }

    /// All readable sessions, newest first; unreadable ones are skipped
    pub fn list_sessions(&self) -> ServiceResult<Vec<SessionSummary>> {
        let mut summaries: Vec<SessionSummary> = load_all(self.sessions.as_ref())?
            .iter()
            .map(SessionSummary::from)
            .collect();

        summaries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(summaries)
    }

    pub fn delete_session(&self, session_id: &str) -> ServiceResult<()> {
        require_id(session_id, "Session id")?;
        self.sessions.delete(session_id)?;
        tracing::info!(session_id, "Deleted session");
        Ok(())
    }

    /// Replace the note; an empty note clears it
    pub fn update_note(&self, session_id: &str, note: &str) -> ServiceResult<SessionView> {
        self.update(session_id, |session| {
            session.set_note(note);
            Ok(())
        })
    }

    /// Set or clear the ambient temperature
    pub fn set_temperature(
        &self,
        session_id: &str,
        temperature_celsius: Option<f64>,
    ) -> ServiceResult<SessionView> {
        let temperature = temperature_celsius.map(Temperature::new).transpose()?;
        self.update(session_id, |session| {
            session.set_temperature(temperature);
            Ok(())
        })
    }

    fn load(&self, session_id: &str) -> ServiceResult<Session> {
        require_id(session_id, "Session id")?;
        Ok(self.sessions.load(session_id)?)
    }

    /// Load, mutate, save. Nothing is written when `apply` fails.
    fn update<F>(&self, session_id: &str, apply: F) -> ServiceResult<SessionView>
    where
        F: FnOnce(&mut Session) -> ServiceResult<()>,
    {
        let mut session = self.load(session_id)?;
        apply(&mut session)?;
        self.sessions.save(&session)?;
        Ok(SessionView::from(&session))
    }
}

fn require_id(id: &str, what: &str) -> ServiceResult<()> {
    if id.trim().is_empty() {
        return Err(ServiceError::Validation(format!("{} cannot be empty", what)));
    }
    Ok(())
}

/// Negative indices are representable at this boundary and always out of range
fn shot_index(session: &Session, index: i64) -> ServiceResult<usize> {
    usize::try_from(index).map_err(|_| {
        ServiceError::Domain(DomainError::ShotIndexOutOfRange {
            index,
            len: session.shot_count(),
        })
    })
}
