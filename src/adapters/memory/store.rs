//! Shared in-memory store and the repositories over it.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use crate::domain::availability::DayAvailability;
use crate::domain::case::Case;
use crate::domain::foundation::{
    CaseId, DomainError, ErrorCode, NotificationId, SessionId, SessionStatus, UserId, Weekday,
};
use crate::domain::notification::Notification;
use crate::domain::session::Session;
use crate::ports::{
    AvailabilityRepository, CaseRepository, NotificationRepository, SessionRepository,
};

#[derive(Default)]
struct MemoryDb {
    sessions: HashMap<SessionId, Session>,
    cases: HashMap<CaseId, Case>,
    notifications: HashMap<NotificationId, Notification>,
    availability: HashMap<(UserId, Weekday), DayAvailability>,
    case_sequence: u32,
}

/// One shared in-memory database.
///
/// Cloning is cheap; all clones see the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<MemoryDb>>,
}

impl MemoryStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a session repository over this store.
    pub fn sessions(&self) -> InMemorySessionRepository {
        InMemorySessionRepository {
            store: self.clone(),
        }
    }

    /// Returns a case repository over this store.
    pub fn cases(&self) -> InMemoryCaseRepository {
        InMemoryCaseRepository {
            store: self.clone(),
        }
    }

    /// Returns a notification repository over this store.
    pub fn notifications(&self) -> InMemoryNotificationRepository {
        InMemoryNotificationRepository {
            store: self.clone(),
        }
    }

    /// Returns an availability repository over this store.
    pub fn availability(&self) -> InMemoryAvailabilityRepository {
        InMemoryAvailabilityRepository {
            store: self.clone(),
        }
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, MemoryDb> {
        self.inner.read().expect("MemoryStore: lock poisoned")
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, MemoryDb> {
        self.inner.write().expect("MemoryStore: write lock poisoned")
    }

    // === Test Helpers ===

    /// Returns the number of stored notifications.
    pub fn notification_count(&self) -> usize {
        self.read().notifications.len()
    }
}

/// In-memory implementation of [`SessionRepository`].
#[derive(Clone)]
pub struct InMemorySessionRepository {
    store: MemoryStore,
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn save(&self, session: &Session) -> Result<(), DomainError> {
        let mut db = self.store.write();
        if db.sessions.contains_key(session.id()) {
            return Err(DomainError::new(
                ErrorCode::DatabaseError,
                format!("Session already exists: {}", session.id()),
            ));
        }
        db.sessions.insert(*session.id(), session.clone());
        Ok(())
    }

    async fn update(&self, session: &Session) -> Result<(), DomainError> {
        let mut db = self.store.write();
        if !db.sessions.contains_key(session.id()) {
            return Err(DomainError::new(
                ErrorCode::SessionNotFound,
                format!("Session not found: {}", session.id()),
            ));
        }
        db.sessions.insert(*session.id(), session.clone());
        Ok(())
    }

    async fn update_guarded(
        &self,
        session: &Session,
        expected: SessionStatus,
    ) -> Result<(), DomainError> {
        // Check-and-swap under one write lock; this is the adapter's
        // equivalent of the store's conditional UPDATE.
        let mut db = self.store.write();
        let stored = db.sessions.get(session.id()).ok_or_else(|| {
            DomainError::new(
                ErrorCode::SessionNotFound,
                format!("Session not found: {}", session.id()),
            )
        })?;
        if stored.status() != expected {
            return Err(DomainError::invalid_transition(
                stored.status(),
                format!("Session {} is no longer {}", session.id(), expected),
            ));
        }
        db.sessions.insert(*session.id(), session.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &SessionId) -> Result<Option<Session>, DomainError> {
        Ok(self.store.read().sessions.get(id).cloned())
    }

    async fn find_by_student(&self, student: &UserId) -> Result<Vec<Session>, DomainError> {
        let mut sessions: Vec<Session> = self
            .store
            .read()
            .sessions
            .values()
            .filter(|s| s.student() == student)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.created_at().cmp(a.created_at()));
        Ok(sessions)
    }

    async fn find_by_counsellor(&self, counsellor: &UserId) -> Result<Vec<Session>, DomainError> {
        let mut sessions: Vec<Session> = self
            .store
            .read()
            .sessions
            .values()
            .filter(|s| s.counsellor() == counsellor)
            .cloned()
            .collect();
        sessions.sort_by(|a, b| b.created_at().cmp(a.created_at()));
        Ok(sessions)
    }

    async fn find_by_case(&self, case_id: &CaseId) -> Result<Vec<Session>, DomainError> {
        let mut sessions: Vec<Session> = self
            .store
            .read()
            .sessions
            .values()
            .filter(|s| s.case_id() == Some(case_id))
            .cloned()
            .collect();
        sessions.sort_by(|a, b| a.created_at().cmp(b.created_at()));
        Ok(sessions)
    }

    async fn find_active_by_counsellor_on_date(
        &self,
        counsellor: &UserId,
        date: NaiveDate,
    ) -> Result<Vec<Session>, DomainError> {
        Ok(self
            .store
            .read()
            .sessions
            .values()
            .filter(|s| s.counsellor() == counsellor && s.date() == date && s.status().is_active())
            .cloned()
            .collect())
    }

    async fn delete(&self, id: &SessionId) -> Result<(), DomainError> {
        let mut db = self.store.write();
        if db.sessions.remove(id).is_none() {
            return Err(DomainError::new(
                ErrorCode::SessionNotFound,
                format!("Session not found: {}", id),
            ));
        }
        Ok(())
    }
}

/// In-memory implementation of [`CaseRepository`].
#[derive(Clone)]
pub struct InMemoryCaseRepository {
    store: MemoryStore,
}

#[async_trait]
impl CaseRepository for InMemoryCaseRepository {
    async fn save(&self, case: &Case) -> Result<(), DomainError> {
        let mut db = self.store.write();
        if db.cases.contains_key(case.id()) {
            return Err(DomainError::new(
                ErrorCode::DatabaseError,
                format!("Case already exists: {}", case.id()),
            ));
        }
        db.cases.insert(*case.id(), case.clone());
        Ok(())
    }

    async fn update(&self, case: &Case) -> Result<(), DomainError> {
        let mut db = self.store.write();
        if !db.cases.contains_key(case.id()) {
            return Err(DomainError::new(
                ErrorCode::CaseNotFound,
                format!("Case not found: {}", case.id()),
            ));
        }
        db.cases.insert(*case.id(), case.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &CaseId) -> Result<Option<Case>, DomainError> {
        Ok(self.store.read().cases.get(id).cloned())
    }

    async fn find_by_student(&self, student: &UserId) -> Result<Vec<Case>, DomainError> {
        let mut cases: Vec<Case> = self
            .store
            .read()
            .cases
            .values()
            .filter(|c| c.student() == student)
            .cloned()
            .collect();
        cases.sort_by(|a, b| b.created_at().cmp(a.created_at()));
        Ok(cases)
    }

    async fn find_by_counsellor(&self, counsellor: &UserId) -> Result<Vec<Case>, DomainError> {
        let db = self.store.read();
        let mut cases: Vec<Case> = db
            .cases
            .values()
            .filter(|case| {
                case.session_ids().iter().any(|session_id| {
                    db.sessions
                        .get(session_id)
                        .is_some_and(|s| s.counsellor() == counsellor)
                })
            })
            .cloned()
            .collect();
        cases.sort_by(|a, b| b.created_at().cmp(a.created_at()));
        Ok(cases)
    }

    async fn count_for_student(&self, student: &UserId) -> Result<u32, DomainError> {
        Ok(self
            .store
            .read()
            .cases
            .values()
            .filter(|c| c.student() == student)
            .count() as u32)
    }

    async fn count_for_counsellor(&self, counsellor: &UserId) -> Result<u32, DomainError> {
        let db = self.store.read();
        let count = db
            .cases
            .values()
            .filter(|case| {
                case.session_ids().iter().any(|session_id| {
                    db.sessions
                        .get(session_id)
                        .is_some_and(|s| s.counsellor() == counsellor)
                })
            })
            .count();
        Ok(count as u32)
    }

    async fn next_sequence_number(&self) -> Result<u32, DomainError> {
        let mut db = self.store.write();
        db.case_sequence += 1;
        Ok(db.case_sequence)
    }

    async fn delete(&self, id: &CaseId) -> Result<(), DomainError> {
        let mut db = self.store.write();
        if db.cases.remove(id).is_none() {
            return Err(DomainError::new(
                ErrorCode::CaseNotFound,
                format!("Case not found: {}", id),
            ));
        }
        Ok(())
    }
}

/// In-memory implementation of [`NotificationRepository`].
#[derive(Clone)]
pub struct InMemoryNotificationRepository {
    store: MemoryStore,
}

#[async_trait]
impl NotificationRepository for InMemoryNotificationRepository {
    async fn save(&self, notification: &Notification) -> Result<(), DomainError> {
        let mut db = self.store.write();
        db.notifications
            .insert(*notification.id(), notification.clone());
        Ok(())
    }

    async fn update(&self, notification: &Notification) -> Result<(), DomainError> {
        let mut db = self.store.write();
        if !db.notifications.contains_key(notification.id()) {
            return Err(DomainError::new(
                ErrorCode::NotificationNotFound,
                format!("Notification not found: {}", notification.id()),
            ));
        }
        db.notifications
            .insert(*notification.id(), notification.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &NotificationId) -> Result<Option<Notification>, DomainError> {
        Ok(self.store.read().notifications.get(id).cloned())
    }

    async fn find_unread_by_recipient(
        &self,
        recipient: &UserId,
    ) -> Result<Vec<Notification>, DomainError> {
        let mut notifications: Vec<Notification> = self
            .store
            .read()
            .notifications
            .values()
            .filter(|n| n.recipient() == recipient && !n.is_read())
            .cloned()
            .collect();
        notifications.sort_by(|a, b| b.created_at().cmp(a.created_at()));
        Ok(notifications)
    }
}

/// In-memory implementation of [`AvailabilityRepository`].
#[derive(Clone)]
pub struct InMemoryAvailabilityRepository {
    store: MemoryStore,
}

#[async_trait]
impl AvailabilityRepository for InMemoryAvailabilityRepository {
    async fn upsert_day(&self, day: &DayAvailability) -> Result<(), DomainError> {
        let mut db = self.store.write();
        db.availability
            .insert((day.counsellor().clone(), day.weekday()), day.clone());
        Ok(())
    }

    async fn find_day(
        &self,
        counsellor: &UserId,
        weekday: Weekday,
    ) -> Result<Option<DayAvailability>, DomainError> {
        Ok(self
            .store
            .read()
            .availability
            .get(&(counsellor.clone(), weekday))
            .cloned())
    }

    async fn find_by_counsellor(
        &self,
        counsellor: &UserId,
    ) -> Result<Vec<DayAvailability>, DomainError> {
        let db = self.store.read();
        Ok(Weekday::all()
            .into_iter()
            .filter_map(|weekday| db.availability.get(&(counsellor.clone(), weekday)).cloned())
            .collect())
    }

    async fn delete_day(&self, counsellor: &UserId, weekday: Weekday) -> Result<(), DomainError> {
        self.store
            .write()
            .availability
            .remove(&(counsellor.clone(), weekday));
        Ok(())
    }
}
