//! End-to-end workflow tests over the in-memory adapters.
//!
//! Wires the handlers the way an embedding service would and drives the
//! full session/case lifecycle: request, accept, reschedule, cancel,
//! add-entry branches, referrals, and availability.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};

use counsel_desk::adapters::memory::{
    InMemoryUserDirectory, MemoryStore, RecordingMailSender,
};
use counsel_desk::application::handlers::availability::{
    GetAvailableIntervalsHandler, GetAvailableIntervalsQuery, SetDayAvailabilityCommand,
    SetDayAvailabilityHandler,
};
use counsel_desk::application::handlers::case::{
    AddEntryCommand, AddEntryHandler, AddEntryOutcome, EntryPayload,
};
use counsel_desk::application::handlers::session::{
    AcceptSessionCommand, AcceptSessionHandler, CancelSessionCommand, CancelSessionHandler,
    RequestSessionCommand, RequestSessionHandler, RescheduleSessionCommand,
    RescheduleSessionHandler,
};
use counsel_desk::application::NotificationCoordinator;
use counsel_desk::domain::foundation::{
    Actor, CaseId, CaseStatus, ErrorCode, Interval, SessionId, SessionStatus, StateMachine, UserId,
    Weekday,
};
use counsel_desk::ports::{
    CaseRepository, NotificationRepository, SessionRepository, UserProfile,
};

struct TestApp {
    store: MemoryStore,
    mail: Arc<RecordingMailSender>,
    request: RequestSessionHandler,
    accept: AcceptSessionHandler,
    reschedule: RescheduleSessionHandler,
    cancel: CancelSessionHandler,
    add_entry: AddEntryHandler,
}

impl TestApp {
    fn new() -> Self {
        let store = MemoryStore::new();
        let mail = Arc::new(RecordingMailSender::new());
        let directory = Arc::new(InMemoryUserDirectory::new());
        directory.insert(UserProfile {
            id: student(),
            name: "Dana".to_string(),
            email: "dana@example.edu".to_string(),
        });
        directory.insert(UserProfile {
            id: counsellor(),
            name: "Mx. Reed".to_string(),
            email: "reed@example.edu".to_string(),
        });
        directory.insert(UserProfile {
            id: peer(),
            name: "Dr. Okafor".to_string(),
            email: "okafor@example.edu".to_string(),
        });

        let coordinator = Arc::new(NotificationCoordinator::new(
            Arc::new(store.notifications()),
            mail.clone(),
            directory,
        ));
        let sessions: Arc<dyn SessionRepository> = Arc::new(store.sessions());
        let cases: Arc<dyn CaseRepository> = Arc::new(store.cases());

        Self {
            request: RequestSessionHandler::new(
                sessions.clone(),
                cases.clone(),
                coordinator.clone(),
            ),
            accept: AcceptSessionHandler::new(sessions.clone(), cases.clone(), coordinator.clone()),
            reschedule: RescheduleSessionHandler::new(
                sessions.clone(),
                cases.clone(),
                coordinator.clone(),
            ),
            cancel: CancelSessionHandler::new(sessions.clone(), cases.clone(), coordinator.clone()),
            add_entry: AddEntryHandler::new(sessions, cases, coordinator),
            store,
            mail,
        }
    }

    async fn request_career_session(&self) -> (CaseId, SessionId) {
        let result = self
            .request
            .handle(RequestSessionCommand {
                student: student(),
                counsellor: counsellor(),
                date: may(1),
                interval: slot(10, 0),
                kind: "career".to_string(),
                description: Some("Choosing a major".to_string()),
            })
            .await
            .unwrap();
        (*result.case.id(), *result.session.id())
    }

    async fn accept_session(&self, session_id: SessionId) {
        self.accept
            .handle(AcceptSessionCommand {
                counsellor: counsellor(),
                session_id,
                platform: None,
                meeting_link: None,
            })
            .await
            .unwrap();
    }
}

fn student() -> UserId {
    UserId::new("student-1").unwrap()
}

fn counsellor() -> UserId {
    UserId::new("counsellor-1").unwrap()
}

fn peer() -> UserId {
    UserId::new("counsellor-2").unwrap()
}

fn may(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
}

fn slot(hour: u32, minute: u32) -> Interval {
    let start = NaiveTime::from_hms_opt(hour, minute, 0).unwrap();
    let end = start + chrono::Duration::minutes(30);
    Interval::new(start, end).unwrap()
}

#[tokio::test]
async fn requesting_a_session_creates_pending_pair_and_two_notifications() {
    let app = TestApp::new();
    let (case_id, session_id) = app.request_career_session().await;

    let session = app
        .store
        .sessions()
        .find_by_id(&session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.status(), SessionStatus::Pending);
    assert_eq!(session.case_id(), Some(&case_id));
    assert_eq!(session.kind(), "career");

    let case = app
        .store
        .cases()
        .find_by_id(&case_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(case.status(), CaseStatus::Pending);
    assert_eq!(case.session_ids(), &[session_id]);

    assert_eq!(app.store.notification_count(), 2);
    assert_eq!(app.mail.sent_messages().len(), 2);
}

#[tokio::test]
async fn accepting_twice_succeeds_once_then_reports_invalid_transition() {
    let app = TestApp::new();
    let (_, session_id) = app.request_career_session().await;

    let cmd = AcceptSessionCommand {
        counsellor: counsellor(),
        session_id,
        platform: None,
        meeting_link: None,
    };
    assert!(app.accept.handle(cmd.clone()).await.is_ok());

    let err = app.accept.handle(cmd).await.unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidStateTransition);
    assert_eq!(
        err.details.get("current_status"),
        Some(&"progress".to_string())
    );
}

#[tokio::test]
async fn concurrent_accepts_resolve_to_exactly_one_winner() {
    let app = Arc::new(TestApp::new());
    let (_, session_id) = app.request_career_session().await;

    let cmd = AcceptSessionCommand {
        counsellor: counsellor(),
        session_id,
        platform: None,
        meeting_link: None,
    };

    let a = {
        let app = Arc::clone(&app);
        let cmd = cmd.clone();
        tokio::spawn(async move { app.accept.handle(cmd).await })
    };
    let b = {
        let app = Arc::clone(&app);
        tokio::spawn(async move { app.accept.handle(cmd).await })
    };
    let results = [a.await.unwrap(), b.await.unwrap()];

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    let loser = results.iter().find(|r| r.is_err()).unwrap();
    assert_eq!(
        loser.as_ref().unwrap_err().code,
        ErrorCode::InvalidStateTransition
    );
}

#[tokio::test]
async fn student_cannot_reschedule_a_session_in_progress() {
    let app = TestApp::new();
    let (_, session_id) = app.request_career_session().await;
    app.accept_session(session_id).await;

    let err = app
        .reschedule
        .handle(RescheduleSessionCommand {
            actor: Actor::Student,
            session_id,
            new_date: may(8),
            new_interval: slot(14, 0),
            remark: "too early".to_string(),
        })
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidStateTransition);

    let session = app
        .store
        .sessions()
        .find_by_id(&session_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(session.status(), SessionStatus::Progress);
    assert_eq!(session.date(), may(1));
}

#[tokio::test]
async fn cancelling_tells_the_counsellor_why() {
    let app = TestApp::new();
    let (case_id, session_id) = app.request_career_session().await;

    app.cancel
        .handle(CancelSessionCommand {
            actor: Actor::Student,
            session_id,
            remark: "feeling better".to_string(),
        })
        .await
        .unwrap();

    let case = app
        .store
        .cases()
        .find_by_id(&case_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(case.status(), CaseStatus::Cancelled);

    let to_counsellor = app
        .store
        .notifications()
        .find_unread_by_recipient(&counsellor())
        .await
        .unwrap();
    assert!(to_counsellor
        .iter()
        .any(|n| n.details().contains("feeling better")));
    assert!(app
        .mail
        .messages_to("reed@example.edu")
        .iter()
        .any(|m| m.subject == "Session Cancelled"));
}

#[tokio::test]
async fn closing_a_case_records_reason_and_completes_both() {
    let app = TestApp::new();
    let (case_id, session_id) = app.request_career_session().await;
    app.accept_session(session_id).await;

    let mut payload = EntryPayload::close(session_id, may(1), "resolved");
    payload.details = Some("Settled on computer science".to_string());

    let outcome = app
        .add_entry
        .handle(AddEntryCommand {
            counsellor: counsellor(),
            case_id,
            payload,
        })
        .await
        .unwrap();

    let AddEntryOutcome::CaseClosed { case, session } = outcome else {
        panic!("expected CaseClosed");
    };
    assert_eq!(session.status(), SessionStatus::Completed);
    assert_eq!(case.status(), CaseStatus::Completed);
    assert_eq!(case.reason_for_closing(), Some("resolved"));
    assert_eq!(case.concern_raised(), Some(may(1)));
}

#[tokio::test]
async fn referral_with_session_spawns_a_new_case_for_the_same_student() {
    let app = TestApp::new();
    let (case_id, session_id) = app.request_career_session().await;
    app.accept_session(session_id).await;

    let outcome = app
        .add_entry
        .handle(AddEntryCommand {
            counsellor: counsellor(),
            case_id,
            payload: EntryPayload::refer_with_session(session_id, peer(), may(1)),
        })
        .await
        .unwrap();

    let AddEntryOutcome::Referred {
        original_case,
        new_case,
        new_session,
        ..
    } = outcome
    else {
        panic!("expected Referred");
    };

    assert_eq!(original_case.status(), CaseStatus::Referred);
    assert!(original_case.status().is_terminal());
    assert_eq!(new_case.student(), &student());
    assert_eq!(new_case.session_ids(), &[*new_session.id()]);
    assert_eq!(new_session.counsellor(), &peer());
    assert_eq!(new_session.status(), SessionStatus::Pending);

    // The new counsellor is notified and emailed.
    assert!(!app
        .store
        .notifications()
        .find_unread_by_recipient(&peer())
        .await
        .unwrap()
        .is_empty());
    assert!(!app.mail.messages_to("okafor@example.edu").is_empty());

    // The referred case accepts no further sessions.
    let err = app
        .add_entry
        .handle(AddEntryCommand {
            counsellor: peer(),
            case_id,
            payload: EntryPayload::follow_up(*new_session.id(), may(8), slot(9, 0)),
        })
        .await
        .unwrap_err();
    assert_eq!(err.code, ErrorCode::ValidationFailed);
}

#[tokio::test]
async fn feedback_referral_keeps_the_case_and_grows_the_referral_list() {
    let app = TestApp::new();
    let (case_id, session_id) = app.request_career_session().await;
    app.accept_session(session_id).await;

    let before = app
        .store
        .cases()
        .find_by_id(&case_id)
        .await
        .unwrap()
        .unwrap();

    let mut payload = EntryPayload::request_feedback(session_id, peer());
    payload.remarks = Some("Second opinion please".to_string());

    let outcome = app
        .add_entry
        .handle(AddEntryCommand {
            counsellor: counsellor(),
            case_id,
            payload,
        })
        .await
        .unwrap();

    let AddEntryOutcome::FeedbackRequested { case, .. } = outcome else {
        panic!("expected FeedbackRequested");
    };
    assert_eq!(case.status(), before.status());
    assert_eq!(case.referrals().len(), before.referrals().len() + 1);
    assert_eq!(case.student(), &student());

    let to_peer = app
        .store
        .notifications()
        .find_unread_by_recipient(&peer())
        .await
        .unwrap();
    assert_eq!(to_peer.len(), 1);
    assert!(app
        .mail
        .messages_to("okafor@example.edu")
        .iter()
        .any(|m| m.subject == "Feedback Requested"));
}

#[tokio::test]
async fn follow_up_entries_keep_the_session_list_growing() {
    let app = TestApp::new();
    let (case_id, first_session) = app.request_career_session().await;
    app.accept_session(first_session).await;

    let outcome = app
        .add_entry
        .handle(AddEntryCommand {
            counsellor: counsellor(),
            case_id,
            payload: EntryPayload::follow_up(first_session, may(8), slot(10, 0)),
        })
        .await
        .unwrap();
    let AddEntryOutcome::FollowUpCreated { new_session, .. } = outcome else {
        panic!("expected FollowUpCreated");
    };

    let outcome = app
        .add_entry
        .handle(AddEntryCommand {
            counsellor: counsellor(),
            case_id,
            payload: EntryPayload::follow_up(*new_session.id(), may(15), slot(10, 0)),
        })
        .await
        .unwrap();
    let AddEntryOutcome::FollowUpCreated { case, new_session, .. } = outcome else {
        panic!("expected FollowUpCreated");
    };

    assert_eq!(case.session_count(), 3);
    assert_eq!(case.session_ids()[2], *new_session.id());
    assert_eq!(new_session.code().unwrap().as_str(), "CS_001/SC_03");
}

#[tokio::test]
async fn duplicate_request_is_rejected_but_new_slot_is_fine() {
    let app = TestApp::new();
    app.request_career_session().await;

    let duplicate = app
        .request
        .handle(RequestSessionCommand {
            student: student(),
            counsellor: counsellor(),
            date: may(1),
            interval: slot(10, 0),
            kind: "career".to_string(),
            description: None,
        })
        .await
        .unwrap_err();
    assert_eq!(duplicate.code, ErrorCode::DuplicateRequest);

    assert!(app
        .request
        .handle(RequestSessionCommand {
            student: student(),
            counsellor: counsellor(),
            date: may(2),
            interval: slot(10, 0),
            kind: "career".to_string(),
            description: None,
        })
        .await
        .is_ok());
}

#[tokio::test]
async fn availability_shrinks_as_sessions_claim_slots() {
    let app = TestApp::new();

    let set = SetDayAvailabilityHandler::new(Arc::new(app.store.availability()));
    set.handle(SetDayAvailabilityCommand {
        counsellor: counsellor(),
        weekday: Weekday::Wednesday,
        intervals: vec![slot(9, 0), slot(10, 0), slot(11, 0)],
    })
    .await
    .unwrap();

    // 2024-05-01 is a Wednesday.
    app.request_career_session().await;

    let get = GetAvailableIntervalsHandler::new(
        Arc::new(app.store.availability()),
        Arc::new(app.store.sessions()),
    );
    let open = get
        .handle(GetAvailableIntervalsQuery {
            counsellor: counsellor(),
            weekday: Weekday::Wednesday,
            date: may(1),
        })
        .await
        .unwrap();

    assert_eq!(open, vec![slot(9, 0), slot(11, 0)]);
}

#[tokio::test]
async fn case_sequence_codes_advance_across_cases() {
    let app = TestApp::new();
    let (first_case, _) = app.request_career_session().await;

    let second = app
        .request
        .handle(RequestSessionCommand {
            student: UserId::new("student-2").unwrap(),
            counsellor: counsellor(),
            date: may(2),
            interval: slot(9, 0),
            kind: "academic".to_string(),
            description: None,
        })
        .await
        .unwrap();

    let first = app
        .store
        .cases()
        .find_by_id(&first_case)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(first.code().as_str(), "CS_001");
    assert_eq!(second.case.code().as_str(), "CS_002");
    assert_eq!(second.session.code().unwrap().as_str(), "CS_002/SC_01");
}
