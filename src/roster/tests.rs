use super::*;
use std::sync::Arc;

fn caller(id: &str) -> Caller {
    Caller::new(id.to_string(), format!("Caller {}", id))
}

#[test]
fn test_caller_status_serialization() {
    let json = serde_json::to_string(&CallerStatus::Inactive).unwrap();
    assert_eq!(json, r#""inactive""#);

    let deserialized: CallerStatus = serde_json::from_str(&json).unwrap();
    assert_eq!(deserialized, CallerStatus::Inactive);
}

#[test]
fn test_caller_status_from_str() {
    assert_eq!("ACTIVE".parse::<CallerStatus>().unwrap(), CallerStatus::Active);
    assert_eq!(
        "inactive".parse::<CallerStatus>().unwrap(),
        CallerStatus::Inactive
    );
    assert!("away".parse::<CallerStatus>().is_err());
}

#[test]
fn test_add_and_get_caller() {
    let roster = Roster::new();
    roster.add_caller(caller("a")).unwrap();

    let fetched = roster.get_caller("a").unwrap();
    assert_eq!(fetched.id, "a");
    assert!(fetched.is_active());
    assert!(roster.get_caller("missing").is_none());
}

#[test]
fn test_duplicate_caller_rejected() {
    let roster = Roster::new();
    roster.add_caller(caller("a")).unwrap();

    let result = roster.add_caller(caller("a"));
    assert!(matches!(result, Err(RosterError::DuplicateCaller(ref id)) if id == "a"));
    assert_eq!(roster.caller_count(), 1);
}

#[test]
fn test_active_callers_excludes_inactive() {
    let roster = Roster::new();
    roster.add_caller(caller("b")).unwrap();
    roster.add_caller(caller("a")).unwrap();
    roster
        .add_caller(caller("c").with_status(CallerStatus::Inactive))
        .unwrap();

    let active: Vec<String> = roster.active_callers().into_iter().map(|c| c.id).collect();
    assert_eq!(active, vec!["a".to_string(), "b".to_string()]);
    assert_eq!(roster.all_callers().len(), 3);
}

#[test]
fn test_set_status_toggles_eligibility() {
    let roster = Roster::new();
    roster.add_caller(caller("a")).unwrap();

    roster.set_status("a", CallerStatus::Inactive).unwrap();
    assert!(roster.active_callers().is_empty());
    // Inactive callers are still known to the directory
    assert!(roster.caller("a").is_some());

    roster.set_status("a", CallerStatus::Active).unwrap();
    assert_eq!(roster.active_callers().len(), 1);
}

#[test]
fn test_set_status_unknown_caller() {
    let roster = Roster::new();
    let result = roster.set_status("ghost", CallerStatus::Inactive);
    assert!(matches!(result, Err(RosterError::CallerNotFound(_))));
}

#[test]
fn test_concurrent_adds_keep_one_copy() {
    let roster = Arc::new(Roster::new());
    let handles: Vec<_> = (0..8)
        .map(|_| {
            let roster = Arc::clone(&roster);
            std::thread::spawn(move || roster.add_caller(caller("shared")).is_ok())
        })
        .collect();

    let successes = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|ok| *ok)
        .count();

    assert_eq!(successes, 1);
    assert_eq!(roster.caller_count(), 1);
}
