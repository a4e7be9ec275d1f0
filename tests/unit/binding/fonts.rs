use super::*;
use std::time::Duration;

#[test]
fn a_family_in_flight_is_not_requested_twice() {
    let mut reg = FontRegistry::new();
    let (t1, d1) = reg.begin("I_a", "Roboto");
    let (t2, d2) = reg.begin("I_b", "Roboto");
    assert!(d1);
    assert!(!d2);
    assert!(t2 > t1);
    assert!(reg.is_in_flight("Roboto"));

    let settled = reg.settle("Roboto", true);
    assert_eq!(
        settled,
        vec![("I_a".to_owned(), t1), ("I_b".to_owned(), t2)]
    );
    assert!(reg.is_loaded("Roboto"));
    assert!(!reg.is_in_flight("Roboto"));
}

#[test]
fn a_newer_request_makes_the_older_completion_stale() {
    let mut reg = FontRegistry::new();
    let (_, _) = reg.begin("I_a", "Roboto");
    let (t2, _) = reg.begin("I_a", "Lato");
    assert_eq!(reg.pending_token("I_a"), Some(t2));

    assert!(reg.settle("Roboto", true).is_empty());
    assert_eq!(reg.pending_token("I_a"), Some(t2));
    assert_eq!(reg.settle("Lato", false), vec![("I_a".to_owned(), t2)]);
    assert!(!reg.is_loaded("Lato"));
    assert_eq!(reg.pending_token("I_a"), None);
}

#[test]
fn forgetting_and_clearing_drop_pending_requests() {
    let mut reg = FontRegistry::new();
    reg.mark_loaded("Arial");
    reg.begin("I_a", "Roboto");
    reg.begin("I_b", "Lato");
    reg.forget("I_a");
    assert_eq!(reg.pending_token("I_a"), None);
    reg.clear_pending();
    assert_eq!(reg.pending_token("I_b"), None);
    assert!(reg.is_loaded("Arial"));
}

#[test]
fn noop_service_reports_inactive() {
    let (tx, rx) = mpsc::channel();
    NoopFontService.load(
        FontRequest {
            family: "Roboto".into(),
            token: FontRequestToken(9),
        },
        tx,
    );
    let ev = rx.recv_timeout(Duration::from_secs(1)).unwrap();
    assert_eq!(ev.token, FontRequestToken(9));
    assert!(!ev.is_active());
}

#[test]
fn directory_service_reads_font_files_in_the_background() {
    let dir = std::env::temp_dir().join(format!("layerstage-fonts-{}", std::process::id()));
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(dir.join("OpenSans.otf"), b"not really a font").unwrap();

    let svc = DirectoryFontService::new(&dir);
    let (tx, rx) = mpsc::channel();
    svc.load(
        FontRequest {
            family: "Open Sans".into(),
            token: FontRequestToken(1),
        },
        tx.clone(),
    );
    svc.load(
        FontRequest {
            family: "Missing".into(),
            token: FontRequestToken(2),
        },
        tx.clone(),
    );
    svc.load(
        FontRequest {
            family: "../etc".into(),
            token: FontRequestToken(3),
        },
        tx,
    );

    let mut events: Vec<FontEvent> = (0..3)
        .map(|_| rx.recv_timeout(Duration::from_secs(10)).unwrap())
        .collect();
    events.sort_by_key(|e| e.token);
    assert_eq!(
        events[0].outcome,
        FontOutcome::Active(b"not really a font".to_vec())
    );
    assert!(!events[1].is_active());
    assert!(!events[2].is_active());

    let _ = std::fs::remove_dir_all(&dir);
}
