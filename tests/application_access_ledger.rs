//! 访问码台账服务测试

use std::sync::Arc;

use access_ledger::{
    AccessCode, AccessLedger, Ledger, LedgerStore, ManualClock, MemoryStore, VerifyReason,
};
use chrono::{DateTime, Duration, TimeZone, Utc};

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 16, 12, 0, 0).unwrap()
}

fn seeded_store(code: &str, expiration: DateTime<Utc>) -> Arc<MemoryStore> {
    let mut ledger = Ledger::new();
    ledger.push_code(AccessCode {
        code: code.to_string(),
        expiration,
        used: false,
    });
    Arc::new(MemoryStore::with_ledger(ledger))
}

fn create_ledger(store: Arc<MemoryStore>) -> (AccessLedger, Arc<ManualClock>) {
    let clock = Arc::new(ManualClock::new(t0()));
    let ledger = AccessLedger::new(store).with_clock(clock.clone());
    (ledger, clock)
}

#[tokio::test]
async fn test_redeem_then_reuse_scenario() {
    let (ledger, clock) = create_ledger(seeded_store("AB12CD34", t0() + Duration::hours(24)));

    clock.set(t0() + Duration::hours(1));
    let first = ledger.verify_code("AB12CD34", "u1").await.unwrap();
    assert!(first.authorized);
    assert_eq!(first.reason, VerifyReason::Accepted);

    clock.set(t0() + Duration::hours(2));
    let second = ledger.verify_code("AB12CD34", "u2").await.unwrap();
    assert!(!second.authorized);
    assert_eq!(second.reason, VerifyReason::Invalid);

    assert!(ledger.is_user_authorized("u1").await.unwrap());
    assert!(!ledger.is_user_authorized("u2").await.unwrap());
}

#[tokio::test]
async fn test_expired_code_scenario() {
    let (ledger, clock) = create_ledger(Arc::new(MemoryStore::new()));

    let issued = ledger.generate_code().await.unwrap();
    assert_eq!(issued.expiration, t0() + Duration::hours(24));

    clock.set(t0() + Duration::hours(25));
    let result = ledger.verify_code(&issued.code, "u3").await.unwrap();
    assert!(!result.authorized);
    assert!(matches!(
        result.reason,
        VerifyReason::Invalid | VerifyReason::Expired
    ));

    let active = ledger.list_active_codes().await.unwrap();
    assert!(active.iter().all(|c| c.code != issued.code));
}

#[tokio::test]
async fn test_expired_before_listing_is_hidden_but_kept() {
    let store = Arc::new(MemoryStore::new());
    let (ledger, clock) = create_ledger(store.clone());
    ledger.generate_code().await.unwrap();

    clock.advance(Duration::hours(24));
    assert!(ledger.list_active_codes().await.unwrap().is_empty());
    // 列表不清理
    assert_eq!(store.snapshot().await.unwrap().codes.len(), 1);
}

#[tokio::test]
async fn test_unknown_code_is_invalid() {
    let (ledger, _) = create_ledger(Arc::new(MemoryStore::new()));

    let result = ledger.verify_code("WRONGCODE", "u4").await.unwrap();
    assert!(!result.authorized);
    assert_eq!(result.reason, VerifyReason::Invalid);
    assert!(!ledger.is_user_authorized("u4").await.unwrap());
}

#[tokio::test]
async fn test_already_authorized_short_circuit() {
    let store = seeded_store("AB12CD34", t0() + Duration::hours(24));
    let (ledger, _) = create_ledger(store.clone());
    let other = ledger.generate_code().await.unwrap();

    ledger.verify_code(&other.code, "u1").await.unwrap();

    let result = ledger.verify_code("NOTACODE", "u1").await.unwrap();
    assert_eq!(result.reason, VerifyReason::AlreadyAuthorized);
    assert!(result.authorized);

    let result = ledger.verify_code("AB12CD34", "u1").await.unwrap();
    assert_eq!(result.reason, VerifyReason::AlreadyAuthorized);

    // AB12CD34 仍未被消耗
    let ledger_state = store.snapshot().await.unwrap();
    assert!(!ledger_state.codes[0].used);
    assert_eq!(ledger_state.authorized_users, vec!["u1".to_string()]);
}

#[tokio::test]
async fn test_generated_codes_are_listed_unused() {
    let (ledger, _) = create_ledger(Arc::new(MemoryStore::new()));

    let mut issued = Vec::new();
    for _ in 0..5 {
        issued.push(ledger.generate_code().await.unwrap());
    }

    let active = ledger.list_active_codes().await.unwrap();
    assert_eq!(active.len(), 5);
    for (code, listed) in issued.iter().zip(active.iter()) {
        assert_eq!(code.code, listed.code);
        assert!(!listed.used);
    }
}

#[tokio::test]
async fn test_reads_are_idempotent() {
    let (ledger, _) = create_ledger(seeded_store("AB12CD34", t0() + Duration::hours(24)));
    ledger.verify_code("AB12CD34", "u1").await.unwrap();
    ledger.generate_code().await.unwrap();

    let first_list = ledger.list_active_codes().await.unwrap();
    let first_auth = ledger.is_user_authorized("u1").await.unwrap();
    for _ in 0..3 {
        assert_eq!(ledger.list_active_codes().await.unwrap(), first_list);
        assert_eq!(ledger.is_user_authorized("u1").await.unwrap(), first_auth);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_redemption_is_exactly_once() {
    for _ in 0..20 {
        let (ledger, _) = create_ledger(seeded_store("RACE0001", t0() + Duration::hours(24)));

        let a = {
            let ledger = ledger.clone();
            tokio::spawn(async move { ledger.verify_code("RACE0001", "userA").await })
        };
        let b = {
            let ledger = ledger.clone();
            tokio::spawn(async move { ledger.verify_code("RACE0001", "userB").await })
        };

        let a = a.await.unwrap().unwrap();
        let b = b.await.unwrap().unwrap();

        let accepted = [a, b]
            .iter()
            .filter(|v| v.reason == VerifyReason::Accepted)
            .count();
        assert_eq!(accepted, 1);
        assert!([a, b]
            .iter()
            .any(|v| !v.authorized && v.reason == VerifyReason::Invalid));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_generation_keeps_every_code() {
    let (ledger, _) = create_ledger(Arc::new(MemoryStore::new()));

    let handles: Vec<_> = (0..16)
        .map(|_| {
            let ledger = ledger.clone();
            tokio::spawn(async move { ledger.generate_code().await })
        })
        .collect();

    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    assert_eq!(ledger.list_active_codes().await.unwrap().len(), 16);
}
