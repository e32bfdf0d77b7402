//! JSON 文件存储实现测试

use std::sync::Arc;

use access_ledger::core::store::LedgerStore;
use access_ledger::infrastructure::store::{open_store, JsonFileStore};
use access_ledger::{AccessLedger, LedgerConfig, LedgerError, StoreBackend, VerifyReason};
use tempfile::TempDir;

#[tokio::test]
async fn test_reads_legacy_ledger_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("access_codes.json");
    std::fs::write(
        &path,
        r#"{
    "codes": [
        {"code": "LEGACY01", "expiration": "2999-01-01T00:00:00.000001", "used": false},
        {"code": "LEGACY02", "expiration": "2000-01-01T00:00:00", "used": false}
    ],
    "authorized_users": ["old-user"]
}"#,
    )
    .unwrap();

    let store: Arc<dyn LedgerStore> = Arc::new(JsonFileStore::open(&path).await.unwrap());
    let ledger = AccessLedger::new(store);

    let active = ledger.list_active_codes().await.unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].code, "LEGACY01");
    assert!(ledger.is_user_authorized("old-user").await.unwrap());

    let result = ledger.verify_code("LEGACY01", "new-user").await.unwrap();
    assert_eq!(result.reason, VerifyReason::Accepted);

    // 过期码已被清理并持久化，时间戳改写为带时区的格式
    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let codes = raw["codes"].as_array().unwrap();
    assert_eq!(codes.len(), 1);
    assert_eq!(codes[0]["used"], true);
    assert!(codes[0]["expiration"].as_str().unwrap().ends_with('Z'));
    assert_eq!(raw["authorized_users"], serde_json::json!(["old-user", "new-user"]));
}

#[tokio::test]
async fn test_open_store_by_config() {
    let dir = TempDir::new().unwrap();
    let config = LedgerConfig::new(dir.path().join("data").join("access_codes.json"), StoreBackend::Json);

    let store = open_store(&config).await.unwrap();
    let ledger = AccessLedger::from_config(store, &config);
    let issued = ledger.generate_code().await.unwrap();

    let reopened = open_store(&config).await.unwrap();
    let snapshot = reopened.snapshot().await.unwrap();
    assert_eq!(snapshot.codes[0].code, issued.code);
}

#[tokio::test]
async fn test_open_store_rejects_invalid_config() {
    let config = LedgerConfig::new("", StoreBackend::Json);
    let err = open_store(&config).await.err().unwrap();
    assert!(matches!(err, LedgerError::ConfigError(_)));
}

#[tokio::test]
async fn test_unreadable_location_is_store_unavailable() {
    let dir = TempDir::new().unwrap();
    // 父路径是一个普通文件，无法创建目录
    let blocker = dir.path().join("blocker");
    std::fs::write(&blocker, b"").unwrap();

    let err = JsonFileStore::open(blocker.join("access_codes.json"))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, LedgerError::StoreUnavailable(_)));
    assert!(err.is_retryable());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_file_concurrent_redemption_is_exactly_once() {
    let dir = TempDir::new().unwrap();
    let store: Arc<dyn LedgerStore> = Arc::new(
        JsonFileStore::open(dir.path().join("access_codes.json"))
            .await
            .unwrap(),
    );
    let ledger = AccessLedger::new(store);
    let issued = ledger.generate_code().await.unwrap();

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let ledger = ledger.clone();
            let code = issued.code.clone();
            tokio::spawn(async move { ledger.verify_code(&code, &format!("user{}", i)).await })
        })
        .collect();

    let mut accepted = 0;
    for handle in handles {
        let verification = handle.await.unwrap().unwrap();
        match verification.reason {
            VerifyReason::Accepted => accepted += 1,
            other => assert_eq!(other, VerifyReason::Invalid),
        }
    }
    assert_eq!(accepted, 1);
}
