mod common;

use common::{MemoryStore, config, sample_tree};
use rax_transfer::error::{ConnectError, FailureKind, TransferError};
use rax_transfer::session::{ConnectionManager, ConnectionState};
use rax_transfer::{ConnectConfig, FileTransfer};
use std::io::Cursor;
use std::path::Path;

#[test]
fn test_connect_reports_live_session() {
    let store = sample_tree();
    let mut transfer = FileTransfer::with_store(store.clone());

    let outcome = transfer.connect(&config());
    assert!(outcome.is_connected());
    assert!(outcome.cause().is_none());
    assert!(transfer.is_connected());
    assert_eq!(store.connects(), 1);
}

#[test]
fn test_reconnect_tears_down_existing_session_first() {
    let store = sample_tree();
    let mut transfer = FileTransfer::with_store(store.clone());

    assert!(transfer.connect(&config()).is_connected());
    assert!(transfer.connect(&config()).is_connected());

    assert_eq!(store.connects(), 2);
    assert_eq!(store.disconnects(), 1);
    assert_eq!(store.calls(), vec!["connect", "disconnect", "connect"]);
}

#[test]
fn test_failed_connect_is_an_outcome_not_a_panic() {
    let store = MemoryStore::new().fail_connect();
    let mut transfer = FileTransfer::with_store(store.clone());

    let outcome = transfer.connect(&config());
    assert!(!outcome.is_connected());
    assert!(matches!(outcome.cause(), Some(ConnectError::Authentication(u)) if u == "u"));
    assert!(!transfer.is_connected());
}

#[test]
fn test_invalid_config_never_reaches_the_store() {
    let store = MemoryStore::new();
    let mut transfer = FileTransfer::with_store(store.clone());

    let outcome = transfer.connect(&ConnectConfig::sftp("", "u", "p"));
    assert!(matches!(outcome.cause(), Some(ConnectError::InvalidConfig(_))));
    assert_eq!(store.connects(), 0);
}

#[test]
fn test_failed_reconnect_leaves_no_live_session() {
    let store = sample_tree();
    let mut transfer = FileTransfer::with_store(store.clone());
    assert!(transfer.connect(&config()).is_connected());

    let outcome = transfer.connect(&ConnectConfig::sftp("h", "", "p"));
    assert!(!outcome.is_connected());
    assert!(!transfer.is_connected());
    assert_eq!(store.disconnects(), 1);
}

#[test]
fn test_disconnect_is_idempotent() {
    let store = sample_tree();
    let mut transfer = FileTransfer::with_store(store.clone());

    transfer.disconnect();
    assert_eq!(store.disconnects(), 0);

    transfer.connect(&config());
    transfer.disconnect();
    transfer.disconnect();
    assert_eq!(store.disconnects(), 1);
    assert!(!transfer.is_connected());
}

#[test]
fn test_operations_require_a_session() {
    let store = sample_tree();
    let mut transfer = FileTransfer::with_store(store.clone());

    let not_connected = |e: TransferError| e.kind() == FailureKind::NotConnected;
    assert!(not_connected(transfer.list("/a").unwrap_err()));
    assert!(not_connected(transfer.list_ordered("/a").unwrap_err()));
    assert!(not_connected(transfer.is_directory("/a").unwrap_err()));
    assert!(not_connected(transfer.cd("/a").unwrap_err()));
    assert!(not_connected(transfer.pwd().unwrap_err()));
    assert!(not_connected(transfer.mkdir("/c").unwrap_err()));
    assert!(not_connected(transfer.rmdir("/a/b").unwrap_err()));
    assert!(not_connected(transfer.rm("/a/x").unwrap_err()));
    assert!(not_connected(
        transfer
            .upload_stream(&mut Cursor::new(b"data".to_vec()), "/n")
            .unwrap_err()
    ));
    assert!(not_connected(
        transfer.download("/a/x", Path::new("/tmp/never")).unwrap_err()
    ));
    assert!(not_connected(
        transfer.download_tree("/a", Path::new("/tmp/never")).unwrap_err()
    ));
    assert!(not_connected(transfer.delete_tree("/a").unwrap_err()));

    // Nothing reached the store
    assert!(store.calls().is_empty());
}

#[test]
fn test_operations_fail_after_disconnect() {
    let store = sample_tree();
    let mut transfer = FileTransfer::with_store(store.clone());
    transfer.connect(&config());
    transfer.disconnect();

    let calls_before = store.calls().len();
    assert!(matches!(transfer.pwd(), Err(TransferError::NotConnected)));
    assert_eq!(store.calls().len(), calls_before);
}

#[test]
fn test_manager_state_machine() {
    let store = sample_tree();
    let mut manager = ConnectionManager::new(Box::new(store.clone()));
    assert_eq!(manager.state(), ConnectionState::Disconnected);
    assert!(manager.active_store().is_err());

    assert!(manager.connect(&config()).is_connected());
    assert_eq!(manager.state(), ConnectionState::Connected);
    assert!(manager.active_store().is_ok());

    manager.disconnect();
    assert_eq!(manager.state(), ConnectionState::Disconnected);
}

#[test]
fn test_dropping_the_facade_closes_the_session() {
    let store = sample_tree();
    {
        let mut transfer = FileTransfer::with_store(store.clone());
        transfer.connect(&config());
    }
    assert_eq!(store.disconnects(), 1);
    assert!(!rax_transfer::RemoteStore::is_connected(&store));
}

#[test]
fn test_cd_and_pwd_track_working_directory() {
    let store = sample_tree();
    let mut transfer = FileTransfer::with_store(store.clone());
    transfer.connect(&config());

    assert_eq!(transfer.pwd().unwrap(), "/");
    assert_eq!(transfer.cd("/a").unwrap(), "/a");
    assert_eq!(transfer.cd("b").unwrap(), "/a/b");
    assert_eq!(transfer.pwd().unwrap(), "/a/b");

    let err = transfer.cd("/missing").unwrap_err();
    assert_eq!(err.kind(), FailureKind::RemoteIo);
    assert_eq!(transfer.pwd().unwrap(), "/a/b");
    assert_eq!(transfer.cd("  ").unwrap_err().kind(), FailureKind::InvalidPath);
}
