//! End-to-end vault scenarios against real files

use std::fs;

use tempfile::TempDir;
use vault_core::{CredentialStore, KdfParams, VaultDir, VaultError, VaultSession, VaultState};

fn fast() -> KdfParams {
    KdfParams { iterations: 1_000 }
}

#[test]
fn test_persisted_entry_survives_reopen() {
    let temp_dir = TempDir::new().unwrap();

    {
        let mut session = VaultSession::open(temp_dir.path()).unwrap();
        session.initialize("correct-horse").unwrap();
        session.unlock("correct-horse").unwrap();
        session.add("github", "s3cret!").unwrap();
    }

    let vault_before = fs::read(temp_dir.path().join("passwords.enc")).unwrap();
    let master_before = fs::read(temp_dir.path().join("master.json")).unwrap();

    let mut session = VaultSession::open(temp_dir.path()).unwrap();
    assert_eq!(session.state(), VaultState::Locked);

    assert!(matches!(
        session.unlock("wrong-pass"),
        Err(VaultError::AuthenticationFailed)
    ));
    assert_eq!(fs::read(temp_dir.path().join("passwords.enc")).unwrap(), vault_before);
    assert_eq!(fs::read(temp_dir.path().join("master.json")).unwrap(), master_before);

    session.unlock("correct-horse").unwrap();
    let entry = session.get("github").unwrap().unwrap();
    assert_eq!(entry.secret, "s3cret!");
}

#[test]
fn test_rotation_switches_passphrase() {
    let temp_dir = TempDir::new().unwrap();

    {
        let mut session = VaultSession::open(temp_dir.path())
            .unwrap()
            .with_kdf_params(fast());
        session.initialize("old").unwrap();
        session.unlock("old").unwrap();
        session.add("github", "s3cret!").unwrap();
        session.add("mail", "hunter2").unwrap();
        session.rotate_master("old", "new").unwrap();
    }

    let mut session = VaultSession::open(temp_dir.path()).unwrap();
    assert!(matches!(
        session.unlock("old"),
        Err(VaultError::AuthenticationFailed)
    ));

    session.unlock("new").unwrap();
    let listed = session.list().unwrap();
    assert_eq!(listed.len(), 2);
    assert_eq!(session.get("github").unwrap().unwrap().secret, "s3cret!");
    assert_eq!(session.get("mail").unwrap().unwrap().secret, "hunter2");
    assert!(!temp_dir.path().join("passwords.tmp").exists());
    assert!(!temp_dir.path().join("master.tmp").exists());
}

#[test]
fn test_rotation_of_empty_vault() {
    let temp_dir = TempDir::new().unwrap();
    let mut session = VaultSession::open(temp_dir.path())
        .unwrap()
        .with_kdf_params(fast());
    session.initialize("old").unwrap();
    session.unlock("old").unwrap();

    session.rotate_master("old", "new").unwrap();
    drop(session);

    let mut session = VaultSession::open(temp_dir.path()).unwrap();
    session.unlock("new").unwrap();
    assert!(session.list().unwrap().is_empty());
}

#[test]
fn test_delete_unknown_platform_leaves_file_untouched() {
    let temp_dir = TempDir::new().unwrap();
    let mut session = VaultSession::open(temp_dir.path())
        .unwrap()
        .with_kdf_params(fast());
    session.initialize("pw").unwrap();
    session.unlock("pw").unwrap();
    session.add("github", "s3cret!").unwrap();

    let before = fs::read(temp_dir.path().join("passwords.enc")).unwrap();

    assert!(matches!(
        session.delete("gitlab"),
        Err(VaultError::NotFound(name)) if name == "gitlab"
    ));
    assert_eq!(fs::read(temp_dir.path().join("passwords.enc")).unwrap(), before);
}

#[test]
fn test_tampered_vault_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let mut session = VaultSession::open(temp_dir.path())
        .unwrap()
        .with_kdf_params(fast());
    session.initialize("pw").unwrap();
    session.unlock("pw").unwrap();
    session.add("github", "s3cret!").unwrap();

    let path = temp_dir.path().join("passwords.enc");
    let mut blob = fs::read(&path).unwrap();
    let last = blob.len() - 1;
    blob[last] ^= 0x01;
    fs::write(&path, &blob).unwrap();

    assert!(matches!(
        session.get("github"),
        Err(VaultError::VaultCorruptedOrWrongKey(_))
    ));
    assert!(matches!(
        session.add("mail", "x"),
        Err(VaultError::VaultCorruptedOrWrongKey(_))
    ));
    assert_eq!(fs::read(&path).unwrap(), blob);
}

#[test]
fn test_master_file_format() {
    let temp_dir = TempDir::new().unwrap();
    let mut session = VaultSession::open(temp_dir.path()).unwrap();
    session.initialize("correct-horse").unwrap();

    let json: serde_json::Value =
        serde_json::from_slice(&fs::read(temp_dir.path().join("master.json")).unwrap()).unwrap();
    let object = json.as_object().unwrap();

    let mut keys: Vec<_> = object.keys().map(String::as_str).collect();
    keys.sort_unstable();
    assert_eq!(keys, ["salt", "verifier"]);
    assert!(temp_dir.path().join(".usb_id").exists());
}

#[test]
fn test_missing_storage_location() {
    let temp_dir = TempDir::new().unwrap();
    let result = VaultSession::open(temp_dir.path().join("unplugged"));

    assert!(matches!(result, Err(VaultError::StorageError(_))));
}

#[test]
fn test_crash_mid_rotation_keeps_old_passphrase() {
    let temp_dir = TempDir::new().unwrap();

    {
        let mut session = VaultSession::open(temp_dir.path())
            .unwrap()
            .with_kdf_params(fast());
        session.initialize("old").unwrap();
        session.unlock("old").unwrap();
        session.add("github", "s3cret!").unwrap();
    }

    // Replay rotate_master up to the point between the two renames
    {
        let dir = VaultDir::open(temp_dir.path()).unwrap();
        let store = CredentialStore::new(dir.clone());
        let record = dir.load_master().unwrap().unwrap();
        let key = record.verify("old").unwrap();
        let set = store.load(&key).unwrap();
        let (new_record, new_key) = record.rotate("old", "new").unwrap();

        let staged_vault = store.prepare_save(&new_key, &set).unwrap();
        let staged_master = dir.stage_master(&new_record).unwrap();
        dir.begin_rotation().unwrap();
        staged_vault.commit().unwrap();
        std::mem::forget(staged_master);
    }

    let mut session = VaultSession::open(temp_dir.path()).unwrap();
    assert!(matches!(
        session.unlock("new"),
        Err(VaultError::AuthenticationFailed)
    ));
    session.unlock("old").unwrap();
    assert_eq!(session.get("github").unwrap().unwrap().secret, "s3cret!");
    assert!(!temp_dir.path().join("master.json.bak").exists());
    assert!(!temp_dir.path().join("passwords.enc.bak").exists());

    session.rotate_master("old", "new").unwrap();
    let mut reopened = VaultSession::open(temp_dir.path()).unwrap();
    reopened.unlock("new").unwrap();
    assert_eq!(reopened.get("github").unwrap().unwrap().secret, "s3cret!");
}
