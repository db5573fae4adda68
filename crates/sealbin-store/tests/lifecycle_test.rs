//! End-to-end paste lifecycle over the real client crypto: encrypt, store,
//! view-count exhaustion, password-derived deletion.

use std::time::{Duration, SystemTime};

use secrecy::SecretString;
use sealbin_crypto::{decrypt, derive_delete_auth, encrypt, EncryptedPayload, KdfParams};
use sealbin_store::{CreateRequest, MemoryStore, PasteService};
use sealbin_core::config::LimitsConfig;
use sealbin_core::SealbinError;

fn fast_kdf() -> KdfParams {
    KdfParams { iterations: 1_000 }
}

fn service() -> PasteService<MemoryStore> {
    PasteService::new(LimitsConfig::default(), MemoryStore::new())
}

fn create_request(payload: &EncryptedPayload, views_allowed: Option<u32>) -> CreateRequest {
    CreateRequest {
        ciphertext: payload.ciphertext.clone(),
        iv: payload.iv.to_vec(),
        mime: "text/plain".into(),
        expire_at: SystemTime::now() + Duration::from_secs(600),
        views_allowed,
        delete_auth: None,
    }
}

#[test]
fn encrypted_paste_roundtrip_through_store() {
    let svc = service();
    let password = SecretString::from("shared secret phrase");
    let plaintext = b"the server never sees this";

    let payload = encrypt(plaintext, &password, &fast_kdf()).unwrap();
    let created = svc.create(create_request(&payload, None)).unwrap();

    // The viewer gets ciphertext + iv from the server, salt from the link
    // fragment, and decrypts locally.
    let view = svc.retrieve(&created.id).unwrap();
    let fetched = EncryptedPayload {
        ciphertext: view.ciphertext,
        iv: view.iv.try_into().expect("stored iv is 12 bytes"),
        salt: payload.salt,
    };
    let decrypted = decrypt(&fetched, &password, &fast_kdf()).unwrap();

    assert_eq!(decrypted, plaintext);
}

#[test]
fn single_view_paste_reads_exactly_once() {
    let svc = service();
    let payload = encrypt(b"burn after reading", &SecretString::from("pw"), &fast_kdf()).unwrap();
    let created = svc.create(create_request(&payload, Some(1))).unwrap();

    let first = svc.retrieve(&created.id).unwrap();
    assert_eq!(first.views_left, Some(1));

    assert!(matches!(
        svc.retrieve(&created.id),
        Err(SealbinError::NotFound)
    ));
}

#[test]
fn two_view_paste_counts_down_then_vanishes() {
    let svc = service();
    let payload = encrypt(b"twice", &SecretString::from("pw"), &fast_kdf()).unwrap();
    let created = svc.create(create_request(&payload, Some(2))).unwrap();

    assert_eq!(svc.retrieve(&created.id).unwrap().views_left, Some(2));
    assert_eq!(svc.retrieve(&created.id).unwrap().views_left, Some(1));
    assert!(matches!(
        svc.retrieve(&created.id),
        Err(SealbinError::NotFound)
    ));
}

#[test]
fn password_derived_auth_deletes_without_reprompt() {
    let svc = service();
    let password = SecretString::from("viewer knows this");

    let payload = encrypt(b"deletable", &password, &fast_kdf()).unwrap();
    let auth = derive_delete_auth(&password, &payload.salt, &fast_kdf()).unwrap();

    let mut req = create_request(&payload, None);
    req.delete_auth = Some(auth.as_bytes().to_vec());
    let created = svc.create(req).unwrap();

    // A viewer re-derives the same auth from password + salt and deletes
    let rederived = derive_delete_auth(&password, &payload.salt, &fast_kdf()).unwrap();
    svc.delete(&created.id, &rederived.encode()).unwrap();

    assert!(matches!(
        svc.retrieve(&created.id),
        Err(SealbinError::NotFound)
    ));
}

#[test]
fn wrong_password_auth_cannot_delete() {
    let svc = service();
    let password = SecretString::from("owner");

    let payload = encrypt(b"protected", &password, &fast_kdf()).unwrap();
    let auth = derive_delete_auth(&password, &payload.salt, &fast_kdf()).unwrap();

    let mut req = create_request(&payload, None);
    req.delete_auth = Some(auth.as_bytes().to_vec());
    let created = svc.create(req).unwrap();

    let imposter = derive_delete_auth(&SecretString::from("guesser"), &payload.salt, &fast_kdf())
        .unwrap();
    assert!(matches!(
        svc.delete(&created.id, &imposter.encode()),
        Err(SealbinError::InvalidToken)
    ));
    assert!(svc.retrieve(&created.id).is_ok(), "paste must survive");
}

#[test]
fn concurrent_last_view_admits_exactly_one_reader() {
    use std::sync::Arc;

    let svc = Arc::new(service());
    let payload = encrypt(b"contended", &SecretString::from("pw"), &fast_kdf()).unwrap();
    let created = svc.create(create_request(&payload, Some(1))).unwrap();

    let mut handles = Vec::new();
    for _ in 0..8 {
        let svc = svc.clone();
        let id = created.id.clone();
        handles.push(std::thread::spawn(move || svc.retrieve(&id).is_ok()));
    }

    let successes = handles
        .into_iter()
        .map(|h| h.join().unwrap())
        .filter(|&ok| ok)
        .count();
    assert_eq!(successes, 1);
}
