//! End-to-end key ring lifecycle: directory loading, rotation, signing.

use keywarden_crypto::{ErrorKind, KeyRing, verify};

const PUB: &str = "p256\n86754568856409436056886548963722747418663925733852968840719951502625645703023\n55374006944977701639377273685946154797448684848748065688191847332792959379206\n";
const SEC: &str = "33732563467898584041325590158539299810645722675081856412396066039103123277092\n";
const NEW_PUB: &str = "p256\n6640270742675236934700552659758623510932789581985633007789325329362331148012\n68892645101823987570169861213316538980647268870890981023717754447508722389034\n";
const NEW_SEC: &str = "73412709577437621283953284627141522517131750837511539431619352194608555895350\n";

fn key_dir(public: &str, secret: &str, archive: Option<&str>) -> tempfile::TempDir {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("public.upspinkey"), public).unwrap();
    std::fs::write(dir.path().join("secret.upspinkey"), secret).unwrap();
    if let Some(archive) = archive {
        std::fs::write(dir.path().join("secret2.upspinkey"), archive).unwrap();
    }
    dir
}

fn archive_of(public: &str, secret: &str) -> String {
    format!("# EE 2019-06-01\n{public}{secret}")
}

#[test]
fn plain_directory_loads_primary_key() {
    let dir = key_dir(PUB, SEC, None);
    let ring = KeyRing::from_dir(dir.path()).unwrap();
    assert_eq!(ring.len(), 1);
    assert_eq!(ring.current_public_key().text(), PUB);
    assert_eq!(ring.current_hash(), ring.previous_hash());
}

#[test]
fn archived_directory_exposes_rotation_history() {
    let dir = key_dir(NEW_PUB, NEW_SEC, Some(&archive_of(PUB, SEC)));
    let ring = KeyRing::from_dir(dir.path()).unwrap();
    assert_eq!(ring.len(), 2);
    assert_eq!(ring.current_public_key().text(), NEW_PUB);
    let previous = ring.previous_hash();
    assert_eq!(ring.public_key_by_hash(previous.as_bytes()).unwrap().text(), PUB);
}

#[test]
fn unparseable_archive_header_leaves_only_primary() {
    // The archive exists but its header is not an archive marker: processing
    // ends silently and the previous pointer stays on the current key.
    let dir = key_dir(NEW_PUB, NEW_SEC, Some("once upon a time\n"));
    let ring = KeyRing::from_dir(dir.path()).unwrap();
    assert_eq!(ring.len(), 1);
    assert_eq!(ring.current_hash(), ring.previous_hash());
}

#[test]
fn malformed_archive_body_fails_construction() {
    let archive = "# EE 2019-06-01\np256\n86754\nnot-a-number\n33732\n";
    let dir = key_dir(NEW_PUB, NEW_SEC, Some(archive));
    assert!(KeyRing::from_dir(dir.path()).is_err());
}

#[test]
fn garbage_primary_key_fails_construction() {
    let dir = key_dir("zzz\n", "zzz\n", None);
    assert!(KeyRing::from_dir(dir.path()).is_err());

    let dir = key_dir("", "", None);
    assert!(KeyRing::from_dir(dir.path()).is_err());
}

#[test]
fn mismatched_key_pair_fails_construction() {
    // A valid public key and a valid scalar that do not correspond.
    let dir = key_dir(PUB, NEW_SEC, None);
    let err = KeyRing::from_dir(dir.path()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Invalid);
    assert!(err.to_string().contains("do not correspond"), "got: {err}");
}

#[test]
fn missing_primary_file_is_not_exist() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("public.upspinkey"), PUB).unwrap();
    let err = KeyRing::from_dir(dir.path()).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotExist);
}

#[test]
fn carriage_returns_are_stripped_before_parsing() {
    let dir = key_dir(
        &NEW_PUB.replace('\n', "\r\n"),
        &NEW_SEC.replace('\n', "\r\n"),
        Some(&archive_of(PUB, SEC).replace('\n', "\r\n")),
    );
    let ring = KeyRing::from_dir(dir.path()).unwrap();
    // Hashing happens over the normalized bytes, so the key is the same
    // key as in the LF-only form.
    let lf_ring = KeyRing::from_dir(key_dir(PUB, SEC, None).path()).unwrap();
    assert_eq!(ring.previous_hash(), lf_ring.current_hash());
}

#[test]
fn rotation_signs_with_the_old_key() {
    let dir = key_dir(NEW_PUB, NEW_SEC, Some(&archive_of(PUB, SEC)));
    let ring = KeyRing::from_dir(dir.path()).unwrap();

    let hash = [5u8; 32];
    let signature = ring.sign(&hash).unwrap();
    verify(&hash, &signature, NEW_PUB.as_bytes()).unwrap();
    assert!(verify(&hash, &signature, PUB.as_bytes()).is_err());

    let rotated = ring.rotate();
    let signature = rotated.sign(&hash).unwrap();
    verify(&hash, &signature, PUB.as_bytes()).unwrap();

    // The original view still signs with the new key.
    let signature = ring.sign(&hash).unwrap();
    verify(&hash, &signature, NEW_PUB.as_bytes()).unwrap();
}

#[test]
fn rings_are_usable_across_threads() {
    let dir = key_dir(NEW_PUB, NEW_SEC, Some(&archive_of(PUB, SEC)));
    let ring = KeyRing::from_dir(dir.path()).unwrap();

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let ring = ring.clone();
            std::thread::spawn(move || {
                let hash = [i as u8; 32];
                let signature = ring.sign(&hash).unwrap();
                verify(&hash, &signature, ring.current_public_key().as_bytes()).unwrap();
                ring.derive_subkey(b"salt", b"info", 16).unwrap()
            })
        })
        .collect();
    for handle in handles {
        let subkey = handle.join().unwrap();
        assert_eq!(subkey.len(), 16);
    }
}
