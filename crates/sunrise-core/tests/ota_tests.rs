//! Integration tests for the espota protocol messages.

use sunrise_core::ota::{
    AuthReply, ImageTracker, OtaAuth, OtaCommand, OtaError, OtaInvitation, md5_hex,
};

const IMAGE_MD5: &str = "0123456789abcdef0123456789abcdef";

// -----------------------------------------------------------------------------
// Invitation
// -----------------------------------------------------------------------------

#[test]
fn parses_firmware_invitation() {
    let invitation =
        OtaInvitation::parse(b"0 48266 552672 0123456789abcdef0123456789abcdef\n").unwrap();

    assert_eq!(invitation.command, OtaCommand::Firmware);
    assert_eq!(invitation.port, 48266);
    assert_eq!(invitation.size, 552_672);
    assert_eq!(invitation.md5, IMAGE_MD5);
}

#[test]
fn parses_filesystem_invitation() {
    let invitation =
        OtaInvitation::parse(b"100 5000 1024 0123456789ABCDEF0123456789ABCDEF\n").unwrap();

    assert_eq!(invitation.command, OtaCommand::Filesystem);
    assert_eq!(invitation.command.as_str(), "filesystem");
    // Digest is normalised to lowercase.
    assert_eq!(invitation.md5, IMAGE_MD5);
}

#[test]
fn rejects_malformed_invitations() {
    // Unknown command
    assert!(OtaInvitation::parse(b"7 5000 1024 0123456789abcdef0123456789abcdef\n").is_none());
    // Port out of range
    assert!(OtaInvitation::parse(b"0 70000 1024 0123456789abcdef0123456789abcdef\n").is_none());
    // Short digest
    assert!(OtaInvitation::parse(b"0 5000 1024 0123456789abcdef\n").is_none());
    // Non-hex digest
    assert!(OtaInvitation::parse(b"0 5000 1024 0123456789abcdef0123456789abcdeg\n").is_none());
    // Missing fields
    assert!(OtaInvitation::parse(b"0 5000\n").is_none());
    assert!(OtaInvitation::parse(b"").is_none());
}

#[test]
fn command_names_and_codes() {
    assert_eq!(OtaCommand::Firmware.as_str(), "sketch");
    assert_eq!(OtaCommand::Firmware.code(), 0);
    assert_eq!(OtaCommand::Filesystem.code(), 100);
    assert_eq!(OtaCommand::from_code(100), Some(OtaCommand::Filesystem));
}

// -----------------------------------------------------------------------------
// Authentication
// -----------------------------------------------------------------------------

#[test]
fn md5_matches_known_vector() {
    assert_eq!(md5_hex(&[b"password"]), "5f4dcc3b5aa765d61d8327deb882cf99");
    assert_eq!(md5_hex(&[b"pass", b"word"]), "5f4dcc3b5aa765d61d8327deb882cf99");
}

#[test]
fn nonce_is_32_hex_chars() {
    let nonce = OtaAuth::nonce(b"123456");
    assert_eq!(nonce.len(), 32);
    assert!(nonce.bytes().all(|b| b.is_ascii_hexdigit()));
}

#[test]
fn response_follows_digest_scheme() {
    let auth = OtaAuth::new("password");
    let nonce = OtaAuth::nonce(b"nonce-seed");
    let cnonce = md5_hex(&[b"client"]);

    let expected = md5_hex(&[
        b"5f4dcc3b5aa765d61d8327deb882cf99",
        b":",
        nonce.as_bytes(),
        b":",
        cnonce.as_bytes(),
    ]);
    assert_eq!(auth.expected_response(&nonce, &cnonce), expected);
}

#[test]
fn verifies_correct_reply_and_rejects_wrong_password() {
    let nonce = OtaAuth::nonce(b"seed");
    let cnonce = md5_hex(&[b"client"]);
    let uploader = OtaAuth::new("password");
    let response = uploader.expected_response(&nonce, &cnonce);

    let mut datagram = String::from("200 ");
    datagram.push_str(&cnonce);
    datagram.push(' ');
    datagram.push_str(&response);
    datagram.push('\n');
    let reply = AuthReply::parse(datagram.as_bytes()).unwrap();

    assert!(OtaAuth::new("password").verify(&nonce, &reply));
    assert!(!OtaAuth::new("hunter2").verify(&nonce, &reply));
    assert!(!OtaAuth::new("password").verify(&OtaAuth::nonce(b"other"), &reply));
}

#[test]
fn rejects_malformed_auth_replies() {
    let digest = md5_hex(&[b"x"]);
    let wrong_code = format!("201 {digest} {digest}\n");
    assert!(AuthReply::parse(wrong_code.as_bytes()).is_none());
    let short = format!("200 abc {digest}\n");
    assert!(AuthReply::parse(short.as_bytes()).is_none());
    assert!(AuthReply::parse(b"200\n").is_none());
}

#[test]
fn error_categories_have_distinct_names() {
    let names = [
        OtaError::Auth.as_str(),
        OtaError::Begin.as_str(),
        OtaError::Connect.as_str(),
        OtaError::Receive.as_str(),
        OtaError::End.as_str(),
    ];
    for (i, a) in names.iter().enumerate() {
        for b in &names[i + 1..] {
            assert_ne!(a, b);
        }
    }
}

// -----------------------------------------------------------------------------
// Image tracking
// -----------------------------------------------------------------------------

#[test]
fn complete_image_with_matching_digest_verifies() {
    let image = b"firmware image bytes";
    let digest = md5_hex(&[image]);

    let mut tracker = ImageTracker::new(u32::try_from(image.len()).unwrap());
    for chunk in image.chunks(6) {
        tracker.update(chunk).unwrap();
    }
    assert!(tracker.is_complete());
    assert_eq!(tracker.progress_percent(), 100);
    assert_eq!(tracker.verify(&digest), Ok(()));
}

#[test]
fn digest_comparison_ignores_case() {
    let image = b"abc";
    let digest = md5_hex(&[image]).to_ascii_uppercase();

    let mut tracker = ImageTracker::new(3);
    tracker.update(image).unwrap();
    assert_eq!(tracker.verify(&digest), Ok(()));
}

#[test]
fn digest_mismatch_fails_at_end() {
    let mut tracker = ImageTracker::new(3);
    tracker.update(b"abc").unwrap();
    assert_eq!(tracker.verify(IMAGE_MD5), Err(OtaError::End));
}

#[test]
fn incomplete_image_fails_at_end() {
    let image = b"abcdef";
    let mut tracker = ImageTracker::new(6);
    tracker.update(&image[..3]).unwrap();
    assert_eq!(tracker.progress_percent(), 50);
    assert_eq!(tracker.verify(&md5_hex(&[image])), Err(OtaError::End));
}

#[test]
fn data_past_announced_size_is_refused() {
    let mut tracker = ImageTracker::new(4);
    tracker.update(b"abc").unwrap();
    assert_eq!(tracker.update(b"de"), Err(OtaError::Receive));
    assert_eq!(tracker.received(), 3);
}

#[test]
fn progress_milestones_every_ten_percent() {
    let mut tracker = ImageTracker::new(1000);
    let mut milestones = Vec::new();
    for _ in 0..100 {
        tracker.update(&[0u8; 10]).unwrap();
        if let Some(progress) = tracker.progress_milestone() {
            milestones.push(progress);
        }
    }
    assert_eq!(milestones, [10, 20, 30, 40, 50, 60, 70, 80, 90, 100]);
}
