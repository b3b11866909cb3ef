//! Request signature ("zzc" sign) expected by the QQ Music web API.

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use sha1::{Digest, Sha1};

const PART_1_INDEXES: [usize; 8] = [23, 14, 6, 36, 16, 40, 7, 19];
const PART_2_INDEXES: [usize; 8] = [16, 1, 32, 12, 19, 27, 8, 5];
const SCRAMBLE_VALUES: [u8; 20] = [
    89, 39, 179, 150, 218, 82, 58, 252, 177, 52, 186, 123, 120, 64, 242, 133, 143, 161, 121, 179,
];

/// Sign a request body.
///
/// The signature is derived from the uppercase hex SHA-1 of the body: two
/// groups of picked hex digits around the base64 of the digest XORed with a
/// fixed key, lowercased and stripped of base64 punctuation.
pub fn zzc_sign(body: &str) -> String {
    let digest = Sha1::digest(body.as_bytes());
    let hex: Vec<u8> = digest
        .iter()
        .flat_map(|b| format!("{:02X}", b).into_bytes())
        .collect();

    let pick = |indexes: &[usize]| -> String {
        indexes
            .iter()
            .filter_map(|&i| hex.get(i).map(|&c| c as char))
            .collect()
    };

    let scrambled: Vec<u8> = digest
        .iter()
        .zip(SCRAMBLE_VALUES)
        .map(|(b, key)| b ^ key)
        .collect();
    let encoded: String = STANDARD
        .encode(scrambled)
        .chars()
        .filter(|c| !matches!(c, '/' | '\\' | '+' | '='))
        .collect();

    format!(
        "zzc{}{}{}",
        pick(&PART_1_INDEXES),
        encoded,
        pick(&PART_2_INDEXES)
    )
    .to_lowercase()
}
