use chrono::{ DateTime, Utc };

const FNV_OFFSET_BASIS: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

/// Derive a short clearance identifier such as `417K` from a callsign and the
/// current second.
///
/// Same callsign within the same second gives the same identifier. The
/// keyspace is small (900 numbers x 25 letters) and collisions are not
/// checked; the letter never reaches `Z`.
pub fn generate(callsign: &str, now: DateTime<Utc>) -> String {
    let seed = (now.timestamp() as u32).wrapping_add(callsign_hash(callsign) as u32);

    let number = seed % 900 + 100;
    let letter = char::from(b'A' + (seed % 25) as u8);

    format!("{number}{letter}")
}

/// FNV-1a, stable across builds and platforms
fn callsign_hash(callsign: &str) -> u64 {
    callsign.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u64::from(byte)).wrapping_mul(FNV_PRIME)
    })
}
