//! Per-session display color assignment.

use rand::Rng;

const HEX_DIGITS: &[u8; 16] = b"0123456789ABCDEF";

/// Draws six digits independently and uniformly from the hexadecimal
/// alphabet, giving a `#RRGGBB` color with 16-step granularity per channel.
/// Colors are not unique across sessions; collisions are accepted.
pub fn random_display_color<R: Rng>(rng: &mut R) -> String {
    let mut color = String::with_capacity(7);
    color.push('#');
    for _ in 0..6 {
        color.push(HEX_DIGITS[rng.gen_range(0..HEX_DIGITS.len())] as char);
    }
    color
}
