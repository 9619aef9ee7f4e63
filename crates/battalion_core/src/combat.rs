//! Damage resolution.
//!
//! Damage scales linearly with the attacker's remaining health:
//!
//! ```text
//! damage = max(MIN_DAMAGE, base × (½ + ½ × health / max_health))
//! ```
//!
//! A badly hurt unit still deals half its nominal damage. The product is
//! computed in fixed point and truncated, so results are identical on
//! every platform.

use fixed::types::I32F32;

use crate::unit::Unit;

/// Fixed-point number type for combat math.
pub type Fixed = I32F32;

/// Minimum damage floor - attacks always deal at least 1 damage.
pub const MIN_DAMAGE: u32 = 1;

const HALF: Fixed = Fixed::from_bits(1 << 31);

/// Damage `attacker` deals with its current health.
#[must_use]
pub fn damage(attacker: &Unit) -> u32 {
    let stats = attacker.stats();
    let fraction = Fixed::from_num(attacker.health) / Fixed::from_num(stats.max_health.max(1));
    let scaled = Fixed::from_num(stats.damage) * (HALF + HALF * fraction);
    scaled.to_num::<u32>().max(MIN_DAMAGE)
}

/// Whether a defender that survived a hit strikes back.
///
/// `was_repairing` is the defender's flag from before the hit, and
/// `attacker_in_range` whether the attacker's cell is in the defender's
/// attackable map.
#[must_use]
pub fn counter_attacks(defender: &Unit, attacker: &Unit, was_repairing: bool, attacker_in_range: bool) -> bool {
    defender.health > 0 && !was_repairing && defender.can_attack(attacker) && attacker_in_range
}
