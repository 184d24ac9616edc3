//! The traveler: where the player stands and what they can operate.

use cryptwalk_types::{PassageType, Position};

/// Transient motion. Cleared whenever the traveler is placed in a new room.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Velocity {
    pub x: f32,
    pub y: f32,
}

impl Velocity {
    pub const ZERO: Velocity = Velocity { x: 0.0, y: 0.0 };

    pub fn is_zero(&self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }
}

/// The player's body as far as the room graph is concerned.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Traveler {
    pub position: Position,
    pub velocity: Velocity,
    /// The one kind of secret passage this character can open, assigned at
    /// character creation. `None` means no secret passage opens for them.
    pub passage_access: Option<PassageType>,
}

impl Traveler {
    pub fn new(passage_access: Option<PassageType>) -> Self {
        Self {
            position: Position::ORIGIN,
            velocity: Velocity::ZERO,
            passage_access,
        }
    }

    /// Puts the traveler at `position` and drops any carried motion.
    pub fn place(&mut self, position: Position) {
        self.position = position;
        self.velocity = Velocity::ZERO;
    }

    /// Capability check used by the secret-passage guard.
    pub fn can_operate(&self, passage: PassageType) -> bool {
        self.passage_access == Some(passage)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_place_clears_velocity() {
        let mut traveler = Traveler::new(None);
        traveler.velocity = Velocity { x: 3.5, y: -1.0 };

        traveler.place(Position::new(4, 2));

        assert_eq!(traveler.position, Position::new(4, 2));
        assert!(traveler.velocity.is_zero());
    }

    #[test]
    fn test_can_operate_only_assigned_passage() {
        let traveler = Traveler::new(Some(PassageType::Clock));
        assert!(traveler.can_operate(PassageType::Clock));
        assert!(!traveler.can_operate(PassageType::Bookcase));
        assert!(!Traveler::new(None).can_operate(PassageType::Barrel));
    }
}
