use glam::Vec3;

/// Anything living at a point of world space
pub trait Positioned {
    fn position(&self) -> Vec3;

    fn set_position(&mut self, position: Vec3);

    fn translate(&mut self, offset: Vec3) {
        self.set_position(self.position() + offset);
    }
}

/// Plain world entity: just a position
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Entity {
    position: Vec3,
}

impl Entity {
    pub fn new(position: Vec3) -> Self {
        Entity { position }
    }
}

impl Positioned for Entity {
    #[inline(always)]
    fn position(&self) -> Vec3 {
        self.position
    }

    #[inline(always)]
    fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_translate_offsets_position() {
        let mut entity = Entity::new(Vec3::new(1.0, 0.0, 0.0));
        entity.translate(Vec3::new(0.0, 2.0, 0.0));
        entity.translate(Vec3::Z);
        assert_eq!(entity.position(), Vec3::new(1.0, 2.0, 1.0));

        entity.set_position(Vec3::ZERO);
        assert_eq!(entity, Entity::default());
    }
}
