use glam::Vec2;

/// Which side of a contact a manifold point's persistent id refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeatureType {
    Vertex,
    Face,
}

/// Persistent contact feature id, packed into 4 logical bytes per the
/// narrow-phase contract. Matched across steps to warm-start impulses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct ContactFeature {
    pub index_a: u8,
    pub index_b: u8,
    pub type_a: u8,
    pub type_b: u8,
}

impl ContactFeature {
    pub fn new(index_a: u8, type_a: FeatureType, index_b: u8, type_b: FeatureType) -> Self {
        Self {
            index_a,
            index_b,
            type_a: type_a as u8,
            type_b: type_b as u8,
        }
    }

    pub fn key(&self) -> u32 {
        (self.index_a as u32)
            | (self.index_b as u32) << 8
            | (self.type_a as u32) << 16
            | (self.type_b as u32) << 24
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ManifoldPoint {
    /// Contact point in the local frame of the reference shape (shape A
    /// for `FaceA`/`Circles`, shape B for `FaceB`).
    pub local_point: Vec2,
    pub id: ContactFeature,
    pub normal_impulse: f32,
    pub tangent_impulse: f32,
}

impl ManifoldPoint {
    fn new(local_point: Vec2, id: ContactFeature) -> Self {
        Self {
            local_point,
            id,
            normal_impulse: 0.0,
            tangent_impulse: 0.0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManifoldType {
    Circles,
    FaceA,
    FaceB,
}

/// A narrow-phase collision result: up to `MAX_MANIFOLD_POINTS` contact
/// points sharing a normal, all expressed in a reference shape's local
/// frame so warm-starting survives small motions between steps.
#[derive(Debug, Clone)]
pub struct Manifold {
    pub manifold_type: ManifoldType,
    pub local_normal: Vec2,
    pub local_point: Vec2,
    pub points: Vec<ManifoldPoint>,
}

impl Manifold {
    pub fn empty() -> Self {
        Self {
            manifold_type: ManifoldType::Circles,
            local_normal: Vec2::ZERO,
            local_point: Vec2::ZERO,
            points: Vec::new(),
        }
    }

    pub fn circles(local_point_a: Vec2, local_point_b_in_a: Vec2, normal: Vec2) -> Self {
        Self {
            manifold_type: ManifoldType::Circles,
            local_normal: normal,
            local_point: local_point_a,
            points: vec![ManifoldPoint::new(
                local_point_b_in_a,
                ContactFeature::new(0, FeatureType::Vertex, 0, FeatureType::Vertex),
            )],
        }
    }

    pub fn face(
        manifold_type: ManifoldType,
        local_normal: Vec2,
        local_point: Vec2,
        points: Vec<(Vec2, ContactFeature)>,
    ) -> Self {
        Self {
            manifold_type,
            local_normal,
            local_point,
            points: points
                .into_iter()
                .map(|(p, id)| ManifoldPoint::new(p, id))
                .collect(),
        }
    }
}
