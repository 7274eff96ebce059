//! Viewer relevancy scoring.
//!
//! A heuristic used for prioritization only. False positives and negatives
//! are acceptable.

/// Viewer identifier (one per connection).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ViewerId(pub u32);

/// Team identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TeamId(pub u32);

/// Basic 3D vector for spatial queries.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Vec3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Vec3 {
    pub const ZERO: Self = Self::new(0.0, 0.0, 0.0);

    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    #[must_use]
    pub fn sub(self, other: Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    #[must_use]
    pub fn dot(self, other: Self) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    #[must_use]
    pub fn distance_sq(self, other: Self) -> f32 {
        let delta = self.sub(other);
        delta.dot(delta)
    }

    #[must_use]
    pub fn distance(self, other: Self) -> f32 {
        self.distance_sq(other).sqrt()
    }

    /// Returns the unit vector, or `None` for a (near) zero vector.
    #[must_use]
    pub fn normalized(self) -> Option<Self> {
        let len = self.dot(self).sqrt();
        (len > f32::EPSILON).then(|| Self::new(self.x / len, self.y / len, self.z / len))
    }
}

/// What the host knows about one viewer.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ViewerContext {
    pub id: ViewerId,
    pub position: Vec3,
    /// View direction; need not be normalized.
    pub forward: Vec3,
    pub team: Option<TeamId>,
    /// Whether the viewer currently has an unobstructed view of the owner.
    pub line_of_sight: bool,
}

impl ViewerContext {
    #[must_use]
    pub const fn new(id: ViewerId, position: Vec3) -> Self {
        Self {
            id,
            position,
            forward: Vec3::new(1.0, 0.0, 0.0),
            team: None,
            line_of_sight: false,
        }
    }
}

/// The owner of the replicated equipment.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OwnerContext {
    /// The owner's own connection, if it has one.
    pub viewer: Option<ViewerId>,
    pub position: Vec3,
    pub team: Option<TeamId>,
    /// Whether a weapon slot is active.
    pub weapon_active: bool,
}

impl OwnerContext {
    #[must_use]
    pub const fn new(viewer: Option<ViewerId>, position: Vec3) -> Self {
        Self {
            viewer,
            position,
            team: None,
            weapon_active: false,
        }
    }

    #[must_use]
    pub fn is_owner(&self, viewer: ViewerId) -> bool {
        self.viewer == Some(viewer)
    }
}

/// Tuning for [`RelevancyEstimator`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RelevancyConfig {
    /// Score reaches zero at this distance.
    pub radius: f32,
    pub line_of_sight_multiplier: f32,
    /// Facing factor floor when the viewer looks away.
    pub min_facing_factor: f32,
    pub combat_multiplier: f32,
    /// Same-team factor. Placeholder policy until real affinity exists.
    pub ally_factor: f32,
    /// Other-team or unknown factor.
    pub enemy_factor: f32,
    /// `RelevantOnly` replicates to viewers scoring above this.
    pub relevant_threshold: f32,
}

impl RelevancyConfig {
    /// Radius floor applied by [`set_radius`](Self::set_radius).
    pub const MIN_RADIUS: f32 = 100.0;

    /// Sets the radius, clamped to [`MIN_RADIUS`](Self::MIN_RADIUS).
    pub fn set_radius(&mut self, radius: f32) {
        self.radius = radius.max(Self::MIN_RADIUS);
    }
}

impl Default for RelevancyConfig {
    fn default() -> Self {
        Self {
            radius: 5000.0,
            line_of_sight_multiplier: 2.0,
            min_facing_factor: 0.5,
            combat_multiplier: 1.5,
            ally_factor: 1.2,
            enemy_factor: 1.0,
            relevant_threshold: 0.1,
        }
    }
}

/// Scores how much a viewer cares about the owner's equipment.
#[derive(Debug, Clone, Default)]
pub struct RelevancyEstimator {
    config: RelevancyConfig,
}

impl RelevancyEstimator {
    #[must_use]
    pub const fn new(config: RelevancyConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub const fn config(&self) -> &RelevancyConfig {
        &self.config
    }

    pub fn config_mut(&mut self) -> &mut RelevancyConfig {
        &mut self.config
    }

    /// Returns a score in `[0, 1]`; the owner's own connection always scores 1.
    #[must_use]
    pub fn score(&self, viewer: &ViewerContext, owner: &OwnerContext, network_quality: f32) -> f32 {
        if owner.is_owner(viewer.id) {
            return 1.0;
        }
        let cfg = &self.config;

        let distance = viewer.position.distance(owner.position);
        let falloff = (1.0 - (distance / cfg.radius.max(f32::EPSILON)).clamp(0.0, 1.0)).sqrt();
        if falloff <= 0.0 {
            return 0.0;
        }

        let visibility = if viewer.line_of_sight {
            cfg.line_of_sight_multiplier
        } else {
            1.0
        };

        let facing_dot = match (
            viewer.forward.normalized(),
            owner.position.sub(viewer.position).normalized(),
        ) {
            (Some(forward), Some(bearing)) => forward.dot(bearing),
            _ => 1.0,
        };
        let facing = ((facing_dot + 1.0) / 2.0).max(cfg.min_facing_factor);

        let combat = if owner.weapon_active {
            cfg.combat_multiplier
        } else {
            1.0
        };

        let team = match (viewer.team, owner.team) {
            (Some(a), Some(b)) if a == b => cfg.ally_factor,
            _ => cfg.enemy_factor,
        };

        let quality = network_quality.clamp(0.0, 1.0);
        let network = 0.5 + 0.5 * quality;

        (falloff * visibility * facing * combat * team * network).clamp(0.0, 1.0)
    }

    /// Returns `true` if the score clears the `RelevantOnly` threshold.
    #[must_use]
    pub fn is_relevant(&self, score: f32) -> bool {
        score > self.config.relevant_threshold
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewer_at(x: f32) -> ViewerContext {
        ViewerContext {
            id: ViewerId(2),
            position: Vec3::new(x, 0.0, 0.0),
            forward: Vec3::new(-1.0, 0.0, 0.0),
            team: None,
            line_of_sight: false,
        }
    }

    fn owner() -> OwnerContext {
        OwnerContext::new(Some(ViewerId(1)), Vec3::ZERO)
    }

    #[test]
    fn vec3_math() {
        let a = Vec3::new(3.0, 4.0, 0.0);
        assert!((a.distance(Vec3::ZERO) - 5.0).abs() < 1e-6);
        assert_eq!(a.distance_sq(Vec3::ZERO), 25.0);
        assert!(Vec3::ZERO.normalized().is_none());
        let n = a.normalized().unwrap();
        assert!((n.dot(n) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn self_is_always_one() {
        let estimator = RelevancyEstimator::default();
        let mut viewer = viewer_at(1.0e6);
        viewer.id = ViewerId(1);
        assert_eq!(estimator.score(&viewer, &owner(), 0.0), 1.0);
    }

    #[test]
    fn beyond_radius_is_zero() {
        let estimator = RelevancyEstimator::default();
        assert_eq!(estimator.score(&viewer_at(6000.0), &owner(), 1.0), 0.0);
        assert_eq!(estimator.score(&viewer_at(5000.0), &owner(), 1.0), 0.0);
    }

    #[test]
    fn falloff_is_square_root_shaped() {
        let estimator = RelevancyEstimator::default();
        // Facing the owner, no LOS, no combat, unknown team, perfect network.
        let score = estimator.score(&viewer_at(3750.0), &owner(), 1.0);
        assert!((score - 0.5).abs() < 1e-4, "score was {score}");
    }

    #[test]
    fn line_of_sight_and_combat_boost() {
        let estimator = RelevancyEstimator::default();
        let mut viewer = viewer_at(4800.0);
        let base = estimator.score(&viewer, &owner(), 1.0);
        viewer.line_of_sight = true;
        let visible = estimator.score(&viewer, &owner(), 1.0);
        assert!((visible - base * 2.0).abs() < 1e-4);

        let mut armed = owner();
        armed.weapon_active = true;
        let combat = estimator.score(&viewer, &armed, 1.0);
        assert!((combat - base * 3.0).abs() < 1e-4);
    }

    #[test]
    fn facing_away_keeps_half() {
        let estimator = RelevancyEstimator::default();
        let facing = viewer_at(3750.0);
        let mut away = facing;
        away.forward = Vec3::new(1.0, 0.0, 0.0);
        let ratio = estimator.score(&away, &owner(), 1.0) / estimator.score(&facing, &owner(), 1.0);
        assert!((ratio - 0.5).abs() < 1e-4);
    }

    #[test]
    fn allies_score_higher() {
        let estimator = RelevancyEstimator::default();
        let mut viewer = viewer_at(4500.0);
        let mut owner = owner();
        owner.team = Some(TeamId(1));
        viewer.team = Some(TeamId(2));
        let enemy = estimator.score(&viewer, &owner, 1.0);
        viewer.team = Some(TeamId(1));
        let ally = estimator.score(&viewer, &owner, 1.0);
        assert!((ally - enemy * 1.2).abs() < 1e-4);
    }

    #[test]
    fn poor_network_halves_score() {
        let estimator = RelevancyEstimator::default();
        let viewer = viewer_at(4500.0);
        let good = estimator.score(&viewer, &owner(), 1.0);
        let bad = estimator.score(&viewer, &owner(), 0.0);
        assert!((bad - good * 0.5).abs() < 1e-4);
    }

    #[test]
    fn score_is_clamped() {
        let estimator = RelevancyEstimator::default();
        let mut viewer = viewer_at(10.0);
        viewer.line_of_sight = true;
        let mut owner = owner();
        owner.weapon_active = true;
        assert_eq!(estimator.score(&viewer, &owner, 1.0), 1.0);
    }

    #[test]
    fn radius_floor() {
        let mut config = RelevancyConfig::default();
        config.set_radius(10.0);
        assert_eq!(config.radius, RelevancyConfig::MIN_RADIUS);
    }
}
