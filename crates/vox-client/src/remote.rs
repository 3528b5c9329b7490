//! Visual proxies for other players.
//!
//! Position updates arrive at the server's tick rate; rendering runs much
//! faster. Every frame the rendered state moves a fixed fraction of the
//! remaining distance toward the latest network target, so motion stays
//! smooth under irregular packet arrival and converges without overshoot.

/// Fraction of the remaining distance covered per frame.
pub const INTERPOLATION_ALPHA: f32 = 0.2;

/// A remote player as the renderer sees it.
#[derive(Debug)]
pub struct RemoteEntity {
    pub id: u32,
    pub username: String,
    // Rendered state: chases the target, never jumps after first sighting.
    x: f32,
    y: f32,
    z: f32,
    yaw: f32,
    pitch: f32,
    // Latest state received from the network.
    target_x: f32,
    target_y: f32,
    target_z: f32,
    target_yaw: f32,
    target_pitch: f32,
    on_ground: bool,
}

impl RemoteEntity {
    /// Create a proxy at its first known position. Rendered and target state
    /// start equal; this is the only time the rendered state jumps.
    pub fn new(id: u32, username: impl Into<String>, x: f32, y: f32, z: f32, yaw: f32, pitch: f32) -> Self {
        Self {
            id,
            username: username.into(),
            x,
            y,
            z,
            yaw,
            pitch,
            target_x: x,
            target_y: y,
            target_z: z,
            target_yaw: yaw,
            target_pitch: pitch,
            on_ground: false,
        }
    }

    /// Record a network update. Only the target moves; the rendered state
    /// catches up over the following frames.
    pub fn set_target(&mut self, x: f32, y: f32, z: f32, yaw: f32, pitch: f32, on_ground: bool) {
        self.target_x = x;
        self.target_y = y;
        self.target_z = z;
        self.target_yaw = yaw;
        self.target_pitch = pitch;
        self.on_ground = on_ground;
    }

    /// Advance the rendered state one frame toward the target.
    pub fn interpolate(&mut self, alpha: f32) {
        self.x = lerp(self.x, self.target_x, alpha);
        self.y = lerp(self.y, self.target_y, alpha);
        self.z = lerp(self.z, self.target_z, alpha);
        self.yaw = lerp_angle(self.yaw, self.target_yaw, alpha);
        self.pitch = lerp_angle(self.pitch, self.target_pitch, alpha);
    }

    pub fn position(&self) -> (f32, f32, f32) {
        (self.x, self.y, self.z)
    }

    pub fn rotation(&self) -> (f32, f32) {
        (self.yaw, self.pitch)
    }

    pub fn target_position(&self) -> (f32, f32, f32) {
        (self.target_x, self.target_y, self.target_z)
    }

    pub fn on_ground(&self) -> bool {
        self.on_ground
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// Angle interpolation along the shortest path. Lerping raw degrees across
/// the ±180° wrap would spin the long way around.
fn lerp_angle(a: f32, b: f32, t: f32) -> f32 {
    let mut diff = b - a;
    while diff > 180.0 {
        diff -= 360.0;
    }
    while diff < -180.0 {
        diff += 360.0;
    }
    a + diff * t
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity_at(x: f32) -> RemoteEntity {
        RemoteEntity::new(1, "Alex", x, 70.0, 0.0, 0.0, 0.0)
    }

    #[test]
    fn starts_at_first_sighting() {
        let e = RemoteEntity::new(1, "Alex", 5.0, 70.0, -2.0, 45.0, 10.0);
        assert_eq!(e.position(), (5.0, 70.0, -2.0));
        assert_eq!(e.target_position(), (5.0, 70.0, -2.0));
        assert_eq!(e.rotation(), (45.0, 10.0));
    }

    #[test]
    fn moves_toward_target_without_overshoot() {
        let mut e = entity_at(0.0);
        e.set_target(10.0, 70.0, 0.0, 0.0, 0.0, true);
        let mut prev = 0.0f32;
        for _ in 0..200 {
            e.interpolate(INTERPOLATION_ALPHA);
            let (x, ..) = e.position();
            assert!(x >= prev, "moved backwards: {x} < {prev}");
            assert!(x <= 10.0, "overshot: {x}");
            prev = x;
        }
        // Converged after enough frames with no further updates.
        assert!((e.position().0 - 10.0).abs() < 1e-3);
    }

    #[test]
    fn irregular_updates_stay_bounded() {
        let mut e = entity_at(0.0);
        // Targets arrive at uneven intervals; the rendered position must
        // always lie between where it was and the latest target.
        for (frames, target) in [(3, 4.0f32), (1, -2.0), (7, 8.0)] {
            e.set_target(target, 70.0, 0.0, 0.0, 0.0, true);
            for _ in 0..frames {
                let before = e.position().0;
                e.interpolate(INTERPOLATION_ALPHA);
                let after = e.position().0;
                let (lo, hi) = if before <= target { (before, target) } else { (target, before) };
                assert!(after >= lo && after <= hi, "{after} outside [{lo}, {hi}]");
            }
        }
    }

    #[test]
    fn yaw_wraps_the_short_way() {
        let mut e = RemoteEntity::new(1, "Alex", 0.0, 0.0, 0.0, 350.0, 0.0);
        e.set_target(0.0, 0.0, 0.0, 10.0, 0.0, false);
        e.interpolate(INTERPOLATION_ALPHA);
        // Shortest path from 350° to 10° is +20°, so one frame adds +4°.
        let (yaw, _) = e.rotation();
        assert!((yaw - 354.0).abs() < 1e-4, "went the long way: {yaw}");
    }

    #[test]
    fn yaw_wraps_the_short_way_downward() {
        let mut e = RemoteEntity::new(1, "Alex", 0.0, 0.0, 0.0, 10.0, 0.0);
        e.set_target(0.0, 0.0, 0.0, 350.0, 0.0, false);
        e.interpolate(INTERPOLATION_ALPHA);
        let (yaw, _) = e.rotation();
        assert!((yaw - 6.0).abs() < 1e-4, "went the long way: {yaw}");
    }

    #[test]
    fn full_alpha_snaps_to_target() {
        let mut e = entity_at(0.0);
        e.set_target(3.0, 71.0, -4.0, 90.0, 15.0, true);
        e.interpolate(1.0);
        assert_eq!(e.position(), (3.0, 71.0, -4.0));
        assert_eq!(e.rotation(), (90.0, 15.0));
    }
}
