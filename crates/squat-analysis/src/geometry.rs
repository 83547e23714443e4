//! Planar joint geometry.

use squat_models::Landmark;

/// Angle at `vertex` between the rays towards `a` and `c`, in degrees.
///
/// Computed as the absolute difference of the `atan2` bearings of the two
/// rays in the image plane (z is ignored). The raw difference can reach
/// 360 degrees, so anything above 180 is folded back to `360 - angle`.
/// The result is always in `[0, 180]` and symmetric in `a` and `c`.
pub fn joint_angle(a: Landmark, vertex: Landmark, c: Landmark) -> f64 {
    let bearing_c = (c.y - vertex.y).atan2(c.x - vertex.x);
    let bearing_a = (a.y - vertex.y).atan2(a.x - vertex.x);
    let angle = (bearing_c - bearing_a).to_degrees().abs();

    if angle > 180.0 {
        // Rounding on opposite-signed zero bearings can land just past 360.
        (360.0 - angle).max(0.0)
    } else {
        angle
    }
}

/// Euclidean distance between two landmarks, including depth.
pub fn distance(a: Landmark, b: Landmark) -> f64 {
    let dx = a.x - b.x;
    let dy = a.y - b.y;
    let dz = a.z - b.z;
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// Midpoint of two landmarks.
pub fn midpoint(a: Landmark, b: Landmark) -> Landmark {
    Landmark::new((a.x + b.x) / 2.0, (a.y + b.y) / 2.0, (a.z + b.z) / 2.0)
}
