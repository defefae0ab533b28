//! Sample - raw 9-axis IMU reading
//!
//! Produced by sensor sources, consumed by the gesture engine.

use serde::{Deserialize, Serialize};

/// 3D vector
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vector3 {
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Euclidean norm
    #[inline]
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    #[inline]
    pub fn to_array(self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }
}

impl From<[f64; 3]> for Vector3 {
    fn from(v: [f64; 3]) -> Self {
        Self::new(v[0], v[1], v[2])
    }
}

/// One IMU reading.
///
/// Immutable once produced; the engine copies it into its rolling buffer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    /// Accelerometer (m/s², gravity included)
    pub accel: Vector3,

    /// Gyroscope (deg/s)
    pub gyro: Vector3,

    /// Magnetometer (µT)
    #[serde(default)]
    pub mag: Vector3,
}

impl Sample {
    pub const fn new(accel: Vector3, gyro: Vector3, mag: Vector3) -> Self {
        Self { accel, gyro, mag }
    }

    /// Device lying still, screen up: gravity on +Z only.
    pub const fn at_rest() -> Self {
        Self {
            accel: Vector3::new(0.0, 0.0, 9.81),
            gyro: Vector3::new(0.0, 0.0, 0.0),
            mag: Vector3::new(0.0, 0.0, 0.0),
        }
    }

    /// Accelerometer magnitude
    #[inline]
    pub fn accel_magnitude(&self) -> f64 {
        self.accel.magnitude()
    }

    /// Gyroscope magnitude
    #[inline]
    pub fn gyro_magnitude(&self) -> f64 {
        self.gyro.magnitude()
    }

    /// Value of a single axis
    #[inline]
    pub fn axis(&self, axis: Axis) -> f64 {
        match axis {
            Axis::AccelX => self.accel.x,
            Axis::AccelY => self.accel.y,
            Axis::AccelZ => self.accel.z,
            Axis::GyroX => self.gyro.x,
            Axis::GyroY => self.gyro.y,
            Axis::GyroZ => self.gyro.z,
            Axis::MagX => self.mag.x,
            Axis::MagY => self.mag.y,
            Axis::MagZ => self.mag.z,
        }
    }
}

/// Sensor axis in canonical order.
///
/// The order of [`Axis::ALL`] fixes the layout of the feature vector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    AccelX,
    AccelY,
    AccelZ,
    GyroX,
    GyroY,
    GyroZ,
    MagX,
    MagY,
    MagZ,
}

impl Axis {
    pub const ALL: [Axis; 9] = [
        Axis::AccelX,
        Axis::AccelY,
        Axis::AccelZ,
        Axis::GyroX,
        Axis::GyroY,
        Axis::GyroZ,
        Axis::MagX,
        Axis::MagY,
        Axis::MagZ,
    ];

    /// Position in [`Axis::ALL`]
    pub fn index(self) -> usize {
        self as usize
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Axis::AccelX => "accel_x",
            Axis::AccelY => "accel_y",
            Axis::AccelZ => "accel_z",
            Axis::GyroX => "gyro_x",
            Axis::GyroY => "gyro_y",
            Axis::GyroZ => "gyro_z",
            Axis::MagX => "mag_x",
            Axis::MagY => "mag_y",
            Axis::MagZ => "mag_z",
        }
    }
}

/// Sample stamped by its source.
///
/// This is what travels through the ingestion channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplePacket {
    /// Source ID
    pub source_id: String,

    /// Seconds since the source started
    pub timestamp: f64,

    /// Monotonic per-source sequence number
    pub sequence: u64,

    /// The reading
    pub sample: Sample,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_axis_order_matches_index() {
        for (i, axis) in Axis::ALL.iter().enumerate() {
            assert_eq!(axis.index(), i);
        }
    }

    #[test]
    fn test_axis_access() {
        let sample = Sample::new(
            Vector3::new(1.0, 2.0, 3.0),
            Vector3::new(4.0, 5.0, 6.0),
            Vector3::new(7.0, 8.0, 9.0),
        );
        let values: Vec<f64> = Axis::ALL.iter().map(|a| sample.axis(*a)).collect();
        assert_eq!(values, vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0, 7.0, 8.0, 9.0]);
    }

    #[test]
    fn test_rest_magnitude() {
        assert!((Sample::at_rest().accel_magnitude() - 9.81).abs() < 1e-12);
    }

    #[test]
    fn test_sample_without_mag_deserializes() {
        let json = r#"{"accel":{"x":0.0,"y":0.0,"z":9.81},"gyro":{"x":1.0,"y":0.0,"z":0.0}}"#;
        let sample: Sample = serde_json::from_str(json).unwrap();
        assert_eq!(sample.mag, Vector3::default());
        assert_eq!(sample.gyro.x, 1.0);
    }
}
