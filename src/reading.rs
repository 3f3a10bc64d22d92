//! Sensor reading model and generator.
//!
//! This module defines the `Reading` produced on every loop iteration, its
//! wire serialization (the JSON contract shared with queue consumers), and
//! the random generator that fabricates readings from the ambient clock.

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Serialization for the wire timestamp: extended ISO-8601 in UTC with
/// microsecond precision and a literal `Z` suffix, e.g.
/// `2024-01-01T00:00:03.120000Z`.
mod iso8601_micros {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6fZ";

    pub fn serialize<S>(ts: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&ts.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        DateTime::parse_from_rfc3339(&s)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(serde::de::Error::custom)
    }
}

/// A single sensor reading.
///
/// Constructed fresh on each loop iteration, serialized, handed to the
/// store, and dropped; the producer retains nothing after publish.
///
/// On the wire the value field is named `valor`, matching the contract
/// understood by the existing queue consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reading {
    /// Identifier of the producing sensor, constant for the process lifetime
    pub sensor_id: String,

    /// Measured value in [0, 100], rounded to 2 decimal places
    #[serde(rename = "valor")]
    pub value: f64,

    /// Instant of generation, UTC
    #[serde(with = "iso8601_micros")]
    pub timestamp: DateTime<Utc>,
}

/// Generator for simulated sensor readings.
///
/// Generation is a pure function of the ambient clock and a thread-local
/// random source; it has no side effects and cannot fail. The distribution
/// is uniform over [0, 100] — nothing fancier is needed for a simulated
/// sensor.
#[derive(Debug, Clone)]
pub struct ReadingGenerator {
    sensor_id: String,
}

impl ReadingGenerator {
    /// Create a generator stamping `sensor_id` into every reading.
    pub fn new(sensor_id: impl Into<String>) -> Self {
        Self {
            sensor_id: sensor_id.into(),
        }
    }

    /// Generate a single reading from the current clock and random source.
    pub fn generate(&self) -> Reading {
        let mut rng = rand::thread_rng();
        let value = round_to_2dp(rng.gen_range(0.0..=100.0));

        Reading {
            sensor_id: self.sensor_id.clone(),
            value,
            timestamp: Utc::now(),
        }
    }

    /// Get the sensor identifier this generator stamps into readings.
    pub fn sensor_id(&self) -> &str {
        &self.sensor_id
    }
}

/// Round a value to 2 decimal places.
fn round_to_2dp(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_generated_values_in_range_with_2dp() {
        let generator = ReadingGenerator::new("rbt-01");

        for _ in 0..1000 {
            let reading = generator.generate();
            assert!(reading.value >= 0.0, "value {} below 0", reading.value);
            assert!(reading.value <= 100.0, "value {} above 100", reading.value);

            // At most 2 decimal digits: scaling by 100 yields an integer.
            let scaled = reading.value * 100.0;
            assert!(
                (scaled - scaled.round()).abs() < 1e-9,
                "value {} has more than 2 decimal digits",
                reading.value
            );
        }
    }

    #[test]
    fn test_sensor_id_stamped_into_every_reading() {
        let generator = ReadingGenerator::new("rbt-07");
        for _ in 0..10 {
            let reading = generator.generate();
            assert_eq!(reading.sensor_id, "rbt-07");
            assert!(!reading.sensor_id.is_empty());
        }
    }

    #[test]
    fn test_timestamps_non_decreasing() {
        let generator = ReadingGenerator::new("rbt-01");
        let start = Utc::now();

        let mut previous = None;
        for _ in 0..100 {
            let reading = generator.generate();
            assert!(reading.timestamp >= start);
            if let Some(prev) = previous {
                assert!(reading.timestamp >= prev);
            }
            previous = Some(reading.timestamp);
        }
    }

    #[test]
    fn test_wire_format_keys_and_suffix() {
        let reading = Reading {
            sensor_id: "rbt-01".to_string(),
            value: 42.17,
            timestamp: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 3).unwrap()
                + chrono::Duration::microseconds(120_000),
        };

        let json = serde_json::to_string(&reading).unwrap();
        assert_eq!(
            json,
            r#"{"sensor_id":"rbt-01","valor":42.17,"timestamp":"2024-01-01T00:00:03.120000Z"}"#
        );
    }

    #[test]
    fn test_timestamp_parses_as_utc_iso8601() {
        let generator = ReadingGenerator::new("rbt-01");
        let reading = generator.generate();

        let json = serde_json::to_value(&reading).unwrap();
        let ts = json["timestamp"].as_str().unwrap();
        assert!(ts.ends_with('Z'));
        let parsed = DateTime::parse_from_rfc3339(ts).unwrap();
        assert_eq!(parsed.offset().local_minus_utc(), 0);
    }

    #[test]
    fn test_wire_round_trip() {
        let generator = ReadingGenerator::new("rbt-01");
        let reading = generator.generate();

        let json = serde_json::to_string(&reading).unwrap();
        let parsed: Reading = serde_json::from_str(&json).unwrap();

        assert_eq!(parsed.sensor_id, reading.sensor_id);
        assert!((parsed.value - reading.value).abs() < 1e-9);
        // Microsecond truncation on the wire; compare at that precision.
        assert_eq!(
            parsed.timestamp.timestamp_micros(),
            reading.timestamp.timestamp_micros()
        );
    }

    #[test]
    fn test_round_to_2dp() {
        assert_eq!(round_to_2dp(42.169), 42.17);
        assert_eq!(round_to_2dp(0.0), 0.0);
        assert_eq!(round_to_2dp(100.0), 100.0);
        assert_eq!(round_to_2dp(99.999), 100.0);
    }
}
