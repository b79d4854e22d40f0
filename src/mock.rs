//! Fixed payloads for the workout-history and heart-rate-zone queries.
//!
//! Neither query consults a data source; both return the same literal
//! payload on every call.

use serde_json::{json, Value};

/// Recent workout history
pub fn workout_history() -> Value {
    json!({
        "workouts": [
            {
                "date": "2025-01-14",
                "type": "Running",
                "durationMinutes": 32,
                "distanceKm": 5.2,
                "activeCalories": 345,
                "averageHeartRate": 152
            },
            {
                "date": "2025-01-12",
                "type": "Cycling",
                "durationMinutes": 58,
                "distanceKm": 21.4,
                "activeCalories": 510,
                "averageHeartRate": 138
            },
            {
                "date": "2025-01-10",
                "type": "Strength Training",
                "durationMinutes": 45,
                "distanceKm": null,
                "activeCalories": 260,
                "averageHeartRate": 118
            },
            {
                "date": "2025-01-08",
                "type": "Walking",
                "durationMinutes": 40,
                "distanceKm": 3.4,
                "activeCalories": 170,
                "averageHeartRate": 104
            }
        ],
        "totalWorkouts": 4,
        "totalDurationMinutes": 175
    })
}

/// Time spent per heart-rate zone
pub fn heart_rate_zones() -> Value {
    json!({
        "maxHeartRate": 185,
        "zones": [
            { "zone": 1, "name": "Recovery", "minBpm": 93, "maxBpm": 111, "minutes": 142 },
            { "zone": 2, "name": "Endurance", "minBpm": 111, "maxBpm": 130, "minutes": 96 },
            { "zone": 3, "name": "Tempo", "minBpm": 130, "maxBpm": 148, "minutes": 41 },
            { "zone": 4, "name": "Threshold", "minBpm": 148, "maxBpm": 167, "minutes": 18 },
            { "zone": 5, "name": "Maximum", "minBpm": 167, "maxBpm": 185, "minutes": 4 }
        ]
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workout_history_totals_match_entries() {
        let history = workout_history();
        let workouts = history["workouts"].as_array().unwrap();

        assert_eq!(history["totalWorkouts"], workouts.len());
        let duration: u64 = workouts
            .iter()
            .map(|w| w["durationMinutes"].as_u64().unwrap())
            .sum();
        assert_eq!(history["totalDurationMinutes"], duration);
    }

    #[test]
    fn test_zones_are_contiguous() {
        let payload = heart_rate_zones();
        let zones = payload["zones"].as_array().unwrap();

        assert_eq!(zones.len(), 5);
        for pair in zones.windows(2) {
            assert_eq!(pair[0]["maxBpm"], pair[1]["minBpm"]);
        }
        assert_eq!(zones[4]["maxBpm"], payload["maxHeartRate"]);
    }

    #[test]
    fn test_payloads_are_stable() {
        assert_eq!(workout_history(), workout_history());
        assert_eq!(heart_rate_zones(), heart_rate_zones());
    }
}
