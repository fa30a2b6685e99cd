//! Geometric commute estimate used when no routed answer is available.

use super::TravelMode;

/// Road-distance inflation by straight-line band.
pub fn road_distance_km(straight_line_km: f64) -> f64 {
    let factor = if straight_line_km < 10.0 {
        1.3
    } else if straight_line_km < 50.0 {
        1.4
    } else {
        1.5
    };
    straight_line_km * factor
}

/// Off-peak door-to-door minutes for a road distance.
pub fn travel_minutes(road_km: f64, mode: TravelMode) -> f64 {
    if road_km <= 0.0 {
        return MINIMUM_MINUTES;
    }

    match mode {
        TravelMode::Driving => {
            let (speed_kmh, overhead) = band(road_km, &DRIVING_BANDS);
            road_km / speed_kmh * 60.0 + overhead
        }
        TravelMode::Transit => {
            let (speed_kmh, overhead) = band(road_km, &TRANSIT_BANDS);
            let minutes = road_km / speed_kmh * 60.0 + overhead;
            if road_km > TRANSIT_TRANSFER_KM {
                minutes * TRANSIT_TRANSFER_PENALTY
            } else {
                minutes
            }
        }
    }
}

const MINIMUM_MINUTES: f64 = 5.0;
const TRANSIT_TRANSFER_KM: f64 = 30.0;
const TRANSIT_TRANSFER_PENALTY: f64 = 1.2;

/// (upper bound km, average speed km/h, fixed overhead minutes); the last band is open-ended.
const DRIVING_BANDS: [(f64, f64, f64); 4] = [
    (10.0, 35.0, 5.0),
    (30.0, 50.0, 5.0),
    (60.0, 65.0, 5.0),
    (f64::INFINITY, 80.0, 10.0),
];

const TRANSIT_BANDS: [(f64, f64, f64); 4] = [
    (10.0, 20.0, 15.0),
    (30.0, 30.0, 25.0),
    (60.0, 45.0, 30.0),
    (f64::INFINITY, 55.0, 40.0),
];

fn band(road_km: f64, bands: &[(f64, f64, f64); 4]) -> (f64, f64) {
    bands
        .iter()
        .find(|(upper, _, _)| road_km < *upper)
        .map(|(_, speed, overhead)| (*speed, *overhead))
        .unwrap_or((bands[3].1, bands[3].2))
}
