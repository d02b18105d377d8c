//! Race summaries per driver: stint breakdown, pit stops, fastest lap.

use serde::Serialize;
use std::collections::BTreeSet;

use crate::data::{LapField, LapRecord, RaceKey};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StintSummary {
    pub stint: u32,
    pub compound: String,
    pub start_lap: u32,
    pub end_lap: u32,
    pub laps: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DriverSummary {
    pub race: RaceKey,
    pub driver: String,
    pub team: String,
    pub laps_completed: usize,
    // in order of first use
    pub compounds_used: Vec<String>,
    pub pit_stops: usize,
    pub fastest_lap: Option<(u32, f64)>,
    pub top_speed: Option<f64>,
    pub final_position: Option<f64>,
    /// Laps on which the running position changed, a rough overtake count.
    pub position_changes: usize,
    pub stints: Vec<StintSummary>,
}

/// Splits one driver's laps (sorted by lap number) into stints. A stint ends
/// on a pit-in lap, before a pit-out lap, or where the compound or stint
/// number changes without a recorded pit.
pub fn stints(laps: &[LapRecord]) -> Vec<StintSummary> {
    let mut out = Vec::new();
    let Some(first) = laps.first() else {
        return out;
    };
    let mut start = first;

    for (i, curr) in laps.iter().enumerate() {
        let next = laps.get(i + 1);
        let is_stint_end = match next {
            None => true,
            Some(n) => {
                curr.pit_in || n.pit_out || n.compound != curr.compound || n.stint != curr.stint
            }
        };
        if is_stint_end {
            out.push(StintSummary {
                stint: start.stint,
                compound: start.compound.clone(),
                start_lap: start.lap_number,
                end_lap: curr.lap_number,
                laps: curr.lap_number - start.lap_number + 1,
            });
            if let Some(n) = next {
                start = n;
            }
        }
    }
    out
}

pub fn average_stint_length(summaries: &[DriverSummary], compound: &str) -> Option<f64> {
    let lengths: Vec<u32> = summaries
        .iter()
        .flat_map(|s| s.stints.iter())
        .filter(|s| s.compound == compound)
        .map(|s| s.laps)
        .collect();
    if lengths.is_empty() {
        None
    } else {
        Some(lengths.iter().sum::<u32>() as f64 / lengths.len() as f64)
    }
}

/// Summarises one driver's race. `laps` must be one (race, driver), sorted.
pub fn driver_summary(laps: &[LapRecord]) -> Option<DriverSummary> {
    let first = laps.first()?;
    let last = laps.last()?;

    let mut compounds_used: Vec<String> = Vec::new();
    for lap in laps {
        if !compounds_used.contains(&lap.compound) {
            compounds_used.push(lap.compound.clone());
        }
    }

    let fastest_lap = laps
        .iter()
        .min_by(|a, b| a.lap_time.total_cmp(&b.lap_time))
        .map(|l| (l.lap_number, l.lap_time));
    let top_speed = laps.iter().map(|l| l.speed_max).reduce(f64::max);
    let position_changes = laps
        .windows(2)
        .filter(|w| w[0].position > 0.0 && w[1].position > 0.0 && w[0].position != w[1].position)
        .count();

    Some(DriverSummary {
        race: first.race(),
        driver: first.driver.clone(),
        team: first.team.clone(),
        laps_completed: laps.len(),
        compounds_used,
        pit_stops: laps.iter().filter(|l| l.pit_in).count(),
        fastest_lap,
        top_speed,
        final_position: Some(last.position).filter(|p| *p > 0.0),
        position_changes,
        stints: stints(laps),
    })
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherRange {
    pub field: LapField,
    pub unit: &'static str,
    pub min: f64,
    pub max: f64,
}

const WEATHER_FIELDS: [(LapField, &str); 6] = [
    (LapField::AirTemp, "°C"),
    (LapField::TrackTemp, "°C"),
    (LapField::Humidity, "%"),
    (LapField::WindSpeed, "km/h"),
    (LapField::WindDirection, "°"),
    (LapField::Pressure, "hPa"),
];

/// Min/max of the session's weather readings. Empty when there are no laps.
pub fn weather_ranges(laps: &[LapRecord]) -> Vec<WeatherRange> {
    if laps.is_empty() {
        return Vec::new();
    }
    WEATHER_FIELDS
        .iter()
        .map(|&(field, unit)| {
            let values = laps.iter().map(|l| field.value(l));
            WeatherRange {
                field,
                unit,
                min: values.clone().fold(f64::INFINITY, f64::min),
                max: values.fold(f64::NEG_INFINITY, f64::max),
            }
        })
        .collect()
}

pub fn drivers(laps: &[LapRecord]) -> Vec<String> {
    laps.iter()
        .map(|l| l.driver.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
