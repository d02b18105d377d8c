//! Per-driver feature engineering.
//!
//! Every derived value for the row at lap `t` (lags, rolling windows, weather
//! deltas, stint degradation) is computed from laps strictly before `t` in the
//! same (season, round, driver) partition. The row's own lap fields are
//! included as-is; the target is the driver's next lap time, when there is one.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::{debug, info};

use crate::data::{bool_value, partition_by_driver, validate_unique, LapField, LapKey, LapRecord, RaceKey};
use crate::degradation::stint_slope;
use crate::error::{PipelineError, Result};

pub const TARGET: &str = "target_next_lap";

const WEATHER_DELTAS: [LapField; 5] = [
    LapField::AirTemp,
    LapField::TrackTemp,
    LapField::Humidity,
    LapField::Pressure,
    LapField::WindSpeed,
];

/// What to do with a row whose lag/rolling window reaches past the start of
/// its history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FillPolicy {
    /// Leave the row out of the table.
    DropRow,
    /// Keep the row; every value that needs missing history becomes this constant.
    Constant(f64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeatureConfig {
    /// Number of lag steps per lag field (`t-1 ..= t-lags`).
    pub lags: usize,
    pub lag_fields: Vec<LapField>,
    /// Trailing window length for rolling statistics.
    pub rolling_window: usize,
    pub rolling_fields: Vec<LapField>,
    /// `None` makes short history an error.
    pub fill: Option<FillPolicy>,
    /// Restrict lag/rolling history to the current stint.
    pub exclude_prior_stint: bool,
    /// Leave out rows whose own lap or target lap is a pit in/out lap.
    pub skip_pit_laps: bool,
}

impl Default for FeatureConfig {
    fn default() -> Self {
        Self {
            lags: 2,
            lag_fields: vec![
                LapField::LapTime,
                LapField::Sector1Time,
                LapField::Sector2Time,
                LapField::Sector3Time,
                LapField::SpeedMean,
                LapField::ThrottleMean,
            ],
            rolling_window: 3,
            rolling_fields: vec![LapField::LapTime, LapField::SpeedMean],
            fill: Some(FillPolicy::DropRow),
            exclude_prior_stint: false,
            skip_pit_laps: true,
        }
    }
}

/// Column names a feature row carries, in encoding order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureSchema {
    pub numeric: Vec<String>,
    pub categorical: Vec<String>,
}

impl FeatureSchema {
    pub fn contains(&self, name: &str) -> bool {
        self.numeric.iter().any(|n| n == name) || self.categorical.iter().any(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.numeric.len() + self.categorical.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub fn lag_name(field: LapField, step: usize) -> String {
    format!("{}_lag_{step}", field.name())
}

pub fn rolling_names(field: LapField, window: usize) -> [String; 3] {
    let f = field.name();
    [
        format!("{f}_roll_mean_{window}"),
        format!("{f}_roll_std_{window}"),
        format!("{f}_roll_median_{window}"),
    ]
}

pub fn delta_name(field: LapField) -> String {
    format!("{}_delta", field.name())
}

impl FeatureConfig {
    pub fn required_history(&self) -> usize {
        self.lags.max(self.rolling_window)
    }

    pub fn schema(&self) -> FeatureSchema {
        let mut numeric: Vec<String> = LapField::RAW.iter().map(|f| f.name().to_string()).collect();
        numeric.extend(
            ["fresh_tyre", "pit_in", "pit_out", "stint", "tyre_age", "degradation_rate"]
                .iter()
                .map(|s| s.to_string()),
        );
        for &field in &self.lag_fields {
            numeric.extend((1..=self.lags).map(|step| lag_name(field, step)));
        }
        for &field in &self.rolling_fields {
            numeric.extend(rolling_names(field, self.rolling_window));
        }
        numeric.extend(WEATHER_DELTAS.iter().map(|&f| delta_name(f)));

        FeatureSchema {
            numeric,
            categorical: vec!["driver".into(), "team".into(), "compound".into()],
        }
    }
}

/// One lap's own values, its history-derived features and, when the driver
/// completed the very next lap, that lap's time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureRow {
    pub key: LapKey,
    pub event_name: String,
    pub categorical: BTreeMap<String, String>,
    pub numeric: BTreeMap<String, f64>,
    pub target: Option<f64>,
}

impl FeatureRow {
    pub fn race(&self) -> RaceKey {
        self.key.race
    }

    pub fn numeric(&self, name: &str) -> Option<f64> {
        self.numeric.get(name).copied()
    }

    pub fn categorical(&self, name: &str) -> Option<&str> {
        self.categorical.get(name).map(String::as_str)
    }
}

// index of the first lap of each lap's stint
fn stint_starts(laps: &[LapRecord]) -> Vec<usize> {
    let mut starts = Vec::with_capacity(laps.len());
    let mut start = 0;
    for (i, lap) in laps.iter().enumerate() {
        if i > 0 {
            let prev = &laps[i - 1];
            if prev.pit_in || lap.pit_out || lap.stint != prev.stint || lap.compound != prev.compound {
                start = i;
            }
        }
        starts.push(start);
    }
    starts
}

fn mean(values: &[f64]) -> f64 {
    values.iter().sum::<f64>() / values.len() as f64
}

fn sample_std(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / (values.len() - 1) as f64).sqrt()
}

fn median(values: &[f64]) -> f64 {
    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        (sorted[mid - 1] + sorted[mid]) / 2.0
    } else {
        sorted[mid]
    }
}

/// How many laps directly before `lap` (t-1, t-2, ...) are present at the end
/// of `history`, stopping at the first missing lap number.
fn contiguous_history(history: &[LapRecord], lap: &LapRecord) -> usize {
    history
        .iter()
        .rev()
        .zip(1u32..)
        .take_while(|(prev, step)| prev.lap_number + step == lap.lap_number)
        .count()
}

/// Builds rows for one driver in one race. `laps` must be sorted by lap
/// number and belong to a single (season, round, driver).
///
/// Lag `k` of lap `t` is lap `t-k` itself; a missing lap number counts as
/// short history, as does the start of the partition. Rows are skipped when
/// `skip_pit_laps` applies, then when history is short and the fill policy is
/// `DropRow`. The final lap, and any lap whose successor is missing, keeps its
/// row with no target.
pub fn build_driver_features(laps: &[LapRecord], cfg: &FeatureConfig) -> Result<Vec<FeatureRow>> {
    debug_assert!(laps.windows(2).all(|w| {
        w[0].lap_number < w[1].lap_number && w[0].race() == w[1].race() && w[0].driver == w[1].driver
    }));

    let starts = stint_starts(laps);
    let required = cfg.required_history();
    let mut rows = Vec::with_capacity(laps.len());

    for (i, lap) in laps.iter().enumerate() {
        let next = laps.get(i + 1).filter(|n| n.lap_number == lap.lap_number + 1);
        if cfg.skip_pit_laps && (lap.is_pit_lap() || next.is_some_and(LapRecord::is_pit_lap)) {
            continue;
        }

        let scope_start = if cfg.exclude_prior_stint { starts[i] } else { 0 };
        let history = &laps[scope_start..i];
        let available = contiguous_history(history, lap);
        let previous = i
            .checked_sub(1)
            .map(|p| &laps[p])
            .filter(|p| p.lap_number + 1 == lap.lap_number);
        let short = available < required || previous.is_none();

        let fill = if short {
            match cfg.fill {
                None => {
                    return Err(PipelineError::InsufficientHistory {
                        driver: lap.driver.clone(),
                        season: lap.season,
                        round: lap.round,
                        lap: lap.lap_number,
                        required,
                        available,
                    })
                }
                Some(FillPolicy::DropRow) => continue,
                Some(FillPolicy::Constant(v)) => v,
            }
        } else {
            f64::NAN
        };

        let stint_first = laps[starts[i]].lap_number;
        let mut numeric = BTreeMap::new();
        for field in LapField::RAW {
            numeric.insert(field.name().to_string(), field.value(lap));
        }
        numeric.insert("fresh_tyre".into(), bool_value(lap.fresh_tyre));
        numeric.insert("pit_in".into(), bool_value(lap.pit_in));
        numeric.insert("pit_out".into(), bool_value(lap.pit_out));
        numeric.insert("stint".into(), lap.stint as f64);
        numeric.insert("tyre_age".into(), (lap.lap_number - stint_first) as f64);

        let stint_points: Vec<(f64, f64)> = laps[starts[i]..i]
            .iter()
            .map(|l| ((l.lap_number - stint_first) as f64, l.lap_time))
            .collect();
        numeric.insert("degradation_rate".into(), stint_slope(&stint_points).unwrap_or(0.0));

        let recent = &history[history.len() - available..];
        for &field in &cfg.lag_fields {
            for step in 1..=cfg.lags {
                let value = if step <= available {
                    field.value(&recent[available - step])
                } else {
                    fill
                };
                numeric.insert(lag_name(field, step), value);
            }
        }

        for &field in &cfg.rolling_fields {
            let [mean_name, std_name, median_name] = rolling_names(field, cfg.rolling_window);
            if available >= cfg.rolling_window {
                let window: Vec<f64> = recent[available - cfg.rolling_window..]
                    .iter()
                    .map(|l| field.value(l))
                    .collect();
                numeric.insert(mean_name, mean(&window));
                numeric.insert(std_name, sample_std(&window));
                numeric.insert(median_name, median(&window));
            } else {
                numeric.insert(mean_name, fill);
                numeric.insert(std_name, fill);
                numeric.insert(median_name, fill);
            }
        }

        for field in WEATHER_DELTAS {
            let value = match previous {
                Some(prev) => field.value(lap) - field.value(prev),
                None => fill,
            };
            numeric.insert(delta_name(field), value);
        }

        let categorical = BTreeMap::from([
            ("driver".to_string(), lap.driver.clone()),
            ("team".to_string(), lap.team.clone()),
            ("compound".to_string(), lap.compound.clone()),
        ]);

        rows.push(FeatureRow {
            key: lap.key(),
            event_name: lap.event_name.clone(),
            categorical,
            numeric,
            target: next.map(|n| n.lap_time),
        });
    }

    Ok(rows)
}

/// Builds the full feature table: validates key uniqueness, partitions per
/// (race, driver) and concatenates the partitions in chronological order.
pub fn build_feature_table(laps: &[LapRecord], cfg: &FeatureConfig) -> Result<Vec<FeatureRow>> {
    validate_unique(laps)?;
    let mut table = Vec::with_capacity(laps.len());
    for ((race, driver), driver_laps) in partition_by_driver(laps) {
        let rows = build_driver_features(&driver_laps, cfg)?;
        debug!(%race, %driver, laps = driver_laps.len(), rows = rows.len(), "built partition");
        table.extend(rows);
    }
    info!(laps = laps.len(), rows = table.len(), "built feature table");
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::fixtures::lap;

    fn laps_with_times(times: &[f64]) -> Vec<LapRecord> {
        times
            .iter()
            .enumerate()
            .map(|(i, &t)| lap(2023, 1, "VER", i as u32 + 1, t))
            .collect()
    }

    fn cfg(lags: usize, window: usize, fill: Option<FillPolicy>) -> FeatureConfig {
        FeatureConfig {
            lags,
            lag_fields: vec![LapField::LapTime],
            rolling_window: window,
            rolling_fields: vec![LapField::LapTime],
            fill,
            exclude_prior_stint: false,
            skip_pit_laps: true,
        }
    }

    fn row_for(rows: &[FeatureRow], lap_number: u32) -> &FeatureRow {
        rows.iter().find(|r| r.key.lap_number == lap_number).unwrap()
    }

    #[test]
    fn lag_uses_previous_lap_not_current() {
        let laps = laps_with_times(&[92.1, 91.8, 91.5]);
        let rows = build_driver_features(&laps, &cfg(1, 1, Some(FillPolicy::Constant(0.0)))).unwrap();
        let lap3 = row_for(&rows, 3);
        assert_eq!(lap3.numeric("lap_time_lag_1"), Some(91.8));
        assert_eq!(lap3.numeric("lap_time"), Some(91.5));
    }

    #[test]
    fn last_lap_keeps_its_row_without_target() {
        let laps = laps_with_times(&[92.1, 91.8, 91.5]);
        let rows = build_driver_features(&laps, &cfg(1, 1, Some(FillPolicy::Constant(0.0)))).unwrap();
        let targets: Vec<Option<f64>> = rows.iter().map(|r| r.target).collect();
        assert_eq!(targets, vec![Some(91.8), Some(91.5), None]);
    }

    #[test]
    fn gap_in_laps_means_no_target() {
        let mut laps = laps_with_times(&[92.0, 91.9, 91.8, 91.7]);
        laps.remove(2);
        let rows = build_driver_features(&laps, &cfg(1, 1, Some(FillPolicy::Constant(0.0)))).unwrap();
        let numbers: Vec<u32> = rows.iter().map(|r| r.key.lap_number).collect();
        assert_eq!(numbers, vec![1, 2, 4]);
        assert_eq!(row_for(&rows, 1).target, Some(91.9));
        assert_eq!(row_for(&rows, 2).target, None);
    }

    #[test]
    fn missing_lap_is_short_history_not_an_older_lag() {
        // lap 4 never made it through ingest
        let mut laps = laps_with_times(&[92.0, 91.9, 91.8, 91.7, 91.6, 91.5]);
        laps.remove(3);
        for (lap, temp) in laps.iter_mut().zip([40.0, 41.0, 42.0, 44.0, 45.0]) {
            lap.track_temp = temp;
        }

        let filled = build_driver_features(&laps, &cfg(1, 1, Some(FillPolicy::Constant(-1.0)))).unwrap();
        let lap5 = row_for(&filled, 5);
        assert_eq!(lap5.numeric("lap_time_lag_1"), Some(-1.0));
        assert_eq!(lap5.numeric("lap_time_roll_mean_1"), Some(-1.0));
        assert_eq!(lap5.numeric("track_temp_delta"), Some(-1.0));
        let lap6 = row_for(&filled, 6);
        assert_eq!(lap6.numeric("lap_time_lag_1"), Some(91.6));
        assert_eq!(lap6.numeric("track_temp_delta"), Some(1.0));

        let dropped = build_driver_features(&laps, &cfg(1, 1, Some(FillPolicy::DropRow))).unwrap();
        let numbers: Vec<u32> = dropped.iter().map(|r| r.key.lap_number).collect();
        assert_eq!(numbers, vec![2, 3, 6]);
    }

    #[test]
    fn missing_lap_fails_strict_policy() {
        let mut laps = laps_with_times(&[120.0, 92.0, 91.9, 91.8, 91.7]);
        laps.remove(3);
        // the opening out-lap is skipped, so history starts at lap 2
        laps[0].pit_out = true;
        match build_driver_features(&laps, &cfg(1, 1, None)) {
            Err(PipelineError::InsufficientHistory { lap, required, available, .. }) => {
                assert_eq!((lap, required, available), (5, 1, 0));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn strict_policy_fails_on_first_lap() {
        let laps = laps_with_times(&[92.1, 91.8, 91.5]);
        let err = build_driver_features(&laps, &cfg(1, 1, None)).unwrap_err();
        match err {
            PipelineError::InsufficientHistory { lap, required, available, .. } => {
                assert_eq!((lap, required, available), (1, 1, 0));
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn drop_policy_skips_short_history() {
        let laps = laps_with_times(&[92.0, 91.9, 91.8, 91.7, 91.6]);
        let rows = build_driver_features(&laps, &cfg(2, 3, Some(FillPolicy::DropRow))).unwrap();
        let numbers: Vec<u32> = rows.iter().map(|r| r.key.lap_number).collect();
        assert_eq!(numbers, vec![4, 5]);
    }

    #[test]
    fn constant_fill_applies_to_every_missing_value() {
        let laps = laps_with_times(&[92.0, 91.9, 91.8]);
        let rows = build_driver_features(&laps, &cfg(2, 2, Some(FillPolicy::Constant(-1.0)))).unwrap();
        let first = row_for(&rows, 1);
        assert_eq!(first.numeric("lap_time_lag_1"), Some(-1.0));
        assert_eq!(first.numeric("lap_time_roll_mean_2"), Some(-1.0));
        assert_eq!(first.numeric("track_temp_delta"), Some(-1.0));

        let second = row_for(&rows, 2);
        assert_eq!(second.numeric("lap_time_lag_1"), Some(92.0));
        assert_eq!(second.numeric("lap_time_lag_2"), Some(-1.0));
        // one lap of history is not a full window of two
        assert_eq!(second.numeric("lap_time_roll_std_2"), Some(-1.0));
        assert_eq!(second.numeric("track_temp_delta"), Some(0.0));
    }

    #[test]
    fn rolling_window_excludes_current_lap() {
        let laps = laps_with_times(&[90.0, 92.0, 94.0, 99.0, 91.0]);
        let rows = build_driver_features(&laps, &cfg(1, 3, Some(FillPolicy::DropRow))).unwrap();
        let lap4 = row_for(&rows, 4);
        assert_eq!(lap4.numeric("lap_time_roll_mean_3"), Some(92.0));
        assert_eq!(lap4.numeric("lap_time_roll_median_3"), Some(92.0));
        assert_eq!(lap4.numeric("lap_time_roll_std_3"), Some(2.0));
    }

    #[test]
    fn future_laps_never_reach_features() {
        let times = [92.0, 91.8, 91.7, 91.9, 91.6, 91.5, 91.4, 91.3];
        let clean = laps_with_times(&times);
        let mut poisoned = clean.clone();
        // every lap after lap 5 becomes a sentinel
        for lap in poisoned.iter_mut().skip(5) {
            lap.lap_time = 9999.0;
            lap.speed_mean = 9999.0;
            lap.track_temp = 9999.0;
            lap.sector_1_time = 9999.0;
        }

        let config = FeatureConfig {
            fill: Some(FillPolicy::Constant(0.0)),
            ..FeatureConfig::default()
        };
        let a = build_driver_features(&clean, &config).unwrap();
        let b = build_driver_features(&poisoned, &config).unwrap();

        for lap_number in 1..=4 {
            let (ra, rb) = (row_for(&a, lap_number), row_for(&b, lap_number));
            assert_eq!(ra.numeric, rb.numeric, "lap {lap_number} features moved");
            assert!(rb.numeric.values().all(|v| *v != 9999.0));
        }
        // lap 5's own features are clean; only its target sees lap 6
        let lap5 = row_for(&b, 5);
        assert!(lap5.numeric.values().all(|v| *v != 9999.0));
        assert_eq!(lap5.target, Some(9999.0));
    }

    #[test]
    fn pit_stop_resets_tyre_age_but_not_lags() {
        let mut laps = laps_with_times(&[92.0, 92.2, 92.4, 110.0, 112.0, 91.0, 91.1, 91.2]);
        laps[3].pit_in = true;
        for (i, lap) in laps.iter_mut().enumerate().skip(4) {
            lap.stint = 2;
            lap.compound = "HARD".into();
            lap.tyre_life = (i - 4) as f64;
        }
        laps[4].pit_out = true;

        let config = FeatureConfig {
            skip_pit_laps: false,
            ..cfg(1, 1, Some(FillPolicy::DropRow))
        };
        let rows = build_driver_features(&laps, &config).unwrap();

        let out_lap = row_for(&rows, 5);
        assert_eq!(out_lap.numeric("tyre_age"), Some(0.0));
        assert_eq!(out_lap.numeric("lap_time_lag_1"), Some(110.0));
        assert_eq!(out_lap.categorical("compound"), Some("HARD"));
        assert_eq!(row_for(&rows, 7).numeric("tyre_age"), Some(2.0));
        assert_eq!(row_for(&rows, 3).numeric("tyre_age"), Some(2.0));
    }

    #[test]
    fn excluding_prior_stint_treats_stint_start_as_short_history() {
        let mut laps = laps_with_times(&[92.0, 92.2, 92.4, 91.0, 91.1, 91.2]);
        for lap in laps.iter_mut().skip(3) {
            lap.stint = 2;
        }
        let config = FeatureConfig {
            exclude_prior_stint: true,
            skip_pit_laps: false,
            ..cfg(1, 1, Some(FillPolicy::DropRow))
        };
        let rows = build_driver_features(&laps, &config).unwrap();
        let numbers: Vec<u32> = rows.iter().map(|r| r.key.lap_number).collect();
        assert_eq!(numbers, vec![2, 3, 5, 6]);
        assert_eq!(row_for(&rows, 5).numeric("lap_time_lag_1"), Some(91.0));
    }

    #[test]
    fn pit_laps_skipped_by_default() {
        let mut laps = laps_with_times(&[92.0, 92.1, 92.2, 110.0, 95.0, 91.0]);
        laps[3].pit_in = true;
        let rows = build_driver_features(&laps, &cfg(1, 1, Some(FillPolicy::DropRow))).unwrap();
        let numbers: Vec<u32> = rows.iter().map(|r| r.key.lap_number).collect();
        // lap 3 targets the in-lap, lap 4 is the in-lap
        assert_eq!(numbers, vec![2, 5, 6]);
    }

    #[test]
    fn in_lap_alone_starts_a_new_stint() {
        let mut laps = laps_with_times(&[92.0, 92.1, 110.0, 112.0, 91.0, 91.1]);
        // same compound, no out-lap flag recorded
        laps[2].pit_in = true;
        let config = FeatureConfig {
            skip_pit_laps: false,
            ..cfg(1, 1, Some(FillPolicy::DropRow))
        };
        let rows = build_driver_features(&laps, &config).unwrap();

        assert_eq!(row_for(&rows, 3).numeric("tyre_age"), Some(2.0));
        assert_eq!(row_for(&rows, 4).numeric("tyre_age"), Some(0.0));
        assert_eq!(row_for(&rows, 6).numeric("tyre_age"), Some(2.0));
        assert_eq!(row_for(&rows, 4).numeric("degradation_rate"), Some(0.0));

        let second = &crate::summary::stints(&laps)[1];
        assert_eq!(second.start_lap, 4);
    }

    #[test]
    fn degradation_uses_only_earlier_stint_laps() {
        let laps = laps_with_times(&[92.0, 92.1, 92.2, 92.3, 95.0]);
        let rows = build_driver_features(&laps, &cfg(1, 1, Some(FillPolicy::DropRow))).unwrap();
        assert_eq!(row_for(&rows, 2).numeric("degradation_rate"), Some(0.0));
        let rate = row_for(&rows, 4).numeric("degradation_rate").unwrap();
        assert!((rate - 0.1).abs() < 1e-6, "rate was {rate}");
    }

    #[test]
    fn rows_match_schema() {
        let laps = laps_with_times(&[92.0, 91.9, 91.8, 91.7, 91.6]);
        let config = FeatureConfig::default();
        let schema = config.schema();
        let rows = build_driver_features(&laps, &config).unwrap();
        assert!(!rows.is_empty());
        for row in &rows {
            let names: Vec<&String> = row.numeric.keys().collect();
            assert_eq!(names.len(), schema.numeric.len());
            assert!(schema.numeric.iter().all(|n| row.numeric.contains_key(n)));
            assert!(schema.categorical.iter().all(|c| row.categorical.contains_key(c)));
        }
    }

    #[test]
    fn table_is_partitioned_per_driver() {
        let mut laps = laps_with_times(&[92.0, 91.9, 91.8]);
        laps.extend(
            [90.0, 90.1, 90.2]
                .iter()
                .enumerate()
                .map(|(i, &t)| lap(2023, 1, "HAM", i as u32 + 1, t)),
        );
        let rows = build_feature_table(&laps, &cfg(1, 1, Some(FillPolicy::DropRow))).unwrap();
        let ham = rows.iter().find(|r| r.key.driver == "HAM").unwrap();
        assert_eq!(ham.numeric("lap_time_lag_1"), Some(90.0));
        assert_eq!(rows.len(), 4);
    }
}
