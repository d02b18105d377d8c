use csv::ReaderBuilder;
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::config::IngestConfig;
use crate::error::{PipelineError, Result};

/// (season, round). Ordered by season first, then round, which is the
/// chronological race order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct RaceKey {
    pub season: u16,
    pub round: u8,
}

impl RaceKey {
    pub fn new(season: u16, round: u8) -> Self {
        Self { season, round }
    }
}

impl std::fmt::Display for RaceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} round {}", self.season, self.round)
    }
}

impl std::str::FromStr for RaceKey {
    type Err = PipelineError;

    /// Parses `2023:22`.
    fn from_str(s: &str) -> Result<Self> {
        let bad = || PipelineError::Config(format!("race must look like SEASON:ROUND, got {s:?}"));
        let (season, round) = s.split_once(':').ok_or_else(bad)?;
        Ok(Self {
            season: season.trim().parse().map_err(|_| bad())?,
            round: round.trim().parse().map_err(|_| bad())?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LapKey {
    pub race: RaceKey,
    pub driver: String,
    pub lap_number: u32,
}

/// One timed lap for one driver. Times are seconds, ratios are 0..=1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LapRecord {
    pub season: u16,
    pub round: u8,
    pub event_name: String,
    pub driver: String,
    pub team: String,
    pub lap_number: u32,

    pub sector_1_time: f64,
    pub sector_2_time: f64,
    pub sector_3_time: f64,
    pub lap_time: f64,

    pub speed_mean: f64,
    pub speed_max: f64,
    pub speed_min: f64,
    pub throttle_mean: f64,
    pub full_throttle_ratio: f64,
    pub brake_ratio: f64,
    pub rpm_mean: f64,
    pub rpm_max: f64,
    pub gear_mean: f64,
    pub gear_changes: f64,
    pub drs_ratio: f64,

    pub compound: String,
    pub stint: u32,
    pub tyre_life: f64,
    pub fresh_tyre: bool,

    pub air_temp: f64,
    pub track_temp: f64,
    pub humidity: f64,
    pub pressure: f64,
    pub wind_speed: f64,
    pub wind_direction: f64,
    pub rainfall: bool,

    pub position: f64,
    pub track_status: u8,
    pub pit_in: bool,
    pub pit_out: bool,
}

impl LapRecord {
    pub fn race(&self) -> RaceKey {
        RaceKey::new(self.season, self.round)
    }

    pub fn key(&self) -> LapKey {
        LapKey {
            race: self.race(),
            driver: self.driver.clone(),
            lap_number: self.lap_number,
        }
    }

    pub fn is_pit_lap(&self) -> bool {
        self.pit_in || self.pit_out
    }
}

/// Numeric lap fields addressable by name, used for lag/rolling features and
/// as the raw numeric columns of a feature row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LapField {
    LapNumber,
    Sector1Time,
    Sector2Time,
    Sector3Time,
    LapTime,
    SpeedMean,
    SpeedMax,
    SpeedMin,
    ThrottleMean,
    FullThrottleRatio,
    BrakeRatio,
    RpmMean,
    RpmMax,
    GearMean,
    GearChanges,
    DrsRatio,
    TyreLife,
    AirTemp,
    TrackTemp,
    Humidity,
    Pressure,
    WindSpeed,
    WindDirection,
    Rainfall,
    Position,
    TrackStatus,
}

impl LapField {
    /// Fields copied verbatim into every feature row.
    pub const RAW: [LapField; 26] = [
        LapField::LapNumber,
        LapField::Sector1Time,
        LapField::Sector2Time,
        LapField::Sector3Time,
        LapField::LapTime,
        LapField::SpeedMean,
        LapField::SpeedMax,
        LapField::SpeedMin,
        LapField::ThrottleMean,
        LapField::FullThrottleRatio,
        LapField::BrakeRatio,
        LapField::RpmMean,
        LapField::RpmMax,
        LapField::GearMean,
        LapField::GearChanges,
        LapField::DrsRatio,
        LapField::TyreLife,
        LapField::AirTemp,
        LapField::TrackTemp,
        LapField::Humidity,
        LapField::Pressure,
        LapField::WindSpeed,
        LapField::WindDirection,
        LapField::Rainfall,
        LapField::Position,
        LapField::TrackStatus,
    ];

    pub fn name(self) -> &'static str {
        match self {
            LapField::LapNumber => "lap_number",
            LapField::Sector1Time => "sector_1_time",
            LapField::Sector2Time => "sector_2_time",
            LapField::Sector3Time => "sector_3_time",
            LapField::LapTime => "lap_time",
            LapField::SpeedMean => "speed_mean",
            LapField::SpeedMax => "speed_max",
            LapField::SpeedMin => "speed_min",
            LapField::ThrottleMean => "throttle_mean",
            LapField::FullThrottleRatio => "full_throttle_ratio",
            LapField::BrakeRatio => "brake_ratio",
            LapField::RpmMean => "rpm_mean",
            LapField::RpmMax => "rpm_max",
            LapField::GearMean => "gear_mean",
            LapField::GearChanges => "gear_changes",
            LapField::DrsRatio => "drs_ratio",
            LapField::TyreLife => "tyre_life",
            LapField::AirTemp => "air_temp",
            LapField::TrackTemp => "track_temp",
            LapField::Humidity => "humidity",
            LapField::Pressure => "pressure",
            LapField::WindSpeed => "wind_speed",
            LapField::WindDirection => "wind_direction",
            LapField::Rainfall => "rainfall",
            LapField::Position => "position",
            LapField::TrackStatus => "track_status",
        }
    }

    pub fn value(self, lap: &LapRecord) -> f64 {
        match self {
            LapField::LapNumber => lap.lap_number as f64,
            LapField::Sector1Time => lap.sector_1_time,
            LapField::Sector2Time => lap.sector_2_time,
            LapField::Sector3Time => lap.sector_3_time,
            LapField::LapTime => lap.lap_time,
            LapField::SpeedMean => lap.speed_mean,
            LapField::SpeedMax => lap.speed_max,
            LapField::SpeedMin => lap.speed_min,
            LapField::ThrottleMean => lap.throttle_mean,
            LapField::FullThrottleRatio => lap.full_throttle_ratio,
            LapField::BrakeRatio => lap.brake_ratio,
            LapField::RpmMean => lap.rpm_mean,
            LapField::RpmMax => lap.rpm_max,
            LapField::GearMean => lap.gear_mean,
            LapField::GearChanges => lap.gear_changes,
            LapField::DrsRatio => lap.drs_ratio,
            LapField::TyreLife => lap.tyre_life,
            LapField::AirTemp => lap.air_temp,
            LapField::TrackTemp => lap.track_temp,
            LapField::Humidity => lap.humidity,
            LapField::Pressure => lap.pressure,
            LapField::WindSpeed => lap.wind_speed,
            LapField::WindDirection => lap.wind_direction,
            LapField::Rainfall => bool_value(lap.rainfall),
            LapField::Position => lap.position,
            LapField::TrackStatus => lap.track_status as f64,
        }
    }
}

pub(crate) fn bool_value(b: bool) -> f64 {
    if b {
        1.0
    } else {
        0.0
    }
}

/// Anything that can hand over the raw lap table of one or more sessions.
pub trait SessionRecords {
    fn lap_records(&self) -> Result<Vec<LapRecord>>;
}

impl SessionRecords for Vec<LapRecord> {
    fn lap_records(&self) -> Result<Vec<LapRecord>> {
        Ok(self.clone())
    }
}

// column names as exported from the provider's lap table (times already in seconds)
#[derive(Debug, Deserialize)]
struct RawLapRow {
    #[serde(rename = "Season")] season: u16,
    #[serde(rename = "RoundNumber")] round: u8,
    #[serde(rename = "EventName")] event_name: String,
    #[serde(rename = "Driver")] driver: String,
    #[serde(rename = "Team")] team: String,
    #[serde(rename = "LapNumber")] lap_number: f64,
    #[serde(rename = "LapTime")] lap_time: Option<f64>,
    #[serde(rename = "Sector1Time")] sector_1_time: Option<f64>,
    #[serde(rename = "Sector2Time")] sector_2_time: Option<f64>,
    #[serde(rename = "Sector3Time")] sector_3_time: Option<f64>,
    #[serde(rename = "SpeedMean")] speed_mean: f64,
    #[serde(rename = "SpeedMax")] speed_max: f64,
    #[serde(rename = "SpeedMin")] speed_min: f64,
    #[serde(rename = "ThrottleMean")] throttle_mean: f64,
    #[serde(rename = "FullThrottleRatio")] full_throttle_ratio: f64,
    #[serde(rename = "BrakeRatio")] brake_ratio: f64,
    #[serde(rename = "RPMMean")] rpm_mean: f64,
    #[serde(rename = "RPMMax")] rpm_max: f64,
    #[serde(rename = "GearMean")] gear_mean: f64,
    #[serde(rename = "GearChanges")] gear_changes: f64,
    #[serde(rename = "DRSRatio")] drs_ratio: f64,
    #[serde(rename = "Compound")] compound: String,
    #[serde(rename = "Stint")] stint: f64,
    #[serde(rename = "TyreLife")] tyre_life: f64,
    #[serde(rename = "FreshTyre", deserialize_with = "flag")] fresh_tyre: bool,
    #[serde(rename = "AirTemp")] air_temp: f64,
    #[serde(rename = "TrackTemp")] track_temp: f64,
    #[serde(rename = "Humidity")] humidity: f64,
    #[serde(rename = "Pressure")] pressure: f64,
    #[serde(rename = "WindSpeed")] wind_speed: f64,
    #[serde(rename = "WindDirection")] wind_direction: f64,
    #[serde(rename = "Rainfall", deserialize_with = "flag")] rainfall: bool,
    #[serde(rename = "Position")] position: Option<f64>,
    #[serde(rename = "TrackStatus")] track_status: Option<String>,
    #[serde(rename = "PitInTime")] pit_in_time: Option<String>,
    #[serde(rename = "PitOutTime")] pit_out_time: Option<String>,
}

// exports write booleans as "True"/"False"; accept that, lowercase and 0/1
fn flag<'de, D: Deserializer<'de>>(de: D) -> std::result::Result<bool, D::Error> {
    let raw = String::deserialize(de)?;
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "1.0" => Ok(true),
        "false" | "0" | "0.0" | "" => Ok(false),
        other => Err(serde::de::Error::custom(format!("not a boolean: {other:?}"))),
    }
}

impl RawLapRow {
    fn into_record(self, cfg: &IngestConfig) -> Option<LapRecord> {
        let lap_time = self.lap_time?;
        if !(lap_time > 0.0 && lap_time < cfg.max_lap_time)
            || self.lap_number < 1.0
            || self.driver.is_empty()
            || self.compound.is_empty()
        {
            return None;
        }
        // missing sectors are rare (red flags, deleted laps); spread the lap evenly
        let third = lap_time / 3.0;
        Some(LapRecord {
            season: self.season,
            round: self.round,
            event_name: self.event_name,
            driver: self.driver,
            team: self.team,
            lap_number: self.lap_number.round() as u32,
            sector_1_time: self.sector_1_time.unwrap_or(third),
            sector_2_time: self.sector_2_time.unwrap_or(third),
            sector_3_time: self.sector_3_time.unwrap_or(third),
            lap_time,
            speed_mean: self.speed_mean,
            speed_max: self.speed_max,
            speed_min: self.speed_min,
            throttle_mean: self.throttle_mean,
            full_throttle_ratio: self.full_throttle_ratio,
            brake_ratio: self.brake_ratio,
            rpm_mean: self.rpm_mean,
            rpm_max: self.rpm_max,
            gear_mean: self.gear_mean,
            gear_changes: self.gear_changes,
            drs_ratio: self.drs_ratio,
            compound: self.compound.to_uppercase(),
            stint: self.stint.round().max(0.0) as u32,
            tyre_life: self.tyre_life,
            fresh_tyre: self.fresh_tyre,
            air_temp: self.air_temp,
            track_temp: self.track_temp,
            humidity: self.humidity,
            pressure: self.pressure,
            wind_speed: self.wind_speed,
            wind_direction: self.wind_direction,
            rainfall: self.rainfall,
            position: self.position.unwrap_or(0.0),
            track_status: parse_track_status(self.track_status.as_deref()),
            pit_in: self.pit_in_time.is_some_and(|s| !s.trim().is_empty()),
            pit_out: self.pit_out_time.is_some_and(|s| !s.trim().is_empty()),
        })
    }
}

// status strings concatenate every code seen in the lap ("24", "671"); keep the worst
fn parse_track_status(raw: Option<&str>) -> u8 {
    raw.map(|s| {
        s.chars()
            .filter_map(|c| c.to_digit(10))
            .max()
            .unwrap_or(1) as u8
    })
    .unwrap_or(1)
}

pub struct CsvLapSource {
    path: PathBuf,
    ingest: IngestConfig,
}

impl CsvLapSource {
    pub fn new<P: AsRef<Path>>(path: P, ingest: IngestConfig) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            ingest,
        }
    }
}

impl SessionRecords for CsvLapSource {
    fn lap_records(&self) -> Result<Vec<LapRecord>> {
        let mut reader = ReaderBuilder::new().has_headers(true).from_path(&self.path)?;
        let mut laps = Vec::new();
        let mut dropped = 0usize;

        for res in reader.deserialize() {
            let raw: RawLapRow = res?;
            match raw.into_record(&self.ingest) {
                Some(lap) => laps.push(lap),
                None => dropped += 1,
            }
        }

        if dropped > 0 {
            warn!(dropped, path = %self.path.display(), "dropped laps without usable timing");
        }
        info!(laps = laps.len(), path = %self.path.display(), "loaded lap records");
        validate_unique(&laps)?;
        Ok(laps)
    }
}

pub fn validate_unique(laps: &[LapRecord]) -> Result<()> {
    let mut seen = HashSet::with_capacity(laps.len());
    for lap in laps {
        if !seen.insert(lap.key()) {
            return Err(PipelineError::DuplicateLap {
                season: lap.season,
                round: lap.round,
                driver: lap.driver.clone(),
                lap: lap.lap_number,
            });
        }
    }
    Ok(())
}

/// Groups laps per (race, driver), each group sorted by lap number. The map is
/// ordered, so iteration is chronological by race and then by driver code.
pub fn partition_by_driver(laps: &[LapRecord]) -> BTreeMap<(RaceKey, String), Vec<LapRecord>> {
    let mut groups: BTreeMap<(RaceKey, String), Vec<LapRecord>> = BTreeMap::new();
    for lap in laps {
        groups
            .entry((lap.race(), lap.driver.clone()))
            .or_default()
            .push(lap.clone());
    }
    for laps in groups.values_mut() {
        laps.sort_by_key(|l| l.lap_number);
    }
    debug!(partitions = groups.len(), "partitioned laps by race and driver");
    groups
}


#[cfg(test)]
mod tests {
    use super::fixtures::lap;
    use super::*;
    use std::io::Write;

    const HEADER: &str = "Season,RoundNumber,EventName,Driver,Team,LapNumber,LapTime,Sector1Time,Sector2Time,Sector3Time,SpeedMean,SpeedMax,SpeedMin,ThrottleMean,FullThrottleRatio,BrakeRatio,RPMMean,RPMMax,GearMean,GearChanges,DRSRatio,Compound,Stint,TyreLife,FreshTyre,AirTemp,TrackTemp,Humidity,Pressure,WindSpeed,WindDirection,Rainfall,Position,TrackStatus,PitInTime,PitOutTime";

    fn row(driver: &str, lap: u32, lap_time: &str, pit_in: &str, status: &str) -> String {
        format!(
            "2023,22,Abu Dhabi Grand Prix,{driver},Red Bull Racing,{lap},{lap_time},30.1,35.2,,210,320,85,68,0.6,0.18,10500,12100,5.6,48,0.1,soft,1,{lap},True,25,40,50,1010,2,180,False,1,{status},{pit_in},"
        )
    }

    #[test]
    fn csv_source_filters_and_parses() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{HEADER}").unwrap();
        writeln!(file, "{}", row("VER", 1, "92.1", "", "1")).unwrap();
        writeln!(file, "{}", row("VER", 2, "", "", "1")).unwrap();
        writeln!(file, "{}", row("VER", 3, "450.0", "", "1")).unwrap();
        writeln!(file, "{}", row("VER", 4, "95.0", "5400.2", "24")).unwrap();

        let laps = CsvLapSource::new(file.path(), IngestConfig::default())
            .lap_records()
            .unwrap();
        assert_eq!(laps.len(), 2);
        assert_eq!(laps[0].compound, "SOFT");
        assert!(laps[0].fresh_tyre && !laps[0].rainfall);
        assert!((laps[0].sector_3_time - 92.1 / 3.0).abs() < 1e-9);
        assert!(!laps[0].pit_in);
        assert!(laps[1].pit_in);
        assert_eq!(laps[1].track_status, 4);
    }

    #[test]
    fn duplicate_keys_rejected() {
        let laps = vec![lap(2023, 1, "VER", 1, 92.0), lap(2023, 1, "VER", 1, 93.0)];
        assert!(matches!(
            validate_unique(&laps),
            Err(PipelineError::DuplicateLap { lap: 1, .. })
        ));
    }

    #[test]
    fn partitions_sorted_by_lap() {
        let laps = vec![
            lap(2023, 2, "HAM", 2, 93.0),
            lap(2023, 1, "VER", 2, 92.0),
            lap(2023, 2, "HAM", 1, 94.0),
            lap(2023, 1, "VER", 1, 91.0),
        ];
        let groups = partition_by_driver(&laps);
        let keys: Vec<_> = groups.keys().cloned().collect();
        assert_eq!(
            keys,
            vec![
                (RaceKey::new(2023, 1), "VER".to_string()),
                (RaceKey::new(2023, 2), "HAM".to_string())
            ]
        );
        let ham = &groups[&(RaceKey::new(2023, 2), "HAM".to_string())];
        assert_eq!(ham[0].lap_number, 1);
        assert_eq!(ham[1].lap_number, 2);
    }

    #[test]
    fn race_key_parses_and_orders() {
        let a: RaceKey = "2023:21".parse().unwrap();
        let b: RaceKey = "2023:22".parse().unwrap();
        let c: RaceKey = "2024:1".parse().unwrap();
        assert!(a < b && b < c);
        assert!("2023".parse::<RaceKey>().is_err());
    }
}
