use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

use crate::data::RaceKey;
use crate::error::{PipelineError, Result};
use crate::features::FeatureRow;

/// Where the training data ends and the evaluation data begins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitBoundary {
    /// Test on `from` (through `until`, if given); train on every earlier race.
    Holdout { from: RaceKey, until: Option<RaceKey> },
    /// Explicit race lists. Every train race must precede every test race.
    Explicit { train: Vec<RaceKey>, test: Vec<RaceKey> },
}

impl SplitBoundary {
    pub fn race(race: RaceKey) -> Self {
        SplitBoundary::Holdout {
            from: race,
            until: Some(race),
        }
    }
}

/// Rows partitioned by a boundary. Only constructible through [`split`], so
/// holding one means the chronology checks passed.
#[derive(Debug, Clone)]
pub struct DatasetSplit {
    boundary: SplitBoundary,
    train: Vec<FeatureRow>,
    test: Vec<FeatureRow>,
    train_races: Vec<RaceKey>,
    test_races: Vec<RaceKey>,
}

impl DatasetSplit {
    pub fn boundary(&self) -> &SplitBoundary {
        &self.boundary
    }

    pub fn train(&self) -> &[FeatureRow] {
        &self.train
    }

    pub fn test(&self) -> &[FeatureRow] {
        &self.test
    }

    pub fn train_races(&self) -> &[RaceKey] {
        &self.train_races
    }

    pub fn test_races(&self) -> &[RaceKey] {
        &self.test_races
    }
}

// a race key carrying two event names means round numbers can't order races
fn check_race_labels(rows: &[FeatureRow]) -> Result<()> {
    let mut labels: BTreeMap<RaceKey, &str> = BTreeMap::new();
    for row in rows {
        let label = labels.entry(row.race()).or_insert(row.event_name.as_str());
        if *label != row.event_name {
            return Err(PipelineError::SplitOrdering(format!(
                "{} is labelled both {:?} and {:?}",
                row.race(),
                label,
                row.event_name
            )));
        }
    }
    Ok(())
}

fn check_chronology(train: &[RaceKey], test: &[RaceKey]) -> Result<()> {
    if let (Some(last_train), Some(first_test)) = (train.iter().max(), test.iter().min()) {
        if last_train >= first_test {
            return Err(PipelineError::SplitOrdering(format!(
                "training race {last_train} is not before test race {first_test}"
            )));
        }
    }
    Ok(())
}

fn races_of(rows: &[FeatureRow]) -> Vec<RaceKey> {
    rows.iter()
        .map(FeatureRow::race)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Partitions `rows` without shuffling. Row order within each side is kept.
pub fn split(rows: &[FeatureRow], boundary: &SplitBoundary) -> Result<DatasetSplit> {
    check_race_labels(rows)?;

    let (train, test): (Vec<FeatureRow>, Vec<FeatureRow>) = match boundary {
        SplitBoundary::Holdout { from, until } => {
            if let Some(until) = until {
                if until < from {
                    return Err(PipelineError::SplitOrdering(format!(
                        "holdout ends at {until}, before it starts at {from}"
                    )));
                }
            }
            let in_test = |race: RaceKey| race >= *from && until.map_or(true, |u| race <= u);
            let train = rows.iter().filter(|r| r.race() < *from).cloned().collect();
            let test = rows.iter().filter(|r| in_test(r.race())).cloned().collect();
            (train, test)
        }
        SplitBoundary::Explicit { train, test } => {
            check_chronology(train, test)?;
            let train_set: BTreeSet<RaceKey> = train.iter().copied().collect();
            let test_set: BTreeSet<RaceKey> = test.iter().copied().collect();
            (
                rows.iter().filter(|r| train_set.contains(&r.race())).cloned().collect(),
                rows.iter().filter(|r| test_set.contains(&r.race())).cloned().collect(),
            )
        }
    };

    let train_races = races_of(&train);
    let test_races = races_of(&test);
    check_chronology(&train_races, &test_races)?;

    if test.is_empty() {
        warn!(?boundary, "split boundary matched no test rows");
    }
    info!(
        train_rows = train.len(),
        test_rows = test.len(),
        train_races = train_races.len(),
        test_races = test_races.len(),
        "split feature table"
    );

    Ok(DatasetSplit {
        boundary: boundary.clone(),
        train,
        test,
        train_races,
        test_races,
    })
}

/// Expanding-window splits: each race after the first `min_train_races`
/// is held out in turn, trained on everything before it.
pub fn walk_forward(rows: &[FeatureRow], min_train_races: usize) -> Result<Vec<DatasetSplit>> {
    let races = races_of(rows);
    races
        .iter()
        .skip(min_train_races.max(1))
        .map(|&race| split(rows, &SplitBoundary::race(race)))
        .collect()
}
