use crate::error::{Error, Result};
use crate::route::ShardingValue;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Maps a sharding value to a shard index. A target (data source or table)
/// is selected by the number its name ends with, so `t_order_3` serves
/// index 3.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ShardingAlgorithm {
    /// `value mod sharding_count`; integer values only.
    Modulo { sharding_count: u64 },
    /// Hash of the value mod `sharding_count`; integers and their text form
    /// hash alike.
    Hash { sharding_count: u64 },
    /// Ascending boundaries split the value line into `boundaries.len() + 1`
    /// shards: shard 0 is below the first boundary, shard `i` starts at
    /// boundary `i - 1`.
    Range { boundaries: Vec<i64> },
}

impl ShardingAlgorithm {
    pub fn validate(&self) -> Result<()> {
        match self {
            ShardingAlgorithm::Modulo { sharding_count } | ShardingAlgorithm::Hash { sharding_count } => {
                if *sharding_count == 0 || *sharding_count > i64::MAX as u64 {
                    return Err(Error::Config(format!(
                        "sharding_count must be between 1 and {}, got {}",
                        i64::MAX,
                        sharding_count
                    )));
                }
            }
            ShardingAlgorithm::Range { boundaries } => {
                if boundaries.windows(2).any(|pair| pair[0] >= pair[1]) {
                    return Err(Error::Config(format!(
                        "range boundaries must be strictly ascending: {:?}",
                        boundaries
                    )));
                }
            }
        }
        Ok(())
    }

    pub fn shard_index(&self, table: &str, value: &ShardingValue) -> Result<u64> {
        match self {
            ShardingAlgorithm::Modulo { sharding_count } => {
                let number = numeric(table, value)?;
                let divisor = i64::try_from(*sharding_count)
                    .map_err(|_| Error::Config(format!("sharding_count {} out of range", sharding_count)))?;
                Ok(number.rem_euclid(divisor) as u64)
            }
            ShardingAlgorithm::Hash { sharding_count } => {
                let mut hasher = DefaultHasher::new();
                match value.as_integer() {
                    Some(number) => number.hash(&mut hasher),
                    None => value.to_string().hash(&mut hasher),
                }
                Ok(hasher.finish() % sharding_count)
            }
            ShardingAlgorithm::Range { boundaries } => {
                let number = numeric(table, value)?;
                Ok(range_shard(boundaries, number))
            }
        }
    }

    /// Shard indexes covering the inclusive range, or `None` when the
    /// algorithm cannot narrow a range and every shard must be visited.
    pub fn range_indexes(
        &self,
        table: &str,
        lower: Option<&ShardingValue>,
        upper: Option<&ShardingValue>,
    ) -> Result<Option<Vec<u64>>> {
        let ShardingAlgorithm::Range { boundaries } = self else {
            return Ok(None);
        };
        let first = match lower {
            Some(value) => range_shard(boundaries, numeric(table, value)?),
            None => 0,
        };
        let last = match upper {
            Some(value) => range_shard(boundaries, numeric(table, value)?),
            None => boundaries.len() as u64,
        };
        if let (Some(lower), Some(upper)) = (lower, upper) {
            if numeric(table, lower)? > numeric(table, upper)? {
                return Ok(Some(Vec::new()));
            }
        }
        Ok(Some((first..=last).collect()))
    }
}

fn range_shard(boundaries: &[i64], value: i64) -> u64 {
    boundaries.partition_point(|boundary| *boundary <= value) as u64
}

fn numeric(table: &str, value: &ShardingValue) -> Result<i64> {
    value.as_integer().ok_or_else(|| {
        Error::route_decision(
            "sharding",
            table,
            format!("sharding value '{}' is not numeric", value),
        )
    })
}

/// Number a target name ends with, e.g. 3 for `t_order_3`.
pub fn trailing_index(name: &str) -> Option<u64> {
    let digits = name.len() - name.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    if digits == 0 {
        return None;
    }
    name[name.len() - digits..].parse().ok()
}
