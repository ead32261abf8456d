//! Replication control statements
//!
//! `CHANGE REPLICATION SOURCE TO`, `CHANGE REPLICATION FILTER`,
//! `START REPLICA`, `STOP REPLICA`, `RESET REPLICA [ALL]`. The older
//! `SLAVE` spellings are accepted too.

use std::sync::LazyLock;

use regex::Regex;

use super::split_top_level;
use crate::plan::{
    ChangeReplicationFilter, ChangeReplicationSource, LogicalPlan, ReplicationOption,
    ResetReplica, StartReplica, StopReplica,
};

static CHANGE_SOURCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^CHANGE\s+(?:REPLICATION\s+SOURCE|MASTER)\s+TO\s+(.+)$")
        .expect("valid regex")
});

static CHANGE_FILTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^CHANGE\s+REPLICATION\s+FILTER\s+(.+)$").expect("valid regex")
});

static REPLICA_COMMAND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(START|STOP|RESET)\s+(?:REPLICA|SLAVE)(\s+ALL)?$").expect("valid regex")
});

static OPTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)^\s*([A-Za-z_]+)\s*=\s*(.*?)\s*$").expect("valid regex"));

/// Build a replication node if `sql` is a replication statement.
///
/// Option lists that do not parse as `NAME = value` pairs are not
/// recognized and fall through to the SQL parser.
pub(super) fn build(sql: &str) -> Option<LogicalPlan> {
    if let Some(caps) = CHANGE_SOURCE.captures(sql) {
        let options = parse_options(&caps[1])?;
        return Some(LogicalPlan::ChangeReplicationSource(
            ChangeReplicationSource::new(options),
        ));
    }
    if let Some(caps) = CHANGE_FILTER.captures(sql) {
        let options = parse_options(&caps[1])?;
        return Some(LogicalPlan::ChangeReplicationFilter(
            ChangeReplicationFilter::new(options),
        ));
    }

    let caps = REPLICA_COMMAND.captures(sql)?;
    let all = caps.get(2).is_some();
    match caps[1].to_uppercase().as_str() {
        "RESET" => Some(LogicalPlan::ResetReplica(ResetReplica::new(all))),
        _ if all => None,
        "START" => Some(LogicalPlan::StartReplica(StartReplica::default())),
        _ => Some(LogicalPlan::StopReplica(StopReplica::default())),
    }
}

fn parse_options(list: &str) -> Option<Vec<ReplicationOption>> {
    split_top_level(list)
        .into_iter()
        .map(|option| {
            let caps = OPTION.captures(option)?;
            Some(ReplicationOption::new(&caps[1], unquote(&caps[2])))
        })
        .collect()
}

fn unquote(value: &str) -> &str {
    for quote in ['\'', '"'] {
        if let Some(inner) = value
            .strip_prefix(quote)
            .and_then(|v| v.strip_suffix(quote))
        {
            return inner;
        }
    }
    value
}
