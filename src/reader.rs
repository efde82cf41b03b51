//! DAG input file reader (spec §6). Specified only at the interface
//! level — the parser itself is a small, mechanical pass over the text
//! format, not part of the algorithmic core.

use std::fs;
use std::path::Path;

use crate::dag::Dag;
use crate::error::ScheduleError;
use crate::task::Task;

/// Loads a DAG from the text format of spec §6: `/*...*/` comment lines,
/// blank lines, and lines containing non-ASCII characters are skipped;
/// then `m`, `n`, `e`, the `m x m` comm-rate matrix, the `n x m` comp
/// matrix, and `e` edge lines follow in that order. Edges whose
/// endpoints exceed `n` are silently skipped, per spec.
pub fn load_dag(path: impl AsRef<Path>) -> Result<Dag, ScheduleError> {
    let text = fs::read_to_string(path.as_ref())
        .map_err(|e| ScheduleError::InputFormat(format!("cannot read {}: {e}", path.as_ref().display())))?;

    let mut lines = text.lines().filter(|line| {
        let trimmed = line.trim();
        !trimmed.is_empty() && !trimmed.starts_with("/*") && trimmed.is_ascii()
    });

    let m = next_usize(&mut lines, "processor count")?;
    let n = next_usize(&mut lines, "task count")?;
    let e = next_usize(&mut lines, "edge count")?;

    let mut rate = Vec::with_capacity(m);
    for i in 0..m {
        let line = lines
            .next()
            .ok_or_else(|| ScheduleError::InputFormat(format!("missing comm-rate row {i}")))?;
        rate.push(parse_f64_row(line, m, &format!("comm-rate row {i}"))?);
    }

    let mut tasks = Vec::with_capacity(n);
    for i in 0..n {
        let line = lines
            .next()
            .ok_or_else(|| ScheduleError::InputFormat(format!("missing computation-cost row {i}")))?;
        let comp = parse_f64_row(line, m, &format!("computation-cost row {i}"))?;
        tasks.push(Task::new(i, comp));
    }

    for edge_idx in 0..e {
        let line = lines
            .next()
            .ok_or_else(|| ScheduleError::InputFormat(format!("missing edge line {edge_idx}")))?;
        let mut tokens = line.split_whitespace();
        let from = next_token_usize(&mut tokens, edge_idx, "from")?;
        let to = next_token_usize(&mut tokens, edge_idx, "to")?;
        let volume = next_token_u64(&mut tokens, edge_idx, "volume")?;

        if from >= n || to >= n {
            continue;
        }
        tasks[from].succs.push(to);
        tasks[to].preds.push(from);
        tasks[from].volume.insert(to, volume);
    }

    Dag::new(tasks, rate)
}

fn next_usize<'a>(lines: &mut impl Iterator<Item = &'a str>, what: &str) -> Result<usize, ScheduleError> {
    let line = lines.next().ok_or_else(|| ScheduleError::InputFormat(format!("missing {what}")))?;
    line.trim()
        .parse::<usize>()
        .map_err(|_| ScheduleError::InputFormat(format!("expected an integer {what}, got {line:?}")))
}

fn parse_f64_row(line: &str, expected_len: usize, what: &str) -> Result<Vec<f64>, ScheduleError> {
    let row: Result<Vec<f64>, _> = line.split_whitespace().map(|tok| tok.parse::<f64>()).collect();
    let row = row.map_err(|_| ScheduleError::InputFormat(format!("{what} contains a non-numeric field: {line:?}")))?;
    if row.len() != expected_len {
        return Err(ScheduleError::InputFormat(format!(
            "{what} has {} fields, expected {expected_len}",
            row.len()
        )));
    }
    if row.iter().any(|&v| v < 0.0) {
        return Err(ScheduleError::InputFormat(format!("{what} contains a negative value")));
    }
    Ok(row)
}

fn next_token_usize<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    edge_idx: usize,
    field: &str,
) -> Result<usize, ScheduleError> {
    tokens
        .next()
        .ok_or_else(|| ScheduleError::InputFormat(format!("edge line {edge_idx} is missing its {field} field")))?
        .parse::<usize>()
        .map_err(|_| ScheduleError::InputFormat(format!("edge line {edge_idx} has a non-integer {field} field")))
}

fn next_token_u64<'a>(
    tokens: &mut impl Iterator<Item = &'a str>,
    edge_idx: usize,
    field: &str,
) -> Result<u64, ScheduleError> {
    tokens
        .next()
        .ok_or_else(|| ScheduleError::InputFormat(format!("edge line {edge_idx} is missing its {field} field")))?
        .parse::<u64>()
        .map_err(|_| ScheduleError::InputFormat(format!("edge line {edge_idx} has a non-integer {field} field")))
}
