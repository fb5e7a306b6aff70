//! JVM option handling and the per-invocation runtime context.

use crate::core::config::{AdjustDirection, AlgorithmConfig, MemoryAdjust};
use crate::{BroadError, Result};

/// Heap flags that get rescaled by a memory adjustment
const HEAP_PREFIXES: [&str; 2] = ["-Xmx", "-Xms"];

pub const DEFAULT_JVM_OPTS: [&str; 2] = ["-Xms750m", "-Xmx2g"];

/// Settings derived from the algorithm block for a single invocation.
///
/// Builders mutate their own copy; the shared configuration is never touched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimeContext {
    pub core_count: u32,
    pub memory_adjust: Option<MemoryAdjust>,
}

impl RuntimeContext {
    pub fn from_algorithm(algorithm: &AlgorithmConfig) -> Self {
        Self {
            core_count: algorithm.num_cores,
            memory_adjust: algorithm.memory_adjust,
        }
    }
}

impl Default for RuntimeContext {
    fn default() -> Self {
        Self { core_count: 1, memory_adjust: None }
    }
}

/// Apply the context's memory adjustment to a list of JVM options.
///
/// Only `-Xmx`/`-Xms` tokens are rescaled. Decreasing uses integer division,
/// so an increase followed by a decrease of the same magnitude is not always
/// an exact inverse.
pub fn context_jvm_opts(jvm_opts: &[String], adjust: Option<&MemoryAdjust>) -> Result<Vec<String>> {
    jvm_opts.iter().map(|opt| scale_heap_opt(opt, adjust)).collect()
}

pub fn scale_heap_opt(opt: &str, adjust: Option<&MemoryAdjust>) -> Result<String> {
    let adjust = match adjust {
        Some(adjust) if is_heap_opt(opt) => adjust,
        _ => return Ok(opt.to_string()),
    };

    let (flag, rest) = opt.split_at(4);
    let unit = rest.chars().last().filter(|c| !c.is_ascii_digit());
    let digits = match unit {
        Some(c) => &rest[..rest.len() - c.len_utf8()],
        None => rest,
    };
    let amount: u64 = digits
        .parse()
        .map_err(|_| BroadError::InvalidInput(format!("Cannot scale JVM option {}", opt)))?;

    let scaled = match adjust.direction {
        AdjustDirection::Increase => amount.saturating_mul(adjust.magnitude),
        AdjustDirection::Decrease => amount.checked_div(adjust.magnitude).ok_or_else(|| {
            BroadError::InvalidInput(format!("Cannot decrease {} by a magnitude of 0", opt))
        })?,
    };

    Ok(match unit {
        Some(c) => format!("{}{}{}", flag, scaled, c),
        None => format!("{}{}", flag, scaled),
    })
}

fn is_heap_opt(opt: &str) -> bool {
    HEAP_PREFIXES.iter().any(|prefix| opt.starts_with(prefix))
}
