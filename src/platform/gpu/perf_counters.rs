//! Windows GPU performance counters.
//!
//! `Win32_PerfFormattedData_GPUPerformanceCounters_GPUEngine` has one row per
//! process and engine, `..._GPUAdapterMemory` one row per adapter. Instance
//! names carry the adapter LUID, e.g.
//! `pid_1234_luid_0x00000000_0x0000C6F1_phys_0_eng_0_engtype_3D`.

use crate::core::params::{percent_of, GpuSample};
use crate::error::{Result, WatchError};
use std::collections::HashMap;

pub const ENGINE_QUERY: &str = "SELECT Name, UtilizationPercentage FROM \
    Win32_PerfFormattedData_GPUPerformanceCounters_GPUEngine";
pub const MEMORY_QUERY: &str = "SELECT Name, DedicatedUsage FROM \
    Win32_PerfFormattedData_GPUPerformanceCounters_GPUAdapterMemory";

/// `(instance name, value)` as read from one counter class
pub type CounterRow = (String, u64);

/// The `luid_0x..._0x...` part of an instance name
pub fn adapter_luid(instance: &str) -> Option<&str> {
    let start = instance.find("luid_")?;
    let rest = &instance[start..];
    let end = rest
        .match_indices('_')
        .nth(2)
        .map_or(rest.len(), |(index, _)| index);
    Some(&rest[..end])
}

/// 3D engine load of the busiest adapter. Rows of one adapter are summed
/// across processes and capped at 100. `None` when no 3D rows exist.
pub fn busiest_adapter_load(rows: &[CounterRow]) -> Option<u32> {
    let mut per_adapter: HashMap<&str, u64> = HashMap::new();
    for (instance, percent) in rows {
        if !instance.ends_with("engtype_3D") {
            continue;
        }
        if let Some(luid) = adapter_luid(instance) {
            *per_adapter.entry(luid).or_default() += percent;
        }
    }
    per_adapter
        .into_values()
        .max()
        .map(|load| load.min(100) as u32)
}

/// Largest dedicated VRAM usage in bytes across adapters
pub fn largest_dedicated_usage(rows: &[CounterRow]) -> Option<u64> {
    rows.iter().map(|(_, used)| *used).max()
}

/// Reduce one round of counter rows. `vram_total` is in bytes.
///
/// Empty counter classes or an unknown memory size mean the metrics are not
/// supported on this machine.
pub fn sample_from_counters(
    engines: &[CounterRow],
    memory: &[CounterRow],
    vram_total: u64,
) -> Result<GpuSample> {
    let usage = busiest_adapter_load(engines).ok_or_else(|| {
        WatchError::metrics_unsupported("GPU engine counters report no 3D engines")
    })?;
    let used = largest_dedicated_usage(memory).ok_or_else(|| {
        WatchError::metrics_unsupported("GPU adapter memory counters report no adapters")
    })?;
    if vram_total == 0 {
        return Err(WatchError::metrics_unsupported("Adapter memory size is unknown"));
    }

    Ok(GpuSample::clamped(usage, percent_of(used, vram_total)))
}

/// Read the engine and memory counter classes through WMI
#[cfg(windows)]
pub fn query_counters() -> Result<(Vec<CounterRow>, Vec<CounterRow>)> {
    use wmi::WMIConnection;

    let wmi_con = WMIConnection::new()
        .map_err(|e| WatchError::metric_collection(format!("Failed to connect to WMI: {}", e)))?;

    let engines = query_rows(&wmi_con, ENGINE_QUERY, "UtilizationPercentage")?;
    let memory = query_rows(&wmi_con, MEMORY_QUERY, "DedicatedUsage")?;
    Ok((engines, memory))
}

#[cfg(not(windows))]
pub fn query_counters() -> Result<(Vec<CounterRow>, Vec<CounterRow>)> {
    Err(WatchError::gpu_not_available(
        "GPU performance counters are only available on Windows",
    ))
}

#[cfg(windows)]
fn query_rows(wmi_con: &wmi::WMIConnection, query: &str, field: &str) -> Result<Vec<CounterRow>> {
    use wmi::Variant;

    let rows: Vec<HashMap<String, Variant>> = wmi_con
        .raw_query(query)
        .map_err(|e| WatchError::metrics_unsupported(format!("WMI query failed: {}", e)))?;

    // uint64 counters arrive as strings, smaller ones as integers
    let as_u64 = |value: &Variant| match value {
        Variant::UI8(v) => Some(*v),
        Variant::UI4(v) => Some(*v as u64),
        Variant::UI2(v) => Some(*v as u64),
        Variant::String(s) => s.parse().ok(),
        _ => None,
    };

    Ok(rows
        .iter()
        .filter_map(|row| {
            let name = match row.get("Name") {
                Some(Variant::String(name)) => name.clone(),
                _ => return None,
            };
            Some((name, row.get(field).and_then(as_u64)?))
        })
        .collect())
}
