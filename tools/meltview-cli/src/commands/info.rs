//! Print matched per-frame records.

use meltview_processing_core::align::{align, AlignmentSummary};

use super::InputArgs;

pub fn run(inputs: &InputArgs, frame: Option<usize>, json: bool) -> anyhow::Result<()> {
    let session = inputs.load_session()?;
    let records = align(&session.frames, &session.timestamps, &session.readings)
        .map_err(|e| anyhow::anyhow!("Failed to align session: {e}"))?;

    let selected = match frame {
        Some(index) => {
            let record = records.get(index).ok_or_else(|| {
                anyhow::anyhow!("Frame {index} is out of range (session has {} frames)", records.len())
            })?;
            std::slice::from_ref(record)
        }
        None => records.as_slice(),
    };

    if json {
        println!("{}", serde_json::to_string_pretty(selected)?);
        return Ok(());
    }

    let summary = AlignmentSummary::from_records(&records);
    let (width, height) = session.frame_size();
    println!("Session: {}", inputs.temperature.display());
    if let Some(build) = &session.build {
        println!("  Build: {build}");
    }
    println!("  Frames: {} ({width}x{height})", summary.frames);
    println!(
        "  Sensor readings: {} ({} used)",
        session.readings.len(),
        summary.readings_used
    );
    println!("  Leading frames: {}", summary.leading_frames);
    println!("  Max lag: {:.3}s", summary.max_lag_secs);
    println!();

    for record in selected {
        println!("{}", record.summary_line());
    }
    Ok(())
}
