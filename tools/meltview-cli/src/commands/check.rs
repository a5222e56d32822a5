//! Check for the external tools playback and export rely on.

use meltview_common::config::config_file_path;
use meltview_render_engine::export::command_exists;

pub fn run() -> anyhow::Result<()> {
    println!("Meltview System Check");
    println!("{}", "=".repeat(50));

    let tools = [
        ("ffmpeg", "export", true),
        ("ffplay", "interactive playback", false),
        ("ffprobe", "export --verify", false),
    ];

    let mut required_ok = true;
    for (binary, purpose, required) in tools {
        if command_exists(binary) {
            println!("[OK] {binary} ({purpose})");
        } else if required {
            required_ok = false;
            println!("[MISSING] {binary} ({purpose})");
        } else {
            println!("[WARN] {binary} not found ({purpose} unavailable)");
        }
    }

    let config_path = config_file_path();
    println!();
    if config_path.exists() {
        println!("Config: {}", config_path.display());
    } else {
        println!("Config: {} (not present, using defaults)", config_path.display());
    }

    println!();
    if required_ok {
        println!("All required tools are available. Meltview is ready.");
    } else {
        println!("Some required tools are missing. Install ffmpeg and retry.");
    }

    Ok(())
}
