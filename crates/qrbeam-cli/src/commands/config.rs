//! Config command implementation.

use std::path::PathBuf;

use anyhow::{bail, Context, Result};

use qrbeam_core::config::{format_duration, parse_duration, Config, ErrorCorrection};

use super::{ConfigAction, ConfigArgs};

/// Every key accepted by `config get` and `config set`.
const KEYS: &[(&str, &str)] = &[
    ("transfer.chunk_size", "Bytes per code, or \"auto\" to pick by file type"),
    ("transfer.playback_interval", "Time each code stays on screen (200ms to 3s)"),
    ("transfer.looping", "Restart after the last code (true/false)"),
    ("receive.debounce_window", "Drop repeated identical scans within this window"),
    ("receive.default_output", "Directory for received files, or \"none\""),
    ("qr.error_correction", "QR error correction level (l, m, q, h)"),
    ("qr.png_size", "Edge length of exported PNG codes in pixels"),
    ("qr.quiet_zone", "Draw a blank margin around codes (true/false)"),
];

/// Run the config command.
pub async fn run(args: ConfigArgs) -> Result<()> {
    match args.action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            match get_config_value(&config, &key) {
                Some(v) => println!("{} = {}", key, v),
                None => bail!("Unknown configuration key: {} (see 'qrbeam config list')", key),
            }
        }

        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            if !set_config_value(&mut config, &key, &value)? {
                bail!("Unknown configuration key: {} (see 'qrbeam config list')", key);
            }
            config.validate()?;
            config.save()?;
            println!("Set {} = {}", key, value);
        }

        ConfigAction::Show => {
            let config = Config::load()?;
            println!();
            println!("qrbeam Configuration");
            println!("{}", "─".repeat(50));
            println!();
            print!("{}", toml_for_display(&config)?);
            println!();
        }

        ConfigAction::List => {
            println!();
            for (key, description) in KEYS {
                println!("  {:<28} {}", key, description);
            }
            println!();
        }

        ConfigAction::Path => {
            println!("{}", Config::config_path().display());
        }

        ConfigAction::Reset => {
            Config::default().save()?;
            println!("Configuration reset to defaults.");
        }
    }

    Ok(())
}

fn toml_for_display(config: &Config) -> Result<String> {
    toml::to_string_pretty(config).context("Failed to render configuration")
}

fn get_config_value(config: &Config, key: &str) -> Option<String> {
    match key {
        "transfer.chunk_size" => Some(
            config
                .transfer
                .chunk_size
                .map_or_else(|| "auto".to_string(), |s| s.to_string()),
        ),
        "transfer.playback_interval" => Some(format_duration(config.transfer.playback_interval)),
        "transfer.looping" => Some(config.transfer.looping.to_string()),
        "receive.debounce_window" => Some(format_duration(config.receive.debounce_window)),
        "receive.default_output" => Some(
            config
                .receive
                .default_output
                .as_ref()
                .map_or_else(|| "none".to_string(), |p| p.display().to_string()),
        ),
        "qr.error_correction" => Some(config.qr.error_correction.to_string()),
        "qr.png_size" => Some(config.qr.png_size.to_string()),
        "qr.quiet_zone" => Some(config.qr.quiet_zone.to_string()),
        _ => None,
    }
}

fn set_config_value(config: &mut Config, key: &str, value: &str) -> Result<bool> {
    match key {
        "transfer.chunk_size" => {
            config.transfer.chunk_size = if value.eq_ignore_ascii_case("auto") {
                None
            } else {
                Some(
                    value
                        .parse::<usize>()
                        .context("expected a number of bytes or \"auto\"")?,
                )
            };
        }
        "transfer.playback_interval" => {
            config.transfer.playback_interval = parse_duration(value)
                .context("expected a duration such as 200ms or 1s")?;
        }
        "transfer.looping" => {
            config.transfer.looping = value.parse::<bool>().context("expected true or false")?;
        }
        "receive.debounce_window" => {
            config.receive.debounce_window = parse_duration(value)
                .context("expected a duration such as 500ms")?;
        }
        "receive.default_output" => {
            config.receive.default_output = if value.eq_ignore_ascii_case("none") {
                None
            } else {
                Some(PathBuf::from(value))
            };
        }
        "qr.error_correction" => {
            config.qr.error_correction = value.parse::<ErrorCorrection>()?;
        }
        "qr.png_size" => {
            config.qr.png_size = value.parse::<u32>().context("expected a size in pixels")?;
        }
        "qr.quiet_zone" => {
            config.qr.quiet_zone = value.parse::<bool>().context("expected true or false")?;
        }
        _ => return Ok(false),
    }
    Ok(true)
}
