use clap::Subcommand;
use dategate_core::Config;
use serde_json::Value;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one setting, e.g. "window.day" or "pages.main"
    Get {
        /// Dotted key: window.{month,day}, pages.{question,waiting,main},
        /// scheduler.{safety_margin_ms,fallback_interval_secs}, optin.key
        key: String,
    },
    /// Change one setting and save it
    Set {
        /// Dotted key
        key: String,
        /// New value
        value: String,
    },
    /// Print every setting as `key = value`, or as JSON with --json
    List {
        #[arg(long)]
        json: bool,
    },
    /// Restore the Feb 14 window and default page stems
    Reset,
}

/// Flatten the config into `(dotted key, value)` pairs, sorted by key.
fn settings(config: &Config) -> Result<Vec<(String, String)>, serde_json::Error> {
    let mut out = Vec::new();
    if let Value::Object(sections) = serde_json::to_value(config)? {
        for (section, fields) in sections {
            let Value::Object(fields) = fields else {
                continue;
            };
            for (field, value) in fields {
                let value = match value {
                    Value::String(s) => s,
                    other => other.to_string(),
                };
                out.push((format!("{section}.{field}"), value));
            }
        }
    }
    Ok(out)
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    match action {
        ConfigAction::Get { key } => {
            let config = Config::load()?;
            match config.get(&key) {
                Some(value) => println!("{value}"),
                None => {
                    let known: Vec<String> = settings(&config)?.into_iter().map(|(k, _)| k).collect();
                    return Err(format!("unknown key: {key} (known: {})", known.join(", ")).into());
                }
            }
        }
        ConfigAction::Set { key, value } => {
            let mut config = Config::load()?;
            config.set(&key, &value)?;
            config.save()?;
            tracing::info!(%key, %value, "config updated");
            println!("{key} = {}", config.get(&key).unwrap_or(value));
        }
        ConfigAction::List { json } => {
            let config = Config::load()?;
            if json {
                println!("{}", serde_json::to_string_pretty(&config)?);
            } else {
                for (key, value) in settings(&config)? {
                    println!("{key} = {value}");
                }
            }
        }
        ConfigAction::Reset => {
            let config = Config::default();
            config.save()?;
            let window = config.target_date();
            println!(
                "config reset: window {:02}-{:02}, pages {}/{}/{}",
                window.month, window.day, config.pages.question, config.pages.waiting, config.pages.main
            );
        }
    }
    Ok(())
}
