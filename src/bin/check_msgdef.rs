//! Validate CAN message definition files.
//!
//! Usage:
//!   check_msgdef [OPTIONS] [FILE.json ...]
//!   check_msgdef < defs.json
//!
//! Each file holds either a single `MessageConfig` object or a JSON array of them.
//! Every message and parser is validated; findings are printed one per line.
//! Exit code 1 if any entity is invalid.
//!
//! Options:
//!   --quiet, -q  Only print invalid entities

use anyhow::Context;
use candef::{Message, MessageConfig, NullSink};
use std::io::Read;

fn load_configs(source: &str) -> anyhow::Result<Vec<MessageConfig>> {
    let trimmed = source.trim_start();
    if trimmed.starts_with('[') {
        Ok(serde_json::from_str(source)?)
    } else {
        Ok(vec![serde_json::from_str(source)?])
    }
}

fn check(path: &str, source: &str, quiet: bool) -> anyhow::Result<bool> {
    let configs = load_configs(source).with_context(|| format!("parsing {}", path))?;
    let mut all_valid = true;
    for cfg in &configs {
        let mut msg = Message::from_config(cfg);
        msg.revalidate(&mut NullSink);
        let label = msg.id_with_dlc();
        if msg.is_valid() {
            if !quiet {
                println!("{}: message {}: valid ({} parser(s))", path, label, msg.parser_count());
            }
        } else {
            all_valid = false;
            if !candef::id_is_well_formed(msg.id()) {
                println!("{}: message {}: invalid id (need 3 or 8 hex digits)", path, label);
            } else {
                println!("{}: message {}: invalid", path, label);
            }
        }
        for (key, parser) in msg.parsers() {
            if parser.is_valid() {
                if !quiet {
                    println!("{}: message {}: parser {} ({}): valid", path, label, key, parser.id());
                }
            } else {
                all_valid = false;
                let reason = match parser.instance() {
                    candef::CompileState::Failed(r) => r.clone(),
                    _ => "not validated".to_string(),
                };
                println!("{}: message {}: parser {}: invalid: {}", path, label, key, reason);
            }
        }
    }
    Ok(all_valid)
}

fn main() -> anyhow::Result<()> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let quiet = if let Some(pos) = args.iter().position(|a| a == "--quiet" || a == "-q") {
        args.remove(pos);
        true
    } else {
        false
    };

    let mut all_valid = true;
    if args.is_empty() {
        let mut source = String::new();
        std::io::stdin().read_to_string(&mut source)?;
        all_valid &= check("<stdin>", &source, quiet)?;
    } else {
        for path in &args {
            let source =
                std::fs::read_to_string(path).with_context(|| format!("reading {}", path))?;
            all_valid &= check(path, &source, quiet)?;
        }
    }

    if !all_valid {
        std::process::exit(1);
    }
    Ok(())
}
