//! Entry point for the arcadetop TUI. Parses args, resolves the device, and runs the App.

use std::env;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{anyhow, Result};
use tracing::info;

use arcadetop::api::ApiClient;
use arcadetop::app::{App, Dashboard};
use arcadetop::connector;
use arcadetop::logging;
use arcadetop::profiles::{
    load_profiles, save_profiles, Endpoints, ProfileEntry, ProfileRequest, ResolveProfile,
};
use arcadetop::settings::Settings;
use arcadetop::stats::UsageStats;
use arcadetop::store::KvStore;
use arcadetop::ws::WsDialer;

#[derive(Debug)]
struct ParsedArgs {
    url: Option<String>,
    ws: Option<String>,
    profile: Option<String>,
    log_file: Option<PathBuf>,
    save: bool,
    dry_run: bool,
}

fn usage(prog: &str) -> String {
    format!(
        "Usage: {prog} [--profile NAME|-P NAME] [--ws URL|-w URL] [--save] [--dry-run] [--log-file PATH] [http://HOST[:PORT]]"
    )
}

fn parse_args<I: IntoIterator<Item = String>>(args: I) -> Result<ParsedArgs, String> {
    let mut it = args.into_iter();
    let prog = it.next().unwrap_or_else(|| "arcadetop".into());
    let mut url: Option<String> = None;
    let mut ws: Option<String> = None;
    let mut profile: Option<String> = None;
    let mut log_file: Option<PathBuf> = None;
    let mut save = false; // --save
    let mut dry_run = false; // --dry-run

    while let Some(arg) = it.next() {
        match arg.as_str() {
            "-h" | "--help" => return Err(usage(&prog)),
            "--ws" | "-w" => {
                ws = it.next();
            }
            "--profile" | "-P" => {
                profile = it.next();
            }
            "--log-file" => {
                log_file = it.next().map(PathBuf::from);
            }
            "--save" => {
                save = true;
            }
            "--dry-run" => {
                dry_run = true;
            }
            _ if arg.starts_with("--ws=") => {
                if let Some((_, v)) = arg.split_once('=') {
                    if !v.is_empty() {
                        ws = Some(v.to_string());
                    }
                }
            }
            _ if arg.starts_with("--profile=") => {
                if let Some((_, v)) = arg.split_once('=') {
                    if !v.is_empty() {
                        profile = Some(v.to_string());
                    }
                }
            }
            _ => {
                if url.is_none() {
                    url = Some(arg);
                } else {
                    return Err(format!("Unexpected argument. {}", usage(&prog)));
                }
            }
        }
    }
    Ok(ParsedArgs {
        url,
        ws,
        profile,
        log_file,
        save,
        dry_run,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let parsed = match parse_args(env::args()) {
        Ok(v) => v,
        Err(msg) => {
            eprintln!("{msg}");
            return Ok(());
        }
    };

    let Some((url, ws)) = resolve_target(&parsed)? else {
        return Ok(());
    };
    let endpoints = Endpoints::resolve(&url, ws.as_deref()).map_err(|e| anyhow!(e))?;
    if parsed.dry_run {
        println!("api:  {}", endpoints.api);
        println!("feed: {}", endpoints.feed);
        return Ok(());
    }

    let log_path = logging::init(parsed.log_file.as_deref())?;

    let store = KvStore::open_default();
    let settings = Settings::load(&store);
    let usage = UsageStats::load(&store);
    let api = ApiClient::with_timeout(endpoints.api.clone(), settings.status_timeout());
    info!(api = %api.base(), feed = %endpoints.feed, log = %log_path.display(), "starting");

    let (feed, events, task) = connector::spawn(
        endpoints.feed.clone(),
        settings.connector_config(),
        Arc::new(WsDialer),
        Arc::new(api.clone()),
    );
    let mut app = App::new(Dashboard::new(settings, usage), feed, events, api, store);
    let res = app.run().await;
    let _ = tokio::time::timeout(Duration::from_secs(1), task).await;
    res
}

/// Work out (url, ws) from args and saved profiles, prompting where needed.
/// `None` means the user aborted or nothing could be resolved.
fn resolve_target(parsed: &ParsedArgs) -> Result<Option<(String, Option<String>)>> {
    let profiles_file = load_profiles();
    let req = ProfileRequest {
        profile_name: parsed.profile.clone(),
        url: parsed.url.clone(),
        ws: parsed.ws.clone(),
    };
    let mut profiles_mut = profiles_file.clone();

    let target = match req.resolve(&profiles_file) {
        ResolveProfile::Direct(u, w) => {
            if let Some(name) = parsed.profile.as_ref() {
                let entry = ProfileEntry {
                    url: u.clone(),
                    ws: w.clone(),
                };
                let current = profiles_mut.profiles.get(name).cloned();
                match current {
                    // New profile: auto-save immediately
                    None => {
                        profiles_mut.profiles.insert(name.clone(), entry);
                        save_profiles(&profiles_mut)?;
                    }
                    Some(existing) if existing != entry => {
                        let overwrite = parsed.save
                            || prompt_yes_no(&format!(
                                "Overwrite existing profile '{name}'? [y/N]: "
                            ));
                        if overwrite {
                            profiles_mut.profiles.insert(name.clone(), entry);
                            save_profiles(&profiles_mut)?;
                        }
                    }
                    Some(_) => {}
                }
            }
            (u, w)
        }
        ResolveProfile::Loaded(u, w) => (u, w),
        ResolveProfile::PromptSelect(names) => {
            eprintln!("Select profile:");
            for (i, n) in names.iter().enumerate() {
                eprintln!("  {}. {}", i + 1, n);
            }
            let line = prompt_string("Enter number (or blank to abort): ")?;
            let picked = line
                .trim()
                .parse::<usize>()
                .ok()
                .and_then(|idx| idx.checked_sub(1))
                .and_then(|idx| names.get(idx))
                .and_then(|name| profiles_mut.profiles.get(name));
            match picked {
                Some(entry) => (entry.url.clone(), entry.ws.clone()),
                None => return Ok(None),
            }
        }
        ResolveProfile::PromptCreate(name) => {
            eprintln!("Profile '{name}' does not exist yet.");
            let url = prompt_string("Enter device URL (http://HOST[:PORT]): ")?;
            if url.trim().is_empty() {
                return Ok(None);
            }
            let ws = prompt_string("Enter feed URL (or leave blank for HOST/ws): ")?;
            let ws_opt = Some(ws.trim().to_string()).filter(|w| !w.is_empty());
            profiles_mut.profiles.insert(
                name.clone(),
                ProfileEntry {
                    url: url.trim().to_string(),
                    ws: ws_opt.clone(),
                },
            );
            save_profiles(&profiles_mut)?;
            (url.trim().to_string(), ws_opt)
        }
        ResolveProfile::None => {
            eprintln!("No URL provided and no profiles to select.");
            return Ok(None);
        }
    };
    Ok(Some(target))
}

fn prompt_yes_no(prompt: &str) -> bool {
    eprint!("{prompt}");
    let _ = io::stderr().flush();
    let mut line = String::new();
    if io::stdin().read_line(&mut line).is_ok() {
        matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    } else {
        false
    }
}

fn prompt_string(prompt: &str) -> io::Result<String> {
    eprint!("{prompt}");
    let _ = io::stderr().flush();
    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    Ok(line)
}
