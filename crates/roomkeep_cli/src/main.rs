//! Room store admin entry point.
//!
//! # Responsibility
//! - Run one room operation against a configured store and print JSON.
//! - Keep output deterministic for scripting and quick local checks.

use log::info;
use roomkeep_core::{
    init_logging, CreateRoomInput, RoomPatch, RoomStore, RoomUploads, StoreConfig, UploadedFile,
};
use serde_json::json;
use std::path::Path;
use std::process::ExitCode;

const USAGE: &str = "usage: roomkeep_cli [--config FILE] [--picture PATH]... [--thumbnail PATH] \
<ping | list | get ID | create JSON | edit ID JSON | delete ID>";

#[derive(Debug, PartialEq)]
enum Command {
    Ping,
    List,
    Get(String),
    Create(String),
    Edit(String, String),
    Delete(String),
}

#[derive(Debug, PartialEq)]
struct Invocation {
    config_path: Option<String>,
    uploads: RoomUploads,
    command: Command,
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let invocation = match parse_args(&args) {
        Ok(invocation) => invocation,
        Err(message) => {
            eprintln!("{message}\n{USAGE}");
            return ExitCode::from(2);
        }
    };

    match run(invocation) {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(message) => {
            eprintln!("error: {message}");
            ExitCode::FAILURE
        }
    }
}

fn parse_args(args: &[String]) -> Result<Invocation, String> {
    let mut config_path = None;
    let mut uploads = RoomUploads::default();
    let mut positional = Vec::new();

    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--config" => config_path = Some(flag_value(&mut iter, "--config")?),
            "--picture" => uploads
                .pictures
                .push(UploadedFile::new(flag_value(&mut iter, "--picture")?)),
            "--thumbnail" => {
                uploads.thumbnail = Some(UploadedFile::new(flag_value(&mut iter, "--thumbnail")?))
            }
            flag if flag.starts_with("--") => return Err(format!("unknown flag `{flag}`")),
            _ => positional.push(arg.clone()),
        }
    }

    let command = match positional
        .iter()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .as_slice()
    {
        ["ping"] => Command::Ping,
        ["list"] => Command::List,
        ["get", id] => Command::Get(id.to_string()),
        ["create", body] => Command::Create(body.to_string()),
        ["edit", id, body] => Command::Edit(id.to_string(), body.to_string()),
        ["delete", id] => Command::Delete(id.to_string()),
        [] => return Err("missing command".to_string()),
        other => return Err(format!("unrecognized command `{}`", other.join(" "))),
    };

    Ok(Invocation {
        config_path,
        uploads,
        command,
    })
}

fn flag_value<'a>(iter: &mut impl Iterator<Item = &'a String>, flag: &str) -> Result<String, String> {
    iter.next()
        .cloned()
        .ok_or_else(|| format!("`{flag}` requires a value"))
}

fn run(invocation: Invocation) -> Result<String, String> {
    if invocation.command == Command::Ping {
        return Ok(ping_output().to_string());
    }

    let config = StoreConfig::load(invocation.config_path.as_deref().map(Path::new))
        .map_err(|err| err.to_string())?;

    if let Some(log_dir) = config.log_dir.as_deref() {
        init_logging(&config.log_level, log_dir)?;
    }

    let store = RoomStore::open(&config).map_err(|err| err.to_string())?;
    info!(
        "event=cli_command module=cli status=start db_path={}",
        config.db_path.display()
    );
    let output = execute(&store, invocation.command, &invocation.uploads);
    store.close();
    output
}

fn execute(store: &RoomStore, command: Command, uploads: &RoomUploads) -> Result<String, String> {
    let value = match command {
        Command::Ping => ping_output(),
        Command::List => to_json(&store.list_rooms())?,
        Command::Get(room_id) => to_json(&store.get_room(&room_id))?,
        Command::Create(body) => {
            let input: CreateRoomInput =
                serde_json::from_str(&body).map_err(|err| format!("invalid create payload: {err}"))?;
            to_json(&store.create_room(input, uploads))?
        }
        Command::Edit(room_id, body) => {
            let patch: RoomPatch =
                serde_json::from_str(&body).map_err(|err| format!("invalid edit payload: {err}"))?;
            to_json(&store.edit_room(&room_id, patch, uploads))?
        }
        Command::Delete(room_id) => {
            let message = store.delete_room(&room_id).map_err(|err| err.to_string())?;
            json!({ "message": message })
        }
    };
    Ok(value.to_string())
}

fn ping_output() -> serde_json::Value {
    json!({
        "ping": roomkeep_core::ping(),
        "version": roomkeep_core::core_version(),
    })
}

fn to_json<T: serde::Serialize, E: std::fmt::Display>(
    result: &Result<T, E>,
) -> Result<serde_json::Value, String> {
    match result {
        Ok(value) => serde_json::to_value(value).map_err(|err| err.to_string()),
        Err(err) => Err(err.to_string()),
    }
}
