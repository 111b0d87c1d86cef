/// Interactive disk swapping console

use diskswap::sim::{capability_table, SharedDrive};
use diskswap::*;
use rustyline::completion::{Completer, Pair};
use rustyline::error::ReadlineError;
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::{Context, Editor, Helper};
use std::path::PathBuf;

/// Command completer for the REPL
struct CommandCompleter {
    commands: Vec<&'static str>,
}

impl CommandCompleter {
    fn new() -> Self {
        Self {
            commands: vec![
                "append",
                "close",
                "eject",
                "exit",
                "fault",
                "help",
                "insert",
                "list",
                "load",
                "load-legacy",
                "next",
                "prev",
                "quiet",
                "quit",
                "save",
                "status",
                "toggle",
                "unload",
                "verbose",
            ],
        }
    }
}

impl Completer for CommandCompleter {
    type Candidate = Pair;

    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        // Only complete the first word (command name)
        let line_to_cursor = &line[..pos];
        if line_to_cursor.contains(' ') {
            return Ok((pos, vec![]));
        }

        let prefix = line_to_cursor.to_lowercase();
        let matches: Vec<Pair> = self
            .commands
            .iter()
            .filter(|cmd| cmd.starts_with(&prefix))
            .map(|cmd| Pair {
                display: cmd.to_string(),
                replacement: cmd.to_string(),
            })
            .collect();

        Ok((0, matches))
    }
}

impl Hinter for CommandCompleter {
    type Hint = String;
}

impl Highlighter for CommandCompleter {}
impl Validator for CommandCompleter {}
impl Helper for CommandCompleter {}

/// Get the path to the history file
fn history_path() -> Option<PathBuf> {
    dirs::home_dir().map(|mut p| {
        p.push(".diskswap_history");
        p
    })
}

/// Content currently loaded into the simulated engine
struct Session {
    content: String,
    drive: SharedDrive,
}

/// Log filter used when `RUST_LOG` is not set
const DEFAULT_LOG_FILTER: &str = "info";

fn log_env() -> env_logger::Env<'static> {
    env_logger::Env::default().default_filter_or(DEFAULT_LOG_FILTER)
}

fn main() {
    env_logger::Builder::from_env(log_env()).init();

    let settings = match parse_args(std::env::args().skip(1)) {
        Ok(settings) => settings,
        Err(message) => {
            eprintln!("{}", message);
            eprintln!("Usage: diskswap [--save-dir <dir>] [--quiet]");
            std::process::exit(2);
        }
    };

    println!("=== DiskSwap ===");
    println!("Interactive console for swapping disks in multi-disk content.");
    match &settings.save_dir {
        Some(dir) => println!("Disk index records: {}", dir.display()),
        None => println!("Disk index records: beside content"),
    }
    println!("Type 'help' for available commands\n");

    let mut rl = match Editor::new() {
        Ok(rl) => rl,
        Err(e) => {
            eprintln!("Failed to create editor: {}", e);
            std::process::exit(1);
        }
    };
    rl.set_helper(Some(CommandCompleter::new()));

    if let Some(history_path) = history_path() {
        let _ = rl.load_history(&history_path);
    }

    let mut settings = settings;
    let mut control = DiskControl::new();
    let mut session: Option<Session> = None;

    loop {
        let input = match rl.readline("> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("^C");
                continue;
            }
            Err(ReadlineError::Eof) => {
                shutdown(&mut control, &mut session);
                break;
            }
            Err(err) => {
                println!("Error: {:?}", err);
                break;
            }
        };

        let input = input.trim();
        if input.is_empty() {
            continue;
        }

        let _ = rl.add_history_entry(input);

        let parts = parse_command_line(input);
        if parts.is_empty() {
            continue;
        }
        let command = parts[0].to_lowercase();
        let notify = settings.notify;

        match command.as_str() {
            "help" => print_help(),
            "quit" | "exit" => {
                shutdown(&mut control, &mut session);
                break;
            }
            "load" | "load-legacy" => {
                if parts.len() < 3 {
                    println!("Usage: {} <content> <image> [image...]", command);
                    continue;
                }
                if session.is_some() {
                    control.unload_content();
                }
                let shape = if command == "load" {
                    TableShape::Extended
                } else {
                    TableShape::Basic
                };
                session = Some(load_content(
                    &mut control,
                    &settings,
                    shape,
                    &parts[1],
                    &parts[2..],
                ));
            }
            "unload" => {
                if session.take().is_some() {
                    control.unload_content();
                    control.clear_capabilities();
                    println!("Content unloaded.");
                } else {
                    println!("No content loaded.");
                }
            }
            "status" => match &session {
                Some(s) => print_status(&control, s),
                None => println!("No content loaded. Use 'load <content> <image>...' first."),
            },
            "list" => {
                if session.is_none() {
                    println!("No content loaded.");
                    continue;
                }
                print_images(&control);
            }
            "eject" => report(control.set_eject_state(true, notify)),
            "close" => report(control.set_eject_state(false, notify)),
            "toggle" => report(control.toggle_eject(notify)),
            "next" => report(control.set_index_next(notify)),
            "prev" => report(control.set_index_prev(notify)),
            "insert" => {
                // Disks are numbered from 1 for the user; 0 empties the tray
                let Some(number) = parts.get(1).and_then(|n| n.parse::<u32>().ok()) else {
                    println!("Usage: insert <n>   (1-based, 0 removes the disk)");
                    continue;
                };
                let index = match number {
                    0 => control.get_num_images(),
                    n => n - 1,
                };
                report(control.set_index(index, notify));
            }
            "append" => {
                if parts.len() < 2 {
                    println!("Usage: append <path>");
                    continue;
                }
                report(control.append_image(&parts[1]));
            }
            "save" => {
                if !control.is_record_enabled() {
                    println!("Disk index records are not available for this content.");
                } else if control.save_image_index() {
                    if let Some(record) = control.index_record() {
                        println!("Saved disk index to {}", record.file_path().display());
                    }
                } else {
                    println!("Disk index was not saved.");
                }
            }
            "fault" => {
                let Some(s) = &session else {
                    println!("No content loaded.");
                    continue;
                };
                if parts.len() < 3 {
                    println!("Usage: fault <name> on|off");
                    println!("Faults: {}", FAULT_NAMES.join(", "));
                    continue;
                }
                let enabled = match parts[2].to_lowercase().as_str() {
                    "on" | "1" | "true" => true,
                    "off" | "0" | "false" => false,
                    other => {
                        println!("Expected on or off, got '{}'", other);
                        continue;
                    }
                };
                if set_fault(&mut s.drive.borrow_mut().faults, &parts[1], enabled) {
                    println!("Fault {} {}", parts[1], if enabled { "on" } else { "off" });
                } else {
                    println!("Unknown fault: {}. Faults: {}", parts[1], FAULT_NAMES.join(", "));
                }
            }
            "quiet" => {
                settings = settings.notify(false);
                println!("Informational notifications hidden.");
            }
            "verbose" => {
                settings = settings.notify(true);
                println!("Informational notifications shown.");
            }
            _ => {
                println!("Unknown command: {}. Type 'help' for available commands.", command);
            }
        }

        print_notifications(&mut control);
    }

    if let Some(history_path) = history_path() {
        let _ = rl.save_history(&history_path);
    }
}

/// Parse `--save-dir <dir>` and `--quiet` over the environment settings
fn parse_args<I: Iterator<Item = String>>(mut args: I) -> std::result::Result<Settings, String> {
    let mut settings = Settings::from_env();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--save-dir" => {
                let dir = args.next().ok_or("--save-dir needs a directory")?;
                settings = if dir.is_empty() {
                    Settings { save_dir: None, ..settings }
                } else {
                    settings.save_dir(dir)
                };
            }
            "--quiet" => settings = settings.notify(false),
            other => return Err(format!("Unknown option: {}", other)),
        }
    }

    Ok(settings)
}

/// Run the load handshake against a fresh simulated engine
fn load_content(
    control: &mut DiskControl,
    settings: &Settings,
    shape: TableShape,
    content: &str,
    images: &[String],
) -> Session {
    let drive = SimulatedDrive::new(images.iter().cloned()).shared();
    control.configure(capability_table(&drive, shape));

    let primed = control.set_initial_index(content, settings.save_dir.as_deref());
    drive.borrow_mut().finish_load();
    control.verify_initial_index(settings.notify);

    println!(
        "Loaded {} with {} disk(s){}",
        content,
        images.len(),
        if primed { "" } else { " (no disk index record)" }
    );
    if let Some(record) = control.index_record() {
        println!("Disk index record: {}", record.file_path().display());
    }

    Session {
        content: content.to_string(),
        drive,
    }
}

/// Save the disk index on the way out
fn shutdown(control: &mut DiskControl, session: &mut Option<Session>) {
    if session.take().is_some() {
        control.unload_content();
    }
    print_notifications(control);
    println!("Goodbye!");
}

fn report(result: diskswap::Result<()>) {
    if let Err(e) = result {
        println!("Error: {}", e);
    }
}

fn print_notifications(control: &mut DiskControl) {
    for notification in control.drain_notifications() {
        println!(
            "[{}] {} ({} frames)",
            notification.level.name(),
            notification,
            notification.duration
        );
    }
}

fn print_status(control: &DiskControl, session: &Session) {
    let shape = match control.capabilities().map(|t| t.shape()) {
        Some(TableShape::Extended) => "extended",
        Some(TableShape::Basic) => "basic",
        None => "none",
    };
    let num_images = control.get_num_images();
    let index = control.get_image_index();

    println!("Content: {}", session.content);
    println!("Interface: {}", shape);
    println!("Tray: {}", if control.get_eject_state() { "open" } else { "closed" });
    if index < num_images {
        println!("Disk: {}/{} - {}", index as u64 + 1, num_images, control.get_image_label(index));
    } else {
        println!("Disk: none ({} available)", num_images);
    }
    println!("Append: {}", if control.supports_append() { "Yes" } else { "No" });
    match control.index_record() {
        Some(record) => {
            println!("Record: {}", record.file_path().display());
            println!(
                "Record entry: {} {}{}",
                record.image_index() as u64 + 1,
                record.image_path(),
                if record.is_dirty() { " (unsaved)" } else { "" }
            );
        }
        None => println!("Record: disabled"),
    }
}

fn print_images(control: &DiskControl) {
    let current = control.get_image_index();
    let entries = control.image_entries();
    if entries.is_empty() {
        println!("No disks.");
        return;
    }

    for entry in entries {
        let marker = if entry.index == current { "*" } else { " " };
        match entry.path {
            Some(path) => println!("{} {:>3}  {:<24} {}", marker, entry.index as u64 + 1, entry.label, path),
            None => println!("{} {:>3}  {}", marker, entry.index as u64 + 1, entry.label),
        }
    }
}

const FAULT_NAMES: [&str; 9] = [
    "eject",
    "close",
    "set-index",
    "misplace",
    "add",
    "replace",
    "initial",
    "path",
    "label",
];

fn set_fault(faults: &mut Faults, name: &str, enabled: bool) -> bool {
    let flag = match name.to_lowercase().as_str() {
        "eject" => &mut faults.eject,
        "close" => &mut faults.close,
        "set-index" => &mut faults.set_image_index,
        "misplace" => &mut faults.misplace_image_index,
        "add" => &mut faults.add_image_index,
        "replace" => &mut faults.replace_image_index,
        "initial" => &mut faults.set_initial_image,
        "path" => &mut faults.image_path,
        "label" => &mut faults.image_label,
        _ => return false,
    };
    *flag = enabled;
    true
}

/// Parse command line input, respecting quoted strings
fn parse_command_line(input: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;

    for ch in input.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            ' ' | '\t' if !in_quotes => {
                if !current.is_empty() {
                    parts.push(std::mem::take(&mut current));
                }
            }
            _ => current.push(ch),
        }
    }

    if !current.is_empty() {
        parts.push(current);
    }

    parts
}

fn print_help() {
    println!("Available commands:");
    println!("  load <content> <image>...        - Load content with the extended interface");
    println!("  load-legacy <content> <image>... - Load content with the basic interface");
    println!("  unload                           - Save the disk index and unload content");
    println!("  status                           - Show tray, disk and record state");
    println!("  list                             - List disks (* marks the current one)");
    println!("  eject                            - Open the tray");
    println!("  close                            - Close the tray");
    println!("  toggle                           - Open or close the tray");
    println!("  next                             - Select the next disk (tray must be open)");
    println!("  prev                             - Select the previous disk (tray must be open)");
    println!("  insert <n>                       - Select disk n (1-based, 0 removes the disk)");
    println!("  append <path>                    - Append a disk image and insert it");
    println!("  save                             - Write the disk index record now");
    println!("  fault <name> on|off              - Make an engine callback fail");
    println!("  quiet                            - Hide informational notifications");
    println!("  verbose                          - Show informational notifications");
    println!("  help                             - Show this help");
    println!("  quit, exit                       - Exit");
}
