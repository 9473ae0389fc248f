//! Key-driven device picker.
//!
//! Keys are read on their own thread and the selected devices are
//! benchmarked on a worker thread. Both feed one event channel, so the menu
//! keeps taking keys while a run streams its status lines and report blocks.
//! A [`RunGuard`] drops run requests that arrive while a run is in flight.

use anyhow::{bail, Result};
use console::{style, Key, Term};
use llmbench_common::{Device, DeviceKind};
use std::io;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Sender};
use std::sync::Arc;
use std::thread;
use tracing::{debug, error, info};

use crate::commands::run::{exit_code, run_devices, RunOptions};
use crate::config::CliConfig;
use crate::exit::{EXIT_GENERIC_FAIL, EXIT_SUCCESS};
use crate::output::{DeviceOutcome, OutputFormat};

const MENU_LINES: usize = 4;

/// Checkbox state for each device kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceSelection {
    checked: [bool; DeviceKind::ALL.len()],
}

impl Default for DeviceSelection {
    /// CPU only.
    fn default() -> Self {
        let mut selection = Self { checked: [false; DeviceKind::ALL.len()] };
        selection.set(DeviceKind::Cpu, true);
        selection
    }
}

impl DeviceSelection {
    pub fn from_devices(devices: &[Device]) -> Self {
        let mut selection = Self { checked: [false; DeviceKind::ALL.len()] };
        for device in devices {
            selection.set(device.kind(), true);
        }
        selection
    }

    fn index(kind: DeviceKind) -> usize {
        DeviceKind::ALL.iter().position(|k| *k == kind).unwrap_or(0)
    }

    fn set(&mut self, kind: DeviceKind, on: bool) {
        self.checked[Self::index(kind)] = on;
    }

    pub fn is_checked(&self, kind: DeviceKind) -> bool {
        self.checked[Self::index(kind)]
    }

    pub fn toggle(&mut self, kind: DeviceKind) {
        let on = !self.is_checked(kind);
        self.set(kind, on);
    }

    /// Primary device of each checked kind, in the fixed kind order.
    pub fn selected(&self) -> Vec<Device> {
        DeviceKind::ALL
            .into_iter()
            .filter(|k| self.is_checked(*k))
            .map(Device::primary)
            .collect()
    }
}

/// Single-flight flag shared by the menu and the worker.
#[derive(Debug, Clone, Default)]
pub struct RunGuard {
    running: Arc<AtomicBool>,
}

impl RunGuard {
    /// Claim the guard, or `None` while another run holds it.
    pub fn try_start(&self) -> Option<RunTicket> {
        self.running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| RunTicket { running: Arc::clone(&self.running) })
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}

/// Releases the guard when dropped.
#[derive(Debug)]
pub struct RunTicket {
    running: Arc<AtomicBool>,
}

impl Drop for RunTicket {
    fn drop(&mut self) {
        self.running.store(false, Ordering::Release);
    }
}

/// What a key press asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Toggle(DeviceKind),
    Run,
    Quit,
    Ignore,
}

pub fn action_for(key: &Key) -> Action {
    match key {
        Key::Char('1') => Action::Toggle(DeviceKind::Cpu),
        Key::Char('2') => Action::Toggle(DeviceKind::Cuda),
        Key::Char('3') => Action::Toggle(DeviceKind::Metal),
        Key::Enter | Key::Char('r') => Action::Run,
        Key::Escape | Key::Char('q') => Action::Quit,
        _ => Action::Ignore,
    }
}

/// Menu lines for the current state; always [`MENU_LINES`] long.
pub fn render_menu(selection: &DeviceSelection, running: bool) -> Vec<String> {
    let boxes = DeviceKind::ALL
        .into_iter()
        .enumerate()
        .map(|(i, kind)| {
            let mark = if selection.is_checked(kind) { "[x]" } else { "[ ]" };
            format!("{} {}) {}", style(mark).cyan(), i + 1, kind.label())
        })
        .collect::<Vec<_>>()
        .join("   ");
    let run = if running {
        style("[Run Benchmark]").dim().to_string()
    } else {
        style("[Run Benchmark]").bold().to_string()
    };
    vec![
        style("Select Devices:").bold().to_string(),
        format!("  {boxes}"),
        format!("  {run}"),
        style("  1-3 toggle a device, Enter runs, q quits").dim().to_string(),
    ]
}

/// Menu state plus the single-flight guard.
#[derive(Debug, Default)]
pub struct Picker {
    selection: DeviceSelection,
    guard: RunGuard,
}

/// What the front end should do after an [`Action`].
#[derive(Debug)]
pub enum Step {
    /// The selection changed.
    Redraw,
    /// Benchmark `devices`; the ticket must live until the run ends.
    Start { devices: Vec<Device>, ticket: RunTicket },
    NothingSelected,
    /// A run is already in flight; the request is dropped.
    Busy,
    Quit,
    Idle,
}

impl Picker {
    pub fn new(selection: DeviceSelection) -> Self {
        Self { selection, guard: RunGuard::default() }
    }

    pub fn selection(&self) -> &DeviceSelection {
        &self.selection
    }

    pub fn is_running(&self) -> bool {
        self.guard.is_running()
    }

    pub fn step(&mut self, action: Action) -> Step {
        match action {
            Action::Toggle(kind) => {
                self.selection.toggle(kind);
                Step::Redraw
            }
            Action::Run => {
                if self.guard.is_running() {
                    return Step::Busy;
                }
                let devices = self.selection.selected();
                if devices.is_empty() {
                    return Step::NothingSelected;
                }
                match self.guard.try_start() {
                    Some(ticket) => Step::Start { devices, ticket },
                    None => Step::Busy,
                }
            }
            Action::Quit => Step::Quit,
            Action::Ignore => Step::Idle,
        }
    }
}

enum Event {
    Key(Key),
    KeyError(io::Error),
    Line(String),
    /// `None` when the worker panicked.
    Finished(Option<Vec<DeviceOutcome>>),
}

/// Write `text` line by line. Key reads keep the terminal in raw mode, so
/// every line ends with an explicit carriage return.
fn write_block(term: &Term, text: &str) -> io::Result<()> {
    for line in text.lines() {
        term.write_str(line)?;
        term.write_str("\r\n")?;
    }
    Ok(())
}

fn draw_menu(term: &Term, picker: &Picker) -> io::Result<()> {
    for line in render_menu(picker.selection(), picker.is_running()) {
        write_block(term, &line)?;
    }
    Ok(())
}

fn spawn_key_reader(term: Term, tx: Sender<Event>) -> io::Result<()> {
    thread::Builder::new().name("llmbench-keys".into()).spawn(move || loop {
        let event = match term.read_key() {
            Ok(key) => Event::Key(key),
            Err(e) => {
                let _ = tx.send(Event::KeyError(e));
                break;
            }
        };
        if tx.send(event).is_err() {
            break;
        }
    })?;
    Ok(())
}

/// Benchmark `devices` on a worker thread, streaming its output as events.
fn spawn_run(
    devices: Vec<Device>,
    ticket: RunTicket,
    options: RunOptions,
    tx: Sender<Event>,
) -> io::Result<()> {
    thread::Builder::new().name("llmbench-run".into()).spawn(move || {
        let lines = tx.clone();
        let outcomes = panic::catch_unwind(AssertUnwindSafe(|| {
            run_devices(&devices, &options, &mut |line| {
                // the receiver only goes away once the picker has quit
                let _ = lines.send(Event::Line(line));
            })
        }));
        // release before reporting so the next Run is accepted
        drop(ticket);
        let _ = tx.send(Event::Finished(outcomes.ok()));
    })?;
    Ok(())
}

/// Interactive mode entry point.
pub fn execute(config: &CliConfig) -> Result<i32> {
    let term = Term::stdout();
    if !term.is_term() {
        bail!("interactive mode needs a terminal; pass --cli to run without one");
    }

    let selection =
        config.devices.as_deref().map(DeviceSelection::from_devices).unwrap_or_default();
    let mut picker = Picker::new(selection);
    let options = RunOptions { format: OutputFormat::Text, ..RunOptions::from(config) };
    let mut status = EXIT_SUCCESS;

    let (tx, rx) = mpsc::channel();
    spawn_key_reader(term.clone(), tx.clone())?;
    draw_menu(&term, &picker)?;

    loop {
        match rx.recv()? {
            Event::Key(key) => match picker.step(action_for(&key)) {
                // the menu is not on the last lines while a run streams output
                Step::Redraw if !picker.is_running() => {
                    term.clear_last_lines(MENU_LINES)?;
                    draw_menu(&term, &picker)?;
                }
                Step::Redraw | Step::Idle => {}
                Step::Start { devices, ticket } => {
                    info!("Starting interactive run on {} device(s)", devices.len());
                    term.clear_last_lines(MENU_LINES)?;
                    draw_menu(&term, &picker)?;
                    spawn_run(devices, ticket, options, tx.clone())?;
                }
                Step::NothingSelected => {
                    let warning = style("Please select at least one device!").red();
                    write_block(&term, &warning.to_string())?;
                    draw_menu(&term, &picker)?;
                }
                Step::Busy => debug!("Run requested while a benchmark is in flight"),
                Step::Quit => {
                    if picker.is_running() {
                        info!("Quitting with a benchmark still in flight");
                    }
                    break;
                }
            },
            Event::KeyError(e) => return Err(e.into()),
            Event::Line(line) => write_block(&term, &line)?,
            Event::Finished(outcomes) => {
                let code = match outcomes {
                    Some(outcomes) => exit_code(&outcomes),
                    None => {
                        error!("Benchmark worker panicked");
                        EXIT_GENERIC_FAIL
                    }
                };
                status = status.max(code);
                draw_menu(&term, &picker)?;
            }
        }
    }
    Ok(status)
}
