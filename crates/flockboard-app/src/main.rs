//! Headless Flockboard client (native).
//!
//! Joins a room, keeps a local replica of the board and takes line
//! commands on stdin. Usage: `flockboard [config.json]`.

use flockboard_app::{Command, PointerPhase, SessionError, Whiteboard, print_help};
use flockboard_core::config::SessionConfig;
use flockboard_core::input::PointerEvent;
use flockboard_core::storage::{FileStore, SnapshotStore};
use flockboard_core::sync::NativeWebSocket;
use flockboard_render::RasterSurface;
use std::io::BufRead;
use std::process::ExitCode;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::time::{Duration, Instant};

/// Event loop period.
const FRAME: Duration = Duration::from_millis(16);

type Board = Whiteboard<RasterSurface, NativeWebSocket>;

fn main() -> ExitCode {
    env_logger::init();
    log::info!("Starting Flockboard");

    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config() -> Result<SessionConfig, SessionError> {
    let config = match std::env::args().nth(1) {
        Some(path) => SessionConfig::from_json_file(&path)?,
        None => SessionConfig::default(),
    };
    Ok(config.with_env()?)
}

fn run() -> Result<(), SessionError> {
    let config = load_config()?;
    let surface = RasterSurface::new(config.width, config.height)?;
    let store = FileStore::default_location()?;
    log::info!("Snapshots in {}", store.base_path().display());

    let mut board = Whiteboard::new(surface, NativeWebSocket::new(), &config);
    log::info!("Joining room '{}' via {}", config.room, config.server);
    board.connect()?;

    let lines = spawn_stdin();
    print_help();
    loop {
        board.tick(Instant::now());
        match lines.try_recv() {
            Ok(line) => match Command::parse(&line) {
                Ok(Some(Command::Quit)) => break,
                Ok(Some(command)) => {
                    if let Err(e) = execute(&mut board, &store, command) {
                        log::error!("{}", e);
                    }
                }
                Ok(None) => {}
                Err(e) => println!("{}", e),
            },
            Err(TryRecvError::Empty) => std::thread::sleep(FRAME),
            Err(TryRecvError::Disconnected) => break,
        }
    }

    board.disconnect();
    log::info!("Left room '{}'", config.room);
    Ok(())
}

/// Read stdin lines on their own thread so the event loop never blocks.
fn spawn_stdin() -> Receiver<String> {
    let (tx, rx) = mpsc::channel();
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let Ok(line) = line else {
                break;
            };
            if tx.send(line).is_err() {
                break;
            }
        }
    });
    rx
}

fn execute(board: &mut Board, store: &FileStore, command: Command) -> Result<(), SessionError> {
    match command {
        Command::Tool(tool) => board.set_tool(tool),
        Command::Color(color) => board.set_color(color),
        Command::Size(size) => board.set_size(size),
        Command::Opacity(opacity) => board.set_opacity(opacity),
        Command::Pointer(phase, position) => board.pointer(match phase {
            PointerPhase::Down => PointerEvent::Down { position },
            PointerPhase::Move => PointerEvent::Move { position },
            PointerPhase::Up => PointerEvent::Up { position },
        }),
        Command::Key(event) => board.key(&event),
        Command::Text(text) => board.confirm_text(&text),
        Command::Undo => {
            if !board.undo() {
                println!("Nothing to undo");
            }
        }
        Command::Redo => {
            if !board.redo() {
                println!("Nothing to redo");
            }
        }
        Command::Clear => board.clear(),
        Command::Grid => {
            let on = board.toggle_grid();
            println!("Grid {}", if on { "on" } else { "off" });
        }
        Command::ZoomIn => board.zoom_in(),
        Command::ZoomOut => board.zoom_out(),
        Command::ResetZoom => board.reset_zoom(),
        Command::Save(name) => {
            let snapshot = pollster::block_on(board.save_snapshot(store, &name))?;
            println!("Saved '{}' ({} elements)", snapshot.name, snapshot.elements.len());
        }
        Command::Load(name) => pollster::block_on(board.load_snapshot(store, &name))?,
        Command::List => {
            for name in pollster::block_on(store.list())? {
                println!("  {}", name);
            }
        }
        Command::Export(path) => {
            board.export_png(&path)?;
            println!("Exported {}", path.display());
        }
        Command::Status => print_status(board),
        Command::Help => print_help(),
        Command::Quit => {}
    }
    Ok(())
}

fn print_status(board: &Board) {
    println!("Connection:   {:?}", board.connection_state());
    println!("Room:         {}", board.config().room);
    println!("Tool:         {}", board.tool().name());
    println!("Zoom:         {}%", board.viewport().zoom_percent());
    println!("Elements:     {}", board.elements().len());
    println!(
        "History:      {}/{}",
        board.history().cursor(),
        board.history().len()
    );
    println!("Participants: {}", board.participants().len());
    for (peer, cursor) in board.cursors().iter() {
        println!("  {} at ({:.0}, {:.0})", peer, cursor.position.x, cursor.position.y);
    }
    println!("Dropped:      {}", board.sync().dropped());
}
