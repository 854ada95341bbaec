use std::collections::VecDeque;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use console::{Key, Term};
use tetris_engine::{
    Command, EngineConfig, GameEvent, HoldPolicy, PieceKind, Session, Snapshot, StepResult,
};

mod term_render;

use term_render::{AnsiTermStyle, GameScreen, PlainTermStyle, TermRender};

/// tetris_term - falling-block puzzle in the terminal
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Grid width in cells
    #[arg(long, default_value_t = 10)]
    width: usize,

    /// Grid height in cells
    #[arg(long, default_value_t = 20)]
    height: usize,

    /// Gravity period in milliseconds (0 disables gravity)
    #[arg(short, long, default_value_t = 500)]
    gravity_ms: u64,

    /// Lock delay in milliseconds
    #[arg(short, long, default_value_t = 500)]
    lock_delay_ms: u64,

    /// Number of upcoming pieces to show
    #[arg(short, long, default_value_t = 4)]
    preview: usize,

    /// Seed for a reproducible piece sequence
    #[arg(short, long)]
    seed: Option<u64>,

    /// Comma-separated piece kinds to deal (e.g. "I,O,T")
    #[arg(short, long, value_delimiter = ',')]
    kinds: Option<Vec<PieceKind>>,

    /// Allow hold only once per placed piece
    #[arg(long)]
    hold_once: bool,

    /// Cap lock-delay resets per piece
    #[arg(long)]
    lock_resets: Option<u32>,

    /// Render without colors
    #[arg(long)]
    plain: bool,

    /// Print the final game state as JSON on exit
    #[arg(long)]
    dump: bool,
}

impl Args {
    fn engine_config(&self) -> EngineConfig {
        let mut config = EngineConfig::new()
            .with_size(self.width, self.height)
            .with_gravity_interval(Duration::from_millis(self.gravity_ms))
            .with_lock_delay(Duration::from_millis(self.lock_delay_ms))
            .with_preview_size(self.preview)
            .with_lock_reset_limit(self.lock_resets)
            .with_step_timeout(Duration::from_millis(1000));
        if let Some(seed) = self.seed {
            config = config.with_seed(seed);
        }
        if let Some(kinds) = &self.kinds {
            config = config.with_piece_kinds(kinds.clone());
        }
        if self.hold_once {
            config = config.with_hold_policy(HoldPolicy::OncePerPiece);
        }
        config
    }
}

fn key_command(key: &Key) -> Option<Command> {
    match key {
        Key::ArrowLeft => Some(Command::MoveLeft),
        Key::ArrowRight => Some(Command::MoveRight),
        Key::ArrowDown => Some(Command::SoftDrop),
        Key::Char(' ') => Some(Command::HardDrop),
        Key::ArrowUp | Key::Char('x') | Key::Char('X') => Some(Command::RotateClockwise),
        Key::Char('z') | Key::Char('Z') => Some(Command::RotateCounterclockwise),
        Key::Char('a') | Key::Char('A') => Some(Command::Rotate180),
        Key::Char('c') | Key::Char('C') => Some(Command::Hold),
        _ => None,
    }
}

/// Player-facing text for a line clear
fn clear_message(count: usize, combo: u32) -> String {
    let name = match count {
        1 => "Single".to_string(),
        2 => "Double".to_string(),
        3 => "Triple".to_string(),
        4 => "Tetris".to_string(),
        n => format!("{} Lines", n),
    };
    if combo > 1 {
        format!("{} {} Combo", name, combo)
    } else {
        name
    }
}

#[tokio::main(flavor = "multi_thread", worker_threads = 1)]
async fn main() -> anyhow::Result<()> {
    // Parse command line arguments
    let args = Args::parse();

    // Initialize tracing on stderr so it does not tear the board
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let mut session = Session::new(args.engine_config()).context("invalid game configuration")?;
    let events = session.subscribe();

    println!("=== tetris_term ===");
    println!("Controls:");
    println!("  ← → - Move left/right");
    println!("  ↓ - Soft drop");
    println!("  Space - Hard drop");
    println!("  ↑/x, z, a - Rotate cw, ccw, 180");
    println!("  c - Hold");
    println!("  q - Quit");
    println!();

    // Spawn keyboard input task with separate term
    let keyboard_sender = session.sender();
    let keyboard_task = tokio::task::spawn_blocking(move || {
        let input_term = Term::stdout();
        loop {
            if let Ok(key) = input_term.read_key() {
                if keyboard_sender.is_closed() {
                    break;
                }
                if matches!(key, Key::Char('q') | Key::Char('Q')) {
                    let _ = keyboard_sender.stop();
                    break;
                }
                if let Some(command) = key_command(&key)
                    && keyboard_sender.send(command).is_err()
                {
                    break;
                }
            }
        }
    });

    // Create rendering terminal (separate from input)
    let render_term = Term::stdout();
    render_term.clear_screen()?;
    let mut messages: VecDeque<String> = VecDeque::new();
    let mut last_render = std::time::Instant::now();
    let render_interval = Duration::from_millis(50); // 20 FPS

    // Main step loop - processes commands and renders state
    let final_snapshot = loop {
        let result = session.step().await?;

        for event in events.try_iter() {
            match event {
                GameEvent::LineCleared { count, combo } => {
                    messages.push_back(clear_message(count, combo));
                    if messages.len() > 3 {
                        messages.pop_front();
                    }
                }
                GameEvent::DebugMessage(text) => tracing::debug!("{}", text),
                _ => {}
            }
        }

        match result {
            StepResult::Stop => break session.snapshot(),
            StepResult::GameOver(snapshot) => {
                render_game(&render_term, &snapshot, &messages, args.plain)?;
                break snapshot;
            }
            StepResult::Updated(snapshot) => {
                if last_render.elapsed() >= render_interval {
                    render_game(&render_term, &snapshot, &messages, args.plain)?;
                    last_render = std::time::Instant::now();
                }
            }
            StepResult::Timeout => {
                render_game(&render_term, &session.snapshot(), &messages, args.plain)?;
                last_render = std::time::Instant::now();
            }
        }
    };

    println!("Game Over!");
    if args.dump {
        println!("{}", serde_json::to_string_pretty(&final_snapshot)?);
    }

    // The input task is parked in a blocking key read unless the player quit;
    // once the session is gone the next key press ends it.
    if !keyboard_task.is_finished() {
        println!("Press any key to exit");
    }
    drop(session);
    let _ = keyboard_task.await;

    Ok(())
}

fn render_game(
    term: &Term,
    snapshot: &Snapshot,
    messages: &VecDeque<String>,
    plain: bool,
) -> anyhow::Result<()> {
    let mut text: Vec<String> = messages.iter().cloned().collect();
    text.push(format!("Combo: {}", snapshot.b2b_combo));
    let screen = GameScreen::new(snapshot, text);
    let lines = if plain {
        screen.render(&PlainTermStyle)
    } else {
        screen.render(&AnsiTermStyle)
    };

    term.move_cursor_to(0, 0)?;
    for line in lines {
        term.write_line(&line)?;
    }
    term.flush()?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clear_messages() {
        assert_eq!(clear_message(1, 0), "Single");
        assert_eq!(clear_message(4, 1), "Tetris");
        assert_eq!(clear_message(4, 2), "Tetris 2 Combo");
        assert_eq!(clear_message(3, 0), "Triple");
    }

    #[test]
    fn test_key_bindings() {
        assert_eq!(key_command(&Key::Char(' ')), Some(Command::HardDrop));
        assert_eq!(key_command(&Key::ArrowUp), Some(Command::RotateClockwise));
        assert_eq!(key_command(&Key::Char('c')), Some(Command::Hold));
        assert_eq!(key_command(&Key::Char('q')), None);
    }

    #[test]
    fn test_args_map_onto_config() {
        let args = Args::parse_from([
            "tetris_term",
            "--width",
            "8",
            "--seed",
            "4",
            "--kinds",
            "I,o",
            "--hold-once",
            "--lock-resets",
            "15",
        ]);
        let config = args.engine_config();
        assert_eq!(config.width, 8);
        assert_eq!(config.seed, Some(4));
        assert_eq!(config.piece_kinds, vec![PieceKind::I, PieceKind::O]);
        assert_eq!(config.hold_policy, HoldPolicy::OncePerPiece);
        assert_eq!(config.lock_reset_limit, Some(15));
        assert!(config.validate().is_ok());
    }
}
